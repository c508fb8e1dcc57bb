//! Drive a binder with a recorded event script

use std::cell::RefCell;
use std::rc::Rc;

use keychord_config::Config;
use keychord_core::{Binder, CompileError, Event, KeyPayload, KeyPress, Outcome};
use serde::Serialize;

use crate::script::ScriptLine;

/// One handler invocation observed during a replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub line: usize,
    pub handler: String,
    pub key: String,
    pub default_prevented: bool,
}

/// Outcome of every scripted event plus the handler calls they caused
#[derive(Debug, Default)]
pub struct Replay {
    pub outcomes: Vec<(usize, Event, Outcome)>,
    pub invocations: Vec<Invocation>,
}

/// Replay `script` against the key map and settings of `config`.
///
/// Every handler of the key map gets a recording callback, unless `only` is
/// non-empty, in which case just those handlers do and the others surface as
/// [`Outcome::Unhandled`].
pub fn replay(
    config: &Config,
    script: &[ScriptLine],
    only: &[String],
) -> Result<Replay, CompileError> {
    let calls: Rc<RefCell<Vec<(String, String)>>> = Rc::default();
    let mut binder = Binder::new(config.key_map.clone(), config.settings.clone())?;

    for handler in config.key_map.handlers() {
        if !only.is_empty() && !only.iter().any(|h| h == handler) {
            continue;
        }
        let calls = Rc::clone(&calls);
        let name = handler.to_string();
        binder.on(handler, move |press: &KeyPress| {
            calls
                .borrow_mut()
                .push((name.clone(), press.key().to_string()));
        });
    }

    let mut replay = Replay::default();
    for ScriptLine { line, event } in script {
        let mut payload = KeyPress::new(event.key().unwrap_or_default());
        let outcome = binder.dispatch(event, &mut payload);

        for (handler, key) in calls.borrow_mut().drain(..) {
            replay.invocations.push(Invocation {
                line: *line,
                handler,
                key,
                default_prevented: payload.default_prevented(),
            });
        }
        replay.outcomes.push((*line, event.clone(), outcome));
    }

    Ok(replay)
}

/// Human readable form of an outcome
pub fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Dispatched(handler) => format!("dispatched '{}'", handler),
        Outcome::Unhandled(handler) => format!("matched '{}' (no handler)", handler),
        Outcome::Tracking => "tracking".to_string(),
        Outcome::Idle => "idle".to_string(),
        Outcome::Swallowed => "swallowed".to_string(),
        Outcome::Rejected => "rejected".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use keychord_config::{parse_config_str, DeadPathPolicy};

    use super::*;
    use crate::script::parse_script;

    const CONFIG: &str = r#"
        settings {
            prevent-default true
        }
        keymap {
            save "Control" "s"
            palette "Control" "k" "p"
            close "Control" "k" "w"
        }
    "#;

    fn handlers(replay: &Replay) -> Vec<&str> {
        replay
            .invocations
            .iter()
            .map(|i| i.handler.as_str())
            .collect()
    }

    #[test]
    fn test_replay_dispatches_with_lines() {
        let config = parse_config_str(CONFIG).unwrap();
        let script = parse_script("down Control\ndown s\ndown Control\ndown k\ndown w\n").unwrap();

        let replay = replay(&config, &script, &[]).unwrap();
        assert_eq!(handlers(&replay), vec!["save", "close"]);
        assert_eq!(
            replay.invocations[0],
            Invocation {
                line: 2,
                handler: "save".to_string(),
                key: "s".to_string(),
                default_prevented: true,
            }
        );
        assert_eq!(replay.invocations[1].line, 5);
        assert_eq!(replay.outcomes.len(), 5);
        assert_eq!(replay.outcomes[0].2, Outcome::Tracking);
    }

    #[test]
    fn test_replay_meta_release_and_blur() {
        let config = parse_config_str(CONFIG).unwrap();
        let script = parse_script(
            "down Control\ndown k\nup Meta\ndown p\ndown Control\nblur\ndown s\n",
        )
        .unwrap();

        let replay = replay(&config, &script, &[]).unwrap();
        assert!(replay.invocations.is_empty());
        assert_eq!(replay.outcomes[2].2, Outcome::Swallowed);
        assert_eq!(replay.outcomes[5].2, Outcome::Swallowed);
    }

    #[test]
    fn test_replay_only_selected_handlers() {
        let config = parse_config_str(CONFIG).unwrap();
        let script = parse_script("down Control\ndown s\ndown Control\ndown k\ndown p\n").unwrap();

        let replay = replay(&config, &script, &["palette".to_string()]).unwrap();
        assert_eq!(handlers(&replay), vec!["palette"]);
        assert_eq!(replay.outcomes[1].2, Outcome::Unhandled("save".to_string()));
    }

    #[test]
    fn test_replay_honours_dead_path_setting() {
        let mut config = parse_config_str(CONFIG).unwrap();
        config.settings.dead_path = DeadPathPolicy::Retain;
        let script = parse_script("down Control\ndown x\ndown Control\ndown s\n").unwrap();

        let replay = replay(&config, &script, &[]).unwrap();
        assert!(replay.invocations.is_empty());
        assert_eq!(replay.outcomes[3].2, Outcome::Tracking);
    }

    #[test]
    fn test_invocation_json() {
        let invocation = Invocation {
            line: 7,
            handler: "save".to_string(),
            key: "s".to_string(),
            default_prevented: false,
        };
        assert_eq!(
            serde_json::to_string(&invocation).unwrap(),
            r#"{"line":7,"handler":"save","key":"s","default_prevented":false}"#
        );
    }

    #[test]
    fn test_describe_outcomes() {
        assert_eq!(describe(&Outcome::Dispatched("save".into())), "dispatched 'save'");
        assert_eq!(describe(&Outcome::Swallowed), "swallowed");
    }
}
