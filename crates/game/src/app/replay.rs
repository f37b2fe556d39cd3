use std::fs;
use std::path::Path;

use dungeon_engine::{GameSession, KeyCode};
use serde::Deserialize;
use tracing::{debug, info};

use super::loop_runner::AppError;

/// Frames run when no replay script is given.
pub(crate) const IDLE_FRAMES: u64 = 120;

/// Scripted key input for a headless run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ReplayScript {
    pub(crate) frames: u64,
    #[serde(default)]
    pub(crate) events: Vec<ReplayEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ReplayEvent {
    pub(crate) frame: u64,
    pub(crate) key: KeyCode,
    pub(crate) pressed: bool,
}

impl ReplayScript {
    pub(crate) fn idle(frames: u64) -> Self {
        Self {
            frames,
            events: Vec::new(),
        }
    }

    /// Every event must land inside the run and events must be listed in
    /// frame order.
    pub(crate) fn validate(&self) -> Result<(), String> {
        let mut last_frame = 0;
        for (idx, event) in self.events.iter().enumerate() {
            if event.frame >= self.frames {
                return Err(format!(
                    "events[{idx}].frame {} is outside the run of {} frames",
                    event.frame, self.frames
                ));
            }
            if event.frame < last_frame {
                return Err(format!(
                    "events[{idx}].frame {} comes after frame {last_frame}",
                    event.frame
                ));
            }
            last_frame = event.frame;
        }
        Ok(())
    }

    /// Feeds each frame's key events to the session, then steps it.
    pub(crate) fn play(&self, session: &mut GameSession) {
        let mut events = self.events.iter().peekable();
        for frame in 0..self.frames {
            while let Some(event) = events.next_if(|event| event.frame == frame) {
                debug!(frame, key = ?event.key, pressed = event.pressed, "replay_key");
                if event.pressed {
                    session.key_down(event.key);
                } else {
                    session.key_up(event.key);
                }
            }
            session.step();
        }
    }
}

pub(crate) fn load_replay(path: Option<&Path>) -> Result<ReplayScript, AppError> {
    let Some(path) = path else {
        return Ok(ReplayScript::idle(IDLE_FRAMES));
    };
    let raw = fs::read_to_string(path).map_err(|source| AppError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let script = parse_replay_json(&raw)
        .and_then(|script| script.validate().map(|()| script))
        .map_err(|message| AppError::Replay {
            path: path.to_path_buf(),
            message,
        })?;
    info!(
        path = %path.display(),
        frames = script.frames,
        events = script.events.len(),
        "replay_loaded"
    );
    Ok(script)
}

pub(crate) fn parse_replay_json(raw: &str) -> Result<ReplayScript, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, ReplayScript>(&mut deserializer) {
        Ok(script) => Ok(script),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("parse replay json: {source}"))
            } else {
                Err(format!("parse replay json at {path}: {source}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn parses_events_and_defaults_to_none() {
        let raw = json!({
            "frames": 10,
            "events": [
                { "frame": 0, "key": "KeyD", "pressed": true },
                { "frame": 4, "key": "KeyD", "pressed": false }
            ]
        })
        .to_string();
        let script = parse_replay_json(&raw).expect("script");
        assert_eq!(script.frames, 10);
        assert_eq!(
            script.events[1],
            ReplayEvent {
                frame: 4,
                key: KeyCode::KeyD,
                pressed: false
            }
        );
        script.validate().expect("valid");

        let script = parse_replay_json(&json!({ "frames": 3 }).to_string()).expect("script");
        assert!(script.events.is_empty());
    }

    #[test]
    fn bad_key_reports_event_path() {
        let raw = json!({
            "frames": 10,
            "events": [ { "frame": 0, "key": "Jump", "pressed": true } ]
        })
        .to_string();
        let error = parse_replay_json(&raw).expect_err("bad key");
        assert!(error.contains("events[0].key"));
    }

    #[test]
    fn validation_rejects_out_of_range_and_unordered_events() {
        let event = |frame| ReplayEvent {
            frame,
            key: KeyCode::KeyE,
            pressed: true,
        };
        let script = ReplayScript {
            frames: 5,
            events: vec![event(5)],
        };
        assert!(script.validate().expect_err("range").contains("events[0]"));

        let script = ReplayScript {
            frames: 5,
            events: vec![event(3), event(1)],
        };
        assert!(script.validate().expect_err("order").contains("events[1]"));
    }

    #[test]
    fn missing_path_is_an_idle_run_and_bad_file_is_an_error() {
        assert_eq!(load_replay(None).expect("idle"), ReplayScript::idle(IDLE_FRAMES));

        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("replay.json");
        let raw = json!({
            "frames": 2,
            "events": [ { "frame": 9, "key": "KeyE", "pressed": true } ]
        });
        fs::write(&path, raw.to_string()).expect("write");
        let error = load_replay(Some(&path)).expect_err("invalid");
        assert!(matches!(error, AppError::Replay { .. }));
    }
}
