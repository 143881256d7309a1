//! Key scripts: a line-based recording of key activity.
//!
//! ```text
//! # S
//! down 0
//! up 80
//! down 180
//! up 260
//! mark long-gap
//! wait 2000
//! ```
//!
//! `down`, `up` and `wait` take milliseconds from the start of playback
//! and must not go backwards. `mark` injects a mark immediately.

use std::time::Duration;

use morse_core::error::{DecoderError, Result};
use morse_core::{Mark, Timestamp};
use morse_decoder::DecoderEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptCommand {
    Down(i64),
    Up(i64),
    Wait(i64),
    Mark(Mark),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptStep {
    pub line: usize,
    pub command: ScriptCommand,
}

/// Parse a whole script. Blank lines and `#` comments are skipped.
pub fn parse(source: &str) -> Result<Vec<ScriptStep>> {
    let mut steps = Vec::new();
    let mut last_ms = 0i64;

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }

        let mut parts = content.split_whitespace();
        let keyword = parts.next().unwrap_or_default().to_ascii_lowercase();
        let argument = parts.next().ok_or_else(|| DecoderError::Script {
            line,
            message: format!("'{}' needs an argument", keyword),
        })?;
        if let Some(extra) = parts.next() {
            return Err(DecoderError::Script {
                line,
                message: format!("unexpected '{}'", extra),
            });
        }

        let command = match keyword.as_str() {
            "down" | "up" | "wait" => {
                let ms: i64 = argument.parse().map_err(|_| DecoderError::Script {
                    line,
                    message: format!("'{}' is not a millisecond offset", argument),
                })?;
                if ms < last_ms {
                    return Err(DecoderError::Script {
                        line,
                        message: format!("time {} is before previous time {}", ms, last_ms),
                    });
                }
                last_ms = ms;
                match keyword.as_str() {
                    "down" => ScriptCommand::Down(ms),
                    "up" => ScriptCommand::Up(ms),
                    _ => ScriptCommand::Wait(ms),
                }
            }
            "mark" => ScriptCommand::Mark(
                argument
                    .parse()
                    .map_err(|message| DecoderError::Script { line, message })?,
            ),
            other => {
                return Err(DecoderError::Script {
                    line,
                    message: format!("unknown command '{}'", other),
                })
            }
        };
        steps.push(ScriptStep { line, command });
    }

    Ok(steps)
}

/// Play `steps` into `engine` in real time.
///
/// Timed steps wait on the tokio clock until their offset, so idle gap
/// ticks fire between them exactly as they would for a live key.
pub async fn play(engine: &DecoderEngine, steps: &[ScriptStep]) {
    let start = tokio::time::Instant::now();
    let origin = Timestamp::now();
    let at = |ms: i64| start + Duration::from_millis(ms.unsigned_abs());

    for step in steps {
        match step.command {
            ScriptCommand::Down(ms) => {
                tokio::time::sleep_until(at(ms)).await;
                let outcome = engine.press(origin.offset(ms));
                tracing::trace!(line = step.line, ?outcome, "down");
            }
            ScriptCommand::Up(ms) => {
                tokio::time::sleep_until(at(ms)).await;
                let outcome = engine.release(origin.offset(ms));
                tracing::trace!(line = step.line, ?outcome, "up");
            }
            ScriptCommand::Wait(ms) => tokio::time::sleep_until(at(ms)).await,
            ScriptCommand::Mark(mark) => engine.inject_mark(mark),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morse_core::config::DecoderConfig;

    const SOS: &str = "
# S
down 0
up 80
down 180
up 260
down 360
up 440
# O
down 1100
up 1400
down 1500
up 1800
down 1900
up 2200
# S
down 2900
up 2980
down 3080
up 3160
down 3260
up 3340
wait 5000
";

    #[test]
    fn test_parse_commands() {
        let steps = parse("down 0\nup 80 # dit\n\nmark long-gap\nwait 900").unwrap();
        let commands: Vec<ScriptCommand> = steps.iter().map(|s| s.command).collect();
        assert_eq!(
            commands,
            vec![
                ScriptCommand::Down(0),
                ScriptCommand::Up(80),
                ScriptCommand::Mark(Mark::LongGap),
                ScriptCommand::Wait(900),
            ]
        );
        assert_eq!(steps[2].line, 4);
    }

    #[test]
    fn test_parse_rejects_unknown_command() {
        let err = parse("down 0\ntap 10").unwrap_err();
        match err {
            DecoderError::Script { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("tap"));
            }
            other => panic!("Expected Script error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_time_going_backwards() {
        let err = parse("down 100\nup 50").unwrap_err();
        assert!(matches!(err, DecoderError::Script { line: 2, .. }));
    }

    #[test]
    fn test_parse_rejects_bad_arguments() {
        assert!(parse("down").is_err());
        assert!(parse("down soon").is_err());
        assert!(parse("down 1 2").is_err());
        assert!(parse("mark tap").is_err());
    }

    #[test]
    fn test_parse_sos() {
        let steps = parse(SOS).unwrap();
        assert_eq!(steps.len(), 19);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_sos() {
        let engine = DecoderEngine::new(&DecoderConfig::default()).unwrap();
        let mut letters = engine.subscribe_letters();

        play(&engine, &parse(SOS).unwrap()).await;

        let mut decoded = String::new();
        while let Ok(letter) = letters.try_recv() {
            decoded.push_str(&letter.to_string());
        }
        assert_eq!(decoded, "SOS");
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_idle_ticks_between_steps() {
        let engine = DecoderEngine::new(&DecoderConfig::default()).unwrap();
        let mut marks = engine.subscribe_marks();

        play(&engine, &parse("down 0\nup 300\nwait 1200").unwrap()).await;

        let mut seen = Vec::new();
        while let Ok(mark) = marks.try_recv() {
            seen.push(mark);
        }
        assert_eq!(seen, vec![Mark::LongMark, Mark::LongGap]);
    }
}
