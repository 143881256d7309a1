//! End-to-end tests for the decoder pipeline.
//!
//! Each test builds its own engine and drives it with explicit key
//! timestamps. Timer tests run on a paused tokio clock.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::TryRecvError};

use morse_core::config::{DecoderConfig, TimingConfig, TranslationEntry};
use morse_core::{DecoderEvent, Letter, Mark, MarkSource, Timestamp, TranslationTable};
use morse_decoder::{DecoderEngine, KeyOutcome, KeyState, Misuse};

// =============================================================================
// Helpers
// =============================================================================

const DIT: i64 = 80;
const DAH: i64 = 300;
const ELEMENT_GAP: i64 = 100;
const LETTER_GAP: i64 = 600;

fn drain<T: Clone>(rx: &mut broadcast::Receiver<T>) -> Vec<T> {
    let mut out = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(v) => out.push(v),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => return out,
        }
    }
}

/// Key one letter starting at `start`. Returns the last release time.
fn key_letter(engine: &DecoderEngine, start: i64, elements: &[i64]) -> i64 {
    let mut t = start;
    for (i, held) in elements.iter().enumerate() {
        if i > 0 {
            t += ELEMENT_GAP;
        }
        assert_eq!(engine.press(Timestamp(t)), KeyOutcome::Accepted);
        t += held;
        assert_eq!(engine.release(Timestamp(t)), KeyOutcome::Accepted);
    }
    t
}

/// Key a sequence of letters separated by letter gaps.
fn key_letters(engine: &DecoderEngine, letters: &[&[i64]]) -> i64 {
    let mut t = 0;
    for (i, elements) in letters.iter().enumerate() {
        if i > 0 {
            t += LETTER_GAP;
        }
        t = key_letter(engine, t, elements);
    }
    t
}

fn text(letters: &[Letter]) -> String {
    letters.iter().map(|l| l.to_string()).collect()
}

// =============================================================================
// SOS
// =============================================================================

#[tokio::test]
async fn test_sos_marks_symbols_letters() {
    let engine = DecoderEngine::new(&DecoderConfig::default()).unwrap();
    let mut marks = engine.subscribe_marks();
    let mut symbols = engine.subscribe_symbols();
    let mut letters = engine.subscribe_letters();

    key_letters(&engine, &[&[DIT; 3], &[DAH; 3], &[DIT; 3]]);
    engine.inject_mark(Mark::LongGap);

    use Mark::*;
    assert_eq!(
        drain(&mut marks),
        vec![
            ShortMark, ShortGap, ShortMark, ShortGap, ShortMark, LongGap, //
            LongMark, ShortGap, LongMark, ShortGap, LongMark, LongGap, //
            ShortMark, ShortGap, ShortMark, ShortGap, ShortMark, LongGap,
        ]
    );

    let symbols: Vec<String> = drain(&mut symbols).iter().map(|s| s.to_string()).collect();
    assert_eq!(symbols, vec!["...", "---", "..."]);

    let letters = drain(&mut letters);
    assert_eq!(
        letters,
        vec![
            Letter::Char { letter: 'S' },
            Letter::Char { letter: 'O' },
            Letter::Char { letter: 'S' },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_sos_closed_by_idle_timeout() {
    let engine = DecoderEngine::new(&DecoderConfig::default()).unwrap();
    let mut letters = engine.subscribe_letters();

    key_letters(&engine, &[&[DIT; 3], &[DAH; 3], &[DIT; 3]]);
    assert_eq!(text(&drain(&mut letters)), "SO");

    tokio::time::sleep(Duration::from_millis(850)).await;
    assert_eq!(text(&drain(&mut letters)), "S");
}

#[tokio::test]
async fn test_letter_s_with_minimal_table() {
    let table = TranslationTable::new(vec![TranslationEntry::new("...", 'S')]);
    let engine = DecoderEngine::with_table(&DecoderConfig::default(), table).unwrap();
    let mut symbols = engine.subscribe_symbols();
    let mut letters = engine.subscribe_letters();

    for mark in [
        Mark::ShortMark,
        Mark::ShortGap,
        Mark::ShortMark,
        Mark::ShortGap,
        Mark::ShortMark,
        Mark::LongGap,
    ] {
        engine.inject_mark(mark);
    }

    let symbols = drain(&mut symbols);
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].mark_names(), "ShortMark,ShortMark,ShortMark");
    assert_eq!(drain(&mut letters), vec![Letter::Char { letter: 'S' }]);
}

// =============================================================================
// Idle timeout
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_idle_emits_at_most_four_long_gaps() {
    let engine = DecoderEngine::new(&DecoderConfig::default()).unwrap();
    let mut marks = engine.subscribe_marks();

    key_letter(&engine, 0, &[DIT]);
    assert_eq!(drain(&mut marks), vec![Mark::ShortMark]);

    // Period is |long_gap_ms| = 800ms. Check between ticks.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(drain(&mut marks).is_empty());
    for expected in 1..=4usize {
        tokio::time::sleep(Duration::from_millis(800)).await;
        let ticks = drain(&mut marks);
        assert_eq!(ticks, vec![Mark::LongGap], "tick {}", expected);
    }

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(drain(&mut marks).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_press_after_first_tick_cancels_rest() {
    let engine = DecoderEngine::new(&DecoderConfig::default()).unwrap();
    let mut events = engine.subscribe_events();

    let released = key_letter(&engine, 0, &[DAH]);
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    engine.press(Timestamp(released + 1_000));
    tokio::time::sleep(Duration::from_secs(60)).await;

    let synthetic = drain(&mut events)
        .iter()
        .filter(|e| {
            matches!(
                e,
                DecoderEvent::Mark {
                    source: MarkSource::Synthetic,
                    ..
                }
            )
        })
        .count();
    assert_eq!(synthetic, 1);
    assert_eq!(engine.state(), KeyState::PressPending);
}

#[tokio::test(start_paused = true)]
async fn test_custom_idle_period_and_limit() {
    let mut config = DecoderConfig::default();
    config.timing = TimingConfig {
        short_gap_min_ms: -150,
        long_gap_ms: -200,
        idle_tick_limit: 2,
        ..TimingConfig::default()
    };
    let engine = DecoderEngine::new(&config).unwrap();
    let mut marks = engine.subscribe_marks();

    key_letter(&engine, 0, &[DIT]);
    tokio::time::sleep(Duration::from_millis(450)).await;
    assert_eq!(
        drain(&mut marks),
        vec![Mark::ShortMark, Mark::LongGap, Mark::LongGap]
    );

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(drain(&mut marks).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_idle_ticks_never_emit_empty_symbols() {
    let engine = DecoderEngine::new(&DecoderConfig::default()).unwrap();
    let mut symbols = engine.subscribe_symbols();

    key_letter(&engine, 0, &[DAH, DIT]);
    tokio::time::sleep(Duration::from_secs(10)).await;

    let symbols = drain(&mut symbols);
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].as_str(), "-.");
}

#[tokio::test(start_paused = true)]
async fn test_disabled_idle_timer() {
    let mut config = DecoderConfig::default();
    config.timing.idle_tick_limit = 0;
    let engine = DecoderEngine::new(&config).unwrap();
    let mut marks = engine.subscribe_marks();

    key_letter(&engine, 0, &[DIT]);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(drain(&mut marks), vec![Mark::ShortMark]);
}

// =============================================================================
// Unknown symbols and misuse
// =============================================================================

#[tokio::test]
async fn test_unknown_symbol_yields_sentinel_and_continues() {
    let mut config = DecoderConfig::default();
    config.translation.sentinel = "ERROR".to_string();
    let engine = DecoderEngine::new(&config).unwrap();
    let mut letters = engine.subscribe_letters();

    // Eight dits is not in the table
    key_letters(&engine, &[&[DIT; 8], &[DAH], &[DIT, DAH]]);
    engine.inject_mark(Mark::LongGap);

    let letters = drain(&mut letters);
    assert_eq!(letters.len(), 3);
    assert!(letters[0].is_sentinel());
    assert_eq!(letters[0].to_string(), "ERROR");
    assert_eq!(letters[1], Letter::Char { letter: 'T' });
    assert_eq!(letters[2], Letter::Char { letter: 'A' });
}

#[tokio::test]
async fn test_misuse_is_ignored_without_breaking_decoding() {
    let engine = DecoderEngine::new(&DecoderConfig::default()).unwrap();
    let mut letters = engine.subscribe_letters();

    assert_eq!(
        engine.release(Timestamp(0)),
        KeyOutcome::Ignored(Misuse::ReleaseWithoutPress)
    );
    engine.press(Timestamp(10));
    assert_eq!(
        engine.press(Timestamp(20)),
        KeyOutcome::Ignored(Misuse::PressWhilePending)
    );
    engine.release(Timestamp(10 + DAH));
    engine.inject_mark(Mark::LongGap);

    assert_eq!(text(&drain(&mut letters)), "T");
}

#[tokio::test]
async fn test_configured_entry_overrides_default() {
    let mut config = DecoderConfig::default();
    config
        .translation
        .entries
        .push(TranslationEntry::new("...-.-", '%'));
    let engine = DecoderEngine::new(&config).unwrap();
    let mut letters = engine.subscribe_letters();

    key_letter(&engine, 0, &[DIT, DIT, DIT, DAH, DIT, DAH]);
    engine.inject_mark(Mark::LongGap);
    assert_eq!(text(&drain(&mut letters)), "%");
}

// =============================================================================
// Threads
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_engine_driven_from_blocking_thread() {
    let engine = Arc::new(DecoderEngine::new(&DecoderConfig::default()).unwrap());
    let mut letters = engine.subscribe_letters();

    let driver = Arc::clone(&engine);
    tokio::task::spawn_blocking(move || {
        key_letters(&driver, &[&[DIT; 3], &[DAH; 3], &[DIT; 3]]);
        driver.inject_mark(Mark::LongGap);
    })
    .await
    .unwrap();

    let mut decoded = String::new();
    while decoded.len() < 3 {
        let letter = tokio::time::timeout(Duration::from_secs(2), letters.recv())
            .await
            .expect("letter within timeout")
            .unwrap();
        decoded.push_str(&letter.to_string());
    }
    assert_eq!(decoded, "SOS");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_idle_tick_after_press_returns() {
    let mut config = DecoderConfig::default();
    config.timing = TimingConfig {
        short_mark_max_ms: 1_000,
        short_gap_min_ms: -2,
        long_gap_ms: -4,
        idle_tick_limit: 4,
    };
    let engine = DecoderEngine::new(&config).unwrap();
    let mut marks = engine.subscribe_marks();

    let mut t = 0;
    for i in 0..200u64 {
        engine.press(Timestamp(t));
        t += 1;
        engine.release(Timestamp(t));

        // Pauses straddle the 4ms tick period so cancels race live ticks.
        tokio::time::sleep(Duration::from_millis(i % 7)).await;
        t += 100;
        assert_eq!(engine.press(Timestamp(t)), KeyOutcome::Accepted);
        drain(&mut marks);

        // The key is held, so nothing may arrive until the next release.
        tokio::time::sleep(Duration::from_millis(6)).await;
        assert!(drain(&mut marks).is_empty(), "late tick in round {}", i);

        t += 1;
        engine.release(Timestamp(t));
        drain(&mut marks);
        t += 100;
    }
}
