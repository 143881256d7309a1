//! Decoder engine composing the full pipeline.
//!
//! Press and release timestamps are classified into marks, marks are
//! assembled into symbols, symbols are translated into letters. Each stage
//! publishes on its own broadcast channel. Every subscriber has its own
//! cursor and only sees values sent after it subscribed.
//!
//! All stages sit behind one mutex, including the idle gap timer state, so
//! marks reach the assembler in emission order and an idle tick can never
//! be delivered after the press that cancelled it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use morse_core::config::DecoderConfig;
use morse_core::error::{DecoderError, Result};
use morse_core::{
    DecoderEvent, KeyEvent, KeyEventKind, Letter, Mark, MarkSource, Symbol, Timestamp,
    TranslationTable,
};

use crate::assembler::SymbolAssembler;
use crate::classifier::IntervalClassifier;
use crate::idle::{GapSink, IdleGapSynthesizer};
use crate::state::{KeyOutcome, KeyState, KeyTracker};
use crate::translator::LetterTranslator;

/// Streaming Morse decoder.
///
/// Must be created inside a tokio runtime, which drives the idle gap
/// timer. `press`, `release` and `inject_mark` never block on the timer
/// and can be called from any thread.
pub struct DecoderEngine {
    shared: Arc<Shared>,
}

struct Shared {
    id: Uuid,
    pipeline: Mutex<Pipeline>,
    channels: Channels,
}

struct Pipeline {
    keys: KeyTracker,
    classifier: IntervalClassifier,
    idle: IdleGapSynthesizer,
    assembler: SymbolAssembler,
    translator: LetterTranslator,
}

struct Channels {
    keys: broadcast::Sender<KeyEvent>,
    marks: broadcast::Sender<Mark>,
    symbols: broadcast::Sender<Symbol>,
    letters: broadcast::Sender<Letter>,
    events: broadcast::Sender<DecoderEvent>,
}

impl Channels {
    fn new(capacity: usize) -> Self {
        Self {
            keys: broadcast::channel(capacity).0,
            marks: broadcast::channel(capacity).0,
            symbols: broadcast::channel(capacity).0,
            letters: broadcast::channel(capacity).0,
            events: broadcast::channel(capacity).0,
        }
    }
}

impl std::fmt::Debug for DecoderEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderEngine")
            .field("id", &self.shared.id)
            .field("state", &self.state())
            .finish()
    }
}

impl DecoderEngine {
    /// Buffered values per output channel before slow subscribers lag.
    pub const CHANNEL_CAPACITY: usize = 256;

    /// Create an engine using the translation table described by `config`.
    pub fn new(config: &DecoderConfig) -> Result<Self> {
        let table = TranslationTable::from_config(&config.translation, &config.glyphs);
        Self::with_table(config, table)
    }

    /// Create an engine with an explicit translation table.
    ///
    /// Fails if `config` is invalid or no tokio runtime is running.
    pub fn with_table(config: &DecoderConfig, table: TranslationTable) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| {
            DecoderError::Runtime(format!("Decoder engine requires a tokio runtime: {}", e))
        })?;

        let timing = config.timing;
        let pipeline = Pipeline {
            keys: KeyTracker::new(),
            classifier: IntervalClassifier::new(timing),
            idle: IdleGapSynthesizer::new(timing.idle_period(), timing.idle_tick_limit, runtime),
            assembler: SymbolAssembler::new(config.glyphs),
            translator: LetterTranslator::new(table, config.translation.sentinel.clone()),
        };

        let id = Uuid::new_v4();
        info!(
            engine_id = %id,
            short_mark_max_ms = timing.short_mark_max_ms,
            short_gap_min_ms = timing.short_gap_min_ms,
            long_gap_ms = timing.long_gap_ms,
            idle_tick_limit = timing.idle_tick_limit,
            table_entries = pipeline.translator.table().len(),
            "Decoder engine created"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                id,
                pipeline: Mutex::new(pipeline),
                channels: Channels::new(Self::CHANNEL_CAPACITY),
            }),
        })
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn state(&self) -> KeyState {
        self.shared.lock().keys.state()
    }

    /// Key pressed at `at`.
    ///
    /// Cancels the idle timer. If the key was released before, the
    /// release-to-press gap is classified and emitted first. A press while
    /// another is pending is ignored.
    pub fn press(&self, at: Timestamp) -> KeyOutcome {
        let shared = &self.shared;
        let mut pipeline = shared.lock();

        let gap = match pipeline.keys.press(at) {
            Ok(gap) => gap,
            Err(misuse) => {
                warn!(engine_id = %shared.id, at = at.0, %misuse, "Ignoring key press");
                return KeyOutcome::Ignored(misuse);
            }
        };

        pipeline.idle.cancel();
        shared.publish_key(KeyEventKind::Press, at);

        if let Some(idle_ms) = gap {
            let mark = pipeline.classifier.classify_gap(idle_ms);
            debug!(engine_id = %shared.id, idle_ms, %mark, "Gap classified");
            shared.emit_mark(&mut pipeline, mark, MarkSource::Classified);
        }
        KeyOutcome::Accepted
    }

    /// Key released at `at`.
    ///
    /// Classifies the held interval, emits the mark and restarts the idle
    /// timer. A release with no pending press is ignored.
    pub fn release(&self, at: Timestamp) -> KeyOutcome {
        let shared = &self.shared;
        let sink: Arc<dyn GapSink> = shared.clone();
        let mut pipeline = shared.lock();

        let held = match pipeline.keys.release(at) {
            Ok(held) => held,
            Err(misuse) => {
                warn!(engine_id = %shared.id, at = at.0, %misuse, "Ignoring key release");
                return KeyOutcome::Ignored(misuse);
            }
        };

        shared.publish_key(KeyEventKind::Release, at);
        let mark = pipeline.classifier.classify_mark(held);
        debug!(engine_id = %shared.id, held_ms = held, %mark, "Mark classified");
        pipeline.idle.restart(sink);
        shared.emit_mark(&mut pipeline, mark, MarkSource::Classified);
        KeyOutcome::Accepted
    }

    /// Push `mark` straight into the mark stream, skipping classification.
    pub fn inject_mark(&self, mark: Mark) {
        let shared = &self.shared;
        let mut pipeline = shared.lock();
        debug!(engine_id = %shared.id, %mark, "Mark injected");
        shared.emit_mark(&mut pipeline, mark, MarkSource::Injected);
    }

    /// Accepted press and release events.
    pub fn subscribe_key_events(&self) -> broadcast::Receiver<KeyEvent> {
        self.shared.channels.keys.subscribe()
    }

    /// Classified, synthetic and injected marks in emission order.
    pub fn subscribe_marks(&self) -> broadcast::Receiver<Mark> {
        self.shared.channels.marks.subscribe()
    }

    pub fn subscribe_symbols(&self) -> broadcast::Receiver<Symbol> {
        self.shared.channels.symbols.subscribe()
    }

    pub fn subscribe_letters(&self) -> broadcast::Receiver<Letter> {
        self.shared.channels.letters.subscribe()
    }

    /// All of the above wrapped in [`DecoderEvent`], in emission order.
    pub fn subscribe_events(&self) -> broadcast::Receiver<DecoderEvent> {
        self.shared.channels.events.subscribe()
    }
}

impl Drop for DecoderEngine {
    fn drop(&mut self) {
        self.shared.lock().idle.cancel();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Pipeline> {
        // Every pipeline update completes before any send, so a poisoned
        // lock still guards consistent state.
        self.pipeline.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_key(&self, kind: KeyEventKind, at: Timestamp) {
        let event = KeyEvent { kind, at };
        // Send errors only mean nobody is subscribed.
        let _ = self.channels.keys.send(event);
        let _ = self.channels.events.send(DecoderEvent::Key(event));
    }

    fn emit_mark(&self, pipeline: &mut Pipeline, mark: Mark, source: MarkSource) {
        let _ = self.channels.marks.send(mark);
        let _ = self.channels.events.send(DecoderEvent::Mark { mark, source });

        let Some(symbol) = pipeline.assembler.push(mark) else {
            return;
        };
        debug!(engine_id = %self.id, symbol = %symbol, "Symbol assembled");
        let letter = pipeline.translator.translate(&symbol);
        debug!(engine_id = %self.id, letter = %letter, "Letter decoded");

        let _ = self.channels.symbols.send(symbol.clone());
        let _ = self.channels.events.send(DecoderEvent::Symbol { symbol });
        let _ = self.channels.letters.send(letter.clone());
        let _ = self.channels.events.send(DecoderEvent::Letter { letter });
    }
}

impl GapSink for Shared {
    fn deliver_tick(&self, generation: u64) -> bool {
        let mut pipeline = self.lock();
        if !pipeline.idle.is_current(generation) {
            return false;
        }
        debug!(engine_id = %self.id, generation, "Idle gap synthesized");
        self.emit_mark(&mut pipeline, Mark::LongGap, MarkSource::Synthetic);
        true
    }
}
