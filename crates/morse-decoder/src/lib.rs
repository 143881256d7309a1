//! Morse decoder crate - turns key press/release timestamps into marks,
//! symbols and letters.
//!
//! Pipeline: `IntervalClassifier` -> `IdleGapSynthesizer` (synthetic
//! `LongGap`s after a pause) -> `SymbolAssembler` -> `LetterTranslator`,
//! composed and published by `DecoderEngine`.

pub mod assembler;
pub mod classifier;
pub mod engine;
pub mod idle;
pub mod state;
pub mod translator;

pub use assembler::SymbolAssembler;
pub use classifier::IntervalClassifier;
pub use engine::DecoderEngine;
pub use idle::{GapSink, IdleGapSynthesizer};
pub use state::{KeyOutcome, KeyState, KeyTracker, Misuse};
pub use translator::LetterTranslator;
