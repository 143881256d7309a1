use serde::{Deserialize, Serialize};

use crate::types::{KeyEvent, Letter, Mark, Symbol};

/// Where a mark entered the mark stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkSource {
    /// Classified from a press/release or release/press interval.
    Classified,
    /// Emitted by the idle gap timer.
    Synthetic,
    /// Supplied through manual injection.
    Injected,
}

/// Everything the decoder publishes, in emission order.
///
/// Consumed by loggers and the JSON output of the `morse` binary. The
/// per-kind streams carry the same values without the envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DecoderEvent {
    Key(KeyEvent),
    Mark { mark: Mark, source: MarkSource },
    Symbol { symbol: Symbol },
    Letter { letter: Letter },
}
