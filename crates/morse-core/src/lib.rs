pub mod config;
pub mod error;
pub mod events;
pub mod translation;
pub mod types;

pub use config::DecoderConfig;
pub use error::{DecoderError, Result};
pub use events::{DecoderEvent, MarkSource};
pub use translation::TranslationTable;
pub use types::*;
