//! Symbol-to-letter translation with local recovery.
//!
//! A symbol missing from the table becomes [`Letter::Sentinel`] carrying
//! the configured placeholder, so one bad symbol never stops decoding.

use morse_core::{Letter, Symbol, TranslationTable};

#[derive(Debug, Clone)]
pub struct LetterTranslator {
    table: TranslationTable,
    sentinel: String,
}

impl LetterTranslator {
    pub fn new(table: TranslationTable, sentinel: impl Into<String>) -> Self {
        Self {
            table,
            sentinel: sentinel.into(),
        }
    }

    pub fn table(&self) -> &TranslationTable {
        &self.table
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    pub fn translate(&self, symbol: &Symbol) -> Letter {
        match self.table.lookup(symbol.as_str()) {
            Some(letter) => Letter::Char { letter },
            None => {
                tracing::warn!(
                    symbol = %symbol,
                    placeholder = %self.sentinel,
                    "Could not translate symbol to a letter"
                );
                Letter::Sentinel {
                    placeholder: self.sentinel.clone(),
                    symbol: symbol.to_string(),
                }
            }
        }
    }
}
