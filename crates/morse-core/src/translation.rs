//! Ordered symbol-to-letter lookup.
//!
//! Entries are searched front to back and the first exact match wins, so
//! configured entries placed before the default table override it.

use crate::config::{GlyphConfig, TranslationConfig, TranslationEntry};

/// International Morse code, written with `.` and `-`.
const INTERNATIONAL: &[(&str, char)] = &[
    (".-", 'A'),
    ("-...", 'B'),
    ("-.-.", 'C'),
    ("-..", 'D'),
    (".", 'E'),
    ("..-.", 'F'),
    ("--.", 'G'),
    ("....", 'H'),
    ("..", 'I'),
    (".---", 'J'),
    ("-.-", 'K'),
    (".-..", 'L'),
    ("--", 'M'),
    ("-.", 'N'),
    ("---", 'O'),
    (".--.", 'P'),
    ("--.-", 'Q'),
    (".-.", 'R'),
    ("...", 'S'),
    ("-", 'T'),
    ("..-", 'U'),
    ("...-", 'V'),
    (".--", 'W'),
    ("-..-", 'X'),
    ("-.--", 'Y'),
    ("--..", 'Z'),
    ("-----", '0'),
    (".----", '1'),
    ("..---", '2'),
    ("...--", '3'),
    ("....-", '4'),
    (".....", '5'),
    ("-....", '6'),
    ("--...", '7'),
    ("---..", '8'),
    ("----.", '9'),
    (".-.-.-", '.'),
    ("--..--", ','),
    ("..--..", '?'),
    (".----.", '\''),
    ("-.-.--", '!'),
    ("-..-.", '/'),
    ("-.--.", '('),
    ("-.--.-", ')'),
    (".-...", '&'),
    ("---...", ':'),
    ("-.-.-.", ';'),
    ("-...-", '='),
    (".-.-.", '+'),
    ("-....-", '-'),
    ("..--.-", '_'),
    (".-..-.", '"'),
    ("...-..-", '$'),
    (".--.-.", '@'),
];

/// Ordered sequence of [`TranslationEntry`] values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationTable {
    entries: Vec<TranslationEntry>,
}

impl TranslationTable {
    pub fn new(entries: Vec<TranslationEntry>) -> Self {
        Self { entries }
    }

    /// The international table rendered with the default glyphs.
    pub fn international() -> Self {
        Self::international_with(&GlyphConfig::default())
    }

    /// The international table rendered with `glyphs`.
    pub fn international_with(glyphs: &GlyphConfig) -> Self {
        let entries = INTERNATIONAL
            .iter()
            .map(|(symbol, letter)| TranslationEntry::new(rerender(symbol, glyphs), *letter))
            .collect();
        Self { entries }
    }

    /// Configured entries first, then the international table if enabled.
    pub fn from_config(translation: &TranslationConfig, glyphs: &GlyphConfig) -> Self {
        let mut entries = translation.entries.clone();
        if translation.use_default_table {
            entries.extend(Self::international_with(glyphs).entries);
        }
        Self { entries }
    }

    /// First letter whose symbol equals `symbol` exactly.
    pub fn lookup(&self, symbol: &str) -> Option<char> {
        self.entries
            .iter()
            .find(|e| e.symbol == symbol)
            .map(|e| e.letter)
    }

    pub fn entries(&self) -> &[TranslationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn rerender(symbol: &str, glyphs: &GlyphConfig) -> String {
    symbol
        .chars()
        .map(|c| match c {
            '.' => glyphs.short_mark,
            _ => glyphs.long_mark,
        })
        .collect()
}
