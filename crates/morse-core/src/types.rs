use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::GlyphConfig;

// =============================================================================
// Newtype Wrappers - Temporal
// =============================================================================

/// Milliseconds since the Unix epoch.
///
/// Key timestamps only need to be comparable with each other, so callers
/// driving the decoder from a script may use any fixed origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    /// Signed interval `self - earlier` in milliseconds.
    pub fn millis_since(&self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0)
    }

    /// A timestamp `ms` milliseconds after this one.
    pub fn offset(&self, ms: i64) -> Self {
        Self(self.0.saturating_add(ms))
    }
}

// =============================================================================
// Marks
// =============================================================================

/// A classified unit of key timing.
///
/// `ShortMark`/`LongMark` are key-down intervals, `ShortGap`/`LongGap` are
/// key-up intervals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    ShortMark,
    LongMark,
    ShortGap,
    LongGap,
}

impl Mark {
    /// Whether this mark is a key-down interval and so part of a symbol.
    pub fn is_element(&self) -> bool {
        matches!(self, Mark::ShortMark | Mark::LongMark)
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::ShortMark => write!(f, "ShortMark"),
            Mark::LongMark => write!(f, "LongMark"),
            Mark::ShortGap => write!(f, "ShortGap"),
            Mark::LongGap => write!(f, "LongGap"),
        }
    }
}

impl FromStr for Mark {
    type Err = String;

    /// Accepts the variant names as well as the short script forms
    /// `short`, `long`, `short-gap` and `long-gap` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shortmark" | "short" | "dit" => Ok(Mark::ShortMark),
            "longmark" | "long" | "dah" => Ok(Mark::LongMark),
            "shortgap" | "short-gap" => Ok(Mark::ShortGap),
            "longgap" | "long-gap" => Ok(Mark::LongGap),
            other => Err(format!("unknown mark '{}'", other)),
        }
    }
}

// =============================================================================
// Symbols and letters
// =============================================================================

/// One letter's code: the ordered key-down marks between two `LongGap`s.
///
/// Never empty. `text` is the glyph rendering used for table lookup.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSymbol")]
pub struct Symbol {
    marks: Vec<Mark>,
    text: String,
}

/// Unchecked wire form of [`Symbol`].
#[derive(Deserialize)]
struct RawSymbol {
    marks: Vec<Mark>,
    text: String,
}

impl TryFrom<RawSymbol> for Symbol {
    type Error = String;

    /// Accepts only what `Symbol::render` could have produced: at least one
    /// key-down mark, one glyph per mark, and one distinct glyph per kind.
    fn try_from(raw: RawSymbol) -> Result<Self, Self::Error> {
        if raw.marks.is_empty() {
            return Err("symbol has no marks".to_string());
        }
        if let Some(gap) = raw.marks.iter().find(|m| !m.is_element()) {
            return Err(format!("symbol contains gap mark {}", gap));
        }
        let glyphs: Vec<char> = raw.text.chars().collect();
        if glyphs.len() != raw.marks.len() {
            return Err(format!(
                "symbol text '{}' does not match {} marks",
                raw.text,
                raw.marks.len()
            ));
        }

        let mut short = None;
        let mut long = None;
        for (mark, glyph) in raw.marks.iter().zip(&glyphs) {
            let slot = match mark {
                Mark::ShortMark => &mut short,
                _ => &mut long,
            };
            if *slot.get_or_insert(*glyph) != *glyph {
                return Err(format!("symbol text '{}' renders {} twice", raw.text, mark));
            }
        }
        if short.is_some() && short == long {
            return Err(format!("symbol text '{}' uses one glyph for both marks", raw.text));
        }

        Ok(Self {
            marks: raw.marks,
            text: raw.text,
        })
    }
}

impl Symbol {
    /// Render the key-down marks of `marks` with `glyphs`.
    ///
    /// Gap marks are dropped. Returns `None` when nothing is left.
    pub fn render<I>(marks: I, glyphs: &GlyphConfig) -> Option<Self>
    where
        I: IntoIterator<Item = Mark>,
    {
        let marks: Vec<Mark> = marks.into_iter().filter(Mark::is_element).collect();
        if marks.is_empty() {
            return None;
        }
        let text = marks.iter().map(|m| glyphs.glyph(*m)).collect();
        Some(Self { marks, text })
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Mark names joined with commas, e.g. `ShortMark,ShortMark,ShortMark`.
    pub fn mark_names(&self) -> String {
        self.marks
            .iter()
            .map(Mark::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Output of letter translation.
///
/// A symbol missing from the translation table yields `Sentinel` rather
/// than an error, so decoding continues with the next symbol.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Letter {
    Char { letter: char },
    Sentinel { placeholder: String, symbol: String },
}

impl Letter {
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Letter::Sentinel { .. })
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Letter::Char { letter } => write!(f, "{}", letter),
            Letter::Sentinel { placeholder, .. } => f.write_str(placeholder),
        }
    }
}

// =============================================================================
// Raw key events
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyEventKind {
    Press,
    Release,
}

impl fmt::Display for KeyEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyEventKind::Press => write!(f, "press"),
            KeyEventKind::Release => write!(f, "release"),
        }
    }
}

/// A press or release of the key as accepted by the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub kind: KeyEventKind,
    pub at: Timestamp,
}
