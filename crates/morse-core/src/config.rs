use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DecoderError, Result};
use crate::types::Mark;

/// Top-level configuration for the Morse decoder.
///
/// Loaded from `~/.morse/config.toml` by default. Every section falls back
/// to its defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecoderConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub glyphs: GlyphConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
}

impl DecoderConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed. The loaded
    /// values are not validated here; see [`DecoderConfig::validate`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DecoderConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check every section, failing on the first malformed value.
    pub fn validate(&self) -> Result<()> {
        self.timing.validate()?;
        self.glyphs.validate()?;
        self.translation.validate(&self.glyphs)
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Timing thresholds, all in signed milliseconds.
///
/// Key-down intervals are non-negative and key-up intervals are negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Longest key-down interval still classified as `ShortMark`.
    pub short_mark_max_ms: i64,
    /// Most negative key-up interval still classified as `ShortGap`.
    pub short_gap_min_ms: i64,
    /// Long gap threshold. Its absolute value is the idle tick period.
    pub long_gap_ms: i64,
    /// Synthetic `LongGap` ticks emitted per pause. Zero disables them.
    pub idle_tick_limit: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            short_mark_max_ms: 150,
            short_gap_min_ms: -300,
            long_gap_ms: -800,
            idle_tick_limit: 4,
        }
    }
}

impl TimingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.short_mark_max_ms < 0 {
            return Err(DecoderError::Config(format!(
                "timing.short_mark_max_ms must be >= 0, got {}",
                self.short_mark_max_ms
            )));
        }
        if self.short_gap_min_ms >= 0 {
            return Err(DecoderError::Config(format!(
                "timing.short_gap_min_ms must be negative, got {}",
                self.short_gap_min_ms
            )));
        }
        if self.long_gap_ms >= 0 {
            return Err(DecoderError::Config(format!(
                "timing.long_gap_ms must be negative, got {}",
                self.long_gap_ms
            )));
        }
        // The idle tick must not fire while a short gap is still possible.
        if self.long_gap_ms > self.short_gap_min_ms {
            return Err(DecoderError::Config(format!(
                "timing.long_gap_ms ({}) must not be shorter than timing.short_gap_min_ms ({})",
                self.long_gap_ms, self.short_gap_min_ms
            )));
        }
        Ok(())
    }

    /// Period of the idle gap timer, `|long_gap_ms|`.
    pub fn idle_period(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.long_gap_ms.unsigned_abs())
    }
}

/// Characters used to render marks. Symbols are rendered from the
/// `short_mark` and `long_mark` glyphs, which the translation table keys on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlyphConfig {
    pub short_mark: char,
    pub long_mark: char,
    pub short_gap: char,
    pub long_gap: char,
}

impl Default for GlyphConfig {
    fn default() -> Self {
        Self {
            short_mark: '.',
            long_mark: '-',
            short_gap: '+',
            long_gap: '*',
        }
    }
}

impl GlyphConfig {
    pub fn glyph(&self, mark: Mark) -> char {
        match mark {
            Mark::ShortMark => self.short_mark,
            Mark::LongMark => self.long_mark,
            Mark::ShortGap => self.short_gap,
            Mark::LongGap => self.long_gap,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let glyphs = [self.short_mark, self.long_mark, self.short_gap, self.long_gap];
        let unique: HashSet<char> = glyphs.iter().copied().collect();
        if unique.len() != glyphs.len() {
            return Err(DecoderError::Config(format!(
                "glyphs must be distinct, got {:?}",
                glyphs
            )));
        }
        if glyphs.iter().any(|c| c.is_whitespace()) {
            return Err(DecoderError::Config(
                "glyphs must not be whitespace".to_string(),
            ));
        }
        Ok(())
    }
}

/// One symbol-to-letter mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationEntry {
    pub symbol: String,
    pub letter: char,
}

impl TranslationEntry {
    pub fn new(symbol: impl Into<String>, letter: char) -> Self {
        Self {
            symbol: symbol.into(),
            letter,
        }
    }
}

/// Translation table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Placeholder emitted for symbols missing from the table.
    pub sentinel: String,
    /// Append the international Morse table after `entries`.
    pub use_default_table: bool,
    /// Extra entries, consulted before the default table. Symbols use the
    /// configured `short_mark` / `long_mark` glyphs.
    pub entries: Vec<TranslationEntry>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            sentinel: "ERROR".to_string(),
            use_default_table: true,
            entries: Vec::new(),
        }
    }
}

impl TranslationConfig {
    pub fn validate(&self, glyphs: &GlyphConfig) -> Result<()> {
        if self.sentinel.is_empty() {
            return Err(DecoderError::Config(
                "translation.sentinel must not be empty".to_string(),
            ));
        }
        for entry in &self.entries {
            if entry.symbol.is_empty() {
                return Err(DecoderError::Config(format!(
                    "translation entry for '{}' has an empty symbol",
                    entry.letter
                )));
            }
            let valid = entry
                .symbol
                .chars()
                .all(|c| c == glyphs.short_mark || c == glyphs.long_mark);
            if !valid {
                return Err(DecoderError::Config(format!(
                    "translation entry '{}' for '{}' may only contain '{}' and '{}'",
                    entry.symbol, entry.letter, glyphs.short_mark, glyphs.long_mark
                )));
            }
        }
        Ok(())
    }
}
