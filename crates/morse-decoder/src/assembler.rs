//! Partitions the mark stream into symbols at `LongGap` boundaries.

use morse_core::config::GlyphConfig;
use morse_core::{Mark, Symbol};

#[derive(Debug, Clone)]
pub struct SymbolAssembler {
    glyphs: GlyphConfig,
    pending: Vec<Mark>,
}

impl SymbolAssembler {
    pub fn new(glyphs: GlyphConfig) -> Self {
        Self {
            glyphs,
            pending: Vec::new(),
        }
    }

    /// Feed one mark.
    ///
    /// A `LongGap` closes the accumulated marks and returns them as a
    /// symbol, unless nothing but gaps was accumulated. Any other mark is
    /// buffered and `None` is returned.
    pub fn push(&mut self, mark: Mark) -> Option<Symbol> {
        if mark != Mark::LongGap {
            self.pending.push(mark);
            return None;
        }
        let closed = std::mem::take(&mut self.pending);
        Symbol::render(closed, &self.glyphs)
    }

    /// Marks buffered since the last boundary.
    pub fn pending(&self) -> &[Mark] {
        &self.pending
    }
}
