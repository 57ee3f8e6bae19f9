//! Path color selection.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::color::Rgba;

/// Colors cycled through by path animations.
pub const PATH_PALETTE: [Rgba; 7] = [
    Rgba::opaque(59, 130, 246),  // blue
    Rgba::opaque(250, 204, 21),  // yellow
    Rgba::opaque(16, 185, 129),  // green
    Rgba::opaque(239, 68, 68),   // red
    Rgba::opaque(139, 92, 246),  // purple
    Rgba::opaque(6, 182, 212),   // cyan
    Rgba::opaque(249, 115, 22),  // orange
];

/// Linear congruential sequence over [`PATH_PALETTE`].
///
/// Seeded once; every call advances `seed = seed * 1664525 + 1013904223`
/// (mod 2^32) and picks `PATH_PALETTE[seed % 7]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteSequence {
    seed: u32,
}

impl PaletteSequence {
    pub const fn with_seed(seed: u32) -> Self {
        Self { seed }
    }

    /// Seed from the wall clock.
    pub fn from_clock() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u32)
            .unwrap_or(0);
        Self::with_seed(millis)
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn next_color(&mut self) -> Rgba {
        self.seed = self.seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        PATH_PALETTE[(self.seed % PATH_PALETTE.len() as u32) as usize]
    }
}

impl Default for PaletteSequence {
    fn default() -> Self {
        Self::from_clock()
    }
}
