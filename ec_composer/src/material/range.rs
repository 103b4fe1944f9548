// Register material.
//
// A `SciRange` is a scientific-pitch register named by its octave (C0..C8).
// `NoteRanges` holds one register per division step, drawn from the
// instrument's playable registers. Moving forward or backward shifts every
// register one octave, saturating at the outer bounds, so a move may leave
// the instrument's range; styles decide whether that is acceptable.
//
// Intensity is the register's position between a style-supplied lowest and
// highest register, clamped to [0, 1].

use super::{DEFAULT_DIVISION, IntensityScale, MaterialKind, MaterialParams, MusicMaterial, TransformKind};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A register identified by its scientific octave number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SciRange(u8);

impl SciRange {
    pub const LOWEST: SciRange = SciRange(0);
    pub const HIGHEST: SciRange = SciRange(8);

    /// Register for `octave`, saturating at `HIGHEST`.
    pub const fn new(octave: u8) -> Self {
        if octave > Self::HIGHEST.0 {
            Self::HIGHEST
        } else {
            SciRange(octave)
        }
    }

    pub fn octave(self) -> u8 {
        self.0
    }

    pub fn up(self) -> Self {
        SciRange::new(self.0.saturating_add(1))
    }

    pub fn down(self) -> Self {
        SciRange(self.0.saturating_sub(1))
    }

    /// Position of `self` between `lowest` and `highest`, clamped to [0, 1].
    pub fn intensity_index(self, lowest: SciRange, highest: SciRange) -> f64 {
        if highest <= lowest {
            return if self >= highest { 1.0 } else { 0.0 };
        }
        let span = (highest.0 - lowest.0) as f64;
        ((self.0 as f64 - lowest.0 as f64) / span).clamp(0.0, 1.0)
    }

    pub fn all() -> impl Iterator<Item = SciRange> {
        (Self::LOWEST.0..=Self::HIGHEST.0).map(SciRange)
    }
}

impl fmt::Display for SciRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// One register per division step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRanges {
    division: usize,
    ranges: Vec<SciRange>,
}

impl Default for NoteRanges {
    fn default() -> Self {
        NoteRanges {
            division: DEFAULT_DIVISION,
            ranges: Vec::new(),
        }
    }
}

impl NoteRanges {
    pub fn from_ranges(ranges: Vec<SciRange>) -> Self {
        NoteRanges {
            division: ranges.len(),
            ranges,
        }
    }

    pub fn ranges(&self) -> &[SciRange] {
        &self.ranges
    }

    fn with_ranges(&self, ranges: Vec<SciRange>) -> Self {
        NoteRanges {
            division: self.division,
            ranges,
        }
    }
}

impl MusicMaterial for NoteRanges {
    fn kind(&self) -> MaterialKind {
        MaterialKind::NoteRanges
    }

    fn division(&self) -> usize {
        self.division
    }

    fn set_division(&mut self, division: usize) {
        self.division = division;
    }

    fn len(&self) -> usize {
        self.ranges.len()
    }

    fn reset(&mut self, params: &MaterialParams) {
        self.division = params.default_division;
        self.ranges.clear();
    }

    fn generate(&mut self, params: &MaterialParams, rng: &mut impl Rng) {
        let pool: Vec<SciRange> = if params.note_ranges.is_empty() {
            SciRange::all().collect()
        } else {
            params.note_ranges.clone()
        };
        self.ranges = (0..self.division)
            .map(|_| pool[rng.random_range(0..pool.len())])
            .collect();
    }

    fn transform(&self, kind: TransformKind) -> Self {
        match kind {
            TransformKind::Repetition => self.duplicate(),
            TransformKind::Retrograde => self.with_ranges(self.ranges.iter().rev().copied().collect()),
            TransformKind::MoveForward => self.with_ranges(self.ranges.iter().map(|r| r.up()).collect()),
            TransformKind::MoveBackward => self.with_ranges(self.ranges.iter().map(|r| r.down()).collect()),
            TransformKind::Disconnected => NoteRanges::default(),
        }
    }

    fn intensity_indexes(&self, scale: &IntensityScale) -> Vec<f64> {
        self.ranges
            .iter()
            .map(|r| r.intensity_index(scale.lowest, scale.highest))
            .collect()
    }
}

impl fmt::Display for NoteRanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NoteRanges(")?;
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{range}")?;
        }
        write!(f, ")")
    }
}
