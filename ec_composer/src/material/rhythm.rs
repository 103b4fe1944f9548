// Rhythmic material: attack-point counts, one per division step.
//
// Moving forward rotates the sub-units one place earlier in time, moving
// backward one place later; the multiset of counts is preserved. Intensity
// is the count over the material's maximum.

use super::{DEFAULT_DIVISION, IntensityScale, MaterialKind, MaterialParams, MusicMaterial, TransformKind};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default upper bound on attack points per sub-unit.
pub const DEFAULT_MAX_POINTS: u8 = 8;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RhythmicPoints {
    division: usize,
    max_points: u8,
    points: Vec<u8>,
}

impl Default for RhythmicPoints {
    fn default() -> Self {
        RhythmicPoints {
            division: DEFAULT_DIVISION,
            max_points: DEFAULT_MAX_POINTS,
            points: Vec::new(),
        }
    }
}

impl RhythmicPoints {
    /// Material holding `points`, each clamped to `max_points`.
    pub fn from_points(points: Vec<u8>, max_points: u8) -> Self {
        let max_points = max_points.max(1);
        RhythmicPoints {
            division: points.len(),
            max_points,
            points: points.into_iter().map(|p| p.min(max_points)).collect(),
        }
    }

    pub fn points(&self) -> &[u8] {
        &self.points
    }

    pub fn max_points(&self) -> u8 {
        self.max_points
    }

    fn with_points(&self, points: Vec<u8>) -> Self {
        RhythmicPoints {
            division: self.division,
            max_points: self.max_points,
            points,
        }
    }
}

impl MusicMaterial for RhythmicPoints {
    fn kind(&self) -> MaterialKind {
        MaterialKind::RhythmicPoints
    }

    fn division(&self) -> usize {
        self.division
    }

    fn set_division(&mut self, division: usize) {
        self.division = division;
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn reset(&mut self, params: &MaterialParams) {
        self.division = params.default_division;
        self.max_points = params.max_rhythmic_points.max(1);
        self.points.clear();
    }

    fn generate(&mut self, _params: &MaterialParams, rng: &mut impl Rng) {
        self.points = (0..self.division)
            .map(|_| rng.random_range(1..=self.max_points))
            .collect();
    }

    fn transform(&self, kind: TransformKind) -> Self {
        match kind {
            TransformKind::Repetition => self.duplicate(),
            TransformKind::Retrograde => self.with_points(self.points.iter().rev().copied().collect()),
            TransformKind::MoveForward => {
                let mut points = self.points.clone();
                if !points.is_empty() {
                    points.rotate_left(1);
                }
                self.with_points(points)
            }
            TransformKind::MoveBackward => {
                let mut points = self.points.clone();
                if !points.is_empty() {
                    points.rotate_right(1);
                }
                self.with_points(points)
            }
            TransformKind::Disconnected => RhythmicPoints::default(),
        }
    }

    fn intensity_indexes(&self, _scale: &IntensityScale) -> Vec<f64> {
        let max = self.max_points.max(1) as f64;
        self.points
            .iter()
            .map(|&p| (p as f64 / max).min(1.0))
            .collect()
    }
}

impl fmt::Display for RhythmicPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RhythmicPoints(")?;
        for (i, points) in self.points.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{points}")?;
        }
        write!(f, ")")
    }
}
