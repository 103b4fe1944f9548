// Loudness material: one `Intensity` level (ppp..fff) per division step.
//
// Moving forward makes every level one step louder, moving backward one step
// softer; both saturate at the extremes. Intensity index is the level's
// position on the eight-step scale.

use super::{DEFAULT_DIVISION, IntensityScale, MaterialKind, MaterialParams, MusicMaterial, TransformKind};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dynamic marking, softest to loudest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Intensity {
    Ppp,
    Pp,
    P,
    Mp,
    Mf,
    F,
    Ff,
    Fff,
}

impl Intensity {
    pub const ALL: [Intensity; 8] = [
        Intensity::Ppp,
        Intensity::Pp,
        Intensity::P,
        Intensity::Mp,
        Intensity::Mf,
        Intensity::F,
        Intensity::Ff,
        Intensity::Fff,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn louder(self) -> Self {
        Self::ALL[(self.ordinal() + 1).min(Self::ALL.len() - 1)]
    }

    pub fn softer(self) -> Self {
        Self::ALL[self.ordinal().saturating_sub(1)]
    }

    /// Level position on the scale: 0 for ppp, 1 for fff.
    pub fn intensity_index(self) -> f64 {
        self.ordinal() as f64 / (Self::ALL.len() - 1) as f64
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = match self {
            Intensity::Ppp => "ppp",
            Intensity::Pp => "pp",
            Intensity::P => "p",
            Intensity::Mp => "mp",
            Intensity::Mf => "mf",
            Intensity::F => "f",
            Intensity::Ff => "ff",
            Intensity::Fff => "fff",
        };
        f.write_str(mark)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dynamics {
    division: usize,
    levels: Vec<Intensity>,
}

impl Default for Dynamics {
    fn default() -> Self {
        Dynamics {
            division: DEFAULT_DIVISION,
            levels: Vec::new(),
        }
    }
}

impl Dynamics {
    pub fn from_levels(levels: Vec<Intensity>) -> Self {
        Dynamics {
            division: levels.len(),
            levels,
        }
    }

    pub fn levels(&self) -> &[Intensity] {
        &self.levels
    }

    fn with_levels(&self, levels: Vec<Intensity>) -> Self {
        Dynamics {
            division: self.division,
            levels,
        }
    }
}

impl MusicMaterial for Dynamics {
    fn kind(&self) -> MaterialKind {
        MaterialKind::Dynamics
    }

    fn division(&self) -> usize {
        self.division
    }

    fn set_division(&mut self, division: usize) {
        self.division = division;
    }

    fn len(&self) -> usize {
        self.levels.len()
    }

    fn reset(&mut self, params: &MaterialParams) {
        self.division = params.default_division;
        self.levels.clear();
    }

    fn generate(&mut self, _params: &MaterialParams, rng: &mut impl Rng) {
        self.levels = (0..self.division)
            .map(|_| Intensity::ALL[rng.random_range(0..Intensity::ALL.len())])
            .collect();
    }

    fn transform(&self, kind: TransformKind) -> Self {
        match kind {
            TransformKind::Repetition => self.duplicate(),
            TransformKind::Retrograde => self.with_levels(self.levels.iter().rev().copied().collect()),
            TransformKind::MoveForward => self.with_levels(self.levels.iter().map(|l| l.louder()).collect()),
            TransformKind::MoveBackward => self.with_levels(self.levels.iter().map(|l| l.softer()).collect()),
            TransformKind::Disconnected => Dynamics::default(),
        }
    }

    fn intensity_indexes(&self, _scale: &IntensityScale) -> Vec<f64> {
        self.levels.iter().map(|l| l.intensity_index()).collect()
    }
}

impl fmt::Display for Dynamics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dynamics(")?;
        for (i, level) in self.levels.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{level}")?;
        }
        write!(f, ")")
    }
}
