// Musical material: the abstract, numeric building blocks of a sketch.
//
// Four material kinds exist, each holding `division` sub-units:
// - `PitchSets`:      one pitch-class set per sub-unit (pitch.rs)
// - `NoteRanges`:     one scientific-pitch register per sub-unit (range.rs)
// - `Dynamics`:       one loudness level per sub-unit (dynamics.rs)
// - `RhythmicPoints`: one attack-point count per sub-unit (rhythm.rs)
//
// Every kind implements the `MusicMaterial` capability trait: generation,
// random generation, duplication, the five-way transform algebra, and a
// normalized intensity index in [0, 1]. The `Material` enum wraps the kinds
// so a sketch node can hold one of each in a single ordered map, and
// delegates every capability to the wrapped kind. Consumers (connectors,
// styles) only ever talk to `Material`.
//
// Transforms never consume randomness. Rendering a genome is therefore a
// pure function of its seed and its connectors.

pub mod dynamics;
pub mod pitch;
pub mod range;
pub mod rhythm;

pub use dynamics::{Dynamics, Intensity};
pub use pitch::{Pitch, PitchSet, PitchSets, common_tones};
pub use range::{NoteRanges, SciRange};
pub use rhythm::RhythmicPoints;

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Division count a freshly reset or disconnected material starts with.
pub const DEFAULT_DIVISION: usize = 1;

/// The closed set of material kinds a sketch node carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MaterialKind {
    PitchSets,
    NoteRanges,
    Dynamics,
    RhythmicPoints,
}

impl MaterialKind {
    pub const ALL: [MaterialKind; 4] = [
        MaterialKind::PitchSets,
        MaterialKind::NoteRanges,
        MaterialKind::Dynamics,
        MaterialKind::RhythmicPoints,
    ];
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MaterialKind::PitchSets => "PitchSets",
            MaterialKind::NoteRanges => "NoteRanges",
            MaterialKind::Dynamics => "Dynamics",
            MaterialKind::RhythmicPoints => "RhythmicPoints",
        };
        f.write_str(name)
    }
}

/// The closed set of transforms a connector may apply to a material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransformKind {
    /// Structurally identical copy.
    Repetition,
    /// Sub-units in reverse order.
    Retrograde,
    /// Every element one step up (pitch cycle, register, level, or time).
    MoveForward,
    /// Every element one step down.
    MoveBackward,
    /// A fresh default instance with no relation to the source.
    Disconnected,
}

impl TransformKind {
    pub const ALL: [TransformKind; 5] = [
        TransformKind::Repetition,
        TransformKind::Retrograde,
        TransformKind::MoveForward,
        TransformKind::MoveBackward,
        TransformKind::Disconnected,
    ];
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransformKind::Repetition => "Repetition",
            TransformKind::Retrograde => "Retrograde",
            TransformKind::MoveForward => "MoveForward",
            TransformKind::MoveBackward => "MoveBackward",
            TransformKind::Disconnected => "Disconnected",
        };
        f.write_str(name)
    }
}

/// Bounds that shape material generation. Loaded as part of `ComposerConfig`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialParams {
    /// Smallest division count `random()` may pick.
    pub min_division: usize,
    /// Largest division count `random()` may pick.
    pub max_division: usize,
    /// Division count restored by `reset()`.
    pub default_division: usize,
    /// Fewest pitches in a generated pitch set.
    pub min_pitches: usize,
    /// Most pitches in a generated pitch set.
    pub max_pitches: usize,
    /// Pitches each pitch set carries over into the next one.
    pub common_tone: usize,
    /// Upper bound on attack points per rhythmic sub-unit; also the
    /// normalizer of rhythmic intensity.
    pub max_rhythmic_points: u8,
    /// Registers note-range material draws from (the instrument's range).
    pub note_ranges: Vec<SciRange>,
}

impl Default for MaterialParams {
    fn default() -> Self {
        MaterialParams {
            min_division: 1,
            max_division: 4,
            default_division: DEFAULT_DIVISION,
            min_pitches: 2,
            max_pitches: 4,
            common_tone: 1,
            max_rhythmic_points: rhythm::DEFAULT_MAX_POINTS,
            note_ranges: (2..=5).map(SciRange::new).collect(),
        }
    }
}

/// Register bounds used to normalize note-range intensity. Styles derive
/// this once from their instrument's range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntensityScale {
    pub lowest: SciRange,
    pub highest: SciRange,
}

impl IntensityScale {
    pub fn new(lowest: SciRange, highest: SciRange) -> Self {
        IntensityScale { lowest, highest }
    }

    /// Scale spanning the lowest and highest of `ranges`, or the full
    /// register span when `ranges` is empty.
    pub fn from_ranges(ranges: impl IntoIterator<Item = SciRange>) -> Self {
        let mut bounds: Option<(SciRange, SciRange)> = None;
        for range in ranges {
            bounds = Some(match bounds {
                None => (range, range),
                Some((lo, hi)) => (lo.min(range), hi.max(range)),
            });
        }
        let (lowest, highest) = bounds.unwrap_or((SciRange::LOWEST, SciRange::HIGHEST));
        IntensityScale { lowest, highest }
    }
}

/// Capabilities every material kind provides.
pub trait MusicMaterial: Clone + PartialEq + fmt::Display {
    fn kind(&self) -> MaterialKind;

    /// Number of sub-units `generate()` will produce.
    fn division(&self) -> usize;

    fn set_division(&mut self, division: usize);

    /// Number of sub-units currently held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Restore the default division and clear all content.
    fn reset(&mut self, params: &MaterialParams);

    /// Fill `division` sub-units, honoring the kind's constraints.
    fn generate(&mut self, params: &MaterialParams, rng: &mut impl Rng);

    /// Pick a division uniformly in `[min_division, max_division]`, then
    /// generate.
    fn random(&mut self, params: &MaterialParams, rng: &mut impl Rng) {
        let division = rng.random_range(params.min_division..=params.max_division);
        self.set_division(division);
        self.generate(params, rng);
    }

    /// Deep value copy; shares no mutable state with `self`.
    fn duplicate(&self) -> Self {
        self.clone()
    }

    fn transform(&self, kind: TransformKind) -> Self;

    /// One intensity sample per sub-unit, each in [0, 1].
    fn intensity_indexes(&self, scale: &IntensityScale) -> Vec<f64>;

    /// Mean of `intensity_indexes`; 0 for empty material.
    fn avg_intensity_index(&self, scale: &IntensityScale) -> f64 {
        let indexes = self.intensity_indexes(scale);
        if indexes.is_empty() {
            return 0.0;
        }
        indexes.iter().sum::<f64>() / indexes.len() as f64
    }
}

/// One material instance of any kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Material {
    PitchSets(PitchSets),
    NoteRanges(NoteRanges),
    Dynamics(Dynamics),
    RhythmicPoints(RhythmicPoints),
}

macro_rules! delegate {
    ($material:expr, $inner:ident => $body:expr) => {
        match $material {
            Material::PitchSets($inner) => $body,
            Material::NoteRanges($inner) => $body,
            Material::Dynamics($inner) => $body,
            Material::RhythmicPoints($inner) => $body,
        }
    };
}

impl Material {
    /// A reset (empty, default-division) instance of `kind`.
    pub fn empty(kind: MaterialKind, params: &MaterialParams) -> Self {
        let mut material = match kind {
            MaterialKind::PitchSets => Material::PitchSets(PitchSets::default()),
            MaterialKind::NoteRanges => Material::NoteRanges(NoteRanges::default()),
            MaterialKind::Dynamics => Material::Dynamics(Dynamics::default()),
            MaterialKind::RhythmicPoints => Material::RhythmicPoints(RhythmicPoints::default()),
        };
        material.reset(params);
        material
    }

    /// A reset instance of `kind` with random division and content.
    pub fn generated(kind: MaterialKind, params: &MaterialParams, rng: &mut impl Rng) -> Self {
        let mut material = Material::empty(kind, params);
        material.random(params, rng);
        material
    }
}

impl MusicMaterial for Material {
    fn kind(&self) -> MaterialKind {
        delegate!(self, m => m.kind())
    }

    fn division(&self) -> usize {
        delegate!(self, m => m.division())
    }

    fn set_division(&mut self, division: usize) {
        delegate!(self, m => m.set_division(division))
    }

    fn len(&self) -> usize {
        delegate!(self, m => m.len())
    }

    fn reset(&mut self, params: &MaterialParams) {
        delegate!(self, m => m.reset(params))
    }

    fn generate(&mut self, params: &MaterialParams, rng: &mut impl Rng) {
        delegate!(self, m => m.generate(params, rng))
    }

    fn transform(&self, kind: TransformKind) -> Self {
        match self {
            Material::PitchSets(m) => Material::PitchSets(m.transform(kind)),
            Material::NoteRanges(m) => Material::NoteRanges(m.transform(kind)),
            Material::Dynamics(m) => Material::Dynamics(m.transform(kind)),
            Material::RhythmicPoints(m) => Material::RhythmicPoints(m.transform(kind)),
        }
    }

    fn intensity_indexes(&self, scale: &IntensityScale) -> Vec<f64> {
        delegate!(self, m => m.intensity_indexes(scale))
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        delegate!(self, m => fmt::Display::fmt(m, f))
    }
}
