// Pitch-class material.
//
// A `Pitch` is a pitch class on the fixed 12-step cycle; moving forward or
// backward wraps around the octave. A `PitchSet` is an ordered set of
// distinct pitch classes, so transposing a set and transposing it back
// always yields the same set.
//
// `PitchSets` holds one pitch set per division step. Generation chains the
// sets through common tones: after each set is drawn, `common_tone` of its
// pitches are chosen as presets that the next set must contain. A fresh
// `PitchSetGenerator` is built for every `generate()` call so no preset
// leaks between materials.
//
// Intensity of a single set is its distinct pitch-class count over 12.

use super::{DEFAULT_DIVISION, IntensityScale, MaterialKind, MaterialParams, MusicMaterial, TransformKind};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

const PITCH_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// A pitch class (0 = C ... 11 = B).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pitch(u8);

impl Pitch {
    /// Steps in the pitch cycle.
    pub const COUNT: u8 = 12;

    pub const fn new(class: u8) -> Self {
        Pitch(class % Self::COUNT)
    }

    pub fn class(self) -> u8 {
        self.0
    }

    /// One step up, wrapping B to C.
    pub fn forward(self) -> Self {
        Pitch((self.0 + 1) % Self::COUNT)
    }

    /// One step down, wrapping C to B.
    pub fn backward(self) -> Self {
        Pitch((self.0 + Self::COUNT - 1) % Self::COUNT)
    }

    pub fn all() -> impl Iterator<Item = Pitch> {
        (0..Self::COUNT).map(Pitch)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(PITCH_NAMES[self.0 as usize])
    }
}

/// A set of distinct pitch classes sounding together.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PitchSet {
    pitches: BTreeSet<Pitch>,
}

impl PitchSet {
    pub fn new(pitches: impl IntoIterator<Item = Pitch>) -> Self {
        PitchSet {
            pitches: pitches.into_iter().collect(),
        }
    }

    pub fn pitches(&self) -> &BTreeSet<Pitch> {
        &self.pitches
    }

    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    pub fn contains(&self, pitch: Pitch) -> bool {
        self.pitches.contains(&pitch)
    }

    pub fn forward(&self) -> Self {
        PitchSet::new(self.pitches.iter().map(|p| p.forward()))
    }

    pub fn backward(&self) -> Self {
        PitchSet::new(self.pitches.iter().map(|p| p.backward()))
    }

    /// Distinct pitch classes over 12.
    pub fn intensity_index(&self) -> f64 {
        self.pitches.len() as f64 / Pitch::COUNT as f64
    }
}

impl fmt::Display for PitchSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, pitch) in self.pitches.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{pitch}")?;
        }
        write!(f, "]")
    }
}

/// Number of pitch classes present in every one of `sets`.
pub fn common_tones(sets: &[&PitchSet]) -> usize {
    Pitch::all()
        .filter(|&p| sets.iter().all(|set| set.contains(p)))
        .count()
}

/// Draws pitch sets of bounded size that always contain the current presets.
struct PitchSetGenerator {
    min_pitches: usize,
    max_pitches: usize,
    presets: BTreeSet<Pitch>,
}

impl PitchSetGenerator {
    fn new(params: &MaterialParams, common_tone: usize) -> Self {
        let ceiling = Pitch::COUNT as usize;
        let min_pitches = params.min_pitches.max(common_tone).clamp(1, ceiling);
        let max_pitches = params.max_pitches.clamp(min_pitches, ceiling);
        PitchSetGenerator {
            min_pitches,
            max_pitches,
            presets: BTreeSet::new(),
        }
    }

    fn generate(&self, rng: &mut impl Rng) -> PitchSet {
        let target = rng
            .random_range(self.min_pitches..=self.max_pitches)
            .max(self.presets.len());
        let mut pitches = self.presets.clone();
        while pitches.len() < target {
            pitches.insert(Pitch::new(rng.random_range(0..Pitch::COUNT)));
        }
        PitchSet { pitches }
    }

    fn set_presets(&mut self, presets: BTreeSet<Pitch>) {
        self.presets = presets;
    }
}

/// Choose `count` distinct pitches of `set` to carry into the next set.
fn select_common_tones(set: &PitchSet, count: usize, rng: &mut impl Rng) -> BTreeSet<Pitch> {
    let mut pool: Vec<Pitch> = set.pitches.iter().copied().collect();
    let mut selected = BTreeSet::new();
    while selected.len() < count && !pool.is_empty() {
        let index = rng.random_range(0..pool.len());
        selected.insert(pool.swap_remove(index));
    }
    selected
}

/// One pitch set per division step, chained by common tones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchSets {
    division: usize,
    common_tone: usize,
    sets: Vec<PitchSet>,
}

impl Default for PitchSets {
    fn default() -> Self {
        PitchSets {
            division: DEFAULT_DIVISION,
            common_tone: 0,
            sets: Vec::new(),
        }
    }
}

impl PitchSets {
    /// Material holding exactly `sets`, with division equal to their count.
    pub fn from_sets(sets: Vec<PitchSet>, common_tone: usize) -> Self {
        PitchSets {
            division: sets.len(),
            common_tone,
            sets,
        }
    }

    pub fn sets(&self) -> &[PitchSet] {
        &self.sets
    }

    pub fn common_tone(&self) -> usize {
        self.common_tone
    }

    pub fn set_common_tone(&mut self, common_tone: usize) {
        self.common_tone = common_tone;
    }

    fn with_sets(&self, sets: Vec<PitchSet>) -> Self {
        PitchSets {
            division: self.division,
            common_tone: self.common_tone,
            sets,
        }
    }
}

impl MusicMaterial for PitchSets {
    fn kind(&self) -> MaterialKind {
        MaterialKind::PitchSets
    }

    fn division(&self) -> usize {
        self.division
    }

    fn set_division(&mut self, division: usize) {
        self.division = division;
    }

    fn len(&self) -> usize {
        self.sets.len()
    }

    fn reset(&mut self, params: &MaterialParams) {
        self.division = params.default_division;
        self.common_tone = params.common_tone;
        self.sets.clear();
    }

    fn generate(&mut self, params: &MaterialParams, rng: &mut impl Rng) {
        let mut generator = PitchSetGenerator::new(params, self.common_tone);
        let mut sets = Vec::with_capacity(self.division);
        for _ in 0..self.division {
            let set = generator.generate(rng);
            generator.set_presets(select_common_tones(&set, self.common_tone, rng));
            sets.push(set);
        }
        self.sets = sets;
    }

    fn transform(&self, kind: TransformKind) -> Self {
        match kind {
            TransformKind::Repetition => self.duplicate(),
            TransformKind::Retrograde => self.with_sets(self.sets.iter().rev().cloned().collect()),
            TransformKind::MoveForward => self.with_sets(self.sets.iter().map(PitchSet::forward).collect()),
            TransformKind::MoveBackward => self.with_sets(self.sets.iter().map(PitchSet::backward).collect()),
            TransformKind::Disconnected => PitchSets::default(),
        }
    }

    fn intensity_indexes(&self, _scale: &IntensityScale) -> Vec<f64> {
        self.sets.iter().map(PitchSet::intensity_index).collect()
    }
}

impl fmt::Display for PitchSets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PitchSets(")?;
        for (i, set) in self.sets.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{set}")?;
        }
        write!(f, ")")
    }
}
