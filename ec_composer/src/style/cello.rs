// Unaccompanied cello: an instrument-playability style.
//
// A node is playable when every note-range sub-unit lies inside the cello's
// registers (C2..C5) and no pitch-set sub-unit asks for more simultaneous
// pitches than the instrument can sound. The composition score is the
// fraction of rendered nodes that are playable.
//
// The registers also bound the golden-section scorer's intensity scale.

use super::Style;
use crate::material::{Material, SciRange};
use crate::sketch::SketchNode;
use std::sync::Arc;

pub const NAME: &str = "unaccompanied_cello";

/// Most pitches the cello sounds at once (four strings).
pub const MAX_SIMULTANEOUS_PITCHES: usize = 4;

#[derive(Clone, Debug)]
pub struct UnaccompaniedCello {
    ranges: Vec<SciRange>,
    max_pitches: usize,
}

impl Default for UnaccompaniedCello {
    fn default() -> Self {
        UnaccompaniedCello::new()
    }
}

impl UnaccompaniedCello {
    pub fn new() -> Self {
        UnaccompaniedCello {
            ranges: (2..=5).map(SciRange::new).collect(),
            max_pitches: MAX_SIMULTANEOUS_PITCHES,
        }
    }

    /// Playable registers, lowest first.
    pub fn ranges(&self) -> &[SciRange] {
        &self.ranges
    }

    pub fn max_pitches(&self) -> usize {
        self.max_pitches
    }

    fn playable(&self, material: &Material) -> bool {
        match material {
            Material::NoteRanges(m) => m.ranges().iter().all(|r| self.ranges.contains(r)),
            Material::PitchSets(m) => m.sets().iter().all(|s| s.len() <= self.max_pitches),
            Material::Dynamics(_) | Material::RhythmicPoints(_) => true,
        }
    }
}

impl Style for UnaccompaniedCello {
    fn name(&self) -> &str {
        NAME
    }

    fn qualify_sketch_node(&self, node: &SketchNode) -> bool {
        node.mats().values().all(|m| self.playable(m))
    }

    fn rate_rendered(&self, rendered: &[Arc<SketchNode>]) -> f64 {
        if rendered.is_empty() {
            return 0.0;
        }
        let playable = rendered.iter().filter(|n| self.qualify_sketch_node(n)).count();
        playable as f64 / rendered.len() as f64
    }
}
