// Golden-section climax scorer.
//
// Each rendered node gets a climax index: the unweighted mean, over the
// materials it holds, of each material's average intensity. The ideal
// contour ("standard") rises linearly from 0 to the observed peak at
// `round((N - 1) / phi)` and falls linearly back to 0 at the last node.
//
//   base  = sum(standard[i] * peak)
//   score = (base - sum(|climax[i] - standard[i]| * standard[i])) / base
//
// Positions are weighted by their standard, so a mismatch near the climax
// costs more than one near the edges. Both contours live in [0, peak], which
// bounds the score to [0, 1]; it is 1 exactly when the contours coincide at
// every weighted position. A flat-zero rendering (peak 0) scores 1.
//
// The scorer accepts every node: it judges only whole-composition shape.

use super::Style;
use crate::material::{IntensityScale, MusicMaterial, SciRange};
use crate::sketch::SketchNode;
use std::sync::Arc;

pub const NAME: &str = "golden_section_climax";

/// The golden ratio.
pub const RATIO: f64 = 1.618_033_988_749_895;

/// Ideal climax position for a rendering of `size` nodes.
pub fn peak_node_index(size: usize) -> usize {
    if size == 0 {
        return 0;
    }
    ((size - 1) as f64 / RATIO).round() as usize
}

/// Target contour value at position `i` of a `size`-node rendering whose
/// climax sits at `peak_index` with height `peak`. Zero outside the
/// rendering.
pub fn standard(size: usize, i: usize, peak_index: usize, peak: f64) -> f64 {
    if i >= size {
        return 0.0;
    }
    if i <= peak_index {
        if peak_index == 0 {
            return peak;
        }
        peak * i as f64 / peak_index as f64
    } else {
        let tail = (size - 1 - peak_index) as f64;
        peak * (size - 1 - i) as f64 / tail
    }
}

/// Observed and ideal contours of one rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct ClimaxContour {
    pub climax_indexes: Vec<f64>,
    pub standards: Vec<f64>,
    pub peak: f64,
    pub peak_index: usize,
}

impl ClimaxContour {
    pub fn base(&self) -> f64 {
        self.standards.iter().map(|s| s * self.peak).sum()
    }

    pub fn score(&self) -> f64 {
        let base = self.base();
        if base == 0.0 {
            return 1.0;
        }
        let mismatch: f64 = self
            .climax_indexes
            .iter()
            .zip(&self.standards)
            .map(|(c, s)| (c - s).abs() * s)
            .sum();
        (base - mismatch) / base
    }
}

#[derive(Clone, Debug)]
pub struct GoldenSectionClimax {
    scale: IntensityScale,
}

impl GoldenSectionClimax {
    /// Scorer whose register intensity spans the lowest to highest of
    /// `ranges`.
    pub fn new(ranges: impl IntoIterator<Item = SciRange>) -> Self {
        GoldenSectionClimax {
            scale: IntensityScale::from_ranges(ranges),
        }
    }

    pub fn scale(&self) -> &IntensityScale {
        &self.scale
    }

    pub fn climax_index(&self, node: &SketchNode) -> f64 {
        let mats = node.mats();
        if mats.is_empty() {
            return 0.0;
        }
        let total: f64 = mats.values().map(|m| m.avg_intensity_index(&self.scale)).sum();
        total / mats.len() as f64
    }

    pub fn contour(&self, rendered: &[Arc<SketchNode>]) -> ClimaxContour {
        let climax_indexes: Vec<f64> = rendered.iter().map(|n| self.climax_index(n)).collect();
        let peak = climax_indexes.iter().copied().fold(0.0, f64::max);
        let size = rendered.len();
        let peak_index = peak_node_index(size);
        let standards = (0..size).map(|i| standard(size, i, peak_index, peak)).collect();
        ClimaxContour {
            climax_indexes,
            standards,
            peak,
            peak_index,
        }
    }
}

impl Style for GoldenSectionClimax {
    fn name(&self) -> &str {
        NAME
    }

    fn qualify_sketch_node(&self, _node: &SketchNode) -> bool {
        true
    }

    fn rate_rendered(&self, rendered: &[Arc<SketchNode>]) -> f64 {
        if rendered.is_empty() {
            return 0.0;
        }
        self.contour(rendered).score()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{Dynamics, Intensity, Material, MaterialKind, MaterialParams};
    use crate::sketch::SketchNodeId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeMap;

    fn scorer() -> GoldenSectionClimax {
        GoldenSectionClimax::new(MaterialParams::default().note_ranges)
    }

    /// A node whose only material is one dynamics level.
    fn loudness_node(id: u64, level: Intensity) -> Arc<SketchNode> {
        let mut mats = BTreeMap::new();
        mats.insert(MaterialKind::Dynamics, Material::Dynamics(Dynamics::from_levels(vec![level])));
        Arc::new(SketchNode::new(SketchNodeId(id), mats))
    }

    #[test]
    fn nine_nodes_peak_at_five() {
        assert_eq!(peak_node_index(9), 5);
        assert_eq!(peak_node_index(1), 0);
        assert_eq!(peak_node_index(2), 1);
    }

    #[test]
    fn standard_rises_then_falls() {
        let size = 9;
        let peak_index = peak_node_index(size);
        let contour: Vec<f64> = (0..size).map(|i| standard(size, i, peak_index, 0.8)).collect();
        for i in 0..peak_index {
            assert!(contour[i] < contour[i + 1], "not rising at {i}: {contour:?}");
        }
        for i in peak_index..size - 1 {
            assert!(contour[i] > contour[i + 1], "not falling at {i}: {contour:?}");
        }
        assert_eq!(contour[0], 0.0);
        assert_eq!(contour[peak_index], 0.8);
        assert_eq!(contour[size - 1], 0.0);
        assert_eq!(standard(size, size, peak_index, 0.8), 0.0);
    }

    #[test]
    fn matching_contour_scores_one() {
        // Eight nodes peak at index 4. With a peak of 4/7 the rising standard
        // lands on whole dynamics steps; the falling side (8/21, 4/21) does not.
        let levels = [0, 1, 2, 3, 4, 3, 1, 0];
        let nodes: Vec<_> = levels
            .iter()
            .enumerate()
            .map(|(i, &l)| loudness_node(i as u64, Intensity::ALL[l]))
            .collect();
        let contour = scorer().contour(&nodes);
        assert_eq!(contour.peak_index, 4);
        for i in 0..=contour.peak_index {
            assert!((contour.climax_indexes[i] - contour.standards[i]).abs() < 1e-12);
        }
        assert!((contour.standards[5] - 8.0 / 21.0).abs() < 1e-12);
        assert!(contour.score() < 1.0);

        let exact = ClimaxContour {
            climax_indexes: contour.standards.clone(),
            ..contour
        };
        assert_eq!(exact.score(), 1.0);
    }

    #[test]
    fn single_node_scores_one() {
        let nodes = vec![loudness_node(1, Intensity::Mf)];
        assert_eq!(scorer().rate_rendered(&nodes), 1.0);
    }

    #[test]
    fn silent_rendering_scores_one() {
        let nodes: Vec<_> = (0..5).map(|i| loudness_node(i, Intensity::Ppp)).collect();
        assert_eq!(scorer().contour(&nodes).peak, 0.0);
        assert_eq!(scorer().rate_rendered(&nodes), 1.0);
    }

    #[test]
    fn early_climax_scores_lower_than_golden_climax() {
        let early = [7, 5, 4, 3, 2, 1, 1, 0, 0];
        let golden = [0, 1, 3, 4, 6, 7, 5, 2, 0];
        let build = |levels: &[usize]| -> Vec<Arc<SketchNode>> {
            levels
                .iter()
                .enumerate()
                .map(|(i, &l)| loudness_node(i as u64, Intensity::ALL[l]))
                .collect()
        };
        let early_score = scorer().rate_rendered(&build(&early));
        let golden_score = scorer().rate_rendered(&build(&golden));
        assert!(golden_score > early_score, "{golden_score} <= {early_score}");
    }

    #[test]
    fn random_renderings_score_in_unit_range() {
        let params = MaterialParams::default();
        let mut rng = StdRng::seed_from_u64(17);
        for size in 1..12 {
            let nodes: Vec<_> = (0..size)
                .map(|i| Arc::new(SketchNode::random(SketchNodeId(i), &params, &mut rng)))
                .collect();
            let score = scorer().rate_rendered(&nodes);
            assert!((0.0..=1.0).contains(&score), "size {size}: {score}");
        }
    }

    #[test]
    fn empty_node_has_zero_climax() {
        let node = SketchNode::new(SketchNodeId(1), BTreeMap::new());
        assert_eq!(scorer().climax_index(&node), 0.0);
    }
}
