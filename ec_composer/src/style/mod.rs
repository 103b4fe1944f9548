// Styles: fitness functions over compositions.
//
// A style is stateless with respect to the compositions it rates; it may hold
// configuration derived once at construction (register bounds, instrument
// limits). Two capabilities matter to the search:
//
// - `qualify_sketch_node`: a per-node gate consulted while a composition is
//   being elongated.
// - `rate_rendered`: the score in [0, 1] of a whole rendering.
//
// Compositions record one score per style, keyed by `name()`.
//
// Stock styles: `golden` (golden-section climax contour) and `cello`
// (unaccompanied cello playability).

pub mod cello;
pub mod golden;

use crate::composition::Composition;
use crate::sketch::SketchNode;
use std::sync::Arc;

pub trait Style: Send + Sync {
    /// Stable key for this style's entry in a composition's score record.
    fn name(&self) -> &str;

    fn qualify_sketch_node(&self, node: &SketchNode) -> bool;

    fn rate_rendered(&self, rendered: &[Arc<SketchNode>]) -> f64;

    /// Rate the composition's checked rendering.
    fn rate_composition(&self, composition: &mut Composition) -> f64 {
        self.rate_rendered(composition.rendered_checked())
    }
}
