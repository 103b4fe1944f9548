// Aim: when a composition is finished growing, and when it is good enough
// for the conservatory.
//
// A composition is *completed* once it reaches the target size; the composer
// stops elongating it and it becomes eligible as a crossover parent. It is
// *accepted* when it is completed, its scores are current, and every
// registered style rated it at or above the threshold.

use crate::composition::Composition;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Aim {
    /// Node count (seed included) a composition must reach.
    pub target_size: usize,
    /// Minimum score every style must give.
    pub score_threshold: f64,
}

impl Default for Aim {
    fn default() -> Self {
        Aim::phrase()
    }
}

impl Aim {
    /// A nine-node phrase, scored at 0.85 or better by every style.
    pub fn phrase() -> Self {
        Aim {
            target_size: 9,
            score_threshold: 0.85,
        }
    }

    pub fn is_completed(&self, composition: &Composition) -> bool {
        composition.size() >= self.target_size
    }

    pub fn is_accepted(&self, composition: &Composition) -> bool {
        if !self.is_completed(composition) || composition.scores_stale() {
            return false;
        }
        composition.context().styles().iter().all(|style| {
            composition
                .score(style.name())
                .is_some_and(|score| score >= self.score_threshold)
        })
    }
}
