// Compositions: a genome of connectors grown from a seed node, plus the
// derived rendering and the per-style scores.
//
// The rendering (`rendered`) is a cache of the genome. It is trusted only
// while `staleness()` finds nothing wrong with it. The checks run in order:
//
//   1. nothing rendered yet
//   2. the genome changed since rendering (`genome_version` moved past
//      `rendered_version`; every connector append/replace and seed swap
//      bumps the genome version)
//   3. the first rendered node, or the first connector's `previous`, is not
//      the current seed (compared by sketch-node id)
//   4. `rendered.len() != connectors.len() + 1`
//   5. a connector is missing `previous` or `next`
//   6. `connectors[i - 1].next` is not `rendered[i]`
//
// Any hit forces a full re-render before scores are trusted. Scores carry
// their own version stamp (`scored_version`); `rendered_checked()` recomputes
// them whenever they lag the genome, which is how an incremental elongation
// (cache extended in place, scores left stale) gets rescored lazily.

use crate::connector::Connector;
use crate::context::ComposerContext;
use crate::sketch::SketchNode;
use crate::style::Style;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Composer-namespaced composition id. Orders by serial.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompositionId {
    pub serial: u64,
    pub namespace: String,
}

impl fmt::Display for CompositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-C{:04}", self.namespace, self.serial)
    }
}

/// Why a rendering can't be trusted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Staleness {
    NotRendered,
    GenomeChanged { rendered: u64, current: u64 },
    SeedMismatch,
    SizeMismatch { rendered: usize, expected: usize },
    BrokenChain { index: usize },
    Diverged { index: usize },
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Staleness::NotRendered => write!(f, "not rendered yet"),
            Staleness::GenomeChanged { rendered, current } => {
                write!(f, "genome changed (rendered v{rendered}, now v{current})")
            }
            Staleness::SeedMismatch => write!(f, "seed replaced since rendering"),
            Staleness::SizeMismatch { rendered, expected } => {
                write!(f, "rendered {rendered} nodes, genome needs {expected}")
            }
            Staleness::BrokenChain { index } => write!(f, "connector {index} not wired"),
            Staleness::Diverged { index } => write!(f, "node {index} diverged from its connector"),
        }
    }
}

pub struct Composition {
    id: CompositionId,
    ctx: Arc<ComposerContext>,
    seed: Arc<SketchNode>,
    connectors: Vec<Connector>,
    rendered: Vec<Arc<SketchNode>>,
    genome_version: u64,
    rendered_version: Option<u64>,
    scored_version: Option<u64>,
    scores: BTreeMap<String, f64>,
    origin_generation: u64,
}

impl Composition {
    pub fn new(ctx: Arc<ComposerContext>, seed: Arc<SketchNode>) -> Self {
        Composition {
            id: ctx.ids().next_composition(),
            ctx,
            seed,
            connectors: Vec::new(),
            rendered: Vec::new(),
            genome_version: 0,
            rendered_version: None,
            scored_version: None,
            scores: BTreeMap::new(),
            origin_generation: 0,
        }
    }

    /// A seed-only composition with a fresh qualifying seed.
    pub fn seeded(ctx: Arc<ComposerContext>, rng: &mut impl Rng) -> Self {
        let seed = ctx.new_seed(rng);
        Composition::new(ctx, seed)
    }

    /// Record the generation this composition was created in.
    pub fn with_origin(mut self, generation: u64) -> Self {
        self.origin_generation = generation;
        self
    }

    pub fn id(&self) -> &CompositionId {
        &self.id
    }

    pub fn context(&self) -> &Arc<ComposerContext> {
        &self.ctx
    }

    pub fn seed(&self) -> &Arc<SketchNode> {
        &self.seed
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    /// The cached rendering as is, without a consistency check.
    pub fn rendered(&self) -> &[Arc<SketchNode>] {
        &self.rendered
    }

    pub fn origin_generation(&self) -> u64 {
        self.origin_generation
    }

    pub fn genome_version(&self) -> u64 {
        self.genome_version
    }

    /// Node count of the genome: seed plus one per connector.
    pub fn size(&self) -> usize {
        self.connectors.len() + 1
    }

    pub fn add_connector(&mut self, connector: Connector) {
        self.connectors.push(connector);
        self.genome_version += 1;
    }

    /// Swap the connector at `index`, returning the old one.
    pub fn replace_connector(&mut self, index: usize, connector: Connector) -> Option<Connector> {
        let slot = self.connectors.get_mut(index)?;
        let old = std::mem::replace(slot, connector);
        self.genome_version += 1;
        Some(old)
    }

    pub fn set_seed(&mut self, seed: Arc<SketchNode>) {
        self.seed = seed;
        self.genome_version += 1;
    }

    /// Thread the seed through every connector and rebuild the cache.
    pub fn render(&mut self) {
        let ctx = Arc::clone(&self.ctx);
        let mut rendered = Vec::with_capacity(self.connectors.len() + 1);
        rendered.push(Arc::clone(&self.seed));
        let mut current = Arc::clone(&self.seed);
        for connector in &mut self.connectors {
            connector.set_previous(current);
            let Some(next) = connector.transform(ctx.ids()) else {
                break;
            };
            rendered.push(Arc::clone(&next));
            current = next;
        }
        self.rendered = rendered;
        self.rendered_version = Some(self.genome_version);
    }

    /// First reason the cache can't be trusted, if any.
    pub fn staleness(&self) -> Option<Staleness> {
        let Some(first) = self.rendered.first() else {
            return Some(Staleness::NotRendered);
        };
        match self.rendered_version {
            Some(v) if v == self.genome_version => {}
            Some(v) => {
                return Some(Staleness::GenomeChanged {
                    rendered: v,
                    current: self.genome_version,
                });
            }
            None => return Some(Staleness::NotRendered),
        }
        if first.id() != self.seed.id() {
            return Some(Staleness::SeedMismatch);
        }
        if let Some(connector) = self.connectors.first() {
            if connector.previous().is_none_or(|p| p.id() != self.seed.id()) {
                return Some(Staleness::SeedMismatch);
            }
        }
        if self.rendered.len() != self.size() {
            return Some(Staleness::SizeMismatch {
                rendered: self.rendered.len(),
                expected: self.size(),
            });
        }
        if let Some(index) = self.connectors.iter().position(|c| !c.is_wired()) {
            return Some(Staleness::BrokenChain { index });
        }
        (1..self.rendered.len())
            .find(|&i| {
                self.connectors[i - 1]
                    .next()
                    .is_none_or(|next| next.id() != self.rendered[i].id())
            })
            .map(|index| Staleness::Diverged { index })
    }

    /// True when the cache must be rebuilt before it (or any score) is used.
    pub fn if_rerender_required(&self) -> bool {
        match self.staleness() {
            Some(reason) => {
                debug!(composition = %self.id, %reason, "re-render required");
                true
            }
            None => {
                trace!(composition = %self.id, "rendering consistent");
                false
            }
        }
    }

    /// Re-render if the cache is stale. Returns whether it did.
    pub fn ensure_rendered(&mut self) -> bool {
        if self.if_rerender_required() {
            self.render();
            true
        } else {
            false
        }
    }

    /// True when the score record predates the current genome.
    pub fn scores_stale(&self) -> bool {
        self.scored_version != Some(self.genome_version)
    }

    /// True when either the rendering or the scores need work.
    pub fn needs_evaluation(&self) -> bool {
        self.scores_stale() || self.staleness().is_some()
    }

    /// The rendering, re-rendered and rescored first if anything is stale.
    pub fn rendered_checked(&mut self) -> &[Arc<SketchNode>] {
        if self.ensure_rendered() || self.scores_stale() {
            self.update_eval();
        }
        &self.rendered
    }

    /// Rescore the current rendering against every registered style.
    pub fn update_eval(&mut self) {
        let ctx = Arc::clone(&self.ctx);
        for style in ctx.styles() {
            let score = style.rate_rendered(&self.rendered);
            self.scores.insert(style.name().to_string(), score);
        }
        self.scored_version = Some(self.genome_version);
    }

    /// Score this composition under one style and record the result.
    pub fn update_score(&mut self, style: &dyn Style) -> f64 {
        let score = style.rate_composition(self);
        self.scores.insert(style.name().to_string(), score);
        score
    }

    pub fn score(&self, style: &str) -> Option<f64> {
        self.scores.get(style).copied()
    }

    pub fn scores(&self) -> &BTreeMap<String, f64> {
        &self.scores
    }

    /// Mean over all recorded style scores; 0 when nothing is scored.
    pub fn mean_score(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.values().sum::<f64>() / self.scores.len() as f64
    }

    pub fn min_score(&self) -> Option<f64> {
        self.scores.values().copied().reduce(f64::min)
    }

    /// Graft the genome onto `seed`. A no-op when the composition is already
    /// rendered consistently from this very seed.
    pub fn reset_seed(&mut self, seed: Arc<SketchNode>) {
        if self.seed.id() == seed.id() && self.staleness().is_none() {
            return;
        }
        self.set_seed(seed);
        self.rendered_checked();
    }

    /// Grow the genome by one connector whose output satisfies `condition`.
    ///
    /// Draws up to `max_elongation_attempts` fresh connectors. If none
    /// qualifies the last draw is kept anyway, so growth never stalls; the
    /// return value says whether the appended node qualified. The cache is
    /// extended in place and the scores are left stale.
    pub fn elongation(&mut self, rng: &mut impl Rng, condition: impl Fn(&SketchNode) -> bool) -> bool {
        self.ensure_rendered();
        let ctx = Arc::clone(&self.ctx);
        let Some(last) = self.rendered.last().cloned() else {
            return false;
        };
        let mut candidate = None;
        for _ in 0..ctx.max_elongation_attempts() {
            let mut connector = ctx.new_connector(rng);
            connector.set_previous(Arc::clone(&last));
            let Some(next) = connector.transform(ctx.ids()) else {
                continue;
            };
            let qualified = condition(&next);
            candidate = Some((connector, next, qualified));
            if qualified {
                break;
            }
        }
        let Some((connector, next, qualified)) = candidate else {
            return false;
        };
        if !qualified {
            debug!(composition = %self.id, node = %next.id(), "no qualifying extension; keeping last draw");
        }
        self.add_connector(connector);
        self.rendered.push(next);
        self.rendered_version = Some(self.genome_version);
        qualified
    }

    /// Same seed material and the same transform sequence.
    pub fn same_content(&self, other: &Composition) -> bool {
        *self.seed == *other.seed
            && self.connectors.len() == other.connectors.len()
            && self
                .connectors
                .iter()
                .zip(&other.connectors)
                .all(|(a, b)| a.same_genome(b))
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Composition {} (size {}, generation {})",
            self.id,
            self.size(),
            self.origin_generation
        )?;
        write!(f, "scores:")?;
        for (style, score) in &self.scores {
            write!(f, " {style}={score:.4}")?;
        }
        writeln!(f)?;
        writeln!(f, "seed: {}", self.seed)?;
        for connector in &self.connectors {
            writeln!(f, "{}", connector.to_string_next())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composition")
            .field("id", &self.id)
            .field("size", &self.size())
            .field("rendered", &self.rendered.len())
            .field("genome_version", &self.genome_version)
            .field("rendered_version", &self.rendered_version)
            .field("scored_version", &self.scored_version)
            .field("scores", &self.scores)
            .finish_non_exhaustive()
    }
}
