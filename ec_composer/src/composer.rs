// The generational search loop.
//
// A `Composer` owns the live population, the append-only archive of
// per-generation summaries, and the conservatory of accepted compositions.
// One generation is `compose()` followed by `evolve()`:
//
//   compose  every individual short of the aim's target size grows by one
//            connector (elongation gated by the registered styles)
//   evolve   1. bump the generation counter
//            2. render and rescore every stale individual on the rayon pool
//            3. admit accepted individuals to the conservatory, in id order,
//               skipping content duplicates, up to `population_size` entries
//            4. append the generation summary to the archive
//            5. breed: graduates are replaced by fresh immigrants; among the
//               remaining completed individuals the best `elite_fraction`
//               (by mean score) survive and the rest are replaced by
//               crossover children of two distinct completed parents
//
// `run()` repeats the pair until the conservatory reaches `goal_size` or the
// generation counter reaches `max_generations`.
//
// Only the composer's own thread mutates population, archive and
// conservatory. The pool only renders and scores individuals in place.

use crate::aim::Aim;
use crate::composition::{Composition, CompositionId};
use crate::config::ComposerConfig;
use crate::context::ComposerContext;
use crate::error::ComposerError;
use crate::sink::{ChartSink, CompositionSink};
use crate::style::Style;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// A conservatory member and the generation it was admitted in.
#[derive(Debug)]
pub struct ConservatoryEntry {
    pub composition: Composition,
    pub generation: u64,
}

/// One individual as it stood at the end of a generation's evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub id: CompositionId,
    pub size: usize,
    pub completed: bool,
    pub origin_generation: u64,
    pub scores: BTreeMap<String, f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generation: u64,
    /// Sorted by composition id.
    pub entries: Vec<ArchiveEntry>,
    /// Mean score per style over the whole population.
    pub averages: BTreeMap<String, f64>,
    /// Ids admitted to the conservatory this generation.
    pub conserved: Vec<CompositionId>,
}

impl GenerationSummary {
    pub fn completed(&self) -> usize {
        self.entries.iter().filter(|e| e.completed).count()
    }

    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "generation {:>4}: {} individuals, {} completed, {} admitted",
            self.generation,
            self.entries.len(),
            self.completed(),
            self.conserved.len()
        );
        for (style, average) in &self.averages {
            line.push_str(&format!(", {style}={average:.4}"));
        }
        line
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    pub generations: u64,
    pub conserved: usize,
    pub goal_reached: bool,
}

/// Recombine two parents at a single cut point.
///
/// The cut `k` is drawn from `[1, min_len)` where `min_len` is the shorter
/// genome; the child inherits `p0`'s connectors before the cut and `p1`'s
/// from the cut on, under fresh ids. With fewer than two connectors in the
/// shorter parent there is no interior cut, so `k` is drawn from
/// `[0, min_len]` and a cut at 0 takes the whole genome from `p1`. The child
/// is grafted onto `p0`'s seed and rendered before it is returned.
pub fn crossover(p0: &Composition, p1: &Composition, rng: &mut impl Rng) -> Composition {
    let ctx = Arc::clone(p0.context());
    let ids = ctx.ids();
    let min_len = p0.connectors().len().min(p1.connectors().len());
    let cut = if min_len >= 2 {
        rng.random_range(1..min_len)
    } else {
        rng.random_range(0..=min_len)
    };
    let head = &p0.connectors()[..cut];
    let tail = &p1.connectors()[cut..];
    let mut child = Composition::new(Arc::clone(&ctx), Arc::clone(p0.seed()));
    for connector in head.iter().chain(tail) {
        child.add_connector(connector.inherit(ids.next_connector()));
    }
    child.reset_seed(Arc::clone(p0.seed()));
    child
}

pub struct Composer<R: Rng = StdRng> {
    id: String,
    config: ComposerConfig,
    ctx: Arc<ComposerContext>,
    population: Vec<Composition>,
    archive: Vec<GenerationSummary>,
    conservatory: BTreeMap<CompositionId, ConservatoryEntry>,
    gen_count: u64,
    rng: R,
    pool: rayon::ThreadPool,
}

impl Composer<StdRng> {
    /// Composer with the stock styles, seeded from `config.rng_seed` or the
    /// OS.
    pub fn new(id: impl Into<String>, config: ComposerConfig) -> Result<Self, ComposerError> {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Composer::with_rng(id, config, rng)
    }
}

impl<R: Rng> Composer<R> {
    pub fn with_rng(id: impl Into<String>, config: ComposerConfig, rng: R) -> Result<Self, ComposerError> {
        let id = id.into();
        let ctx = ComposerContext::standard(id.clone(), &config)?;
        Composer::with_context(id, config, ctx, rng)
    }

    /// Composer scoring with `styles` instead of the stock ones.
    pub fn with_styles(
        id: impl Into<String>,
        config: ComposerConfig,
        styles: Vec<Box<dyn Style>>,
        rng: R,
    ) -> Result<Self, ComposerError> {
        let id = id.into();
        let ctx = ComposerContext::new(id.clone(), styles, &config)?;
        Composer::with_context(id, config, ctx, rng)
    }

    fn with_context(id: String, config: ComposerConfig, ctx: ComposerContext, mut rng: R) -> Result<Self, ComposerError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads.unwrap_or(0))
            .thread_name(|i| format!("ec-eval-{i}"))
            .build()?;
        let ctx = Arc::new(ctx);
        let population = (0..config.population_size)
            .map(|_| Composition::seeded(Arc::clone(&ctx), &mut rng))
            .collect();
        info!(
            composer = %id,
            population = config.population_size,
            goal = config.goal_size,
            max_generations = config.max_generations,
            threads = pool.current_num_threads(),
            "composer ready"
        );
        Ok(Composer {
            id,
            config,
            ctx,
            population,
            archive: Vec::new(),
            conservatory: BTreeMap::new(),
            gen_count: 0,
            rng,
            pool,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn context(&self) -> &Arc<ComposerContext> {
        &self.ctx
    }

    pub fn aim(&self) -> &Aim {
        &self.config.aim
    }

    pub fn population(&self) -> &[Composition] {
        &self.population
    }

    pub fn archive(&self) -> &[GenerationSummary] {
        &self.archive
    }

    pub fn conservatory(&self) -> &BTreeMap<CompositionId, ConservatoryEntry> {
        &self.conservatory
    }

    pub fn generation(&self) -> u64 {
        self.gen_count
    }

    pub fn is_finished(&self) -> bool {
        self.conservatory.len() >= self.config.goal_size || self.gen_count >= self.config.max_generations
    }

    /// Grow every incomplete individual by one connector.
    pub fn compose(&mut self) {
        let ctx = Arc::clone(&self.ctx);
        let aim = self.config.aim;
        for composition in &mut self.population {
            if !aim.is_completed(composition) {
                composition.elongation(&mut self.rng, |node| ctx.qualifies(node));
            }
        }
    }

    /// Advance one generation: evaluate, conserve, archive, breed.
    pub fn evolve(&mut self) {
        self.gen_count += 1;
        self.evaluate_population();
        let graduates = self.select_graduates();
        let summary = self.summarize(&graduates);
        debug!(composer = %self.id, "{}", summary.summary_line());
        self.archive.push(summary);
        self.graduate(graduates);
        self.breed();
    }

    /// Run generations until the goal or the generation ceiling is reached,
    /// handing each new summary to `on_generation`.
    pub fn run(&mut self, mut on_generation: impl FnMut(&GenerationSummary)) -> RunOutcome {
        while !self.is_finished() {
            self.compose();
            self.evolve();
            if let Some(summary) = self.archive.last() {
                on_generation(summary);
            }
        }
        let outcome = RunOutcome {
            generations: self.gen_count,
            conserved: self.conservatory.len(),
            goal_reached: self.conservatory.len() >= self.config.goal_size,
        };
        info!(
            composer = %self.id,
            generations = outcome.generations,
            conserved = outcome.conserved,
            goal_reached = outcome.goal_reached,
            "run finished"
        );
        outcome
    }

    /// A random individual, or a random completed one. `None` when there is
    /// no candidate.
    pub fn random_select(&mut self, completed_only: bool) -> Option<&Composition> {
        let pick = self.random_index(completed_only, None)?;
        self.population.get(pick)
    }

    /// Population index of a random (completed) individual other than
    /// `exclude`.
    fn random_index(&mut self, completed_only: bool, exclude: Option<usize>) -> Option<usize> {
        let aim = self.config.aim;
        let candidates: Vec<usize> = (0..self.population.len())
            .filter(|&i| Some(i) != exclude)
            .filter(|&i| !completed_only || aim.is_completed(&self.population[i]))
            .collect();
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[self.rng.random_range(0..candidates.len())])
    }

    fn evaluate_population(&mut self) {
        let stale = self.population.iter().filter(|c| c.needs_evaluation()).count();
        if stale == 0 {
            return;
        }
        debug!(composer = %self.id, generation = self.gen_count, stale, "evaluating");
        let population = &mut self.population;
        self.pool.install(|| {
            population
                .par_iter_mut()
                .filter(|c| c.needs_evaluation())
                .for_each(|c| {
                    c.rendered_checked();
                });
        });
    }

    /// Population indexes to admit this generation, in id order.
    fn select_graduates(&self) -> Vec<usize> {
        let aim = self.config.aim;
        let capacity = self.config.population_size;
        let mut order: Vec<usize> = (0..self.population.len()).collect();
        order.sort_by(|&a, &b| self.population[a].id().cmp(self.population[b].id()));

        let mut graduates: Vec<usize> = Vec::new();
        for i in order {
            if self.conservatory.len() + graduates.len() >= capacity {
                break;
            }
            let candidate = &self.population[i];
            if !aim.is_accepted(candidate) {
                continue;
            }
            let duplicate = self
                .conservatory
                .values()
                .map(|e| &e.composition)
                .chain(graduates.iter().map(|&g| &self.population[g]))
                .any(|c| c.same_content(candidate));
            if !duplicate {
                graduates.push(i);
            }
        }
        graduates
    }

    fn summarize(&self, graduates: &[usize]) -> GenerationSummary {
        let aim = self.config.aim;
        let mut entries: Vec<ArchiveEntry> = self
            .population
            .iter()
            .map(|c| ArchiveEntry {
                id: c.id().clone(),
                size: c.size(),
                completed: aim.is_completed(c),
                origin_generation: c.origin_generation(),
                scores: c.scores().clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));

        let mut averages = BTreeMap::new();
        for style in self.ctx.styles() {
            let scores: Vec<f64> = entries.iter().filter_map(|e| e.scores.get(style.name()).copied()).collect();
            if !scores.is_empty() {
                averages.insert(style.name().to_string(), scores.iter().sum::<f64>() / scores.len() as f64);
            }
        }

        GenerationSummary {
            generation: self.gen_count,
            entries,
            averages,
            conserved: graduates.iter().map(|&i| self.population[i].id().clone()).collect(),
        }
    }

    /// Move graduates into the conservatory; immigrants take their slots.
    fn graduate(&mut self, graduates: Vec<usize>) {
        for i in graduates {
            let immigrant = self.immigrant();
            let composition = std::mem::replace(&mut self.population[i], immigrant);
            info!(
                composer = %self.id,
                generation = self.gen_count,
                composition = %composition.id(),
                mean_score = composition.mean_score(),
                conserved = self.conservatory.len() + 1,
                "admitted to conservatory"
            );
            self.conservatory.insert(
                composition.id().clone(),
                ConservatoryEntry {
                    composition,
                    generation: self.gen_count,
                },
            );
        }
    }

    fn immigrant(&mut self) -> Composition {
        Composition::seeded(Arc::clone(&self.ctx), &mut self.rng).with_origin(self.gen_count)
    }

    fn breed(&mut self) {
        let aim = self.config.aim;
        let population = &self.population;
        let mut completed: Vec<usize> = (0..population.len())
            .filter(|&i| aim.is_completed(&population[i]))
            .collect();
        if completed.len() < 2 {
            return;
        }
        completed.sort_by(|&a, &b| {
            population[b]
                .mean_score()
                .total_cmp(&population[a].mean_score())
                .then_with(|| population[a].id().cmp(population[b].id()))
        });
        let elite = ((completed.len() as f64 * self.config.elite_fraction).ceil() as usize).min(completed.len());
        let replaced = completed[elite..].to_vec();

        let mut children: Vec<Composition> = Vec::with_capacity(replaced.len());
        for _ in &replaced {
            let child = self.offspring(&children);
            children.push(child);
        }
        for (slot, child) in replaced.into_iter().zip(children) {
            self.population[slot] = child;
        }
    }

    /// A non-duplicate crossover child of two distinct completed parents, or
    /// an immigrant once the attempts run out.
    fn offspring(&mut self, siblings: &[Composition]) -> Composition {
        let ctx = Arc::clone(&self.ctx);
        for _ in 0..self.config.max_crossover_attempts {
            let Some(a) = self.random_index(true, None) else {
                break;
            };
            let Some(b) = self.random_index(true, Some(a)) else {
                break;
            };
            let mut child = crossover(&self.population[a], &self.population[b], &mut self.rng).with_origin(self.gen_count);
            if !child.connectors().is_empty() && self.rng.random_bool(self.config.mutation_rate) {
                let index = self.rng.random_range(0..child.connectors().len());
                child.replace_connector(index, ctx.new_connector(&mut self.rng));
                child.rendered_checked();
            }
            let duplicate = self
                .population
                .iter()
                .chain(siblings)
                .chain(self.conservatory.values().map(|e| &e.composition))
                .any(|c| c.same_content(&child));
            if !duplicate {
                return child;
            }
        }
        debug!(composer = %self.id, generation = self.gen_count, "crossover kept producing duplicates; immigrating");
        self.immigrant()
    }

    /// Per-style average score per generation, from the archive.
    pub fn average_series(&self) -> BTreeMap<String, Vec<(u64, f64)>> {
        let mut series: BTreeMap<String, Vec<(u64, f64)>> = BTreeMap::new();
        for summary in &self.archive {
            for (style, &average) in &summary.averages {
                series.entry(style.clone()).or_default().push((summary.generation, average));
            }
        }
        series
    }

    /// Per-style (generation of origin, score) of every conservatory member
    /// and live individual.
    pub fn scatter_points(&self) -> BTreeMap<String, Vec<(f64, f64)>> {
        let mut points: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();
        let everyone = self.conservatory.values().map(|e| &e.composition).chain(&self.population);
        for composition in everyone {
            for (style, &score) in composition.scores() {
                points
                    .entry(style.clone())
                    .or_default()
                    .push((composition.origin_generation() as f64, score));
            }
        }
        points
    }

    pub fn publish_charts(&self, sink: &mut impl ChartSink) {
        for (style, series) in self.average_series() {
            for (generation, average) in series {
                sink.record_generation(&style, generation, average);
            }
        }
        for (style, points) in self.scatter_points() {
            for (x, y) in points {
                sink.record_scatter(&style, x, y);
            }
        }
    }

    /// Hand every conservatory member to `sink`. Failures are logged and
    /// skipped; returns how many were written.
    pub fn persist_all(&self, sink: &mut impl CompositionSink) -> usize {
        let mut written = 0;
        for (id, entry) in &self.conservatory {
            match sink.persist(id, &entry.composition.to_string()) {
                Ok(()) => written += 1,
                Err(e) => error!(composer = %self.id, composition = %id, "failed to persist: {e}"),
            }
        }
        written
    }
}
