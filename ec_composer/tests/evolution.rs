// End-to-end tests for the evolutionary composer.
//
// Drives the public API the way the `compose` binary does: build a composer
// from a config, run generations, inspect the archive and the conservatory,
// and write results through the sinks into temp directories. Every run uses
// a fixed RNG seed.

use std::collections::BTreeSet;
use std::sync::Arc;

use ec_composer::aim::Aim;
use ec_composer::composer::{Composer, crossover};
use ec_composer::composition::Composition;
use ec_composer::config::ComposerConfig;
use ec_composer::context::ComposerContext;
use ec_composer::material::{MaterialKind, MusicMaterial, TransformKind};
use ec_composer::sink::{ChartData, JsonChartSink, TextFileSink};
use ec_composer::style::golden::{self, GoldenSectionClimax, peak_node_index, standard};
use ec_composer::style::Style;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn seeded_config(seed: u64) -> ComposerConfig {
    ComposerConfig {
        rng_seed: Some(seed),
        worker_threads: Some(4),
        ..ComposerConfig::default()
    }
}

/// Grow a composition to `size` nodes with the context's qualification gate.
fn grown(ctx: &Arc<ComposerContext>, size: usize, rng: &mut StdRng) -> Composition {
    let mut composition = Composition::seeded(Arc::clone(ctx), rng);
    while composition.size() < size {
        composition.elongation(rng, |node| ctx.qualifies(node));
    }
    composition.rendered_checked();
    composition
}

#[test]
fn default_run_fills_conservatory_within_ceiling() {
    let config = seeded_config(2024);
    assert_eq!(config.population_size, 50);
    assert_eq!(config.goal_size, 10);
    assert_eq!(config.max_generations, 1500);

    let mut composer = Composer::new("e2e", config).unwrap();
    let outcome = composer.run(|_| {});

    let conserved = composer.conservatory().len();
    assert!((10..=50).contains(&conserved), "conservatory holds {conserved}");
    assert!(composer.generation() <= 1500);
    assert!(outcome.goal_reached);
    assert_eq!(outcome.generations, composer.generation());
    assert_eq!(composer.archive().len() as u64, composer.generation());
    assert_eq!(composer.population().len(), 50);

    for entry in composer.conservatory().values() {
        let composition = &entry.composition;
        assert!(composer.aim().is_accepted(composition));
        assert_eq!(composition.rendered().len(), composition.size());
        assert!(!composition.if_rerender_required());
    }
}

#[test]
fn archive_is_append_only_and_ordered() {
    let config = ComposerConfig {
        population_size: 20,
        goal_size: 5,
        max_generations: 30,
        ..seeded_config(11)
    };
    let mut composer = Composer::new("archive", config).unwrap();
    let mut snapshots = Vec::new();
    composer.run(|summary| snapshots.push(summary.clone()));

    assert_eq!(snapshots.len(), composer.archive().len());
    for (i, (seen, stored)) in snapshots.iter().zip(composer.archive()).enumerate() {
        assert_eq!(seen, stored, "summary {i} changed after being archived");
        assert_eq!(stored.generation, i as u64 + 1);
        assert!(stored.entries.windows(2).all(|w| w[0].id < w[1].id));
    }
}

#[test]
fn five_connector_composition_renders_six_nodes() {
    let ctx = Arc::new(ComposerContext::standard("five", &ComposerConfig::default()).unwrap());
    let mut rng = StdRng::seed_from_u64(5);
    let mut composition = Composition::seeded(Arc::clone(&ctx), &mut rng);
    for _ in 0..5 {
        composition.add_connector(ctx.new_connector(&mut rng));
    }
    assert_eq!(composition.size(), 6);
    assert_eq!(composition.rendered_checked().len(), 6);
    assert!(!composition.if_rerender_required());
}

#[test]
fn golden_scorer_on_nine_nodes() {
    let ctx = Arc::new(ComposerContext::standard("golden", &ComposerConfig::default()).unwrap());
    let mut rng = StdRng::seed_from_u64(9);
    let composition = grown(&ctx, 9, &mut rng);
    let scorer = GoldenSectionClimax::new(ctx.materials().note_ranges.iter().copied());

    assert_eq!(peak_node_index(9), 5);
    let contour = scorer.contour(composition.rendered());
    assert_eq!(contour.peak_index, 5);
    if contour.peak > 0.0 {
        for i in 0..5 {
            assert!(contour.standards[i] < contour.standards[i + 1]);
        }
        for i in 5..8 {
            assert!(contour.standards[i] > contour.standards[i + 1]);
        }
    }
    assert_eq!(standard(9, 9, 5, contour.peak), 0.0);

    let score = composition.score(golden::NAME).unwrap();
    assert!((0.0..=1.0).contains(&score));
    assert_eq!(score, scorer.rate_rendered(composition.rendered()));
}

#[test]
fn crossover_children_trace_back_to_parents() {
    let ctx = Arc::new(ComposerContext::standard("cross", &ComposerConfig::default()).unwrap());
    let mut rng = StdRng::seed_from_u64(31);
    for _ in 0..20 {
        let p0 = grown(&ctx, 9, &mut rng);
        let p1 = grown(&ctx, 9, &mut rng);
        let child = crossover(&p0, &p1, &mut rng);

        assert_eq!(child.rendered().len(), child.connectors().len() + 1);
        assert!(!child.if_rerender_required());
        assert!(!child.scores_stale());
        assert_eq!(child.seed().id(), p0.seed().id());

        assert_eq!(*child.rendered()[0], **p0.seed());
        for (i, connector) in child.connectors().iter().enumerate() {
            assert!(
                p0.connectors()[i].same_genome(connector) || p1.connectors()[i].same_genome(connector),
                "connector {i} traces to neither parent"
            );
            let (prev, next) = (&child.rendered()[i], &child.rendered()[i + 1]);
            for (&kind, &transform) in connector.transforms() {
                let expected = prev.mat(kind).map(|m| m.transform(transform));
                assert_eq!(next.mat(kind), expected.as_ref(), "node {} {kind}", i + 1);
            }
        }
    }
}

#[test]
fn disconnected_chain_stays_blank() {
    let ctx = Arc::new(ComposerContext::standard("blank", &ComposerConfig::default()).unwrap());
    let mut rng = StdRng::seed_from_u64(41);
    let mut composition = Composition::seeded(Arc::clone(&ctx), &mut rng);
    let mut cut = ctx.new_connector(&mut rng);
    for kind in MaterialKind::ALL {
        cut.add_transform(kind, TransformKind::Disconnected);
    }
    composition.add_connector(cut);
    let mut hold = ctx.new_connector(&mut rng);
    for kind in MaterialKind::ALL {
        hold.add_transform(kind, TransformKind::MoveForward);
    }
    composition.add_connector(hold);

    let rendered = composition.rendered_checked().to_vec();
    for node in &rendered[1..] {
        assert!(node.mats().values().all(|m| m.is_empty()), "{node}");
    }
    let golden = ctx.style(golden::NAME).unwrap();
    assert!((0.0..=1.0).contains(&golden.rate_rendered(&rendered)));
}

#[test]
fn results_persist_through_sinks() {
    let config = ComposerConfig {
        population_size: 12,
        goal_size: 2,
        max_generations: 300,
        aim: Aim {
            target_size: 4,
            score_threshold: 0.5,
        },
        ..seeded_config(77)
    };
    let mut composer = Composer::new("sink", config).unwrap();
    let outcome = composer.run(|_| {});
    assert!(outcome.goal_reached, "{outcome:?}");

    let dir = tempfile::tempdir().unwrap();
    let mut text = TextFileSink::new(dir.path().join("compositions"));
    let written = composer.persist_all(&mut text);
    assert_eq!(written, composer.conservatory().len());
    for id in composer.conservatory().keys() {
        let dump = std::fs::read_to_string(text.path_for(id)).unwrap();
        assert!(dump.starts_with(&format!("Composition {id}")));
    }

    let chart_path = dir.path().join("chart.json");
    let mut chart = JsonChartSink::new(&chart_path);
    composer.publish_charts(&mut chart);
    chart.finish().unwrap();
    let data: ChartData = serde_json::from_str(&std::fs::read_to_string(&chart_path).unwrap()).unwrap();

    let styles: BTreeSet<&str> = composer.context().styles().iter().map(|s| s.name()).collect();
    let lines: BTreeSet<&str> = data.lines.keys().map(String::as_str).collect();
    assert_eq!(lines, styles);
    for series in data.lines.values() {
        assert_eq!(series.len() as u64, composer.generation());
    }
    assert!(data.scatter.values().all(|points| !points.is_empty()));
}

#[test]
fn unwritable_output_is_not_fatal() {
    let config = ComposerConfig {
        population_size: 12,
        goal_size: 1,
        max_generations: 300,
        aim: Aim {
            target_size: 3,
            score_threshold: 0.5,
        },
        ..seeded_config(5)
    };
    let mut composer = Composer::new("fail", config).unwrap();
    composer.run(|_| {});
    assert!(!composer.conservatory().is_empty());

    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not_a_dir");
    std::fs::write(&blocker, "file").unwrap();
    let mut sink = TextFileSink::new(&blocker);
    assert_eq!(composer.persist_all(&mut sink), 0);
}

#[test]
fn same_seed_reproduces_run() {
    let config = ComposerConfig {
        population_size: 16,
        goal_size: 3,
        max_generations: 40,
        ..seeded_config(99)
    };
    let mut a = Composer::new("repro", config.clone()).unwrap();
    let mut b = Composer::new("repro", config).unwrap();
    let outcome_a = a.run(|_| {});
    let outcome_b = b.run(|_| {});
    assert_eq!(outcome_a, outcome_b);
    let ids_a: Vec<_> = a.conservatory().keys().collect();
    let ids_b: Vec<_> = b.conservatory().keys().collect();
    assert_eq!(ids_a, ids_b);
    for (x, y) in a.archive().iter().zip(b.archive()) {
        assert_eq!(x.averages, y.averages);
    }
}
