// ec_composer CLI entry point.
//
// Runs the generational search until the conservatory goal or the generation
// ceiling is reached, then prints the archive and the conservatory.
//
// Usage:
//   cargo run -p ec_composer -- [--population N] [--goal N] [--generations N]
//     [--settings default|test|debug|quiet] [--seed N] [--config FILE]
//     [--output-dir DIR] [--chart FILE]
//
// Command-line values override the config file. `RUST_LOG` overrides the
// settings profile's log filter.

use clap::Parser;
use ec_composer::composer::Composer;
use ec_composer::config::ComposerConfig;
use ec_composer::settings::Settings;
use ec_composer::sink::{JsonChartSink, TextFileSink};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "compose", about = "Evolve compositions toward a golden-section climax")]
struct Args {
    /// Live individuals per generation.
    #[arg(long)]
    population: Option<usize>,

    /// Conservatory size that ends the run.
    #[arg(long)]
    goal: Option<usize>,

    /// Generation ceiling.
    #[arg(long)]
    generations: Option<u64>,

    /// Log profile.
    #[arg(long, value_enum, default_value_t = Settings::Default)]
    settings: Settings,

    /// RNG seed for a reproducible run.
    #[arg(long, env = "EC_COMPOSER_SEED")]
    seed: Option<u64>,

    /// JSON config file; missing fields use defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to write one text file per conserved composition.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// File to write chart data (JSON) to.
    #[arg(long)]
    chart: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.settings.log_directive()));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let mut config = match &args.config {
        Some(path) => match ComposerConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => ComposerConfig::default(),
    };
    if let Some(population) = args.population {
        config.population_size = population;
    }
    if let Some(goal) = args.goal {
        config.goal_size = goal;
    }
    if let Some(generations) = args.generations {
        config.max_generations = generations;
    }
    if args.seed.is_some() {
        config.rng_seed = args.seed;
    }

    println!("=== ec_composer ===");
    println!("Population: {}", config.population_size);
    println!("Goal: {}", config.goal_size);
    println!("Max generations: {}", config.max_generations);
    println!(
        "Aim: size {}, every score >= {}",
        config.aim.target_size, config.aim.score_threshold
    );
    println!("Settings: {}", args.settings);
    if let Some(seed) = config.rng_seed {
        println!("Seed: {seed}");
    }
    println!();

    let mut composer = match Composer::new("composer", config) {
        Ok(composer) => composer,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = composer.run(|summary| {
        if !summary.conserved.is_empty() {
            println!(
                "  generation {}: conservatory +{}",
                summary.generation,
                summary.conserved.len()
            );
        }
    });

    println!();
    println!("--- Archive ---");
    for summary in composer.archive() {
        println!("{}", summary.summary_line());
    }

    println!();
    println!("--- Conservatory ({}) ---", composer.conservatory().len());
    for entry in composer.conservatory().values() {
        println!("[admitted in generation {}]", entry.generation);
        println!("{}", entry.composition);
    }

    if let Some(dir) = &args.output_dir {
        let mut sink = TextFileSink::new(dir);
        let written = composer.persist_all(&mut sink);
        println!("Wrote {written} compositions to {}", dir.display());
    }

    if let Some(path) = &args.chart {
        let mut sink = JsonChartSink::new(path);
        composer.publish_charts(&mut sink);
        match sink.finish() {
            Ok(path) => println!("Wrote chart data to {}", path.display()),
            Err(e) => error!("{e}"),
        }
    }

    println!();
    println!(
        "Finished after {} generations: {} conserved (goal {}).",
        outcome.generations,
        outcome.conserved,
        if outcome.goal_reached { "reached" } else { "not reached" }
    );
    ExitCode::SUCCESS
}
