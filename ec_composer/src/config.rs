// Run configuration.
//
// Every tunable of a composing run lives in `ComposerConfig`, loadable from
// JSON. Missing fields fall back to `Default`, so a config file only needs
// the values it changes. `validate()` rejects settings the search can't
// run with; the composer calls it before building anything.
//
// Nested groups: `Aim` (aim.rs), `MaterialParams` (material/mod.rs),
// `TransformWeights` (connector.rs).

use crate::aim::Aim;
use crate::connector::TransformWeights;
use crate::error::ComposerError;
use crate::material::MaterialParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Live individuals per generation.
    pub population_size: usize,
    /// Conservatory size that ends the run.
    pub goal_size: usize,
    /// Generation ceiling that ends the run regardless of the goal.
    pub max_generations: u64,
    pub aim: Aim,
    pub materials: MaterialParams,
    pub transform_weights: TransformWeights,
    /// Share of completed individuals that survive breeding unchanged.
    pub elite_fraction: f64,
    /// Chance a crossover child gets one connector redrawn.
    pub mutation_rate: f64,
    /// Crossover retries before a duplicate slot gets an immigrant instead.
    pub max_crossover_attempts: usize,
    /// Connector draws per elongation step.
    pub max_elongation_attempts: usize,
    /// Seed draws before settling for a non-qualifying seed.
    pub max_seed_attempts: usize,
    /// Evaluation pool size; `None` lets rayon decide.
    pub worker_threads: Option<usize>,
    /// Fixed RNG seed for reproducible runs; `None` seeds from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        ComposerConfig {
            population_size: 50,
            goal_size: 10,
            max_generations: 1500,
            aim: Aim::phrase(),
            materials: MaterialParams::default(),
            transform_weights: TransformWeights::default(),
            elite_fraction: 0.5,
            mutation_rate: 0.1,
            max_crossover_attempts: 32,
            max_elongation_attempts: 32,
            max_seed_attempts: 64,
            worker_threads: None,
            rng_seed: None,
        }
    }
}

impl ComposerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ComposerError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ComposerError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ComposerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ComposerError> {
        let invalid = |msg: String| Err(ComposerError::InvalidConfig(msg));
        if self.population_size < 2 {
            return invalid(format!("population_size {} is below 2", self.population_size));
        }
        if self.goal_size == 0 {
            return invalid("goal_size must be at least 1".into());
        }
        if self.goal_size > self.population_size {
            // The conservatory holds at most one population's worth.
            return invalid(format!(
                "goal_size {} exceeds population_size {}",
                self.goal_size, self.population_size
            ));
        }
        if self.aim.target_size < 2 {
            return invalid(format!("aim.target_size {} is below 2", self.aim.target_size));
        }
        if !(0.0..=1.0).contains(&self.aim.score_threshold) {
            return invalid(format!("aim.score_threshold {} is outside [0, 1]", self.aim.score_threshold));
        }
        if !(0.0..=1.0).contains(&self.elite_fraction) {
            return invalid(format!("elite_fraction {} is outside [0, 1]", self.elite_fraction));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return invalid(format!("mutation_rate {} is outside [0, 1]", self.mutation_rate));
        }
        let m = &self.materials;
        if m.min_division == 0 || m.min_division > m.max_division {
            return invalid(format!(
                "division bounds [{}, {}] are empty or start at 0",
                m.min_division, m.max_division
            ));
        }
        if m.min_pitches == 0 || m.min_pitches > m.max_pitches || m.max_pitches > 12 {
            return invalid(format!(
                "pitch-count bounds [{}, {}] must lie within [1, 12]",
                m.min_pitches, m.max_pitches
            ));
        }
        if m.common_tone > m.max_pitches {
            return invalid(format!(
                "common_tone {} exceeds max_pitches {}",
                m.common_tone, m.max_pitches
            ));
        }
        if m.max_rhythmic_points == 0 {
            return invalid("max_rhythmic_points must be at least 1".into());
        }
        if m.note_ranges.is_empty() {
            return invalid("note_ranges is empty".into());
        }
        if self.transform_weights.total() == 0 {
            return invalid("every transform weight is zero".into());
        }
        if self.worker_threads == Some(0) {
            return invalid("worker_threads must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        ComposerConfig::default().validate().unwrap();
    }

    #[test]
    fn default_config_serializes() {
        let config = ComposerConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored = ComposerConfig::from_json_str(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = ComposerConfig::from_json_str(
            r#"{
                "population_size": 20,
                "aim": { "target_size": 6 },
                "transform_weights": { "disconnected": 0 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.population_size, 20);
        assert_eq!(config.goal_size, 10);
        assert_eq!(config.aim.target_size, 6);
        assert_eq!(config.aim.score_threshold, Aim::phrase().score_threshold);
        assert_eq!(config.transform_weights.disconnected, 0);
        assert_eq!(config.transform_weights.repetition, 3);
        config.validate().unwrap();
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "max_generations": 7, "rng_seed": 42 }}"#).unwrap();
        let config = ComposerConfig::load(file.path()).unwrap();
        assert_eq!(config.max_generations, 7);
        assert_eq!(config.rng_seed, Some(42));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ComposerConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ComposerError::ConfigRead { .. }), "{err}");
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = ComposerConfig::from_json_str("{ population_size: }").unwrap_err();
        assert!(matches!(err, ComposerError::ConfigParse(_)));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let cases: Vec<(&str, Box<dyn Fn(&mut ComposerConfig)>)> = vec![
            ("population", Box::new(|c| c.population_size = 1)),
            ("goal", Box::new(|c| c.goal_size = 0)),
            ("goal above population", Box::new(|c| c.goal_size = 51)),
            ("target", Box::new(|c| c.aim.target_size = 1)),
            ("threshold", Box::new(|c| c.aim.score_threshold = 1.5)),
            ("elite", Box::new(|c| c.elite_fraction = -0.1)),
            ("mutation", Box::new(|c| c.mutation_rate = 2.0)),
            ("division", Box::new(|c| c.materials.min_division = 5)),
            ("pitches", Box::new(|c| c.materials.max_pitches = 13)),
            ("common tone", Box::new(|c| c.materials.common_tone = 5)),
            ("rhythm", Box::new(|c| c.materials.max_rhythmic_points = 0)),
            ("ranges", Box::new(|c| c.materials.note_ranges.clear())),
            ("weights", Box::new(|c| c.transform_weights = TransformWeights {
                repetition: 0,
                retrograde: 0,
                move_forward: 0,
                move_backward: 0,
                disconnected: 0,
            })),
            ("threads", Box::new(|c| c.worker_threads = Some(0))),
        ];
        for (label, mutate) in cases {
            let mut config = ComposerConfig::default();
            mutate(&mut config);
            assert!(
                matches!(config.validate(), Err(ComposerError::InvalidConfig(_))),
                "{label} accepted"
            );
        }
    }
}
