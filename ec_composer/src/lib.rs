// ec_composer: evolutionary music composer
//
// Grows musical compositions as chains of transformed material snapshots and
// selects them across generations by aesthetic fitness. A composition is a
// seed sketch node plus a genome of connectors; rendering threads the seed
// through the connectors, each of which transforms the previous node's
// materials into the next node. Styles score the rendering, and the composer
// keeps the best, recombines them, and conserves the ones that reach the aim.
//
// Architecture:
// - material/: Pitch-set, note-range, dynamics and rhythmic-point material
//   with the shared transform algebra and intensity measures
// - sketch.rs: Immutable sketch nodes (one material of each kind)
// - connector.rs: Connectors, the heritable material -> transform genes
// - composition.rs: Genome, cached rendering, version-token cache checks,
//   per-style scores, elongation
// - style/: Style trait, golden-section climax scorer, unaccompanied cello
// - aim.rs: Completion and acceptance policy
// - composer.rs: Generational loop, crossover, archive, conservatory
// - context.rs: Per-composer shared context (ids, styles, parameters)
// - ids.rs: Atomic id factories
// - config.rs: JSON configuration with defaults and validation
// - settings.rs: Named log profiles
// - sink.rs: Text persistence and chart data output
// - error.rs: Error types
//
// Rendering is deterministic; all randomness comes from the composer's RNG,
// so a fixed seed reproduces a run's material.

pub mod aim;
pub mod composer;
pub mod composition;
pub mod config;
pub mod connector;
pub mod context;
pub mod error;
pub mod ids;
pub mod material;
pub mod settings;
pub mod sink;
pub mod sketch;
pub mod style;
