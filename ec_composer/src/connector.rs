// Connectors: the heritable genes of a composition.
//
// A connector maps each material kind to a transform kind. Given the sketch
// node before it, `transform()` applies every mapped transform to the
// matching material and mints the node after it. The composition renderer
// wires `previous`; the connector records its own `next`. An unwired
// connector (no `previous`) transforms to `None`, meaning "not ready yet".
//
// Crossover copies genes with `inherit()`: same transform map, fresh id,
// no wiring. Fresh genes are drawn with `random()` from `TransformWeights`.

use crate::ids::IdFactory;
use crate::material::{MaterialKind, MusicMaterial, TransformKind};
use crate::sketch::SketchNode;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectorId(pub u64);

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X{}", self.0)
    }
}

/// Relative odds of each transform when drawing a fresh connector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformWeights {
    pub repetition: u32,
    pub retrograde: u32,
    pub move_forward: u32,
    pub move_backward: u32,
    pub disconnected: u32,
}

impl Default for TransformWeights {
    fn default() -> Self {
        TransformWeights {
            repetition: 3,
            retrograde: 2,
            move_forward: 2,
            move_backward: 2,
            disconnected: 1,
        }
    }
}

impl TransformWeights {
    /// Every transform equally likely.
    pub fn uniform() -> Self {
        TransformWeights {
            repetition: 1,
            retrograde: 1,
            move_forward: 1,
            move_backward: 1,
            disconnected: 1,
        }
    }

    pub fn weight(&self, kind: TransformKind) -> u32 {
        match kind {
            TransformKind::Repetition => self.repetition,
            TransformKind::Retrograde => self.retrograde,
            TransformKind::MoveForward => self.move_forward,
            TransformKind::MoveBackward => self.move_backward,
            TransformKind::Disconnected => self.disconnected,
        }
    }

    pub fn total(&self) -> u32 {
        TransformKind::ALL.iter().map(|&k| self.weight(k)).sum()
    }

    /// Draw one transform kind.
    ///
    /// Panics if every weight is zero; `ComposerConfig::validate` rejects
    /// such configurations.
    pub fn sample(&self, rng: &mut impl Rng) -> TransformKind {
        let mut roll = rng.random_range(0..self.total());
        for kind in TransformKind::ALL {
            let weight = self.weight(kind);
            if roll < weight {
                return kind;
            }
            roll -= weight;
        }
        unreachable!("roll is always below the weight total")
    }
}

#[derive(Clone, Debug)]
pub struct Connector {
    id: ConnectorId,
    transforms: BTreeMap<MaterialKind, TransformKind>,
    previous: Option<Arc<SketchNode>>,
    next: Option<Arc<SketchNode>>,
}

impl Connector {
    pub fn new(id: ConnectorId) -> Self {
        Connector {
            id,
            transforms: BTreeMap::new(),
            previous: None,
            next: None,
        }
    }

    /// A connector with a transform drawn for every material kind.
    pub fn random(id: ConnectorId, weights: &TransformWeights, rng: &mut impl Rng) -> Self {
        let mut connector = Connector::new(id);
        for kind in MaterialKind::ALL {
            connector.add_transform(kind, weights.sample(rng));
        }
        connector
    }

    /// Unwired copy of this gene under a new id.
    pub fn inherit(&self, id: ConnectorId) -> Self {
        Connector {
            id,
            transforms: self.transforms.clone(),
            previous: None,
            next: None,
        }
    }

    pub fn id(&self) -> ConnectorId {
        self.id
    }

    pub fn add_transform(&mut self, material: MaterialKind, transform: TransformKind) {
        self.transforms.insert(material, transform);
    }

    pub fn transforms(&self) -> &BTreeMap<MaterialKind, TransformKind> {
        &self.transforms
    }

    pub fn previous(&self) -> Option<&Arc<SketchNode>> {
        self.previous.as_ref()
    }

    pub fn next(&self) -> Option<&Arc<SketchNode>> {
        self.next.as_ref()
    }

    pub fn set_previous(&mut self, previous: Arc<SketchNode>) {
        self.previous = Some(previous);
    }

    /// True once both ends are attached.
    pub fn is_wired(&self) -> bool {
        self.previous.is_some() && self.next.is_some()
    }

    /// Same transform map, regardless of id or wiring.
    pub fn same_genome(&self, other: &Connector) -> bool {
        self.transforms == other.transforms
    }

    /// Apply the transform map to `previous` and record the result as `next`.
    ///
    /// Returns `None` without side effects while `previous` is unset.
    pub fn transform(&mut self, ids: &IdFactory) -> Option<Arc<SketchNode>> {
        let previous = self.previous.as_ref()?;
        let mut mats = BTreeMap::new();
        for (&kind, &transform) in &self.transforms {
            match previous.mat(kind) {
                Some(material) => {
                    mats.insert(kind, material.transform(transform));
                }
                None => warn!(
                    connector = %self.id,
                    node = %previous.id(),
                    %kind,
                    "previous node lacks material; not carried forward"
                ),
            }
        }
        let next = Arc::new(SketchNode::new(ids.next_sketch_node(), mats));
        self.next = Some(Arc::clone(&next));
        Some(next)
    }

    /// The gene followed by the node it produced, for text dumps.
    pub fn to_string_next(&self) -> String {
        match &self.next {
            Some(next) => format!("{self}\n => {next}"),
            None => format!("{self}\n => (not rendered)"),
        }
    }
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.id)?;
        for (i, (kind, transform)) in self.transforms.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {kind}: {transform}")?;
        }
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{Material, MaterialParams};
    use crate::sketch::SketchNodeId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn seed_node(rng: &mut StdRng) -> Arc<SketchNode> {
        Arc::new(SketchNode::random(SketchNodeId(0), &MaterialParams::default(), rng))
    }

    #[test]
    fn unwired_transform_is_none() {
        let ids = IdFactory::new("test");
        let mut rng = StdRng::seed_from_u64(1);
        let mut connector = Connector::random(ids.next_connector(), &TransformWeights::default(), &mut rng);
        assert!(connector.transform(&ids).is_none());
        assert!(connector.next().is_none());
        assert!(!connector.is_wired());
    }

    #[test]
    fn transform_applies_each_mapped_transform() {
        let ids = IdFactory::new("test");
        let mut rng = StdRng::seed_from_u64(2);
        let seed = seed_node(&mut rng);
        let mut connector = Connector::new(ids.next_connector());
        connector.add_transform(MaterialKind::PitchSets, TransformKind::Retrograde);
        connector.add_transform(MaterialKind::NoteRanges, TransformKind::MoveForward);
        connector.add_transform(MaterialKind::Dynamics, TransformKind::Disconnected);
        connector.add_transform(MaterialKind::RhythmicPoints, TransformKind::Repetition);
        connector.set_previous(Arc::clone(&seed));

        let next = connector.transform(&ids).unwrap();
        assert!(connector.is_wired());
        assert_eq!(connector.next().unwrap().id(), next.id());
        assert_ne!(next.id(), seed.id());
        for (&kind, &transform) in connector.transforms() {
            let expected: Material = seed.mat(kind).unwrap().transform(transform);
            assert_eq!(next.mat(kind).unwrap(), &expected);
        }
    }

    #[test]
    fn inherit_copies_genome_without_wiring() {
        let ids = IdFactory::new("test");
        let mut rng = StdRng::seed_from_u64(3);
        let mut connector = Connector::random(ids.next_connector(), &TransformWeights::default(), &mut rng);
        connector.set_previous(seed_node(&mut rng));
        connector.transform(&ids);

        let child = connector.inherit(ids.next_connector());
        assert!(child.same_genome(&connector));
        assert_ne!(child.id(), connector.id());
        assert!(child.previous().is_none());
        assert!(child.next().is_none());
    }

    #[test]
    fn sample_honors_zero_weights() {
        let weights = TransformWeights {
            repetition: 0,
            retrograde: 0,
            move_forward: 5,
            move_backward: 0,
            disconnected: 0,
        };
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..200 {
            assert_eq!(weights.sample(&mut rng), TransformKind::MoveForward);
        }
    }

    #[test]
    fn sample_reaches_every_kind() {
        let weights = TransformWeights::uniform();
        let mut rng = StdRng::seed_from_u64(5);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..1000 {
            seen.insert(weights.sample(&mut rng));
        }
        assert_eq!(seen.len(), TransformKind::ALL.len());
    }
}
