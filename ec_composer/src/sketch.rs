// Sketch nodes: immutable snapshots holding one material of each kind.
//
// A node is minted exactly once, either as a composition's seed or as the
// output of a connector's transform, and is shared afterwards through
// `Arc<SketchNode>`. Two nodes compare equal when their material maps are
// equal; identity (is this still the node that was rendered?) is the
// factory-minted `SketchNodeId`.

use crate::material::{Material, MaterialKind, MaterialParams};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SketchNodeId(pub u64);

impl fmt::Display for SketchNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SketchNode {
    id: SketchNodeId,
    mats: BTreeMap<MaterialKind, Material>,
}

impl SketchNode {
    pub fn new(id: SketchNodeId, mats: BTreeMap<MaterialKind, Material>) -> Self {
        SketchNode { id, mats }
    }

    /// A node with freshly generated material of every kind.
    pub fn random(id: SketchNodeId, params: &MaterialParams, rng: &mut impl Rng) -> Self {
        let mats = MaterialKind::ALL
            .iter()
            .map(|&kind| (kind, Material::generated(kind, params, rng)))
            .collect();
        SketchNode { id, mats }
    }

    pub fn id(&self) -> SketchNodeId {
        self.id
    }

    pub fn mats(&self) -> &BTreeMap<MaterialKind, Material> {
        &self.mats
    }

    pub fn mat(&self, kind: MaterialKind) -> Option<&Material> {
        self.mats.get(&kind)
    }
}

impl PartialEq for SketchNode {
    fn eq(&self, other: &Self) -> bool {
        self.mats == other.mats
    }
}

impl fmt::Display for SketchNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.id)?;
        for (i, material) in self.mats.values().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {material}")?;
        }
        write!(f, " }}")
    }
}
