// Id factories for sketch nodes, connectors, and compositions.
//
// One `IdFactory` is built per composer and shared through the
// `ComposerContext`. Each id kind has its own atomically incremented counter,
// so ids stay unique and monotonically increasing even when compositions
// are rendered on worker threads. Composition ids carry the composer's
// namespace so output from several composers never collides.
//
// Sketch-node ids double as identity tokens: the render-consistency check
// compares node ids, never addresses.

use crate::composition::CompositionId;
use crate::connector::ConnectorId;
use crate::sketch::SketchNodeId;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct IdFactory {
    namespace: String,
    sketch_nodes: AtomicU64,
    connectors: AtomicU64,
    compositions: AtomicU64,
}

impl IdFactory {
    pub fn new(namespace: impl Into<String>) -> Self {
        IdFactory {
            namespace: namespace.into(),
            sketch_nodes: AtomicU64::new(1),
            connectors: AtomicU64::new(1),
            compositions: AtomicU64::new(1),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn next_sketch_node(&self) -> SketchNodeId {
        SketchNodeId(self.sketch_nodes.fetch_add(1, Ordering::Relaxed))
    }

    pub fn next_connector(&self) -> ConnectorId {
        ConnectorId(self.connectors.fetch_add(1, Ordering::Relaxed))
    }

    pub fn next_composition(&self) -> CompositionId {
        CompositionId {
            serial: self.compositions.fetch_add(1, Ordering::Relaxed),
            namespace: self.namespace.clone(),
        }
    }
}
