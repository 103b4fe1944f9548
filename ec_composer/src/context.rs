// Shared, read-only composing context.
//
// One `ComposerContext` is built per composer and handed to every composition
// it creates as an `Arc`. It replaces class-wide factory singletons: the id
// factory, the registered styles, and the generation parameters all travel
// explicitly. Nothing in here is mutated after construction except the
// atomic id counters, so the context is freely shared with worker threads.

use crate::config::ComposerConfig;
use crate::connector::{Connector, TransformWeights};
use crate::error::ComposerError;
use crate::ids::IdFactory;
use crate::material::MaterialParams;
use crate::sketch::SketchNode;
use crate::style::Style;
use crate::style::cello::UnaccompaniedCello;
use crate::style::golden::GoldenSectionClimax;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

pub struct ComposerContext {
    ids: IdFactory,
    styles: Vec<Box<dyn Style>>,
    materials: MaterialParams,
    transform_weights: TransformWeights,
    max_elongation_attempts: usize,
    max_seed_attempts: usize,
}

impl ComposerContext {
    /// Context scoring with `styles`. Fails when `config` does not validate.
    pub fn new(
        namespace: impl Into<String>,
        styles: Vec<Box<dyn Style>>,
        config: &ComposerConfig,
    ) -> Result<Self, ComposerError> {
        config.validate()?;
        Ok(ComposerContext {
            ids: IdFactory::new(namespace),
            styles,
            materials: config.materials.clone(),
            transform_weights: config.transform_weights,
            max_elongation_attempts: config.max_elongation_attempts.max(1),
            max_seed_attempts: config.max_seed_attempts.max(1),
        })
    }

    /// Context with the stock styles: the cello instrument check and the
    /// golden-section climax scorer normalized to the cello's registers.
    pub fn standard(namespace: impl Into<String>, config: &ComposerConfig) -> Result<Self, ComposerError> {
        let cello = UnaccompaniedCello::new();
        let golden = GoldenSectionClimax::new(cello.ranges().iter().copied());
        let styles: Vec<Box<dyn Style>> = vec![Box::new(cello), Box::new(golden)];
        ComposerContext::new(namespace, styles, config)
    }

    pub fn ids(&self) -> &IdFactory {
        &self.ids
    }

    pub fn styles(&self) -> &[Box<dyn Style>] {
        &self.styles
    }

    pub fn style(&self, name: &str) -> Option<&dyn Style> {
        self.styles.iter().find(|s| s.name() == name).map(|s| &**s)
    }

    pub fn materials(&self) -> &MaterialParams {
        &self.materials
    }

    pub fn transform_weights(&self) -> &TransformWeights {
        &self.transform_weights
    }

    pub fn max_elongation_attempts(&self) -> usize {
        self.max_elongation_attempts
    }

    /// True when every registered style accepts `node`.
    pub fn qualifies(&self, node: &SketchNode) -> bool {
        self.styles.iter().all(|s| s.qualify_sketch_node(node))
    }

    /// A fresh random seed node that every style accepts. Gives up after
    /// `max_seed_attempts` draws and returns the last one.
    pub fn new_seed(&self, rng: &mut impl Rng) -> Arc<SketchNode> {
        let mut node = SketchNode::random(self.ids.next_sketch_node(), &self.materials, rng);
        for _ in 1..self.max_seed_attempts {
            if self.qualifies(&node) {
                return Arc::new(node);
            }
            node = SketchNode::random(self.ids.next_sketch_node(), &self.materials, rng);
        }
        if !self.qualifies(&node) {
            warn!(node = %node.id(), attempts = self.max_seed_attempts, "no qualifying seed found");
        }
        Arc::new(node)
    }

    pub fn new_connector(&self, rng: &mut impl Rng) -> Connector {
        Connector::random(self.ids.next_connector(), &self.transform_weights, rng)
    }
}

impl fmt::Debug for ComposerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let styles: Vec<&str> = self.styles.iter().map(|s| s.name()).collect();
        f.debug_struct("ComposerContext")
            .field("namespace", &self.ids.namespace())
            .field("styles", &styles)
            .field("materials", &self.materials)
            .field("transform_weights", &self.transform_weights)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) fn test_context() -> Arc<ComposerContext> {
    Arc::new(ComposerContext::standard("test", &ComposerConfig::default()).unwrap())
}
