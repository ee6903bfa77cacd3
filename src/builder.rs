//! Factory builder for flexible configuration.
//!
//! The builder provides full control over factory construction,
//! including placing geometries in an isolated native context for
//! capability testing and resource accounting.

use crate::config::{AutoPrepare, FactoryConfig};
use crate::context::NativeContext;
use crate::factory::Factory;
use std::sync::Arc;

/// Builder for [`Factory`] construction.
#[derive(Debug)]
pub struct FactoryBuilder {
    config: FactoryConfig,
    context: Option<Arc<NativeContext>>,
}

impl FactoryBuilder {
    /// A builder with default configuration on the shared context.
    pub fn new() -> Self {
        FactoryBuilder {
            config: FactoryConfig::default(),
            context: None,
        }
    }

    /// Set the spatial reference identifier.
    pub fn srid(mut self, srid: i32) -> Self {
        self.config.srid = srid;
        self
    }

    /// Set the auto-prepare policy.
    pub fn auto_prepare(mut self, auto_prepare: AutoPrepare) -> Self {
        self.config.auto_prepare = auto_prepare;
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: FactoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Allocate geometries in the given native context instead of the
    /// shared one.
    pub fn context(mut self, context: Arc<NativeContext>) -> Self {
        self.context = Some(context);
        self
    }

    /// Allocate geometries in a fresh context with its own arena and
    /// handle accounting.
    pub fn isolated_context(mut self) -> Self {
        self.context = Some(NativeContext::isolated());
        self
    }

    /// Build the factory.
    pub fn build(self) -> Factory {
        let context = self.context.unwrap_or_else(NativeContext::shared);
        Factory::with_parts(self.config, context)
    }
}

impl Default for FactoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
