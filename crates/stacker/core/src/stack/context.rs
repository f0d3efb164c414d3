use std::fmt;
use std::sync::Arc;

use crate::config::StackerConfig;
use crate::env::{Dispatcher, EntityAdapter, LootRules, MessageSource, Placement, StackRegistry};
use crate::settings::SettingsProvider;

/// Collaborators shared by every stack of one host.
///
/// Built once at startup and handed to stacks as `Arc<StackContext>`.
#[derive(Clone)]
pub struct StackContext {
    pub config: Arc<StackerConfig>,
    pub settings: Arc<dyn SettingsProvider>,
    pub adapter: Arc<dyn EntityAdapter>,
    pub loot_rules: Arc<dyn LootRules>,
    pub placement: Arc<dyn Placement>,
    pub registry: Arc<dyn StackRegistry>,
    pub dispatcher: Arc<dyn Dispatcher>,
    pub messages: Arc<dyn MessageSource>,
}

impl fmt::Debug for StackContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Suspends automatic stacking for as long as it is alive.
pub(crate) struct StackingSuspended<'a> {
    registry: &'a dyn StackRegistry,
}

impl<'a> StackingSuspended<'a> {
    pub(crate) fn new(registry: &'a dyn StackRegistry) -> Self {
        registry.set_stacking_suspended(true);
        Self { registry }
    }
}

impl Drop for StackingSuspended<'_> {
    fn drop(&mut self) {
        self.registry.set_stacking_suspended(false);
    }
}
