//! Runtime builder and running handle.
//!
//! The runtime owns the designated thread, the worker pool and the stack
//! registry, and exposes the [`StackContext`] every stack is built over.

use std::sync::Arc;

use stacker_content::{ContentBundle, ContentFactory};
use stacker_core::{
    CreatureHandle, CreatureId, CreatureStack, Dispatcher, EntityAdapter, LootRules,
    MessageSource, Placement, SettingsProvider, SettingsTable, StackContext, TemplateMessages,
};
use tracing::info;

use crate::config::RuntimeConfig;
use crate::dispatch::RuntimeDispatcher;
use crate::error::{Result, RuntimeError};
use crate::registry::InMemoryStackRegistry;

/// Running stacker host.
///
/// Cloning the context is cheap; the runtime itself is the single owner of
/// the threads and must be shut down explicitly.
#[derive(Debug)]
pub struct StackerRuntime {
    context: Arc<StackContext>,
    dispatcher: Arc<RuntimeDispatcher>,
    registry: Arc<InMemoryStackRegistry>,
}

impl StackerRuntime {
    pub fn builder() -> StackerRuntimeBuilder {
        StackerRuntimeBuilder::new()
    }

    pub fn context(&self) -> &Arc<StackContext> {
        &self.context
    }

    pub fn dispatcher(&self) -> &Arc<RuntimeDispatcher> {
        &self.dispatcher
    }

    pub fn registry(&self) -> &Arc<InMemoryStackRegistry> {
        &self.registry
    }

    /// Wraps `head` in a new size-1 stack and registers it.
    pub fn track(&self, head: CreatureHandle) -> Arc<CreatureStack> {
        let stack = Arc::new(CreatureStack::new(Arc::clone(&self.context), head));
        self.registry.register(Arc::clone(&stack));
        stack
    }

    /// Registers a stack produced elsewhere, such as the remainder of a split.
    pub fn adopt(&self, stack: CreatureStack) -> Arc<CreatureStack> {
        let stack = Arc::new(stack);
        self.registry.register(Arc::clone(&stack));
        stack
    }

    pub fn stack_of(&self, head: CreatureId) -> Option<Arc<CreatureStack>> {
        self.registry.lookup(head)
    }

    /// Runs `task` on the designated thread and waits for it to finish.
    ///
    /// Returns `false` if the designated queue is already closed.
    pub fn run_on_designated_blocking<F>(&self, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.dispatcher.is_designated_thread() {
            task();
            return true;
        }
        self.dispatcher.dispatch_designated(Box::new(task));
        self.dispatcher.flush_designated()
    }

    /// Stops the worker pool and the designated thread, then releases every
    /// tracked stack.
    pub fn shutdown(self) -> Result<()> {
        let tracked = self.registry.len();
        self.dispatcher.shutdown()?;
        self.registry.clear();
        info!(target: "runtime::dispatch", tracked, "stacker runtime stopped");
        Ok(())
    }
}

/// Builder for [`StackerRuntime`].
///
/// The entity adapter, loot rules and placement are host-specific and must be
/// provided. Settings and messages default to the content directory named in
/// the config, or to the shipped content.
pub struct StackerRuntimeBuilder {
    config: RuntimeConfig,
    adapter: Option<Arc<dyn EntityAdapter>>,
    loot_rules: Option<Arc<dyn LootRules>>,
    placement: Option<Arc<dyn Placement>>,
    settings: Option<Arc<dyn SettingsProvider>>,
    messages: Option<Arc<dyn MessageSource>>,
}

impl StackerRuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            adapter: None,
            loot_rules: None,
            placement: None,
            settings: None,
            messages: None,
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn adapter(mut self, adapter: Arc<dyn EntityAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    pub fn loot_rules(mut self, loot_rules: Arc<dyn LootRules>) -> Self {
        self.loot_rules = Some(loot_rules);
        self
    }

    pub fn placement(mut self, placement: Arc<dyn Placement>) -> Self {
        self.placement = Some(placement);
        self
    }

    pub fn settings(mut self, settings: Arc<dyn SettingsProvider>) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn messages(mut self, messages: Arc<dyn MessageSource>) -> Self {
        self.messages = Some(messages);
        self
    }

    pub fn build(self) -> Result<StackerRuntime> {
        let adapter = self
            .adapter
            .ok_or(RuntimeError::MissingCollaborator("an entity adapter"))?;
        let loot_rules = self
            .loot_rules
            .ok_or(RuntimeError::MissingCollaborator("loot rules"))?;
        let placement = self
            .placement
            .ok_or(RuntimeError::MissingCollaborator("a placement"))?;

        let (settings, messages) = match (self.settings, self.messages) {
            (Some(settings), Some(messages)) => (settings, messages),
            (settings, messages) => {
                let (table, templates) = load_content(&self.config)?;
                (
                    settings.unwrap_or_else(|| Arc::new(table)),
                    messages.unwrap_or_else(|| Arc::new(templates)),
                )
            }
        };

        let dispatcher = Arc::new(RuntimeDispatcher::start(&self.config)?);
        let registry = Arc::new(InMemoryStackRegistry::new());

        let context = Arc::new(StackContext {
            config: Arc::new(self.config.stacker.clone()),
            settings,
            adapter,
            loot_rules,
            placement,
            registry: registry.clone(),
            dispatcher: dispatcher.clone(),
            messages,
        });

        info!(
            target: "runtime::dispatch",
            designated = %dispatcher.designated().name(),
            workers = dispatcher.workers().threads(),
            compute_async = self.config.stacker.loot.compute_async,
            "stacker runtime started"
        );

        Ok(StackerRuntime {
            context,
            dispatcher,
            registry,
        })
    }
}

fn load_content(config: &RuntimeConfig) -> Result<(SettingsTable, TemplateMessages)> {
    let loaded = match &config.content_dir {
        Some(dir) => {
            let factory = ContentFactory::new(dir);
            factory
                .load_settings()
                .and_then(|settings| Ok((settings, factory.load_messages()?)))
        }
        None => ContentBundle::defaults().map(|bundle| (bundle.settings, bundle.messages)),
    };
    loaded.map_err(RuntimeError::Content)
}
