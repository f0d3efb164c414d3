use std::sync::Arc;

use stacker_core::sandbox::{RecordingPlacement, SandboxWorld, default_settings};
use stacker_core::{StackerConfig, TemplateMessages};
use stacker_runtime::{RuntimeConfig, StackerRuntime};

pub struct Harness {
    pub world: Arc<SandboxWorld>,
    pub placement: Arc<RecordingPlacement>,
    pub runtime: StackerRuntime,
}

pub fn harness(stacker: StackerConfig) -> Harness {
    let world = Arc::new(SandboxWorld::new());
    let placement = Arc::new(RecordingPlacement::new());
    let config = RuntimeConfig {
        stacker,
        ..RuntimeConfig::default()
    };

    let runtime = StackerRuntime::builder()
        .config(config)
        .adapter(world.clone())
        .loot_rules(world.clone())
        .placement(placement.clone())
        .settings(Arc::new(default_settings()))
        .messages(Arc::new(TemplateMessages::default()))
        .build()
        .expect("runtime should start");
    world.watch_dispatcher(runtime.dispatcher().clone());

    Harness {
        world,
        placement,
        runtime,
    }
}
