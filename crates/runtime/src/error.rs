//! Errors surfaced while building or shutting down the runtime.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to spawn designated thread `{name}`")]
    ThreadSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build {role} runtime")]
    RuntimeBuild {
        role: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("runtime requires {0} to be configured before building")]
    MissingCollaborator(&'static str),

    #[error("failed to load stacker content: {0:#}")]
    Content(anyhow::Error),

    #[error("designated thread panicked")]
    DesignatedThreadPanicked,
}
