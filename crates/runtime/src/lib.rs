//! Host runtime for the creature stack engine.
//!
//! This crate provides the threading model the engine expects from its host:
//! one designated thread for sensitive mutations and a worker pool for loot
//! computation. It also ships an in-memory stack registry and a builder that
//! wires host collaborators into a shared [`StackContext`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the builder and the running handle
//! - [`dispatch`] owns the designated thread and the worker pool
//! - [`registry`] tracks live stacks by head id
//! - [`config`] reads runtime settings from the environment
pub mod config;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod runtime;

pub use config::RuntimeConfig;
pub use dispatch::RuntimeDispatcher;
pub use error::{Result, RuntimeError};
pub use registry::InMemoryStackRegistry;
pub use runtime::{StackerRuntime, StackerRuntimeBuilder};

pub use stacker_core::StackContext;
