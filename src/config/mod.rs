// src/config/mod.rs

//! Build specification: TOML model, validation and loading.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_spec_path, load_and_validate, load_from_path};
pub use model::{BuildSpec, HookCommand, Hooks, RawBuildSpec, TargetSpec};
