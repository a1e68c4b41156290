//! stagehand-core: pipeline logic for stagehand
//!
//! This crate provides the stages of the deployment-configuration pipeline:
//! - `values`: layered configuration values that drive rendering
//! - `template`: template engine and source-tree renderer
//! - `validate`: syntax checks for generated JSON/YAML output
//! - `link`: symlink publication of the build tree
//! - `changes`: changed-service detection between two builds
//! - `restart`: two-phase restart orchestration against the control plane

pub mod changes;
pub mod config;
pub mod link;
pub mod pathvars;
pub mod projects;
pub mod restart;
pub mod template;
pub mod validate;
pub mod values;
