//! Metaship Engine Library
//!
//! Core modules for packaging component deployments and orchestrating
//! them across one or more remote environments.

pub mod config;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod manifest;
pub mod models;
pub mod normalize;
pub mod project;
pub mod remote;
pub mod staging;
