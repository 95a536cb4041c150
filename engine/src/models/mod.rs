//! Data models

pub mod component;
pub mod options;
pub mod request;
pub mod result;
pub mod target;
