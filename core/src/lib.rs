pub mod action;
pub mod bench;
pub mod config;
pub mod environment;
pub mod report;
pub mod style;
pub mod template;
pub mod toolchain;
pub mod versions;

pub use crate::config::Config;
