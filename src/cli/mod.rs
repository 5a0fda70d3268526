//! Command-line interface module.

mod args;
pub mod check;
pub mod common;
pub mod mime;
pub mod render;

pub use args::{Cli, Commands, RenderArgs};
