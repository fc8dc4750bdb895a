//! CLI module for blogctl
//!
//! Argument parsing plus the terminal front end: output formatting and the
//! interactive chat prompt.

pub mod args;
pub mod display;
pub mod input;

pub use args::{
    Args, BlogCommand, Commands, ImageCommand, LlmCommand, MetaArgs, SystemCommand, Verbosity,
};
pub use display::{ChatRenderer, Display};
pub use input::InputHandler;
