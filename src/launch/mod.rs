//! Launch configuration
//!
//! Typed launch parameters for llama-server and the command compiler that
//! turns them into a runnable invocation.

pub mod command;
pub mod params;

pub use command::{compile, compile_args, CommandPreview};
pub use params::{Backend, CacheType, LaunchParams, SplitMode};
