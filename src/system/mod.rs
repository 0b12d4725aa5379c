//! System utilities
//!
//! System-level functionality: locating the llama-server executable on the
//! host machine.

pub mod executable;
