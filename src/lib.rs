//! LlamaHelm Library
//!
//! Core library for the LlamaHelm desktop application: a control panel for
//! launching and supervising a local llama-server process.

pub mod app;
pub mod launch;
pub mod logs;
pub mod runtime;
pub mod server;
pub mod storage;
pub mod system;
pub mod ui;
