//! Log pipeline
//!
//! Classification of raw llama-server log lines and the console state that
//! consumes the live stream.

pub mod classify;
pub mod stream;

pub use classify::{classify, Classified, LogCategory};
pub use stream::{LogConsole, LogEvent};
