//! Control panel components

pub mod controls;
pub mod logs;
pub mod models;
pub mod parameters;
pub mod preview;
pub mod runtime;
