//! Leadflow — adaptive lead-capture form runtime.

pub mod compose;
pub mod config;
pub mod error;
pub mod form;
pub mod generation;
pub mod pipeline;
pub mod runner;
pub mod store;
