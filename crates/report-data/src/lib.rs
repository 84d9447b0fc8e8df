//! Schedule processing layer for the HEMS report engine.
//!
//! Reads schedule payloads, validates them into per-load time series, derives
//! activity windows and energy, passes cost totals through, and assembles the
//! report data and its display renderings for the text-generation step.

pub mod analysis;
pub mod assembler;
pub mod costs;
pub mod facts;
pub mod parser;
pub mod reader;
pub mod statistics;
pub mod view;
pub mod windows;

pub use report_core as core;
