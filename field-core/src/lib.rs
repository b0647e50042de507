//! Decorative 2-D particle field simulation library.
//!
//! Main components:
//! - [`engine`] — the particle field engine and its mount/frame/teardown lifecycle.
//! - [`particle`] — particle state and random sampling.
//! - [`phases`] — per-frame update steps (edge fade, drift, pointer attraction).
//! - [`pointer`] — page-lifetime pointer position tracker.
//! - [`surface`] — 2-D drawing context trait and a software display list.
//! - [`scheduler`] — frame scheduler / timer trait, a manual clock and debouncing.
//! - [`config`] — field configuration.
//! - [`color`] — hex tint parsing.
//! - [`error`] — error types.
//! - [`types`] — shared geometry types.

pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod particle;
pub mod phases;
pub mod pointer;
pub mod scheduler;
pub mod surface;
pub mod types;
