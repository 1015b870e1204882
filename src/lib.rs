//! mktui - a terminal dashboard for Makefile targets
//!
//! This library provides the building blocks of the dashboard: scanning a
//! Makefile into a target catalog, laying out and painting views, and running
//! the selected target with its output streamed back into the UI.

pub mod catalog;
pub mod config;
pub mod logging;
pub mod runner;
pub mod ui;
