//! # UI Module
//!
//! This module provides the terminal user interface for mktui.
//!
//! ## Components
//!
//! - [`layout`] - 12x12 grid layout engine producing view rectangles
//! - [`view`] - Named views and the [`ViewRegistry`](view::ViewRegistry)
//! - [`command`] - Key bindings as a closed [`Command`] enumeration
//! - [`App`] - Application state: explicit `setup` / `update` phases, command
//!   handlers, and generation-checked output routing
//! - [`mod@render`] - Painting views with ratatui
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────┬──────────────────────────────────┐
//! │ Makefile     │ Command Output                    │
//! │ Targets      │                                   │
//! │              │   (streamed stdout of the         │
//! │  build       │    selected target, tail-follow)  │
//! │ >test        │                                   │
//! │              │                                   │
//! ├──────────────┤                                   │
//! │ help         │                                   │
//! │ run unit ... │                                   │
//! └──────────────┴──────────────────────────────────┘
//! ```

pub mod app;
pub mod command;
pub mod layout;
pub mod render;
pub mod view;

pub use app::{App, Flow, Phase};
pub use command::Command;
pub use render::render;
