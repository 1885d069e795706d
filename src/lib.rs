//! Terminal admin client for a news REST backend.
//!
//! The binary in `main.rs` owns the terminal and the event loop; everything
//! else lives here so it can be driven without a terminal.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod form;
pub mod input;
pub mod model;
pub mod page;
pub mod preview;
pub mod ui;
pub mod views;
