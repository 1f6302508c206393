// ABOUTME: Library crate for mcp-inspect exposing the inspection core and TUI for testing and reuse

#![allow(missing_docs)]

pub mod app;
pub mod cli;
pub mod components;
pub mod config;
pub mod mcp;
