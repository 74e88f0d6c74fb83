//! livestream-dl - Livestream segment assembly
//!
//! This library crate exposes the core functionality for integration testing.

pub mod assemble;
pub mod captions;
pub mod collector;
pub mod config;
pub mod naming;
