//! Common test utilities and helpers.
//!
//! This module provides shared functionality for all tests, including:
//! - An in-memory document implementing both session traits
//! - PDF builders for real-backend tests
//! - Custom assertions

#![allow(dead_code)]

pub mod assertions;
pub mod fake;
pub mod fixtures;

pub use assertions::*;
pub use fake::*;
pub use fixtures::*;
