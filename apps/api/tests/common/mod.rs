//! Common test utilities for API integration tests
//!
//! This module provides shared test infrastructure for integration tests,
//! including test fixtures, mock services, and helper functions.

#![allow(unused_imports)]

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
