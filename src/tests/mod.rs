//! Bootstrap Runtime Tests
//!
//! Tests for argument capture, settings layering, logging, shutdown
//! signaling, and the component lifecycle.

pub mod args_tests;
pub mod endpoint_tests;
