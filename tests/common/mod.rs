//! Common test utilities
//!
//! This module is shared across all integration tests

#![allow(dead_code)]

pub mod fixtures;
pub mod gateway;

#[allow(unused_imports)]
pub use fixtures::{callback_update_json, message_update_json, TestEnvironment};
#[allow(unused_imports)]
pub use gateway::{RecordedCall, RecordingGateway};
