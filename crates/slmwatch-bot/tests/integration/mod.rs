//! Integration tests for slmwatch-bot.
//!
//! These tests drive the scheduler end to end:
//! - Compensation chains against the scripted fake broker
//! - The Kite REST client against a local mock API

pub mod common;
