//! Integration tests for snippet validation
//!
//! These tests drive the public `validate` entry point end to end with a fake
//! shell runtime, plus a handful of checks against the real `validate`
//! binary and, when it is installed, a real Python interpreter.

pub mod helpers;
pub mod install;
pub mod python_runtime;
