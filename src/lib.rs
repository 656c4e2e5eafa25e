pub mod config;
pub mod error;
pub mod exception;
pub mod executor;
pub mod install;
pub mod models;
pub mod notebook;
pub mod process;
pub mod runtime;
pub mod snippet;
pub mod supervisor;
pub mod validate;

pub use validate::{validate, ValidationRun};
