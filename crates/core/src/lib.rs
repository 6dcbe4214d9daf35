//! Core business logic for worklink.

pub mod services;

pub use services::*;
