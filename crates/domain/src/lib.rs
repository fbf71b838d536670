//! Domain layer for the Formgate response admission service.
//!
//! This crate contains:
//! - Domain models (Form aggregate, tracking snapshots, responses, reminders)
//! - Outbound ports implemented by `persistence`
//! - Business logic services
//! - Domain error types

pub mod error;
pub mod models;
pub mod ports;
pub mod services;

pub use error::{DomainError, StoreError};
