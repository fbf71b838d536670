//! Persistence layer for the Formgate backend.
//!
//! This crate contains:
//! - Database connection management and migrations
//! - Entity definitions (database row mappings)
//! - PostgreSQL repositories implementing the domain ports
//! - In-memory implementations of the same ports

pub mod db;
pub mod entities;
mod error;
pub mod memory;
pub mod metrics;
pub mod repositories;

pub use memory::{MemoryFormStore, MemoryGroupDirectory, MemoryReminderStore, MemoryUserDirectory};
