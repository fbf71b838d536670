//! Shared utilities and common types for the Formgate backend.
//!
//! This crate provides common functionality used across all other crates:
//! - JWT access-token validation (tokens are issued by the identity service)
//! - E-mail normalisation and validation helpers

pub mod jwt;
pub mod validation;
