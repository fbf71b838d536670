//! HTTP route handlers.

pub mod form_groups;
pub mod forms;
pub mod health;
pub mod memberships;
pub mod public_forms;
pub mod reminders;
