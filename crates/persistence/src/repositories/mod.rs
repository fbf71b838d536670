//! Repository implementations for database operations.
//!
//! Each repository implements one of the domain's outbound ports.

pub mod form;
pub mod form_group;
pub mod reminder;
pub mod user;

pub use form::FormRepository;
pub use form_group::FormGroupRepository;
pub use reminder::ReminderRepository;
pub use user::UserRepository;
