//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod form;
pub mod form_group;
pub mod reminder;
pub mod user;

pub use form::FormEntity;
pub use form_group::FormGroupEntity;
pub use reminder::ReminderEntity;
pub use user::UserEntity;
