//! Domain services.
//!
//! `eligibility` and `locator` are pure functions over a form snapshot. The
//! remaining services orchestrate them against the outbound ports.

pub mod admission;
pub mod eligibility;
pub mod gate;
pub mod locator;
pub mod notification;
pub mod propagation;
pub mod reminder;

pub use admission::AdmissionEngine;
pub use eligibility::{evaluate, Decision};
pub use gate::SettingsGate;
pub use locator::{find_anomalies, locate, LocateError, TrackerPosition};
pub use notification::{LoggingNotifier, NotificationResult, ReminderNotifier};
pub use propagation::GroupPropagation;
pub use reminder::ReminderService;
