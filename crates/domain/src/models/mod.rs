//! Domain models for Formgate.

pub mod form;
pub mod group;
pub mod reminder;
pub mod response;
pub mod tracking;
pub mod user;

pub use form::{Form, FormContent, FormSettings, FormSummary, FormView};
pub use group::{GroupRoster, MembershipChange, PropagationReport, SyncReport};
pub use reminder::{Reminder, ReminderReport, SendReminderRequest};
pub use response::{AdmissionPath, ResponseReceipt, ResponseRecord, Submission, SubmitResponseRequest};
pub use tracking::{Tracker, TrackerFlag, TrackerKey, TrackerUpdate, TrackingGroup};
pub use user::{Caller, User};
