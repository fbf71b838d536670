//! Eligibility evaluator.
//!
//! Pure decision logic over a form snapshot. Rules run in a fixed order and
//! the first failing rule decides the denial reason:
//!
//! 1. closed switch
//! 2. time window
//! 3. global response cap
//! 4. per-user response cap
//! 5. single-response forms
//! 6. group membership (falls through to 7 when unmatched)
//! 7. anonymous access

use chrono::{DateTime, Utc};
use shared::validation::same_email;

use crate::error::{ClosureCause, DenyReason};
use crate::models::form::Form;
use crate::models::response::AdmissionPath;
use crate::models::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admit(AdmissionPath),
    Deny(DenyReason),
}

impl Decision {
    pub fn is_admit(&self) -> bool {
        matches!(self, Decision::Admit(_))
    }
}

/// Decides whether `responder` may proceed on `form` at `now`.
///
/// `responder` is `None` for callers without an identity. Those skip the
/// per-responder rules and can only be admitted anonymously.
pub fn evaluate(form: &Form, responder: Option<&User>, now: DateTime<Utc>) -> Decision {
    if let Err(reason) = check_open(form, now) {
        return Decision::Deny(reason);
    }
    if let Err(reason) = check_capacity(form, responder) {
        return Decision::Deny(reason);
    }

    if form.settings.group_gated {
        if let Some(group_id) = responder.and_then(|u| match_group(form, &u.email)) {
            return Decision::Admit(AdmissionPath::Group(group_id));
        }
    }

    if form.settings.anonymous {
        Decision::Admit(AdmissionPath::Anonymous)
    } else {
        Decision::Deny(DenyReason::NotEligible)
    }
}

/// Rules 1 and 2.
pub fn check_open(form: &Form, now: DateTime<Utc>) -> Result<(), DenyReason> {
    if !form.accepting {
        return Err(DenyReason::FormClosed(ClosureCause::Switch));
    }

    let settings = &form.settings;
    if settings.time_bound {
        if settings.start_time.is_some_and(|start| now < start) {
            return Err(DenyReason::FormClosed(ClosureCause::NotYetOpen));
        }
        if settings.end_time.is_some_and(|end| now > end) {
            return Err(DenyReason::FormClosed(ClosureCause::Ended));
        }
    }
    Ok(())
}

/// Rules 3 to 5.
pub fn check_capacity(form: &Form, responder: Option<&User>) -> Result<(), DenyReason> {
    let settings = &form.settings;

    if settings.limit_responses && form.responses.len() >= settings.response_limit as usize {
        return Err(DenyReason::ResponseLimitReached);
    }

    if let Some(user) = responder {
        let prior = form.responses_by(user.id);
        if settings.limit_per_user && prior >= settings.per_user_limit as usize {
            return Err(DenyReason::AlreadyResponded);
        }
        if !settings.multiple && prior >= 1 {
            return Err(DenyReason::AlreadyResponded);
        }
    }
    Ok(())
}

/// First attached group listing `email`, in attach order.
pub fn match_group(form: &Form, email: &str) -> Option<uuid::Uuid> {
    form.groups
        .iter()
        .find(|g| g.participants.iter().any(|t| same_email(&t.email, email)))
        .map(|g| g.group_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::response::ResponseRecord;
    use crate::models::tracking::{Tracker, TrackingGroup};
    use chrono::Duration;
    use uuid::Uuid;

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            display_name: email.to_string(),
        }
    }

    fn open_form() -> Form {
        Form::new(Uuid::new_v4(), Utc::now())
    }

    fn record_for(form: &Form, responder: Option<Uuid>) -> ResponseRecord {
        ResponseRecord::new(form.id, responder, vec![], AdmissionPath::Anonymous, Utc::now())
    }

    fn gated(form: &mut Form, emails: &[&str]) -> Uuid {
        let gid = Uuid::new_v4();
        form.settings.group_gated = true;
        form.groups.push(TrackingGroup {
            group_id: gid,
            group_name: "G1".into(),
            participants: emails.iter().map(|e| Tracker::new(e)).collect(),
        });
        gid
    }

    #[test]
    fn test_open_anonymous_form_admits() {
        let form = open_form();
        assert_eq!(
            evaluate(&form, Some(&user("a@x.com")), Utc::now()),
            Decision::Admit(AdmissionPath::Anonymous)
        );
        assert_eq!(
            evaluate(&form, None, Utc::now()),
            Decision::Admit(AdmissionPath::Anonymous)
        );
    }

    #[test]
    fn test_closed_switch_wins_over_everything() {
        let mut form = open_form();
        form.accepting = false;
        form.settings.limit_responses = true;
        form.settings.response_limit = 1;
        form.responses.push(record_for(&form, None));

        assert_eq!(
            evaluate(&form, None, Utc::now()),
            Decision::Deny(DenyReason::FormClosed(ClosureCause::Switch))
        );
    }

    #[test]
    fn test_time_window() {
        let t0 = Utc::now();
        let t1 = t0 + Duration::hours(1);
        let mut form = open_form();
        form.settings.time_bound = true;
        form.settings.start_time = Some(t0);
        form.settings.end_time = Some(t1);

        assert_eq!(
            evaluate(&form, None, t0 - Duration::seconds(1)),
            Decision::Deny(DenyReason::FormClosed(ClosureCause::NotYetOpen))
        );
        assert_eq!(
            evaluate(&form, None, t1 + Duration::seconds(1)),
            Decision::Deny(DenyReason::FormClosed(ClosureCause::Ended))
        );
        assert!(evaluate(&form, None, t0).is_admit());
        assert!(evaluate(&form, None, t1).is_admit());
        assert!(evaluate(&form, None, t0 + Duration::minutes(30)).is_admit());
    }

    #[test]
    fn test_window_ignored_when_not_time_bound() {
        let mut form = open_form();
        form.settings.end_time = Some(Utc::now() - Duration::days(1));
        assert!(evaluate(&form, None, Utc::now()).is_admit());
    }

    #[test]
    fn test_global_limit_before_per_user() {
        let alice = user("a@x.com");
        let mut form = open_form();
        form.settings.multiple = true;
        form.settings.limit_responses = true;
        form.settings.response_limit = 2;
        form.settings.limit_per_user = true;
        form.settings.per_user_limit = 1;

        form.responses.push(record_for(&form, Some(alice.id)));
        assert_eq!(
            evaluate(&form, Some(&alice), Utc::now()),
            Decision::Deny(DenyReason::AlreadyResponded)
        );

        form.responses.push(record_for(&form, None));
        assert_eq!(
            evaluate(&form, Some(&alice), Utc::now()),
            Decision::Deny(DenyReason::ResponseLimitReached)
        );
    }

    #[test]
    fn test_per_user_limit_with_multiple() {
        let alice = user("a@x.com");
        let mut form = open_form();
        form.settings.multiple = true;
        form.settings.limit_per_user = true;
        form.settings.per_user_limit = 2;

        form.responses.push(record_for(&form, Some(alice.id)));
        assert!(evaluate(&form, Some(&alice), Utc::now()).is_admit());

        form.responses.push(record_for(&form, Some(alice.id)));
        assert_eq!(
            evaluate(&form, Some(&alice), Utc::now()),
            Decision::Deny(DenyReason::AlreadyResponded)
        );
    }

    #[test]
    fn test_single_response_form() {
        let alice = user("a@x.com");
        let bob = user("b@x.com");
        let mut form = open_form();
        form.responses.push(record_for(&form, Some(alice.id)));

        assert_eq!(
            evaluate(&form, Some(&alice), Utc::now()),
            Decision::Deny(DenyReason::AlreadyResponded)
        );
        assert!(evaluate(&form, Some(&bob), Utc::now()).is_admit());
    }

    #[test]
    fn test_group_path_takes_precedence() {
        let mut form = open_form();
        let gid = gated(&mut form, &["a@x.com"]);
        assert!(form.settings.anonymous);

        assert_eq!(
            evaluate(&form, Some(&user("A@x.com")), Utc::now()),
            Decision::Admit(AdmissionPath::Group(gid))
        );
    }

    #[test]
    fn test_unmatched_falls_through_to_anonymous() {
        let mut form = open_form();
        gated(&mut form, &["a@x.com"]);

        assert_eq!(
            evaluate(&form, Some(&user("c@x.com")), Utc::now()),
            Decision::Admit(AdmissionPath::Anonymous)
        );

        form.settings.anonymous = false;
        assert_eq!(
            evaluate(&form, Some(&user("c@x.com")), Utc::now()),
            Decision::Deny(DenyReason::NotEligible)
        );
        assert_eq!(
            evaluate(&form, None, Utc::now()),
            Decision::Deny(DenyReason::NotEligible)
        );
    }

    #[test]
    fn test_groups_ignored_unless_gated() {
        let mut form = open_form();
        gated(&mut form, &["a@x.com"]);
        form.settings.group_gated = false;

        assert_eq!(
            evaluate(&form, Some(&user("a@x.com")), Utc::now()),
            Decision::Admit(AdmissionPath::Anonymous)
        );
    }

    #[test]
    fn test_match_group_uses_attach_order() {
        let mut form = open_form();
        let first = gated(&mut form, &["a@x.com"]);
        gated(&mut form, &["a@x.com"]);
        assert_eq!(match_group(&form, "a@x.com"), Some(first));
    }
}
