//! Concurrent admission and tracking writes on one form.

mod common;

use common::{empty_submission, group_only, Harness};
use domain::error::{DenyReason, DomainError};
use domain::models::{FormSettings, MembershipChange};

const PARALLEL: usize = 16;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_submits_from_one_responder_admit_once() {
    let h = Harness::new();
    let owner = h.user("owner@x.com").await;
    let alice = h.user("alice@x.com").await;
    let form = h.form(&owner, FormSettings::default()).await;

    let mut handles = Vec::new();
    for _ in 0..PARALLEL {
        let engine = h.engine.clone();
        let alice = alice.clone();
        let url_id = form.url_id;
        handles.push(tokio::spawn(async move {
            engine.submit(url_id, Some(&alice), empty_submission()).await
        }));
    }

    let mut admitted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(DomainError::Eligibility { reason, .. }) => {
                assert_eq!(reason, DenyReason::AlreadyResponded)
            }
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(admitted, 1);
    assert_eq!(h.reload(form.id).await.responses.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_submits_respect_global_limit() {
    let h = Harness::new();
    let owner = h.user("owner@x.com").await;
    let settings = FormSettings {
        limit_responses: true,
        response_limit: 5,
        ..FormSettings::default()
    };
    let form = h.form(&owner, settings).await;

    let mut callers = Vec::new();
    for i in 0..PARALLEL {
        callers.push(h.user(&format!("user{}@x.com", i)).await);
    }

    let handles: Vec<_> = callers
        .into_iter()
        .map(|caller| {
            let engine = h.engine.clone();
            let url_id = form.url_id;
            tokio::spawn(async move { engine.submit(url_id, Some(&caller), empty_submission()).await })
        })
        .collect();

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            admitted += 1;
        }
    }

    assert_eq!(admitted, 5);
    assert_eq!(h.reload(form.id).await.responses.len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_views_set_seen_once() {
    let h = Harness::new();
    let owner = h.user("owner@x.com").await;
    let a = h.user("a@x.com").await;
    let form = h.form(&owner, group_only()).await;
    let g1 = h.group(&owner, &["a@x.com", "b@x.com"]).await;
    h.propagation
        .attach_group(form.id, g1.id, owner.user_id)
        .await
        .unwrap();

    let handles: Vec<_> = (0..PARALLEL)
        .map(|_| {
            let engine = h.engine.clone();
            let a = a.clone();
            let url_id = form.url_id;
            tokio::spawn(async move { engine.view(url_id, Some(&a)).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = h.reload(form.id).await;
    let tracking = stored.tracking_group(g1.id).unwrap();
    assert_eq!(tracking.participants.len(), 2);
    assert!(tracking.tracker("a@x.com").unwrap().seen);
    assert!(!tracking.tracker("b@x.com").unwrap().seen);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_submits_racing_roster_edits_hit_the_right_rows() {
    let h = Harness::new();
    let owner = h.user("owner@x.com").await;
    let form = h.form(&owner, group_only()).await;

    let emails: Vec<String> = (0..PARALLEL).map(|i| format!("p{}@x.com", i)).collect();
    let refs: Vec<&str> = emails.iter().map(String::as_str).collect();
    let g1 = h.group(&owner, &refs).await;
    h.propagation
        .attach_group(form.id, g1.id, owner.user_id)
        .await
        .unwrap();

    let mut responders = Vec::new();
    for email in emails.iter().skip(PARALLEL / 2) {
        responders.push(h.user(email).await);
    }
    let leavers: Vec<String> = emails.iter().take(PARALLEL / 2).cloned().collect();

    let mut handles = Vec::new();
    for caller in responders {
        let engine = h.engine.clone();
        let url_id = form.url_id;
        handles.push(tokio::spawn(async move {
            engine
                .submit(url_id, Some(&caller), empty_submission())
                .await
                .map(|_| ())
        }));
    }
    // Removing the first half renumbers every remaining row.
    for leaver in leavers {
        let change = MembershipChange {
            added: vec![],
            removed: vec![leaver],
        };
        h.propagation
            .propagate_membership_change(g1.id, &change)
            .await
            .unwrap();
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = h.reload(form.id).await;
    let tracking = stored.tracking_group(g1.id).unwrap();
    assert_eq!(tracking.participants.len(), PARALLEL / 2);
    assert!(tracking.participants.iter().all(|t| t.filled));
    assert_eq!(stored.responses.len(), PARALLEL / 2);
}
