//! Integration tests for lineup views and bulk rewrites.

use muster::entity::character::CharacterClass;
use muster::events::LineupEvent;
use muster::service::lineup::{BenchEntry, LineupSubmission};
use muster::types::{Role, SignupId};
use muster::RosterError;

use crate::helpers::TestApp;

fn dps_submission(ids: Vec<SignupId>, bench: Vec<SignupId>) -> LineupSubmission {
    LineupSubmission {
        dps: ids,
        bench_queue: bench
            .into_iter()
            .map(|signup_id| BenchEntry {
                signup_id,
                chosen_role: None,
            })
            .collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_view_groups_slots_and_bench() {
    let app = TestApp::with_limits(1, 0, 0, 0, 2).await;
    let (u1, c1) = app.add_player(CharacterClass::Warrior).await;
    let (u2, c2) = app.add_player(CharacterClass::Hunter).await;
    let (u3, c3) = app.add_player(CharacterClass::Mage).await;

    app.signup(u1, c1, Role::MainTank, false).await.expect("mt");
    app.signup(u2, c2, Role::Dps, false).await.expect("dps");
    app.signup(u3, c3, Role::Dps, true).await.expect("bench");

    let view = app.lineup.view(app.event_id).await.expect("view");
    assert_eq!(view.main_tanks.len(), 1);
    assert_eq!(view.dps.len(), 1);
    assert_eq!(view.bench_queue.len(), 1);
    assert!(!view.version.is_empty());
}

#[tokio::test]
async fn test_rewrite_with_current_fingerprint_succeeds() {
    let app = TestApp::with_limits(0, 0, 0, 0, 2).await;
    let (u1, c1) = app.add_player(CharacterClass::Hunter).await;
    let (u2, c2) = app.add_player(CharacterClass::Mage).await;

    let a = app.signup(u1, c1, Role::Dps, false).await.expect("a");
    let b = app.signup(u2, c2, Role::Dps, false).await.expect("b");

    let view = app.lineup.view(app.event_id).await.expect("view");
    let mut submission = dps_submission(vec![b.signup.id, a.signup.id], vec![]);
    submission.expected_version = Some(view.version);

    let outcome = app
        .lineup
        .update_lineup(&app.ctx(), app.event_id, &submission)
        .await
        .expect("rewrite with fresh fingerprint");
    assert_eq!(outcome.lineup.dps.len(), 2);
    assert_eq!(outcome.lineup.dps[0].signup.id, b.signup.id);
}

#[tokio::test]
async fn test_rewrite_with_stale_fingerprint_mutates_nothing() {
    let app = TestApp::with_limits(0, 0, 0, 0, 2).await;
    let (u1, c1) = app.add_player(CharacterClass::Hunter).await;
    let (u2, c2) = app.add_player(CharacterClass::Mage).await;

    let a = app.signup(u1, c1, Role::Dps, false).await.expect("a");
    app.signup(u2, c2, Role::Dps, false).await.expect("b");

    let before = app.lineup.view(app.event_id).await.expect("view");

    let mut submission = dps_submission(vec![a.signup.id], vec![]);
    submission.expected_version = Some("stale".to_string());
    let err = app
        .lineup
        .update_lineup(&app.ctx(), app.event_id, &submission)
        .await
        .expect_err("stale fingerprint");
    assert!(matches!(err, RosterError::StaleLineup));

    let after = app.lineup.view(app.event_id).await.expect("view");
    assert_eq!(before.version, after.version);
    assert_eq!(after.dps.len(), 2);
}

#[tokio::test]
async fn test_rewrite_enforces_one_slot_per_participant() {
    let app = TestApp::with_limits(1, 0, 0, 0, 2).await;
    let (u1, main) = app.add_player(CharacterClass::Warrior).await;
    let alt = app.add_character(u1, CharacterClass::Hunter, false).await;

    let original = app
        .signup(u1, main, Role::MainTank, false)
        .await
        .expect("main tank");
    let alt_signup = app.signup(u1, alt, Role::Dps, true).await.expect("alt");

    // The officer drags the alt into the DPS group while keeping the
    // original main tank: the later entry of the same participant is
    // diverted to the bench tail.
    let submission = LineupSubmission {
        dps: vec![alt_signup.signup.id],
        main_tanks: vec![original.signup.id],
        ..Default::default()
    };
    let outcome = app
        .lineup
        .update_lineup(&app.ctx(), app.event_id, &submission)
        .await
        .expect("rewrite");

    assert_eq!(outcome.lineup.main_tanks.len(), 1);
    assert_eq!(
        outcome.lineup.main_tanks[0].signup.id,
        original.signup.id
    );
    assert!(outcome.lineup.dps.is_empty());
    assert_eq!(outcome.lineup.bench_queue.len(), 1);
    assert_eq!(outcome.lineup.bench_queue[0].signup.id, alt_signup.signup.id);
}

#[tokio::test]
async fn test_rewrite_swaps_participants_characters() {
    let app = TestApp::with_limits(1, 0, 0, 0, 4).await;
    let (u1, main) = app.add_player(CharacterClass::Warrior).await;
    let alt = app.add_character(u1, CharacterClass::Paladin, false).await;

    let original = app
        .signup(u1, main, Role::MainTank, false)
        .await
        .expect("main tank");
    let alt_signup = app.signup(u1, alt, Role::Dps, true).await.expect("alt");

    // Alt is listed first and wins the participant's single slot; the
    // original main tank is demoted to the bench tail.
    let submission = LineupSubmission {
        main_tanks: vec![alt_signup.signup.id, original.signup.id],
        ..Default::default()
    };
    let outcome = app
        .lineup
        .update_lineup(&app.ctx(), app.event_id, &submission)
        .await
        .expect("rewrite");

    assert_eq!(outcome.lineup.main_tanks.len(), 1);
    assert_eq!(
        outcome.lineup.main_tanks[0].signup.id,
        alt_signup.signup.id
    );
    assert_eq!(outcome.lineup.bench_queue.len(), 1);
    assert_eq!(
        outcome.lineup.bench_queue[0].signup.id,
        original.signup.id
    );
}

#[tokio::test]
async fn test_orphaned_signup_lands_on_bench_tail() {
    let app = TestApp::with_limits(0, 0, 0, 0, 2).await;
    let (u1, c1) = app.add_player(CharacterClass::Hunter).await;
    let (u2, c2) = app.add_player(CharacterClass::Mage).await;
    let (u3, c3) = app.add_player(CharacterClass::Rogue).await;
    let (u4, c4) = app.add_player(CharacterClass::Warlock).await;

    let a = app.signup(u1, c1, Role::Dps, false).await.expect("a");
    let b = app.signup(u2, c2, Role::Dps, false).await.expect("b");
    let swapped_in = app.signup(u3, c3, Role::Dps, true).await.expect("bench 1");
    let kept = app.signup(u4, c4, Role::Dps, true).await.expect("bench 2");

    // The officer swaps `swapped_in` into b's slot and omits `b`
    // entirely: it must not disappear, it goes to the bench after the
    // explicitly kept entry.
    let submission = dps_submission(
        vec![a.signup.id, swapped_in.signup.id],
        vec![kept.signup.id],
    );
    let outcome = app
        .lineup
        .update_lineup(&app.ctx(), app.event_id, &submission)
        .await
        .expect("rewrite");

    let bench_ids: Vec<SignupId> = outcome
        .lineup
        .bench_queue
        .iter()
        .map(|entry| entry.signup.id)
        .collect();
    assert_eq!(bench_ids, vec![kept.signup.id, b.signup.id]);

    // The orphan was auto-benched and notified as such.
    assert!(outcome.events.iter().any(|e| matches!(
        e,
        LineupEvent::Benched { signup_id, .. } if *signup_id == b.signup.id
    )));
}

#[tokio::test]
async fn test_rewrite_promotes_for_net_freed_slots() {
    let app = TestApp::with_limits(0, 0, 0, 0, 2).await;
    let (u1, c1) = app.add_player(CharacterClass::Hunter).await;
    let (u2, c2) = app.add_player(CharacterClass::Mage).await;
    let (u3, c3) = app.add_player(CharacterClass::Rogue).await;

    let a = app.signup(u1, c1, Role::Dps, false).await.expect("a");
    let _b = app.signup(u2, c2, Role::Dps, false).await.expect("b");
    let benched = app.signup(u3, c3, Role::Dps, true).await.expect("bench");

    // Officer drops `b` from the lineup and keeps the bench order: the
    // freed slot is refilled from the bench inside the same rewrite.
    let submission = dps_submission(vec![a.signup.id], vec![benched.signup.id]);
    let outcome = app
        .lineup
        .update_lineup(&app.ctx(), app.event_id, &submission)
        .await
        .expect("rewrite");

    assert!(outcome.events.iter().any(|e| matches!(
        e,
        LineupEvent::Promoted { signup_id, .. } if *signup_id == benched.signup.id
    )));
    assert!(app.has_role_slot(benched.signup.id).await);
}

#[tokio::test]
async fn test_rewrite_bench_reorder_changes_promotion_order() {
    let app = TestApp::with_limits(0, 0, 0, 0, 2).await;
    let (u1, c1) = app.add_player(CharacterClass::Hunter).await;
    let (u2, c2) = app.add_player(CharacterClass::Mage).await;
    let (u3, c3) = app.add_player(CharacterClass::Rogue).await;
    let (u4, c4) = app.add_player(CharacterClass::Warlock).await;

    let a = app.signup(u1, c1, Role::Dps, false).await.expect("a");
    let b = app.signup(u2, c2, Role::Dps, false).await.expect("b");
    let first = app.signup(u3, c3, Role::Dps, true).await.expect("bench 1");
    let second = app.signup(u4, c4, Role::Dps, true).await.expect("bench 2");

    // Officer reverses the bench queue.
    let submission = dps_submission(
        vec![a.signup.id, b.signup.id],
        vec![second.signup.id, first.signup.id],
    );
    app.lineup
        .update_lineup(&app.ctx(), app.event_id, &submission)
        .await
        .expect("reorder");

    // Promotion now serves the signup the officer moved to the front.
    app.signups
        .delete_signup(&app.ctx(), a.signup.id)
        .await
        .expect("delete");
    assert!(app.has_role_slot(second.signup.id).await);
    assert!(!app.has_role_slot(first.signup.id).await);
}

#[tokio::test]
async fn test_promotion_fallback_never_reselects_declined_signup() {
    let app = TestApp::with_limits(0, 0, 0, 0, 1).await;
    let (u1, c1) = app.add_player(CharacterClass::Hunter).await;
    let (u2, c2) = app.add_player(CharacterClass::Mage).await;

    let a = app.signup(u1, c1, Role::Dps, false).await.expect("a");
    let declined = app.signup(u2, c2, Role::Dps, true).await.expect("benched");

    // Declining leaves the signup row behind without any placement —
    // exactly the shape the fallback scan looks for.
    app.signups
        .decline_signup(&app.ctx(), declined.signup.id)
        .await
        .expect("decline");

    let events = app
        .signups
        .delete_signup(&app.ctx(), a.signup.id)
        .await
        .expect("delete");

    assert!(
        !events
            .iter()
            .any(|e| matches!(e, LineupEvent::Promoted { .. }))
    );
    assert!(!app.has_role_slot(declined.signup.id).await);
}

#[tokio::test]
async fn test_rewrite_rejects_incompatible_role_change() {
    let app = TestApp::with_limits(0, 0, 0, 1, 1).await;
    let (u1, c1) = app.add_player(CharacterClass::Hunter).await;

    let a = app.signup(u1, c1, Role::Dps, false).await.expect("a");

    // Dragging a hunter into the healer group aborts the whole rewrite.
    let submission = LineupSubmission {
        healers: vec![a.signup.id],
        ..Default::default()
    };
    let err = app
        .lineup
        .update_lineup(&app.ctx(), app.event_id, &submission)
        .await
        .expect_err("hunter cannot heal");
    assert!(matches!(err, RosterError::IncompatibleRole { .. }));

    // The failed rewrite left the lineup untouched.
    let view = app.lineup.view(app.event_id).await.expect("view");
    assert_eq!(view.dps.len(), 1);
}

#[tokio::test]
async fn test_confirm_lineup_stamps_unconfirmed_slots() {
    let app = TestApp::with_limits(0, 0, 0, 0, 2).await;
    let (u1, c1) = app.add_player(CharacterClass::Hunter).await;
    let (u2, c2) = app.add_player(CharacterClass::Mage).await;

    app.signup(u1, c1, Role::Dps, false).await.expect("a");
    app.signup(u2, c2, Role::Dps, true).await.expect("benched");

    let confirmed = app
        .lineup
        .confirm_lineup(&app.ctx(), app.event_id)
        .await
        .expect("confirm");
    assert_eq!(confirmed, 2);

    let view = app.lineup.view(app.event_id).await.expect("view");
    assert!(view.dps[0].slot.confirmed_at.is_some());
    assert_eq!(view.dps[0].slot.confirmed_by, Some(app.officer));

    // Already-confirmed slots are not re-stamped.
    let again = app
        .lineup
        .confirm_lineup(&app.ctx(), app.event_id)
        .await
        .expect("second confirm");
    assert_eq!(again, 0);
}

#[tokio::test]
async fn test_fallback_promotion_prefers_mains_then_oldest() {
    let app = TestApp::with_limits(0, 0, 0, 0, 2).await;
    let (u1, c1) = app.add_player(CharacterClass::Hunter).await;
    let (u2, alt_char) = {
        let user = muster::types::UserId::new();
        let character = app.add_character(user, CharacterClass::Mage, false).await;
        (user, character)
    };
    let (u3, main_char) = app.add_player(CharacterClass::Rogue).await;

    let holder = app.signup(u1, c1, Role::Dps, false).await.expect("holder");

    // Two signups without any placement, seeded through the store: the
    // fallback path the engine uses when the bench queue is empty.
    let mut tx = app.store.begin().await.expect("begin");
    let alt_signup = tx
        .insert_signup(&muster::entity::signup::NewSignup {
            event_id: app.event_id,
            user_id: u2,
            character_id: alt_char,
            chosen_role: Role::Dps,
            chosen_spec: None,
            note: None,
        })
        .await
        .expect("alt signup");
    let main_signup = tx
        .insert_signup(&muster::entity::signup::NewSignup {
            event_id: app.event_id,
            user_id: u3,
            character_id: main_char,
            chosen_role: Role::Dps,
            chosen_spec: None,
            note: None,
        })
        .await
        .expect("main signup");
    tx.commit().await.expect("commit");

    app.signups
        .delete_signup(&app.ctx(), holder.signup.id)
        .await
        .expect("delete");

    // The alt was created first, but the main-character signup wins the
    // fallback tie-break.
    assert!(app.has_role_slot(main_signup.id).await);
    assert!(!app.has_role_slot(alt_signup.id).await);
}
