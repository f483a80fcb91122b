//! Integration tests for character replacement requests.

use muster::RosterError;
use muster::entity::character::CharacterClass;
use muster::entity::replacement::{ReplacementAction, ReplacementStatus};
use muster::events::LineupEvent;
use muster::types::Role;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_request_for_unknown_signup_fails() {
    let app = TestApp::with_limits(0, 0, 0, 0, 2).await;
    let (user, _) = app.add_player(CharacterClass::Hunter).await;
    let new_character = app.add_character(user, CharacterClass::Mage, false).await;

    let err = app
        .replacements
        .request(
            &app.ctx(),
            muster::types::SignupId::new(),
            new_character,
            None,
        )
        .await
        .expect_err("no such signup");
    assert!(matches!(err, RosterError::NotFound(_)));
}

#[tokio::test]
async fn test_request_conflicts_with_live_signup() {
    let app = TestApp::with_limits(0, 0, 0, 0, 4).await;
    let (u1, c1) = app.add_player(CharacterClass::Hunter).await;
    let (u2, c2) = app.add_player(CharacterClass::Mage).await;

    let target = app.signup(u1, c1, Role::Dps, false).await.expect("target");
    app.signup(u2, c2, Role::Dps, false).await.expect("other");

    // c2 is already signed up; proposing it must surface the conflict
    // for the officer to resolve manually.
    let err = app
        .replacements
        .request(&app.ctx(), target.signup.id, c2, None)
        .await
        .expect_err("conflicting live signup");
    assert!(matches!(
        err,
        RosterError::CharacterConflict { character_id } if character_id == c2
    ));
}

#[tokio::test]
async fn test_confirm_swaps_character_in_place() {
    let app = TestApp::with_limits(0, 0, 0, 0, 4).await;
    let (u1, c1) = app.add_player(CharacterClass::Hunter).await;
    let alt = app.add_character(u1, CharacterClass::Rogue, false).await;
    let (u2, c2) = app.add_player(CharacterClass::Mage).await;

    let target = app.signup(u1, c1, Role::Dps, false).await.expect("target");
    app.signup(u2, c2, Role::Dps, false).await.expect("other");

    let before = app.lineup.view(app.event_id).await.expect("view");
    let slot_before = before.dps[0].slot.clone();

    let request = app
        .replacements
        .request(&app.ctx(), target.signup.id, alt, Some("bring the alt".into()))
        .await
        .expect("request");
    assert_eq!(request.status, ReplacementStatus::Pending);

    let outcome = app
        .replacements
        .resolve(&app.ctx(), request.id, ReplacementAction::Confirm)
        .await
        .expect("confirm");
    assert_eq!(outcome.request.status, ReplacementStatus::Confirmed);
    assert!(outcome.request.resolved_at.is_some());

    // Character swapped, placement untouched.
    let updated = app
        .signups
        .get_signup(target.signup.id)
        .await
        .expect("get")
        .expect("still exists");
    assert_eq!(updated.character_id, alt);

    let after = app.lineup.view(app.event_id).await.expect("view");
    let slot_after = after
        .dps
        .iter()
        .find(|entry| entry.signup.id == target.signup.id)
        .expect("still slotted")
        .slot
        .clone();
    assert_eq!(slot_after.group, slot_before.group);
    assert_eq!(slot_after.position, slot_before.position);
    assert_eq!(slot_after.character_id, Some(alt));
}

#[tokio::test]
async fn test_confirm_removes_conflicting_signup_that_raced_in() {
    let app = TestApp::with_limits(0, 0, 0, 0, 2).await;
    let (u1, c1) = app.add_player(CharacterClass::Hunter).await;
    let alt = app.add_character(u1, CharacterClass::Rogue, false).await;
    let (u2, c2) = app.add_player(CharacterClass::Mage).await;

    let target = app.signup(u1, c1, Role::Dps, false).await.expect("target");
    let request = app
        .replacements
        .request(&app.ctx(), target.signup.id, alt, None)
        .await
        .expect("request");

    // The alt signs up on its own between request and confirmation.
    let racer = app.signup(u1, alt, Role::Dps, false).await.expect("racer");
    app.signup(u2, c2, Role::Dps, true).await.expect("benched");

    let outcome = app
        .replacements
        .resolve(&app.ctx(), request.id, ReplacementAction::Confirm)
        .await
        .expect("confirm");

    // The conflicting signup was removed to make room for the swap.
    assert!(
        app.signups
            .get_signup(racer.signup.id)
            .await
            .expect("get")
            .is_none()
    );
    assert!(outcome.events.iter().any(|e| matches!(
        e,
        LineupEvent::Removed { signup_id, .. } if *signup_id == racer.signup.id
    )));

    let updated = app
        .signups
        .get_signup(target.signup.id)
        .await
        .expect("get")
        .expect("target remains");
    assert_eq!(updated.character_id, alt);
}

#[tokio::test]
async fn test_confirm_validates_capability_of_new_character() {
    let app = TestApp::with_limits(0, 0, 0, 2, 2).await;
    let (u1, c1) = app.add_player(CharacterClass::Priest).await;
    let hunter_alt = app.add_character(u1, CharacterClass::Hunter, false).await;

    let target = app
        .signup(u1, c1, Role::Healer, false)
        .await
        .expect("healer");
    let request = app
        .replacements
        .request(&app.ctx(), target.signup.id, hunter_alt, None)
        .await
        .expect("request");

    // A hunter cannot take over a healer slot.
    let err = app
        .replacements
        .resolve(&app.ctx(), request.id, ReplacementAction::Confirm)
        .await
        .expect_err("incompatible class");
    assert!(matches!(err, RosterError::IncompatibleRole { .. }));

    // The aborted confirmation left the request pending.
    let unchanged = app
        .replacements
        .get_request(request.id)
        .await
        .expect("get")
        .expect("request exists");
    assert_eq!(unchanged.status, ReplacementStatus::Pending);
}

#[tokio::test]
async fn test_decline_leaves_signup_untouched() {
    let app = TestApp::with_limits(0, 0, 0, 0, 2).await;
    let (u1, c1) = app.add_player(CharacterClass::Hunter).await;
    let alt = app.add_character(u1, CharacterClass::Rogue, false).await;

    let target = app.signup(u1, c1, Role::Dps, false).await.expect("target");
    let request = app
        .replacements
        .request(&app.ctx(), target.signup.id, alt, None)
        .await
        .expect("request");

    let outcome = app
        .replacements
        .resolve(&app.ctx(), request.id, ReplacementAction::Decline)
        .await
        .expect("decline");
    assert_eq!(outcome.request.status, ReplacementStatus::Declined);
    assert!(outcome.events.is_empty());

    let unchanged = app
        .signups
        .get_signup(target.signup.id)
        .await
        .expect("get")
        .expect("signup remains");
    assert_eq!(unchanged.character_id, c1);
    assert!(app.has_role_slot(target.signup.id).await);
}

#[tokio::test]
async fn test_leave_deletes_signup_and_promotes() {
    let app = TestApp::with_limits(0, 0, 0, 0, 2).await;
    let (u1, c1) = app.add_player(CharacterClass::Hunter).await;
    let alt = app.add_character(u1, CharacterClass::Rogue, false).await;
    let (u2, c2) = app.add_player(CharacterClass::Mage).await;
    let (u3, c3) = app.add_player(CharacterClass::Warlock).await;

    let target = app.signup(u1, c1, Role::Dps, false).await.expect("target");
    app.signup(u2, c2, Role::Dps, false).await.expect("other");
    let benched = app.signup(u3, c3, Role::Dps, true).await.expect("benched");

    let request = app
        .replacements
        .request(&app.ctx(), target.signup.id, alt, None)
        .await
        .expect("request");

    let outcome = app
        .replacements
        .resolve(&app.ctx(), request.id, ReplacementAction::Leave)
        .await
        .expect("leave");
    assert_eq!(outcome.request.status, ReplacementStatus::Left);

    assert!(
        app.signups
            .get_signup(target.signup.id)
            .await
            .expect("get")
            .is_none()
    );
    assert!(app.has_role_slot(benched.signup.id).await);
    assert!(outcome.events.iter().any(|e| matches!(
        e,
        LineupEvent::Promoted { signup_id, .. } if *signup_id == benched.signup.id
    )));
}

#[tokio::test]
async fn test_resolution_is_terminal() {
    let app = TestApp::with_limits(0, 0, 0, 0, 2).await;
    let (u1, c1) = app.add_player(CharacterClass::Hunter).await;
    let alt = app.add_character(u1, CharacterClass::Rogue, false).await;

    let target = app.signup(u1, c1, Role::Dps, false).await.expect("target");
    let request = app
        .replacements
        .request(&app.ctx(), target.signup.id, alt, None)
        .await
        .expect("request");

    app.replacements
        .resolve(&app.ctx(), request.id, ReplacementAction::Decline)
        .await
        .expect("first resolution");

    let err = app
        .replacements
        .resolve(&app.ctx(), request.id, ReplacementAction::Confirm)
        .await
        .expect_err("already resolved");
    assert!(matches!(err, RosterError::Conflict(_)));
}
