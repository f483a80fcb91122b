//! Shared test helpers for integration tests.

use std::sync::Arc;

use muster::entity::character::{CharacterClass, CharacterProfile};
use muster::entity::raid::RoleLimits;
use muster::entity::signup::NewSignup;
use muster::service::signup::SignupOutcome;
use muster::types::{CharacterId, EventId, Role, UserId};
use muster::config::limits::DefaultLimitsConfig;
use muster::{
    BanService, LineupService, MemoryRosterStore, ReplacementService, RequestContext,
    RosterResult, RosterStore, SignupService,
};

/// Test harness wiring every service over one in-memory store.
pub struct TestApp {
    /// The shared store.
    pub store: Arc<dyn RosterStore>,
    /// Signup lifecycle service.
    pub signups: SignupService,
    /// Lineup view/rewrite service.
    pub lineup: LineupService,
    /// Ban subsystem.
    pub bans: BanService,
    /// Replacement subsystem.
    pub replacements: ReplacementService,
    /// The event under test.
    pub event_id: EventId,
    /// Acting officer for all requests.
    pub officer: UserId,
}

impl TestApp {
    /// Create a harness with the given role capacities for one event.
    pub async fn with_limits(
        main_tank: i32,
        off_tank: i32,
        tank: i32,
        healer: i32,
        dps: i32,
    ) -> Self {
        let store: Arc<dyn RosterStore> = Arc::new(MemoryRosterStore::new());
        let event_id = EventId::new();

        let limits = RoleLimits {
            event_id,
            main_tank_slots: main_tank,
            off_tank_slots: off_tank,
            tank_slots: tank,
            healer_slots: healer,
            dps_slots: dps,
        };
        let mut tx = store.begin().await.expect("begin");
        tx.upsert_role_limits(&limits).await.expect("limits");
        tx.commit().await.expect("commit");

        Self {
            signups: SignupService::new(store.clone(), DefaultLimitsConfig::default()),
            lineup: LineupService::new(store.clone()),
            bans: BanService::new(store.clone()),
            replacements: ReplacementService::new(store.clone()),
            store,
            event_id,
            officer: UserId::new(),
        }
    }

    /// A request context acting as the test officer.
    pub fn ctx(&self) -> RequestContext {
        RequestContext::new(self.officer)
    }

    /// Seed a character profile and return its id.
    pub async fn add_character(
        &self,
        user_id: UserId,
        class: CharacterClass,
        is_main: bool,
    ) -> CharacterId {
        let character_id = CharacterId::new();
        let profile = CharacterProfile::new(
            character_id,
            user_id,
            format!("char-{character_id}"),
            class,
            is_main,
        );
        let mut tx = self.store.begin().await.expect("begin");
        tx.upsert_character(&profile).await.expect("character");
        tx.commit().await.expect("commit");
        profile.id
    }

    /// Seed a fresh user with one character of the given class.
    pub async fn add_player(&self, class: CharacterClass) -> (UserId, CharacterId) {
        let user_id = UserId::new();
        let character_id = self.add_character(user_id, class, true).await;
        (user_id, character_id)
    }

    /// Sign a character up for the event under test.
    pub async fn signup(
        &self,
        user_id: UserId,
        character_id: CharacterId,
        role: Role,
        force_bench: bool,
    ) -> RosterResult<SignupOutcome> {
        self.signups
            .create_signup(
                &self.ctx(),
                NewSignup {
                    event_id: self.event_id,
                    user_id,
                    character_id,
                    chosen_role: role,
                    chosen_spec: None,
                    note: None,
                },
                force_bench,
            )
            .await
    }

    /// Whether a signup currently holds a role slot.
    pub async fn has_role_slot(&self, signup_id: muster::types::SignupId) -> bool {
        let mut tx = self.store.begin().await.expect("begin");
        tx.has_role_slot(signup_id).await.expect("has_role_slot")
    }
}
