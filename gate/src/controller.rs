use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    account::{Account, UserType},
    observer::{GateEvent, Listener, ListenerId, Listeners},
    policy::{self, FeatureKey},
    trial::{TrialState, TrialWindow},
};

/// What the dashboard is currently showing on top of the active view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "feature", rename_all = "snake_case")]
pub enum GateState {
    Normal,
    UpsellPrompt(FeatureKey),
    ExpiredOverlay,
}

/// Progress of the account fetch backing a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountLoad {
    Loading,
    Loaded(Account),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Loading,
    Loaded,
    Failed,
}

impl AccountLoad {
    pub fn status(&self) -> LoadStatus {
        match self {
            AccountLoad::Loading => LoadStatus::Loading,
            AccountLoad::Loaded(_) => LoadStatus::Loaded,
            AccountLoad::Failed => LoadStatus::Failed,
        }
    }
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "feature", rename_all = "snake_case")]
pub enum NavigationOutcome {
    Navigated(FeatureKey),
    Upsell(FeatureKey),
    Expired,
}

/// Identifies one account fetch. Results presented with a stale ticket are
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    session: Uuid,
    generation: u64,
}

/// Access rights at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entitlement {
    pub user_type: UserType,
    pub trial: TrialState,
    pub is_trial: bool,
    pub is_active: bool,
    pub is_expired: bool,
}

impl Entitlement {
    pub fn is_locked(&self, feature: FeatureKey) -> bool {
        policy::is_locked(self.user_type, self.is_trial, feature)
    }

    pub fn locked_features(&self) -> Vec<FeatureKey> {
        policy::locked_features(self.user_type, self.is_trial)
    }
}

/// Everything the dashboard needs to render banners, lock icons and modals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateSnapshot {
    pub state: GateState,
    pub active_view: FeatureKey,
    pub account: LoadStatus,
    pub entitlement: Entitlement,
    pub locked_features: Vec<FeatureKey>,
}

/// Gates dashboard navigation for a single session.
#[derive(Debug)]
pub struct GateController {
    session: Uuid,
    generation: u64,
    user_type: UserType,
    window: TrialWindow,
    load: AccountLoad,
    state: GateState,
    active_view: FeatureKey,
    listeners: Listeners,
}

impl GateController {
    /// New session showing the dashboard home. `user_type` is what the session
    /// knows before the account arrives; the loaded account overrides it.
    pub fn new(user_type: UserType, window: TrialWindow) -> Self {
        Self {
            session: Uuid::new_v4(),
            generation: 0,
            user_type,
            window,
            load: AccountLoad::Loading,
            state: GateState::Normal,
            active_view: FeatureKey::Dashboard,
            listeners: Listeners::default(),
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn active_view(&self) -> FeatureKey {
        self.active_view
    }

    pub fn load(&self) -> &AccountLoad {
        &self.load
    }

    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn entitlement(&self, now: DateTime<Utc>) -> Entitlement {
        match &self.load {
            // optimistic until the account arrives
            AccountLoad::Loading => Entitlement {
                user_type: self.user_type,
                trial: self.window.fresh(),
                is_trial: false,
                is_active: false,
                is_expired: false,
            },
            AccountLoad::Failed => Entitlement {
                user_type: self.user_type,
                trial: self.window.fresh(),
                is_trial: true,
                is_active: false,
                is_expired: false,
            },
            AccountLoad::Loaded(account) => {
                let trial = self.window.state(account.created_at, now);
                Entitlement {
                    user_type: account.user_type,
                    trial,
                    is_trial: account.is_trial(),
                    is_active: account.is_active(),
                    is_expired: account.is_trial() && trial.is_expired,
                }
            }
        }
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> GateSnapshot {
        let entitlement = self.entitlement(now);
        GateSnapshot {
            state: self.state,
            active_view: self.active_view,
            account: self.load.status(),
            locked_features: entitlement.locked_features(),
            entitlement,
        }
    }

    /// Handles a click on a dashboard area.
    ///
    /// Expired trials get the overlay whatever was requested. Locked features
    /// open (or replace) the upsell prompt and leave the active view alone.
    pub fn request_navigation(&mut self, target: FeatureKey, now: DateTime<Utc>) -> NavigationOutcome {
        let entitlement = self.entitlement(now);

        if entitlement.is_expired {
            self.transition(GateState::ExpiredOverlay, self.active_view);
            NavigationOutcome::Expired
        } else if entitlement.is_locked(target) {
            self.transition(GateState::UpsellPrompt(target), self.active_view);
            NavigationOutcome::Upsell(target)
        } else {
            self.transition(GateState::Normal, target);
            NavigationOutcome::Navigated(target)
        }
    }

    /// Closes the upsell prompt. The expired overlay cannot be dismissed.
    pub fn dismiss_prompt(&mut self) {
        if let GateState::UpsellPrompt(_) = self.state {
            self.transition(GateState::Normal, self.active_view);
        }
    }

    /// Starts an account fetch. A previously loaded account stays in effect
    /// until the new result arrives.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        if !matches!(self.load, AccountLoad::Loaded(_)) {
            self.load = AccountLoad::Loading;
        }
        FetchTicket {
            session: self.session,
            generation: self.generation,
        }
    }

    /// Applies the outcome of the fetch identified by `ticket`.
    ///
    /// Returns false and changes nothing when the ticket belongs to an ended
    /// session or was superseded by a newer fetch.
    pub fn apply_fetch<E: Display>(
        &mut self,
        ticket: FetchTicket,
        result: Result<Account, E>,
        now: DateTime<Utc>,
    ) -> bool {
        if ticket.session != self.session || ticket.generation != self.generation {
            log::info!("Discarding stale account fetch for session {}", ticket.session);
            return false;
        }

        self.load = match result {
            Ok(account) => AccountLoad::Loaded(account),
            Err(e) => {
                log::warn!("Account fetch failed, treating as fresh trial: {}", e);
                AccountLoad::Failed
            }
        };
        self.refresh(now);
        true
    }

    /// Re-checks the current surface against the entitlement at `now`.
    pub fn refresh(&mut self, now: DateTime<Utc>) {
        let entitlement = self.entitlement(now);

        if entitlement.is_expired {
            self.transition(GateState::ExpiredOverlay, self.active_view);
        } else if entitlement.is_locked(self.active_view) {
            let locked = self.active_view;
            self.transition(GateState::UpsellPrompt(locked), FeatureKey::Dashboard);
        } else {
            match self.state {
                GateState::ExpiredOverlay => self.transition(GateState::Normal, self.active_view),
                GateState::UpsellPrompt(feature) if !entitlement.is_locked(feature) => {
                    self.transition(GateState::Normal, self.active_view)
                }
                _ => {}
            }
        }
    }

    /// Ends the session. Pending fetches are discarded on arrival.
    pub fn end_session(&mut self) {
        self.session = Uuid::new_v4();
        self.generation = 0;
        self.load = AccountLoad::Loading;
        self.transition(GateState::Normal, FeatureKey::Dashboard);
    }

    fn transition(&mut self, state: GateState, active_view: FeatureKey) {
        if self.state == state && self.active_view == active_view {
            return;
        }
        let previous = self.state;
        self.state = state;
        self.active_view = active_view;
        log::debug!(
            "Gate {:?} -> {:?} (view {})",
            previous,
            self.state,
            self.active_view
        );
        self.listeners.notify(&GateEvent {
            previous,
            current: state,
            active_view,
        });
    }
}
