use std::{fmt::Display, time::Duration as StdDuration};

use actix_web::{rt, web};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use gate::{Account, AccountLoad, FetchTicket, GateController, TrialWindow, UserType};
use uuid::Uuid;

/// Sessions untouched for this long are dropped by [`GateRegistry::evict_idle`].
pub const DEFAULT_IDLE_MINUTES: i64 = 120;

struct Session {
    gate: GateController,
    last_seen: DateTime<Utc>,
}

/// One gate controller per signed-in user.
///
/// Entries are only locked for the duration of a closure, never across an
/// await; account fetches are matched back to their session by ticket.
/// Users who leave without logging out are swept once idle.
pub struct GateRegistry {
    sessions: DashMap<Uuid, Session>,
    window: TrialWindow,
    idle_timeout: Duration,
}

impl GateRegistry {
    pub fn new(window: TrialWindow) -> Self {
        Self::with_idle_timeout(window, Duration::minutes(DEFAULT_IDLE_MINUTES))
    }

    pub fn with_idle_timeout(window: TrialWindow, idle_timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            window,
            idle_timeout,
        }
    }

    pub fn window(&self) -> TrialWindow {
        self.window
    }

    /// Runs `f` on the user's controller, creating the session if needed.
    pub fn with_session<R>(
        &self,
        user_id: Uuid,
        user_type: UserType,
        f: impl FnOnce(&mut GateController) -> R,
    ) -> R {
        let now = Utc::now();
        let mut entry = self.sessions.entry(user_id).or_insert_with(|| Session {
            gate: GateController::new(user_type, self.window),
            last_seen: now,
        });
        entry.last_seen = now;
        f(&mut entry.gate)
    }

    /// Starts an account fetch unless the account is already loaded.
    pub fn begin_fetch_if_needed(&self, user_id: Uuid, user_type: UserType) -> Option<FetchTicket> {
        self.with_session(user_id, user_type, |gate| {
            if matches!(gate.load(), AccountLoad::Loaded(_)) {
                None
            } else {
                Some(gate.begin_fetch())
            }
        })
    }

    /// Starts a fetch on an existing session only.
    pub fn begin_refetch(&self, user_id: Uuid) -> Option<FetchTicket> {
        self.sessions
            .get_mut(&user_id)
            .map(|mut session| session.gate.begin_fetch())
    }

    /// Applies a fetch result. False when the session is gone or the ticket
    /// is stale.
    pub fn apply_fetch<E: Display>(
        &self,
        user_id: Uuid,
        ticket: FetchTicket,
        result: Result<Account, E>,
        now: DateTime<Utc>,
    ) -> bool {
        match self.sessions.get_mut(&user_id) {
            Some(mut session) => session.gate.apply_fetch(ticket, result, now),
            None => {
                log::info!("Session for {} ended before its account arrived", user_id);
                false
            }
        }
    }

    /// Drops the user's session. Returns false if there was none.
    pub fn end_session(&self, user_id: Uuid) -> bool {
        match self.sessions.remove(&user_id) {
            Some((_, mut session)) => {
                session.gate.end_session();
                true
            }
            None => false,
        }
    }

    /// Drops every session not touched since `now - idle_timeout`.
    /// Returns how many were removed.
    pub fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.idle_timeout;
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.last_seen > cutoff);
        before.saturating_sub(self.sessions.len())
    }

    pub fn contains(&self, user_id: Uuid) -> bool {
        self.sessions.contains_key(&user_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Periodically evicts idle sessions for the life of the server.
pub fn spawn_idle_sweep(registry: web::Data<GateRegistry>, every: StdDuration) {
    rt::spawn(async move {
        let mut ticker = rt::time::interval(every);
        loop {
            ticker.tick().await;
            let evicted = registry.evict_idle(Utc::now());
            if evicted > 0 {
                log::info!("Evicted {} idle gate sessions, {} left", evicted, registry.len());
            }
        }
    });
}
