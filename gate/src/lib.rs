//! Trial entitlement gating for the dashboard.
//!
//! `trial` turns a signup time into trial progress, `policy` decides which
//! features a trial may open, and `controller` combines both into the
//! per-session navigation state machine.

pub mod account;
pub mod controller;
pub mod observer;
pub mod policy;
pub mod trial;

pub use account::{Account, AccountStatus, UserType};
pub use controller::{
    AccountLoad, Entitlement, FetchTicket, GateController, GateSnapshot, GateState, LoadStatus,
    NavigationOutcome,
};
pub use observer::{GateEvent, ListenerId};
pub use policy::{FeatureKey, is_locked};
pub use trial::{TrialState, TrialWindow};
