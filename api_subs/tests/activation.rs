use std::{collections::HashMap, sync::Mutex};

use api_gate::{GateRegistry, services::gate::load_session};
use api_subs::services::pay::{Activation, activate_account};
use chrono::{Duration, Utc};
use common::{
    error::{AppError, Res},
    jwt::{JwtClaims, UserMetadata},
};
use db::AccountStore;
use futures::future::BoxFuture;
use gate::{Account, AccountStatus, GateState, TrialWindow, UserType};
use uuid::Uuid;

#[derive(Default)]
struct MemoryStore {
    accounts: Mutex<HashMap<Uuid, Account>>,
    customers: Mutex<HashMap<Uuid, String>>,
}

impl AccountStore for MemoryStore {
    fn fetch_account(&self, user_id: Uuid) -> BoxFuture<'_, Res<Option<Account>>> {
        let account = self.accounts.lock().unwrap().get(&user_id).cloned();
        Box::pin(async move { Ok(account) })
    }

    fn activate(
        &self,
        user_id: Uuid,
        stripe_customer_id: Option<String>,
    ) -> BoxFuture<'_, Res<bool>> {
        let updated = match self.accounts.lock().unwrap().get_mut(&user_id) {
            Some(account) => {
                account.status = AccountStatus::Active;
                if let Some(customer) = stripe_customer_id {
                    self.customers.lock().unwrap().insert(user_id, customer);
                }
                true
            }
            None => false,
        };
        Box::pin(async move { Ok(updated) })
    }
}

fn expired_trial() -> Account {
    Account {
        id: Uuid::new_v4(),
        created_at: Some(Utc::now() - Duration::days(30)),
        status: AccountStatus::Trial,
        user_type: UserType::Business,
    }
}

fn claims(user_id: Uuid) -> JwtClaims {
    JwtClaims {
        sub: user_id,
        aud: "authenticated".to_string(),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        email: None,
        user_metadata: UserMetadata::default(),
    }
}

#[actix_web::test]
async fn payment_clears_expired_overlay_in_live_session() {
    let acc = expired_trial();
    let user = acc.id;
    let store = MemoryStore::default();
    store.accounts.lock().unwrap().insert(user, acc);
    let registry = GateRegistry::new(TrialWindow::default());

    let before = load_session(&registry, &store, &claims(user)).await;
    assert_eq!(before.state, GateState::ExpiredOverlay);

    let activation = Activation {
        user_id: user,
        stripe_customer_id: Some("cus_123".to_string()),
    };
    activate_account(&store, &registry, activation).await.unwrap();

    let after = registry.with_session(user, UserType::Business, |gate| gate.snapshot(Utc::now()));
    assert_eq!(after.state, GateState::Normal);
    assert!(after.entitlement.is_active);
    assert!(!after.entitlement.is_expired);
    assert!(after.locked_features.is_empty());
    assert_eq!(
        store.customers.lock().unwrap().get(&user).map(String::as_str),
        Some("cus_123")
    );
}

#[actix_web::test]
async fn payment_without_live_session_only_updates_store() {
    let acc = expired_trial();
    let user = acc.id;
    let store = MemoryStore::default();
    store.accounts.lock().unwrap().insert(user, acc);
    let registry = GateRegistry::new(TrialWindow::default());

    let activation = Activation {
        user_id: user,
        stripe_customer_id: None,
    };
    activate_account(&store, &registry, activation).await.unwrap();

    assert!(registry.is_empty());
    let stored = store.accounts.lock().unwrap().get(&user).cloned().unwrap();
    assert!(stored.is_active());
}

#[actix_web::test]
async fn payment_for_unknown_account_is_not_found() {
    let store = MemoryStore::default();
    let registry = GateRegistry::new(TrialWindow::default());

    let activation = Activation {
        user_id: Uuid::new_v4(),
        stripe_customer_id: None,
    };
    let result = activate_account(&store, &registry, activation).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
