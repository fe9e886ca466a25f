use std::sync::Arc;

use common::error::{AppError, Res};
use futures::future::BoxFuture;
use gate::Account;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::models::account::AccountRow;

/// Where dashboard accounts are read from.
pub trait AccountStore: Send + Sync {
    fn fetch_account(&self, user_id: Uuid) -> BoxFuture<'_, Res<Option<Account>>>;

    /// Marks the account as paid. Returns false if no such account exists.
    fn activate(
        &self,
        user_id: Uuid,
        stripe_customer_id: Option<String>,
    ) -> BoxFuture<'_, Res<bool>>;
}

pub async fn get_account_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Option<AccountRow>> {
    sqlx::query_as::<_, AccountRow>(
        r#"
        SELECT id, created_at, status, user_type, stripe_customer_id, updated_at
        FROM accounts
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub async fn set_account_active<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    stripe_customer_id: Option<String>,
) -> Res<bool> {
    sqlx::query(
        r#"
        UPDATE accounts
        SET status = 'active',
            stripe_customer_id = COALESCE($2, stripe_customer_id),
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(stripe_customer_id)
    .execute(executor)
    .await
    .map(|result| result.rows_affected() > 0)
    .map_err(AppError::from)
}

/// Postgres-backed account store.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: Arc<PgPool>,
}

impl PgAccountStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

impl AccountStore for PgAccountStore {
    fn fetch_account(&self, user_id: Uuid) -> BoxFuture<'_, Res<Option<Account>>> {
        Box::pin(async move {
            let row = get_account_by_id(&*self.pool, user_id).await?;
            Ok(row.map(Account::from))
        })
    }

    fn activate(
        &self,
        user_id: Uuid,
        stripe_customer_id: Option<String>,
    ) -> BoxFuture<'_, Res<bool>> {
        Box::pin(async move { set_account_active(&*self.pool, user_id, stripe_customer_id).await })
    }
}
