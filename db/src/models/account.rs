use chrono::{DateTime, Utc};
use gate::{Account, AccountStatus, UserType};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct AccountRow {
    pub id: Uuid,
    pub created_at: Option<DateTime<Utc>>,
    pub status: String,
    pub user_type: String,
    pub stripe_customer_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        let user_type = row.user_type.parse::<UserType>().unwrap_or_else(|e| {
            log::warn!("{} on account {}, assuming business", e, row.id);
            UserType::Business
        });

        Account {
            id: row.id,
            created_at: row.created_at,
            status: AccountStatus::from_stored(&row.status),
            user_type,
        }
    }
}
