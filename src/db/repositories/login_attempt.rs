use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};

use crate::db::StoreError;
use crate::entities::{login_attempts, prelude::*};

/// Append-only audit log of authentication attempts.
pub struct LoginAttemptRepository {
    conn: DatabaseConnection,
}

impl LoginAttemptRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn record(
        &self,
        username: &str,
        ip_address: &str,
        success: bool,
    ) -> Result<(), StoreError> {
        let active = login_attempts::ActiveModel {
            username: Set(username.to_string()),
            ip_address: Set(ip_address.to_string()),
            success: Set(success),
            timestamp: Set(Utc::now()),
            ..Default::default()
        };

        LoginAttempts::insert(active).exec(&self.conn).await?;
        Ok(())
    }

    pub async fn count_failures_since(
        &self,
        ip_address: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let count = LoginAttempts::find()
            .filter(login_attempts::Column::IpAddress.eq(ip_address))
            .filter(login_attempts::Column::Success.eq(false))
            .filter(login_attempts::Column::Timestamp.gte(since))
            .count(&self.conn)
            .await?;

        Ok(count)
    }
}
