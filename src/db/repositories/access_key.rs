use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::db::StoreError;
use crate::entities::{access_keys, prelude::*};
use crate::models::{AccessKey, AccessKeyChanges, NewAccessKey};

pub struct AccessKeyRepository {
    conn: DatabaseConnection,
}

impl AccessKeyRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<AccessKey>, StoreError> {
        let key = AccessKeys::find_by_id(id).one(&self.conn).await?;
        Ok(key.map(AccessKey::from))
    }

    pub async fn get_by_value(&self, key_value: &str) -> Result<Option<AccessKey>, StoreError> {
        let key = AccessKeys::find()
            .filter(access_keys::Column::KeyValue.eq(key_value))
            .one(&self.conn)
            .await?;

        Ok(key.map(AccessKey::from))
    }

    pub async fn create(&self, new: NewAccessKey) -> Result<AccessKey, StoreError> {
        let active = access_keys::ActiveModel {
            id: Set(Uuid::new_v4()),
            key_value: Set(new.key_value),
            user_id: Set(None),
            is_active: Set(true),
            expires_at: Set(new.expires_at),
            created_at: Set(Utc::now()),
            used_at: Set(None),
            prefix: Set(new.prefix),
            notes: Set(new.notes),
        };

        let model = active.insert(&self.conn).await?;
        Ok(AccessKey::from(model))
    }

    pub async fn update(&self, id: Uuid, changes: AccessKeyChanges) -> Result<(), StoreError> {
        let model = AccessKeys::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("access key {id}")))?;

        let mut active: access_keys::ActiveModel = model.into();

        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(notes) = changes.notes {
            active.notes = Set(notes);
        }

        active.update(&self.conn).await?;
        Ok(())
    }

    /// Stamps `used_at`. With `only_if_unused` the update is conditional on
    /// `used_at IS NULL`, so at most one caller wins.
    pub async fn mark_used(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        only_if_unused: bool,
    ) -> Result<bool, StoreError> {
        let mut update = AccessKeys::update_many()
            .col_expr(access_keys::Column::UsedAt, Expr::value(at))
            .filter(access_keys::Column::Id.eq(id));

        if only_if_unused {
            update = update.filter(access_keys::Column::UsedAt.is_null());
        }

        let result = update.exec(&self.conn).await?;
        Ok(result.rows_affected == 1)
    }

    /// Sets the owner of a key that has none yet.
    pub async fn assign(&self, id: Uuid, account_id: Uuid) -> Result<bool, StoreError> {
        let result = AccessKeys::update_many()
            .col_expr(access_keys::Column::UserId, Expr::value(account_id))
            .filter(access_keys::Column::Id.eq(id))
            .filter(access_keys::Column::UserId.is_null())
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = AccessKeys::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn list_for_account(&self, account_id: Uuid) -> Result<Vec<AccessKey>, StoreError> {
        let rows = AccessKeys::find()
            .filter(access_keys::Column::UserId.eq(account_id))
            .order_by_desc(access_keys::Column::CreatedAt)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(AccessKey::from).collect())
    }

    pub async fn recent(&self, limit: u64) -> Result<Vec<AccessKey>, StoreError> {
        let rows = AccessKeys::find()
            .order_by_desc(access_keys::Column::CreatedAt)
            .limit(limit)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(AccessKey::from).collect())
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        Ok(AccessKeys::find().count(&self.conn).await?)
    }
}
