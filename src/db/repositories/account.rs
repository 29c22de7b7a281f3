use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::db::StoreError;
use crate::entities::{accounts, prelude::*};
use crate::models::{Account, AccountChanges, NewAccount};

pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let account = Accounts::find_by_id(id).one(&self.conn).await?;
        Ok(account.map(Account::from))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let account = Accounts::find()
            .filter(accounts::Column::Username.eq(username))
            .one(&self.conn)
            .await?;

        Ok(account.map(Account::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let account = Accounts::find()
            .filter(accounts::Column::Email.eq(email))
            .one(&self.conn)
            .await?;

        Ok(account.map(Account::from))
    }

    pub async fn create(&self, new: NewAccount) -> Result<Account, StoreError> {
        let active = accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(new.username),
            email: Set(new.email),
            password_hash: Set(new.password_hash),
            hwid: Set(None),
            ip_address: Set(None),
            is_admin: Set(new.is_admin),
            is_blocked: Set(false),
            created_at: Set(Utc::now()),
            last_login: Set(None),
        };

        let model = active.insert(&self.conn).await?;
        Ok(Account::from(model))
    }

    pub async fn update(&self, id: Uuid, changes: AccountChanges) -> Result<Account, StoreError> {
        let model = Accounts::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("account {id}")))?;

        let mut active: accounts::ActiveModel = model.into();

        if let Some(username) = changes.username {
            active.username = Set(username);
        }
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(password_hash) = changes.password_hash {
            active.password_hash = Set(password_hash);
        }
        if let Some(hwid) = changes.hwid {
            active.hwid = Set(hwid);
        }
        if let Some(ip_address) = changes.ip_address {
            active.ip_address = Set(ip_address);
        }
        if let Some(is_blocked) = changes.is_blocked {
            active.is_blocked = Set(is_blocked);
        }
        if let Some(last_login) = changes.last_login {
            active.last_login = Set(Some(last_login));
        }

        let model = active.update(&self.conn).await?;
        Ok(Account::from(model))
    }

    /// Sets the hardware id only while none is bound.
    /// Returns `false` when another value was already in place.
    pub async fn bind_hwid(&self, id: Uuid, hwid: &str) -> Result<bool, StoreError> {
        let result = Accounts::update_many()
            .col_expr(accounts::Column::Hwid, Expr::value(hwid))
            .filter(accounts::Column::Id.eq(id))
            .filter(accounts::Column::Hwid.is_null())
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    pub async fn list(&self, limit: u64, offset: u64) -> Result<(Vec<Account>, u64), StoreError> {
        let rows = Accounts::find()
            .order_by_desc(accounts::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await?;

        let total = Accounts::find().count(&self.conn).await?;

        Ok((rows.into_iter().map(Account::from).collect(), total))
    }

    /// Returns `(total, blocked)` account counts.
    pub async fn counts(&self) -> Result<(u64, u64), StoreError> {
        let total = Accounts::find().count(&self.conn).await?;
        let blocked = Accounts::find()
            .filter(accounts::Column::IsBlocked.eq(true))
            .count(&self.conn)
            .await?;

        Ok((total, blocked))
    }

    pub async fn any_admin(&self) -> Result<bool, StoreError> {
        let count = Accounts::find()
            .filter(accounts::Column::IsAdmin.eq(true))
            .count(&self.conn)
            .await?;

        Ok(count > 0)
    }
}
