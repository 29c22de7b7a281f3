use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id PHC string
    pub password_hash: String,

    /// Hardware fingerprint bound on first desktop authentication
    pub hwid: Option<String>,

    /// Address of the last web session start
    pub ip_address: Option<String>,

    pub is_admin: bool,

    pub is_blocked: bool,

    pub created_at: DateTimeUtc,

    pub last_login: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::access_keys::Entity")]
    AccessKeys,
}

impl Related<super::access_keys::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccessKeys.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
