use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Throttling counts recent failures per address
        manager
            .create_index(
                Index::create()
                    .name("idx_login_attempts_ip_timestamp")
                    .table(LoginAttempts::Table)
                    .col(LoginAttempts::IpAddress)
                    .col(LoginAttempts::Timestamp)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_access_keys_user_id")
                    .table(AccessKeys::Table)
                    .col(AccessKeys::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_access_keys_created_at")
                    .table(AccessKeys::Table)
                    .col(AccessKeys::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_access_keys_created_at")
                    .table(AccessKeys::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_access_keys_user_id")
                    .table(AccessKeys::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_login_attempts_ip_timestamp")
                    .table(LoginAttempts::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum LoginAttempts {
    Table,
    IpAddress,
    Timestamp,
}

#[derive(Iden)]
enum AccessKeys {
    Table,
    UserId,
    CreatedAt,
}
