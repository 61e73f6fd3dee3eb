//! Create `user_credentials` storing password hashes and per-record salts.
//! No foreign key to `user`: the profile table belongs to another service's
//! store; the email unique index backs the saga's uniqueness guard.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserCredentials::Table)
                    .if_not_exists()
                    .col(string_len(UserCredentials::UserUlid, 26).primary_key())
                    .col(string_len(UserCredentials::Email, 255).unique_key().not_null())
                    .col(string_len(UserCredentials::PasswordHash, 255).not_null())
                    .col(string_len(UserCredentials::Salt, 64).not_null())
                    .col(boolean(UserCredentials::IsAdmin).not_null().default(false))
                    .col(timestamp_with_time_zone(UserCredentials::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(UserCredentials::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserCredentials::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserCredentials {
    Table,
    UserUlid,
    Email,
    PasswordHash,
    Salt,
    IsAdmin,
    CreatedAt,
    UpdatedAt,
}
