use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

use crate::errors;

/// Credentials record owned by the auth service. Keyed by the profile ULID;
/// there is no foreign key because the profile table lives in another store.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_credentials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_ulid: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub is_admin: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_email(email: &str) -> Result<(), errors::ModelError> {
    if !email.contains('@') || email.trim().len() < 3 {
        return Err(errors::ModelError::Validation("invalid email".into()));
    }
    Ok(())
}

pub async fn create(
    db: &DatabaseConnection,
    user_ulid: &str,
    email: &str,
    password_hash: String,
    salt: String,
) -> Result<Model, errors::ModelError> {
    validate_email(email)?;
    if password_hash.trim().is_empty() {
        return Err(errors::ModelError::Validation("password hash required".into()));
    }
    let now = Utc::now();
    let am = ActiveModel {
        user_ulid: Set(user_ulid.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        salt: Set(salt),
        is_admin: Set(false),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::from_db(e.to_string()))
}

pub async fn find_by_user_ulid(
    db: &DatabaseConnection,
    user_ulid: &str,
) -> Result<Option<Model>, errors::ModelError> {
    Entity::find_by_id(user_ulid.to_string())
        .one(db)
        .await
        .map_err(|e| errors::ModelError::from_db(e.to_string()))
}

pub async fn find_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::Email.eq(email.to_string()))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::from_db(e.to_string()))
}

pub async fn update_password(
    db: &DatabaseConnection,
    model: Model,
    password_hash: String,
    salt: String,
) -> Result<Model, errors::ModelError> {
    if password_hash.trim().is_empty() {
        return Err(errors::ModelError::Validation("password hash required".into()));
    }
    let mut am: ActiveModel = model.into();
    am.password_hash = Set(password_hash);
    am.salt = Set(salt);
    am.updated_at = Set(Utc::now().into());
    am.update(db).await.map_err(|e| errors::ModelError::from_db(e.to_string()))
}

pub async fn delete_by_user_ulid(
    db: &DatabaseConnection,
    user_ulid: &str,
) -> Result<bool, errors::ModelError> {
    let res = Entity::delete_by_id(user_ulid.to_string())
        .exec(db)
        .await
        .map_err(|e| errors::ModelError::from_db(e.to_string()))?;
    Ok(res.rows_affected > 0)
}
