use chrono::Utc;
use sea_orm::{entity::prelude::*, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::errors;

/// Profile record owned by the users service. The ULID minted here is the
/// canonical key for the whole logical identity.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub ulid: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create(db: &DatabaseConnection) -> Result<Model, errors::ModelError> {
    let now = Utc::now();
    let am = ActiveModel {
        ulid: Set(Ulid::new().to_string()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::from_db(e.to_string()))
}

pub async fn find_by_ulid(
    db: &DatabaseConnection,
    ulid: &str,
) -> Result<Option<Model>, errors::ModelError> {
    Entity::find_by_id(ulid.to_string())
        .one(db)
        .await
        .map_err(|e| errors::ModelError::from_db(e.to_string()))
}

/// Delete by ULID. Deleting a missing record is not an error; the saga's
/// compensation path may run more than once.
pub async fn delete_by_ulid(db: &DatabaseConnection, ulid: &str) -> Result<bool, errors::ModelError> {
    let res = Entity::delete_by_id(ulid.to_string())
        .exec(db)
        .await
        .map_err(|e| errors::ModelError::from_db(e.to_string()))?;
    Ok(res.rows_affected > 0)
}
