//! `SeaORM` Entity for wallet_balance table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "wallet_balance")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub wallet_id: i64,
    /// Minor units (amount x 1000).
    pub amount: i64,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
