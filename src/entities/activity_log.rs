//! Activity log entity - Audit trail of field changes on tracked records.
//!
//! `properties` holds a JSON object with the changed `attributes` and, for
//! updates and deletes, their `old` values.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Activity log database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity_log")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Log channel, `"default"` unless a record says otherwise
    pub log_name: String,
    /// Event that produced the entry: `"created"`, `"updated"` or `"deleted"`
    pub description: String,
    /// Kind of record the entry is about (e.g. `"coupon"`)
    pub subject_type: String,
    /// Primary key of the record
    pub subject_id: i64,
    /// Changed attributes, see module docs
    pub properties: Json,
    /// When the change was recorded
    pub created_at: DateTimeUtc,
}

/// `ActivityLog` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
