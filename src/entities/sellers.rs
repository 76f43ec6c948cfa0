use sea_orm::entity::prelude::*;

pub const STATUS_APPROVED: &str = "APPROVED";

/// Read-only view of the seller registry.
///
/// Only the columns every deployment has are mapped here; bank details are read
/// through [`crate::database::SchemaDescriptor`] because older schemas lack them.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "sellers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub store_name: String,
    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_approved(&self) -> bool {
        self.status.eq_ignore_ascii_case(STATUS_APPROVED)
    }
}
