//! Which optional seller columns the connected database actually has.
//!
//! Older deployments created `sellers` without bank columns. The descriptor is read
//! once at startup and replaced wholesale by an explicit refresh; request handlers
//! only ever read it.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DbBackend, Statement};
use serde::Serialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::error::AppResult;

pub const SELLERS_TABLE: &str = "sellers";
pub const BANK_COLUMNS: [&str; 3] = ["bank_holder", "bank_account", "bank_ifsc"];

pub type SharedSchema = Arc<RwLock<SchemaDescriptor>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDescriptor {
    #[schema(value_type = Vec<String>)]
    pub seller_columns: BTreeSet<String>,
    pub loaded_at: DateTime<Utc>,
}

fn seller_columns_sql(backend: DbBackend) -> String {
    match backend {
        DbBackend::Postgres => format!(
            "SELECT column_name::text AS name FROM information_schema.columns \
             WHERE table_schema = current_schema() AND table_name = '{SELLERS_TABLE}'"
        ),
        DbBackend::MySql => format!(
            "SELECT column_name AS name FROM information_schema.columns \
             WHERE table_schema = DATABASE() AND table_name = '{SELLERS_TABLE}'"
        ),
        DbBackend::Sqlite => format!("SELECT name FROM pragma_table_info('{SELLERS_TABLE}')"),
    }
}

impl SchemaDescriptor {
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            seller_columns: columns.into_iter().map(Into::into).collect(),
            loaded_at: Utc::now(),
        }
    }

    pub async fn load<C: ConnectionTrait>(db: &C) -> AppResult<Self> {
        let backend = db.get_database_backend();
        let rows = db
            .query_all(Statement::from_string(backend, seller_columns_sql(backend)))
            .await?;

        let mut columns = BTreeSet::new();
        for row in rows {
            columns.insert(row.try_get::<String>("", "name")?);
        }
        log::info!("Loaded schema descriptor: sellers has {} columns", columns.len());

        Ok(Self {
            seller_columns: columns,
            loaded_at: Utc::now(),
        })
    }

    pub fn has_seller_column(&self, column: &str) -> bool {
        self.seller_columns.contains(column)
    }

    /// All three bank columns exist, so KYC can be read from `sellers`.
    pub fn has_bank_details(&self) -> bool {
        BANK_COLUMNS.iter().all(|c| self.has_seller_column(c))
    }

    pub fn into_shared(self) -> SharedSchema {
        Arc::new(RwLock::new(self))
    }
}
