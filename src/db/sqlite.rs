use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::schema_sqlite::scans;

use super::{
    DatabaseError,
    models::{NewScan, ScanRecord, format_timestamp},
};

fn string_to_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Query(format!("invalid datetime format: {}", e)))
}

// SQLite hands primary keys back as i32; the public model keeps i64.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = scans)]
struct DbScan {
    id: i32,
    full_name: String,
    age: i64,
    gender: String,
    contact: Option<String>,
    scanned_at: String,
    result_json: String,
    primary_class: Option<String>,
}

impl DbScan {
    fn to_scan_record(&self) -> Result<ScanRecord, DatabaseError> {
        Ok(ScanRecord {
            id: self.id as i64,
            full_name: self.full_name.clone(),
            age: self.age,
            gender: self.gender.clone(),
            contact: self.contact.clone(),
            scanned_at: string_to_datetime(&self.scanned_at)?,
            result_json: self.result_json.clone(),
            primary_class: self.primary_class.clone(),
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = scans)]
struct NewDbScan<'a> {
    full_name: &'a str,
    age: i64,
    gender: &'a str,
    contact: Option<&'a str>,
    scanned_at: String,
    result_json: &'a str,
    primary_class: Option<&'a str>,
}

pub(crate) fn establish_connection(path: &str) -> Result<SqliteConnection, DatabaseError> {
    SqliteConnection::establish(path).map_err(|e| DatabaseError::Connection(e.to_string()))
}

pub struct SqliteScanStore {
    db_path: Arc<String>,
}

impl SqliteScanStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::ScanStore for SqliteScanStore {
    async fn insert_scan(&self, scan: &NewScan) -> Result<ScanRecord, DatabaseError> {
        let scan = scan.clone();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            let new_scan = NewDbScan {
                full_name: &scan.full_name,
                age: scan.age,
                gender: &scan.gender,
                contact: scan.contact.as_deref(),
                scanned_at: format_timestamp(&scan.scanned_at),
                result_json: &scan.result_json,
                primary_class: scan.primary_class.as_deref(),
            };

            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                diesel::insert_into(scans::table)
                    .values(&new_scan)
                    .execute(conn)?;

                scans::table
                    .order(scans::id.desc())
                    .select(DbScan::as_select())
                    .first::<DbScan>(conn)
            })
            .map_err(|e| DatabaseError::Query(e.to_string()))?
            .to_scan_record()
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn latest_scan_for_contact(
        &self,
        contact_value: &str,
    ) -> Result<Option<ScanRecord>, DatabaseError> {
        let contact_value = contact_value.to_string();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            use crate::db::schema_sqlite::scans::dsl::*;
            scans
                .filter(contact.eq(contact_value))
                .order((scanned_at.desc(), id.desc()))
                .select(DbScan::as_select())
                .first::<DbScan>(&mut conn)
                .optional()
                .map_err(|e| DatabaseError::Query(e.to_string()))?
                .map(|s| s.to_scan_record())
                .transpose()
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn count_scans(&self) -> Result<i64, DatabaseError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            use crate::db::schema_sqlite::scans::dsl::*;
            scans
                .count()
                .get_result(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}
