use crate::config::DatabaseConfig;
use crate::db::{DatabaseError, ScanStore};
use std::sync::Arc;

#[cfg(feature = "sqlite")]
use crate::db::sqlite::{SqliteScanStore, establish_connection};
#[cfg(feature = "sqlite")]
use diesel::RunQueryDsl;

#[derive(Clone)]
pub struct DatabaseManager {
    sqlite_path: String,
    scan_store: Arc<dyn ScanStore>,
}

impl DatabaseManager {
    #[cfg(feature = "sqlite")]
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let path = config.sqlite_path();
        if path.is_empty() {
            return Err(DatabaseError::Connection(
                "sqlite path cannot be empty".to_string(),
            ));
        }

        let scan_store = Arc::new(SqliteScanStore::new(Arc::new(path.clone())));

        Ok(Self {
            sqlite_path: path,
            scan_store,
        })
    }

    #[cfg(not(feature = "sqlite"))]
    pub async fn new(_config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        Err(DatabaseError::Connection(
            "SQLite feature not enabled".to_string(),
        ))
    }

    #[cfg(feature = "sqlite")]
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        let path = self.sqlite_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&path)?;

            let statements = [
                r#"
                CREATE TABLE IF NOT EXISTS scans (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    full_name TEXT NOT NULL,
                    age INTEGER NOT NULL,
                    gender TEXT NOT NULL,
                    contact TEXT,
                    scanned_at TEXT NOT NULL,
                    result_json TEXT NOT NULL,
                    primary_class TEXT
                )
                "#,
                "CREATE INDEX IF NOT EXISTS idx_scans_contact_scanned_at ON scans(contact, scanned_at)",
            ];

            for statement in statements {
                diesel::sql_query(statement)
                    .execute(&mut conn)
                    .map_err(|e| DatabaseError::Migration(e.to_string()))?;
            }

            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration task failed: {e}")))?
    }

    #[cfg(not(feature = "sqlite"))]
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        Err(DatabaseError::Migration(
            "SQLite feature not enabled".to_string(),
        ))
    }

    pub fn scan_store(&self) -> Arc<dyn ScanStore> {
        self.scan_store.clone()
    }

    pub fn sqlite_path(&self) -> &str {
        &self.sqlite_path
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use tempfile::NamedTempFile;

    use super::DatabaseManager;
    use crate::config::DatabaseConfig;
    use crate::db::NewScan;

    fn config_for(file: &NamedTempFile) -> DatabaseConfig {
        DatabaseConfig {
            url: None,
            filename: Some(file.path().to_string_lossy().to_string()),
        }
    }

    fn new_scan(contact: Option<&str>, result: &str, minutes_ago: i64) -> NewScan {
        NewScan {
            full_name: "Jane Doe".to_string(),
            age: 42,
            gender: "female".to_string(),
            contact: contact.map(ToOwned::to_owned),
            scanned_at: Utc::now() - Duration::minutes(minutes_ago),
            result_json: result.to_string(),
            primary_class: Some("benign".to_string()),
        }
    }

    #[tokio::test]
    async fn sqlite_scan_history_roundtrip() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let config = config_for(&file);

        let manager = DatabaseManager::new(&config).await.expect("db manager");
        manager.migrate().await.expect("migrate");
        let store = manager.scan_store();

        let first = store
            .insert_scan(&new_scan(Some("jane@example.org"), r#"{"n":1}"#, 10))
            .await
            .expect("insert first");
        let second = store
            .insert_scan(&new_scan(Some("jane@example.org"), r#"{"n":2}"#, 1))
            .await
            .expect("insert second");
        store
            .insert_scan(&new_scan(Some("other@example.org"), r#"{"n":3}"#, 0))
            .await
            .expect("insert other");

        assert!(second.id > first.id);

        let latest = store
            .latest_scan_for_contact("jane@example.org")
            .await
            .expect("query latest")
            .expect("latest exists");
        assert_eq!(latest.result_json, r#"{"n":2}"#);
        assert_eq!(latest.primary_class.as_deref(), Some("benign"));

        assert_eq!(store.count_scans().await.expect("count"), 3);

        let reopened = DatabaseManager::new(&config).await.expect("reopen");
        reopened.migrate().await.expect("migrate is idempotent");
        assert_eq!(reopened.scan_store().count_scans().await.expect("count"), 3);
    }

    #[tokio::test]
    async fn latest_scan_ignores_rows_without_contact() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let manager = DatabaseManager::new(&config_for(&file))
            .await
            .expect("db manager");
        manager.migrate().await.expect("migrate");
        let store = manager.scan_store();

        let stored = store
            .insert_scan(&new_scan(None, "[]", 0))
            .await
            .expect("insert");
        assert!(stored.contact.is_none());

        let latest = store
            .latest_scan_for_contact("")
            .await
            .expect("query latest");
        assert!(latest.is_none());
    }

    #[tokio::test]
    async fn same_timestamp_orders_by_id() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let manager = DatabaseManager::new(&config_for(&file))
            .await
            .expect("db manager");
        manager.migrate().await.expect("migrate");
        let store = manager.scan_store();

        let mut scan = new_scan(Some("555-0100"), "\"a\"", 0);
        store.insert_scan(&scan).await.expect("insert a");
        scan.result_json = "\"b\"".to_string();
        store.insert_scan(&scan).await.expect("insert b");

        let latest = store
            .latest_scan_for_contact("555-0100")
            .await
            .expect("query")
            .expect("exists");
        assert_eq!(latest.result_json, "\"b\"");
    }
}
