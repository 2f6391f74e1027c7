use async_trait::async_trait;

use super::DatabaseError;
use super::models::{NewScan, ScanRecord};

#[async_trait]
pub trait ScanStore: Send + Sync {
    async fn insert_scan(&self, scan: &NewScan) -> Result<ScanRecord, DatabaseError>;
    async fn latest_scan_for_contact(
        &self,
        contact: &str,
    ) -> Result<Option<ScanRecord>, DatabaseError>;
    async fn count_scans(&self) -> Result<i64, DatabaseError>;
}
