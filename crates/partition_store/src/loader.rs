use std::path::Path;

use crate::RatingsStore;
use crate::store::{finish, insert_rows};
use ratings_partition_core::{LoadReport, RatingsError, RatingsResult, parse_rating_line};

impl RatingsStore {
    /// Loads a `user::item::rating` file into the base table in one transaction.
    ///
    /// Short lines are skipped silently; lines whose fields fail to parse are
    /// skipped with a warning. Partition tables are not touched.
    pub async fn load_ratings(&self, path: &Path) -> RatingsResult<LoadReport> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| RatingsError::io(format!("read {}: {err}", path.display())))?;
        let mut report = LoadReport::default();
        let mut rows = Vec::new();
        for (line_no, line) in raw.lines().enumerate() {
            match parse_rating_line(line) {
                Ok(Some(row)) => rows.push(row),
                Ok(None) => report.skipped += 1,
                Err(err) => {
                    log::warn!("{}:{}: skipping line: {err}", path.display(), line_no + 1);
                    report.skipped += 1;
                }
            }
        }
        self.ensure_base_table().await?;
        let tx = self.begin().await?;
        let result = insert_rows(&tx, &self.partitioning().base_table, &rows).await;
        finish(tx, result, "load ratings").await?;
        report.loaded = rows.len() as u64;
        log::info!(
            "loaded {} ratings from {} ({} lines skipped)",
            report.loaded,
            path.display(),
            report.skipped
        );
        Ok(report)
    }
}
