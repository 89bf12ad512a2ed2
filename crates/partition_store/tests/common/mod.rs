#![allow(dead_code)]

use std::path::Path;

use ratings_partition_store::{RatingRow, RatingsResult, RatingsStore, StoreConfig};

pub async fn sqlite_store(base: &Path) -> RatingsResult<RatingsStore> {
    let config = StoreConfig::default_sqlite(base.join("ratings.sqlite").to_string_lossy());
    RatingsStore::connect(&config, base).await
}

pub async fn seed(store: &RatingsStore, rows: &[RatingRow]) -> RatingsResult<()> {
    for row in rows {
        store.insert_base_row(*row).await?;
    }
    Ok(())
}

pub fn row(user_id: i32, item_id: i32, rating: f64) -> RatingRow {
    RatingRow::new(user_id, item_id, rating)
}

/// Rows ordered the way the store scans them, for multiset comparisons.
pub fn sorted(mut rows: Vec<RatingRow>) -> Vec<RatingRow> {
    rows.sort_by(|a, b| {
        (a.user_id, a.item_id)
            .cmp(&(b.user_id, b.item_id))
            .then(a.rating.total_cmp(&b.rating))
    });
    rows
}

pub fn sample_rows() -> Vec<RatingRow> {
    let mut rows = Vec::new();
    for user in 1..=12 {
        for item in 0..5 {
            let rating = f64::from((user * 7 + item * 3) % 11) / 2.0;
            rows.push(row(user, 100 + item, rating));
        }
    }
    rows
}
