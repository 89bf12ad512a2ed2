use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{PartitionStrategy, RatingRow, RatingsResult};

/// What happened to the partition side of a single-row insert. The base-table
/// write has committed in every variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InsertOutcome {
    Inserted { partition: u32 },
    /// No partition tables exist for the strategy yet.
    Unpartitioned,
    /// The rating matched no range interval; only the base table was written.
    SkippedOutOfRange,
}

impl InsertOutcome {
    pub fn partition(self) -> Option<u32> {
        match self {
            InsertOutcome::Inserted { partition } => Some(partition),
            InsertOutcome::Unpartitioned | InsertOutcome::SkippedOutOfRange => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionReport {
    pub strategy: PartitionStrategy,
    pub partition_count: u32,
    pub rows_per_partition: Vec<u64>,
}

impl PartitionReport {
    pub fn total_rows(&self) -> u64 {
        self.rows_per_partition.iter().sum()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub loaded: u64,
    pub skipped: u64,
}

#[async_trait]
pub trait PartitionApi {
    /// Rebuilds `count` range partitions from the base table in one transaction.
    async fn range_partition(&self, count: u32) -> RatingsResult<PartitionReport>;

    /// Rebuilds `count` round-robin partitions from the base table in one transaction.
    async fn round_robin_partition(&self, count: u32) -> RatingsResult<PartitionReport>;
}

#[async_trait]
pub trait InsertApi {
    async fn range_insert(&self, row: RatingRow) -> RatingsResult<InsertOutcome>;

    async fn round_robin_insert(&self, row: RatingRow) -> RatingsResult<InsertOutcome>;
}

#[async_trait]
pub trait PartitionMetadataApi {
    async fn partition_count(&self, strategy: PartitionStrategy) -> RatingsResult<u32>;

    async fn partition_sizes(&self, strategy: PartitionStrategy) -> RatingsResult<Vec<u64>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_exposes_partition() {
        assert_eq!(InsertOutcome::Inserted { partition: 2 }.partition(), Some(2));
        assert_eq!(InsertOutcome::Unpartitioned.partition(), None);
        assert_eq!(InsertOutcome::SkippedOutOfRange.partition(), None);
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let value = serde_json::to_value(InsertOutcome::Inserted { partition: 1 }).expect("encode");
        assert_eq!(
            value,
            serde_json::json!({ "outcome": "inserted", "partition": 1 })
        );
        let value = serde_json::to_value(InsertOutcome::SkippedOutOfRange).expect("encode");
        assert_eq!(value, serde_json::json!({ "outcome": "skipped_out_of_range" }));
    }

    #[test]
    fn report_totals_rows() {
        let report = PartitionReport {
            strategy: PartitionStrategy::RoundRobin,
            partition_count: 2,
            rows_per_partition: vec![3, 2],
        };
        assert_eq!(report.total_rows(), 5);
    }
}
