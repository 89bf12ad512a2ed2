mod common;

use common::{row, sample_rows, seed, sorted, sqlite_store};
use ratings_partition_store::{
    MAX_PARTITIONS, PartitionApi, PartitionMetadataApi, PartitionStrategy, RatingsError,
    RatingsResult,
};
use tempfile::tempdir;

#[tokio::test]
async fn five_rows_into_two_partitions() -> RatingsResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    let rows = vec![
        row(1, 10, 1.0),
        row(2, 10, 2.0),
        row(3, 10, 3.0),
        row(4, 10, 4.0),
        row(5, 10, 5.0),
    ];
    // Seeded out of order; assignment follows the ordered scan, not insertion.
    seed(&store, &[rows[3], rows[0], rows[4], rows[2], rows[1]]).await?;

    let report = store.round_robin_partition(2).await?;
    assert_eq!(report.rows_per_partition, vec![3, 2]);
    let first = store
        .partition_rows(PartitionStrategy::RoundRobin, 0)
        .await?;
    assert_eq!(first, vec![rows[0], rows[2], rows[4]]);
    let second = store
        .partition_rows(PartitionStrategy::RoundRobin, 1)
        .await?;
    assert_eq!(second, vec![rows[1], rows[3]]);
    Ok(())
}

#[tokio::test]
async fn sizes_are_balanced_and_sum_to_base() -> RatingsResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    let rows = sample_rows();
    seed(&store, &rows).await?;

    for count in [1u32, 2, 3, 7, 11, 64] {
        let report = store.round_robin_partition(count).await?;
        let sizes = store.partition_sizes(PartitionStrategy::RoundRobin).await?;
        assert_eq!(sizes, report.rows_per_partition);
        assert_eq!(sizes.len(), count as usize);
        assert_eq!(sizes.iter().sum::<u64>(), rows.len() as u64);
        let max = sizes.iter().max().copied().unwrap_or_default();
        let min = sizes.iter().min().copied().unwrap_or_default();
        assert!(max - min <= 1, "unbalanced sizes {sizes:?}");

        let mut union = Vec::new();
        for index in 0..count {
            union.extend(
                store
                    .partition_rows(PartitionStrategy::RoundRobin, index)
                    .await?,
            );
        }
        assert_eq!(sorted(union), sorted(rows.clone()));
    }
    Ok(())
}

#[tokio::test]
async fn repartition_is_idempotent() -> RatingsResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    seed(&store, &sample_rows()).await?;

    store.round_robin_partition(3).await?;
    let mut first = Vec::new();
    for index in 0..3 {
        first.push(
            store
                .partition_rows(PartitionStrategy::RoundRobin, index)
                .await?,
        );
    }
    store.round_robin_partition(3).await?;
    for (index, expected) in first.iter().enumerate() {
        let again = store
            .partition_rows(PartitionStrategy::RoundRobin, index as u32)
            .await?;
        assert_eq!(&again, expected);
    }
    Ok(())
}

#[tokio::test]
async fn empty_base_table_creates_empty_partitions() -> RatingsResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    let report = store.round_robin_partition(4).await?;
    assert_eq!(report.rows_per_partition, vec![0, 0, 0, 0]);
    assert_eq!(
        store.partition_count(PartitionStrategy::RoundRobin).await?,
        4
    );
    Ok(())
}

#[tokio::test]
async fn strategies_do_not_see_each_others_tables() -> RatingsResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    seed(&store, &sample_rows()).await?;
    store.round_robin_partition(3).await?;
    store.range_partition(5).await?;
    assert_eq!(
        store.partition_count(PartitionStrategy::RoundRobin).await?,
        3
    );
    assert_eq!(store.partition_count(PartitionStrategy::Range).await?, 5);
    store.round_robin_partition(2).await?;
    assert_eq!(store.partition_count(PartitionStrategy::Range).await?, 5);
    Ok(())
}

#[tokio::test]
async fn zero_partitions_is_rejected() -> RatingsResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    let err = store
        .round_robin_partition(0)
        .await
        .expect_err("zero partitions");
    assert!(matches!(err, RatingsError::InvalidArgument { .. }));
    assert_eq!(
        store.partition_count(PartitionStrategy::RoundRobin).await?,
        0
    );
    Ok(())
}

#[tokio::test]
async fn oversized_partition_counts_are_rejected_before_any_ddl() -> RatingsResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    seed(&store, &sample_rows()).await?;

    let err = store
        .round_robin_partition(MAX_PARTITIONS + 1)
        .await
        .unwrap_err();
    assert!(matches!(err, RatingsError::InvalidArgument { .. }));
    let err = store.range_partition(MAX_PARTITIONS + 1).await.unwrap_err();
    assert!(matches!(err, RatingsError::InvalidArgument { .. }));
    assert_eq!(store.partition_count(PartitionStrategy::RoundRobin).await?, 0);
    assert_eq!(store.partition_count(PartitionStrategy::Range).await?, 0);
    Ok(())
}
