use async_trait::async_trait;
use sea_orm::DatabaseTransaction;
use sea_orm::sea_query::{Expr, ExprTrait, Query};

use crate::db::{RATING_COLUMNS, RatingColumn};
use crate::store::{
    count_rows, drop_table, exec, finish, insert_rows, list_partitions, partition_count,
    partition_sizes, recreate_table, select_rows, table_ref,
};
use crate::RatingsStore;
use ratings_partition_core::{
    InsertApi, InsertOutcome, PartitionApi, PartitionReport, PartitionStrategy, RangeBounds,
    RangeLayout, RatingRow, RatingsError, RatingsResult, round_robin_index,
    validate_partition_count,
};

#[async_trait]
impl PartitionApi for RatingsStore {
    async fn range_partition(&self, count: u32) -> RatingsResult<PartitionReport> {
        let layout = self.range_layout(count)?;
        let tx = self.begin().await?;
        let result = self.range_partition_in(&tx, &layout).await;
        let report = finish(tx, result, "range partition").await?;
        log::info!(
            "range partitioning of '{}' complete: {} partitions, {} rows",
            self.partitioning().base_table,
            report.partition_count,
            report.total_rows()
        );
        Ok(report)
    }

    async fn round_robin_partition(&self, count: u32) -> RatingsResult<PartitionReport> {
        validate_partition_count(count)?;
        let tx = self.begin().await?;
        let result = self.round_robin_partition_in(&tx, count).await;
        let report = finish(tx, result, "round-robin partition").await?;
        log::info!(
            "round-robin partitioning of '{}' complete: {} partitions, {} rows",
            self.partitioning().base_table,
            report.partition_count,
            report.total_rows()
        );
        Ok(report)
    }
}

#[async_trait]
impl InsertApi for RatingsStore {
    async fn range_insert(&self, row: RatingRow) -> RatingsResult<InsertOutcome> {
        let tx = self.begin().await?;
        let result = self.range_insert_in(&tx, row).await;
        let outcome = finish(tx, result, "range insert").await?;
        if outcome == InsertOutcome::SkippedOutOfRange {
            log::warn!(
                "rating {} for user {} item {} is outside every range partition; stored in base table only",
                row.rating,
                row.user_id,
                row.item_id
            );
        }
        Ok(outcome)
    }

    async fn round_robin_insert(&self, row: RatingRow) -> RatingsResult<InsertOutcome> {
        let tx = self.begin().await?;
        let result = self.round_robin_insert_in(&tx, row).await;
        finish(tx, result, "round-robin insert").await
    }
}

impl RatingsStore {
    fn range_layout(&self, count: u32) -> RatingsResult<RangeLayout> {
        let partitioning = self.partitioning();
        RangeLayout::new(partitioning.min_rating, partitioning.max_rating, count)
    }

    /// Drops tables left over from an earlier pass with more partitions.
    async fn drop_stale_partitions(
        &self,
        tx: &DatabaseTransaction,
        strategy: PartitionStrategy,
        count: u32,
    ) -> RatingsResult<()> {
        for table in list_partitions(tx, self.partitioning(), strategy).await? {
            if table.index() >= count {
                log::debug!("dropping stale partition '{table}'");
                drop_table(tx, table.name()).await?;
            }
        }
        Ok(())
    }

    async fn range_partition_in(
        &self,
        tx: &DatabaseTransaction,
        layout: &RangeLayout,
    ) -> RatingsResult<PartitionReport> {
        let strategy = PartitionStrategy::Range;
        self.drop_stale_partitions(tx, strategy, layout.count())
            .await?;
        let mut rows_per_partition = Vec::with_capacity(layout.count() as usize);
        for bounds in layout.iter() {
            let table = self.partitioning().partition_table(strategy, bounds.index);
            recreate_table(tx, table.name()).await?;
            self.copy_range(tx, table.name(), &bounds).await?;
            let rows = count_rows(tx, table.name()).await?;
            log::debug!(
                "partition '{table}' holds {rows} rows with ratings {}{:.2}, {:.2}]",
                if bounds.lower_inclusive { "[" } else { "(" },
                bounds.lower,
                bounds.upper
            );
            rows_per_partition.push(rows);
        }
        Ok(PartitionReport {
            strategy,
            partition_count: layout.count(),
            rows_per_partition,
        })
    }

    async fn copy_range(
        &self,
        tx: &DatabaseTransaction,
        table: &str,
        bounds: &RangeBounds,
    ) -> RatingsResult<()> {
        let lower = if bounds.lower_inclusive {
            Expr::col(RatingColumn::Rating).gte(bounds.lower)
        } else {
            Expr::col(RatingColumn::Rating).gt(bounds.lower)
        };
        let select = Query::select()
            .columns(RATING_COLUMNS)
            .from(table_ref(&self.partitioning().base_table))
            .and_where(lower)
            .and_where(Expr::col(RatingColumn::Rating).lte(bounds.upper))
            .to_owned();
        let insert = Query::insert()
            .into_table(table_ref(table))
            .columns(RATING_COLUMNS)
            .select_from(select)
            .map_err(|err| RatingsError::storage(err.to_string()))?
            .to_owned();
        exec(tx, &insert).await
    }

    async fn round_robin_partition_in(
        &self,
        tx: &DatabaseTransaction,
        count: u32,
    ) -> RatingsResult<PartitionReport> {
        let strategy = PartitionStrategy::RoundRobin;
        self.drop_stale_partitions(tx, strategy, count).await?;
        let mut buckets: Vec<Vec<RatingRow>> = vec![Vec::new(); count as usize];
        let rows = select_rows(tx, &self.partitioning().base_table).await?;
        for (position, row) in rows.into_iter().enumerate() {
            let index = round_robin_index(position as u64, count)?;
            buckets[index as usize].push(row);
        }
        let mut rows_per_partition = Vec::with_capacity(buckets.len());
        for (index, bucket) in (0..count).zip(buckets) {
            let table = self.partitioning().partition_table(strategy, index);
            recreate_table(tx, table.name()).await?;
            insert_rows(tx, table.name(), &bucket).await?;
            log::debug!("partition '{table}' holds {} rows", bucket.len());
            rows_per_partition.push(bucket.len() as u64);
        }
        Ok(PartitionReport {
            strategy,
            partition_count: count,
            rows_per_partition,
        })
    }

    async fn range_insert_in(
        &self,
        tx: &DatabaseTransaction,
        row: RatingRow,
    ) -> RatingsResult<InsertOutcome> {
        insert_rows(tx, &self.partitioning().base_table, &[row]).await?;
        let count = partition_count(tx, self.partitioning(), PartitionStrategy::Range).await?;
        if count == 0 {
            return Ok(InsertOutcome::Unpartitioned);
        }
        let Some(index) = self.range_layout(count)?.locate(row.rating) else {
            return Ok(InsertOutcome::SkippedOutOfRange);
        };
        let table = self
            .partitioning()
            .partition_table(PartitionStrategy::Range, index);
        insert_rows(tx, table.name(), &[row]).await?;
        log::debug!("routed rating {} to '{table}'", row.rating);
        Ok(InsertOutcome::Inserted { partition: index })
    }

    async fn round_robin_insert_in(
        &self,
        tx: &DatabaseTransaction,
        row: RatingRow,
    ) -> RatingsResult<InsertOutcome> {
        let strategy = PartitionStrategy::RoundRobin;
        insert_rows(tx, &self.partitioning().base_table, &[row]).await?;
        let count = partition_count(tx, self.partitioning(), strategy).await?;
        if count == 0 {
            return Ok(InsertOutcome::Unpartitioned);
        }
        let total: u64 = partition_sizes(tx, self.partitioning(), strategy, count)
            .await?
            .iter()
            .sum();
        let index = round_robin_index(total, count)?;
        let table = self.partitioning().partition_table(strategy, index);
        insert_rows(tx, table.name(), &[row]).await?;
        log::debug!("routed row {total} to '{table}'");
        Ok(InsertOutcome::Inserted { partition: index })
    }
}
