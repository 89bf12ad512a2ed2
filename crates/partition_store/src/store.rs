use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::sea_query::{
    Alias, Asterisk, ColumnDef, Expr, Func, Order, PostgresQueryBuilder, Query,
    QueryStatementWriter, SqliteQueryBuilder, Table, TableCreateStatement,
};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection,
    DatabaseTransaction, QueryResult, Statement, TransactionTrait, Value as SeaValue,
};
use sea_orm_migration::SchemaManager;

use crate::db::{RATING_COLUMNS, RatingColumn};
use crate::{DatabaseConfig, StoreConfig};
use ratings_partition_core::{
    PartitionConfig, PartitionMetadataApi, PartitionStrategy, PartitionTable, RatingRow,
    RatingsError, RatingsResult,
};

const INSERT_BATCH_ROWS: usize = 300;

#[derive(Clone)]
pub struct RatingsStore {
    conn: DatabaseConnection,
    partitioning: PartitionConfig,
}

impl RatingsStore {
    pub async fn connect(config: &StoreConfig, base_dir: &Path) -> RatingsResult<Self> {
        let url = build_connection_url(config, base_dir)?;
        let mut options = ConnectOptions::new(url);
        if let Some(pool) = &config.pool {
            if let Some(max) = pool.max_connections {
                options.max_connections(max);
            }
            if let Some(min) = pool.min_connections {
                options.min_connections(min);
            }
            if let Some(timeout_ms) = pool.connect_timeout_ms {
                options.connect_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.acquire_timeout_ms {
                options.acquire_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.idle_timeout_ms {
                options.idle_timeout(Duration::from_millis(timeout_ms));
            }
        }
        options.sqlx_logging(false);
        let conn = Database::connect(options)
            .await
            .map_err(|err| RatingsError::connection(err.to_string()))?;
        let store = Self::from_connection(conn, config.partitioning()).await?;
        store.ensure_base_table().await?;
        log::info!(
            "ratings store connected (backend={}, base_table={})",
            config.backend_name(),
            store.partitioning.base_table
        );
        Ok(store)
    }

    /// Wraps a caller-owned session. The session must answer a ping, and only
    /// backends with transactional DDL are accepted, since a partition pass drops
    /// and creates tables inside one transaction.
    pub async fn from_connection(
        conn: DatabaseConnection,
        partitioning: PartitionConfig,
    ) -> RatingsResult<Self> {
        partitioning.validate()?;
        conn.ping()
            .await
            .map_err(|err| RatingsError::connection(err.to_string()))?;
        let backend = conn.get_database_backend();
        match backend {
            DatabaseBackend::Sqlite | DatabaseBackend::Postgres => {}
            other => {
                return Err(RatingsError::invalid(format!(
                    "backend {other:?} has no transactional DDL"
                )));
            }
        }
        Ok(Self { conn, partitioning })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub fn partitioning(&self) -> &PartitionConfig {
        &self.partitioning
    }

    pub async fn ensure_base_table(&self) -> RatingsResult<()> {
        self.ensure_live().await?;
        let manager = SchemaManager::new(&self.conn);
        manager
            .create_table(rating_table(&self.partitioning.base_table))
            .await?;
        Ok(())
    }

    /// Fails with a connection error before any statement runs when the session
    /// is no longer usable.
    pub(crate) async fn ensure_live(&self) -> RatingsResult<()> {
        self.conn
            .ping()
            .await
            .map_err(|err| RatingsError::connection(err.to_string()))
    }

    pub(crate) async fn begin(&self) -> RatingsResult<DatabaseTransaction> {
        self.ensure_live().await?;
        Ok(self.conn.begin().await?)
    }

    pub async fn base_rows(&self) -> RatingsResult<Vec<RatingRow>> {
        select_rows(&self.conn, &self.partitioning.base_table).await
    }

    pub async fn base_row_count(&self) -> RatingsResult<u64> {
        count_rows(&self.conn, &self.partitioning.base_table).await
    }

    pub async fn partition_rows(
        &self,
        strategy: PartitionStrategy,
        index: u32,
    ) -> RatingsResult<Vec<RatingRow>> {
        let table = self.partitioning.partition_table(strategy, index);
        select_rows(&self.conn, table.name()).await
    }

    pub async fn list_partitions(
        &self,
        strategy: PartitionStrategy,
    ) -> RatingsResult<Vec<PartitionTable>> {
        list_partitions(&self.conn, &self.partitioning, strategy).await
    }

    pub async fn insert_base_row(&self, row: RatingRow) -> RatingsResult<()> {
        self.ensure_live().await?;
        insert_rows(&self.conn, &self.partitioning.base_table, &[row]).await
    }
}

#[async_trait]
impl PartitionMetadataApi for RatingsStore {
    async fn partition_count(&self, strategy: PartitionStrategy) -> RatingsResult<u32> {
        self.ensure_live().await?;
        partition_count(&self.conn, &self.partitioning, strategy).await
    }

    async fn partition_sizes(&self, strategy: PartitionStrategy) -> RatingsResult<Vec<u64>> {
        self.ensure_live().await?;
        let count = partition_count(&self.conn, &self.partitioning, strategy).await?;
        partition_sizes(&self.conn, &self.partitioning, strategy, count).await
    }
}

/// Commits on success; otherwise rolls back and hands the original error back.
pub(crate) async fn finish<T>(
    tx: DatabaseTransaction,
    result: RatingsResult<T>,
    operation: &str,
) -> RatingsResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            log::warn!("{operation} failed, rolling back: {err}");
            if let Err(rollback_err) = tx.rollback().await {
                log::warn!("{operation} rollback failed: {rollback_err}");
            }
            Err(err)
        }
    }
}

pub(crate) fn table_ref(name: &str) -> Alias {
    Alias::new(name.to_owned())
}

pub(crate) fn rating_table(name: &str) -> TableCreateStatement {
    Table::create()
        .table(table_ref(name))
        .if_not_exists()
        .col(ColumnDef::new(RatingColumn::UserId).integer().not_null())
        .col(ColumnDef::new(RatingColumn::ItemId).integer().not_null())
        .col(ColumnDef::new(RatingColumn::Rating).double().not_null())
        .to_owned()
}

pub(crate) async fn recreate_table(tx: &DatabaseTransaction, name: &str) -> RatingsResult<()> {
    drop_table(tx, name).await?;
    let manager = SchemaManager::new(tx);
    manager.create_table(rating_table(name)).await?;
    Ok(())
}

pub(crate) async fn drop_table(tx: &DatabaseTransaction, name: &str) -> RatingsResult<()> {
    let manager = SchemaManager::new(tx);
    manager
        .drop_table(Table::drop().table(table_ref(name)).if_exists().to_owned())
        .await?;
    Ok(())
}

pub(crate) async fn insert_rows<C: ConnectionTrait>(
    conn: &C,
    table: &str,
    rows: &[RatingRow],
) -> RatingsResult<()> {
    for chunk in rows.chunks(INSERT_BATCH_ROWS) {
        let mut insert = Query::insert()
            .into_table(table_ref(table))
            .columns(RATING_COLUMNS)
            .to_owned();
        for row in chunk {
            insert
                .values([row.user_id.into(), row.item_id.into(), row.rating.into()])
                .map_err(|err| RatingsError::storage(err.to_string()))?;
        }
        exec(conn, &insert).await?;
    }
    Ok(())
}

/// Rows ordered by `(user_id, item_id, rating)` so repeated scans agree.
pub(crate) async fn select_rows<C: ConnectionTrait>(
    conn: &C,
    table: &str,
) -> RatingsResult<Vec<RatingRow>> {
    let select = Query::select()
        .columns(RATING_COLUMNS)
        .from(table_ref(table))
        .order_by(RatingColumn::UserId, Order::Asc)
        .order_by(RatingColumn::ItemId, Order::Asc)
        .order_by(RatingColumn::Rating, Order::Asc)
        .to_owned();
    let rows = query_all(conn, &select).await?;
    rows.iter().map(read_rating_row).collect()
}

pub(crate) async fn count_rows<C: ConnectionTrait>(conn: &C, table: &str) -> RatingsResult<u64> {
    let select = Query::select()
        .from(table_ref(table))
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("row_count"))
        .to_owned();
    let Some(row) = query_one(conn, &select).await? else {
        return Ok(0);
    };
    let count: i64 = row.try_get("", "row_count")?;
    u64::try_from(count).map_err(|_| RatingsError::storage(format!("negative row count {count}")))
}

/// Partition tables currently present for `strategy`, ordered by index.
pub(crate) async fn list_partitions<C: ConnectionTrait>(
    conn: &C,
    partitioning: &PartitionConfig,
    strategy: PartitionStrategy,
) -> RatingsResult<Vec<PartitionTable>> {
    let names = table_names_with_prefix(conn, partitioning.prefix(strategy)).await?;
    let mut indexes: Vec<u32> = names
        .iter()
        .filter_map(|name| partitioning.parse_partition_index(strategy, name))
        .collect();
    indexes.sort_unstable();
    indexes.dedup();
    Ok(indexes
        .into_iter()
        .map(|index| partitioning.partition_table(strategy, index))
        .collect())
}

pub(crate) async fn partition_count<C: ConnectionTrait>(
    conn: &C,
    partitioning: &PartitionConfig,
    strategy: PartitionStrategy,
) -> RatingsResult<u32> {
    let tables = list_partitions(conn, partitioning, strategy).await?;
    u32::try_from(tables.len()).map_err(|_| RatingsError::storage("too many partition tables"))
}

/// Live row counts of partitions `0..count`.
pub(crate) async fn partition_sizes<C: ConnectionTrait>(
    conn: &C,
    partitioning: &PartitionConfig,
    strategy: PartitionStrategy,
    count: u32,
) -> RatingsResult<Vec<u64>> {
    let mut sizes = Vec::with_capacity(count as usize);
    for index in 0..count {
        let table = partitioning.partition_table(strategy, index);
        sizes.push(count_rows(conn, table.name()).await?);
    }
    Ok(sizes)
}

async fn table_names_with_prefix<C: ConnectionTrait>(
    conn: &C,
    prefix: &str,
) -> RatingsResult<Vec<String>> {
    let backend = conn.get_database_backend();
    let sql = match backend {
        DatabaseBackend::Sqlite => {
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE ?"
        }
        DatabaseBackend::Postgres => {
            "SELECT table_name::text AS name FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name LIKE $1"
        }
        other => {
            return Err(RatingsError::storage(format!(
                "table metadata lookup unsupported on {other:?}"
            )));
        }
    };
    let pattern = SeaValue::from(format!("{prefix}%"));
    let rows = conn
        .query_all_raw(Statement::from_sql_and_values(backend, sql, [pattern]))
        .await?;
    let mut names = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.try_get("", "name")?;
        names.push(name);
    }
    Ok(names)
}

fn read_rating_row(row: &QueryResult) -> RatingsResult<RatingRow> {
    let user_id: i32 = row.try_get("", &col_name(RatingColumn::UserId))?;
    let item_id: i32 = row.try_get("", &col_name(RatingColumn::ItemId))?;
    let rating: f64 = row.try_get("", &col_name(RatingColumn::Rating))?;
    Ok(RatingRow::new(user_id, item_id, rating))
}

fn col_name(column: impl sea_orm::sea_query::Iden) -> String {
    column.to_string()
}

fn build_stmt<S: QueryStatementWriter>(
    backend: DatabaseBackend,
    stmt: &S,
) -> (String, sea_orm::sea_query::Values) {
    match backend {
        DatabaseBackend::Postgres => stmt.build(PostgresQueryBuilder),
        _ => stmt.build(SqliteQueryBuilder),
    }
}

pub(crate) async fn exec<C, S>(conn: &C, stmt: &S) -> RatingsResult<()>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    conn.execute_raw(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(())
}

async fn query_all<C, S>(conn: &C, stmt: &S) -> RatingsResult<Vec<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let rows = conn
        .query_all_raw(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(rows)
}

async fn query_one<C, S>(conn: &C, stmt: &S) -> RatingsResult<Option<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let row = conn
        .query_one_raw(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(row)
}

fn build_connection_url(config: &StoreConfig, base_dir: &Path) -> RatingsResult<String> {
    match &config.database {
        DatabaseConfig::Sqlite { .. } => {
            let path = config.sqlite_path(base_dir)?;
            Ok(format!("sqlite://{}?mode=rwc", path.display()))
        }
        DatabaseConfig::Postgres { url } => Ok(url.clone()),
    }
}
