use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use ratings_partition_store::{
    InsertApi, InsertOutcome, PartitionApi, PartitionMetadataApi, PartitionReport,
    PartitionStrategy, RatingRow, RatingsStore, open_store,
};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let store = open_store(&cli.datastore)
        .await
        .with_context(|| format!("open datastore {}", cli.datastore.display()))?;
    match cli.command {
        Command::Load(args) => load(&store, args).await,
        Command::RangePartition(args) => partition(&store, PartitionStrategy::Range, args).await,
        Command::RoundRobinPartition(args) => {
            partition(&store, PartitionStrategy::RoundRobin, args).await
        }
        Command::RangeInsert(args) => insert(&store, PartitionStrategy::Range, args).await,
        Command::RoundRobinInsert(args) => {
            insert(&store, PartitionStrategy::RoundRobin, args).await
        }
        Command::Sizes => sizes(&store).await,
    }
}

#[derive(Parser)]
#[command(author, version, about = "Partition a ratings table by range or round-robin")]
struct Cli {
    /// Directory holding ratings.json and the default sqlite database.
    #[arg(long, global = true, default_value = ".ratings")]
    datastore: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a `user::item::rating` file into the base table.
    Load(LoadArgs),
    /// Rebuild range partitions from the base table.
    RangePartition(PartitionArgs),
    /// Rebuild round-robin partitions from the base table.
    RoundRobinPartition(PartitionArgs),
    /// Insert one rating and route it to its range partition.
    RangeInsert(InsertArgs),
    /// Insert one rating and route it to the next round-robin partition.
    RoundRobinInsert(InsertArgs),
    /// Print row counts of the base table and every partition.
    Sizes,
}

#[derive(Parser)]
struct LoadArgs {
    /// Ratings file to load.
    #[arg(long)]
    input: PathBuf,
}

#[derive(Parser)]
struct PartitionArgs {
    /// Number of partitions to create.
    #[arg(long, short = 'n')]
    partitions: u32,
}

#[derive(Parser)]
struct InsertArgs {
    #[arg(long)]
    user: i32,
    #[arg(long)]
    item: i32,
    #[arg(long)]
    rating: f64,
}

async fn load(store: &RatingsStore, args: LoadArgs) -> Result<()> {
    let report = store
        .load_ratings(&args.input)
        .await
        .with_context(|| format!("load {}", args.input.display()))?;
    println!(
        "Loaded {} ratings from {} ({} lines skipped)",
        report.loaded,
        args.input.display(),
        report.skipped
    );
    Ok(())
}

async fn partition(
    store: &RatingsStore,
    strategy: PartitionStrategy,
    args: PartitionArgs,
) -> Result<()> {
    let report = match strategy {
        PartitionStrategy::Range => store.range_partition(args.partitions).await,
        PartitionStrategy::RoundRobin => store.round_robin_partition(args.partitions).await,
    }
    .with_context(|| format!("{strategy} partition into {}", args.partitions))?;
    print_report(store, &report);
    Ok(())
}

async fn insert(store: &RatingsStore, strategy: PartitionStrategy, args: InsertArgs) -> Result<()> {
    if !args.rating.is_finite() {
        return Err(anyhow!("rating must be a finite number"));
    }
    let row = RatingRow::new(args.user, args.item, args.rating);
    let outcome = match strategy {
        PartitionStrategy::Range => store.range_insert(row).await,
        PartitionStrategy::RoundRobin => store.round_robin_insert(row).await,
    }
    .with_context(|| format!("{strategy} insert"))?;
    match outcome {
        InsertOutcome::Inserted { partition } => {
            let table = store.partitioning().partition_table(strategy, partition);
            println!("Inserted into base table and {table}");
        }
        InsertOutcome::Unpartitioned => {
            println!("Inserted into base table; no {strategy} partitions exist yet");
        }
        InsertOutcome::SkippedOutOfRange => {
            println!(
                "Inserted into base table; rating {} matches no {strategy} partition",
                args.rating
            );
        }
    }
    Ok(())
}

async fn sizes(store: &RatingsStore) -> Result<()> {
    println!(
        "{}: {} rows",
        store.partitioning().base_table,
        store.base_row_count().await?
    );
    for strategy in [PartitionStrategy::Range, PartitionStrategy::RoundRobin] {
        let sizes = store.partition_sizes(strategy).await?;
        if sizes.is_empty() {
            println!("{strategy}: no partitions");
            continue;
        }
        for (index, rows) in sizes.iter().enumerate() {
            let table = store
                .partitioning()
                .partition_table(strategy, index as u32);
            println!("{table}: {rows} rows");
        }
    }
    Ok(())
}

fn print_report(store: &RatingsStore, report: &PartitionReport) {
    println!(
        "Created {} {} partitions ({} rows)",
        report.partition_count,
        report.strategy,
        report.total_rows()
    );
    for (index, rows) in report.rows_per_partition.iter().enumerate() {
        let table = store
            .partitioning()
            .partition_table(report.strategy, index as u32);
        println!("  {table}: {rows} rows");
    }
}
