mod common;

use std::fs;

use common::{row, sqlite_store};
use ratings_partition_store::{LoadReport, RatingsError, RatingsResult};
use tempfile::tempdir;

#[tokio::test]
async fn loads_delimited_file_and_skips_bad_lines() -> RatingsResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    let path = dir.path().join("ratings.dat");
    fs::write(
        &path,
        "1::122::5::838985046\n\
         1::185::4.5::838983525\n\
         2::1\n\
         \n\
         x::3::2.0\n\
         3::292::0\n",
    )
    .expect("write ratings");

    let report = store.load_ratings(&path).await?;
    assert_eq!(
        report,
        LoadReport {
            loaded: 3,
            skipped: 3
        }
    );
    assert_eq!(
        store.base_rows().await?,
        vec![row(1, 122, 5.0), row(1, 185, 4.5), row(3, 292, 0.0)]
    );
    Ok(())
}

#[tokio::test]
async fn missing_file_is_an_io_error() -> RatingsResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    let err = store
        .load_ratings(&dir.path().join("absent.dat"))
        .await
        .expect_err("missing file");
    assert!(matches!(err, RatingsError::Io { .. }));
    assert_eq!(store.base_row_count().await?, 0);
    Ok(())
}
