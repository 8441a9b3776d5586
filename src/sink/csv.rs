//! CSV durable log sink.

use super::{DurableLogSink, SinkError};
use crate::store::Timestamp;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const HEADER: &str = "timestamp,heart_rate\n";

/// Appends one `timestamp,heart_rate` row per reading to a CSV file.
///
/// A new file is created for every run, named after the time the relay
/// started.
pub struct CsvSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl CsvSink {
    /// Creates `<dir>/heart_rate_<YYYYmmdd_HHMMSS>.csv` and writes the header.
    pub async fn create<Tz>(dir: impl AsRef<Path>, started: DateTime<Tz>) -> Result<Self, SinkError>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await?;

        let path = dir.join(format!(
            "heart_rate_{}.csv",
            started.format("%Y%m%d_%H%M%S")
        ));
        let mut file = File::create(&path).await?;
        file.write_all(HEADER.as_bytes()).await?;
        file.flush().await?;

        tracing::info!(path = %path.display(), "CSV sink ready");

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Returns the path of the file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DurableLogSink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn write(&self, timestamp: &Timestamp, value: f64) -> Result<(), SinkError> {
        let row = format!("{},{}\n", csv_field(timestamp), value);
        let mut file = self.file.lock().await;
        file.write_all(row.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

fn csv_field(timestamp: &Timestamp) -> String {
    match timestamp {
        Timestamp::Text(s) if s.contains([',', '"', '\n', '\r']) => {
            format!("\"{}\"", s.replace('"', "\"\""))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_creates_file_named_after_start_time() {
        let dir = tempfile::tempdir().unwrap();
        let started = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        let sink = CsvSink::create(dir.path(), started).await.unwrap();
        assert_eq!(
            sink.path().file_name().unwrap(),
            "heart_rate_20240309_140507.csv"
        );
        assert_eq!(std::fs::read_to_string(sink.path()).unwrap(), HEADER);
    }

    #[tokio::test]
    async fn test_appends_rows() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::create(dir.path(), Utc::now()).await.unwrap();

        sink.write(&Timestamp::from(1000), 81.7).await.unwrap();
        sink.write(&Timestamp::from(1001), 80.0).await.unwrap();
        sink.write(&Timestamp::from("12:00, noon"), 79.5).await.unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(
            content,
            "timestamp,heart_rate\n1000,81.7\n1001,80\n\"12:00, noon\",79.5\n"
        );
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("logs").join("hr");

        let sink = CsvSink::create(&nested, Utc::now()).await.unwrap();
        assert!(sink.path().starts_with(&nested));
    }
}
