//! File-backed persistence for the ledger
//!
//! Each ledger record lives in its own JSON file under the data directory.
//! Mutations hand snapshots to a [`ChannelSink`]; a background writer task
//! drains the channel and writes the files, so request handlers never wait on
//! disk I/O.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use shared::error::PersistenceError;
use shared::ledger::{LedgerRecord, LedgerSnapshot, PersistenceSink};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Ledger records stored as JSON files in one directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, record: LedgerRecord) -> PathBuf {
        self.data_dir.join(record.file_name())
    }

    /// Load all records. Missing files fall back to defaults, and a missing
    /// threshold file falls back to `default_threshold`.
    pub async fn load(&self, default_threshold: u32) -> Result<LedgerSnapshot, PersistenceError> {
        let mut raw: HashMap<LedgerRecord, String> = HashMap::new();
        for record in LedgerRecord::ALL {
            let path = self.path_for(record);
            match tokio::fs::read_to_string(&path).await {
                Ok(contents) => {
                    raw.insert(record, contents);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(path = %path.display(), "No stored record");
                }
                Err(e) => {
                    return Err(PersistenceError::Storage(format!(
                        "failed to read {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }

        let has_threshold = raw.contains_key(&LedgerRecord::Threshold);
        let mut snapshot = LedgerSnapshot::decode(|record| Ok(raw.remove(&record)))?;
        if !has_threshold {
            snapshot.threshold = default_threshold;
        }

        tracing::info!(
            data_dir = %self.data_dir.display(),
            batches = snapshot.batches.len(),
            usage = snapshot.usage.len(),
            alerts = snapshot.alerts.len(),
            threshold = snapshot.threshold,
            "Loaded ledger records"
        );
        Ok(snapshot)
    }

    /// Write every record. Each file is written to a temporary path first and
    /// renamed into place.
    pub async fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), PersistenceError> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| storage_error("create", &self.data_dir, e))?;

        for (record, contents) in snapshot.encode_all()? {
            let path = self.path_for(record);
            let tmp = path.with_extension("json.tmp");
            tokio::fs::write(&tmp, contents)
                .await
                .map_err(|e| storage_error("write", &tmp, e))?;
            tokio::fs::rename(&tmp, &path)
                .await
                .map_err(|e| storage_error("rename", &path, e))?;
        }
        Ok(())
    }
}

fn storage_error(action: &str, path: &Path, e: std::io::Error) -> PersistenceError {
    PersistenceError::Storage(format!("failed to {} {}: {}", action, path.display(), e))
}

/// Sink that queues snapshots for the writer task
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<LedgerSnapshot>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<LedgerSnapshot>) -> Self {
        Self { tx }
    }
}

impl PersistenceSink for ChannelSink {
    fn persist(&self, snapshot: &LedgerSnapshot) -> Result<(), PersistenceError> {
        self.tx
            .send(snapshot.clone())
            .map_err(|_| PersistenceError::Storage("ledger writer has stopped".to_string()))
    }
}

/// Start the writer task. It exits once every sender has been dropped and
/// the queue is drained.
pub fn spawn_writer(store: JsonFileStore) -> (ChannelSink, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<LedgerSnapshot>();

    let handle = tokio::spawn(async move {
        while let Some(mut snapshot) = rx.recv().await {
            // Only the newest queued state needs writing
            while let Ok(newer) = rx.try_recv() {
                snapshot = newer;
            }
            match store.save(&snapshot).await {
                Ok(()) => tracing::debug!("Ledger records written"),
                Err(e) => tracing::warn!(error = %e, "Failed to write ledger records"),
            }
        }
        tracing::debug!("Ledger writer stopped");
    });

    (ChannelSink::new(tx), handle)
}
