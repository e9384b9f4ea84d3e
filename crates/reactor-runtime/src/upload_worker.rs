//! Background file ingestion with coarse progress reporting.

use std::path::PathBuf;
use std::time::Duration;

use reactor_core::error::DashboardError;
use reactor_core::models::ParsedData;
use reactor_data::csv_ingest;
use tokio::sync::mpsc;

/// Progress increment reported while a file is read.
pub const PROGRESS_STEP: u8 = 20;
/// Pause between progress increments.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub enum UploadEvent {
    Progress { upload_id: String, progress: u8 },
    Completed { upload_id: String, data: ParsedData },
    Failed { upload_id: String, error: DashboardError },
}

/// Where the bytes of an upload come from.
#[derive(Debug, Clone)]
pub enum UploadSource {
    Path(PathBuf),
    Bytes { name: String, bytes: Vec<u8> },
}

impl UploadSource {
    pub fn name(&self) -> String {
        match self {
            Self::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Self::Bytes { name, .. } => name.clone(),
        }
    }
}

/// Read and parse one upload in a tokio task.
///
/// Progress climbs in [`PROGRESS_STEP`] increments up to 80 % while the file
/// is read, then the task ends with exactly one `Completed` or `Failed`
/// event. Events are dropped silently once the receiver is gone.
pub fn spawn_upload(
    upload_id: String,
    source: UploadSource,
    step_delay: Duration,
    events: mpsc::UnboundedSender<UploadEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let name = source.name();
        let mut progress = 0u8;
        while progress < 100 - PROGRESS_STEP {
            tokio::time::sleep(step_delay).await;
            progress += PROGRESS_STEP;
            let _ = events.send(UploadEvent::Progress {
                upload_id: upload_id.clone(),
                progress,
            });
        }

        let bytes = match source {
            UploadSource::Path(path) => match tokio::fs::read(&path).await {
                Ok(bytes) => Ok(bytes),
                Err(source) => Err(DashboardError::FileRead { path, source }),
            },
            UploadSource::Bytes { bytes, .. } => Ok(bytes),
        };

        let parsed = match bytes {
            Ok(bytes) => {
                let name = name.clone();
                tokio::task::spawn_blocking(move || csv_ingest::ingest(&name, bytes))
                    .await
                    .unwrap_or_else(|e| Err(DashboardError::Other(e.into())))
            }
            Err(e) => Err(e),
        };

        let event = match parsed {
            Ok(data) => {
                tracing::info!(%upload_id, %name, rows = data.rows.len(), "upload parsed");
                UploadEvent::Completed { upload_id, data }
            }
            Err(error) => {
                tracing::warn!(%upload_id, %name, %error, "upload failed");
                UploadEvent::Failed { upload_id, error }
            }
        };
        let _ = events.send(event);
    })
}
