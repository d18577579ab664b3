use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::{
    application::models::profile::Profile,
    config::Config,
    constants::DEFAULT_IMAGE_EXT,
    error::AppError,
    session::credential::Credential,
    session::manager::SessionManager,
    transport::media_client::{upload_image_path, MediaClient},
    utils::backoff::Backoff,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub profile_id: String,
    pub content_id: String,
    /// CDN path the bytes come from.
    pub source_path: String,
    /// Local file the bytes land in.
    pub destination: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    Downloaded,
    AlreadyPresent,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub task: DownloadTask,
    pub status: DownloadStatus,
    pub attempts: u32,
}

/// Downloads profile images with bounded concurrency. Tasks are
/// independent: one exhausting its retry budget never cancels the rest,
/// and files already on disk are never fetched again.
pub struct MediaFetcher<M: MediaClient> {
    client: Arc<M>,
    session: Arc<SessionManager>,
    config: Arc<Config>,
}

/// Extension taken from the URL path, falling back when the CDN hands
/// out bare ids.
fn extension_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    match segment.rfind('.') {
        Some(idx) if idx > 0 => segment[idx..].to_string(),
        _ => DEFAULT_IMAGE_EXT.to_string(),
    }
}

impl<M: MediaClient + 'static> MediaFetcher<M> {
    pub fn new(client: Arc<M>, session: Arc<SessionManager>, config: Arc<Config>) -> Self {
        Self {
            client,
            session,
            config,
        }
    }

    /// Lays out one task per image. The destination path depends only on
    /// the profile and content ids, so re-runs resolve to the same files.
    pub fn plan(&self, profiles: &[Profile], out_dir: &Path) -> Vec<DownloadTask> {
        let mut tasks = Vec::new();
        for profile in profiles {
            let profile_dir = out_dir.join(&profile.profile_id);
            for image in &profile.images {
                let ext = extension_from_url(&image.url);
                tasks.push(DownloadTask {
                    profile_id: profile.profile_id.clone(),
                    content_id: image.content_id.clone(),
                    source_path: upload_image_path(&image.content_id, &ext),
                    destination: profile_dir.join(format!("{}{}", image.content_id, ext)),
                });
            }
        }
        tasks
    }

    pub async fn fetch_all(&self, tasks: Vec<DownloadTask>) -> Result<Vec<DownloadOutcome>, AppError> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let credential = self.session.credential().await?;
        let semaphore = Arc::new(Semaphore::new(self.config.download.max_concurrency.max(1)));
        let backoff = Backoff::new(
            Duration::from_millis(self.config.download.retry_base_ms),
            self.config.download.max_attempts,
        );

        info!(
            "Downloading {} images ({} at a time)",
            tasks.len(),
            self.config.download.max_concurrency.max(1)
        );

        let mut handles = Vec::with_capacity(tasks.len());
        for task in &tasks {
            let task = task.clone();
            let client = self.client.clone();
            let session = self.session.clone();
            let semaphore = semaphore.clone();
            let credential = credential.clone();
            let backoff = backoff.clone();

            handles.push(tokio::spawn(async move {
                // The semaphore is never closed, so this only fails if the
                // runtime is tearing down anyway.
                let _permit = semaphore.acquire_owned().await;
                run_task(client, session, credential, task, backoff).await
            }));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (handle, task) in handles.into_iter().zip(tasks) {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!("Download task for {} died: {}", task.content_id, e);
                    outcomes.push(DownloadOutcome {
                        task,
                        status: DownloadStatus::Failed(e.to_string()),
                        attempts: 0,
                    });
                }
            }
        }

        let downloaded = outcomes
            .iter()
            .filter(|o| o.status == DownloadStatus::Downloaded)
            .count();
        let skipped = outcomes
            .iter()
            .filter(|o| o.status == DownloadStatus::AlreadyPresent)
            .count();
        info!(
            "Downloads finished: {} fetched, {} already present, {} failed",
            downloaded,
            skipped,
            outcomes.len() - downloaded - skipped
        );
        Ok(outcomes)
    }
}

async fn run_task<M: MediaClient>(
    client: Arc<M>,
    session: Arc<SessionManager>,
    mut credential: Credential,
    task: DownloadTask,
    backoff: Backoff,
) -> DownloadOutcome {
    if task.destination.exists() {
        debug!("Skipping {}, already on disk", task.destination.display());
        return DownloadOutcome {
            task,
            status: DownloadStatus::AlreadyPresent,
            attempts: 0,
        };
    }

    let mut attempts = 0u32;
    let status = loop {
        attempts += 1;
        match client.get_image(&task.source_path, &credential).await {
            Ok(bytes) => match write_image(&task.destination, &bytes).await {
                Ok(()) => break DownloadStatus::Downloaded,
                Err(e) => {
                    warn!("Writing {} failed: {}", task.destination.display(), e);
                    break DownloadStatus::Failed(e.to_string());
                }
            },
            Err(AppError::Unauthorized) if attempts < backoff.max_attempts() => {
                debug!("Credential rejected while fetching {}", task.content_id);
                match session.refresh_rejected(&credential).await {
                    Ok(fresh) => credential = fresh,
                    Err(e) => break DownloadStatus::Failed(e.to_string()),
                }
            }
            Err(e) if e.is_transient() && attempts < backoff.max_attempts() => {
                let delay = backoff.delay(attempts - 1);
                warn!(
                    "Fetching {} failed ({}), retrying in {:?}",
                    task.content_id, e, delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!(
                    "Giving up on {} after {} attempts: {}",
                    task.content_id, attempts, e
                );
                break DownloadStatus::Failed(e.to_string());
            }
        }
    };

    DownloadOutcome {
        task,
        status,
        attempts,
    }
}

/// Writes through a temp file so a crash never leaves a half image that
/// a later run would mistake for a finished download.
async fn write_image(destination: &Path, bytes: &[u8]) -> Result<(), AppError> {
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut tmp = destination.as_os_str().to_owned();
    tmp.push(".part");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, destination).await?;
    Ok(())
}
