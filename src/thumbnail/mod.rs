//! Thumbnail pipeline.
//!
//! The worker process claims jobs from the thumbnail queue and writes three
//! scaled copies of each uploaded image next to the original, as
//! `<localPath>_500`, `<localPath>_250` and `<localPath>_100`.

use std::future::Future;
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::db::Database;
use crate::file::{FileNodeRepository, FileStorage};
use crate::queue::{ClaimedJob, JobPayload, JobQueue};
use crate::{FilesError, Result};

/// Target widths, largest first.
pub const THUMBNAIL_WIDTHS: [u32; 3] = [500, 250, 100];

/// Errors that fail a thumbnail job.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Missing fileId")]
    MissingFileId,

    #[error("Missing userId")]
    MissingUserId,

    /// Node absent, owned by someone else, or its bytes are gone.
    #[error("File not found")]
    FileNotFound,

    #[error("invalid job payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("thumbnail task aborted: {0}")]
    Aborted(String),

    #[error(transparent)]
    Internal(#[from] FilesError),
}

/// Scale an encoded image down to `width` pixels wide.
///
/// Aspect ratio is kept and images already narrow enough are re-encoded
/// at their own size. Output uses the source format when it can be
/// written, PNG otherwise.
pub fn generate_thumbnail(
    bytes: &[u8],
    width: u32,
) -> std::result::Result<Vec<u8>, image::ImageError> {
    let format = image::guess_format(bytes)?;
    let img = image::load_from_memory_with_format(bytes, format)?;
    let scaled = scale_to_width(&img, width);
    encode(&scaled, format)
}

fn scale_to_width(img: &DynamicImage, width: u32) -> DynamicImage {
    if width == 0 || img.width() <= width {
        return img.clone();
    }
    let height = (u64::from(img.height()) * u64::from(width) / u64::from(img.width())).max(1);
    let height = u32::try_from(height).unwrap_or(u32::MAX);
    img.resize_exact(width, height, FilterType::Triangle)
}

fn encode(
    img: &DynamicImage,
    format: ImageFormat,
) -> std::result::Result<Vec<u8>, image::ImageError> {
    let mut out = Cursor::new(Vec::new());
    if img.write_to(&mut out, format).is_ok() {
        return Ok(out.into_inner());
    }
    debug!("Cannot encode as {:?}, falling back to PNG", format);
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// Turns one job into thumbnail files.
#[derive(Debug, Clone)]
pub struct ThumbnailProcessor {
    db: Database,
}

impl ThumbnailProcessor {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Process a claimed job.
    pub async fn process_job(
        &self,
        job: &ClaimedJob,
    ) -> std::result::Result<Vec<PathBuf>, JobError> {
        let payload = job.payload()?;
        self.process(&payload).await
    }

    /// Generate every width for the image named by `payload`.
    ///
    /// All thumbnails are produced in memory before anything is written,
    /// so a failing width leaves no new files. Rerunning overwrites the
    /// same paths. Returns the written paths.
    pub async fn process(
        &self,
        payload: &JobPayload,
    ) -> std::result::Result<Vec<PathBuf>, JobError> {
        let file_id = payload.file_id.ok_or(JobError::MissingFileId)?;
        let user_id = payload.user_id.ok_or(JobError::MissingUserId)?;

        let node = FileNodeRepository::new(self.db.pool())
            .get_owned(file_id, user_id)
            .await?
            .ok_or(JobError::FileNotFound)?;
        let local_path = node.local_path.ok_or(JobError::FileNotFound)?;
        let original = FileStorage::read_regular_file(&local_path)
            .await?
            .ok_or(JobError::FileNotFound)?;

        info!("Generating thumbnails for {}", payload.name);

        let thumbnails = tokio::task::spawn_blocking(move || {
            THUMBNAIL_WIDTHS
                .iter()
                .map(|&width| generate_thumbnail(&original, width).map(|bytes| (width, bytes)))
                .collect::<std::result::Result<Vec<_>, _>>()
        })
        .await
        .map_err(|e| JobError::Aborted(e.to_string()))??;

        let mut written = Vec::with_capacity(thumbnails.len());
        for (width, bytes) in thumbnails {
            let path = FileStorage::derivative_path(&local_path, width);
            FileStorage::write(&path, &bytes).await?;
            written.push(path);
        }

        Ok(written)
    }
}

/// Polling consumer for the thumbnail queue.
pub struct ThumbnailWorker {
    queue: JobQueue,
    processor: ThumbnailProcessor,
    poll_interval: Duration,
}

impl ThumbnailWorker {
    pub fn new(queue: JobQueue, processor: ThumbnailProcessor, poll_interval: Duration) -> Self {
        Self {
            queue,
            processor,
            poll_interval,
        }
    }

    /// Claim and handle one job. Returns `false` when the queue was empty.
    pub async fn run_once(&self) -> Result<bool> {
        let Some(job) = self.queue.claim_next().await? else {
            return Ok(false);
        };

        match self.process_with_renewal(&job).await {
            Ok(paths) => {
                debug!("Job {} wrote {} thumbnails", job.id, paths.len());
                self.queue.complete(&job).await?;
            }
            Err(e) => {
                self.queue.fail(&job, &e.to_string()).await?;
            }
        }
        Ok(true)
    }

    /// Process `job` while renewing its claim at a third of the stall
    /// timeout.
    async fn process_with_renewal(
        &self,
        job: &ClaimedJob,
    ) -> std::result::Result<Vec<PathBuf>, JobError> {
        let period = (self.queue.stall_timeout() / 3).max(Duration::from_millis(1));
        let mut renew = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        let work = self.processor.process_job(job);
        tokio::pin!(work);

        loop {
            tokio::select! {
                result = &mut work => return result,
                _ = renew.tick() => match self.queue.extend(job).await {
                    Ok(true) => {}
                    Ok(false) => warn!("Job {} was claimed by another worker", job.id),
                    Err(e) => error!("Cannot renew claim on job {}: {}", job.id, e),
                },
            }
        }
    }

    /// Consume jobs until `shutdown` resolves.
    ///
    /// A job interrupted by shutdown stays active and is handed out again
    /// once its claim goes stale.
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!("Thumbnail worker listening on '{}'", self.queue.name());
        tokio::pin!(shutdown);

        loop {
            let idle = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                result = self.run_once() => match result {
                    Ok(processed) => !processed,
                    Err(e) => {
                        error!("Queue error: {}", e);
                        true
                    }
                },
            };

            if idle {
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
            }
        }

        info!("Thumbnail worker stopped");
        Ok(())
    }
}
