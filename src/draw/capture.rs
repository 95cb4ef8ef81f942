use crate::draw::composite::RgbaBuffer;
use crate::draw::model::BackgroundImage;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::{Duration, Instant};

pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(5);

/// Supplies the image the overlay is drawn over.
pub trait CaptureProvider {
    fn acquire_background(&self) -> PendingCapture;
}

pub enum CapturePoll {
    Pending(PendingCapture),
    Ready(Option<BackgroundImage>),
}

/// Single-shot capture result. Dropping it cancels delivery.
pub struct PendingCapture {
    state: PendingState,
    deadline: Instant,
}

enum PendingState {
    Resolved(Option<BackgroundImage>),
    Worker(Receiver<Option<BackgroundImage>>),
}

impl PendingCapture {
    pub fn ready(background: Option<BackgroundImage>) -> Self {
        Self {
            state: PendingState::Resolved(background),
            deadline: Instant::now(),
        }
    }

    /// Runs `job` on a worker thread; the result is dropped if it arrives
    /// after `timeout` or after this value is gone.
    pub fn spawn<F>(timeout: Duration, job: F) -> Self
    where
        F: FnOnce() -> Option<BackgroundImage> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let spawned = std::thread::Builder::new()
            .name("overlay-capture".into())
            .spawn(move || {
                let _ = tx.send(job());
            });
        match spawned {
            Ok(_) => Self {
                state: PendingState::Worker(rx),
                deadline: Instant::now() + timeout,
            },
            Err(err) => {
                tracing::warn!(?err, "failed to start capture worker");
                Self::ready(None)
            }
        }
    }

    pub fn poll(self, now: Instant) -> CapturePoll {
        match self.state {
            PendingState::Resolved(background) => CapturePoll::Ready(background),
            PendingState::Worker(rx) => match rx.try_recv() {
                Ok(background) => CapturePoll::Ready(background),
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("capture worker exited without a result");
                    CapturePoll::Ready(None)
                }
                Err(TryRecvError::Empty) if now >= self.deadline => {
                    tracing::warn!("background capture timed out");
                    CapturePoll::Ready(None)
                }
                Err(TryRecvError::Empty) => CapturePoll::Pending(Self {
                    state: PendingState::Worker(rx),
                    deadline: self.deadline,
                }),
            },
        }
    }
}

/// Desktop stand-in: there is never a background.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCapture;

impl CaptureProvider for NoCapture {
    fn acquire_background(&self) -> PendingCapture {
        PendingCapture::ready(None)
    }
}

/// Loads the background from an image file.
#[derive(Debug, Clone)]
pub struct FileCapture {
    path: PathBuf,
    timeout: Duration,
}

impl FileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timeout: DEFAULT_CAPTURE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl CaptureProvider for FileCapture {
    fn acquire_background(&self) -> PendingCapture {
        let path = self.path.clone();
        PendingCapture::spawn(self.timeout, move || match load_background(&path) {
            Ok(background) => {
                tracing::info!(path = %path.display(), "background capture loaded");
                Some(background)
            }
            Err(err) => {
                tracing::warn!(?err, "no background capture available");
                None
            }
        })
    }
}

pub fn load_background(path: &Path) -> Result<BackgroundImage> {
    let image = image::open(path)
        .with_context(|| format!("decode capture image {}", path.display()))?
        .to_rgba8();
    Ok(BackgroundImage {
        source: Some(path.to_path_buf()),
        pixels: RgbaBuffer::from_image(image),
    })
}
