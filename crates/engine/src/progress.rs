//! Live accounting of a multi-file transfer.
//!
//! Every download registers its file with a [`ProgressTracker`] before any
//! bytes move, then reports each chunk it receives. The tracker decides when
//! something is worth showing and hands a [`Frame`] to a [`ProgressSink`]:
//!
//! 1. nothing at all until [`ProgressPolicy::expected_batch_size`] files are
//!    registered (small pulls stay quiet),
//! 2. one [`Frame::Listing`] of the registered files,
//! 3. a [`Frame::Update`] whenever overall completion has advanced by at least
//!    [`ProgressPolicy::increment`] percent since the last one.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use treesync_model::{FileId, FileVersion};

/// Thresholds controlling when a [`ProgressTracker`] renders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressPolicy {
    pub expected_batch_size: usize,
    /// Percentage points.
    pub increment: f64,
}

impl Default for ProgressPolicy {
    fn default() -> Self {
        Self { expected_batch_size: 10, increment: 10.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileProgress {
    pub id: FileId,
    pub path: PathBuf,
    /// Unknown until the file completes when the remote reported no size.
    pub expected: Option<u64>,
    pub transferred: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Listing(Vec<FileProgress>),
    Update { percent: f64, transferred: u64, expected: u64 },
}

/// Receives the frames a [`ProgressTracker`] decided to show.
pub trait ProgressSink: Send + Sync {
    fn render(&self, frame: &Frame);
}

impl<F> ProgressSink for F
where
    F: Fn(&Frame) + Send + Sync,
{
    fn render(&self, frame: &Frame) {
        self(frame)
    }
}

/// Discards every frame.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn render(&self, _frame: &Frame) {}
}

/// Logs frames as `tracing` events.
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn render(&self, frame: &Frame) {
        match frame {
            Frame::Listing(files) => {
                tracing::info!(files = files.len(), "Downloading");
                for file in files {
                    tracing::info!(path = %file.path.display(), size = ?file.expected, "Queued");
                }
            },
            Frame::Update { percent, transferred, expected } => {
                tracing::info!(percent = format!("{percent:.0}"), transferred, expected, "Download progress");
            },
        }
    }
}

#[derive(Default)]
struct Totals {
    files: Vec<FileProgress>,
    index: HashMap<FileId, usize>,
    transferred: u64,
    listed: bool,
    last_reported: f64,
}

impl Totals {
    fn expected(&self) -> u64 {
        self.files.iter().map(|f| f.expected.unwrap_or(f.transferred)).sum()
    }

    fn percent(&self) -> f64 {
        match self.expected() {
            0 => 0.0,
            expected => (self.transferred as f64 * 100.0 / expected as f64).min(100.0),
        }
    }
}

/// Shared, lock-protected progress state for one transfer.
///
/// Safe to update from every concurrently running download; frames are
/// rendered after the lock is released.
pub struct ProgressTracker {
    policy: ProgressPolicy,
    sink: Box<dyn ProgressSink>,
    totals: Mutex<Totals>,
}

impl ProgressTracker {
    pub fn new(policy: ProgressPolicy, sink: impl ProgressSink + 'static) -> Self {
        Self { policy, sink: Box::new(sink), totals: Mutex::new(Totals::default()) }
    }

    /// A tracker that never renders anything.
    pub fn silent() -> Self {
        Self::new(ProgressPolicy::default(), NullSink)
    }

    /// Start tracking a file. Registering the same file twice is a no-op.
    pub fn register(&self, file: &FileVersion) {
        let frames = {
            let mut totals = self.totals.lock();
            if !totals.index.contains_key(&file.id()) {
                let position = totals.files.len();
                totals.index.insert(file.id(), position);
                totals.files.push(FileProgress {
                    id: file.id(),
                    path: file.target_path(),
                    expected: file.size,
                    transferred: 0,
                });
            }
            self.frames(&mut totals)
        };
        self.emit(frames);
    }

    /// Account for `bytes` more bytes of a registered file.
    pub fn advance(&self, id: FileId, bytes: u64) {
        let frames = {
            let mut totals = self.totals.lock();
            let Some(&position) = totals.index.get(&id) else {
                tracing::warn!(file = %id, "Progress reported for an unregistered file");
                return;
            };
            totals.files[position].transferred += bytes;
            totals.transferred += bytes;
            self.frames(&mut totals)
        };
        self.emit(frames);
    }

    /// Mark a file as complete; an unknown size becomes whatever was received.
    pub fn finish(&self, id: FileId) {
        let frames = {
            let mut totals = self.totals.lock();
            if let Some(&position) = totals.index.get(&id) {
                let file = &mut totals.files[position];
                file.expected.get_or_insert(file.transferred);
            }
            self.frames(&mut totals)
        };
        self.emit(frames);
    }

    pub fn percent(&self) -> f64 {
        self.totals.lock().percent()
    }

    pub fn snapshot(&self) -> Vec<FileProgress> {
        self.totals.lock().files.clone()
    }

    fn frames(&self, totals: &mut Totals) -> Vec<Frame> {
        let mut frames = Vec::new();
        if totals.files.len() < self.policy.expected_batch_size {
            return frames;
        }
        if !totals.listed {
            totals.listed = true;
            totals.last_reported = 0.0;
            frames.push(Frame::Listing(totals.files.clone()));
        }
        let percent = totals.percent();
        if percent - totals.last_reported >= self.policy.increment {
            totals.last_reported = percent;
            frames.push(Frame::Update { percent, transferred: totals.transferred, expected: totals.expected() });
        }
        frames
    }

    fn emit(&self, frames: Vec<Frame>) {
        for frame in &frames {
            self.sink.render(frame);
        }
    }
}
