//! Event types for the image load journal
//!
//! These types define the structure of records in the append-only load
//! journal. Each record includes:
//! - A monotonically increasing sequence number
//! - The kind of observation (load or unload)
//! - The image's path and base address as reported by the linker
//! - A wall-clock timestamp

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Placeholder rendered for images whose path the linker could not supply.
pub const UNKNOWN_IMAGE: &str = "<unknown>";

/// Whether an image was mapped into or removed from the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// The image was mapped into the process.
    Loaded,
    /// The image was removed from the process.
    Unloaded,
}

impl EventKind {
    /// Short label used in the one-line rendering of an event.
    pub fn label(self) -> &'static str {
        match self {
            EventKind::Loaded => "Added",
            EventKind::Unloaded => "Removed",
        }
    }
}

/// File-system identity of a dynamic image as reported by the linker.
///
/// The linker cannot always supply a path (`dladdr` can fail, and some
/// entries carry an empty name). Such observations are still recorded,
/// tagged `Unknown` rather than carrying an empty path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImagePath {
    /// Absolute path of the image as reported by the environment.
    Known(PathBuf),
    /// The environment could not supply a path.
    Unknown,
}

impl ImagePath {
    /// Wrap a path reported by the environment.
    pub fn known(path: impl Into<PathBuf>) -> Self {
        ImagePath::Known(path.into())
    }

    /// Whether a real path is present.
    pub fn is_known(&self) -> bool {
        matches!(self, ImagePath::Known(_))
    }

    /// The path, or the [`UNKNOWN_IMAGE`] placeholder.
    pub fn as_path(&self) -> &Path {
        match self {
            ImagePath::Known(p) => p.as_path(),
            ImagePath::Unknown => Path::new(UNKNOWN_IMAGE),
        }
    }

    /// Last path component, or the [`UNKNOWN_IMAGE`] placeholder.
    ///
    /// Returns the full placeholder for unknown images and falls back to
    /// the whole path when it has no final component.
    pub fn file_name(&self) -> &str {
        match self {
            ImagePath::Known(p) => p
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(UNKNOWN_IMAGE),
            ImagePath::Unknown => UNKNOWN_IMAGE,
        }
    }
}

impl fmt::Display for ImagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_path().display())
    }
}

impl From<PathBuf> for ImagePath {
    fn from(path: PathBuf) -> Self {
        ImagePath::Known(path)
    }
}

/// One observed image load or unload.
///
/// Events are immutable records in an append-only journal. The sequence
/// number is assigned at insertion time, is unique within a process run,
/// and doubles as a resumption cursor for incremental reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEvent {
    /// Sequence number (auto-assigned, monotonic and gap-free per run)
    pub sequence: u64,
    /// Load or unload
    pub kind: EventKind,
    /// Image identity as reported by the linker
    pub path: ImagePath,
    /// Base address the image is mapped at (opaque, never dereferenced)
    pub load_address: u64,
    /// Timestamp when the event was observed (milliseconds since epoch)
    pub timestamp: i64,
}

impl fmt::Display for ImageEvent {
    /// One-line rendering: `Added: libfoo.dylib: 0x10a2f4000 /usr/lib/libfoo.dylib`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {:#x} {}",
            self.kind.label(),
            self.path.file_name(),
            self.load_address,
            self.path
        )
    }
}

/// Get current timestamp in milliseconds
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}
