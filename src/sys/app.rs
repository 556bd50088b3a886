//! Application metadata collaborators: packaged-app catalog lookup and
//! executable icon extraction.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Opaque handle to a host-owned icon image.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Icon(pub u64);

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IconSize {
    Small,
    #[default]
    Large,
}

#[derive(Debug, Clone)]
pub struct PackagedApp {
    pub display_name: String,
    pub icon: Option<Icon>,
}

/// Metadata lookups that resolve synchronously on the interactive thread.
pub trait AppCatalog: Send + Sync {
    /// Look up a packaged application by its user-model id.
    fn packaged_app(&self, aumid: &str, size: IconSize) -> Option<PackagedApp>;
    /// Description stored in an executable's version resource.
    fn file_description(&self, exe: &Path) -> Option<String>;
}

#[derive(thiserror::Error, Debug)]
pub enum IconError {
    #[error("no icon associated with {}", .0.display())]
    Missing(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Icon extraction runs on the icon work queue, never on the interactive
/// thread; see `actor::icons`.
pub trait IconExtractor: Send + Sync {
    fn associated_icon(&self, exe: &Path, size: IconSize) -> Result<Icon, IconError>;
}

/// Catalog stub for hosts without packaged-app support.
#[derive(Debug, Default)]
pub struct NullCatalog;

impl AppCatalog for NullCatalog {
    fn packaged_app(&self, _aumid: &str, _size: IconSize) -> Option<PackagedApp> {
        None
    }

    fn file_description(&self, _exe: &Path) -> Option<String> {
        None
    }
}

/// Extractor stub that fails every request, leaving icons unset.
#[derive(Debug, Default)]
pub struct NullIconExtractor;

impl IconExtractor for NullIconExtractor {
    fn associated_icon(&self, exe: &Path, _size: IconSize) -> Result<Icon, IconError> {
        Err(IconError::Missing(exe.to_path_buf()))
    }
}
