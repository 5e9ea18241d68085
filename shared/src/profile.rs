//! Static bootstrap configuration profile
//!
//! The profile is an Apple property list installed on every device right after
//! it authenticates. It is loaded once at startup and never changes afterwards;
//! the server treats its content as opaque bytes.

use bytes::Bytes;
use std::path::{Path, PathBuf};
use thiserror::Error;

static EMBEDDED_PROFILE: &[u8] = include_bytes!("../assets/bootstrap.mobileconfig");

/// Errors raised while loading a profile from disk
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Failed to read profile {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Profile {0} is empty")]
    Empty(PathBuf),

    #[error("Profile {0} is not a property list")]
    NotAPropertyList(PathBuf),
}

/// Where a loaded profile came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSource {
    Embedded,
    File(PathBuf),
}

/// Immutable bootstrap profile payload
#[derive(Debug, Clone)]
pub struct BootstrapProfile {
    payload: Bytes,
    source: ProfileSource,
}

impl BootstrapProfile {
    /// The profile shipped with the server
    pub fn embedded() -> Self {
        Self {
            payload: Bytes::from_static(EMBEDDED_PROFILE),
            source: ProfileSource::Embedded,
        }
    }

    /// Load a profile from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| ProfileError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if data.is_empty() {
            return Err(ProfileError::Empty(path.to_path_buf()));
        }
        if !looks_like_plist(&data) {
            return Err(ProfileError::NotAPropertyList(path.to_path_buf()));
        }

        Ok(Self {
            payload: Bytes::from(data),
            source: ProfileSource::File(path.to_path_buf()),
        })
    }

    /// Use the file at `path` if given, otherwise the embedded profile
    pub fn load(path: Option<&Path>) -> Result<Self, ProfileError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::embedded()),
        }
    }

    /// Profile bytes; cloning is a reference-count bump
    pub fn payload(&self) -> Bytes {
        self.payload.clone()
    }

    pub fn source(&self) -> &ProfileSource {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// XML plists carry a `<plist` root, binary plists start with `bplist`
fn looks_like_plist(data: &[u8]) -> bool {
    data.starts_with(b"bplist") || data.windows(6).any(|w| w == b"<plist")
}
