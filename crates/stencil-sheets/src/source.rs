//! Where template bytes come from

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A template location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Template bytes already in memory
    Bytes(Vec<u8>),
    /// A file on disk
    Path(PathBuf),
    /// An `http://` or `https://` URL; fetching needs the `remote` feature
    Url(String),
}

impl TemplateSource {
    /// Interpret a command-line style location: URLs by scheme, anything
    /// else as a path
    pub fn parse(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            TemplateSource::Url(location.to_string())
        } else {
            TemplateSource::Path(PathBuf::from(location))
        }
    }

    /// Obtain the template bytes
    pub fn fetch(self) -> Result<Vec<u8>> {
        let bytes = match self {
            TemplateSource::Bytes(bytes) => bytes,
            TemplateSource::Path(path) => read_path(&path)?,
            TemplateSource::Url(url) => fetch_url(&url)?,
        };
        Ok(bytes)
    }
}

fn read_path(path: &Path) -> Result<Vec<u8>> {
    log::debug!("reading template {}", path.display());
    std::fs::read(path).map_err(|e| Error::Source {
        location: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(feature = "remote")]
fn fetch_url(url: &str) -> Result<Vec<u8>> {
    let fail = |reason: String| Error::Source {
        location: url.to_string(),
        reason,
    };

    log::debug!("fetching template {url}");
    let response = reqwest::blocking::get(url).map_err(|e| fail(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(fail(format!("HTTP {status}")));
    }
    let bytes = response.bytes().map_err(|e| fail(e.to_string()))?;
    Ok(bytes.to_vec())
}

#[cfg(not(feature = "remote"))]
fn fetch_url(url: &str) -> Result<Vec<u8>> {
    Err(Error::Source {
        location: url.to_string(),
        reason: "URL templates need the `remote` feature".into(),
    })
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateSource::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
            TemplateSource::Path(path) => write!(f, "{}", path.display()),
            TemplateSource::Url(url) => write!(f, "{url}"),
        }
    }
}

impl From<Vec<u8>> for TemplateSource {
    fn from(bytes: Vec<u8>) -> Self {
        TemplateSource::Bytes(bytes)
    }
}

impl From<&[u8]> for TemplateSource {
    fn from(bytes: &[u8]) -> Self {
        TemplateSource::Bytes(bytes.to_vec())
    }
}

impl From<PathBuf> for TemplateSource {
    fn from(path: PathBuf) -> Self {
        TemplateSource::Path(path)
    }
}

impl From<&Path> for TemplateSource {
    fn from(path: &Path) -> Self {
        TemplateSource::Path(path.to_path_buf())
    }
}

impl From<&str> for TemplateSource {
    fn from(location: &str) -> Self {
        TemplateSource::parse(location)
    }
}
