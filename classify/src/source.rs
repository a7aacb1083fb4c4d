use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, bail};
use tract_onnx::prelude::*;

/// Where an image, a label table or a model comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Path(PathBuf),
    Url(String),
}

impl Source {
    pub fn is_remote(&self) -> bool {
        matches!(self, Source::Url(_))
    }

    /// Reads the whole resource in memory. Remote resources are fetched with a blocking GET.
    pub fn fetch(&self) -> TractResult<Vec<u8>> {
        match self {
            Source::Path(path) => {
                std::fs::read(path).with_context(|| format!("Reading {}", path.display()))
            }
            Source::Url(url) => download(url),
        }
    }

    /// Last path segment, used as the cache file name.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Source::Path(p) => p.file_name().and_then(|s| s.to_str()),
            Source::Url(u) => {
                let u = u.split(['?', '#']).next().unwrap_or(u.as_str());
                u.rsplit('/').next().filter(|s| !s.is_empty() && !s.contains(':'))
            }
        }
    }
}

pub(crate) fn download(url: &str) -> TractResult<Vec<u8>> {
    debug!("GET {url}");
    let response = reqwest::blocking::get(url).with_context(|| format!("Fetching {url}"))?;
    if !response.status().is_success() {
        bail!("Fetching {url}: server answered {}", response.status())
    }
    let bytes = response.bytes().with_context(|| format!("Reading body of {url}"))?;
    debug!("GET {url}: {} bytes", bytes.len());
    Ok(bytes.to_vec())
}

impl FromStr for Source {
    type Err = TractError;

    fn from_str(s: &str) -> TractResult<Source> {
        let s = s.trim();
        if s.is_empty() {
            bail!("Empty resource location")
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(Source::Url(s.to_string()))
        } else if let Some(path) = s.strip_prefix("file://") {
            Ok(Source::Path(path.into()))
        } else {
            Ok(Source::Path(s.into()))
        }
    }
}

impl From<&Path> for Source {
    fn from(p: &Path) -> Source {
        Source::Path(p.to_path_buf())
    }
}

impl From<PathBuf> for Source {
    fn from(p: PathBuf) -> Source {
        Source::Path(p)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Source::Path(p) => write!(f, "{}", p.display()),
            Source::Url(u) => write!(f, "{u}"),
        }
    }
}
