use std::path::{Path, PathBuf};

use anyhow::Context;
use tract_onnx::prelude::*;

use crate::source::{Source, download};

pub fn cachedir() -> PathBuf {
    std::env::var("CACHEDIR").ok().unwrap_or_else(|| ".cached".to_string()).into()
}

/// 64-bit FNV-1a, identical across builds and platforms.
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf29ce484222325, |h, &b| (h ^ b as u64).wrapping_mul(0x100000001b3))
}

/// Cache file name for a URL: a short hash of the whole URL, then its last path segment.
pub fn cache_key(url: &str) -> String {
    let hash = fnv1a(url.as_bytes());
    let hash = (hash >> 32) as u32 ^ hash as u32;
    let source = Source::Url(url.to_string());
    let name = source.file_name().map(|s| s.to_string()).unwrap_or_else(|| {
        url.chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }).collect()
    });
    format!("{hash:08x}-{name}")
}

impl Source {
    /// Path the resource lands at in the cache, `None` for local files.
    pub fn cached_path(&self) -> Option<PathBuf> {
        self.cached_path_in(&cachedir())
    }

    pub fn cached_path_in(&self, dir: &Path) -> Option<PathBuf> {
        match self {
            Source::Path(_) => None,
            Source::Url(url) => Some(dir.join(cache_key(url))),
        }
    }

    /// Same as `fetch`, but remote resources are downloaded once and served from the cache
    /// directory afterwards.
    pub fn fetch_cached(&self) -> TractResult<Vec<u8>> {
        self.fetch_cached_in(&cachedir())
    }

    pub fn fetch_cached_in(&self, dir: &Path) -> TractResult<Vec<u8>> {
        let (Source::Url(url), Some(cached)) = (self, self.cached_path_in(dir)) else {
            return self.fetch();
        };
        if cached.exists() {
            debug!("Using cached {} for {self}", cached.display());
            return std::fs::read(&cached).with_context(|| format!("Reading {}", cached.display()));
        }
        let bytes = download(url)?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Creating cache directory {}", dir.display()))?;
        let partial = dir.join(format!("{}.partial", cache_key(url)));
        std::fs::write(&partial, &bytes)
            .with_context(|| format!("Writing {}", partial.display()))?;
        std::fs::rename(&partial, &cached)
            .with_context(|| format!("Moving {} to {}", partial.display(), cached.display()))?;
        info!("Cached {self} as {}", cached.display());
        Ok(bytes)
    }
}
