use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::store::replace_file;

pub const CACHE_FILE: &str = "http_cache.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    stored_at: DateTime<Utc>,
    status: u16,
    body: String,
}

impl CacheEntry {
    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        // A negative age (clock went backwards) counts as stale.
        (now - self.stored_at)
            .to_std()
            .map(|age| age < ttl)
            .unwrap_or(false)
    }
}

/// Serves successful responses from a JSON file for `ttl` after they were fetched.
///
/// Entries are keyed by the full request URL. A cache that cannot be read or
/// written only costs a network round trip, so those failures are logged and
/// otherwise ignored.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    inner: T,
    path: PathBuf,
    ttl: Duration,
}

impl<T> Cached<T> {
    pub fn new(inner: T, path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            inner,
            path: path.into(),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> HashMap<String, CacheEntry> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), "Failed to read HTTP cache: {e}");
                return HashMap::new();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), "Discarding unreadable HTTP cache: {e}");
            HashMap::new()
        })
    }

    fn store(&self, key: String, response: &HttpResponse) {
        let now = Utc::now();
        let mut entries = self.load();
        entries.retain(|_, entry| entry.is_fresh(now, self.ttl));
        entries.insert(
            key,
            CacheEntry {
                stored_at: now,
                status: response.status,
                body: response.body.clone(),
            },
        );

        let result = replace_file(&self.path, |out| {
            serde_json::to_writer(out, &entries).map_err(std::io::Error::other)
        });
        if let Err(e) = result {
            warn!("Failed to write HTTP cache: {e}");
        }
    }
}

#[async_trait]
impl<T: Transport> Transport for Cached<T> {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let key = request.full_url()?.to_string();

        if let Some(entry) = self.load().remove(&key) {
            if entry.is_fresh(Utc::now(), self.ttl) {
                debug!(url = %request.url, stored_at = %entry.stored_at, "HTTP cache hit");
                return Ok(HttpResponse {
                    status: entry.status,
                    body: entry.body,
                });
            }
        }

        debug!(url = %request.url, "HTTP cache miss");
        let response = self.inner.get(request).await?;
        if response.is_success() {
            self.store(key, &response);
        }
        Ok(response)
    }
}
