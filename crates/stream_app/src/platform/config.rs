use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stream_core::PagingConfig;
use stream_engine::{ApiSettings, ServiceConfig};
use stream_logging::stream_info;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// Contents of `stream.ron`. Every field may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub receiver_endpoint: Option<String>,
    pub api_endpoint: Option<String>,
    pub access_id: Option<String>,
    pub access_key: Option<String>,
    /// Base query every search is AND-combined with.
    pub api_query: Option<String>,
    pub site_url: String,
    /// Secret for signing job tokens and nonces; random per run when unset.
    pub token_secret: Option<String>,
    pub paging: PagingSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingSection {
    pub page_size: u64,
    pub poll_interval_ms: u64,
    pub bottom_threshold_rows: u64,
}

impl Default for PagingSection {
    fn default() -> Self {
        let defaults = PagingConfig::default();
        Self {
            page_size: defaults.page_size,
            poll_interval_ms: defaults.poll_interval.as_millis() as u64,
            bottom_threshold_rows: defaults.bottom_threshold_rows,
        }
    }
}

impl StreamConfig {
    /// Overrides file values with `STREAM_*` variables looked up via `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let optional = [
            ("STREAM_RECEIVER_ENDPOINT", &mut self.receiver_endpoint),
            ("STREAM_API_ENDPOINT", &mut self.api_endpoint),
            ("STREAM_ACCESS_ID", &mut self.access_id),
            ("STREAM_ACCESS_KEY", &mut self.access_key),
            ("STREAM_API_QUERY", &mut self.api_query),
            ("STREAM_TOKEN_SECRET", &mut self.token_secret),
        ];
        for (name, slot) in optional {
            if let Some(value) = lookup(name) {
                *slot = Some(value);
            }
        }
        if let Some(site_url) = lookup("STREAM_SITE_URL") {
            self.site_url = site_url;
        }
    }

    pub fn service(&self) -> ServiceConfig {
        ServiceConfig {
            receiver_endpoint: self.receiver_endpoint.clone(),
            api_endpoint: self.api_endpoint.clone(),
            access_id: self.access_id.clone(),
            access_key: self.access_key.clone(),
            base_query: self.api_query.clone(),
            site_url: self.site_url.clone(),
        }
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            page_size: self.page_size(),
            ..ApiSettings::default()
        }
    }

    pub fn paging_config(&self) -> PagingConfig {
        PagingConfig {
            page_size: self.page_size(),
            poll_interval: Duration::from_millis(self.paging.poll_interval_ms.max(1)),
            bottom_threshold_rows: self.paging.bottom_threshold_rows,
        }
    }

    pub fn token_secret(&self) -> Option<&[u8]> {
        self.token_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .map(str::as_bytes)
    }

    fn page_size(&self) -> u64 {
        self.paging.page_size.max(1)
    }
}

pub fn load_config(path: &Path) -> Result<StreamConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            stream_info!("No config at {:?}; using defaults", path);
            return Ok(StreamConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
