//! Configuration extension for artwork lookup
//!
//! Adds the `artwork` section accessors to [`clrconfig::Config`]. Getters
//! persist their default when the key is missing or has the wrong type.
//!
//! ```no_run
//! use clrconfig::get_config;
//! use clrartwork::ArtworkConfigExt;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = get_config();
//! if config.get_artwork_enabled()? {
//!     println!("Searching {}", config.get_artwork_search_url()?);
//! }
//! # Ok(())
//! # }
//! ```

use crate::client::{DEFAULT_ARTWORK_SIZE, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SEARCH_URL};
use anyhow::Result;
use clrconfig::Config;
use serde_yaml::{Number, Value};

const ENABLED_PATH: &[&str] = &["artwork", "enabled"];
const SEARCH_URL_PATH: &[&str] = &["artwork", "search_url"];
const TIMEOUT_PATH: &[&str] = &["artwork", "timeout_secs"];
const SIZE_PATH: &[&str] = &["artwork", "size"];

pub trait ArtworkConfigExt {
    /// Whether artwork lookups run at all (default: true)
    fn get_artwork_enabled(&self) -> Result<bool>;
    fn set_artwork_enabled(&self, enabled: bool) -> Result<()>;

    /// Song search endpoint
    fn get_artwork_search_url(&self) -> Result<String>;
    fn set_artwork_search_url(&self, url: &str) -> Result<()>;

    /// Timeout applied to each request, in seconds (default: 6)
    fn get_artwork_timeout_secs(&self) -> Result<u64>;
    fn set_artwork_timeout_secs(&self, secs: u64) -> Result<()>;

    /// Edge length requested for artwork (default: 600)
    fn get_artwork_size(&self) -> Result<u32>;
    fn set_artwork_size(&self, size: u32) -> Result<()>;
}

impl ArtworkConfigExt for Config {
    fn get_artwork_enabled(&self) -> Result<bool> {
        match self.get_value(ENABLED_PATH) {
            Ok(Value::Bool(b)) => Ok(b),
            _ => {
                self.set_artwork_enabled(true)?;
                Ok(true)
            }
        }
    }

    fn set_artwork_enabled(&self, enabled: bool) -> Result<()> {
        self.set_value(ENABLED_PATH, Value::Bool(enabled))
    }

    fn get_artwork_search_url(&self) -> Result<String> {
        match self.get_value(SEARCH_URL_PATH) {
            Ok(Value::String(s)) if !s.trim().is_empty() => Ok(s),
            _ => {
                self.set_artwork_search_url(DEFAULT_SEARCH_URL)?;
                Ok(DEFAULT_SEARCH_URL.to_string())
            }
        }
    }

    fn set_artwork_search_url(&self, url: &str) -> Result<()> {
        self.set_value(SEARCH_URL_PATH, Value::String(url.to_string()))
    }

    fn get_artwork_timeout_secs(&self) -> Result<u64> {
        match self.get_value(TIMEOUT_PATH).ok().and_then(|v| v.as_u64()) {
            Some(secs) if secs > 0 => Ok(secs),
            _ => {
                self.set_artwork_timeout_secs(DEFAULT_REQUEST_TIMEOUT_SECS)?;
                Ok(DEFAULT_REQUEST_TIMEOUT_SECS)
            }
        }
    }

    fn set_artwork_timeout_secs(&self, secs: u64) -> Result<()> {
        self.set_value(TIMEOUT_PATH, Value::Number(Number::from(secs)))
    }

    fn get_artwork_size(&self) -> Result<u32> {
        match self
            .get_value(SIZE_PATH)
            .ok()
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
        {
            Some(size) if size > 0 => Ok(size),
            _ => {
                self.set_artwork_size(DEFAULT_ARTWORK_SIZE)?;
                Ok(DEFAULT_ARTWORK_SIZE)
            }
        }
    }

    fn set_artwork_size(&self, size: u32) -> Result<()> {
        self.set_value(SIZE_PATH, Value::Number(Number::from(size)))
    }
}
