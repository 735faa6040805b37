//! Configuration extension for the player
//!
//! Adds the `player` and `catalog` sections to [`clrconfig::Config`].
//!
//! ```no_run
//! use clrconfig::get_config;
//! use clrplayer::PlayerConfigExt;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = get_config();
//! println!("Live stream: {}", config.get_live_stream_url()?);
//! println!("{} shows", config.get_catalog_shows()?.len());
//! # Ok(())
//! # }
//! ```

use crate::catalog::Show;
use anyhow::Result;
use clrconfig::Config;
use serde_yaml::{Number, Value};
use tracing::warn;

pub const DEFAULT_LIVE_STREAM_URL: &str = "https://streaming.live365.com/a91939";
pub const DEFAULT_PREPARE_LIVE_ON_START: bool = true;
pub const DEFAULT_SEEK_STEP_SECONDS: u64 = 15;
pub const DEFAULT_SEEK_HUD_MILLIS: u64 = 1500;
pub const DEFAULT_POSITION_REFRESH_MILLIS: u64 = 1000;

const LIVE_STREAM_URL_PATH: &[&str] = &["player", "live_stream_url"];
const PREPARE_LIVE_PATH: &[&str] = &["player", "prepare_live_on_start"];
const SEEK_STEP_PATH: &[&str] = &["player", "seek", "step_seconds"];
const SEEK_HUD_PATH: &[&str] = &["player", "seek", "hud_millis"];
const POSITION_REFRESH_PATH: &[&str] = &["player", "position_refresh_millis"];
const SHOWS_PATH: &[&str] = &["catalog", "shows"];

pub trait PlayerConfigExt {
    /// URL of the live stream
    fn get_live_stream_url(&self) -> Result<String>;
    fn set_live_stream_url(&self, url: &str) -> Result<()>;

    /// Arm the live stream (without starting it) when the player starts
    fn get_prepare_live_on_start(&self) -> Result<bool>;
    fn set_prepare_live_on_start(&self, enabled: bool) -> Result<()>;

    /// Step of the forward/backward seek buttons, in seconds (default: 15)
    fn get_seek_step_seconds(&self) -> Result<u64>;
    fn set_seek_step_seconds(&self, seconds: u64) -> Result<()>;

    /// How long the position readout stays visible after a seek (default: 1500ms)
    fn get_seek_hud_millis(&self) -> Result<u64>;
    fn set_seek_hud_millis(&self, millis: u64) -> Result<()>;

    /// Sampling interval of the published playback position (default: 1000ms)
    fn get_position_refresh_millis(&self) -> Result<u64>;
    fn set_position_refresh_millis(&self, millis: u64) -> Result<()>;

    /// On-demand show catalog
    fn get_catalog_shows(&self) -> Result<Vec<Show>>;
    fn set_catalog_shows(&self, shows: &[Show]) -> Result<()>;
}

fn get_positive_u64(config: &Config, path: &[&str], default: u64) -> Result<u64> {
    match config.get_value(path).ok().and_then(|v| v.as_u64()) {
        Some(value) if value > 0 => Ok(value),
        _ => {
            config.set_value(path, Value::Number(Number::from(default)))?;
            Ok(default)
        }
    }
}

impl PlayerConfigExt for Config {
    fn get_live_stream_url(&self) -> Result<String> {
        match self.get_value(LIVE_STREAM_URL_PATH) {
            Ok(Value::String(s)) if url::Url::parse(&s).is_ok() => Ok(s),
            _ => {
                self.set_live_stream_url(DEFAULT_LIVE_STREAM_URL)?;
                Ok(DEFAULT_LIVE_STREAM_URL.to_string())
            }
        }
    }

    fn set_live_stream_url(&self, url: &str) -> Result<()> {
        self.set_value(LIVE_STREAM_URL_PATH, Value::String(url.to_string()))
    }

    fn get_prepare_live_on_start(&self) -> Result<bool> {
        match self.get_value(PREPARE_LIVE_PATH) {
            Ok(Value::Bool(b)) => Ok(b),
            _ => {
                self.set_prepare_live_on_start(DEFAULT_PREPARE_LIVE_ON_START)?;
                Ok(DEFAULT_PREPARE_LIVE_ON_START)
            }
        }
    }

    fn set_prepare_live_on_start(&self, enabled: bool) -> Result<()> {
        self.set_value(PREPARE_LIVE_PATH, Value::Bool(enabled))
    }

    fn get_seek_step_seconds(&self) -> Result<u64> {
        get_positive_u64(self, SEEK_STEP_PATH, DEFAULT_SEEK_STEP_SECONDS)
    }

    fn set_seek_step_seconds(&self, seconds: u64) -> Result<()> {
        self.set_value(SEEK_STEP_PATH, Value::Number(Number::from(seconds)))
    }

    fn get_seek_hud_millis(&self) -> Result<u64> {
        get_positive_u64(self, SEEK_HUD_PATH, DEFAULT_SEEK_HUD_MILLIS)
    }

    fn set_seek_hud_millis(&self, millis: u64) -> Result<()> {
        self.set_value(SEEK_HUD_PATH, Value::Number(Number::from(millis)))
    }

    fn get_position_refresh_millis(&self) -> Result<u64> {
        get_positive_u64(self, POSITION_REFRESH_PATH, DEFAULT_POSITION_REFRESH_MILLIS)
    }

    fn set_position_refresh_millis(&self, millis: u64) -> Result<()> {
        self.set_value(POSITION_REFRESH_PATH, Value::Number(Number::from(millis)))
    }

    fn get_catalog_shows(&self) -> Result<Vec<Show>> {
        let value = match self.get_value(SHOWS_PATH) {
            Ok(value) => value,
            Err(_) => return Ok(Vec::new()),
        };

        match serde_yaml::from_value::<Vec<Show>>(value) {
            Ok(shows) => Ok(shows),
            Err(e) => {
                warn!("Invalid show catalog in configuration: {}", e);
                Ok(Vec::new())
            }
        }
    }

    fn set_catalog_shows(&self, shows: &[Show]) -> Result<()> {
        let value = serde_yaml::to_value(shows)?;
        self.set_value(SHOWS_PATH, value)
    }
}
