use log::{info, warn};
use std::{env, fmt::{Debug, Display}, net::SocketAddr, path::PathBuf, str::FromStr};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATA_DIR: &str = "database";

/// Server settings, read from the environment
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub data_dir: PathBuf,
}

impl Config {
    /// Load from `HACKBUDDY_ADDR` and `HACKBUDDY_DATA_DIR`
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load through an arbitrary lookup, falling back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            addr: try_load(
                &lookup,
                "HACKBUDDY_ADDR",
                SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            ),
            data_dir: try_load(
                &lookup,
                "HACKBUDDY_DATA_DIR",
                PathBuf::from(DEFAULT_DATA_DIR),
            ),
        }
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Debug,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        info!("{key} not set, using default: {default:?}");
        return default;
    };

    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default:?}");
        default
    })
}
