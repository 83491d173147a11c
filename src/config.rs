//! Abstraction over configuration details

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::Parser;

use crate::index::Eviction;

/// Serve pictures from a directory and a map-ready list of where they were taken
///
/// Every argument can also be given through the environment.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Config {
    /// directory holding the pictures (created if missing)
    #[arg(env = "PICTURES_DIRECTORY")]
    pub pictures_dir: PathBuf,

    /// address to listen on
    #[arg(long, env = "LISTEN_ADDRESS", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    /// seconds to wait between two scans of the pictures directory
    #[arg(
        long,
        env = "SCAN_INTERVAL_SECS",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub scan_interval_secs: u64,

    /// seconds an external tool may run before it is killed
    #[arg(
        long,
        env = "TOOL_TIMEOUT_SECS",
        default_value_t = 120,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub tool_timeout_secs: u64,

    /// program converting images to png, called as `<converter> <src> <dst>`
    #[arg(long, env = "PICTURES_CONVERTER", default_value = "convert")]
    pub converter: String,

    /// exiftool compatible program reading GPS positions
    #[arg(long, env = "PICTURES_EXTRACTOR", default_value = "exiftool")]
    pub extractor: String,

    /// forget pictures whose source file was removed
    #[arg(long, env = "EVICT_MISSING")]
    pub evict_missing: bool,
}

impl Config {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    pub fn eviction(&self) -> Eviction {
        if self.evict_missing {
            Eviction::DropMissing
        } else {
            Eviction::Retain
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_need_only_the_directory() {
        let config = Config::try_parse_from(["geopics", "/srv/pictures"]).unwrap();

        assert_eq!(config.pictures_dir, PathBuf::from("/srv/pictures"));
        assert_eq!(config.listen, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(config.scan_interval(), Duration::from_secs(60));
        assert_eq!(config.tool_timeout(), Duration::from_secs(120));
        assert_eq!(config.converter, "convert");
        assert_eq!(config.extractor, "exiftool");
        assert_eq!(config.eviction(), Eviction::Retain);
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "geopics",
            "--listen",
            "127.0.0.1:9000",
            "--scan-interval-secs",
            "5",
            "--converter",
            "magick",
            "--evict-missing",
            "pics",
        ])
        .unwrap();

        assert_eq!(config.listen.port(), 9000);
        assert_eq!(config.scan_interval(), Duration::from_secs(5));
        assert_eq!(config.converter, "magick");
        assert_eq!(config.eviction(), Eviction::DropMissing);
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(Config::try_parse_from(["geopics", "--scan-interval-secs", "0", "pics"]).is_err());
    }
}
