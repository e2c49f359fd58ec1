//! Runtime configuration from environment variables.
//!
//! | Variable                   | Default             |
//! |----------------------------|---------------------|
//! | `MEISHU_PORT`              | 3000                |
//! | `MEISHU_MAX_UPLOAD_MB`     | 50                  |
//! | `MEISHU_MARKERS`           | `Ty1,Ty2,Ty3,Tm-2a` |
//! | `MEISHU_PREVIEW_ROWS`      | 10                  |
//! | `MEISHU_PLANTS_PER_MARKER` | 3                   |
//!
//! `.env` is loaded by the binary before [`Config::from_env`] runs. Values that
//! do not parse are reported and replaced by the default.

use std::str::FromStr;

use crate::api::logs::log_warning;
use crate::transform::{default_markers, ToolOptions, DEFAULT_PLANTS_PER_MARKER, DEFAULT_PREVIEW_ROWS};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_UPLOAD_MB: usize = 50;

const BYTES_PER_MB: usize = 1024 * 1024;

const PORT_VAR: &str = "MEISHU_PORT";
const MAX_UPLOAD_VAR: &str = "MEISHU_MAX_UPLOAD_MB";
const MARKERS_VAR: &str = "MEISHU_MARKERS";
const PREVIEW_ROWS_VAR: &str = "MEISHU_PREVIEW_ROWS";
const PLANTS_PER_MARKER_VAR: &str = "MEISHU_PLANTS_PER_MARKER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub max_upload_bytes: usize,
    pub markers: Vec<String>,
    pub preview_rows: usize,
    pub plants_per_marker: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * BYTES_PER_MB,
            markers: default_markers(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
            plants_per_marker: DEFAULT_PLANTS_PER_MARKER,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let markers = lookup(MARKERS_VAR)
            .map(|raw| parse_marker_list(&raw))
            .filter(|m| !m.is_empty())
            .unwrap_or(defaults.markers);

        Self {
            port: parse_var(&lookup, PORT_VAR, defaults.port),
            max_upload_bytes: megabytes(parse_var(&lookup, MAX_UPLOAD_VAR, DEFAULT_MAX_UPLOAD_MB)),
            markers,
            preview_rows: parse_var(&lookup, PREVIEW_ROWS_VAR, defaults.preview_rows),
            plants_per_marker: parse_var(&lookup, PLANTS_PER_MARKER_VAR, defaults.plants_per_marker),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Tool options seeded from this configuration.
    pub fn tool_options(&self) -> ToolOptions {
        ToolOptions {
            markers: self.markers.clone(),
            plants_per_marker: self.plants_per_marker,
            preview_rows: self.preview_rows,
            ..ToolOptions::default()
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                log_warning(format!("{}='{}' is not valid, using the default", key, raw));
                default
            }
        },
    }
}

fn megabytes(mb: usize) -> usize {
    mb.checked_mul(BYTES_PER_MB).unwrap_or_else(|| {
        log_warning(format!("{}={} is too large, using the default", MAX_UPLOAD_VAR, mb));
        DEFAULT_MAX_UPLOAD_MB * BYTES_PER_MB
    })
}

/// Split a comma-separated marker list, dropping blanks.
pub fn parse_marker_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config, Config::default());
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
        assert_eq!(config.markers, vec!["Ty1", "Ty2", "Ty3", "Tm-2a"]);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("MEISHU_PORT", "8080"),
            ("MEISHU_MAX_UPLOAD_MB", "5"),
            ("MEISHU_MARKERS", " Ty1 , Sw-5,,"),
            ("MEISHU_PREVIEW_ROWS", "25"),
            ("MEISHU_PLANTS_PER_MARKER", "4"),
        ]));

        assert_eq!(config.port, 8080);
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.markers, vec!["Ty1", "Sw-5"]);
        assert_eq!(config.preview_rows, 25);
        assert_eq!(config.plants_per_marker, 4);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = Config::from_lookup(lookup(&[
            ("MEISHU_PORT", "http"),
            ("MEISHU_MARKERS", " , "),
        ]));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.markers, default_markers());
    }

    #[test]
    fn test_oversized_upload_limit_falls_back() {
        let huge = usize::MAX.to_string();
        let config = Config::from_lookup(lookup(&[("MEISHU_MAX_UPLOAD_MB", huge.as_str())]));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_MB * 1024 * 1024);
    }

    #[test]
    fn test_tool_options() {
        let config = Config {
            markers: vec!["Mi-1".into()],
            plants_per_marker: 5,
            ..Config::default()
        };
        let opts = config.tool_options();
        assert_eq!(opts.markers, vec!["Mi-1"]);
        assert_eq!(opts.plants_per_marker, 5);
        assert_eq!(opts.id_column, "sow.nr");
    }
}
