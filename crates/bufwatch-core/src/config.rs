#![forbid(unsafe_code)]

//! Session configuration.
//!
//! Defaults match the stock viewer: 400px canvases, 5px cells with a 1px gap,
//! 10px padding, and a 500ms dwell. [`Config::from_env`] overrides any of
//! them from `BUFWATCH_*` variables:
//!
//! | Variable | Meaning |
//! |---|---|
//! | `BUFWATCH_CANVAS_WIDTH` | surface width in px |
//! | `BUFWATCH_BLOCK_SIZE` | cell edge in px |
//! | `BUFWATCH_BLOCK_MARGIN` | gap after each cell in px |
//! | `BUFWATCH_PADDING` | grid inset in px |
//! | `BUFWATCH_DWELL_MS` | highlight dwell in ms |
//! | `BUFWATCH_COLOR_BACKGROUND` … `_NEUTRAL`, `_HIGHLIGHT`, `_HIT`, `_MISS` | hex colors |
//! | `BUFWATCH_LISTING_PATH` | relation listing endpoint |
//! | `BUFWATCH_STREAM_PATH` | trace stream endpoint |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::color::{Palette, Rgba};
use crate::decay::DEFAULT_DWELL;
use crate::grid::{GridGeometry, GridLayout, LayoutError};

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set to something unparseable.
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
    /// The dwell window is zero, so highlights would never be visible.
    ZeroDwell,
    /// The canvas width and layout cannot fit a single cell.
    Layout(LayoutError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue {
                key,
                value,
                expected,
            } => write!(f, "{key}={value:?} is invalid (expected {expected})"),
            Self::ZeroDwell => write!(f, "dwell must be longer than zero"),
            Self::Layout(err) => write!(f, "invalid grid layout: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Layout(err) => Some(err),
            _ => None,
        }
    }
}

/// Everything a [`Session`](crate::session::Session) needs to know up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Width hosts should give new surfaces.
    pub canvas_width: u32,
    pub layout: GridLayout,
    pub dwell: Duration,
    pub palette: Palette,
    /// Relation listing endpoint, relative to the page origin.
    pub listing_path: String,
    /// Trace stream endpoint, relative to the page origin.
    pub stream_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            canvas_width: 400,
            layout: GridLayout::default(),
            dwell: DEFAULT_DWELL,
            palette: Palette::default(),
            listing_path: "/api/relations".to_owned(),
            stream_path: "/ws".to_owned(),
        }
    }
}

impl Config {
    /// Defaults overridden from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden from `lookup`; the environment-free variant of
    /// [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(width) = parse_var(&lookup, "BUFWATCH_CANVAS_WIDTH", "a pixel count")? {
            config.canvas_width = width;
        }
        if let Some(size) = parse_var(&lookup, "BUFWATCH_BLOCK_SIZE", "a pixel count")? {
            config.layout.block_size = size;
        }
        if let Some(margin) = parse_var(&lookup, "BUFWATCH_BLOCK_MARGIN", "a pixel count")? {
            config.layout.block_margin = margin;
        }
        if let Some(padding) = parse_var(&lookup, "BUFWATCH_PADDING", "a pixel count")? {
            config.layout.padding = padding;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "BUFWATCH_DWELL_MS", "milliseconds")? {
            config.dwell = Duration::from_millis(ms);
        }

        let colors: [(&'static str, &mut Rgba); 5] = [
            ("BUFWATCH_COLOR_BACKGROUND", &mut config.palette.background),
            ("BUFWATCH_COLOR_NEUTRAL", &mut config.palette.neutral),
            ("BUFWATCH_COLOR_HIGHLIGHT", &mut config.palette.highlight),
            ("BUFWATCH_COLOR_HIT", &mut config.palette.hit),
            ("BUFWATCH_COLOR_MISS", &mut config.palette.miss),
        ];
        for (key, slot) in colors {
            if let Some(value) = lookup(key) {
                *slot = Rgba::parse_hex(&value).ok_or(ConfigError::InvalidValue {
                    key,
                    value,
                    expected: "a #rrggbb color",
                })?;
            }
        }

        if let Some(path) = lookup("BUFWATCH_LISTING_PATH") {
            config.listing_path = path;
        }
        if let Some(path) = lookup("BUFWATCH_STREAM_PATH") {
            config.stream_path = path;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot render anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dwell.is_zero() {
            return Err(ConfigError::ZeroDwell);
        }
        GridGeometry::compute(self.layout, 1, self.canvas_width).map_err(ConfigError::Layout)?;
        Ok(())
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(ConfigError::InvalidValue {
                key,
                value,
                expected,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.dwell, Duration::from_millis(500));
        assert_eq!(config.layout, GridLayout::new(5, 1, 10));
    }

    #[test]
    fn overrides_apply() {
        let config = Config::from_lookup(lookup_from(&[
            ("BUFWATCH_CANVAS_WIDTH", "800"),
            ("BUFWATCH_BLOCK_SIZE", " 7 "),
            ("BUFWATCH_PADDING", "0"),
            ("BUFWATCH_DWELL_MS", "250"),
            ("BUFWATCH_COLOR_MISS", "#ff0000"),
            ("BUFWATCH_STREAM_PATH", "/trace"),
        ]))
        .unwrap();
        assert_eq!(config.canvas_width, 800);
        assert_eq!(config.layout, GridLayout::new(7, 1, 0));
        assert_eq!(config.dwell, Duration::from_millis(250));
        assert_eq!(config.palette.miss, Rgba::rgb(255, 0, 0));
        assert_eq!(config.stream_path, "/trace");
        assert_eq!(config.listing_path, "/api/relations");
    }

    #[test]
    fn bad_numbers_name_the_variable() {
        let err = Config::from_lookup(lookup_from(&[("BUFWATCH_BLOCK_SIZE", "big")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "BUFWATCH_BLOCK_SIZE",
                ..
            }
        ));
        assert!(err.to_string().contains("BUFWATCH_BLOCK_SIZE"));
    }

    #[test]
    fn bad_color_rejected() {
        let err =
            Config::from_lookup(lookup_from(&[("BUFWATCH_COLOR_HIT", "green")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "BUFWATCH_COLOR_HIT", .. }));
    }

    #[test]
    fn degenerate_layout_rejected() {
        let err = Config::from_lookup(lookup_from(&[("BUFWATCH_CANVAS_WIDTH", "20")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Layout(LayoutError::SurfaceTooNarrow { .. })
        ));
        let err = Config::from_lookup(lookup_from(&[("BUFWATCH_DWELL_MS", "0")])).unwrap_err();
        assert_eq!(err, ConfigError::ZeroDwell);
    }
}
