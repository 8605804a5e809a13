//! Configuration management for boox-import

use clap::ValueEnum;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::error::{AppError, Result};

/// Zotero's `libraryID` for the personal library
pub const LIBRARY_ID: i64 = 1;
/// `itemTypeID` of annotation items
pub const ANNOTATION_ITEM_TYPE_ID: i64 = 1;
/// `itemAnnotations.type` for highlights
pub const HIGHLIGHT_TYPE: i64 = 1;

/// Zotero item key alphabet (no 0, 1, I, O)
pub const ZOTERO_KEY_CHARS: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
pub const ZOTERO_KEY_LENGTH: usize = 8;

/// Book matches below this confidence need the user's confirmation
pub const CONFIDENCE_THRESHOLD: f64 = 0.9;

/// Zotero's highlight palette
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    #[default]
    Yellow,
    Red,
    Green,
    Blue,
    Purple,
    Magenta,
    Orange,
    Gray,
}

impl HighlightColor {
    pub fn hex(&self) -> &'static str {
        match self {
            HighlightColor::Yellow => "#ffd400",
            HighlightColor::Red => "#ff6666",
            HighlightColor::Green => "#5fb236",
            HighlightColor::Blue => "#2ea8e5",
            HighlightColor::Purple => "#a28ae5",
            HighlightColor::Magenta => "#e56eee",
            HighlightColor::Orange => "#f19837",
            HighlightColor::Gray => "#aaaaaa",
        }
    }
}

impl std::str::FromStr for HighlightColor {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        <HighlightColor as ValueEnum>::from_str(s, true)
            .map_err(|_| AppError::Config(format!("unknown highlight color '{}'", s)))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub zotero: ZoteroConfig,
    pub highlight_color: HighlightColor,
}

#[derive(Debug, Clone)]
pub struct ZoteroConfig {
    /// Directory holding `zotero.sqlite` and `storage/`
    pub data_dir: Option<PathBuf>,
    /// Base directory for linked (`attachments:`) files
    pub attachment_dir: Option<PathBuf>,
    pub library_id: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            zotero: ZoteroConfig {
                data_dir: None,
                attachment_dir: None,
                library_id: LIBRARY_ID,
            },
            highlight_color: HighlightColor::default(),
        }
    }
}

impl Config {
    /// Read overrides from the environment (after loading `.env`)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let library_id = match env::var("ZOTERO_LIBRARY_ID") {
            Ok(value) => value
                .parse()
                .map_err(|_| AppError::Config(format!("ZOTERO_LIBRARY_ID is not a number: {}", value)))?,
            Err(_) => LIBRARY_ID,
        };

        let highlight_color = match env::var("BOOX_HIGHLIGHT_COLOR") {
            Ok(value) => value.parse()?,
            Err(_) => HighlightColor::default(),
        };

        Ok(Config {
            zotero: ZoteroConfig {
                data_dir: env::var_os("ZOTERO_DATA_DIR").map(PathBuf::from),
                attachment_dir: env::var_os("ZOTERO_STORAGE_DIR").map(PathBuf::from),
                library_id,
            },
            highlight_color,
        })
    }
}

/// The user's home directory
pub fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
