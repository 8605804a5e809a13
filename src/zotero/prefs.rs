//! Zotero preferences and on-disk layout

use regex::Regex;
use std::path::{Path, PathBuf};

use crate::config::{home_dir, Config};

pub const DATA_DIR_PREF: &str = "extensions.zotero.dataDir";
pub const BASE_ATTACHMENT_PREF: &str = "extensions.zotero.baseAttachmentPath";

/// Values read from a profile's `prefs.js`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoteroPrefs {
    pub data_dir: Option<PathBuf>,
    pub base_attachment_path: Option<PathBuf>,
}

impl ZoteroPrefs {
    pub fn parse(content: &str) -> Self {
        Self {
            data_dir: read_pref(content, DATA_DIR_PREF).map(PathBuf::from),
            base_attachment_path: read_pref(content, BASE_ATTACHMENT_PREF).map(PathBuf::from),
        }
    }

    /// Load from the first profile under `profiles_dir`
    pub fn from_profiles_dir(profiles_dir: &Path) -> Option<Self> {
        let prefs_file = find_prefs_file(profiles_dir)?;
        match std::fs::read_to_string(&prefs_file) {
            Ok(content) => Some(Self::parse(&content)),
            Err(e) => {
                tracing::debug!("Could not read {}: {}", prefs_file.display(), e);
                None
            }
        }
    }

    /// Load from the platform's default profile location
    pub fn load() -> Option<Self> {
        let dir = profiles_dir()?;
        let prefs = Self::from_profiles_dir(&dir);
        if prefs.is_none() {
            tracing::debug!("No Zotero preferences found in {}", dir.display());
        }
        prefs
    }
}

/// Platform-specific Zotero profiles directory
pub fn profiles_dir() -> Option<PathBuf> {
    let home = home_dir()?;
    let dir = if cfg!(target_os = "macos") {
        home.join("Library/Application Support/Zotero/Profiles")
    } else if cfg!(target_os = "windows") {
        home.join("AppData/Roaming/Zotero/Profiles")
    } else {
        home.join(".zotero/zotero/Profiles")
    };
    Some(dir)
}

/// `<profiles>/<profile>/prefs.js` for the first profile, by name
pub fn find_prefs_file(profiles_dir: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(profiles_dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path().join("prefs.js"))
        .filter(|path| path.is_file())
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

/// Value of `user_pref("<key>", "<value>")` in a prefs.js body
pub fn read_pref(content: &str, key: &str) -> Option<String> {
    let pattern = format!(r#"user_pref\("{}",\s*"([^"]+)"\)"#, regex::escape(key));
    let re = Regex::new(&pattern).ok()?;
    re.captures(content).map(|caps| caps[1].to_string())
}

/// Resolved locations of the Zotero database and attachment files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoteroPaths {
    pub data_dir: PathBuf,
    /// Directory for linked (`attachments:`) files
    pub base_attachment_dir: PathBuf,
}

impl ZoteroPaths {
    /// Combine CLI override, environment config and preferences
    ///
    /// Data directory: `cli_dir`, then `ZOTERO_DATA_DIR`, then the
    /// `dataDir` preference, then `~/Zotero`. Linked-file base:
    /// `ZOTERO_STORAGE_DIR`, then `baseAttachmentPath`, then `<data>/storage`.
    pub fn resolve(cli_dir: Option<&Path>, config: &Config, prefs: Option<&ZoteroPrefs>) -> Self {
        let data_dir = cli_dir
            .map(Path::to_path_buf)
            .or_else(|| config.zotero.data_dir.clone())
            .or_else(|| prefs.and_then(|p| p.data_dir.clone()))
            .or_else(|| home_dir().map(|home| home.join("Zotero")))
            .unwrap_or_else(|| PathBuf::from("Zotero"));

        let base_attachment_dir = config
            .zotero
            .attachment_dir
            .clone()
            .or_else(|| prefs.and_then(|p| p.base_attachment_path.clone()))
            .unwrap_or_else(|| data_dir.join("storage"));

        Self {
            data_dir,
            base_attachment_dir,
        }
    }

    pub fn database(&self) -> PathBuf {
        self.data_dir.join("zotero.sqlite")
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join("storage")
    }

    /// File system path of an attachment's stored `path` value
    ///
    /// `storage:name` lives in the attachment item's own storage folder,
    /// `attachments:name` under the linked-file base directory; anything else
    /// is taken as a path already.
    pub fn attachment_file(&self, item_key: &str, stored_path: &str) -> PathBuf {
        if let Some(name) = stored_path.strip_prefix("storage:") {
            self.storage_dir().join(item_key).join(name)
        } else if let Some(name) = stored_path.strip_prefix("attachments:") {
            self.base_attachment_dir.join(name)
        } else {
            PathBuf::from(stored_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFS: &str = r#"// Mozilla User Preferences
user_pref("extensions.zotero.baseAttachmentPath", "/home/reader/drive/Zotero");
user_pref("extensions.zotero.dataDir", "/home/reader/Zotero");
user_pref("extensions.zotero.firstRun2", false);
"#;

    #[test]
    fn test_read_pref() {
        assert_eq!(
            read_pref(PREFS, DATA_DIR_PREF).as_deref(),
            Some("/home/reader/Zotero")
        );
        assert_eq!(read_pref(PREFS, "extensions.zotero.missing"), None);
        // Dots in the key are literal
        assert_eq!(read_pref(PREFS, "extensions-zotero-dataDir"), None);
    }

    #[test]
    fn test_prefs_from_profiles_dir() {
        let dir = tempfile::tempdir().unwrap();
        let profile = dir.path().join("abcd1234.default");
        std::fs::create_dir_all(&profile).unwrap();
        std::fs::write(profile.join("prefs.js"), PREFS).unwrap();
        std::fs::create_dir_all(dir.path().join("empty.profile")).unwrap();

        let prefs = ZoteroPrefs::from_profiles_dir(dir.path()).unwrap();
        assert_eq!(prefs.data_dir, Some(PathBuf::from("/home/reader/Zotero")));
        assert_eq!(
            prefs.base_attachment_path,
            Some(PathBuf::from("/home/reader/drive/Zotero"))
        );

        let missing = tempfile::tempdir().unwrap();
        assert!(ZoteroPrefs::from_profiles_dir(missing.path()).is_none());
    }

    #[test]
    fn test_resolve_paths_precedence() {
        let prefs = ZoteroPrefs::parse(PREFS);
        let mut config = Config::default();

        let paths = ZoteroPaths::resolve(Some(Path::new("/cli")), &config, Some(&prefs));
        assert_eq!(paths.data_dir, PathBuf::from("/cli"));
        assert_eq!(paths.database(), PathBuf::from("/cli/zotero.sqlite"));
        assert_eq!(paths.base_attachment_dir, PathBuf::from("/home/reader/drive/Zotero"));

        config.zotero.data_dir = Some(PathBuf::from("/env"));
        let paths = ZoteroPaths::resolve(None, &config, Some(&prefs));
        assert_eq!(paths.data_dir, PathBuf::from("/env"));

        let paths = ZoteroPaths::resolve(None, &Config::default(), Some(&prefs));
        assert_eq!(paths.data_dir, PathBuf::from("/home/reader/Zotero"));

        let paths = ZoteroPaths::resolve(Some(Path::new("/cli")), &Config::default(), None);
        assert_eq!(paths.base_attachment_dir, PathBuf::from("/cli/storage"));
    }

    #[test]
    fn test_attachment_file() {
        let paths = ZoteroPaths {
            data_dir: PathBuf::from("/z"),
            base_attachment_dir: PathBuf::from("/books"),
        };

        assert_eq!(
            paths.attachment_file("ABCD2345", "storage:Dune.epub"),
            PathBuf::from("/z/storage/ABCD2345/Dune.epub")
        );
        assert_eq!(
            paths.attachment_file("ABCD2345", "attachments:scifi/Dune.epub"),
            PathBuf::from("/books/scifi/Dune.epub")
        );
        assert_eq!(
            paths.attachment_file("ABCD2345", "/abs/Dune.epub"),
            PathBuf::from("/abs/Dune.epub")
        );
    }
}
