//! Genre reference profile loading.
//!
//! Profiles are TOML or JSON files named `<genre>.toml` / `<genre>.json`,
//! looked up in a caller-supplied directory or the XDG config directory
//! (`~/.config/mixscore/profiles/`). Loaded profiles are overlaid on the
//! built-in defaults so a partial genre file still scores every metric.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;

use crate::reference::ReferenceProfile;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("no profile found for genre '{0}'")]
    NotFound(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("unsupported profile extension: {0}")]
    UnsupportedExtension(PathBuf),
}

pub type Result<T> = std::result::Result<T, ProfileError>;

/// Default profile directory under the XDG config dir.
pub fn profiles_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", crate::APP_NAME).map(|dirs| dirs.config_dir().join("profiles"))
}

/// Normalize a genre name to its file stem: lowercased, spaces and dashes
/// collapsed to underscores ("Funk Mandela" → "funk_mandela").
pub fn normalize_genre_name(genre: &str) -> String {
    genre
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Load one profile file, dispatching on extension.
pub fn load_from_path(path: &Path) -> Result<ReferenceProfile> {
    let contents = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "toml" => toml::from_str(&contents).map_err(|e| ProfileError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
        "json" => serde_json::from_str(&contents).map_err(|e| ProfileError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
        _ => Err(ProfileError::UnsupportedExtension(path.to_path_buf())),
    }
}

/// Load a genre profile from `dir`, trying `<genre>.toml` then
/// `<genre>.json`, overlaid on the built-in defaults.
pub fn load_genre(dir: &Path, genre: &str) -> Result<ReferenceProfile> {
    let stem = normalize_genre_name(genre);
    for ext in ["toml", "json"] {
        let path = dir.join(format!("{stem}.{ext}"));
        if path.exists() {
            let mut profile = load_from_path(&path)?;
            if profile.name.is_none() {
                profile.name = Some(stem.clone());
            }
            log::info!("loaded genre profile from {}", path.display());
            return Ok(profile.merged_over(&ReferenceProfile::built_in()));
        }
    }
    Err(ProfileError::NotFound(stem))
}

/// Load a genre profile, falling back to the built-in defaults on any
/// failure. A broken profile file must degrade scoring targets, never
/// break scoring.
pub fn load_genre_or_default(dir: &Path, genre: &str) -> ReferenceProfile {
    match load_genre(dir, genre) {
        Ok(profile) => profile,
        Err(ProfileError::NotFound(stem)) => {
            log::debug!("no profile for '{stem}', using built-in defaults");
            ReferenceProfile::built_in()
        }
        Err(e) => {
            log::warn!("{e}. Using built-in defaults.");
            ReferenceProfile::built_in()
        }
    }
}
