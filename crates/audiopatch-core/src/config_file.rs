use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ListOverride};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub parsing: Option<ParsingSection>,
    pub extraction: Option<ExtractionSection>,
    pub catalog: Option<CatalogSection>,
    pub storage: Option<StorageSection>,
    pub logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsingSection {
    /// Literal suffixes accepted after angle values (replaces the defaults).
    pub degree_suffixes: Option<Vec<String>>,
    pub directivity_keyword: Option<String>,
    pub header_type_words: Option<Vec<String>>,
    pub header_marker_words: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSection {
    /// Fraction of page height dropped from the bottom of each PDF page.
    /// Keeps page counters like `3/12` out of cabinet tables.
    pub footer_exclusion: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSection {
    /// Replaces the built-in bumper list.
    pub bumpers: Option<Vec<String>>,
    /// Appended to the (built-in or replaced) bumper list.
    pub extra_bumpers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageSection {
    pub database_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    /// `tracing-subscriber` filter directive, e.g. `info` or `audiopatch_store=debug`.
    pub level: Option<String>,
    pub file: Option<String>,
}

impl ConfigFile {
    /// Build the classification catalog described by the `[catalog]` section.
    pub fn catalog(&self) -> Catalog {
        let Some(section) = &self.catalog else {
            return Catalog::default();
        };
        let mut catalog = match &section.bumpers {
            Some(bumpers) => Catalog::with_bumpers(&ListOverride::Replace(bumpers.clone())),
            None => Catalog::default(),
        };
        if let Some(extra) = &section.extra_bumpers {
            catalog.bumpers.extend(extra.iter().cloned());
        }
        catalog
    }

    pub fn footer_exclusion(&self) -> Option<f32> {
        self.extraction.as_ref().and_then(|e| e.footer_exclusion)
    }

    pub fn database_path(&self) -> Option<PathBuf> {
        self.storage
            .as_ref()
            .and_then(|s| s.database_path.as_ref())
            .map(PathBuf::from)
    }
}

/// Platform config directory path: `<config_dir>/audiopatch/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("audiopatch").join("config.toml"))
}

/// Load config by cascading CWD `.audiopatch.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".audiopatch.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

fn pick<S, T: Clone>(
    overlay: &Option<S>,
    base: &Option<S>,
    field: impl Fn(&S) -> Option<T>,
) -> Option<T> {
    overlay
        .as_ref()
        .and_then(&field)
        .or_else(|| base.as_ref().and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        parsing: Some(ParsingSection {
            degree_suffixes: pick(&overlay.parsing, &base.parsing, |p| p.degree_suffixes.clone()),
            directivity_keyword: pick(&overlay.parsing, &base.parsing, |p| {
                p.directivity_keyword.clone()
            }),
            header_type_words: pick(&overlay.parsing, &base.parsing, |p| {
                p.header_type_words.clone()
            }),
            header_marker_words: pick(&overlay.parsing, &base.parsing, |p| {
                p.header_marker_words.clone()
            }),
        }),
        extraction: Some(ExtractionSection {
            footer_exclusion: pick(&overlay.extraction, &base.extraction, |e| e.footer_exclusion),
        }),
        catalog: Some(CatalogSection {
            bumpers: pick(&overlay.catalog, &base.catalog, |c| c.bumpers.clone()),
            extra_bumpers: pick(&overlay.catalog, &base.catalog, |c| c.extra_bumpers.clone()),
        }),
        storage: Some(StorageSection {
            database_path: pick(&overlay.storage, &base.storage, |s| s.database_path.clone()),
        }),
        logging: Some(LoggingSection {
            level: pick(&overlay.logging, &base.logging, |l| l.level.clone()),
            file: pick(&overlay.logging, &base.logging, |l| l.file.clone()),
        }),
    }
}
