//! Batch job configuration.
//!
//! Jobs are declared in a TOML file (default `portfolio.toml`). Each job pairs
//! one [`TransformPolicy`] with its sources, either an explicit list of
//! `{ id, input, output }` entries or a directory scan with a naming scheme.
//!
//! ## Config File
//!
//! ```toml
//! [defaults.encode]         # applied to jobs without their own [job.encode]
//! quality = 85
//! effort = 4
//!
//! [[job]]
//! id = "hero-thumbs"
//! archive = false           # move originals into originals/ after success
//! policy = { kind = "center_square", edge = 768 }
//! encode = { quality = 90, effort = 6 }
//!
//! [[job.entry]]
//! id = "portrait"
//! input = "photos/portrait/hero.webp"
//! output = "photos/hero-thumbs/portrait-hero.webp"
//!
//! [[job]]
//! id = "web-thumbs"
//! archive = true
//! policy = { kind = "max_dimension", limit = 512 }
//!
//! [job.scan]
//! input_dir = "interactive/web/thumbnails"
//! naming = { scheme = "slug" }   # or { scheme = "sequence", prefix = "astro" }
//! ```
//!
//! Relative paths resolve against the directory holding the config file.
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{EncodeParams, Effort, Geometry, Quality, TransformPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "portfolio.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default, rename = "job")]
    pub jobs: Vec<JobConfig>,
}

/// Values inherited by every job that doesn't override them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Defaults {
    pub encode: EncodeParams,
}

/// One batch job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Identifier used by `run --job`.
    pub id: String,
    /// Move each successfully processed original into an `originals/` folder.
    #[serde(default)]
    pub archive: bool,
    pub policy: Geometry,
    /// Overrides `[defaults.encode]` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encode: Option<EncodeParams>,
    #[serde(default, rename = "entry", skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<EntryConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan: Option<ScanConfig>,
}

impl JobConfig {
    /// The effective policy once defaults are applied.
    pub fn policy(&self, defaults: &Defaults) -> TransformPolicy {
        TransformPolicy {
            geometry: self.policy,
            encode: self.encode.unwrap_or(defaults.encode),
        }
    }
}

/// An explicit `(input, output)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryConfig {
    pub id: String,
    pub input: PathBuf,
    pub output: PathBuf,
}

/// A directory whose supported images are all processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    pub input_dir: PathBuf,
    /// Defaults to `input_dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    /// Defaults to `<output_dir>/originals`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub originals_dir: Option<PathBuf>,
    pub naming: Naming,
}

/// How scanned sources are named on output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case", deny_unknown_fields)]
pub enum Naming {
    /// `<slug of source stem>.webp`
    Slug,
    /// `<prefix>-NN.webp`, continuing after the highest existing index.
    Sequence { prefix: String },
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs.is_empty() {
            return Err(ConfigError::Validation(
                "config must declare at least one [[job]]".into(),
            ));
        }
        validate_encode("defaults.encode", &self.defaults.encode)?;

        let mut ids = HashSet::new();
        for job in &self.jobs {
            if job.id.trim().is_empty() {
                return Err(ConfigError::Validation("job id must not be empty".into()));
            }
            if !ids.insert(job.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate job id '{}'",
                    job.id
                )));
            }
            job.validate()?;
        }
        Ok(())
    }

    /// Pick jobs by id, in config order. An empty selection means all jobs.
    pub fn select_jobs(&self, ids: &[String]) -> Result<Vec<&JobConfig>, ConfigError> {
        if let Some(unknown) = ids.iter().find(|id| !self.jobs.iter().any(|j| &j.id == *id)) {
            let known: Vec<&str> = self.jobs.iter().map(|j| j.id.as_str()).collect();
            return Err(ConfigError::Validation(format!(
                "unknown job '{unknown}' (known: {})",
                known.join(", ")
            )));
        }
        Ok(self
            .jobs
            .iter()
            .filter(|j| ids.is_empty() || ids.contains(&j.id))
            .collect())
    }
}

impl JobConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: String| Err(ConfigError::Validation(format!("job '{}': {msg}", self.id)));

        match self.policy {
            Geometry::CenterSquare { edge: 0 } => return fail("policy.edge must be non-zero".into()),
            Geometry::MaxDimension { limit: 0 } => {
                return fail("policy.limit must be non-zero".into());
            }
            _ => {}
        }
        if let Some(encode) = &self.encode {
            validate_encode(&format!("job '{}' encode", self.id), encode)?;
        }
        if self.entries.is_empty() && self.scan.is_none() {
            return fail("needs at least one [[job.entry]] or a [job.scan]".into());
        }

        let mut entry_ids = HashSet::new();
        for entry in &self.entries {
            if !entry_ids.insert(entry.id.as_str()) {
                return fail(format!("duplicate entry id '{}'", entry.id));
            }
            if entry.input.as_os_str().is_empty() || entry.output.as_os_str().is_empty() {
                return fail(format!("entry '{}' needs both input and output", entry.id));
            }
        }

        if let Some(ScanConfig {
            naming: Naming::Sequence { prefix },
            ..
        }) = &self.scan
            && prefix.trim().is_empty()
        {
            return fail("scan.naming.prefix must not be empty".into());
        }
        Ok(())
    }
}

fn validate_encode(context: &str, encode: &EncodeParams) -> Result<(), ConfigError> {
    if encode.quality.value() > Quality::MAX {
        return Err(ConfigError::Validation(format!(
            "{context}: quality must be 0-{}",
            Quality::MAX
        )));
    }
    if encode.effort.value() > Effort::MAX {
        return Err(ConfigError::Validation(format!(
            "{context}: effort must be 0-{}",
            Effort::MAX
        )));
    }
    Ok(())
}

/// Parse and validate config text.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Directory that relative paths in `config_path` resolve against.
pub fn base_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Returns a fully-commented stock `portfolio.toml` covering every asset
/// folder of the portfolio site.
///
/// Used by the `gen-config` CLI command. Paths are relative to `src/assets/`.
pub fn stock_config_toml() -> &'static str {
    r##"# Portfolio image jobs
# ====================
# Place this file in src/assets/ and run `portfolio-images run`.
# Relative paths resolve against the directory holding this file.
#
# policy.kind:
#   center_square  largest centered square, resized to edge x edge
#   max_dimension  longer side capped at limit, never upscaled
# encode.quality   0-100 (higher = larger, more faithful)
# encode.effort    0-6   (WebP compression method, 6 = smallest files)

[defaults.encode]
quality = 85
effort = 4

# ---------------------------------------------------------------------------
# Photo collections: new photos dropped in <collection>/import/ are resized
# to 1920px, numbered <collection>-NN.webp, and their originals moved to
# <collection>/originals/. A file named hero.* becomes hero.webp and also
# the collection's first gallery image.
# ---------------------------------------------------------------------------
[[job]]
id = "photos-portrait"
archive = true
policy = { kind = "max_dimension", limit = 1920 }
[job.scan]
input_dir = "photos/portrait/import"
output_dir = "photos/portrait"
naming = { scheme = "sequence", prefix = "portrait" }

[[job]]
id = "photos-aberrant"
archive = true
policy = { kind = "max_dimension", limit = 1920 }
[job.scan]
input_dir = "photos/aberrant/import"
output_dir = "photos/aberrant"
naming = { scheme = "sequence", prefix = "aberrant" }

[[job]]
id = "photos-performance"
archive = true
policy = { kind = "max_dimension", limit = 1920 }
[job.scan]
input_dir = "photos/performance/import"
output_dir = "photos/performance"
naming = { scheme = "sequence", prefix = "performance" }

[[job]]
id = "photos-astro"
archive = true
policy = { kind = "max_dimension", limit = 1920 }
[job.scan]
input_dir = "photos/astro/import"
output_dir = "photos/astro"
naming = { scheme = "sequence", prefix = "astro" }

# ---------------------------------------------------------------------------
# Collection overview cards: 768px square crops of each hero image.
# ---------------------------------------------------------------------------
[[job]]
id = "hero-thumbs"
policy = { kind = "center_square", edge = 768 }
encode = { quality = 90, effort = 6 }

[[job.entry]]
id = "portrait"
input = "photos/portrait/hero.webp"
output = "photos/hero-thumbs/portrait-hero.webp"

[[job.entry]]
id = "aberrant"
input = "photos/aberrant/hero.webp"
output = "photos/hero-thumbs/aberrant-hero.webp"

[[job.entry]]
id = "performance"
input = "photos/performance/hero.webp"
output = "photos/hero-thumbs/performance-hero.webp"

[[job.entry]]
id = "astro"
input = "photos/astro/hero.webp"
output = "photos/hero-thumbs/astro-hero.webp"

# ---------------------------------------------------------------------------
# Web experience thumbnails: every image in the folder capped at 512px,
# renamed to a slug, originals moved to originals/.
# ---------------------------------------------------------------------------
[[job]]
id = "web-thumbs"
archive = true
policy = { kind = "max_dimension", limit = 512 }
[job.scan]
input_dir = "interactive/web/thumbnails"
naming = { scheme = "slug" }

# ---------------------------------------------------------------------------
# Live project hover previews: 256px squares from each gallery's first
# image or video frame.
# ---------------------------------------------------------------------------
[[job]]
id = "preview-thumbs"
policy = { kind = "center_square", edge = 256 }
encode = { quality = 85, effort = 6 }

[[job.entry]]
id = "sketching-flock"
input = "interactive/live/sketching-flock/thumbnails/IMG_6871_optimized_thumb.jpg"
output = "interactive/live/preview-thumbs/sketching-flock.webp"

[[job.entry]]
id = "we-play"
input = "interactive/live/we-play/thumbnails/IMG_7210_optimized_thumb.jpg"
output = "interactive/live/preview-thumbs/we-play.webp"

[[job.entry]]
id = "blind-spots"
input = "interactive/live/blind-spots/bs-6313.webp"
output = "interactive/live/preview-thumbs/blind-spots.webp"

[[job.entry]]
id = "the-reader"
input = "interactive/live/the-reader/thumbnails/the-reader-video_optimized_thumb.jpg"
output = "interactive/live/preview-thumbs/the-reader.webp"

[[job.entry]]
id = "long-winter-13-1"
input = "interactive/live/lw-13-1/thumbnails/LW13-1_comp_optimized_thumb.jpg"
output = "interactive/live/preview-thumbs/long-winter-13-1.webp"

[[job.entry]]
id = "game-set-match"
input = "interactive/live/game-set-match/IMG_2943.webp"
output = "interactive/live/preview-thumbs/game-set-match.webp"

[[job.entry]]
id = "live-coding"
input = "interactive/live/live-coding/thumbnails/IMG_2870_optimized_thumb.jpg"
output = "interactive/live/preview-thumbs/live-coding.webp"

[[job.entry]]
id = "bird-conductor"
input = "interactive/live/bird-conductor/thumbnails/IMG_1681_optimized_thumb.jpg"
output = "interactive/live/preview-thumbs/bird-conductor.webp"

[[job.entry]]
id = "surveil-yourself"
input = "interactive/live/surveil-yourself/thumbnails/IMG_0288_optimized_thumb.jpg"
output = "interactive/live/preview-thumbs/surveil-yourself.webp"
"##
}
