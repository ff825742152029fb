//! Turning job configuration into concrete batch items.
//!
//! Explicit entries map one-to-one onto [`BatchItem`]s. A `[job.scan]` lists
//! the supported images directly inside `input_dir` and names their outputs:
//!
//! ```text
//! photos/astro/                    naming = { scheme = "sequence", prefix = "astro" }
//! ├── import/
//! │   ├── hero.jpg                 → hero.webp + astro-01.webp
//! │   ├── DSC_0042.jpg             → astro-04.webp
//! │   └── DSC_0043.tif             → astro-05.webp
//! ├── astro-02.webp                (existing, highest index = 3)
//! ├── astro-03.webp
//! └── originals/                   ← sources are moved here after success
//!
//! interactive/web/thumbnails/      naming = { scheme = "slug" }
//! ├── Flow Fields.PNG              → flow-fields.webp (same folder)
//! └── flow-fields.webp             (our own output: skipped via the ledger)
//! ```
//!
//! When `run` plans a job, a missing `input_dir` is created so the import
//! folder is ready for the next run. `check` only reports it.

use crate::batch::{BatchItem, JobPlan};
use crate::config::{Defaults, JobConfig, Naming, ScanConfig};
use crate::imaging::is_supported_input;
use crate::ledger::{self, Ledger};
use crate::naming;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Folder name archived originals are moved into by default.
pub const ORIGINALS_DIR: &str = "originals";

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    fn io(path: &Path, source: io::Error) -> Self {
        ScanError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Build the execution plan for one job.
///
/// Relative paths in `job` are resolved against `base`. With `bootstrap`
/// set, a missing scan `input_dir` is created; otherwise it is only noted.
pub fn plan_job(
    job: &JobConfig,
    defaults: &Defaults,
    base: &Path,
    ledger: &Ledger,
    bootstrap: bool,
) -> Result<JobPlan, ScanError> {
    let policy = job.policy(defaults);
    let ext = policy.encode.format.extension();
    let mut notes = Vec::new();

    let mut items: Vec<BatchItem> = job
        .entries
        .iter()
        .map(|entry| {
            let input = base.join(&entry.input);
            let archive_to = job
                .archive
                .then(|| input.parent().unwrap_or(base).join(ORIGINALS_DIR));
            BatchItem {
                id: entry.id.clone(),
                outputs: vec![base.join(&entry.output)],
                input,
                archive_to,
            }
        })
        .collect();

    if let Some(scan) = &job.scan {
        items.extend(plan_scan(
            scan, job.archive, ext, base, ledger, bootstrap, &mut notes,
        )?);
    }

    Ok(JobPlan {
        id: job.id.clone(),
        policy,
        items,
        notes,
    })
}

fn plan_scan(
    scan: &ScanConfig,
    archive: bool,
    ext: &str,
    base: &Path,
    ledger: &Ledger,
    bootstrap: bool,
    notes: &mut Vec<String>,
) -> Result<Vec<BatchItem>, ScanError> {
    let input_dir = base.join(&scan.input_dir);
    let output_dir = scan
        .output_dir
        .as_ref()
        .map_or_else(|| input_dir.clone(), |d| base.join(d));
    let originals_dir = scan
        .originals_dir
        .as_ref()
        .map_or_else(|| output_dir.join(ORIGINALS_DIR), |d| base.join(d));

    if !input_dir.exists() && !bootstrap {
        notes.push(format!("{} does not exist yet", input_dir.display()));
        return Ok(Vec::new());
    }
    if !input_dir.exists() {
        fs::create_dir_all(&input_dir).map_err(|e| ScanError::io(&input_dir, e))?;
        log::info!("created missing input directory {}", input_dir.display());
        notes.push(format!("created {} (empty)", input_dir.display()));
        return Ok(Vec::new());
    }

    let candidates = list_candidates(&input_dir, ledger, notes);
    if candidates.is_empty() {
        notes.push(format!("no new images in {}", input_dir.display()));
        return Ok(Vec::new());
    }

    let mut items = match &scan.naming {
        Naming::Slug => plan_slug(&candidates, &output_dir, ext),
        Naming::Sequence { prefix } => {
            plan_sequence(&candidates, &output_dir, prefix, ext, notes)?
        }
    };
    if archive {
        for item in &mut items {
            item.archive_to = Some(originals_dir.clone());
        }
    }
    Ok(resolve_conflicts(items, &candidates, notes))
}

/// Supported, non-hidden files directly inside `dir`, sorted by name, minus
/// anything the ledger knows as our own output.
///
/// A file that cannot be read is left out with a note; it never fails the job.
pub fn list_candidates(dir: &Path, ledger: &Ledger, notes: &mut Vec<String>) -> Vec<PathBuf> {
    list_candidates_with(dir, ledger, notes, ledger::hash_file)
}

fn list_candidates_with(
    dir: &Path,
    ledger: &Ledger,
    notes: &mut Vec<String>,
    hash: impl Fn(&Path) -> io::Result<String>,
) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    let mut own_outputs = 0usize;

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(dir).to_path_buf();
                unreadable(&path, &err, notes);
                continue;
            }
        };
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden || !entry.file_type().is_file() || !is_supported_input(path) {
            continue;
        }
        let hash = match hash(path) {
            Ok(hash) => hash,
            Err(err) => {
                unreadable(path, &err, notes);
                continue;
            }
        };
        if ledger.is_output(&hash) {
            log::debug!("skipping {}: produced by an earlier run", path.display());
            own_outputs += 1;
            continue;
        }
        candidates.push(path.to_path_buf());
    }

    if own_outputs > 0 {
        notes.push(format!(
            "skipped {own_outputs} previously generated file(s) in {}",
            dir.display()
        ));
    }
    candidates
}

fn unreadable(path: &Path, err: &dyn std::fmt::Display, notes: &mut Vec<String>) {
    log::warn!("could not read {}: {err}", path.display());
    notes.push(format!("skipping {}: could not read it ({err})", path.display()));
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn stem(file_name: &str) -> &str {
    file_name.rsplit_once('.').map_or(file_name, |(s, _)| s)
}

/// `output_dir/<slug>.<ext>` for every candidate.
pub fn plan_slug(candidates: &[PathBuf], output_dir: &Path, ext: &str) -> Vec<BatchItem> {
    candidates
        .iter()
        .map(|input| {
            let out_name = naming::slug_filename(&file_name(input), ext);
            BatchItem {
                id: stem(&out_name).to_string(),
                input: input.clone(),
                outputs: vec![output_dir.join(&out_name)],
                archive_to: None,
            }
        })
        .collect()
}

/// Drop items whose writes would destroy a source, and note shared outputs.
///
/// An item is dropped when one of its outputs is another candidate's input,
/// or when it re-encodes in place without an archive folder to move the
/// original into. Of the remaining items, a later one writing the same output
/// as an earlier one replaces its result.
pub fn resolve_conflicts(
    items: Vec<BatchItem>,
    candidates: &[PathBuf],
    notes: &mut Vec<String>,
) -> Vec<BatchItem> {
    let sources: HashSet<&Path> = candidates.iter().map(PathBuf::as_path).collect();
    let mut claimed: HashMap<PathBuf, String> = HashMap::new();
    let mut kept = Vec::with_capacity(items.len());

    for item in items {
        let name = file_name(&item.input);
        if let Some(hit) = item
            .outputs
            .iter()
            .find(|o| **o != item.input && sources.contains(o.as_path()))
        {
            notes.push(format!(
                "skipping {name}: its output {} is another source here; rename one of them",
                file_name(hit)
            ));
            continue;
        }
        if item.archive_to.is_none() && item.outputs.contains(&item.input) {
            notes.push(format!(
                "skipping {name}: re-encoding in place would overwrite the only copy \
                 (set archive = true)"
            ));
            continue;
        }
        for output in &item.outputs {
            if let Some(previous) = claimed.insert(output.clone(), name.clone()) {
                notes.push(format!(
                    "{previous} and {name} both map to {}; {name} wins",
                    file_name(output)
                ));
            }
        }
        kept.push(item);
    }
    kept
}

/// One past the highest `<prefix>-NN.<ext>` in `output_dir`, or 1.
pub fn next_sequence_index(output_dir: &Path, prefix: &str, ext: &str) -> Result<u32, ScanError> {
    if !output_dir.is_dir() {
        return Ok(1);
    }
    let highest = fs::read_dir(output_dir)
        .map_err(|e| ScanError::io(output_dir, e))?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            let (stem, file_ext) = name.rsplit_once('.')?;
            if !file_ext.eq_ignore_ascii_case(ext) {
                return None;
            }
            naming::parse_sequence_index(prefix, stem)
        })
        .max()
        .unwrap_or(0);
    Ok(highest + 1)
}

/// Number candidates as `<prefix>-NN.<ext>`.
///
/// The hero (if any) is planned first: it becomes `hero.<ext>` plus
/// `<prefix>-01.<ext>`, and regular numbering then skips index 1.
pub fn plan_sequence(
    candidates: &[PathBuf],
    output_dir: &Path,
    prefix: &str,
    ext: &str,
    notes: &mut Vec<String>,
) -> Result<Vec<BatchItem>, ScanError> {
    let mut next = next_sequence_index(output_dir, prefix, ext)?;
    let mut hero_present = output_dir.join(naming::hero_filename(ext)).exists();

    let (heroes, regular): (Vec<&PathBuf>, Vec<&PathBuf>) = candidates
        .iter()
        .partition(|p| naming::is_hero(&file_name(p)));

    let mut items = Vec::with_capacity(candidates.len());
    if let Some((hero, extra)) = heroes.split_first() {
        for ignored in extra {
            notes.push(format!(
                "ignoring {}: {} is already this batch's hero",
                file_name(ignored),
                file_name(hero)
            ));
        }
        items.push(BatchItem {
            id: naming::HERO_STEM.to_string(),
            input: (*hero).clone(),
            outputs: vec![
                output_dir.join(naming::hero_filename(ext)),
                output_dir.join(naming::sequence_filename(prefix, 1, ext)),
            ],
            archive_to: None,
        });
        hero_present = true;
    }

    if next == 1 && hero_present {
        next = 2;
    }
    for input in regular {
        let out_name = naming::sequence_filename(prefix, next, ext);
        items.push(BatchItem {
            id: stem(&out_name).to_string(),
            input: input.clone(),
            outputs: vec![output_dir.join(out_name)],
            archive_to: None,
        });
        next += 1;
    }
    Ok(items)
}
