//! Batch execution.
//!
//! A [`JobPlan`] is an ordered list of [`BatchItem`]s sharing one
//! [`TransformPolicy`]. [`run_batch`] processes them one by one:
//!
//! ```text
//! input exists? ─no─→ Failed(InputNotFound)
//!      │
//! ledger fresh? ─yes─→ Skipped(UpToDate)        (unless --force)
//!      │
//! render (decode → normalize → geometry → encode)
//!      │
//! write every output, record in ledger
//!      │
//! archive original?  → originals/<name>[_N].<ext>
//! ```
//!
//! Nothing is written for an item until its render succeeded, and an item
//! failure never stops the batch. Each outcome is also sent as a
//! [`BatchEvent`] so the CLI can print progress while the batch runs.

use crate::archive::archive_original;
use crate::imaging::{ImageBackend, Rendered, TransformError, TransformPolicy, render};
use crate::ledger::{self, Ledger, LedgerEntry};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

/// One source and the paths its encoded result is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub id: String,
    pub input: PathBuf,
    /// Usually one path. A sequence hero has two: `hero.webp` and `<prefix>-01.webp`.
    pub outputs: Vec<PathBuf>,
    /// Move the original here after success.
    pub archive_to: Option<PathBuf>,
}

/// A job ready to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPlan {
    pub id: String,
    pub policy: TransformPolicy,
    pub items: Vec<BatchItem>,
    /// Informational messages from planning (created folders, skipped files).
    pub notes: Vec<String>,
}

#[derive(Error, Debug)]
pub enum ItemError {
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error("failed to archive {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("refusing to overwrite {} in place without an archive folder", .0.display())]
    WouldOverwriteInput(PathBuf),
    /// An in-place write failed after the original was already moved aside.
    #[error(
        "failed to write {}; the original is now at {}: {source}",
        path.display(),
        archived_to.display()
    )]
    WriteAfterArchive {
        path: PathBuf,
        archived_to: PathBuf,
        #[source]
        source: TransformError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Every output exists and was produced from this source with this policy.
    UpToDate,
}

/// A successfully written item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    pub outputs: Vec<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub bytes_before: u64,
    pub bytes_after: u64,
    pub archived_to: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ItemOutcome {
    Processed(Processed),
    Skipped(SkipReason),
    Failed(ItemError),
}

#[derive(Debug)]
pub struct ItemReport {
    pub id: String,
    pub input: PathBuf,
    pub outcome: ItemOutcome,
}

/// Progress event emitted once per item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Processed {
        job: String,
        id: String,
        result: Processed,
    },
    Skipped {
        job: String,
        id: String,
        reason: SkipReason,
    },
    Failed {
        job: String,
        id: String,
        error: String,
    },
}

impl BatchEvent {
    fn from_report(job: &str, report: &ItemReport) -> Self {
        let job = job.to_string();
        let id = report.id.clone();
        match &report.outcome {
            ItemOutcome::Processed(result) => BatchEvent::Processed {
                job,
                id,
                result: result.clone(),
            },
            ItemOutcome::Skipped(reason) => BatchEvent::Skipped {
                job,
                id,
                reason: *reason,
            },
            ItemOutcome::Failed(err) => BatchEvent::Failed {
                job,
                id,
                error: err.to_string(),
            },
        }
    }
}

/// Everything that happened in one job.
#[derive(Debug)]
pub struct BatchReport {
    pub job: String,
    pub policy: TransformPolicy,
    pub items: Vec<ItemReport>,
    pub notes: Vec<String>,
}

impl BatchReport {
    pub fn processed(&self) -> impl Iterator<Item = &Processed> {
        self.items.iter().filter_map(|i| match &i.outcome {
            ItemOutcome::Processed(p) => Some(p),
            _ => None,
        })
    }

    pub fn succeeded(&self) -> usize {
        self.processed().count()
    }

    pub fn skipped(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, ItemOutcome::Skipped(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, ItemOutcome::Failed(_)))
            .count()
    }

    pub fn bytes_before(&self) -> u64 {
        self.processed().map(|p| p.bytes_before).sum()
    }

    pub fn bytes_after(&self) -> u64 {
        self.processed().map(|p| p.bytes_after).sum()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Re-encode even when the ledger says the outputs are current.
    pub force: bool,
}

/// Process every item of `plan`, in order.
///
/// The ledger is updated in memory; saving it is up to the caller.
pub fn run_batch(
    backend: &impl ImageBackend,
    plan: &JobPlan,
    ledger: &mut Ledger,
    options: BatchOptions,
    progress: Option<Sender<BatchEvent>>,
) -> BatchReport {
    let params_hash = ledger::hash_policy(&plan.policy);
    let mut items = Vec::with_capacity(plan.items.len());

    for item in &plan.items {
        let outcome = match process_item(backend, item, &plan.policy, &params_hash, ledger, options)
        {
            Ok(outcome) => outcome,
            Err(err) => {
                log::warn!("{}: {} failed: {err}", plan.id, item.id);
                ItemOutcome::Failed(err)
            }
        };
        let report = ItemReport {
            id: item.id.clone(),
            input: item.input.clone(),
            outcome,
        };
        if let Some(tx) = &progress {
            tx.send(BatchEvent::from_report(&plan.id, &report)).ok();
        }
        items.push(report);
    }

    BatchReport {
        job: plan.id.clone(),
        policy: plan.policy,
        items,
        notes: plan.notes.clone(),
    }
}

fn process_item(
    backend: &impl ImageBackend,
    item: &BatchItem,
    policy: &TransformPolicy,
    params_hash: &str,
    ledger: &mut Ledger,
    options: BatchOptions,
) -> Result<ItemOutcome, ItemError> {
    if !item.input.is_file() {
        return Err(TransformError::InputNotFound(item.input.clone()).into());
    }
    let overwrites_input = item.outputs.iter().any(|o| o == &item.input);
    if overwrites_input && item.archive_to.is_none() {
        return Err(ItemError::WouldOverwriteInput(item.input.clone()));
    }

    let bytes_before = fs::metadata(&item.input)
        .map_err(|e| TransformError::io(&item.input, e))?
        .len();
    let source_hash =
        ledger::hash_file(&item.input).map_err(|e| TransformError::io(&item.input, e))?;

    if !options.force && ledger.is_fresh(&item.outputs, &source_hash, params_hash) {
        log::debug!("{} is up to date", item.input.display());
        return Ok(ItemOutcome::Skipped(SkipReason::UpToDate));
    }

    let Rendered {
        bytes,
        width,
        height,
    } = render(backend, &item.input, policy)?;

    // Re-encoding in place: move the original aside before it is overwritten.
    let mut archived_to = None;
    if overwrites_input && let Some(dir) = &item.archive_to {
        archived_to = Some(archive(&item.input, dir)?);
    }

    for output in &item.outputs {
        write_output(output, &bytes).map_err(|source| match &archived_to {
            Some(moved) => ItemError::WriteAfterArchive {
                path: output.clone(),
                archived_to: moved.clone(),
                source,
            },
            None => source.into(),
        })?;
    }

    let output_hash = ledger::hash_bytes(&bytes);
    for output in &item.outputs {
        ledger.record(
            output,
            LedgerEntry {
                source_hash: source_hash.clone(),
                params_hash: params_hash.to_string(),
                output_hash: output_hash.clone(),
            },
        );
    }

    if archived_to.is_none()
        && let Some(dir) = &item.archive_to
    {
        archived_to = Some(archive(&item.input, dir)?);
    }

    log::info!(
        "{} → {} ({width}x{height}, {} → {} bytes)",
        item.input.display(),
        item.outputs
            .iter()
            .map(|o| o.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
        bytes_before,
        bytes.len()
    );

    Ok(ItemOutcome::Processed(Processed {
        outputs: item.outputs.clone(),
        width,
        height,
        bytes_before,
        bytes_after: bytes.len() as u64,
        archived_to,
    }))
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<(), TransformError> {
    let io_err = |source| TransformError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, bytes).map_err(io_err)
}

fn archive(source: &Path, dir: &Path) -> Result<PathBuf, ItemError> {
    archive_original(source, dir).map_err(|source_err| ItemError::Archive {
        path: source.to_path_buf(),
        source: source_err,
    })
}
