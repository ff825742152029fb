//! # Portfolio Images
//!
//! Batch image preparation for a static portfolio site. Source photos and
//! screenshots go in; right-sized, EXIF-upright, lossy WebP files come out,
//! named the way the site expects.
//!
//! # Architecture: Plan → Run
//!
//! ```text
//! portfolio.toml ──→ config ──→ scan (plan_job) ──→ JobPlan
//!                                   │                  │
//!                                ledger            batch::run_batch
//!                                   ↑                  │
//!                                   └── outputs ← imaging::render
//! ```
//!
//! Every job pairs one [`TransformPolicy`](imaging::TransformPolicy) with its
//! sources. Planning resolves names and paths without touching pixels, so
//! `check` can show exactly what `run` would do.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `portfolio.toml` loading, validation, and the stock config |
//! | [`scan`] | Turns entries and directory scans into [`batch::BatchItem`]s |
//! | [`batch`] | Runs a job item by item, writes outputs, archives originals |
//! | [`imaging`] | Decode, orientation fix, alpha flattening, crop/resize, WebP encode |
//! | [`naming`] | Slug and `<prefix>-NN` output filename conventions |
//! | [`archive`] | Collision-free moves into `originals/` |
//! | [`ledger`] | Content hashes of sources and outputs for skipping work |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Policy Per Job
//!
//! The portfolio needs four kinds of output (gallery photos, hero cards, web
//! thumbnails, hover previews) that differ only in geometry and encoder
//! settings. They all run through the same [`batch::run_batch`]; what differs
//! lives in config.
//!
//! ## Render in Memory, Then Write
//!
//! Backends return encoded bytes instead of writing files. An item that fails
//! to decode or encode leaves no partial output behind, and its original is
//! never archived.
//!
//! ## Content Hashes, Not Extensions
//!
//! Scanned folders often contain both sources and results. Rather than
//! skipping every `.webp`, the [`ledger`] remembers the hash of everything it
//! wrote: our outputs are skipped, a hand-placed WebP is processed.

pub mod archive;
pub mod batch;
pub mod config;
pub mod imaging;
pub mod ledger;
pub mod naming;
pub mod output;
pub mod scan;
