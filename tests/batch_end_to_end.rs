//! End-to-end runs of config-defined jobs with the real backend.
//!
//! Each test writes a small `portfolio.toml` and synthetic source images into
//! a temp dir, plans and runs the jobs, then decodes the WebP outputs.

use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use portfolio_images::batch::{BatchOptions, BatchReport, ItemOutcome, run_batch};
use portfolio_images::config::{self, Config};
use portfolio_images::imaging::RustBackend;
use portfolio_images::ledger::Ledger;
use portfolio_images::scan::plan_job;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_jpeg(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 96])
    });
    DynamicImage::ImageRgb8(img)
        .save_with_format(path, ImageFormat::Jpeg)
        .unwrap();
}

fn write_transparent_png(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]))
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

fn decode(path: &Path) -> DynamicImage {
    image::open(path).unwrap_or_else(|e| panic!("{} should decode: {e}", path.display()))
}

fn load(base: &Path, toml: &str) -> Config {
    let path = base.join(config::DEFAULT_CONFIG_FILE);
    fs::write(&path, toml).unwrap();
    config::load_config(&path).unwrap()
}

fn run_all(config: &Config, base: &Path, ledger: &mut Ledger) -> Vec<BatchReport> {
    let backend = RustBackend::new();
    config
        .jobs
        .iter()
        .map(|job| {
            let plan = plan_job(job, &config.defaults, base, ledger, true).unwrap();
            run_batch(&backend, &plan, ledger, BatchOptions::default(), None)
        })
        .collect()
}

const WEB_THUMBS: &str = r#"
[[job]]
id = "web-thumbs"
archive = true
policy = { kind = "max_dimension", limit = 64 }
[job.scan]
input_dir = "web/thumbnails"
naming = { scheme = "slug" }
"#;

#[test]
fn slug_job_resizes_renames_and_archives() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path();
    write_jpeg(&base.join("web/thumbnails/Flow Fields.jpg"), 200, 100);
    let config = load(base, WEB_THUMBS);
    let mut ledger = Ledger::load(base);

    let reports = run_all(&config, base, &mut ledger);

    assert_eq!(reports[0].succeeded(), 1);
    assert_eq!(reports[0].failed(), 0);
    let out = base.join("web/thumbnails/flow-fields.webp");
    assert_eq!(decode(&out).dimensions(), (64, 32));
    assert!(!base.join("web/thumbnails/Flow Fields.jpg").exists());
    assert!(base.join("web/thumbnails/originals/Flow Fields.jpg").is_file());
}

#[test]
fn second_run_ignores_own_outputs() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path();
    write_jpeg(&base.join("web/thumbnails/a.jpg"), 120, 90);
    let config = load(base, WEB_THUMBS);

    let mut ledger = Ledger::load(base);
    run_all(&config, base, &mut ledger);
    ledger.save().unwrap();

    // Fresh process: ledger comes back from disk.
    let ledger = Ledger::load(base);
    let plan = plan_job(&config.jobs[0], &config.defaults, base, &ledger, true).unwrap();
    assert!(plan.items.is_empty());
    assert!(plan.notes.iter().any(|n| n.contains("skipped 1")));
}

#[test]
fn hand_placed_webp_is_reencoded() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path();
    let placed = base.join("web/thumbnails/Big Shot.webp");
    fs::create_dir_all(placed.parent().unwrap()).unwrap();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(256, 128, Rgb([10, 200, 30])))
        .save_with_format(&placed, ImageFormat::WebP)
        .unwrap();
    let config = load(base, WEB_THUMBS);

    let reports = run_all(&config, base, &mut Ledger::load(base));

    assert_eq!(reports[0].succeeded(), 1);
    assert_eq!(
        decode(&base.join("web/thumbnails/big-shot.webp")).dimensions(),
        (64, 32)
    );
    assert!(base.join("web/thumbnails/originals/Big Shot.webp").is_file());
}

#[test]
fn legacy_output_next_to_new_source_is_archived_not_overwritten() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path();
    let dir = base.join("web/thumbnails");
    fs::create_dir_all(&dir).unwrap();
    // Left behind by an older tool, so the ledger has never seen it.
    DynamicImage::ImageRgb8(RgbImage::from_pixel(256, 128, Rgb([0, 0, 255])))
        .save_with_format(dir.join("flow-fields.webp"), ImageFormat::WebP)
        .unwrap();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(256, 128, Rgb([255, 0, 0])))
        .save_with_format(dir.join("Flow Fields.png"), ImageFormat::Png)
        .unwrap();
    let config = load(base, WEB_THUMBS);

    let reports = run_all(&config, base, &mut Ledger::load(base));

    assert_eq!(reports[0].succeeded(), 1, "{:?}", reports[0].items);
    assert!(
        reports[0]
            .notes
            .iter()
            .any(|n| n.starts_with("skipping Flow Fields.png")),
        "{:?}",
        reports[0].notes
    );
    let archived = decode(&dir.join("originals/flow-fields.webp")).to_rgb8();
    assert_eq!(archived.dimensions(), (256, 128));
    assert_eq!(*archived.get_pixel(10, 10), Rgb([0, 0, 255]));
    let output = decode(&dir.join("flow-fields.webp")).to_rgb8();
    assert_eq!(output.dimensions(), (64, 32));
    let pixel = output.get_pixel(32, 16);
    assert!(pixel[2] > 200 && pixel[0] < 60, "output should still be blue: {pixel:?}");
    // The new source waits for a rename instead of clobbering the old one.
    assert!(dir.join("Flow Fields.png").is_file());
}

#[test]
fn sequence_job_numbers_after_existing_and_handles_hero() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path();
    write_jpeg(&base.join("astro/import/hero.jpg"), 300, 200);
    write_jpeg(&base.join("astro/import/DSC_0001.jpg"), 100, 300);
    fs::write(base.join("astro/astro-03.webp"), b"existing").unwrap();
    let config = load(
        base,
        r#"
[[job]]
id = "photos-astro"
archive = true
policy = { kind = "max_dimension", limit = 150 }
[job.scan]
input_dir = "astro/import"
output_dir = "astro"
naming = { scheme = "sequence", prefix = "astro" }
"#,
    );

    let reports = run_all(&config, base, &mut Ledger::load(base));

    assert_eq!(reports[0].succeeded(), 2, "{:?}", reports[0].items);
    assert_eq!(decode(&base.join("astro/hero.webp")).dimensions(), (150, 100));
    assert_eq!(decode(&base.join("astro/astro-01.webp")).dimensions(), (150, 100));
    assert_eq!(decode(&base.join("astro/astro-04.webp")).dimensions(), (50, 150));
    assert_eq!(fs::read(base.join("astro/astro-03.webp")).unwrap(), b"existing");
    assert!(base.join("astro/originals/hero.jpg").is_file());
    assert!(base.join("astro/originals/DSC_0001.jpg").is_file());
}

#[test]
fn square_entries_flatten_alpha_and_report_missing_inputs() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path();
    write_transparent_png(&base.join("live/logo.png"), 120, 80);
    let config = load(
        base,
        r#"
[[job]]
id = "preview-thumbs"
policy = { kind = "center_square", edge = 32 }
encode = { quality = 85, effort = 6 }

[[job.entry]]
id = "logo"
input = "live/logo.png"
output = "live/preview-thumbs/logo.webp"

[[job.entry]]
id = "gone"
input = "live/missing.jpg"
output = "live/preview-thumbs/gone.webp"
"#,
    );

    let reports = run_all(&config, base, &mut Ledger::load(base));
    let report = &reports[0];

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    assert!(matches!(report.items[1].outcome, ItemOutcome::Failed(_)));
    assert!(!base.join("live/preview-thumbs/gone.webp").exists());

    let thumb = decode(&base.join("live/preview-thumbs/logo.webp")).to_rgba8();
    assert_eq!(thumb.dimensions(), (32, 32));
    let center = thumb.get_pixel(16, 16);
    assert_eq!(center[3], 255, "output must be opaque");
    assert!(center[0] > 240 && center[1] > 240 && center[2] > 240);
    // Entries are never archived unless the job says so
    assert!(base.join("live/logo.png").exists());
}

#[test]
fn stock_config_runs_against_an_empty_site() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path();
    let config = load(base, config::stock_config_toml());

    let reports = run_all(&config, base, &mut Ledger::load(base));

    assert_eq!(reports.len(), 7);
    // Import folders are bootstrapped; explicit entries fail as missing.
    assert!(base.join("photos/portrait/import").is_dir());
    assert!(base.join("interactive/web/thumbnails").is_dir());
    let heroes = reports.iter().find(|r| r.job == "hero-thumbs").unwrap();
    assert_eq!(heroes.failed(), 4);
    assert_eq!(reports.iter().map(BatchReport::succeeded).sum::<usize>(), 0);
}
