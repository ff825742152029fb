use clap::{Parser, Subcommand};
use portfolio_images::batch::{self, BatchOptions};
use portfolio_images::config::{self, DEFAULT_CONFIG_FILE};
use portfolio_images::imaging::RustBackend;
use portfolio_images::ledger::Ledger;
use portfolio_images::{output, scan};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "portfolio-images")]
#[command(about = "Batch resize, crop and WebP re-encode for portfolio images")]
#[command(long_about = "\
Batch resize, crop and WebP re-encode for portfolio images

Jobs are declared in portfolio.toml. Each job applies one policy
(center_square or max_dimension, plus WebP quality and effort) to a list
of explicit entries or to every image found in a folder.

Typical asset layout:

  src/assets/
  ├── portfolio.toml
  ├── photos/
  │   ├── portrait/
  │   │   ├── import/              # drop new photos here
  │   │   ├── originals/           # sources are moved here after success
  │   │   ├── hero.webp
  │   │   └── portrait-01.webp     # numbered gallery images
  │   └── hero-thumbs/             # 768px square cover cards
  └── interactive/
      ├── web/thumbnails/          # 512px thumbnails, slug names
      └── live/preview-thumbs/     # 256px square hover previews

Run 'portfolio-images gen-config' to print a documented portfolio.toml.")]
#[command(version)]
struct Cli {
    /// Job config file; relative paths inside it resolve against its folder
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process every configured job (or only the ones named with --job)
    Run {
        /// Job id to run; repeat to run several
        #[arg(long = "job", value_name = "ID")]
        jobs: Vec<String>,

        /// Re-encode even when outputs are up to date
        #[arg(long)]
        force: bool,
    },
    /// Validate the config and show what `run` would do, without encoding
    Check {
        /// Job id to check; repeat to check several
        #[arg(long = "job", value_name = "ID")]
        jobs: Vec<String>,
    },
    /// Print a stock portfolio.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Run { jobs, force } => {
            let config = config::load_config(&cli.config)?;
            let base = config::base_dir(&cli.config);
            let selected = config.select_jobs(&jobs)?;
            let mut ledger = Ledger::load(&base);
            let backend = RustBackend::new();
            let mut reports = Vec::with_capacity(selected.len());
            let mut unplanned = Vec::new();

            for job in selected {
                let plan = match scan::plan_job(job, &config.defaults, &base, &ledger, true) {
                    Ok(plan) => plan,
                    Err(err) => {
                        log::error!("{}: planning failed: {err}", job.id);
                        eprintln!("==> {}: could not plan job: {err}", job.id);
                        unplanned.push(job.id.clone());
                        continue;
                    }
                };
                println!(
                    "{}",
                    output::format_job_header(&plan.id, &plan.policy, plan.items.len())
                );

                let (tx, rx) = std::sync::mpsc::channel();
                let printer_base = base.clone();
                let printer = std::thread::spawn(move || {
                    for event in rx {
                        for line in output::format_batch_event(&event, &printer_base) {
                            println!("{}", line);
                        }
                    }
                });
                let report = batch::run_batch(
                    &backend,
                    &plan,
                    &mut ledger,
                    BatchOptions { force },
                    Some(tx),
                );
                if printer.join().is_err() {
                    log::warn!("progress printer thread panicked");
                }
                output::print_job_summary(&report);

                // Persist after every job so an interrupted run keeps its progress.
                ledger.save()?;
                reports.push(report);
            }

            println!();
            println!("{}", output::format_run_summary(&reports));
            if !unplanned.is_empty() {
                return Err(format!("could not plan job(s): {}", unplanned.join(", ")).into());
            }
        }
        Command::Check { jobs } => {
            let config = config::load_config(&cli.config)?;
            let base = config::base_dir(&cli.config);
            let ledger = Ledger::load(&base);
            println!("==> Checking {}", cli.config.display());
            let mut unplanned = Vec::new();
            for job in config.select_jobs(&jobs)? {
                match scan::plan_job(job, &config.defaults, &base, &ledger, false) {
                    Ok(plan) => output::print_plan(&plan, &base),
                    Err(err) => {
                        eprintln!("==> {}: could not plan job: {err}", job.id);
                        unplanned.push(job.id.clone());
                    }
                }
            }
            if !unplanned.is_empty() {
                return Err(format!("could not plan job(s): {}", unplanned.join(", ")).into());
            }
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Route `log` output through env_logger. `RUST_LOG` still wins when set.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
