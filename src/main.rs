use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use log::{LevelFilter, info};
use printbatch::keepalive::{Heartbeat, protect};
use printbatch::process::BatchOptions;
use printbatch::spec_sheet::{self, ResizeMode};
use printbatch::{config, imaging, output, package, process, report, validation};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "printbatch")]
#[command(about = "Batch-resize product photos to print sizes")]
#[command(long_about = "\
Batch-resize product photos to print sizes

A CSV size sheet lists each image and its print size in inches. Images are
looked up by filename in a zip archive, resized to 300 DPI and written as
JPEGs into a new zip together with processing_report.txt.

Sheet layouts:

  file, constrained   filename,length,width
                      photo1.jpg,8.5,11

  brand               product,length,width,variant
                      Acme Mug,4,6,Full Black

  Variants: Original, Full Black, Full White.
  A header row is detected and skipped automatically.

Run 'printbatch sample-csv --mode file' for a starter sheet and
'printbatch gen-config' for a documented config file.")]
#[command(version)]
struct Cli {
    /// Log per-image details
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resize every image named in the sheet and write the output zip
    Run {
        /// Zip archive with the source images
        #[arg(long)]
        archive: PathBuf,
        /// CSV size sheet
        #[arg(long)]
        sheet: PathBuf,
        #[arg(long, value_enum, default_value_t = ResizeMode::File)]
        mode: ResizeMode,
        /// Directory for the output zip
        #[arg(long, default_value = ".")]
        output: PathBuf,
        /// Config file (see gen-config)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Also write a JSON summary of the session
        #[arg(long)]
        summary_json: Option<PathBuf>,
    },
    /// Validate a size sheet without processing images
    Check {
        #[arg(long)]
        sheet: PathBuf,
        #[arg(long, value_enum, default_value_t = ResizeMode::File)]
        mode: ResizeMode,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print an example size sheet for a mode
    SampleCsv {
        #[arg(long, value_enum, default_value_t = ResizeMode::File)]
        mode: ResizeMode,
    },
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    match cli.command {
        Command::Run {
            archive,
            sheet,
            mode,
            output: output_dir,
            config: config_path,
            summary_json,
        } => {
            let config = config::load_config(config_path.as_deref())?;
            init_thread_pool(&config.processing);

            let sheet_bytes = read_checked(
                &sheet,
                config.limits.max_spec_bytes,
                validation::validate_sheet_file,
            )?;
            let archive_bytes = read_checked(
                &archive,
                config.limits.max_archive_bytes,
                validation::validate_archive_file,
            )?;

            let doc = spec_sheet::parse_csv(&sheet_bytes, mode);
            if !doc.success() {
                output::print_spec_document(&doc, mode);
                return Err(invalid_sheet(&sheet, doc.errors.len()));
            }
            for warning in &doc.warnings {
                println!("Warning: {warning}");
            }

            let heartbeat = Heartbeat::new(config.keep_alive.interval());
            let _region = protect(&heartbeat);

            println!("==> Processing {} rows ({} mode)", doc.rows.len(), mode);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    println!("{}", output::format_progress_event(&event));
                }
            });
            let options = BatchOptions::from_config(&config, mode);
            let result = process::run_batch(archive_bytes, &doc.rows, &options, Some(tx));
            join_printer(printer)?;
            let result = result?;
            output::print_session_summary(&result);

            if let Some(path) = &summary_json {
                std::fs::write(path, serde_json::to_string_pretty(&result)?)?;
                info!("Wrote summary to {}", path.display());
            }

            println!("==> Packaging");
            let text = report::build_report(
                &result,
                imaging::Quality::new(config.output.quality),
                Local::now(),
            );
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    println!("{}", output::format_progress_event(&event));
                }
            });
            let zip = package::package(
                &result,
                &text,
                config.output.compression_level,
                Some(tx),
            );
            join_printer(printer)?;
            let zip = zip?;

            std::fs::create_dir_all(&output_dir)?;
            let zip_path = output_dir.join(package::download_filename(Utc::now()));
            std::fs::write(&zip_path, &zip)?;
            println!("{}", output::format_package_output(&zip_path, zip.len()));
        }
        Command::Check {
            sheet,
            mode,
            config: config_path,
        } => {
            let config = config::load_config(config_path.as_deref())?;
            let bytes = read_checked(
                &sheet,
                config.limits.max_spec_bytes,
                validation::validate_sheet_file,
            )?;
            println!("==> Checking {}", sheet.display());
            let doc = spec_sheet::parse_csv(&bytes, mode);
            output::print_spec_document(&doc, mode);
            if !doc.success() {
                return Err(invalid_sheet(&sheet, doc.errors.len()));
            }
            println!("==> Sheet is valid");
        }
        Command::SampleCsv { mode } => {
            print!("{}", spec_sheet::sample_csv(mode));
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Run the intake check for `path` and read it.
fn read_checked(
    path: &Path,
    max_bytes: u64,
    check: fn(&str, u64, u64) -> Result<(), validation::IntakeError>,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let size = std::fs::metadata(path)?.len();
    check(&name, size, max_bytes).map_err(|e| format!("{}: {e}", path.display()))?;
    Ok(std::fs::read(path)?)
}

fn invalid_sheet(sheet: &Path, errors: usize) -> Box<dyn std::error::Error> {
    format!("{} has {} invalid rows", sheet.display(), errors).into()
}

fn join_printer(printer: std::thread::JoinHandle<()>) -> Result<(), Box<dyn std::error::Error>> {
    printer
        .join()
        .map_err(|_| "progress printer thread panicked".into())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
