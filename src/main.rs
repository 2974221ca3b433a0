//! CLI shell: reads flags once, builds an immutable config and drives the
//! pipeline. Presentation only; every decision lives in the library.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use photoreport::{
    run_export, run_update, ExportConfig, ProgressSink, ProgressUpdate, RecognitionConfig,
    UpdateConfig, DEFAULT_OCR_ENDPOINT,
};

#[derive(Parser, Debug)]
#[command(
    name = "photoreport",
    about = "Turn a folder of images into an XLSX report with thumbnails, OCR text and translations"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export a folder of images into a new report
    Export {
        /// Folder whose images become the report
        folder: PathBuf,

        /// Directory the report is written into
        #[arg(long, default_value = ".")]
        out: PathBuf,

        /// Send each image to the recognition service
        #[arg(long)]
        recognize: bool,

        /// Source language code for recognition (e.g. ch, en, vie)
        #[arg(long, default_value = "ch")]
        language: String,

        /// Translate recognized text into this language
        #[arg(long, requires = "recognize")]
        translate_to: Option<String>,

        /// Recognition endpoint; defaults to $PHOTOREPORT_OCR_ENDPOINT
        #[arg(long, requires = "recognize")]
        endpoint: Option<String>,
    },

    /// Append a labeled version column of replacement images to an existing report
    Update {
        /// Previously exported report
        report: PathBuf,

        /// Folder of replacement images, matched to rows by file name
        folder: PathBuf,

        /// Label of the new version column
        #[arg(long)]
        version: String,

        /// Directory the updated report is written into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

/// Feeds pipeline progress into an indicatif bar.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("[{wide_bar:.cyan/blue}] {percent:>3}% {msg}")
                .expect("valid progress template")
                .progress_chars("#>-"),
        );
        Self { bar }
    }
}

impl ProgressSink for BarProgress {
    fn update(&self, progress: ProgressUpdate) {
        self.bar.set_length(progress.total as u64);
        self.bar.set_position(progress.completed as u64);
        self.bar.set_message(progress.label);
    }
}

#[tokio::main]
async fn main() {
    // Load .env from the working directory if present.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,photoreport=info")),
        )
        .init();

    let cli = Cli::parse();
    let progress = BarProgress::new();

    let result = match cli.command {
        Command::Export {
            folder,
            out,
            recognize,
            language,
            translate_to,
            endpoint,
        } => {
            let recognition = recognize.then(|| RecognitionConfig {
                endpoint: endpoint
                    .or_else(|| std::env::var("PHOTOREPORT_OCR_ENDPOINT").ok())
                    .unwrap_or_else(|| DEFAULT_OCR_ENDPOINT.to_string()),
                source_language: language,
                target_language: translate_to,
            });
            let config = ExportConfig {
                folder,
                output_dir: out,
                recognition,
            };
            run_export(&config, &progress).await.map(|summary| {
                format!(
                    "Report written to {} ({} sheet(s), {} row(s), {} skipped)",
                    summary.output.display(),
                    summary.sheets,
                    summary.rows,
                    summary.skipped.len()
                )
            })
        }
        Command::Update {
            report,
            folder,
            version,
            out,
        } => {
            let config = UpdateConfig {
                report,
                folder,
                version_label: version,
                output_dir: out,
            };
            run_update(&config, &progress).await.map(|summary| {
                format!(
                    "Version \"{}\" added: {} of {} row(s) updated, written to {}",
                    summary.version_label,
                    summary.rows_matched,
                    summary.rows_visited,
                    summary.output.display()
                )
            })
        }
    };

    progress.bar.finish_and_clear();

    match result {
        Ok(message) => println!("{}", message),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
