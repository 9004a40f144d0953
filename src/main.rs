use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;
use thumbscan::dict::DictEvent;
use thumbscan::exif::ExifImage;
use thumbscan::{config, logging, output, run};
use tracing::{debug, info};

fn version_string() -> &'static str {
    let release = env!("THUMBSCAN_RELEASE");
    if release == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("THUMBSCAN_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "thumbscan")]
#[command(about = "Find photos without thumbnails and script their generation")]
#[command(long_about = "\
Find photos without thumbnails and script their generation

Photos are read from <ImageRoot>/<user>/<path> for every user in the config.
Thumbnails are expected at <ThumbNailsRoot>/<user>/<path>, named after the
capture time of the photo:

  /srv/photos/alice/2016/IMG_0001.jpg
  → /srv/thumbnails/alice/2016/2016_11_06_11_29_18_IMG_0001.jpg.json

Capture time resolution (first available wins):
  EXIF DateTimeOriginal → DateTime → DateTimeDigitized
  → digits in the file name → file modification time

For every missing thumbnail the configured commands are written to a bash
script. Nothing is generated until the script runs.

Run 'thumbscan gen-config' to print a documented config.")]
#[command(version = version_string())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan all user paths and write the generation script(s)
    Run {
        /// Config file (.json, or .toml)
        config: PathBuf,
        /// Log every photo found and every command written
        #[arg(short, long)]
        verbose: bool,
    },
    /// Validate a config and show what a run would scan
    Check {
        /// Config file (.json, or .toml)
        config: PathBuf,
    },
    /// Print the EXIF tags of one image
    Dump {
        image: PathBuf,
        /// Only tags whose name contains this text
        #[arg(long)]
        filter: Option<String>,
        /// Trace the header and every directory entry
        #[arg(long)]
        debug: bool,
    },
    /// Print a stock config with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            config: config_path,
            verbose,
        } => {
            let config = config::load_config(&config_path, verbose)?;
            if let Some(log_file) = logging::init(&config)? {
                println!("Logging to {}", log_file.display());
            }
            info!("thumbscan {} using {}", version_string(), config_path.display());
            debug!("config data:\n{}", serde_json::to_string_pretty(&config)?);

            let args = std::env::args().collect::<Vec<_>>().join(" ");
            let (tx, rx) = mpsc::channel();
            let quiet = config.verbose;
            let printer = std::thread::spawn(move || show_progress(rx, quiet));
            let result = run::run(&config, &args, Some(&tx));
            drop(tx);
            printer.join().ok();

            output::print_run_summary(&result?);
        }
        Command::Check {
            config: config_path,
        } => {
            let config = config::load_config(&config_path, false)?;
            println!("==> Checking {}", config_path.display());
            output::print_check_output(&config, &config.example_timestamp());
            println!("==> Config is valid");
        }
        Command::Dump {
            image,
            filter,
            debug,
        } => {
            logging::init_console(if debug { "debug" } else { "warn" })?;
            let image = ExifImage::open_with(&image, |entry, _| {
                filter.as_deref().is_none_or(|f| entry.name().contains(f))
            })?;
            output::print_dump(&image, debug);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Spinner fed by run events. Hidden for verbose runs, whose log lines
/// already show every photo.
fn show_progress(rx: Receiver<DictEvent>, hidden: bool) {
    let spinner = if hidden {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} {pos} photos {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    };

    for event in rx {
        if let DictEvent::Found { number, .. } = &event {
            spinner.set_position(*number as u64);
        }
        if let Some(line) = output::format_event(&event) {
            spinner.set_message(line);
        }
    }
    spinner.finish_and_clear();
}
