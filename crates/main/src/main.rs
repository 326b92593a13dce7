use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

use solar_report::auth::normalize_user;
use solar_report::filename::report_filename;
use solar_report::notify::{NoticeLevel, Notifier};
use solar_report::sample::sample_input;
use solar_report::sink::DirectorySink;
use solar_report::{ReportConfig, ReportGenerator, ReportInput, ReportMode};

/// Generates PDF sizing reports for stand-alone photovoltaic installations.
///
/// Reports are drawn with built-in Helvetica unless a TrueType family is found in the
/// `SOLAR_REPORT_FONTS_DIR` directory or under `assets/fonts`.
#[derive(Parser)]
#[command(author, version, about = "Generate photovoltaic sizing reports as PDF")]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON file overriding the default report configuration.
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a report from a `{ "result": ..., "inputData": ... }` JSON file.
    Generate {
        input: PathBuf,

        /// Produce the one-table summary instead of the full report.
        #[arg(long)]
        quick: bool,

        /// Directory the PDF is written to.
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Render the built-in sample sizing.
    Sample {
        #[arg(long)]
        quick: bool,

        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Print the file name a report generated now would get.
    Filename {
        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        quick: bool,
    },

    /// Normalise a user profile returned by the accounts API and print it.
    #[command(aliases = ["who-am-i", "profile"])]
    Whoami { input: PathBuf },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => ReportConfig::from_json_file(path)?,
        None => ReportConfig::default(),
    };

    match cli.command {
        Commands::Generate {
            input,
            quick,
            output,
        } => {
            let file = File::open(&input)
                .map_err(|err| format!("failed to open {}: {}", input.display(), err))?;
            let report_input: ReportInput = serde_json::from_reader(BufReader::new(file))?;
            generate(config, &report_input, mode(quick), &output)
        }
        Commands::Sample { quick, output } => generate(config, &sample_input(), mode(quick), &output),
        Commands::Filename { location, quick } => {
            println!(
                "{}",
                report_filename(mode(quick), location.as_deref(), &Local::now())
            );
            Ok(())
        }
        Commands::Whoami { input } => {
            let text = std::fs::read_to_string(&input)
                .map_err(|err| format!("failed to read {}: {}", input.display(), err))?;
            let user = normalize_user(serde_json::from_str(&text)?)?;
            println!("{}", serde_json::to_string_pretty(&user)?);
            Ok(())
        }
    }
}

fn mode(quick: bool) -> ReportMode {
    if quick {
        ReportMode::Quick
    } else {
        ReportMode::Full
    }
}

fn generate(
    config: ReportConfig,
    input: &ReportInput,
    mode: ReportMode,
    output: &Path,
) -> Result<(), Box<dyn Error>> {
    let sink = DirectorySink::new(output);
    let generator = ReportGenerator::new(config, ConsoleNotifier, sink);
    let report = match mode {
        ReportMode::Full => generator.generate(input)?,
        ReportMode::Quick => generator.generate_quick(input)?,
    };
    println!(
        "Generated {} ({} bytes, {} page(s))",
        generator.sink().path_for(&report.filename).display(),
        report.bytes.len(),
        report.pages
    );
    Ok(())
}

/// Prints notices the way the web front end would toast them.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Error => eprintln!("[{}] {}", level, message),
            NoticeLevel::Info | NoticeLevel::Success => println!("[{}] {}", level, message),
        }
    }
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs `env_logger` at the level chosen by the `-v` count. `RUST_LOG`, when set, wins.
fn init_logging(verbose: u8) {
    let level = log_level(verbose);
    let initialised = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
    if initialised.is_ok() {
        log::debug!("log level set to {}", level);
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
