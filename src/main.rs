//! svgproj command-line interface.
//!
//! Loads a configuration file, plus any extra resource files, and runs its maps.

use clap::Parser;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::Mutex;
use svgproj::Mapper;
use svgproj::diagnostics::TracingDiagnostics;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "svgproj")]
#[command(about = "Re-project SVG map artwork through cartographic projections", long_about = None)]
struct Args {
    /// Configuration file
    config: PathBuf,

    /// Additional resource file, loaded after the configuration (repeatable)
    #[arg(short, long = "resource", value_name = "FILE")]
    resources: Vec<PathBuf>,

    /// Map to run instead of the configured run list (repeatable)
    #[arg(short, long = "map", value_name = "NAME")]
    maps: Vec<String>,

    /// Console verbosity: 0 errors, 1 warnings, 2 progress, 3 debugging
    #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(0..=3))]
    verbosity: u8,

    /// Also log to FILE, at LEVEL (error, warn, info, debug or trace)
    #[arg(short, long, num_args = 2, value_names = ["LEVEL", "FILE"])]
    log: Option<Vec<String>>,

    /// Load and check the configuration without running any map
    #[arg(short, long)]
    simulate: bool,
}

fn console_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::ERROR,
        1 => LevelFilter::WARN,
        2 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}

/// Console output on stderr, filtered by `RUST_LOG` or else the verbosity, and an optional
/// log file with its own level.
fn init_logging(verbosity: u8, log: Option<&[String]>) -> Result<(), String> {
    let console_filter = EnvFilter::builder()
        .with_default_directive(console_level(verbosity).into())
        .from_env_lossy();
    let console = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let file = match log {
        Some([level, path]) => {
            let level: LevelFilter = level
                .parse()
                .map_err(|_| format!("unknown log level `{level}`"))?;
            let file = File::create(path).map_err(|e| format!("cannot create log file {path}: {e}"))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_filter(level),
            )
        }
        Some(other) => return Err(format!("--log takes a level and a file, got {other:?}")),
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| e.to_string())
}

fn run(args: &Args) -> svgproj::Result<bool> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut mapper = Mapper::new(cwd, Rc::new(TracingDiagnostics));
    mapper.load(&args.config)?;
    for resource in &args.resources {
        mapper.load(resource)?;
    }
    if !args.maps.is_empty() {
        mapper.set_run_list(args.maps.clone());
    }

    if args.simulate {
        mapper.check()?;
        tracing::info!(
            config = %args.config.display(),
            "configuration is valid, {} maps would run",
            mapper.run_list().len()
        );
        return Ok(true);
    }

    let summary = mapper.run()?;
    tracing::info!(
        "{} maps done, {} failed",
        summary.succeeded.len(),
        summary.failed.len()
    );
    Ok(summary.is_success())
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_logging(args.verbosity, args.log.as_deref()) {
        eprintln!("svgproj: {e}");
        return ExitCode::FAILURE;
    }
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
