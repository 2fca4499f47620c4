//! capy-gestures - replay recorded pointer traces through the gesture bindings

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use capy_gestures::config::Settings;
use capy_gestures::replay::{self, Binding};

#[derive(Parser, Debug)]
#[command(name = "capy-gestures")]
#[command(about = "Replay a JSON-lines pointer trace through a gesture binding", long_about = None)]
struct Args {
    /// Trace file, one JSON sample per line
    trace: Option<PathBuf>,

    /// Settings file (defaults to ~/.config/capy/gestures.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Surface to replay against
    #[arg(short, long, value_enum, default_value_t = Binding::Gestures)]
    binding: Binding,

    /// Also write a daily rotated log file here
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Print the effective settings as TOML and exit
    #[arg(long)]
    dump_config: bool,

    /// Enable verbose debug output
    #[arg(short, long)]
    debug: bool,
}

fn default_config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join("capy/gestures.toml")
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (file_layer, _guard) = match &args.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(rolling::daily(dir, "replay.log"));
            (
                Some(fmt::layer().with_writer(non_blocking).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    // Quiet by default, verbose with --debug
    let default_filter = if args.debug {
        "debug,capy_gestures=debug"
    } else {
        "warn,capy_gestures=info"
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let settings = Settings::load_or_default(&config_path)
        .with_context(|| format!("loading settings from {}", config_path.display()))?;

    if args.dump_config {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    let Some(trace_path) = args.trace else {
        anyhow::bail!("no trace file given (see --help)");
    };
    let contents = std::fs::read_to_string(&trace_path)
        .with_context(|| format!("reading trace {}", trace_path.display()))?;
    let events = replay::parse_trace(&contents)
        .with_context(|| format!("parsing trace {}", trace_path.display()))?;

    info!(trace = %trace_path.display(), binding = ?args.binding, "capy-gestures starting");

    let outcomes = replay::replay(args.binding, &settings, &events)?;
    if outcomes.is_empty() {
        println!("no gestures recognized");
    }
    for outcome in &outcomes {
        println!("{}", outcome);
    }

    Ok(())
}
