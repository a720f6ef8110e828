use clap::{Parser, Subcommand, ValueEnum};
use crossbeam_channel::RecvTimeoutError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tl_controls::{AntiWindup, SampleConfig};
use tl_sim::{
    BANNER, ControlReport, ControlSystem, ReportFormat, ReportSink, SimResult, SystemConfig,
    TracingSink, WriterSink, fatal,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tl-cli")]
#[command(about = "thermoloop CLI - closed-loop PID temperature control simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the control loop
    Run(RunArgs),
    /// Print the effective configuration as YAML
    Config {
        /// Path to a YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Stop after this many control cycles (runs forever if omitted)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    cycles: Option<u64>,
    /// Sample period in milliseconds
    #[arg(long)]
    period_ms: Option<u64>,
    /// Target temperature in °C
    #[arg(long)]
    setpoint: Option<f64>,
    /// Seed for the plant disturbance and sensor noise
    #[arg(long)]
    seed: Option<u64>,
    /// Anti-windup policy
    #[arg(long, value_enum)]
    anti_windup: Option<AntiWindupArg>,
    /// Report line format
    #[arg(long, value_enum, default_value_t = FormatArg::Text)]
    format: FormatArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
    /// Send reports through the log instead of stdout
    Log,
}

#[derive(Clone, Copy, ValueEnum)]
enum AntiWindupArg {
    UndoLastStep,
    ConditionalIntegration,
}

fn main() -> SimResult<()> {
    // Initialize tracing; stdout is reserved for reports
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::Config { config } => cmd_config(config),
    }
}

fn load_config(path: Option<&PathBuf>) -> SimResult<SystemConfig> {
    match path {
        Some(path) => SystemConfig::load(path),
        None => Ok(SystemConfig::default()),
    }
}

fn cmd_config(path: Option<PathBuf>) -> SimResult<()> {
    let config = load_config(path.as_ref())?;
    print!("{}", config.to_yaml()?);
    Ok(())
}

fn cmd_run(args: RunArgs) -> SimResult<()> {
    let mut config = load_config(args.config.as_ref())?;
    if let Some(period_ms) = args.period_ms {
        config.sample = SampleConfig::new(period_ms)?;
    }
    if let Some(setpoint) = args.setpoint {
        config.setpoint = setpoint;
    }
    if let Some(seed) = args.seed {
        config.plant.seed = Some(seed);
    }
    if let Some(policy) = args.anti_windup {
        config.controller.anti_windup = match policy {
            AntiWindupArg::UndoLastStep => AntiWindup::UndoLastStep,
            AntiWindupArg::ConditionalIntegration => AntiWindup::ConditionalIntegration,
        };
    }
    config.validate()?;

    fatal::install_panic_hook();
    println!("{BANNER}");

    let console: Box<dyn ReportSink> = match args.format {
        FormatArg::Text => Box::new(WriterSink::stdout(ReportFormat::Text)),
        FormatArg::Json => Box::new(WriterSink::stdout(ReportFormat::Json)),
        FormatArg::Log => Box::new(TracingSink),
    };

    let (report_tx, report_rx) = crossbeam_channel::unbounded::<ControlReport>();
    let system = ControlSystem::start(&config, Arc::new(report_tx))?;

    // Poll so a dead task is noticed even when no reports arrive.
    let poll = config.sample.period().max(Duration::from_millis(100));
    let mut cycles = 0u64;
    loop {
        match report_rx.recv_timeout(poll) {
            Ok(report) => {
                console.report(&report);
                cycles += 1;
                if args.cycles.is_some_and(|limit| cycles >= limit) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if system.has_stopped() {
                    let stats = system.stats();
                    warn!(
                        produced = stats.produced,
                        consumed = stats.consumed,
                        "control system stopped unexpectedly"
                    );
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let summary = system.stop()?;
    info!(
        cycles,
        produced = summary.stats.produced,
        dropped = summary.stats.dropped,
        final_temperature = summary.final_plant.temperature,
        final_cooling_power = summary.final_command.cooling_power(),
        "run complete"
    );
    Ok(())
}
