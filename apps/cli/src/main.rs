use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use storyline_core::{DEFAULT_MODEL, PromptStyle};
use tracing_subscriber::EnvFilter;

mod describe;
mod qa;

pub(crate) fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

/// CLI wrapper for PromptStyle enum (needed for clap ValueEnum)
#[derive(Clone, Copy, Default, ValueEnum)]
enum CliStyle {
    #[default]
    Detailed,
    Concise,
}

impl From<CliStyle> for PromptStyle {
    fn from(cli: CliStyle) -> Self {
        match cli {
            CliStyle::Detailed => PromptStyle::Detailed,
            CliStyle::Concise => PromptStyle::Concise,
        }
    }
}

#[derive(Parser)]
#[command(name = "storyline")]
#[command(about = "Hierarchical video descriptions and QA pairs with Gemini", version)]
struct Cli {
    /// Show progress logs (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Describe a video at segment, plot and overview level
    Describe(DescribeArgs),
    /// Generate question-answer pairs from a saved analysis
    Qa(QaArgs),
}

#[derive(Args)]
struct DescribeArgs {
    /// Video URL, uploaded file URI (files/...) or local video file
    media: String,

    /// Video length in seconds; skips duration probing
    #[arg(short, long)]
    duration: Option<f64>,

    /// Seconds covered by each segment description
    #[arg(long, env = "STORYLINE_LEVEL1_INTERVAL", default_value_t = 10)]
    level1_interval: u32,

    /// Seconds between plot summaries
    #[arg(long, env = "STORYLINE_LEVEL2_INTERVAL", default_value_t = 30)]
    level2_interval: u32,

    /// Gemini model
    #[arg(short, long, env = "STORYLINE_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Prompt style
    #[arg(short, long, default_value = "detailed")]
    style: CliStyle,

    #[arg(long, default_value_t = 0.7)]
    temperature: f32,

    #[arg(long, default_value_t = 8192)]
    max_output_tokens: u32,

    /// Also write the analysis JSON here
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force re-processing even if a cached analysis exists
    #[arg(short, long)]
    force: bool,
}

#[derive(Args)]
struct QaArgs {
    /// Analysis JSON written by `storyline describe`
    analysis: PathBuf,

    /// Description levels to generate pairs for
    #[arg(
        short,
        long,
        value_delimiter = ',',
        default_values_t = [1u8, 2, 3],
        value_parser = clap::value_parser!(u8).range(1..=3)
    )]
    levels: Vec<u8>,

    /// File with custom question dimensions
    #[arg(short, long)]
    tasks: Option<PathBuf>,

    /// Gemini model
    #[arg(short, long, env = "STORYLINE_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Where to write the QA pairs (default: next to the analysis)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub(crate) fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "storyline=info,storyline_core=info"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    println!(
        "\n{}  {}\n",
        style("storyline").cyan().bold(),
        style("Video Describer").dim()
    );

    let result = match cli.command {
        Command::Describe(args) => describe::run(args).await,
        Command::Qa(args) => qa::run(args).await,
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}
