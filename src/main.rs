use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use miette::{Context, Result};
use tracing_subscriber::EnvFilter;

use revhook_core::{RevhookConfig, DEFAULT_CONFIG_FILE};
use revhook_review::engine::LlmClient;
use revhook_review::model::{self, ModelStatus};
use revhook_review::pipeline::{ReviewOutcome, ReviewPipeline};

#[derive(Parser)]
#[command(
    name = "revhook",
    version,
    about = "Local-model code review on every git commit",
    long_about = "revhook installs a global git pre-commit hook that sends the staged diff,\n\
                  file by file, to a locally hosted language model and writes the suggested\n\
                  review comments to .code_review/.\n\n\
                  Examples:\n  \
                    revhook init                          Install the global pre-commit hook\n  \
                    revhook --diff staged.diff abc123     Review a diff file for commit abc123",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Review a diff file, naming artifacts after the commit id
    #[arg(long, num_args = 2, value_names = ["DIFF_FILE", "COMMIT_ID"])]
    diff: Option<Vec<String>>,

    /// Path to configuration file (default: .revhook.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (prompts, requests)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Install the global pre-commit hook
    #[command(long_about = "Install the global pre-commit hook.\n\n\
        Copies the bundled pre-commit script into ~/.git-hooks (or [hook] hooks_dir),\n\
        marks it executable, and runs `git config --global core.hooksPath`.")]
    Init {
        /// Also fetch the model configured in [engine] model_path / model_url
        #[arg(long)]
        download_model: bool,
    },
}

const USAGE: &str = "\
Usage:
  revhook init
  revhook --diff <DIFF_FILE> <COMMIT_ID>";

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,revhook=debug,revhook_review=debug,revhook_difflens=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(explicit: Option<&Path>) -> Result<RevhookConfig> {
    let mut config = match explicit {
        Some(path) => RevhookConfig::from_file(path)
            .wrap_err(format!("loading {}", path.display()))?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                RevhookConfig::from_file(default_path)
                    .wrap_err(format!("loading {DEFAULT_CONFIG_FILE}"))?
            } else {
                RevhookConfig::default()
            }
        }
    };
    config.apply_env();
    Ok(config)
}

async fn ensure_model(config: &RevhookConfig) -> Result<()> {
    match model::ensure_model(&config.engine).await? {
        ModelStatus::Downloaded(path) => println!("Model saved to {}", path.display()),
        ModelStatus::Present(path) => tracing::debug!(path = %path.display(), "model present"),
        ModelStatus::NotConfigured => {}
    }
    Ok(())
}

async fn run_review(
    config: &RevhookConfig,
    diff_path: &Path,
    commit_id: &str,
    verbose: bool,
) -> Result<ReviewOutcome> {
    ensure_model(config).await?;

    let engine = LlmClient::open(&config.engine)?;
    tracing::debug!(endpoint = %engine.endpoint(), model = engine.model(), "engine opened");

    let pipeline = ReviewPipeline::new(engine, config.review.clone());
    let report = pipeline
        .run(diff_path, commit_id)
        .await
        .wrap_err(format!("reviewing {}", diff_path.display()))?;

    if verbose {
        eprint!("{report}");
    }
    let outcome = report.outcome();
    if matches!(
        outcome,
        ReviewOutcome::Partial { .. } | ReviewOutcome::TotalFailure { .. }
    ) {
        eprintln!("\u{274c} {outcome}");
    }
    Ok(outcome)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return Ok(ExitCode::SUCCESS);
        }
        Err(_) => {
            println!("\u{274c} Unknown command. Use:\n{USAGE}");
            return Ok(ExitCode::SUCCESS);
        }
    };

    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match (cli.command, cli.diff) {
        (Some(Command::Init { download_model }), _) => {
            println!("\u{1f527} Setting up global Git hook...");
            let script = revhook_review::hook::install_global_hook(&config.hook)?;
            println!("\u{2705} Global pre-commit hook installed at {}", script.display());
            if download_model {
                ensure_model(&config).await?;
            }
            Ok(ExitCode::SUCCESS)
        }
        (None, Some(args)) => {
            let [diff_path, commit_id] = args.as_slice() else {
                println!("{USAGE}");
                return Ok(ExitCode::SUCCESS);
            };
            let outcome =
                run_review(&config, Path::new(diff_path), commit_id, cli.verbose).await?;
            Ok(ExitCode::from(outcome.exit_code()))
        }
        (None, None) => {
            println!("{USAGE}");
            Ok(ExitCode::SUCCESS)
        }
    }
}
