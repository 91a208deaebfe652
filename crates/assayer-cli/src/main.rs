//! Assayer CLI
//!
//! A command-line tool for compiling and running code submissions.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use assayer::{Config, EXAMPLE_CONFIG, ExecutionRequest, ExecutionResult, Runner, Toolchain};
use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

/// Exit code for requests naming an unregistered language
const EXIT_UNSUPPORTED_LANGUAGE: i32 = 2;

#[derive(Parser)]
#[command(name = "assayer")]
#[command(about = "A tool for compiling and running untrusted code submissions")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new configuration file
    Init {
        /// Output path (default: assayer.toml)
        #[arg(short, long, default_value = "assayer.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Run a program (compile if needed, then execute)
    Run {
        /// Source file to run
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Language ID (e.g., python, cpp)
        #[arg(short, long)]
        language: String,

        /// Input file fed to the program's stdin (default: empty)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Time limit in seconds (default: the language's)
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Execute a JSON request read from stdin and print the JSON result
    Exec,

    /// List available languages
    Languages {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show effective configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Init { ref output, force } = cli.command {
        return init_config(output, force).await;
    }

    // Load configuration
    let config = if let Some(ref path) = cli.config {
        info!(?path, "loading configuration");
        Config::from_file(path).context("failed to load configuration")?
    } else {
        debug!("using default configuration");
        Config::default()
    };

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Run {
            source,
            language,
            input,
            timeout,
            json,
        } => run_execute(config, &source, language, input.as_deref(), timeout, json).await,
        Commands::Exec => run_exec(config).await,
        Commands::Languages { json } => list_languages(config, json).await,
        Commands::ShowConfig => {
            show_config(&config);
            Ok(())
        }
    }
}

async fn run_execute(
    config: Config,
    source: &Path,
    language_id: String,
    input: Option<&Path>,
    timeout: Option<u64>,
    json: bool,
) -> Result<()> {
    let source_code = tokio::fs::read_to_string(source)
        .await
        .context("failed to read source file")?;

    let stdin = match input {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .context("failed to read input file")?,
        None => String::new(),
    };

    let mut request = ExecutionRequest::new(language_id, source_code).with_stdin(stdin);
    request.timeout_seconds = timeout;

    info!(language = %request.language, "running program");

    let runner = Runner::new(config);
    let result = runner
        .execute(&request)
        .await
        .context("unknown language")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if !result.stdout.is_empty() {
            println!("{}", result.stdout);
        }
        if !result.stderr.is_empty() {
            eprintln!("{}", result.stderr);
        }
    }

    // Log execution info via tracing (stderr), keeping stdout clean for piping
    info!(
        status = %result.status,
        time = format_args!("{}ms", result.execution_time_ms),
        exit_code = result.exit_code,
        timed_out = result.timed_out,
        "execution result"
    );

    exit_with(&result)
}

async fn run_exec(config: Config) -> Result<()> {
    let mut body = String::new();
    tokio::io::stdin()
        .read_to_string(&mut body)
        .await
        .context("failed to read request from stdin")?;

    let request: ExecutionRequest =
        serde_json::from_str(&body).context("failed to parse execution request")?;

    let runner = Runner::new(config);
    match runner.execute(&request).await {
        Ok(result) => {
            println!("{}", serde_json::to_string(&result)?);
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::json!({ "error": e.to_string() }));
            std::process::exit(EXIT_UNSUPPORTED_LANGUAGE);
        }
    }
}

/// Exit with the program's exit code unless it was accepted
fn exit_with(result: &ExecutionResult) -> Result<()> {
    if result.is_success() {
        Ok(())
    } else if result.exit_code == 0 {
        std::process::exit(1);
    } else {
        std::process::exit(result.exit_code);
    }
}

async fn list_languages(config: Config, json: bool) -> Result<()> {
    let runner = Runner::new(config);
    let languages = runner.list_languages().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&languages)?);
        return Ok(());
    }

    println!("Available languages:\n");

    for info in languages {
        let marker = if info.available { "+" } else { "-" };
        println!(
            "  {marker} {:<12} {:<12} {:>3}s  {}",
            info.id, info.name, info.timeout_seconds, info.version
        );
    }
    Ok(())
}

fn show_config(config: &Config) {
    println!("Scratch root: {}", config.scratch_root().display());
    println!("Probe timeout: {}s", config.probe_timeout_seconds);
    println!("Compile timeout: {}s", config.compile_timeout_seconds);
    println!("Max output: {} bytes per stream", config.max_output_bytes);
    println!();
    println!("Languages configured: {}", config.languages.len());

    let mut languages: Vec<_> = config.languages.iter().collect();
    languages.sort_by_key(|(id, _)| *id);

    for (id, lang) in languages {
        println!();
        println!("  {id} ({})", lang.name);
        println!("    source:  {}", lang.source_name());
        println!("    timeout: {}s", lang.timeout_seconds);
        match lang.toolchain() {
            Toolchain::Interpreted { run } => {
                println!("    run:     {}", run.join(" "));
            }
            Toolchain::FixedArtifact { compile, run, .. }
            | Toolchain::DerivedName { compile, run, .. } => {
                println!("    compile: {}", compile.join(" "));
                println!("    run:     {}", run.join(" "));
            }
        }
    }
}

async fn init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at '{}'. Use --force to overwrite.",
            output.display()
        );
    }

    tokio::fs::write(output, EXAMPLE_CONFIG)
        .await
        .context("failed to write configuration file")?;

    println!("Created configuration file at '{}'", output.display());
    Ok(())
}
