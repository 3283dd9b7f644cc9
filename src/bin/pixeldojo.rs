//! PixelDojo command-line interface.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use pixeldojo::types::{ASPECT_RATIOS, MODELS};
use pixeldojo::{
    AspectRatio, Config, Error, GenerateOptions, GenerateResponse, Model, PixelDojoClient,
};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pixeldojo")]
#[command(author, version, about = "PixelDojo AI image generation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging and detailed error output
    #[arg(long, global = true, env = "PIXELDOJO_DEBUG")]
    debug: bool,
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
    Urls,
    Quiet,
}

#[derive(clap::Args)]
struct GenerationArgs {
    /// Model id (see `pixeldojo models`)
    #[arg(short, long)]
    model: Option<String>,
    /// Aspect ratio (see `pixeldojo ratios`)
    #[arg(short, long)]
    aspect_ratio: Option<String>,
    /// Number of images per prompt (1-4)
    #[arg(short, long = "num")]
    num_outputs: Option<u8>,
    /// Random seed for reproducibility
    #[arg(short, long)]
    seed: Option<i64>,
    /// Output format
    #[arg(short, long = "output", value_enum, default_value = "table")]
    output: OutputFormat,
    /// Download images to this directory
    #[arg(short, long)]
    download: Option<PathBuf>,
    /// API key (overrides stored configuration)
    #[arg(short = 'k', long, env = "PIXELDOJO_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate images from a text prompt
    Generate {
        /// Image description
        prompt: String,
        #[command(flatten)]
        args: GenerationArgs,
    },

    /// Generate images for several prompts concurrently
    Batch {
        /// Prompts to generate
        prompts: Vec<String>,
        /// Read additional prompts from a file, one per line
        #[arg(long)]
        file: Option<PathBuf>,
        /// Maximum requests in flight
        #[arg(long, default_value_t = 3)]
        max_concurrent: usize,
        #[command(flatten)]
        args: GenerationArgs,
    },

    /// List available models
    Models,

    /// List available aspect ratios
    Ratios,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Store an API key in the OS keyring
    SetKey {
        /// Key to store; read from stdin when omitted
        key: Option<String>,
    },
    /// Remove the stored API key
    ClearKey {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Check connectivity and authentication
    Test,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, cli.debug);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("pixeldojo=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pixeldojo=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Generate { prompt, args } => cmd_generate(&prompt, args).await,
        Commands::Batch {
            prompts,
            file,
            max_concurrent,
            args,
        } => cmd_batch(prompts, file.as_deref(), max_concurrent, args).await,
        Commands::Models => {
            cmd_models();
            Ok(())
        }
        Commands::Ratios => {
            cmd_ratios();
            Ok(())
        }
        Commands::Config { action } => cmd_config(action).await,
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    }
}

// ============================================================================
// Error rendering
// ============================================================================

fn report_error(err: &anyhow::Error, debug: bool) {
    match err.downcast_ref::<Error>() {
        Some(Error::Authentication { .. }) => {
            eprintln!("Error: Authentication failed. Check your API key.")
        }
        Some(e @ Error::InsufficientCredits { .. }) => {
            eprintln!("Error: Insufficient credits. {}", e)
        }
        Some(e @ Error::RateLimit { .. }) => eprintln!("Error: Rate limit exceeded. {}", e),
        Some(e) => eprintln!("Error: {}", e),
        None => eprintln!("Error: {:#}", err),
    }
    if debug {
        eprintln!("{:?}", err);
    }
}

// ============================================================================
// Generation
// ============================================================================

fn load_config() -> anyhow::Result<Config> {
    Config::load().context("failed to load configuration")
}

fn build_client(config: &Config, api_key: Option<&str>) -> anyhow::Result<PixelDojoClient> {
    let mut builder = PixelDojoClient::builder().config(config.clone());
    if let Some(key) = api_key {
        builder = builder.api_key(key);
    }
    let client = builder.build()?;
    if !client.is_authenticated() {
        bail!("No API key configured. Use 'pixeldojo config set-key' to configure.");
    }
    Ok(client)
}

fn resolve_options(config: &Config, args: &GenerationArgs) -> anyhow::Result<GenerateOptions> {
    let model_id = args.model.as_deref().unwrap_or(&config.default_model);
    let model: Model = match model_id.parse() {
        Ok(m) => m,
        Err(_) => {
            eprintln!("Available models:");
            for info in Model::all() {
                eprintln!("  {:<24} {}", info.id, info.description);
            }
            bail!("Invalid model: {}", model_id);
        }
    };

    let ratio_id = args
        .aspect_ratio
        .as_deref()
        .unwrap_or(&config.default_aspect_ratio);
    let aspect_ratio: AspectRatio = match ratio_id.parse() {
        Ok(r) => r,
        Err(_) => {
            let ids: Vec<&str> = AspectRatio::all().map(|info| info.id).collect();
            eprintln!("Available ratios: {}", ids.join(", "));
            bail!("Invalid aspect ratio: {}", ratio_id);
        }
    };

    Ok(GenerateOptions::new()
        .with_model(model)
        .with_aspect_ratio(aspect_ratio)
        .with_num_outputs(args.num_outputs.unwrap_or(config.default_num_outputs))
        .with_seed(args.seed))
}

fn progress_bar(len: u64, template: &str) -> ProgressBar {
    let bar = ProgressBar::new(len);
    let style = ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar
}

async fn cmd_generate(prompt: &str, args: GenerationArgs) -> anyhow::Result<()> {
    let config = load_config()?;
    let options = resolve_options(&config, &args)?;
    let client = build_client(&config, args.api_key.as_deref())?;

    let bar = progress_bar(100, "{spinner} {msg:<28} [{bar:30}] {pos:>3}% {elapsed}");
    bar.set_message("Generating...");
    if matches!(args.output, OutputFormat::Quiet) {
        bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }
    let on_progress = |status: &str, fraction: f64| {
        bar.set_message(status.to_string());
        bar.set_position((fraction * 100.0).round() as u64);
    };

    let _session = client.session()?;
    let outcome = client.generate(prompt, &options, Some(&on_progress)).await;
    bar.finish_and_clear();
    let response = outcome?;

    render_response(&response, prompt, args.output)?;
    if let Some(dir) = args.download.as_deref() {
        download_all(&client, &response, dir, &download_stamp(), None).await?;
    }
    Ok(())
}

async fn cmd_batch(
    mut prompts: Vec<String>,
    file: Option<&Path>,
    max_concurrent: usize,
    args: GenerationArgs,
) -> anyhow::Result<()> {
    if let Some(path) = file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read prompts from {}", path.display()))?;
        prompts.extend(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        );
    }
    if prompts.is_empty() {
        bail!("No prompts given");
    }

    let config = load_config()?;
    let options = resolve_options(&config, &args)?;
    let client = build_client(&config, args.api_key.as_deref())?;

    let bar = progress_bar(prompts.len() as u64, "{spinner} [{bar:30}] {pos}/{len} {elapsed}");
    if matches!(args.output, OutputFormat::Quiet) {
        bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }
    let on_progress = |done: usize, _total: usize, _: Option<&GenerateResponse>| {
        bar.set_position(done as u64);
    };

    let _session = client.session()?;
    let results = client
        .generate_batch(&prompts, &options, max_concurrent, Some(&on_progress))
        .await;
    bar.finish_and_clear();

    let mut failures = 0;
    for (i, (prompt, result)) in prompts.iter().zip(&results).enumerate() {
        match result {
            Ok(response) => match args.output {
                OutputFormat::Table => println!(
                    "{:>3}  ok    {:<40}  {}",
                    i + 1,
                    truncate(prompt, 40),
                    response.image_urls().join(" ")
                ),
                OutputFormat::Json => println!("{}", serde_json::to_string(response)?),
                OutputFormat::Urls => {
                    for url in response.image_urls() {
                        println!("{}", url);
                    }
                }
                OutputFormat::Quiet => {}
            },
            Err(e) => {
                failures += 1;
                if !matches!(args.output, OutputFormat::Quiet) {
                    eprintln!("{:>3}  FAIL  {:<40}  {}", i + 1, truncate(prompt, 40), e);
                }
            }
        }
    }

    if let Some(dir) = args.download.as_deref() {
        let stamp = download_stamp();
        for (i, result) in results.iter().enumerate() {
            if let Ok(response) = result {
                download_all(&client, response, dir, &stamp, Some(i + 1)).await?;
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} prompts failed", failures, prompts.len());
    }
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn render_response(
    response: &GenerateResponse,
    prompt: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            println!();
            println!("{:<3} {:<12} {:<12} URL", "#", "Dimensions", "Seed");
            for (i, image) in response.iter().enumerate() {
                let seed = image
                    .seed()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "N/A".to_string());
                println!(
                    "{:<3} {:<12} {:<12} {}",
                    i + 1,
                    image.dimensions(),
                    seed,
                    image.url()
                );
            }
            println!();
            println!("Prompt:  {}", truncate(prompt, 80));
            println!(
                "Credits: {:.2} used, {:.2} remaining",
                response.credits_used(),
                response.credits_remaining()
            );
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(response)?),
        OutputFormat::Urls => {
            for url in response.image_urls() {
                println!("{}", url);
            }
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}

fn download_stamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// `pixeldojo_<stamp>[_<prompt>]_<image>.png`, all indices 1-based.
fn download_path(dir: &Path, stamp: &str, prompt: Option<usize>, image: usize) -> PathBuf {
    let name = match prompt {
        Some(p) => format!("pixeldojo_{}_{}_{}.png", stamp, p, image),
        None => format!("pixeldojo_{}_{}.png", stamp, image),
    };
    dir.join(name)
}

async fn download_all(
    client: &PixelDojoClient,
    response: &GenerateResponse,
    dir: &Path,
    stamp: &str,
    prompt: Option<usize>,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut saved = Vec::with_capacity(response.len());
    if response.is_empty() {
        return Ok(saved);
    }
    eprintln!("Downloading to {}...", dir.display());
    for (i, image) in response.iter().enumerate() {
        let path = download_path(dir, stamp, prompt, i + 1);
        client
            .download_image(image.url().as_str(), Some(&path))
            .await?;
        eprintln!("  Saved: {}", path.display());
        saved.push(path);
    }
    Ok(saved)
}

// ============================================================================
// Catalogs
// ============================================================================

fn cmd_models() {
    println!("{:<24} {:<22} Description", "Model ID", "Name");
    for info in MODELS.iter() {
        println!(
            "{:<24} {:<22} {}",
            info.id, info.display_name, info.description
        );
    }
}

fn cmd_ratios() {
    println!("{:<6} {:<22} Dimensions", "Ratio", "Name");
    for info in ASPECT_RATIOS.iter() {
        let (w, h) = info.approx_dimensions;
        println!("{:<6} {:<22} ~{}x{}", info.id, info.display_name, w, h);
    }
}

// ============================================================================
// Configuration
// ============================================================================

fn read_line(prompt: &str) -> anyhow::Result<String> {
    eprint!("{}", prompt);
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

async fn cmd_config(action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config()?;
            let rows = [
                ("API Key", config.masked_api_key()),
                ("API URL", config.api_url.clone()),
                ("Timeout", format!("{}s", config.timeout)),
                ("Max Retries", config.max_retries.to_string()),
                ("Retry Delay", format!("{}s", config.retry_delay)),
                ("Max Connections", config.max_connections.to_string()),
                ("Default Model", config.default_model.clone()),
                ("Default Aspect Ratio", config.default_aspect_ratio.clone()),
                ("Default Outputs", config.default_num_outputs.to_string()),
                ("Download Directory", config.download_dir.display().to_string()),
                ("Config File", pixeldojo::config::config_file_path().display().to_string()),
                ("Debug Mode", config.debug.to_string()),
            ];
            for (name, value) in rows {
                println!("{:<22} {}", name, value);
            }
            Ok(())
        }
        ConfigAction::SetKey { key } => {
            let key = match key {
                Some(k) => k,
                None => read_line("Enter your PixelDojo API key: ")?,
            };
            if key.is_empty() {
                bail!("API key cannot be empty");
            }
            let mut config = load_config()?;
            config.save_api_key(&key)?;
            println!("API key saved to secure storage");
            Ok(())
        }
        ConfigAction::ClearKey { yes } => {
            if !yes {
                let answer = read_line("Remove the stored API key? [y/N] ")?;
                if !matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes") {
                    return Ok(());
                }
            }
            let mut config = load_config()?;
            config.delete_api_key()?;
            println!("API key removed from secure storage");
            Ok(())
        }
        ConfigAction::Test => {
            let config = load_config()?;
            let client = build_client(&config, None)?;
            eprintln!("Testing connection...");
            let options = GenerateOptions::default();
            let response = client
                .scoped(|c| c.generate("test", &options, None))
                .await?;
            println!(
                "Connection successful! Credits remaining: {:.2}",
                response.credits_remaining()
            );
            Ok(())
        }
    }
}

fn cmd_version() {
    println!("pixeldojo {}", env!("CARGO_PKG_VERSION"));
    println!("Platform: {}-{}", std::env::consts::OS, std::env::consts::ARCH);
}
