use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use idea_forge_lib::backend::HttpTransport;
use idea_forge_lib::config::{resolve_settings, PartialSettings, Settings};
use idea_forge_lib::events::LogSink;
use idea_forge_lib::parsers::load_configuration;
use idea_forge_lib::server::{self, ServerAppState};
use idea_forge_lib::shutdown::{finish_shutdown, register_signal_handlers, ShutdownState};
use idea_forge_lib::transform::render_content;
use idea_forge_lib::{GenerationOutcome, Workflow};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

/// Idea Forge - turns a brand configuration into content ideas and articles
#[derive(Parser, Debug)]
#[command(name = "idea-forge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (defaults to <config dir>/idea-forge/settings.toml)
    #[arg(long, global = true, env = "IDEA_FORGE_SETTINGS")]
    settings: Option<PathBuf>,

    /// Idea-generation service URL
    #[arg(long, global = true, env = "IDEA_FORGE_IDEA_ENDPOINT")]
    idea_endpoint: Option<String>,

    /// Content-generation service URL; repeat to add fallbacks, tried in order
    #[arg(
        long = "content-endpoint",
        global = true,
        env = "IDEA_FORGE_CONTENT_ENDPOINTS",
        value_delimiter = ','
    )]
    content_endpoints: Vec<String>,

    /// Port to bind the server to
    #[arg(long, global = true, env = "IDEA_FORGE_PORT")]
    port: Option<u16>,

    /// Address to bind the server to
    #[arg(long, global = true, env = "IDEA_FORGE_BIND")]
    bind: Option<String>,

    /// Allowed browser origin; repeat for several (default: any)
    #[arg(
        long = "cors-origin",
        global = true,
        env = "IDEA_FORGE_CORS_ORIGINS",
        value_delimiter = ','
    )]
    cors_origins: Vec<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP/WebSocket server (default)
    Serve,

    /// Submit a configuration file and print the returned ideas as JSON
    Ideas {
        /// Configuration document (.json)
        file: PathBuf,
    },

    /// Submit a configuration file and generate content for one idea
    Generate {
        /// Configuration document (.json)
        file: PathBuf,

        /// Zero-based index of the idea in the returned batch
        #[arg(long, short)]
        index: usize,

        /// Print the raw service text instead of the rendered markup
        #[arg(long)]
        raw: bool,
    },

    /// Render raw content text to markup (reads stdin without a file)
    Render { file: Option<PathBuf> },
}

impl Cli {
    fn overrides(&self) -> PartialSettings {
        PartialSettings {
            idea_endpoint: self.idea_endpoint.clone(),
            content_endpoints: non_empty(&self.content_endpoints),
            port: self.port,
            bind: self.bind.clone(),
            cors_origins: non_empty(&self.cors_origins),
        }
    }
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values.to_vec())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::init();

    if let Some(Command::Render { file }) = &cli.command {
        return render_file(file.as_ref());
    }

    let settings = resolve_settings(cli.settings.as_deref(), cli.overrides())?;
    log::debug!("Effective settings: {:?}", settings);

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    rt.block_on(async move {
        match cli.command.unwrap_or(Command::Serve) {
            Command::Serve => run_server_mode(settings).await,
            Command::Ideas { file } => print_ideas(settings, file).await,
            Command::Generate { file, index, raw } => {
                generate_one(settings, file, index, raw).await
            }
            Command::Render { .. } => Ok(()),
        }
    })
}

async fn run_server_mode(settings: Settings) -> Result<()> {
    let shutdown_state = ShutdownState::new();
    if let Err(e) = register_signal_handlers(shutdown_state.clone()) {
        log::warn!("Failed to register signal handlers: {}", e);
    }

    let transport = HttpTransport::new().map_err(anyhow::Error::msg)?;
    let state = ServerAppState::new(settings, Arc::new(transport), shutdown_state.clone());
    let workflow = state.workflow.clone();

    server::run_server(state).await.map_err(anyhow::Error::msg)?;

    let report = finish_shutdown(&shutdown_state, &workflow.snapshot());
    if !report.is_clean() {
        eprintln!(
            "Stopped with {} generation(s) still in flight",
            report.abandoned.len()
        );
    }
    Ok(())
}

/// One-shot workflow whose events only go to the log
fn cli_workflow(settings: &Settings) -> Result<Workflow> {
    let transport = HttpTransport::new().map_err(anyhow::Error::msg)?;
    Ok(Workflow::new(settings, Arc::new(transport), Arc::new(LogSink)))
}

async fn submit(workflow: &Workflow, file: PathBuf) -> Result<()> {
    let configuration = load_configuration(&file)?;
    if let Err(e) = workflow.submit_configuration(configuration).await {
        if let Some(raw) = workflow.snapshot().raw_payload {
            eprintln!("{}", raw);
        }
        return Err(e.into());
    }
    Ok(())
}

async fn print_ideas(settings: Settings, file: PathBuf) -> Result<()> {
    let workflow = cli_workflow(&settings)?;
    submit(&workflow, file).await?;

    let ideas = workflow.ideas();
    println!("{}", serde_json::to_string_pretty(&ideas)?);
    Ok(())
}

async fn generate_one(settings: Settings, file: PathBuf, index: usize, raw: bool) -> Result<()> {
    let workflow = cli_workflow(&settings)?;
    submit(&workflow, file).await?;

    match workflow.generate(index).await? {
        GenerationOutcome::Completed { .. } => {
            let content = workflow
                .rendered_content()
                .context("Generated content was not recorded")?;
            println!("{}", if raw { content.raw } else { content.markup });
            Ok(())
        }
        GenerationOutcome::Failed { reason, .. } => bail!("{}", reason),
        GenerationOutcome::Stale { .. } => bail!("Batch was replaced during generation"),
    }
}

fn render_file(file: Option<&PathBuf>) -> Result<()> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    println!("{}", render_content(&raw));
    Ok(())
}
