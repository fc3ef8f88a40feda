use std::path::{Path, PathBuf};

use chatguard_core::{parse_repository, ChatGuardConfig};
use chatguard_moderation::classifier::SentimentAssistant;
use chatguard_moderation::github::GitHubClient;
use chatguard_moderation::llm::LlmClient;
use chatguard_moderation::pipeline::{ModerationPipeline, Outcome};
use clap::{Args, CommandFactory, Parser, Subcommand};
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing::{info, Instrument};
use tracing_subscriber::EnvFilter;

const CONFIG_FILE: &str = ".chatguard.toml";

#[derive(Parser)]
#[command(
    name = "chatguard",
    version,
    about = "Sentiment moderation for GitHub issues, pull requests and discussions",
    long_about = "ChatGuard classifies the content of a GitHub event with a chat completion\n\
                   model and, when the sentiment is negative, posts a moderation comment\n\
                   on the issue, pull request or discussion it belongs to.\n\n\
                   Examples:\n  \
                     chatguard run                                  Use GITHUB_EVENT_* from Actions\n  \
                     chatguard run --event-name issues --event-path event.json --dry-run\n  \
                     chatguard init                                 Write a default .chatguard.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .chatguard.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Moderate one webhook event
    #[command(long_about = "Moderate one webhook event.\n\n\
        Reads the event document, asks the model for a sentiment verdict and,\n\
        for negative content, comments on the parent issue, pull request or\n\
        discussion. Exits 0 when nothing needs to be done.")]
    Run(RunArgs),
    /// Create a default .chatguard.toml configuration file
    #[command(long_about = "Create a default .chatguard.toml configuration file.\n\n\
        Generates a commented template with all available options.\n\
        Fails if .chatguard.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Webhook event name (issues, issue_comment, discussion, ...)
    #[arg(long, env = "GITHUB_EVENT_NAME")]
    event_name: Option<String>,

    /// Path to the webhook event JSON document
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<PathBuf>,

    /// Repository slug (owner/name), used for log context
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    /// Deadline for the whole run in seconds
    #[arg(long, env = "CHATGUARD_TIMEOUT")]
    timeout: Option<u64>,

    /// Chat completion model
    #[arg(long, env = "CHATGUARD_MODEL")]
    model: Option<String>,

    /// GitHub GraphQL endpoint
    #[arg(long, env = "GITHUB_GRAPHQL_URL")]
    graphql_url: Option<String>,

    /// Base URL of an OpenAI-compatible completion API
    #[arg(long, env = "OPENAI_BASE_URL")]
    llm_base_url: Option<String>,

    /// API key for the completion API
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Token used for GraphQL mutations
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Print the comment instead of posting it
    #[arg(long)]
    dry_run: bool,
}

impl RunArgs {
    /// Overlay flags and environment values onto the file configuration.
    fn apply(&self, config: &mut ChatGuardConfig) {
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(url) = &self.llm_base_url {
            config.llm.base_url = Some(url.clone());
        }
        if let Some(key) = &self.openai_api_key {
            config.llm.api_key = Some(key.clone());
        }
        if let Some(url) = &self.graphql_url {
            config.github.graphql_url = url.clone();
        }
        if let Some(token) = &self.github_token {
            config.github.token = Some(token.clone());
        }
    }
}

const DEFAULT_CONFIG: &str = r#"# ChatGuard Configuration
# Values set here are overridden by environment variables and CLI flags.

# Deadline for a whole run, in seconds
# timeout_secs = 60

[llm]
# OpenAI-compatible chat completion API (key: OPENAI_API_KEY)
# model = "gpt-3.5-turbo"
# base_url = "https://api.openai.com"

[github]
# Token is read from GITHUB_TOKEN
# graphql_url = "https://api.github.com/graphql"
"#;

fn load_config(path: Option<&Path>) -> Result<ChatGuardConfig> {
    match path {
        Some(path) => ChatGuardConfig::from_file(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to load {}", path.display())),
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                ChatGuardConfig::from_file(default_path)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("failed to load {CONFIG_FILE}"))
            } else {
                Ok(ChatGuardConfig::default())
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

async fn run(args: RunArgs, mut config: ChatGuardConfig) -> Result<()> {
    args.apply(&mut config);

    let event_name = args
        .event_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| miette::miette!("event name not set. Pass --event-name or set GITHUB_EVENT_NAME"))?;
    let event_path = args
        .event_path
        .as_deref()
        .ok_or_else(|| miette::miette!("event path not set. Pass --event-path or set GITHUB_EVENT_PATH"))?;
    config.validate().into_diagnostic()?;

    let repository = match args.repository.as_deref().filter(|r| !r.is_empty()) {
        Some(slug) => {
            let (owner, name) = parse_repository(slug).into_diagnostic()?;
            format!("{owner}/{name}")
        }
        None => String::new(),
    };

    let llm = LlmClient::new(&config.llm).into_diagnostic()?;
    let github = GitHubClient::new(&config.github).into_diagnostic()?;
    let pipeline = ModerationPipeline::new(SentimentAssistant::new(llm), github, config.timeout())
        .with_dry_run(args.dry_run);

    let span = tracing::info_span!("run", event = event_name, repository = %repository);
    let outcome = pipeline
        .run_file(event_name, event_path)
        .instrument(span)
        .await
        .into_diagnostic()
        .wrap_err("moderation run failed")?;

    info!(%outcome, "run complete");
    if let Outcome::DryRun { target, body } = &outcome {
        println!("{} on {}:\n\n{body}", target.mutation_name(), target.id());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run(args) => {
            let config = load_config(cli.config.as_deref())?;
            run(args, config).await?;
        }
        Command::Init => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!("{CONFIG_FILE} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE} with default configuration");
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "chatguard", &mut std::io::stdout());
        }
    }

    Ok(())
}
