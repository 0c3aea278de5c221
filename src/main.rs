use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use faultline::analyzer::{AnalysisRequest, Analyzer, SAMPLE_ERRORS, SAMPLE_REPOS};
use faultline::api::{self, ApiState};
use faultline::config::{setup_interactive, Config};
use faultline::llm::LlmClient;
use faultline::logging;
use faultline::story::{generate_story, DEFAULT_MODEL_TYPE};
use std::io::{self, Read};
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "faultline",
    about = "Root-cause analysis for production errors using recent repository changes",
    version
)]
struct Args {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze an error against a repository's recent changes
    Analyze {
        /// Azure DevOps repository URL
        #[arg(short, long)]
        repo: String,

        /// Error message, or `-` to read it from stdin
        #[arg(short, long)]
        error: String,

        /// Days of history to consider (default: from config, 14)
        #[arg(short, long)]
        days: Option<u32>,

        /// Maximum files to analyze (default: from config, 40)
        #[arg(long)]
        max_files: Option<usize>,
    },
    /// Generate ticket content from a description
    Story {
        /// What the ticket is about
        description: String,

        #[arg(long, default_value = DEFAULT_MODEL_TYPE)]
        model_type: String,
    },
    /// List sample errors and repositories
    Samples,
    /// Run the REST API
    Serve {
        /// Address to bind (default: from config, 0.0.0.0:8000)
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Store the endpoint URL and secrets
    Setup,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = Config::load();

    match args.command {
        Command::Analyze {
            repo,
            error,
            days,
            max_files,
        } => {
            let error = read_error_arg(error)?;
            let request = AnalysisRequest::new(error, repo)
                .with_days(days.unwrap_or(config.lookback_days))
                .with_max_files(max_files.unwrap_or(config.max_files));

            let analyzer = Analyzer::from_config(&config)?;
            let transcript = analyzer
                .transcript(&request, |line| eprintln!("  {}", line))
                .await;
            println!("{}", transcript);
        }
        Command::Story {
            description,
            model_type,
        } => {
            let llm = LlmClient::from_config(&config)?;
            match generate_story(&llm, &description, &model_type).await {
                Ok(content) => println!("{}", content),
                Err(err) => {
                    eprintln!("{}", err);
                    std::process::exit(1);
                }
            }
        }
        Command::Samples => print_samples(),
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.bind.clone());
            let addr: SocketAddr = bind
                .parse()
                .with_context(|| format!("Invalid bind address: {}", bind))?;
            let state = Arc::new(ApiState::from_config(&config)?);
            eprintln!("  faultline API listening on http://{}", addr);
            api::run(addr, state).await?;
        }
        Command::Setup => {
            if let Err(err) = setup_interactive() {
                eprintln!("Setup failed: {}", err);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// `-` means the error text arrives on stdin (stack traces span lines).
fn read_error_arg(error: String) -> Result<String> {
    if error != "-" {
        return Ok(error);
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read error message from stdin")?;
    Ok(buf)
}

fn print_samples() {
    println!("Sample errors:");
    for (i, error) in SAMPLE_ERRORS.iter().enumerate() {
        println!("  {}. {}", i + 1, error);
    }
    println!();
    println!("Sample repositories:");
    for repo in SAMPLE_REPOS {
        println!("  {} ({})", repo.name, repo.description);
        println!("    {}", repo.url);
    }
}
