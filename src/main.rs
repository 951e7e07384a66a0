mod answer;
mod backend;
mod config;
mod gemini;
mod pipeline;
mod report;
mod search;
mod translate;

pub const USER_AGENT: &str = concat!("symptom-scout/", env!("CARGO_PKG_VERSION"));

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use config::Config;
use pipeline::{Pipeline, PipelineError};
use search::{Source, SourceSelection};

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Global HTTP client timeout covering DNS + connect + response body.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// Maximum redirect hops before aborting.
const MAX_REDIRECTS: usize = 5;

/// Translate symptom descriptions into medical terms and gather literature,
/// consumer-health pages, and a grounded AI summary.
///
/// Credentials are read from the environment: GEMINI_API_KEY, OPENAI_API_KEY,
/// ANTHROPIC_API_KEY (translation, in that priority), NCBI_API_KEY,
/// GOOGLE_CSE_API_KEY and GOOGLE_CSE_ID (site search). All are optional.
#[derive(Parser)]
#[command(name = "symptom-scout", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Translate a symptom description into medical terminology
    Translate { query: String },
    /// Generate a search-grounded AI answer
    AiSearch {
        query: String,
        /// Medical terms from `translate` (defaults to the query)
        #[arg(long, default_value = "")]
        terms: String,
        #[command(flatten)]
        sources: SourceArgs,
    },
    /// Search the enabled sources
    Search {
        query: String,
        #[command(flatten)]
        sources: SourceArgs,
    },
    /// Translate, then answer and search in one go
    Consult {
        query: String,
        #[command(flatten)]
        sources: SourceArgs,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Only query these sources (comma-separated; default: all)
    #[arg(long, value_enum, value_delimiter = ',')]
    only: Vec<Source>,
    /// Sources to skip (comma-separated)
    #[arg(long, value_enum, value_delimiter = ',')]
    exclude: Vec<Source>,
}

impl SourceArgs {
    fn selection(&self) -> SourceSelection {
        if self.only.is_empty() {
            return SourceSelection::excluding(&self.exclude);
        }
        let included: Vec<Source> = self
            .only
            .iter()
            .copied()
            .filter(|s| !self.exclude.contains(s))
            .collect();
        SourceSelection::only(&included)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Markdown,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("symptom_scout=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let http = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()?;
    let pipeline = Pipeline::new(Config::from_env(), http);

    let outcome = match &cli.command {
        Command::Translate { query } => to_json(pipeline.translate(query).await),
        Command::AiSearch {
            query,
            terms,
            sources,
        } => to_json(
            pipeline
                .ai_search(query, terms, &sources.selection())
                .await,
        ),
        Command::Search { query, sources } => {
            to_json(pipeline.search(query, &sources.selection()).await)
        }
        Command::Consult {
            query,
            sources,
            format,
        } => match (pipeline.consult(query, &sources.selection()).await, format) {
            (Ok(consultation), Format::Markdown) => {
                Ok(Ok(report::format_consultation(&consultation)))
            }
            (result, _) => to_json(result),
        },
    };

    match outcome? {
        Ok(output) => {
            println!("{output}");
            info!("done");
            Ok(ExitCode::SUCCESS)
        }
        Err((status, body)) => {
            println!("{body}");
            Ok(if status == 400 {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

/// Renders a success or `{error, details}` body; the error side carries the
/// HTTP-equivalent status.
fn to_json<T: Serialize>(
    result: Result<T, PipelineError>,
) -> Result<Result<String, (u16, String)>, serde_json::Error> {
    Ok(match result {
        Ok(value) => Ok(serde_json::to_string_pretty(&value)?),
        Err(e) => {
            tracing::error!(error = %e, "request failed");
            Err((
                e.status_code(),
                serde_json::to_string_pretty(&e.to_response())?,
            ))
        }
    })
}
