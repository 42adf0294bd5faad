use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use funnel_extrapolation::funnel_id::ensure_funnel_id;
use funnel_extrapolation::model::{ActionRequest, ActionResponse};
use funnel_extrapolation::{
    ExtrapolationConfig, ExtrapolationError, FactorCalculator, FunnelStore, ReplayFixture,
    ResponseTransformer, logging,
};

#[derive(Parser)]
#[command(name = "funnelx")]
#[command(version)]
#[command(about = "Extrapolate sampled funnel analytics to the full population", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file (defaults to ~/.config/funnelx/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log base queries and factors to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extrapolate a recorded response
    Transform {
        /// Replay fixture with funnels and recorded base-event responses
        #[arg(long)]
        fixture: PathBuf,
        /// Original request (JSON)
        #[arg(long)]
        request: PathBuf,
        /// Sampled response (JSON)
        #[arg(long)]
        response: PathBuf,
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
    /// Print the extrapolation factor(s) for a request
    Factor {
        #[arg(long)]
        fixture: PathBuf,
        #[arg(long)]
        request: PathBuf,
    },
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {what} from {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {what} {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<ExtrapolationConfig> {
    let config = match path {
        Some(path) => ExtrapolationConfig::load_from(path),
        None => ExtrapolationConfig::load(),
    };
    config.context("loading configuration")
}

fn main() -> Result<()> {
    // Load .env early; ignore if missing.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Transform {
            fixture,
            request,
            response,
            pretty,
        } => {
            let (store, executor) = ReplayFixture::load_from(&fixture)
                .with_context(|| format!("loading fixture {}", fixture.display()))?
                .into_parts();
            let request: ActionRequest = read_json(&request, "request")?;
            let response: ActionResponse = read_json(&response, "response")?;

            let scaled = ResponseTransformer::new(&request, &executor, &store, &config)
                .transform(response)?;
            let out = if pretty {
                serde_json::to_string_pretty(&scaled)?
            } else {
                serde_json::to_string(&scaled)?
            };
            println!("{out}");
        }
        Commands::Factor { fixture, request } => {
            let (store, executor) = ReplayFixture::load_from(&fixture)
                .with_context(|| format!("loading fixture {}", fixture.display()))?
                .into_parts();
            let request: ActionRequest = read_json(&request, "request")?;

            let id = ensure_funnel_id(&request, &config.funnel_id_field)?;
            let funnel = store
                .get_by_funnel_id(&id)?
                .ok_or(ExtrapolationError::MissingFunnel { id: id.clone() })?;
            let calculator = FactorCalculator::new(&executor, &config);

            let bucketed = match &request {
                ActionRequest::Histogram(r) => Some((&r.table, &r.field, r.period)),
                ActionRequest::StatsTrend(r) => Some((&r.table, &r.timestamp, r.period)),
                ActionRequest::Trend(r) => Some((&r.table, &r.timestamp, r.period)),
                _ => None,
            };
            let report = match bucketed {
                Some((table, field, period)) => {
                    let factors =
                        calculator.compute_bucketed_factors(&request, table, field, period, &funnel)?;
                    serde_json::json!({ "funnelId": id, "factors": factors })
                }
                None => {
                    let factor = calculator.compute_scalar_factor(&request, &funnel)?;
                    serde_json::json!({ "funnelId": id, "factor": factor })
                }
            };
            println!("{report}");
        }
    }
    Ok(())
}
