use anyhow::Context;
use clap::{Parser, Subcommand};
use orchestrator::{Orchestrator, RunOutcome, RunRequest};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use travelmate_core::{
    debug_enabled, AppConfig, CoreError, CredentialStore, ErrorExt, ErrorReporter, PlaceSource,
    TimeFilter, CONFIG_PATH_ENV, GOOGLE_MAPS_API_KEY_ENV,
};

/// Read before logging starts so `DEBUG` may come from this file too.
const DEFAULT_ENV_FILE: &str = ".env";

const CRATES: [&str; 8] = [
    "travelmate",
    "travelmate_core",
    "reddit_client",
    "place_extractor",
    "maps_client",
    "llm_interface",
    "orchestrator",
    "web_ui",
];

#[derive(Parser)]
#[command(
    name = "travelmate",
    version,
    about = "Travel recommendations from Reddit discussions, verified on Google Maps"
)]
struct Cli {
    /// TOML settings file
    #[arg(long, global = true, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate recommendations for a city
    Run {
        city: String,
        /// Comma-separated, e.g. "food,museums"
        interests: String,
        #[arg(long)]
        time_filter: Option<TimeFilter>,
        #[arg(long, allow_negative_numbers = true)]
        min_score: Option<i64>,
        /// Print the recommendation and stats as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the web UI
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },
    /// Store the Google Maps API key in the credentials file
    SetMapsKey { key: String },
}

/// Export `path` into the environment, keeping variables that are already set.
fn preload_env_file(path: &Path) {
    if path.exists() {
        if let Err(e) = dotenvy::from_path(path) {
            eprintln!("Warning: could not read {}: {}", path.display(), e);
        }
    }
}

fn init_tracing() {
    let level = if debug_enabled() { "debug" } else { "info" };
    let default_filter = CRATES
        .iter()
        .map(|name| format!("{}={}", name, level))
        .collect::<Vec<_>>()
        .join(",");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    preload_env_file(Path::new(DEFAULT_ENV_FILE));
    init_tracing();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: could not start the async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(dispatch(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

fn report(error: &anyhow::Error) -> ExitCode {
    match error.downcast_ref::<CoreError>() {
        Some(core) => {
            ErrorReporter::default().report_error(core);
            eprintln!("Error: {}", core.user_friendly_message());
            ExitCode::from(core.kind().exit_code())
        }
        None => {
            tracing::error!("{:#}", error);
            eprintln!("Error: {:#}", error);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run {
            city,
            interests,
            time_filter,
            min_score,
            json,
        } => {
            // Rejected before configuration or network access
            let request = RunRequest::new(&city, &interests)?
                .with_time_filter(time_filter)
                .with_min_score(min_score);
            let config = Arc::new(AppConfig::load(cli.config.as_deref())?);
            let orchestrator = Orchestrator::from_config(config)?;
            let outcome = orchestrator.run(&request).await?;
            print_outcome(&outcome, json)?;
        }
        Command::Serve { addr } => {
            let config = Arc::new(AppConfig::load(cli.config.as_deref())?);
            web_ui::serve(web_ui::AppState::new(config), addr)
                .await
                .with_context(|| format!("web UI failed on {}", addr))?;
        }
        Command::SetMapsKey { key } => {
            let key = key.trim();
            if key.is_empty() {
                return Err(CoreError::validation("the API key must not be empty").into());
            }
            let config = AppConfig::load(cli.config.as_deref())?;
            let store = CredentialStore::new(&config.credentials_file);
            store.set(GOOGLE_MAPS_API_KEY_ENV, key)?;
            println!("Saved {} to {}", GOOGLE_MAPS_API_KEY_ENV, store.path().display());
        }
    }
    Ok(())
}

fn print_outcome(outcome: &RunOutcome, json: bool) -> Result<(), CoreError> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    let recommendation = &outcome.recommendation;
    println!("{}\n", recommendation.generated_text);
    println!("Verified places:");
    if recommendation.verified_places.is_empty() {
        println!("  (none)");
    }
    for (index, place) in recommendation.verified_places.iter().enumerate() {
        let source = match place.source {
            PlaceSource::Reddit => "reddit",
            PlaceSource::Maps => "maps",
        };
        println!(
            "  {}. {} ({:.1}) [{}] {}",
            index + 1,
            place.name,
            place.rating,
            source,
            place.address
        );
        println!("     {}", place.maps_url);
    }

    let stats = &outcome.stats;
    println!(
        "\n{} posts, {} candidates, {} verified from Reddit, {} added from maps search{}",
        stats.posts_fetched,
        stats.candidates_extracted,
        stats.verified_from_reddit,
        stats.added_by_top_up,
        if stats.demo_mode { " (demo data)" } else { "" }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use travelmate_core::DEBUG_ENV;

    #[test]
    fn test_debug_from_env_file_enables_debug_logging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "DEBUG=1\n").unwrap();

        std::env::remove_var(DEBUG_ENV);
        assert!(!debug_enabled());

        preload_env_file(&path);
        assert!(debug_enabled());

        std::env::remove_var(DEBUG_ENV);
        preload_env_file(&dir.path().join("absent.env"));
        assert!(!debug_enabled());
    }
}
