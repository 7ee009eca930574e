mod paths;

use std::error::Error;
use std::fs;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use route_cache::RouteClient;
use route_cache::cache::CacheConfig;
use route_cache::cache::MemoryStorage;
use route_cache::cache::PersistentCache;
use route_cache::cache::SqliteStorage;
use route_cache::controller::ControllerConfig;
use route_cache::controller::RouteCalculationController;
use route_cache::controller::RouteState;
use route_cache::model::RouteOutcome;
use route_cache::model::RouteRequest;
use route_cache::provider::GoogleMapsProvider;
use route_cache::throttle::ThrottleConfig;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::WriteLogger;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;

#[derive(Parser)]
#[command(name = "route-cache", version, about = "Cached, throttled route and place lookups")]
struct Cli {
    /// Maps API key.
    #[arg(long, env = "ROUTE_CACHE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Cache database path (defaults to the platform data directory).
    #[arg(long)]
    cache_db: Option<PathBuf>,

    /// Service country code places are checked against.
    #[arg(long, default_value = "CH")]
    country: String,

    /// Response language.
    #[arg(long)]
    language: Option<String>,

    /// Log level written to the log file.
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a route. Without `--to` the booking is open-ended.
    Route {
        origin: String,
        #[arg(long)]
        to: Option<String>,
        #[arg(long = "stop")]
        stops: Vec<String>,
    },
    /// Resolve a free-text address.
    Place { address: String },
    /// Drop stale cache entries and report what is left.
    Sweep,
    /// Read `origin > destination | stop | stop` lines from stdin and
    /// recalculate as they change.
    Watch,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: LevelFilter) {
    paths::rotate_logs();
    let Some(path) = paths::log_file() else { return };
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    if let Ok(file) = File::create(&path) {
        let _ = WriteLogger::init(level, Config::default(), file);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let cache = open_cache(cli.cache_db.clone()).await;

    if let Command::Sweep = cli.command {
        let removed = cache.sweep().await;
        println!(
            "removed {} stale entries; {} routes and {} places cached",
            removed,
            cache.routes().len(),
            cache.geocode().len()
        );
        return Ok(());
    }

    let api_key = cli
        .api_key
        .ok_or("missing API key: pass --api-key or set ROUTE_CACHE_API_KEY")?;
    let mut provider = GoogleMapsProvider::builder()
        .api_key(api_key)
        .region(cli.country.to_lowercase());
    if let Some(language) = cli.language {
        provider = provider.language(language);
    }

    let client = RouteClient::builder()
        .provider(provider.build())
        .cache(cache)
        .throttle_config(ThrottleConfig::default())
        .config(route_cache::ClientConfig::default().with_service_country(cli.country))
        .build();

    match cli.command {
        Command::Route { origin, to, stops } => {
            let request = RouteRequest {
                origin,
                destination: to,
                stops,
            };
            let response = client.resolve_route(&request).await;
            let source = if response.is_cached() { " (cached)" } else { "" };
            println!("{}{}", describe(response.data()), source);
        }
        Command::Place { address } => {
            let place = client.resolve_place(&address).await?;
            let info = place.data();
            println!(
                "{} ({:.5}, {:.5}){}{}",
                info.formatted_address,
                info.lat,
                info.lng,
                if info.in_service_country { "" } else { " [outside service area]" },
                if place.is_cached() { " (cached)" } else { "" },
            );
        }
        Command::Watch => watch(client).await?,
        Command::Sweep => {}
    }

    Ok(())
}

/// Opens the durable cache, falling back to an unpersisted one.
async fn open_cache(path: Option<PathBuf>) -> PersistentCache {
    let config = CacheConfig::default();
    let Some(path) = path.or_else(paths::cache_db) else {
        log::warn!("No data directory available, cache will not persist");
        return PersistentCache::open(MemoryStorage::new(), config).await;
    };
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }

    match SqliteStorage::open(&path).await {
        Ok(storage) => PersistentCache::open(storage, config).await,
        Err(err) => {
            log::warn!("Cache database {} unavailable: {}", path.display(), err);
            PersistentCache::open(MemoryStorage::new(), config).await
        }
    }
}

async fn watch(client: RouteClient) -> Result<(), Box<dyn Error>> {
    let controller = RouteCalculationController::new(client, ControllerConfig::default());
    let mut updates = controller.subscribe();

    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            print_state(&state);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(request) = parse_line(&line) {
            controller.submit(request);
        }
    }

    // Let the last input settle before tearing down.
    let mut done = controller.subscribe();
    tokio::time::sleep(ControllerConfig::default().debounce * 2).await;
    let _ = done.wait_for(|state| !state.is_calculating).await;
    controller.close();
    drop(controller);
    let _ = printer.await;
    Ok(())
}

fn print_state(state: &RouteState) {
    if state.is_calculating {
        println!("calculating...");
    } else if let Some(outcome) = &state.result {
        println!("{}", describe(outcome));
    }
}

fn describe(outcome: &RouteOutcome) -> String {
    match outcome {
        RouteOutcome::Success(route) if route.ordered_stops.is_empty() => {
            format!("{}, {}", route.distance_text, route.duration_text)
        }
        RouteOutcome::Success(route) => format!(
            "{}, {} via {}",
            route.distance_text,
            route.duration_text,
            route.ordered_stops.join(", ")
        ),
        other => other.error_message().unwrap_or_default(),
    }
}

/// Parses `origin > destination | stop | stop`. Without `>` the booking is
/// open-ended. Blank lines are ignored.
fn parse_line(line: &str) -> Option<RouteRequest> {
    if line.trim().is_empty() {
        return None;
    }
    let Some((origin, rest)) = line.split_once('>') else {
        return Some(RouteRequest::hourly(line.trim()));
    };

    let mut parts = rest.split('|');
    let destination = parts.next().unwrap_or_default().trim();
    Some(RouteRequest::new(origin.trim(), destination).with_stops(parts.map(str::trim)))
}
