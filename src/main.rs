//! Spatial Intent - Spatial Intent Resolution Pipeline
//!
//! Resolves "what is the user pointing at" into a single grounded place
//! identification.

use spatial_intent::app::cli::{Cli, Commands, ConfigAction};
use spatial_intent::app::config::Config;
use spatial_intent::geometry::{Geo, Point2};
use spatial_intent::perception::{PerceptionStateMachine, SignalTrace};
use spatial_intent::resolve::{DisambiguationEngine, EngineConfig, ResolutionResult};
use spatial_intent::services::{
    ClaudeVision, FixedWindowLimiter, HttpPlaceSearch, LocationProvider, StaticLocation,
};
use spatial_intent::time::{Clock, SystemClock};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    // Initialize tracing (--verbose enables debug-level output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    match cli.command {
        Commands::Resolve {
            image,
            tap_x,
            tap_y,
            lat,
            lon,
            fov,
        } => {
            run_resolve(&image, tap_x, tap_y, lat, lon, fov, &config)?;
        }
        Commands::Simulate { trace } => {
            run_simulate(&trace, &config)?;
        }
        Commands::Init { force } => {
            run_init(force, &config)?;
        }
        Commands::Config { action } => {
            run_config(action, &config)?;
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_resolve(
    image: &Path,
    tap_x: f64,
    tap_y: f64,
    lat: Option<f64>,
    lon: Option<f64>,
    fov: Option<f64>,
    config: &Config,
) -> anyhow::Result<()> {
    if !image.exists() {
        anyhow::bail!("Image file not found: {:?}", image);
    }
    let frame = std::fs::read(image)?;
    info!("Loaded frame {:?} ({} bytes)", image, frame.len());

    let tap = Point2::new(tap_x, tap_y);
    if !(0.0..=1.0).contains(&tap_x) || !(0.0..=1.0).contains(&tap_y) {
        anyhow::bail!("Tap coordinates must be normalized to [0, 1]");
    }

    let location_provider = StaticLocation::new(match (lat, lon) {
        (Some(lat), Some(lon)) => Some(Geo::new(lat, lon)),
        (None, None) => None,
        _ => anyhow::bail!("--lat and --lon must be given together"),
    });
    let location = location_provider.current();
    if location.is_none() {
        warn!("No device location; resolution will rely on the vision hint alone");
    }

    let client = reqwest::Client::new();
    let vision = ClaudeVision::new(
        client.clone(),
        std::env::var("ANTHROPIC_API_KEY").ok(),
        config.vision.model.clone(),
    )
    .with_max_tokens(config.vision.max_tokens);
    let places = HttpPlaceSearch::new(client, std::env::var("PLACES_API_KEY").ok());
    let limiter = FixedWindowLimiter::new(
        config.limits.max_requests,
        config.limits.window_secs as i64,
    );

    let engine = DisambiguationEngine::new(
        Box::new(vision),
        Box::new(places),
        Box::new(limiter),
        EngineConfig {
            named_radius_m: config.engine.named_radius_m,
            nearby_radius_m: config.engine.nearby_radius_m,
            min_directional_score: config.engine.min_directional_score,
            client_id: "cli".to_string(),
        },
    );

    let fov_deg = fov.unwrap_or(config.engine.fov_deg);
    let clock = SystemClock::new();
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(engine.resolve_intent(&frame, tap, fov_deg, location));
    info!("Resolved in {} ms", clock.now_ms());

    print_result(&result);
    Ok(())
}

fn print_result(result: &ResolutionResult) {
    println!("\n{}", result.title);
    println!("  {}", result.subtitle);
    println!("  {}", result.description);
    if !result.details.is_empty() {
        println!("\n{}", result.details);
    }
    if let Some(year) = &result.year {
        println!("\n  Built: {}", year);
    }
    if let Some(url) = &result.url {
        println!("  More: {}", url);
    }
    println!("\n  Confidence: {:.2}  ({:?})", result.confidence, result.kind);
}

fn run_simulate(trace_path: &Path, config: &Config) -> anyhow::Result<()> {
    if !trace_path.exists() {
        anyhow::bail!("Trace file not found: {:?}", trace_path);
    }
    let json = std::fs::read_to_string(trace_path)?;
    let trace = SignalTrace::from_json(&json)?;
    info!("Loaded trace with {} signals", trace.signals.len());

    let mut machine = PerceptionStateMachine::new(config.gating.clone());
    machine.on_state_change(|state| {
        println!("  -> {}", state.name());
    });

    for entry in &trace.signals {
        machine.update(&entry.signal, entry.at_ms);
    }

    // Let timeout-driven transitions settle after the last signal
    let end = trace.signals.last().map(|s| s.at_ms).unwrap_or(0);
    let horizon = config.gating.display_timeout_ms + config.gating.release_fade_ms;
    for offset in (0..=horizon).step_by(50) {
        machine.tick(end + offset);
    }

    let context = machine.get_context();
    println!("\nFinal state: {}", context.state.name());
    println!("  Confidence: {:.3}", context.confidence);
    println!("  Stability:  {} ms", context.stability_ms);
    Ok(())
}

fn run_init(force: bool, config: &Config) -> anyhow::Result<()> {
    let path = Config::default_path();
    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {:?} (use --force to overwrite)",
            path
        );
    }
    config.save(&path)?;
    info!("Wrote config to {:?}", path);
    println!("Initialized config at {:?}", path);
    Ok(())
}

fn run_config(action: ConfigAction, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", config.to_toml()?);
        }
        ConfigAction::Path => {
            println!("{}", Config::default_path().display());
        }
        ConfigAction::Reset { force } => {
            let path = Config::default_path();
            if path.exists() && !force {
                anyhow::bail!("Refusing to reset {:?} without --force", path);
            }
            Config::default().save(&path)?;
            println!("Reset config at {:?}", path);
        }
    }
    Ok(())
}
