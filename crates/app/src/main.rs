use std::path::{Path, PathBuf};

use birdnet_dash_core::charts::{category_matrix, row_stats, totals};
use birdnet_dash_core::{
    provider_from_config, ApiClient, AppConfig, ChartRenderer, ChartsData, DashError,
    DashboardData, DashboardFetcher, MediaUrls, Panel, PlaybackController, PlaybackStatus, View,
};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> birdnet_dash_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.api_url.as_deref())?;

    match cli.command {
        Commands::Dashboard => run_dashboard(&config).await,
        Commands::Charts { date, json, svg } => run_charts(&config, date, json, svg).await,
        Commands::Play { filename, key } => run_play(&config, &filename, key).await,
        Commands::Listen { limit } => run_listen(&config, limit).await,
        Commands::Open { path } => run_open(&config, &path).await,
    }
}

fn load_config(path: Option<&Path>, api_url: Option<&str>) -> birdnet_dash_core::Result<AppConfig> {
    let mut config = AppConfig::load(path)?;
    if let Some(api_url) = api_url {
        config.api.base_url = api_url.to_string();
        config.validate()?;
    }
    tracing::debug!(base_url = %config.api.base_url, "configuration ready");
    Ok(config)
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

async fn run_dashboard(config: &AppConfig) -> birdnet_dash_core::Result<()> {
    let media = MediaUrls::from_api_base(&config.api.base_url)?;
    let fetcher = DashboardFetcher::new(ApiClient::new(&config.api)?, config.dashboard.clone());

    let dashboard = fetcher.fetch_dashboard(&today()).await;
    print_dashboard(&dashboard, &media);
    Ok(())
}

async fn run_charts(
    config: &AppConfig,
    date: Option<String>,
    json: bool,
    svg: Option<PathBuf>,
) -> birdnet_dash_core::Result<()> {
    let fetcher = DashboardFetcher::new(ApiClient::new(&config.api)?, config.dashboard.clone());
    let date = date.unwrap_or_else(today);

    let charts = fetcher.fetch_charts(&date).await;
    if let Some(path) = svg {
        let data = &charts.detailed.data;
        let cells = category_matrix(data, &row_stats(data));
        let title = format!("Hourly Activity Heatmap ({date})");
        std::fs::write(&path, ChartRenderer::new().heatmap_svg(&title, &cells))?;
        tracing::info!(path = %path.display(), "heatmap written");
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&charts)?);
    } else {
        print_charts(&charts);
    }
    Ok(())
}

async fn run_play(
    config: &AppConfig,
    filename: &str,
    key: Option<String>,
) -> birdnet_dash_core::Result<()> {
    let locator = if Path::new(filename).is_file() {
        filename.to_string()
    } else {
        MediaUrls::from_api_base(&config.api.base_url)?
            .audio_url(filename)
            .ok_or_else(|| DashError::msg("a clip filename is required"))?
    };
    let key = key.unwrap_or_else(|| filename.to_string());

    let player = PlaybackController::new(provider_from_config(config)?);
    let mut status = player.subscribe();

    if !player.toggle_play(&key, &locator).await {
        let reason = player
            .last_error()
            .unwrap_or_else(|| "playback did not start".to_string());
        return Err(DashError::Playback(reason));
    }
    println!("playing {key} ({locator})");

    tokio::select! {
        _ = wait_for_idle(&mut status) => {}
        _ = tokio::signal::ctrl_c() => tracing::info!("interrupted, stopping playback"),
    }

    match player.last_error() {
        Some(error) => Err(DashError::Playback(error)),
        None => Ok(()),
    }
}

async fn wait_for_idle(status: &mut watch::Receiver<PlaybackStatus>) {
    while status.borrow_and_update().active_key.is_some() {
        if status.changed().await.is_err() {
            break;
        }
    }
}

async fn run_listen(config: &AppConfig, limit: Option<u32>) -> birdnet_dash_core::Result<()> {
    let api = ApiClient::new(&config.api)?;
    let media = MediaUrls::from_api_base(&config.api.base_url)?;
    let limit = limit.unwrap_or(config.dashboard.recent_limit);

    let detections = api.recent(Some(limit)).await?;
    if detections.is_empty() {
        println!("no recent detections");
        return Ok(());
    }
    for (index, detection) in detections.iter().enumerate() {
        println!(
            "{index:>3}  {} {}  {}  ({:.0}%)",
            detection.date,
            detection.time,
            detection.species(),
            detection.confidence * 100.0
        );
    }
    println!("enter a number to play or stop a clip, q to quit");

    let player = PlaybackController::new(provider_from_config(config)?);
    let mut status = player.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.eq_ignore_ascii_case("q") {
                    break;
                }

                let Some(detection) = line.parse::<usize>().ok().and_then(|i| detections.get(i)) else {
                    println!("unknown selection `{line}`");
                    continue;
                };
                let Some(url) = media.audio_url(&detection.audio_path) else {
                    println!("{} has no clip", detection.species());
                    continue;
                };
                player.toggle_play(&detection.key(), &url).await;
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                print_status(&status.borrow_and_update());
            }
        }
    }

    Ok(())
}

async fn run_open(config: &AppConfig, path: &str) -> birdnet_dash_core::Result<()> {
    let view =
        View::from_path(path).ok_or_else(|| DashError::msg(format!("no view at `{path}`")))?;
    tracing::debug!(?view, "opening view");

    match view {
        View::Setup => run_setup(config).await,
        View::Script => run_species(config).await,
        View::Dashboard => run_dashboard(config).await,
    }
}

async fn run_setup(config: &AppConfig) -> birdnet_dash_core::Result<()> {
    let api = ApiClient::new(&config.api)?;
    let (health, setup) = tokio::join!(api.health(), api.setup_complete());

    println!("appliance: {}", config.api.base_url);
    match health {
        Ok(health) => println!("health: {}", health.status),
        Err(err) => println!("health: unreachable ({err})"),
    }
    match setup {
        Ok(setup) if setup.complete => println!("recording schedule: installed"),
        Ok(_) => println!("recording schedule: not configured"),
        Err(err) => println!("recording schedule: unknown ({err})"),
    }
    Ok(())
}

async fn run_species(config: &AppConfig) -> birdnet_dash_core::Result<()> {
    let species = ApiClient::new(&config.api)?.species().await?;
    if species.is_empty() {
        println!("no species detected yet");
    }
    for row in species {
        println!(
            "{:>6}  {:<30} {:<30} best {:.0}%  last {}",
            row.count,
            row.common_name,
            row.scientific_name,
            row.max_confidence * 100.0,
            row.last_seen
        );
    }
    Ok(())
}

fn print_status(status: &PlaybackStatus) {
    match (&status.active_key, status.is_loading) {
        (Some(key), true) => println!("loading {key}..."),
        (Some(key), false) => println!("playing {key}"),
        (None, _) => println!("stopped"),
    }
    if let Some(error) = &status.last_error {
        println!("playback error: {error}");
    }
}

fn print_panel_error<T>(panel: &Panel<T>) {
    if let Some(error) = &panel.error {
        println!("  ! {error}");
    }
}

fn print_dashboard(dashboard: &DashboardData, media: &MediaUrls) {
    let summary = &dashboard.summary;
    println!("Summary");
    print_panel_error(summary);
    if summary.is_ok() {
        println!(
            "  {} detections, {} species, {} today, {} this week",
            summary.data.total_detections,
            summary.data.unique_species,
            summary.data.today_count,
            summary.data.week_count
        );
    }

    println!("\nLatest observation");
    print_panel_error(&dashboard.latest);
    match &dashboard.latest.data {
        Some(latest) => {
            println!(
                "  {} ({}) at {} {}, {:.0}% confidence",
                latest.species(),
                latest.scientific_name,
                latest.date,
                latest.time,
                latest.confidence * 100.0
            );
            println!("  image: {}", dashboard.image_url);
            if let Some(audio) = media.audio_url(&latest.audio_path) {
                println!("  audio: {audio}");
            }
        }
        None if dashboard.latest.is_ok() => println!("  nothing detected yet"),
        None => {}
    }

    println!("\nRecent observations");
    print_panel_error(&dashboard.recent);
    for detection in &dashboard.recent.data {
        println!(
            "  {} {}  {}",
            detection.date,
            detection.time,
            detection.species()
        );
    }

    println!();
    print_charts(&dashboard.charts);
}

fn print_charts(charts: &ChartsData) {
    let renderer = ChartRenderer::new();

    println!("Hourly detections for {}", charts.date);
    print_panel_error(&charts.hourly);
    for row in &charts.hourly.data {
        println!("  {}:00  {}", row.hour, row.count);
    }

    println!();
    print_panel_error(&charts.detailed);
    let data = &charts.detailed.data;
    print!("{}", renderer.bar_chart("Total Detections by Species", &totals(data)));
    println!();
    print!(
        "{}",
        renderer.heatmap(
            "Hourly Activity Heatmap",
            &category_matrix(data, &row_stats(data))
        )
    );
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal dashboard for a BirdNET-Pi appliance", long_about = None)]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Overrides the API base URL, e.g. `http://birdpi.local:7007/api`.
    #[arg(long, env = "BIRDNET_API_URL", global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show today's summary, latest and recent observations, and charts.
    Dashboard,
    /// Show activity charts for one day.
    Charts {
        /// Day to chart as YYYY-MM-DD. Defaults to today.
        #[arg(short, long)]
        date: Option<String>,
        /// Print the chart data as JSON instead of drawing it.
        #[arg(long)]
        json: bool,
        /// Also write the heatmap as an SVG image to this file.
        #[arg(long, value_name = "FILE")]
        svg: Option<PathBuf>,
    },
    /// Play one clip until it ends or Ctrl-C is pressed.
    Play {
        /// Local file, or clip filename served by the appliance.
        filename: String,
        /// Key identifying the clip. Defaults to the filename.
        #[arg(short, long)]
        key: Option<String>,
    },
    /// List recent detections and play their clips interactively.
    Listen {
        /// Number of detections to list.
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Open a view by its route: `/`, `/scriptView` or `/dashboard`.
    Open { path: String },
}
