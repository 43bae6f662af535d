use anyhow::{Context, Result};
use bezel_cli::{Scene, load_script, plan_flight, replay};
use bezel_core::LandmarkId;
use bezel_nav::NavigatorSettings;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "bezel", author, version, about, long_about = None)]
struct Cli {
    /// Settings file to use instead of the per-user one
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the off-screen proxies of a scene as JSON
    Proxies {
        #[arg(long)]
        scene: PathBuf,
    },

    /// Plan a flight from the scene camera to a landmark
    Plan {
        #[arg(long)]
        scene: PathBuf,

        /// Landmark id
        #[arg(short, long)]
        landmark: u32,

        /// Cluster of the landmark to fly to
        #[arg(long, default_value_t = 0)]
        cluster: usize,
    },

    /// Replay a JSON interaction script and print every notification
    Replay {
        #[arg(long)]
        scene: PathBuf,

        #[arg(long)]
        script: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.settings.as_deref())?;

    match cli.command {
        Command::Proxies { scene } => {
            let scene = Scene::load(&scene)?;
            let proxies = scene.proxies(&settings);
            tracing::info!("{} off-screen landmarks", proxies.len());
            println!("{}", serde_json::to_string_pretty(&proxies)?);
        }
        Command::Plan {
            scene,
            landmark,
            cluster,
        } => {
            let scene = Scene::load(&scene)?;
            let report = plan_flight(&scene, &settings, LandmarkId(landmark), cluster)?;
            if !report.connected {
                tracing::warn!("No route through the flight map, using a straight line");
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Replay { scene, script } => {
            let scene = Scene::load(&scene)?;
            let steps = load_script(&script)?;
            for record in replay(&scene, settings, &steps) {
                println!("{}", serde_json::to_string(&record)?);
            }
        }
    }

    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<NavigatorSettings> {
    match path {
        Some(path) => NavigatorSettings::load_from(path)
            .with_context(|| format!("Failed to load settings from {:?}", path)),
        None => Ok(NavigatorSettings::load()),
    }
}
