//! # Beach Profile Application Entry Point
//!
//! This binary wires configuration, the directory-backed object store and the
//! profile service together. `run` processes one survey submission and
//! prints the JSON report; `break-depth` and `preview` are quick checks that
//! need no storage at all.

// Test modules
#[cfg(test)]
mod tests;

mod cli;

use anyhow::{bail, Context};
use beach_profile_lib::{
    config::Config,
    planner,
    renderer::draw_ascii,
    service::ProfileService,
    storage::{DirectoryStore, ObjectStore},
    table::ProfileTable,
    wave_break, WaveObservation,
};
use clap::Parser;
use cli::{BreakDepthArgs, Cli, Commands, ImportArgs, PreviewArgs, RunArgs};
use tracing_subscriber::EnvFilter;

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let config = load_config(&cli.config)?;
            run(config, args)
        }
        Commands::BreakDepth(args) => break_depth(args),
        Commands::Preview(args) => preview(args),
        Commands::Import(args) => {
            let config = load_config(&cli.config)?;
            import(config, args)
        }
    }
}

fn load_config(path: &std::path::Path) -> anyhow::Result<Config> {
    Config::load_from_path(path).with_context(|| format!("loading {}", path.display()))
}

fn run(mut config: Config, args: RunArgs) -> anyhow::Result<()> {
    if let Some(policy) = args.policy {
        config.batch.policy = policy.into();
    }
    if args.sequential {
        config.batch.parallel = false;
    }

    let store = DirectoryStore::new(&config.storage).context("opening bucket")?;
    let service = ProfileService::new(store, &config);

    let report = service
        .create_profiles(&args.profile, &args.waves)
        .with_context(|| format!("processing {}", args.profile))?;

    let message = if report.is_complete() {
        "Success"
    } else {
        "Incomplete"
    };
    let data = serde_json::to_value(&report)?;
    let body = serde_json::json!({ "message": message, "data": data });
    println!("{}", serde_json::to_string_pretty(&body)?);

    if !report.is_complete() {
        bail!(
            "{} of {} profiles were not delivered",
            report.failed + report.skipped,
            report.batch.units.len()
        );
    }
    Ok(())
}

fn break_depth(args: BreakDepthArgs) -> anyhow::Result<()> {
    let wave = WaveObservation::new(args.height)?;
    let depth = match (args.direction, args.normal) {
        (Some(direction), Some(normal)) => {
            let theta = wave_break::incidence_angle(direction, normal);
            let depth = wave_break::breaking_depth_with_angle(wave.height_m(), direction, normal)?;
            println!("Incidence angle: {:.2}°", theta.to_degrees());
            depth
        }
        _ => wave_break::breaking_depth(wave.height_m()),
    };
    println!("Breaking depth: {depth:.3} m");
    Ok(())
}

fn preview(args: PreviewArgs) -> anyhow::Result<()> {
    let table = ProfileTable::load(&args.profile)?;
    let wave = WaveObservation::new(args.height)?;
    let source = args.profile.display().to_string();

    let units = planner::plan(&table, &[wave], &source)?;
    let unit = units
        .iter()
        .find(|u| u.transect.index == args.transect)
        .with_context(|| {
            format!(
                "transect {} not in {} ({} transects)",
                args.transect,
                source,
                units.len()
            )
        })?;

    print!("{}", draw_ascii(&unit.evaluate(&table)?));
    Ok(())
}

fn import(config: Config, args: ImportArgs) -> anyhow::Result<()> {
    let key = match args.key {
        Some(key) => key,
        None => args
            .file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .context("file has no name")?,
    };

    let store = DirectoryStore::new(&config.storage).context("opening bucket")?;
    let url = store.upload_file(&args.file, &key)?;
    println!("{url}");
    Ok(())
}
