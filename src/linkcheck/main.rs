// Copyright Catenary Transit Initiatives
// Flags POIs whose position or attributes disagree with their road link

use anyhow::{Context, Result};
use clap::Parser;
use geojson::GeoJson;
use poi_audit::AuditConfig;
use poi_audit::ScenarioSummary;
use poi_audit::duplicates::{find_duplicates, write_duplicates_csv};
use poi_audit::geojson_io::{
    classify_geojson, pois_from_collection, read_geojson, results_to_feature_collection,
    scenario_collections,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
    /// RON config file; falls back to LINKCHECK_CONFIG, then built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Classify every POI against its link and write the annotated POIs
    Classify {
        #[arg(long)]
        pois: PathBuf,
        #[arg(long)]
        links: PathBuf,
        #[arg(long, default_value = "POI_Scenarios.geojson")]
        output: PathBuf,
        /// Also write one Scenario_<n>.geojson per scenario into this directory
        #[arg(long)]
        by_scenario: Option<PathBuf>,
    },
    /// List POIs repeated with the same POI_ID and coordinate
    Duplicates {
        #[arg(long)]
        pois: PathBuf,
        #[arg(long, default_value = "repeated_pois.csv")]
        output: PathBuf,
    },
}

fn load_config(explicit: Option<PathBuf>) -> Result<AuditConfig> {
    let path = explicit.or_else(|| std::env::var("LINKCHECK_CONFIG").ok().map(PathBuf::from));

    match path {
        Some(path) => {
            let config = AuditConfig::load(&path)?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        }
        None => Ok(AuditConfig::default()),
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let config = load_config(args.config)?;

    match args.command {
        Commands::Classify {
            pois,
            links,
            output,
            by_scenario,
        } => {
            let start = Instant::now();

            let poi_doc = read_geojson(&pois).context("Failed to load POIs")?;
            // an unreadable links file degrades the batch instead of aborting it
            let link_doc = read_geojson(&links)
                .inspect_err(|e| warn!("{}", e))
                .ok();

            let batch = poi_audit::default_batch(&config);
            let results = classify_geojson(&batch, &poi_doc, link_doc.as_ref());

            let summary = ScenarioSummary::from_results(&results);
            summary.log();

            let collection = GeoJson::FeatureCollection(results_to_feature_collection(&results));
            std::fs::write(&output, collection.to_string())
                .with_context(|| format!("Failed to write {}", output.display()))?;

            if let Some(dir) = by_scenario {
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;

                for (name, collection) in scenario_collections(&summary) {
                    let path = dir.join(format!("{}.geojson", name));
                    let count = collection.features.len();
                    std::fs::write(&path, GeoJson::FeatureCollection(collection).to_string())
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Wrote {} POIs to {}", count, path.display());
                }
            }

            info!(
                "Wrote {} POIs to {} in {:?}",
                summary.total(),
                output.display(),
                start.elapsed()
            );
        }
        Commands::Duplicates { pois, output } => {
            let poi_doc = read_geojson(&pois).context("Failed to load POIs")?;
            let GeoJson::FeatureCollection(collection) = poi_doc else {
                anyhow::bail!("{} is not a FeatureCollection", pois.display());
            };

            let pois = pois_from_collection(&collection);
            info!("Total features: {}", pois.len());

            let groups = find_duplicates(&pois);
            info!("Duplicate groups found: {}", groups.len());

            if groups.is_empty() {
                return Ok(());
            }

            let file = File::create(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            let written = write_duplicates_csv(BufWriter::new(file), &groups)?;
            info!("Wrote {} repeated rows to {}", written, output.display());
        }
    }

    Ok(())
}
