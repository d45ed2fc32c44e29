extern crate log;
pub mod centrality;
pub mod config;
pub mod crs;
pub mod geograph;
pub mod geometry;
pub mod logging;
pub mod osm;
pub mod pipeline;
pub mod table;
pub mod timing;
use crate::config::Config;
use crate::osm::cache::ProviderCache;
use crate::osm::provider::OsmXmlProvider;
use crate::pipeline::{create_save_roads_table, create_save_tag_tables};
use clap::Parser;
use std::path::PathBuf;

/// Extract the road network of a city with curveness and centrality measures, plus auxiliary map layers.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Name of the city, matching `<osm_dir>/<city>.osm`.
    city: String,

    /// Path to the YAML config file.
    #[arg(short, long)]
    config_filepath: Option<PathBuf>,

    /// Replace existing tag layer files.
    #[arg(long)]
    force_refresh: bool,
}

fn try_main() -> anyhow::Result<()> {
    let args = Args::try_parse()?;
    let mut config = match &args.config_filepath {
        Some(config_filepath) => Config::from_file(config_filepath)?,
        None => Config::default(),
    };
    config.force_refresh |= args.force_refresh;

    let city_dir = config.city_dir(&args.city);
    if !city_dir.exists() {
        log::info!("Creating output directory {:?}", city_dir);
        std::fs::create_dir_all(&city_dir)?;
    }

    let mut cache = ProviderCache::new(OsmXmlProvider::new(&config.osm_dir));
    create_save_roads_table(&mut cache, &config, &args.city, &city_dir)?;
    let tag_files = create_save_tag_tables(&mut cache, &config, &args.city, &city_dir)?;
    log::info!("Wrote {} tag layers for {}", tag_files.len(), args.city);
    Ok(())
}

fn main() {
    if let Err(e) = logging::init_logging() {
        eprintln!("Could not set up logging: {:?}", e);
    }
    if let Err(e) = try_main() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1)
    }
}
