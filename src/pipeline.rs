use std::path::{Path, PathBuf};

use crate::{
    centrality::{compute_centrality, CentralityMetric},
    config::Config,
    geograph::road_graph::{graph_stats, graph_to_tables, RoadGraph},
    geometry::curveness::CurvenessCalculator,
    osm::{cache::ProviderCache, provider::MapDataProvider},
    table::{
        centrality_merge::{merge_metric, RoadCentralityAggregate},
        csv_output::{write_road_table, write_tag_table},
        road_table::{
            attach_adjacent_roads, attach_curveness, deduplicate, flatten_and_merge, RoadTable,
        },
        tag_layers::tag_categories,
    },
};

pub const ROADS_TABLE_FILE_NAME: &str = "roads_graph_data.csv";

/// Road table of a graph: one row per deduplicated segment with curveness and centrality columns.
pub fn build_roads_table(
    graph: &RoadGraph,
    calculator: &CurvenessCalculator,
    metrics: &[CentralityMetric],
    aggregate: RoadCentralityAggregate,
) -> anyhow::Result<RoadTable> {
    graph_stats(graph);
    let (nodes, edges) = graph_to_tables(graph);
    let mut table = deduplicate(flatten_and_merge(&nodes, &edges));
    attach_curveness(&mut table, calculator)?;
    attach_adjacent_roads(&mut table)?;
    for metric in metrics {
        let scores = compute_centrality(graph, *metric)?;
        merge_metric(&mut table, &scores, aggregate)?;
    }
    Ok(table)
}

/// Build the road table of a city and write it into `city_dir`, replacing any previous file.
pub fn create_save_roads_table<P: MapDataProvider>(
    cache: &mut ProviderCache<P>,
    config: &Config,
    city: &str,
    city_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let graph = cache.road_graph(city, config.network_type)?;
    let measure = config.distance.build_measure(&graph)?;
    log::info!("Measuring curveness with {} distances", measure.describe());
    let calculator = CurvenessCalculator::new(measure, config.curveness_precision);
    let table = build_roads_table(
        &graph,
        &calculator,
        &config.centrality_metrics,
        config.road_centrality_aggregate,
    )?;

    let output_filepath = city_dir.join(ROADS_TABLE_FILE_NAME);
    if output_filepath.exists() {
        log::warn!("Overwriting {:?}", output_filepath);
    }
    write_road_table(&table, &output_filepath)?;
    log::info!("Roads table for {} saved to {:?}", city, output_filepath);
    Ok(output_filepath)
}

/// Extract every auxiliary tag layer of a city into `city_dir`. Returns the files written.
///
/// Layers whose file already exists are skipped unless `force_refresh` is set, and empty layers are not
/// written.
pub fn create_save_tag_tables<P: MapDataProvider>(
    cache: &mut ProviderCache<P>,
    config: &Config,
    city: &str,
    city_dir: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for category in tag_categories() {
        let output_filepath = city_dir.join(category.file_name());
        if output_filepath.exists() && !config.force_refresh {
            log::warn!(
                "{:?} already exists, skipping {} (force a refresh to replace it)",
                output_filepath,
                category.name
            );
            continue;
        }
        log::info!("Extracting {} data for {}", category.name, city);
        let raw = cache.features(city, &category.query)?;
        if raw.is_empty() {
            log::warn!("No {} features found for {} ({})", category.name, city, category.query);
            continue;
        }
        let table = category.prepare(&raw, config.nan_cols_thres);
        if table.is_empty() {
            log::warn!("No {} features left for {} after filtering", category.name, city);
            continue;
        }
        write_tag_table(&table, &output_filepath)?;
        written.push(output_filepath);
    }
    Ok(written)
}
