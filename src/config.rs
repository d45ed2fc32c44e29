use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;

use crate::{
    centrality::CentralityMetric,
    crs::crs_utils::{wgs84_utm_zone_for_coord, EpsgCode, WEB_MERCATOR},
    geograph::road_graph::RoadGraph,
    geometry::distance::DistanceMeasure,
    osm::network_type::NetworkType,
    table::centrality_merge::RoadCentralityAggregate,
};

/// Curveness values can not be meaningfully rounded beyond this.
const MAX_CURVENESS_PRECISION: u32 = 10;

/// Distance measure used for curveness.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum DistanceConfig {
    /// Euclidean lengths after projecting to the given CRS.
    Projected { epsg: EpsgCode },
    /// Euclidean lengths in the UTM zone of the road network.
    Utm,
    Geodesic,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self::Projected { epsg: WEB_MERCATOR }
    }
}

impl DistanceConfig {
    pub fn build_measure(&self, graph: &RoadGraph) -> anyhow::Result<DistanceMeasure> {
        match self {
            Self::Projected { epsg } => DistanceMeasure::projected(*epsg),
            Self::Utm => {
                let nodes = graph.node_map();
                if nodes.is_empty() {
                    return Err(anyhow!("Can not pick a UTM zone for an empty graph"));
                }
                let count = nodes.len() as f64;
                let (x, y) = nodes.values().fold((0.0, 0.0), |(x, y), node| {
                    (x + node.geometry.x(), y + node.geometry.y())
                });
                let center = geo::coord! { x: x / count, y: y / count };
                let epsg = wgs84_utm_zone_for_coord(center)?;
                log::info!("Measuring distances in UTM zone EPSG:{}", epsg);
                DistanceMeasure::projected(epsg)
            }
            Self::Geodesic => Ok(DistanceMeasure::Geodesic),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the `<city>.osm` extracts.
    pub osm_dir: PathBuf,
    pub output_dir: PathBuf,
    pub network_type: NetworkType,
    /// Tag table columns missing in at least this share of rows are dropped.
    pub nan_cols_thres: f64,
    pub centrality_metrics: Vec<CentralityMetric>,
    pub curveness_precision: u32,
    pub distance: DistanceConfig,
    pub road_centrality_aggregate: RoadCentralityAggregate,
    pub force_refresh: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            osm_dir: PathBuf::from("osm"),
            output_dir: PathBuf::from("OpenStreetMap_data"),
            network_type: NetworkType::default(),
            nan_cols_thres: 0.3,
            centrality_metrics: vec![CentralityMetric::Pagerank],
            curveness_precision: 5,
            distance: DistanceConfig::default(),
            road_centrality_aggregate: RoadCentralityAggregate::default(),
            force_refresh: false,
        }
    }
}

impl Config {
    pub fn from_yaml_str(contents: &str) -> anyhow::Result<Self> {
        let config: Config = if contents.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(config_filepath: &Path) -> anyhow::Result<Self> {
        if !config_filepath.exists() {
            return Err(anyhow!("Config file {:?} not found", config_filepath));
        }
        let contents = std::fs::read_to_string(config_filepath)?;
        Self::from_yaml_str(&contents)
            .with_context(|| format!("Invalid config file {:?}", config_filepath))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.nan_cols_thres > 0.0 && self.nan_cols_thres <= 1.0) {
            return Err(anyhow!(
                "nan_cols_thres must be in (0, 1], got {}",
                self.nan_cols_thres
            ));
        }
        if self.centrality_metrics.is_empty() {
            return Err(anyhow!("At least one centrality metric is required"));
        }
        if self.curveness_precision > MAX_CURVENESS_PRECISION {
            return Err(anyhow!(
                "curveness_precision must be at most {}, got {}",
                MAX_CURVENESS_PRECISION,
                self.curveness_precision
            ));
        }
        Ok(())
    }

    /// Output directory of a city.
    pub fn city_dir(&self, city: &str) -> PathBuf {
        self.output_dir.join(city)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use testdir::testdir;

    use super::{Config, DistanceConfig};
    use crate::{
        centrality::CentralityMetric,
        geograph::road_graph::{RoadEdge, RoadGraph},
        geometry::distance::DistanceMeasure,
        osm::network_type::NetworkType,
        table::centrality_merge::RoadCentralityAggregate,
    };

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_yaml_str("").unwrap();
        assert_eq!(Config::default(), config);
        assert_eq!(NetworkType::Drive, config.network_type);
        assert_eq!(DistanceConfig::Projected { epsg: 3857 }, config.distance);
        assert_eq!(
            std::path::PathBuf::from("OpenStreetMap_data/Turin"),
            config.city_dir("Turin")
        );
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_yaml_str(
            r#"
osm_dir: /data/osm
output_dir: /data/out
network_type: drive_service
nan_cols_thres: 0.5
centrality_metrics: [pagerank, betweenness]
curveness_precision: 3
distance: !Projected
  epsg: 32632
road_centrality_aggregate: StartEndpointOnly
force_refresh: true
"#,
        )
        .unwrap();
        assert_eq!(std::path::PathBuf::from("/data/osm"), config.osm_dir);
        assert_eq!(NetworkType::DriveService, config.network_type);
        assert_eq!(
            vec![CentralityMetric::Pagerank, CentralityMetric::Betweenness],
            config.centrality_metrics
        );
        assert_eq!(DistanceConfig::Projected { epsg: 32632 }, config.distance);
        assert_eq!(
            RoadCentralityAggregate::StartEndpointOnly,
            config.road_centrality_aggregate
        );
        assert!(config.force_refresh);
    }

    #[rstest]
    #[case("distance: Geodesic", DistanceConfig::Geodesic)]
    #[case("distance: Utm", DistanceConfig::Utm)]
    fn test_unit_distance_variants(#[case] yaml: &str, #[case] expected: DistanceConfig) {
        assert_eq!(expected, Config::from_yaml_str(yaml).unwrap().distance);
    }

    #[rstest]
    #[case("nan_cols_thres: 0.0")]
    #[case("nan_cols_thres: 1.5")]
    #[case("centrality_metrics: []")]
    #[case("curveness_precision: 11")]
    #[case("network_type: boat")]
    #[case("unknown_field: 1")]
    fn test_invalid_config(#[case] yaml: &str) {
        assert!(Config::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_config_file() {
        let dir = testdir!();
        assert!(Config::from_file(&dir.join("missing.yaml")).is_err());
        let path = dir.join("config.yaml");
        std::fs::write(&path, "nan_cols_thres: 1.0\n").unwrap();
        assert_eq!(1.0, Config::from_file(&path).unwrap().nan_cols_thres);
    }

    #[test]
    fn test_utm_measure_for_graph_in_milan() {
        let mut graph = RoadGraph::new();
        graph
            .insert_edge_with_data(1, 2, vec![(9.18, 45.46), (9.19, 45.47)].into(), RoadEdge::default())
            .unwrap();

        let measure = DistanceConfig::Utm.build_measure(&graph).unwrap();
        assert!(matches!(measure, DistanceMeasure::Projected { epsg: 32632, .. }));
        assert!(DistanceConfig::Utm.build_measure(&RoadGraph::new()).is_err());
    }
}
