pub mod algorithms;

use std::collections::HashMap;

use serde::Deserialize;

use crate::{
    geograph::{primitives::NodeIdx, road_graph::RoadGraph},
    geometry::curveness::round_to,
    timing::timed,
};

/// Decimal digits kept for centrality scores.
const SCORE_PRECISION: u32 = 5;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CentralityMetric {
    Pagerank,
    Degree,
    Betweenness,
    Closeness,
}

impl CentralityMetric {
    /// Column stem used for the metric in the road table.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pagerank => "pagerank",
            Self::Degree => "degree",
            Self::Betweenness => "betweenness",
            Self::Closeness => "closeness",
        }
    }
}

/// Per-node scores of one centrality metric.
#[derive(Debug, Clone, PartialEq)]
pub struct CentralityScores {
    pub name: String,
    pub scores: HashMap<NodeIdx, f64>,
}

impl CentralityScores {
    pub fn new(name: &str, scores: HashMap<NodeIdx, f64>) -> Self {
        Self {
            name: name.to_string(),
            scores,
        }
    }

    pub fn get(&self, node: NodeIdx) -> Option<f64> {
        self.scores.get(&node).copied()
    }
}

pub fn compute_centrality(
    graph: &RoadGraph,
    metric: CentralityMetric,
) -> anyhow::Result<CentralityScores> {
    let edge_graph = graph.edge_graph();
    let (scores, _) = timed(metric.name(), || match metric {
        CentralityMetric::Pagerank => algorithms::pagerank(edge_graph, 0.85, 100, 1e-6),
        CentralityMetric::Degree => Ok(algorithms::degree_centrality(edge_graph)),
        CentralityMetric::Betweenness => Ok(algorithms::betweenness_centrality(edge_graph)),
        CentralityMetric::Closeness => Ok(algorithms::closeness_centrality(edge_graph)),
    });
    let scores = scores?
        .into_iter()
        .map(|(node, score)| (node, round_to(score, SCORE_PRECISION)))
        .collect();
    Ok(CentralityScores::new(metric.name(), scores))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{compute_centrality, CentralityMetric};
    use crate::geograph::road_graph::{RoadEdge, RoadGraph};

    fn triangle() -> RoadGraph {
        let mut graph = RoadGraph::new();
        let coords = [(1, (9.0, 45.0)), (2, (9.001, 45.0)), (3, (9.001, 45.001))];
        for (index, (u, start)) in coords.iter().enumerate() {
            let (v, end) = coords[(index + 1) % coords.len()];
            graph
                .insert_edge_with_data(*u, v, vec![*start, end].into(), RoadEdge::default())
                .unwrap();
        }
        graph
    }

    #[rstest]
    #[case(CentralityMetric::Pagerank, 0.33333)]
    #[case(CentralityMetric::Degree, 1.0)]
    #[case(CentralityMetric::Betweenness, 0.5)]
    #[case(CentralityMetric::Closeness, 0.66667)]
    fn test_symmetric_cycle_scores(#[case] metric: CentralityMetric, #[case] expected: f64) {
        let scores = compute_centrality(&triangle(), metric).unwrap();
        assert_eq!(metric.name(), scores.name);
        assert_eq!(3, scores.scores.len());
        for node in [1, 2, 3] {
            assert_eq!(Some(expected), scores.get(node));
        }
        assert_eq!(None, scores.get(4));
    }

    #[test]
    fn test_metric_names_deserialize() {
        let metrics: Vec<CentralityMetric> =
            serde_yaml::from_str("[pagerank, degree, betweenness, closeness]").unwrap();
        assert_eq!(
            vec![
                CentralityMetric::Pagerank,
                CentralityMetric::Degree,
                CentralityMetric::Betweenness,
                CentralityMetric::Closeness
            ],
            metrics
        );
    }
}
