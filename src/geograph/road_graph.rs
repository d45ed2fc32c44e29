use std::collections::BTreeMap;

use super::primitives::{DiGeoGraph, NodeIdx};

/// Attributes carried by a road graph edge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoadEdge {
    /// Id of the OSM way the edge was cut from.
    pub osmid: i64,
    pub name: Option<String>,
    pub highway: String,
    pub lanes: Option<String>,
    pub oneway: bool,
    /// True when the edge runs against the digitisation direction of its way.
    pub reversed: bool,
    /// Haversine length in metres.
    pub length: f64,
    /// Optional OSM attributes (maxspeed, bridge, tunnel, ...), keyed by tag name.
    pub optional: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoadNode {
    /// Number of physical street pieces touching the node.
    pub street_count: usize,
}

/// Directed road multigraph with OSM node ids as node indices.
pub type RoadGraph = DiGeoGraph<RoadEdge, RoadNode>;

/// One row of the node table.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub osmid: NodeIdx,
    pub street_count: usize,
    pub geometry: geo::Point,
}

/// One row of the edge table, `key` disambiguates parallel edges between `u` and `v`.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub u: NodeIdx,
    pub v: NodeIdx,
    pub key: usize,
    pub attributes: RoadEdge,
    pub geometry: geo::LineString,
}

pub fn graph_stats(graph: &RoadGraph) -> (usize, usize) {
    let n_nodes = graph.node_map().len();
    let n_edges = graph.edge_count();
    log::info!("Number of nodes: {}", n_nodes);
    log::info!("Number of edges: {}", n_edges);
    (n_nodes, n_edges)
}

/// Flatten the graph into a node table (sorted by id) and an edge table (in insertion order).
pub fn graph_to_tables(graph: &RoadGraph) -> (Vec<NodeRecord>, Vec<EdgeRecord>) {
    log::info!("Extracting node and edge tables from roads graph");
    let mut nodes: Vec<NodeRecord> = graph
        .node_map()
        .iter()
        .map(|(idx, node)| NodeRecord {
            osmid: *idx,
            street_count: node.data.street_count,
            geometry: node.geometry,
        })
        .collect();
    nodes.sort_by_key(|node| node.osmid);

    let edges = graph
        .edge_graph()
        .all_edges()
        .flat_map(|(u, v, par_edges)| {
            par_edges
                .iter()
                .enumerate()
                .map(move |(key, edge)| EdgeRecord {
                    u,
                    v,
                    key,
                    attributes: edge.data.clone(),
                    geometry: edge.geometry.clone(),
                })
        })
        .collect();
    (nodes, edges)
}

#[cfg(test)]
mod tests {
    use super::{graph_stats, graph_to_tables, RoadEdge, RoadGraph};

    #[test]
    fn test_graph_to_tables_keeps_parallel_edges() {
        let mut graph = RoadGraph::new();
        let forward: geo::LineString = vec![(9.0, 45.0), (9.001, 45.0)].into();
        let backward: geo::LineString = vec![(9.001, 45.0), (9.0, 45.0)].into();
        let detour: geo::LineString = vec![(9.0, 45.0), (9.0005, 45.0005), (9.001, 45.0)].into();
        let road = |name: &str| RoadEdge {
            name: Some(name.to_string()),
            highway: "residential".to_string(),
            ..Default::default()
        };
        graph.insert_edge_with_data(10, 20, forward, road("Via Roma")).unwrap();
        graph.insert_edge_with_data(20, 10, backward, road("Via Roma")).unwrap();
        graph.insert_edge_with_data(10, 20, detour, road("Vicolo")).unwrap();
        graph.node_map_mut().get_mut(&10).unwrap().data.street_count = 2;

        assert_eq!((2, 3), graph_stats(&graph));

        let (nodes, edges) = graph_to_tables(&graph);
        assert_eq!(vec![10, 20], nodes.iter().map(|n| n.osmid).collect::<Vec<_>>());
        assert_eq!(2, nodes[0].street_count);
        let keys: Vec<(i64, i64, usize)> = edges.iter().map(|e| (e.u, e.v, e.key)).collect();
        assert_eq!(vec![(10, 20, 0), (10, 20, 1), (20, 10, 0)], keys);
        assert_eq!(Some("Vicolo".to_string()), edges[1].attributes.name);
    }
}
