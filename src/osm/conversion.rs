use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::anyhow;
use geo::HaversineLength;

use super::{network_type::NetworkType, tag_value};
use crate::{
    geograph::{
        primitives::NodeIdx,
        road_graph::{RoadEdge, RoadGraph},
    },
    geometry::curveness::round_to,
};

/// Way tags copied onto edges when present.
const OPTIONAL_TAGS: [&str; 9] = [
    "maxspeed",
    "ref",
    "bridge",
    "tunnel",
    "access",
    "width",
    "est_width",
    "junction",
    "service",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TravelDirection {
    Forward,
    Backward,
    Both,
}

fn travel_direction(tags: &[osm_xml::Tag], network_type: NetworkType) -> TravelDirection {
    if !network_type.respects_oneway() {
        return TravelDirection::Both;
    }
    match tag_value(tags, "oneway") {
        Some("yes" | "true" | "1") => TravelDirection::Forward,
        Some("-1" | "reverse") => TravelDirection::Backward,
        Some("no" | "false" | "0") => TravelDirection::Both,
        _ if tag_value(tags, "junction") == Some("roundabout") => TravelDirection::Forward,
        _ => TravelDirection::Both,
    }
}

/// Runs of consecutive way nodes present in the extract. Ways clipped by the extract boundary reference
/// nodes that are missing from it, those split the way.
fn resolved_node_runs<'a>(
    osm_data: &'a osm_xml::OSM,
    way: &osm_xml::Way,
) -> Vec<Vec<&'a osm_xml::Node>> {
    let mut runs = Vec::new();
    let mut current: Vec<&osm_xml::Node> = Vec::new();
    for reference in &way.nodes {
        match osm_data.resolve_reference(reference) {
            osm_xml::Reference::Node(node) => {
                if current.last().map(|last| last.id) != Some(node.id) {
                    current.push(node);
                }
            }
            _ => runs.push(std::mem::take(&mut current)),
        }
    }
    runs.push(current);
    runs.retain(|run| run.len() >= 2);
    runs
}

fn road_edge_for_way(way: &osm_xml::Way, oneway: bool) -> RoadEdge {
    let optional: BTreeMap<String, String> = OPTIONAL_TAGS
        .iter()
        .filter_map(|key| tag_value(&way.tags, key).map(|val| (key.to_string(), val.to_string())))
        .collect();
    RoadEdge {
        osmid: way.id,
        name: tag_value(&way.tags, "name").map(str::to_string),
        highway: tag_value(&way.tags, "highway").unwrap_or_default().to_string(),
        lanes: tag_value(&way.tags, "lanes").map(str::to_string),
        oneway,
        reversed: false,
        length: 0.0,
        optional,
    }
}

/// Build the directed road multigraph of an OSM extract.
///
/// Graph nodes are the way endpoints and the nodes shared by several ways (or visited twice by one way).
/// Ways are cut at graph nodes and every piece becomes an edge holding the full intermediate geometry.
/// Two-way streets get an edge per direction, the one running against the way flagged as reversed. Ways are
/// processed in ascending id order.
pub fn build_road_graph(
    osm_data: &osm_xml::OSM,
    network_type: NetworkType,
) -> anyhow::Result<RoadGraph> {
    let mut ways: Vec<&osm_xml::Way> = osm_data
        .ways
        .values()
        .filter(|way| network_type.accepts(&way.tags))
        .collect();
    ways.sort_by_key(|way| way.id);
    log::info!(
        "Building {} road graph from {} ways",
        network_type.name(),
        ways.len()
    );

    let way_runs: Vec<(&osm_xml::Way, Vec<Vec<&osm_xml::Node>>)> = ways
        .into_iter()
        .map(|way| (way, resolved_node_runs(osm_data, way)))
        .collect();

    let mut occurrences: HashMap<NodeIdx, usize> = HashMap::new();
    let mut endpoints: HashSet<NodeIdx> = HashSet::new();
    for run in way_runs.iter().flat_map(|(_, runs)| runs) {
        for node in run {
            *occurrences.entry(node.id).or_default() += 1;
        }
        endpoints.insert(run[0].id);
        endpoints.insert(run[run.len() - 1].id);
    }
    let is_graph_node =
        |id: NodeIdx| endpoints.contains(&id) || occurrences.get(&id).map_or(false, |n| *n > 1);

    let mut graph = RoadGraph::new();
    let mut street_counts: HashMap<NodeIdx, usize> = HashMap::new();
    for (way, runs) in &way_runs {
        let direction = travel_direction(&way.tags, network_type);
        let oneway = direction != TravelDirection::Both;
        for run in runs {
            let mut piece: Vec<&osm_xml::Node> = vec![run[0]];
            for node in &run[1..] {
                piece.push(*node);
                if !is_graph_node(node.id) {
                    continue;
                }
                let (u, v) = (piece[0].id, node.id);
                let geometry: geo::LineString =
                    piece.iter().map(|n| (n.lon, n.lat)).collect::<Vec<_>>().into();
                let mut edge = road_edge_for_way(way, oneway);
                edge.length = round_to(geometry.haversine_length(), 3);

                if direction != TravelDirection::Backward {
                    graph.insert_edge_with_data(u, v, geometry.clone(), edge.clone())?;
                }
                if direction != TravelDirection::Forward {
                    let mut reversed_geometry = geometry;
                    reversed_geometry.0.reverse();
                    edge.reversed = true;
                    graph.insert_edge_with_data(v, u, reversed_geometry, edge)?;
                }
                *street_counts.entry(u).or_default() += 1;
                *street_counts.entry(v).or_default() += 1;
                piece = vec![*node];
            }
        }
    }

    if graph.edge_count() == 0 {
        return Err(anyhow!(
            "No {} road data found in the OSM extract",
            network_type.name()
        ));
    }
    for (idx, node) in graph.node_map_mut().iter_mut() {
        node.data.street_count = street_counts.get(idx).copied().unwrap_or_default();
    }
    Ok(graph)
}
