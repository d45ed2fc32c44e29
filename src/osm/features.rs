use std::{collections::BTreeSet, fmt};

use wkt::ToWkt;

use super::tag_value;
use crate::table::tag_table::TagTable;

/// Condition on a single tag key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagMatch {
    /// The key is present with any value.
    Any,
    Value(String),
}

/// Set of tag conditions. An element matches when any condition holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagQuery {
    conditions: Vec<(String, TagMatch)>,
}

impl TagQuery {
    /// Conditions given as (key, value) pairs, `None` matching any value.
    pub fn new(conditions: &[(&str, Option<&str>)]) -> Self {
        Self {
            conditions: conditions
                .iter()
                .map(|(key, value)| {
                    let matcher = match value {
                        Some(value) => TagMatch::Value(value.to_string()),
                        None => TagMatch::Any,
                    };
                    (key.to_string(), matcher)
                })
                .collect(),
        }
    }

    pub fn matches(&self, tags: &[osm_xml::Tag]) -> bool {
        self.conditions
            .iter()
            .any(|(key, matcher)| match (tag_value(tags, key), matcher) {
                (Some(_), TagMatch::Any) => true,
                (Some(found), TagMatch::Value(expected)) => found == expected,
                (None, _) => false,
            })
    }
}

impl fmt::Display for TagQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .conditions
            .iter()
            .map(|(key, matcher)| match matcher {
                TagMatch::Any => format!("{}=*", key),
                TagMatch::Value(value) => format!("{}={}", key, value),
            })
            .collect();
        write!(f, "{}", parts.join("|"))
    }
}

/// A matched node or way with its geometry.
struct MatchedFeature<'a> {
    element_type: &'static str,
    osmid: i64,
    geometry: geo::Geometry,
    node_ids: Option<Vec<i64>>,
    tags: &'a [osm_xml::Tag],
}

fn way_geometry(osm_data: &osm_xml::OSM, way: &osm_xml::Way) -> Option<(geo::Geometry, Vec<i64>)> {
    let nodes: Vec<&osm_xml::Node> = way
        .nodes
        .iter()
        .filter_map(|reference| match osm_data.resolve_reference(reference) {
            osm_xml::Reference::Node(node) => Some(node),
            _ => None,
        })
        .collect();
    if nodes.len() < 2 {
        return None;
    }
    let node_ids: Vec<i64> = nodes.iter().map(|node| node.id).collect();
    let line: geo::LineString = nodes
        .iter()
        .map(|node| (node.lon, node.lat))
        .collect::<Vec<_>>()
        .into();
    let closed = nodes.len() >= 4 && node_ids.first() == node_ids.last();
    let geometry = if closed {
        geo::Geometry::Polygon(geo::Polygon::new(line, vec![]))
    } else {
        geo::Geometry::LineString(line)
    };
    Some((geometry, node_ids))
}

/// Table of the nodes and ways matching `query`, nodes first, each by ascending id.
///
/// Columns are `element_type`, `osmid`, `geometry` (WKT), `nodes` (node ids of ways) and then every tag key
/// found on the matches, sorted.
pub fn extract_features(osm_data: &osm_xml::OSM, query: &TagQuery) -> TagTable {
    let mut nodes: Vec<&osm_xml::Node> = osm_data
        .nodes
        .values()
        .filter(|node| query.matches(&node.tags))
        .collect();
    nodes.sort_by_key(|node| node.id);
    let mut ways: Vec<&osm_xml::Way> = osm_data
        .ways
        .values()
        .filter(|way| query.matches(&way.tags))
        .collect();
    ways.sort_by_key(|way| way.id);

    let mut features: Vec<MatchedFeature> = nodes
        .into_iter()
        .map(|node| MatchedFeature {
            element_type: "node",
            osmid: node.id,
            geometry: geo::Geometry::Point(geo::Point::new(node.lon, node.lat)),
            node_ids: None,
            tags: &node.tags,
        })
        .collect();
    for way in ways {
        match way_geometry(osm_data, way) {
            Some((geometry, node_ids)) => features.push(MatchedFeature {
                element_type: "way",
                osmid: way.id,
                geometry,
                node_ids: Some(node_ids),
                tags: &way.tags,
            }),
            None => log::debug!("Skipping way {} without geometry in the extract", way.id),
        }
    }

    let tag_keys: BTreeSet<&str> = features
        .iter()
        .flat_map(|feature| feature.tags.iter().map(|tag| tag.key.as_str()))
        .collect();
    let mut columns: Vec<String> = ["element_type", "osmid", "geometry", "nodes"]
        .iter()
        .map(|column| column.to_string())
        .collect();
    let tag_columns: Vec<String> = tag_keys
        .into_iter()
        .filter(|key| !columns.iter().any(|column| column == key))
        .map(str::to_string)
        .collect();
    columns.extend(tag_columns);

    let mut table = TagTable::new(columns);
    for feature in features {
        let mut values: Vec<(&str, String)> = vec![
            ("element_type", feature.element_type.to_string()),
            ("osmid", feature.osmid.to_string()),
            ("geometry", feature.geometry.wkt_string()),
        ];
        if let Some(node_ids) = &feature.node_ids {
            values.push(("nodes", format!("{:?}", node_ids)));
        }
        values.extend(
            feature
                .tags
                .iter()
                .map(|tag| (tag.key.as_str(), tag.val.clone())),
        );
        table.push_row(values);
    }
    table
}
