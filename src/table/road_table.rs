use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use anyhow::anyhow;

use crate::{
    geograph::{
        primitives::NodeIdx,
        road_graph::{EdgeRecord, NodeRecord},
    },
    geometry::curveness::{AvgCurvenessMethod, CurvenessCalculator},
};

/// Name given to roads without one.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Attribute columns without meaning once parallel and opposite edges are collapsed.
pub const DEDUP_DROPPED_COLUMNS: [&str; 10] = [
    "key",
    "osmid",
    "reversed",
    "maxspeed",
    "ref",
    "bridge",
    "tunnel",
    "access",
    "width",
    "est_width",
];

pub const SUB_CURVENESS: &str = "sub_curveness";
pub const AVG_SUB_ADJACENT_ROADS: &str = "avg_sub_adjacent_roads";

/// One road segment with the attributes of its end nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadRow {
    pub u: NodeIdx,
    pub v: NodeIdx,
    pub name: String,
    pub highway: String,
    pub lanes: Option<String>,
    pub oneway: bool,
    pub length: f64,
    pub geometry: geo::LineString,
    pub street_count_u: Option<usize>,
    pub point_geometry_u: Option<geo::Point>,
    pub street_count_v: Option<usize>,
    pub point_geometry_v: Option<geo::Point>,
    /// Further text columns (multigraph key, way id, optional OSM attributes), keyed by column name.
    pub attributes: BTreeMap<String, String>,
}

/// Derived numeric column, one value per row.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Road segments plus the numeric columns derived from them, in creation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoadTable {
    rows: Vec<RoadRow>,
    numeric_columns: Vec<NumericColumn>,
}

impl RoadTable {
    pub fn new(rows: Vec<RoadRow>) -> Self {
        Self {
            rows,
            numeric_columns: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[RoadRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn numeric_columns(&self) -> &[NumericColumn] {
        &self.numeric_columns
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.numeric_columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| column.values.as_slice())
    }

    /// Add a numeric column, replacing any column of the same name in place.
    pub fn set_column(&mut self, name: &str, values: Vec<Option<f64>>) -> anyhow::Result<()> {
        if values.len() != self.rows.len() {
            return Err(anyhow!(
                "Column {} has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            ));
        }
        match self.numeric_columns.iter_mut().find(|c| c.name == name) {
            Some(column) => column.values = values,
            None => self.numeric_columns.push(NumericColumn {
                name: name.to_string(),
                values,
            }),
        }
        Ok(())
    }

    /// Names of the text attribute columns present on any row, sorted.
    pub fn attribute_columns(&self) -> Vec<String> {
        self.rows
            .iter()
            .flat_map(|row| row.attributes.keys().cloned())
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect()
    }

    /// Row indices grouped by road name, groups in order of first appearance.
    pub fn groups_by_name(&self) -> Vec<(&str, Vec<usize>)> {
        let mut group_of_name: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();
        for (index, row) in self.rows.iter().enumerate() {
            let group = *group_of_name.entry(row.name.as_str()).or_insert_with(|| {
                groups.push((row.name.as_str(), Vec::new()));
                groups.len() - 1
            });
            groups[group].1.push(index);
        }
        groups
    }

    /// Spread one value per name group over the rows of the group.
    pub fn broadcast_by_name(&self, group_values: &HashMap<&str, Option<f64>>) -> Vec<Option<f64>> {
        self.rows
            .iter()
            .map(|row| group_values.get(row.name.as_str()).copied().flatten())
            .collect()
    }

    fn keep_rows(&mut self, keep: &[bool]) {
        let mut flags = keep.iter();
        self.rows.retain(|_| *flags.next().unwrap_or(&false));
        for column in self.numeric_columns.iter_mut() {
            let mut flags = keep.iter();
            column.values.retain(|_| *flags.next().unwrap_or(&false));
        }
    }
}

/// Join the edge table with the node table on both end nodes.
///
/// Every edge yields one row. End nodes missing from the node table leave their `_u`/`_v` columns empty.
/// Way ids, multigraph keys, reversal flags and optional OSM attributes become text attribute columns and
/// missing names are set to [`UNKNOWN_NAME`].
pub fn flatten_and_merge(nodes: &[NodeRecord], edges: &[EdgeRecord]) -> RoadTable {
    log::info!("Merging nodes and edges into a unique table");
    let node_by_id: HashMap<NodeIdx, &NodeRecord> =
        nodes.iter().map(|node| (node.osmid, node)).collect();

    let rows = edges
        .iter()
        .map(|edge| {
            let node_u = node_by_id.get(&edge.u);
            let node_v = node_by_id.get(&edge.v);
            let attributes = &edge.attributes;

            let mut text_columns = attributes.optional.clone();
            text_columns.insert("key".to_string(), edge.key.to_string());
            text_columns.insert("osmid".to_string(), attributes.osmid.to_string());
            text_columns.insert("reversed".to_string(), attributes.reversed.to_string());

            RoadRow {
                u: edge.u,
                v: edge.v,
                name: attributes
                    .name
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
                highway: attributes.highway.clone(),
                lanes: attributes.lanes.clone(),
                oneway: attributes.oneway,
                length: attributes.length,
                geometry: edge.geometry.clone(),
                street_count_u: node_u.map(|node| node.street_count),
                point_geometry_u: node_u.map(|node| node.geometry),
                street_count_v: node_v.map(|node| node.street_count),
                point_geometry_v: node_v.map(|node| node.geometry),
                attributes: text_columns,
            }
        })
        .collect();
    RoadTable::new(rows)
}

/// Keep the first row of every (end node pair, name) group and drop the [`DEDUP_DROPPED_COLUMNS`] present.
///
/// The end node pair is unordered, so both directions of a two-way street collapse into one row. Which
/// direction survives depends on the order the provider delivered the edges in.
pub fn deduplicate(mut table: RoadTable) -> RoadTable {
    let mut seen: HashSet<(NodeIdx, NodeIdx, String)> = HashSet::new();
    let keep: Vec<bool> = table
        .rows
        .iter()
        .map(|row| seen.insert((row.u.min(row.v), row.u.max(row.v), row.name.clone())))
        .collect();
    table.keep_rows(&keep);
    for row in table.rows.iter_mut() {
        for column in DEDUP_DROPPED_COLUMNS {
            row.attributes.remove(column);
        }
    }
    log::info!("{} road segments after removing duplicates", table.len());
    table
}

pub fn attach_sub_curveness(
    table: &mut RoadTable,
    calculator: &CurvenessCalculator,
) -> anyhow::Result<()> {
    log::info!("Computing sinuosity of single road segments");
    let values = table
        .rows
        .iter()
        .map(|row| calculator.sub_curveness(&row.geometry).map(Some))
        .collect::<anyhow::Result<Vec<Option<f64>>>>()?;
    table.set_column(SUB_CURVENESS, values)
}

/// Curveness of each named road, repeated on all its rows.
pub fn attach_avg_curveness(
    table: &mut RoadTable,
    calculator: &CurvenessCalculator,
    method: AvgCurvenessMethod,
) -> anyhow::Result<()> {
    log::info!(
        "Computing average sinuosity of entire road by name ({:?} method)",
        method
    );
    let mut group_values: HashMap<&str, Option<f64>> = HashMap::new();
    for (name, indices) in table.groups_by_name() {
        let value = match method {
            AvgCurvenessMethod::First => {
                let sub_curveness = table
                    .column(SUB_CURVENESS)
                    .ok_or_else(|| anyhow!("Segment curveness must be computed first"))?;
                let group: Vec<f64> = indices.iter().filter_map(|i| sub_curveness[*i]).collect();
                calculator.avg_curveness_of_segments(&group)
            }
            AvgCurvenessMethod::Second => {
                let geometries: Vec<&geo::LineString> =
                    indices.iter().map(|i| &table.rows[*i].geometry).collect();
                calculator.avg_curveness_of_merged(&geometries)?
            }
        };
        group_values.insert(name, Some(value));
    }
    let values = table.broadcast_by_name(&group_values);
    table.set_column(method.column_name(), values)
}

/// Segment curveness plus both road-level averages.
pub fn attach_curveness(
    table: &mut RoadTable,
    calculator: &CurvenessCalculator,
) -> anyhow::Result<()> {
    attach_sub_curveness(table, calculator)?;
    attach_avg_curveness(table, calculator, AvgCurvenessMethod::First)?;
    attach_avg_curveness(table, calculator, AvgCurvenessMethod::Second)
}

/// Mean street count of the two end nodes of each segment.
pub fn attach_adjacent_roads(table: &mut RoadTable) -> anyhow::Result<()> {
    let values = table
        .rows
        .iter()
        .map(|row| match (row.street_count_u, row.street_count_v) {
            (Some(u), Some(v)) => Some((u + v) as f64 / 2.0),
            _ => None,
        })
        .collect();
    table.set_column(AVG_SUB_ADJACENT_ROADS, values)
}
