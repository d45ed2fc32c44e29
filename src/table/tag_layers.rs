use super::tag_table::TagTable;
use crate::osm::features::TagQuery;

/// Road classes kept in the road surface layer.
pub const ROAD_SURFACE_HIGHWAYS: [&str; 14] = [
    "living_street",
    "motorway",
    "motorway_link",
    "primary",
    "primary_link",
    "residential",
    "secondary",
    "secondary_link",
    "service",
    "tertiary",
    "tertiary_link",
    "trunk",
    "trunk_link",
    "unclassified",
];

/// Extra processing applied to a layer before column pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LayerKind {
    Plain,
    RoadSurface,
}

/// Auxiliary map layer extracted next to the road table.
#[derive(Debug, Clone)]
pub struct TagCategory {
    /// Output file stem.
    pub name: &'static str,
    pub query: TagQuery,
    /// Whether the way node list is left out of the output.
    pub drop_nodes: bool,
    kind: LayerKind,
}

impl TagCategory {
    fn new(name: &'static str, conditions: &[(&str, Option<&str>)], drop_nodes: bool) -> Self {
        Self {
            name,
            query: TagQuery::new(conditions),
            drop_nodes,
            kind: LayerKind::Plain,
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name)
    }

    /// Filter and prune a raw feature table into the layer written to disk.
    ///
    /// Columns missing in at least `nan_cols_thres` of the rows are dropped, then columns holding a single value.
    pub fn prepare(&self, raw: &TagTable, nan_cols_thres: f64) -> TagTable {
        let mut table = raw.clone();
        if self.kind == LayerKind::RoadSurface {
            table.retain_rows(|table, row| {
                table
                    .value(row, "highway")
                    .map_or(false, |highway| ROAD_SURFACE_HIGHWAYS.contains(&highway))
            });
            table.add_column("surface_mapped", |table, row| {
                let mapped = match table.value(row, "surface") {
                    Some("asphalt") => "asphalt",
                    _ => "other",
                };
                Some(mapped.to_string())
            });
        }
        prune_columns(&mut table, self.drop_nodes, nan_cols_thres);
        table
    }
}

fn prune_columns(table: &mut TagTable, drop_nodes: bool, nan_cols_thres: f64) {
    let sparse: Vec<String> = table
        .columns()
        .iter()
        .filter(|column| table.missing_fraction(column) >= nan_cols_thres)
        .cloned()
        .collect();
    table.retain_columns(|column| !(drop_nodes && column == "nodes") && !sparse.iter().any(|s| s == column));

    if table.len() < 2 {
        return;
    }
    let constant: Vec<String> = table
        .columns()
        .iter()
        .filter(|column| table.distinct_count(column) <= 1)
        .cloned()
        .collect();
    table.retain_columns(|column| !constant.iter().any(|c| c == column));
}

/// All auxiliary layers, in extraction order.
pub fn tag_categories() -> Vec<TagCategory> {
    vec![
        TagCategory::new("traffic_signals", &[("highway", Some("traffic_signals"))], false),
        TagCategory::new("give_way", &[("highway", Some("give_way"))], false),
        TagCategory::new("stop", &[("highway", Some("stop"))], false),
        TagCategory::new("roundabout", &[("junction", Some("roundabout"))], true),
        TagCategory::new("tram_rails", &[("railway", Some("tram"))], true),
        TagCategory {
            kind: LayerKind::RoadSurface,
            ..TagCategory::new("road_surface", &[("surface", None)], true)
        },
        TagCategory::new(
            "parking_meters",
            &[("amenity", Some("vending_machine")), ("vending", Some("parking_tickets"))],
            false,
        ),
        TagCategory::new("charging_stations", &[("amenity", Some("charging_station"))], false),
    ]
}
