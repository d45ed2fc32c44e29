use std::path::Path;

use anyhow::Context;
use indicatif::ProgressBar;
use wkt::ToWkt;

use super::{
    road_table::{RoadRow, RoadTable},
    tag_table::TagTable,
};

/// Leading columns of the road table file, before the attribute and derived columns.
pub const ROAD_BASE_COLUMNS: [&str; 12] = [
    "u",
    "v",
    "name",
    "highway",
    "lanes",
    "oneway",
    "length",
    "geometry",
    "street_count_u",
    "point_geometry_u",
    "street_count_v",
    "point_geometry_v",
];

fn optional_text<T: ToString>(value: Option<T>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

fn base_values(row: &RoadRow) -> [String; 12] {
    [
        row.u.to_string(),
        row.v.to_string(),
        row.name.clone(),
        row.highway.clone(),
        optional_text(row.lanes.as_ref()),
        row.oneway.to_string(),
        row.length.to_string(),
        row.geometry.wkt_string(),
        optional_text(row.street_count_u),
        optional_text(row.point_geometry_u.map(|point| point.wkt_string())),
        optional_text(row.street_count_v),
        optional_text(row.point_geometry_v.map(|point| point.wkt_string())),
    ]
}

/// Header of the road table file.
pub fn road_table_header(table: &RoadTable) -> Vec<String> {
    ROAD_BASE_COLUMNS
        .iter()
        .map(|column| column.to_string())
        .chain(table.attribute_columns())
        .chain(table.numeric_columns().iter().map(|column| column.name.clone()))
        .collect()
}

pub fn write_road_table(table: &RoadTable, output_filepath: &Path) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(output_filepath)
        .with_context(|| format!("Creating {:?}", output_filepath))?;
    let attribute_columns = table.attribute_columns();
    writer.write_record(road_table_header(table))?;

    log::info!("Writing {} road segments to {:?}", table.len(), output_filepath);
    let bar = ProgressBar::new(table.len() as u64);
    for (index, row) in table.rows().iter().enumerate() {
        let mut record: Vec<String> = base_values(row).into();
        record.extend(
            attribute_columns
                .iter()
                .map(|column| row.attributes.get(column).cloned().unwrap_or_default()),
        );
        record.extend(
            table
                .numeric_columns()
                .iter()
                .map(|column| optional_text(column.values[index])),
        );
        writer.write_record(&record)?;
        bar.inc(1);
    }
    bar.finish_and_clear();
    writer.flush()?;
    Ok(())
}

pub fn write_tag_table(table: &TagTable, output_filepath: &Path) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(output_filepath)
        .with_context(|| format!("Creating {:?}", output_filepath))?;
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|value| value.as_deref().unwrap_or("")))?;
    }
    writer.flush()?;
    log::info!("Wrote {} features to {:?}", table.len(), output_filepath);
    Ok(())
}
