pub mod centrality_merge;
pub mod csv_output;
pub mod road_table;
pub mod tag_layers;
pub mod tag_table;
