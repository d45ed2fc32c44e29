pub mod primitives;
pub mod road_graph;
