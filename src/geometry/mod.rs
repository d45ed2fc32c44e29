pub mod curveness;
pub mod distance;
pub mod line_merge;
