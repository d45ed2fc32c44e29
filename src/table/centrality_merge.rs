use std::collections::HashMap;

use serde::Deserialize;

use super::road_table::RoadTable;
use crate::centrality::CentralityScores;

/// How the per-road `avg_via_<metric>` value combines the end node scores.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoadCentralityAggregate {
    /// Mean of the road's average start node score and average end node score.
    #[default]
    BothEndpoints,
    /// Average start node score only.
    StartEndpointOnly,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}

fn midpoint(first: Option<f64>, second: Option<f64>) -> Option<f64> {
    match (first, second) {
        (Some(first), Some(second)) => Some((first + second) / 2.0),
        _ => None,
    }
}

/// Attach the scores of one centrality metric to the road table.
///
/// Adds `<m>_u` and `<m>_v` with the scores of the end nodes, `avg_via_<m>` with the road-level aggregate
/// repeated over every segment of the named road, and `avg_sub_<m>` with the mean of the two end node scores.
/// Nodes without a score leave their cells empty, and the row count never changes.
pub fn merge_metric(
    table: &mut RoadTable,
    scores: &CentralityScores,
    aggregate: RoadCentralityAggregate,
) -> anyhow::Result<()> {
    log::info!("Merging {} scores into the roads table", scores.name);
    let scores_u: Vec<Option<f64>> = table.rows().iter().map(|row| scores.get(row.u)).collect();
    let scores_v: Vec<Option<f64>> = table.rows().iter().map(|row| scores.get(row.v)).collect();

    let mut road_scores: HashMap<&str, Option<f64>> = HashMap::new();
    for (name, indices) in table.groups_by_name() {
        let mean_u = mean(indices.iter().filter_map(|i| scores_u[*i]));
        let mean_v = match aggregate {
            RoadCentralityAggregate::BothEndpoints => {
                mean(indices.iter().filter_map(|i| scores_v[*i]))
            }
            RoadCentralityAggregate::StartEndpointOnly => mean_u,
        };
        road_scores.insert(name, midpoint(mean_u, mean_v));
    }
    let via_scores = table.broadcast_by_name(&road_scores);
    let sub_scores: Vec<Option<f64>> = scores_u
        .iter()
        .zip(scores_v.iter())
        .map(|(u, v)| midpoint(*u, *v))
        .collect();

    table.set_column(&format!("{}_u", scores.name), scores_u)?;
    table.set_column(&format!("{}_v", scores.name), scores_v)?;
    table.set_column(&format!("avg_via_{}", scores.name), via_scores)?;
    table.set_column(&format!("avg_sub_{}", scores.name), sub_scores)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    use super::{merge_metric, RoadCentralityAggregate};
    use crate::{
        centrality::CentralityScores,
        table::road_table::{tests::road_row, RoadTable},
    };

    fn pagerank(scores: &[(i64, f64)]) -> CentralityScores {
        CentralityScores::new("pagerank", scores.iter().copied().collect::<HashMap<_, _>>())
    }

    fn assert_column(table: &RoadTable, name: &str, expected: &[Option<f64>]) {
        let column = table.column(name).unwrap();
        assert_eq!(expected.len(), column.len(), "{}", name);
        for (expected, actual) in expected.iter().zip(column) {
            match (expected, actual) {
                (Some(expected), Some(actual)) => assert_abs_diff_eq!(*expected, *actual, epsilon = 1e-9),
                _ => assert_eq!(expected, actual, "{}", name),
            }
        }
    }

    #[test]
    fn test_merge_metric_on_single_road() {
        let mut table = RoadTable::new(vec![road_row(1, 2, "Main St"), road_row(2, 3, "Main St")]);
        let scores = pagerank(&[(1, 0.5), (2, 0.7), (3, 0.9)]);
        merge_metric(&mut table, &scores, RoadCentralityAggregate::BothEndpoints).unwrap();

        let names: Vec<&str> = table.numeric_columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(vec!["pagerank_u", "pagerank_v", "avg_via_pagerank", "avg_sub_pagerank"], names);
        assert_column(&table, "pagerank_u", &[Some(0.5), Some(0.7)]);
        assert_column(&table, "pagerank_v", &[Some(0.7), Some(0.9)]);
        assert_column(&table, "avg_sub_pagerank", &[Some(0.6), Some(0.8)]);
        // mean(u) = 0.6, mean(v) = 0.8
        assert_column(&table, "avg_via_pagerank", &[Some(0.7), Some(0.7)]);
    }

    #[rstest]
    #[case(RoadCentralityAggregate::BothEndpoints, 0.7)]
    #[case(RoadCentralityAggregate::StartEndpointOnly, 0.6)]
    fn test_road_aggregate(#[case] aggregate: RoadCentralityAggregate, #[case] expected: f64) {
        let mut table = RoadTable::new(vec![road_row(1, 2, "Main St"), road_row(2, 3, "Main St")]);
        let scores = pagerank(&[(1, 0.5), (2, 0.7), (3, 0.9)]);
        merge_metric(&mut table, &scores, aggregate).unwrap();
        assert_column(&table, "avg_via_pagerank", &[Some(expected), Some(expected)]);
    }

    #[test]
    fn test_missing_scores_leave_empty_cells() {
        let mut table = RoadTable::new(vec![
            road_row(1, 2, "Main St"),
            road_row(2, 4, "Main St"),
            road_row(5, 6, "Dead End"),
        ]);
        let scores = pagerank(&[(1, 0.2), (2, 0.4)]);
        merge_metric(&mut table, &scores, RoadCentralityAggregate::BothEndpoints).unwrap();

        assert_eq!(3, table.len());
        assert_column(&table, "pagerank_u", &[Some(0.2), Some(0.4), None]);
        assert_column(&table, "pagerank_v", &[Some(0.4), None, None]);
        assert_column(&table, "avg_sub_pagerank", &[Some(0.3), None, None]);
        // Means skip missing scores: u = 0.3, v = 0.4.
        assert_column(&table, "avg_via_pagerank", &[Some(0.35), Some(0.35), None]);
    }

    #[test]
    fn test_merging_again_replaces_columns() {
        let mut table = RoadTable::new(vec![road_row(1, 2, "Main St")]);
        merge_metric(&mut table, &pagerank(&[(1, 0.1), (2, 0.3)]), Default::default()).unwrap();
        merge_metric(&mut table, &pagerank(&[(1, 0.5), (2, 0.7)]), Default::default()).unwrap();
        assert_eq!(4, table.numeric_columns().len());
        assert_column(&table, "avg_sub_pagerank", &[Some(0.6)]);
    }
}
