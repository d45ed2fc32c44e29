use super::{distance::DistanceMeasure, line_merge::merge_lines};

/// How the curveness of a whole named road is derived from its segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvgCurvenessMethod {
    /// Mean of the segment curveness values.
    First,
    /// Merge the segment geometries into continuous lines, then average the curveness of those lines.
    Second,
}

impl AvgCurvenessMethod {
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::First => "avg_curveness_first",
            Self::Second => "avg_curveness_second",
        }
    }
}

/// Round to a fixed number of decimal digits.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Computes sinuosity measures, `1 - chord / path`, for lon/lat geometries.
pub struct CurvenessCalculator {
    measure: DistanceMeasure,
    precision: u32,
}

impl CurvenessCalculator {
    pub fn new(measure: DistanceMeasure, precision: u32) -> Self {
        Self { measure, precision }
    }

    pub fn measure(&self) -> &DistanceMeasure {
        &self.measure
    }

    /// Curveness of a single line. 0 for a straight line, approaching 1 for contorted ones.
    ///
    /// Lines without two distinct boundary points (fewer than two coordinates, closed rings) and lines of zero
    /// length count as straight.
    pub fn sub_curveness(&self, line: &geo::LineString) -> anyhow::Result<f64> {
        let (Some(start), Some(end)) = (line.0.first(), line.0.last()) else {
            return Ok(0.0);
        };
        if line.0.len() < 2 || start == end {
            return Ok(0.0);
        }
        let path_length = self.measure.path_length(line)?;
        if path_length <= 0.0 {
            return Ok(0.0);
        }
        let chord_length = self.measure.chord_length(*start, *end)?;
        let curve_ratio = round_to(chord_length / path_length, self.precision);
        Ok(round_to(1.0 - curve_ratio, self.precision).clamp(0.0, 1.0))
    }

    /// Curveness of a named road from the curveness values of its segments.
    pub fn avg_curveness_of_segments(&self, sub_curveness: &[f64]) -> f64 {
        if sub_curveness.is_empty() {
            return 0.0;
        }
        let mean = sub_curveness.iter().sum::<f64>() / sub_curveness.len() as f64;
        round_to(mean, self.precision)
    }

    /// Curveness of a named road from its segment geometries, measured on the merged lines.
    pub fn avg_curveness_of_merged(&self, geometries: &[&geo::LineString]) -> anyhow::Result<f64> {
        let merged = merge_lines(geometries);
        let curveness = merged
            .iter()
            .map(|line| self.sub_curveness(line))
            .collect::<anyhow::Result<Vec<f64>>>()?;
        Ok(self.avg_curveness_of_segments(&curveness))
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    use super::{round_to, CurvenessCalculator};
    use crate::{crs::crs_utils::WEB_MERCATOR, geometry::distance::DistanceMeasure};

    fn projected() -> CurvenessCalculator {
        CurvenessCalculator::new(DistanceMeasure::projected(WEB_MERCATOR).unwrap(), 5)
    }

    fn geodesic() -> CurvenessCalculator {
        CurvenessCalculator::new(DistanceMeasure::Geodesic, 5)
    }

    /// Half circle from (0, 0) to (0, 1) bulging east.
    fn semicircle(steps: usize) -> geo::LineString {
        (0..=steps)
            .map(|step| {
                let angle = -PI / 2.0 + PI * step as f64 / steps as f64;
                (0.5 * angle.cos(), 0.5 + 0.5 * angle.sin())
            })
            .collect::<Vec<(f64, f64)>>()
            .into()
    }

    #[rstest]
    #[case(projected())]
    #[case(geodesic())]
    fn test_straight_segment_has_zero_curveness(#[case] calculator: CurvenessCalculator) {
        let line: geo::LineString = vec![(0.0, 0.0), (0.0, 1.0)].into();
        assert_eq!(0.0, calculator.sub_curveness(&line).unwrap());

        let collinear: geo::LineString = vec![(9.0, 45.0), (9.0, 45.001), (9.0, 45.002)].into();
        assert_abs_diff_eq!(0.0, calculator.sub_curveness(&collinear).unwrap(), epsilon = 1e-4);
    }

    #[rstest]
    #[case(projected())]
    #[case(geodesic())]
    fn test_semicircle_is_curvy(#[case] calculator: CurvenessCalculator) {
        let curveness = calculator.sub_curveness(&semicircle(64)).unwrap();
        assert!(curveness > 0.3, "curveness {}", curveness);
        assert!(curveness <= 1.0);
        // Chord over arc of a half circle is 2 / pi.
        assert_abs_diff_eq!(curveness, 1.0 - 2.0 / PI, epsilon = 0.01);
    }

    #[rstest]
    #[case(vec![(1.0, 1.0)])]
    #[case(vec![])]
    #[case(vec![(0.0, 0.0), (0.001, 0.0), (0.001, 0.001), (0.0, 0.0)])]
    #[case(vec![(3.0, 3.0), (3.0, 3.0)])]
    fn test_degenerate_lines_are_straight(#[case] coords: Vec<(f64, f64)>) {
        let line: geo::LineString = coords.into();
        assert_eq!(0.0, geodesic().sub_curveness(&line).unwrap());
    }

    #[test]
    fn test_sub_curveness_is_rounded() {
        let line: geo::LineString = vec![(9.0, 45.0), (9.0007, 45.0003), (9.001, 45.0)].into();
        let curveness = projected().sub_curveness(&line).unwrap();
        assert_eq!(round_to(curveness, 5), curveness);
        assert!(curveness > 0.0 && curveness < 1.0);
    }

    #[test]
    fn test_avg_curveness_of_segments_is_mean() {
        assert_abs_diff_eq!(
            0.2,
            geodesic().avg_curveness_of_segments(&[0.1, 0.2, 0.3]),
            epsilon = 1e-12
        );
        assert_eq!(0.0, geodesic().avg_curveness_of_segments(&[]));
    }

    #[test]
    fn test_avg_curveness_of_merged_measures_whole_road() {
        // Two straight halves of a bend: each half is straight, the merged road is not.
        let first_half: geo::LineString = vec![(0.0, 0.0), (0.001, 0.001)].into();
        let second_half: geo::LineString = vec![(0.001, 0.001), (0.002, 0.0)].into();
        let calculator = geodesic();

        let merged = calculator
            .avg_curveness_of_merged(&[&first_half, &second_half])
            .unwrap();
        assert!(merged > 0.25, "merged curveness {}", merged);
        assert_eq!(0.0, calculator.sub_curveness(&first_half).unwrap());
        assert_eq!(0.0, calculator.sub_curveness(&second_half).unwrap());
    }

    #[test]
    fn test_round_to() {
        assert_eq!(0.12346, round_to(0.123456, 5));
        assert_eq!(0.123, round_to(0.123456, 3));
        assert_eq!(1.0, round_to(0.99999999, 5));
    }
}
