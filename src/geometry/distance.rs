use anyhow::anyhow;
use geo::{EuclideanLength, GeodesicDistance, GeodesicLength};
use proj::Transform;

use crate::crs::crs_utils::{epsg_code_to_authority_string, EpsgCode, WGS84};

/// How lengths of lon/lat geometries are measured. The same measure must be used for path and chord
/// lengths so that their ratio stays meaningful.
pub enum DistanceMeasure {
    /// Project WGS84 coordinates into a planar CRS and measure euclidean lengths in its units.
    Projected { projection: proj::Proj, epsg: EpsgCode },
    /// Measure geodesic distances on the WGS84 ellipsoid directly.
    Geodesic,
}

impl DistanceMeasure {
    pub fn projected(to_epsg: EpsgCode) -> anyhow::Result<Self> {
        let projection = proj::Proj::new_known_crs(
            &epsg_code_to_authority_string(WGS84),
            &epsg_code_to_authority_string(to_epsg),
            None,
        )?;
        Ok(Self::Projected {
            projection,
            epsg: to_epsg,
        })
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Projected { epsg, .. } => {
                format!("projected to {}", epsg_code_to_authority_string(*epsg))
            }
            Self::Geodesic => "geodesic".to_string(),
        }
    }

    /// Length measured along the line.
    pub fn path_length(&self, line: &geo::LineString) -> anyhow::Result<f64> {
        match self {
            Self::Projected { projection, .. } => Ok(line
                .transformed(projection)
                .map_err(|err| anyhow!("Could not project line, {}", err))?
                .euclidean_length()),
            Self::Geodesic => Ok(line.geodesic_length()),
        }
    }

    /// Straight-line distance between two coordinates.
    pub fn chord_length(&self, start: geo::Coord, end: geo::Coord) -> anyhow::Result<f64> {
        match self {
            Self::Projected { .. } => self.path_length(&geo::LineString::new(vec![start, end])),
            Self::Geodesic => Ok(geo::Point::from(start).geodesic_distance(&geo::Point::from(end))),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    use super::DistanceMeasure;
    use crate::crs::crs_utils::WEB_MERCATOR;

    #[rstest]
    #[case(DistanceMeasure::projected(WEB_MERCATOR).unwrap())]
    #[case(DistanceMeasure::Geodesic)]
    fn test_two_point_path_equals_chord(#[case] measure: DistanceMeasure) {
        let start = geo::coord! { x: 9.18, y: 45.46 };
        let end = geo::coord! { x: 9.19, y: 45.47 };
        let path = measure
            .path_length(&geo::LineString::new(vec![start, end]))
            .unwrap();
        let chord = measure.chord_length(start, end).unwrap();
        assert!(path > 0.0);
        assert_abs_diff_eq!(path, chord, epsilon = 1e-9);
    }

    #[test]
    fn test_geodesic_degree_of_latitude_at_equator() {
        let measure = DistanceMeasure::Geodesic;
        let chord = measure
            .chord_length(geo::coord! { x: 0.0, y: 0.0 }, geo::coord! { x: 0.0, y: 1.0 })
            .unwrap();
        // One degree of latitude near the equator is about 110.57 km on WGS84.
        assert_abs_diff_eq!(chord, 110_574.0, epsilon = 5.0);
    }

    #[test]
    fn test_web_mercator_scales_with_latitude() {
        let measure = DistanceMeasure::projected(WEB_MERCATOR).unwrap();
        let at_equator = measure
            .chord_length(geo::coord! { x: 0.0, y: 0.0 }, geo::coord! { x: 0.01, y: 0.0 })
            .unwrap();
        let at_milan = measure
            .chord_length(geo::coord! { x: 9.0, y: 45.0 }, geo::coord! { x: 9.01, y: 45.0 })
            .unwrap();
        assert_abs_diff_eq!(at_equator, at_milan, epsilon = 1e-6);
        assert_eq!("projected to EPSG:3857", measure.describe());
    }
}
