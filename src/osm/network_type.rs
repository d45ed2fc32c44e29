use serde::Deserialize;

use super::tag_value;

/// Which ways of an OSM extract make up the road graph.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    /// Public drivable streets, without service roads.
    #[default]
    Drive,
    /// Drivable streets including service roads.
    DriveService,
    Walk,
    Bike,
    /// Every non-private highway.
    All,
}

const NEVER_ROUTABLE: [&str; 7] = [
    "abandoned",
    "construction",
    "no",
    "planned",
    "platform",
    "proposed",
    "razed",
];

const NOT_DRIVABLE: [&str; 13] = [
    "bridleway",
    "bus_guideway",
    "corridor",
    "cycleway",
    "elevator",
    "escalator",
    "footway",
    "path",
    "pedestrian",
    "raceway",
    "service",
    "steps",
    "track",
];

const MOTOR_ONLY: [&str; 2] = ["motorway", "motorway_link"];

impl NetworkType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Drive => "drive",
            Self::DriveService => "drive_service",
            Self::Walk => "walk",
            Self::Bike => "bike",
            Self::All => "all",
        }
    }

    /// Whether oneway restrictions apply to this kind of traffic.
    pub fn respects_oneway(&self) -> bool {
        matches!(self, Self::Drive | Self::DriveService | Self::Bike)
    }

    /// Whether a way with these tags belongs to the network.
    pub fn accepts(&self, tags: &[osm_xml::Tag]) -> bool {
        let Some(highway) = tag_value(tags, "highway") else {
            return false;
        };
        let is = |key: &str, value: &str| tag_value(tags, key) == Some(value);
        if is("area", "yes") || is("access", "private") || is("service", "private") {
            return false;
        }
        if NEVER_ROUTABLE.contains(&highway) {
            return false;
        }
        let service = tag_value(tags, "service");
        match self {
            Self::Drive | Self::DriveService => {
                let excluded_service: &[&str] = if *self == Self::Drive {
                    &["alley", "driveway", "emergency_access", "parking", "parking_aisle"]
                } else {
                    &["emergency_access", "parking", "parking_aisle"]
                };
                let drivable = if *self == Self::Drive {
                    !NOT_DRIVABLE.contains(&highway)
                } else {
                    highway == "service" || !NOT_DRIVABLE.contains(&highway)
                };
                drivable
                    && !is("motor_vehicle", "no")
                    && !is("motorcar", "no")
                    && !service.map_or(false, |s| excluded_service.contains(&s))
            }
            Self::Walk => {
                !MOTOR_ONLY.contains(&highway)
                    && !["bus_guideway", "cycleway", "raceway"].contains(&highway)
                    && !is("foot", "no")
            }
            Self::Bike => {
                !MOTOR_ONLY.contains(&highway)
                    && ![
                        "bus_guideway",
                        "corridor",
                        "elevator",
                        "escalator",
                        "footway",
                        "raceway",
                        "steps",
                    ]
                    .contains(&highway)
                    && !is("bicycle", "no")
            }
            Self::All => highway != "raceway",
        }
    }
}
