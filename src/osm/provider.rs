use std::{
    cell::RefCell,
    collections::HashMap,
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::{anyhow, Context};

use super::{
    conversion::build_road_graph,
    features::{extract_features, TagQuery},
    network_type::NetworkType,
};
use crate::{geograph::road_graph::RoadGraph, table::tag_table::TagTable};

/// Source of map data for a named place.
pub trait MapDataProvider {
    /// Road graph of the place, restricted to the given network type.
    fn road_graph(&self, place: &str, network_type: NetworkType) -> anyhow::Result<RoadGraph>;

    /// Table of the map features of the place matching the tag query.
    fn features(&self, place: &str, query: &TagQuery) -> anyhow::Result<TagTable>;
}

/// Provider reading OSM XML extracts named `<place>.osm` from a directory.
pub struct OsmXmlProvider {
    osm_dir: PathBuf,
    documents: RefCell<HashMap<String, Rc<osm_xml::OSM>>>,
}

impl OsmXmlProvider {
    pub fn new(osm_dir: &Path) -> Self {
        Self {
            osm_dir: osm_dir.to_path_buf(),
            documents: RefCell::new(HashMap::new()),
        }
    }

    pub fn filepath_for_place(&self, place: &str) -> PathBuf {
        self.osm_dir.join(format!("{}.osm", place))
    }

    /// Parsed extract of a place, read from disk on first use.
    fn document(&self, place: &str) -> anyhow::Result<Rc<osm_xml::OSM>> {
        if let Some(document) = self.documents.borrow().get(place) {
            return Ok(Rc::clone(document));
        }
        let filepath = self.filepath_for_place(place);
        if !filepath.exists() {
            return Err(anyhow!("OSM extract {:?} not found", filepath));
        }
        log::info!("Reading OSM data for {} from {:?}", place, filepath);
        let infile = std::fs::File::open(&filepath)
            .with_context(|| format!("Opening OSM extract {:?}", filepath))?;
        let document = osm_xml::OSM::parse(std::io::BufReader::new(infile))
            .map_err(|err| anyhow!("Could not parse OSM extract {:?}, {:?}", filepath, err))?;
        let document = Rc::new(document);
        self.documents
            .borrow_mut()
            .insert(place.to_string(), Rc::clone(&document));
        Ok(document)
    }
}

impl MapDataProvider for OsmXmlProvider {
    fn road_graph(&self, place: &str, network_type: NetworkType) -> anyhow::Result<RoadGraph> {
        log::info!("Creating graph for {}...", place);
        let graph = build_road_graph(&*self.document(place)?, network_type)
            .with_context(|| format!("Building road graph for {}", place))?;
        log::info!("Graph for {} created!", place);
        Ok(graph)
    }

    fn features(&self, place: &str, query: &TagQuery) -> anyhow::Result<TagTable> {
        Ok(extract_features(&*self.document(place)?, query))
    }
}

#[cfg(test)]
mod tests {
    use testdir::testdir;

    use super::{MapDataProvider, OsmXmlProvider};
    use crate::osm::{
        conversion::tests::TEST_OSM_XML, features::TagQuery, network_type::NetworkType,
    };

    #[test]
    fn test_reads_extract_of_place() {
        let dir = testdir!();
        std::fs::write(dir.join("Milan.osm"), TEST_OSM_XML).unwrap();
        let provider = OsmXmlProvider::new(&dir);

        let graph = provider.road_graph("Milan", NetworkType::Drive).unwrap();
        assert_eq!(7, graph.edge_count());
        let signals = provider
            .features("Milan", &TagQuery::new(&[("highway", Some("traffic_signals"))]))
            .unwrap();
        assert_eq!(1, signals.len());
    }

    #[test]
    fn test_missing_extract_is_an_error() {
        let provider = OsmXmlProvider::new(&testdir!());
        assert!(provider.road_graph("Atlantis", NetworkType::Drive).is_err());
    }
}
