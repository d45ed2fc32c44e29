use std::{collections::HashMap, rc::Rc};

use super::{features::TagQuery, network_type::NetworkType, provider::MapDataProvider};
use crate::{geograph::road_graph::RoadGraph, table::tag_table::TagTable};

/// Memoizes provider results: road graphs by (place, network type), feature tables by (place, tag query).
pub struct ProviderCache<P: MapDataProvider> {
    provider: P,
    graphs: HashMap<(String, NetworkType), Rc<RoadGraph>>,
    features: HashMap<(String, TagQuery), Rc<TagTable>>,
}

impl<P: MapDataProvider> ProviderCache<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            graphs: HashMap::new(),
            features: HashMap::new(),
        }
    }

    pub fn road_graph(
        &mut self,
        place: &str,
        network_type: NetworkType,
    ) -> anyhow::Result<Rc<RoadGraph>> {
        let key = (place.to_string(), network_type);
        if let Some(graph) = self.graphs.get(&key) {
            return Ok(Rc::clone(graph));
        }
        let graph = Rc::new(self.provider.road_graph(place, network_type)?);
        self.graphs.insert(key, Rc::clone(&graph));
        Ok(graph)
    }

    pub fn features(&mut self, place: &str, query: &TagQuery) -> anyhow::Result<Rc<TagTable>> {
        let key = (place.to_string(), query.clone());
        if let Some(table) = self.features.get(&key) {
            return Ok(Rc::clone(table));
        }
        log::debug!("Querying {} features of {}", query, place);
        let table = Rc::new(self.provider.features(place, query)?);
        self.features.insert(key, Rc::clone(&table));
        Ok(table)
    }
}
