use std::collections::HashMap;

use anyhow::anyhow;

use crate::crs::crs_utils::{EpsgCode, WGS84};

/// Edge of a geospatial graph.
/// Parameters:
/// - `D`: type of associated data.
pub struct GeoEdge<D: Default> {
    pub geometry: geo::LineString,
    pub data: D,
}

impl<D: Default> GeoEdge<D> {
    /// Create new edge with given geometry and data.
    pub fn new_with_data(geometry: geo::LineString, data: D) -> Self {
        Self { geometry, data }
    }
}

/// Index type used for nodes of a geospatial graph. Road graphs use the OSM node id.
pub type NodeIdx = i64;

/// Node of a geospatial graph.
/// Parameters:
/// - `D`: type of associated data.
pub struct GeoNode<D: Default> {
    pub geometry: geo::Point,
    pub data: D,
}

impl<D: Default> GeoNode<D> {
    /// Create new node with given geometry and default data.
    pub fn new(geometry: geo::Point) -> Self {
        Self {
            geometry,
            data: D::default(),
        }
    }
}

/// Graph of geospatial edges. Parallel edges are supported because the edge weight is a vector of GeoEdge,
/// the position of an edge in that vector is its multigraph key.
/// Parameters:
/// - `E`: the data type associated with edges.
/// - `Ty`: whether the graph is directed or undirected, see petgraph documentation for details.
pub type EdgeGraph<E, Ty> = petgraph::graphmap::GraphMap<NodeIdx, Vec<GeoEdge<E>>, Ty>;

/// Map containing data associated with the nodes of a geospatial graph, indexed by node index.
/// Parameters:
/// - `N`: the data type associated with nodes.
pub type NodeMap<N> = HashMap<NodeIdx, GeoNode<N>>;

/// Geospatial graph. Edges are stored in a map-based graph, which is indexed by start and end node indices.
/// Data associated with nodes is stored in a map. The `crs` member is the EPSG code of the coordinates.
///
/// Parameters:
/// - `E`: the data type associated with edges.
/// - `N`: the data type associated with nodes.
/// - `Ty`: whether the graph is directed or undirected, see petgraph documentation for details.
pub struct GeoGraph<E: Default, N: Default, Ty: petgraph::EdgeType> {
    edge_graph: EdgeGraph<E, Ty>,
    node_map: NodeMap<N>,
    pub crs: EpsgCode,
}

impl<E: Default, N: Default, Ty: petgraph::EdgeType> GeoGraph<E, N, Ty> {
    /// Create an empty graph with WGS84 coordinates.
    pub fn new() -> Self {
        Self {
            edge_graph: EdgeGraph::new(),
            node_map: HashMap::new(),
            crs: WGS84,
        }
    }

    pub fn edge_graph(&self) -> &EdgeGraph<E, Ty> {
        &self.edge_graph
    }

    pub fn node_map(&self) -> &NodeMap<N> {
        &self.node_map
    }

    pub fn node_map_mut(&mut self) -> &mut NodeMap<N> {
        &mut self.node_map
    }

    /// Number of edges, counting parallel edges individually.
    pub fn edge_count(&self) -> usize {
        self.edge_graph
            .all_edges()
            .map(|(_, _, par_edges)| par_edges.len())
            .sum()
    }

    /// Insert an edge, creating its end nodes from the line endpoints if needed. Returns the multigraph key.
    pub fn insert_edge_with_data(
        &mut self,
        start_node_idx: NodeIdx,
        end_node_idx: NodeIdx,
        geometry: geo::LineString,
        data: E,
    ) -> anyhow::Result<usize> {
        if 2 > geometry.0.len() {
            return Err(anyhow!("Cannot insert edge with less than two points"));
        }
        let line_start_point = geometry.0[0];
        let line_end_point = geometry.0[geometry.0.len() - 1];

        self.insert_node(start_node_idx, line_start_point.into())?;
        self.insert_node(end_node_idx, line_end_point.into())?;

        if let Some(edge_vec) = self
            .edge_graph
            .edge_weight_mut(start_node_idx, end_node_idx)
        {
            edge_vec.push(GeoEdge::new_with_data(geometry, data));
            Ok(edge_vec.len() - 1)
        } else {
            self.edge_graph.add_edge(
                start_node_idx,
                end_node_idx,
                vec![GeoEdge::new_with_data(geometry, data)],
            );
            Ok(0)
        }
    }

    pub fn insert_node(&mut self, idx: NodeIdx, geometry: geo::Point) -> anyhow::Result<()> {
        if let Some(node) = self.node_map.get(&idx) {
            if node.geometry != geometry {
                return Err(anyhow!(
                    "Node with the same index ({}) but different geometry already exists",
                    idx
                ));
            }
        } else {
            self.edge_graph.add_node(idx);
            self.node_map.insert(idx, GeoNode::new(geometry));
        }
        Ok(())
    }
}

impl<E: Default, N: Default, Ty: petgraph::EdgeType> Default for GeoGraph<E, N, Ty> {
    fn default() -> Self {
        Self::new()
    }
}

pub type DiGeoGraph<E, N> = GeoGraph<E, N, petgraph::Directed>;
