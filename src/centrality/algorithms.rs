use std::collections::{HashMap, VecDeque};

use anyhow::anyhow;
use petgraph::graphmap::DiGraphMap;

use crate::geograph::primitives::{EdgeGraph, NodeIdx};

/// Directed edge graph whose weights hold the parallel edges between two nodes.
pub type DiEdgeGraph<E> = EdgeGraph<E, petgraph::Directed>;

/// Dense numbering of the graph nodes in insertion order.
struct DenseNodes {
    ids: Vec<NodeIdx>,
    position: HashMap<NodeIdx, usize>,
}

impl DenseNodes {
    fn of<E: Default>(graph: &DiEdgeGraph<E>) -> Self {
        let ids: Vec<NodeIdx> = graph.nodes().collect();
        let position = ids.iter().enumerate().map(|(pos, id)| (*id, pos)).collect();
        Self { ids, position }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn to_map(&self, values: Vec<f64>) -> HashMap<NodeIdx, f64> {
        self.ids.iter().copied().zip(values).collect()
    }
}

/// PageRank by power iteration. Every parallel edge is a separate link, mass of nodes without out links is
/// spread uniformly over all nodes.
pub fn pagerank<E: Default>(
    graph: &DiEdgeGraph<E>,
    damping: f64,
    max_iterations: usize,
    tolerance: f64,
) -> anyhow::Result<HashMap<NodeIdx, f64>> {
    let nodes = DenseNodes::of(graph);
    let n = nodes.len();
    if n == 0 {
        return Ok(HashMap::new());
    }

    let mut out_links: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    let mut out_weight = vec![0.0; n];
    for (u, v, par_edges) in graph.all_edges() {
        let source = nodes.position[&u];
        let multiplicity = par_edges.len() as f64;
        out_links[source].push((nodes.position[&v], multiplicity));
        out_weight[source] += multiplicity;
    }
    let dangling: Vec<usize> = (0..n).filter(|pos| out_weight[*pos] == 0.0).collect();

    let uniform = 1.0 / n as f64;
    let mut ranks = vec![uniform; n];
    for _ in 0..max_iterations {
        let dangling_mass = damping * dangling.iter().map(|pos| ranks[*pos]).sum::<f64>();
        let mut next = vec![(1.0 - damping + dangling_mass) * uniform; n];
        for (source, links) in out_links.iter().enumerate() {
            for (target, multiplicity) in links {
                next[*target] += damping * ranks[source] * multiplicity / out_weight[source];
            }
        }
        let change: f64 = next.iter().zip(&ranks).map(|(a, b)| (a - b).abs()).sum();
        ranks = next;
        if change < n as f64 * tolerance {
            return Ok(nodes.to_map(ranks));
        }
    }
    Err(anyhow!(
        "PageRank did not converge within {} iterations",
        max_iterations
    ))
}

/// Sum of in and out degree, parallel edges counted individually, divided by `n - 1`.
pub fn degree_centrality<E: Default>(graph: &DiEdgeGraph<E>) -> HashMap<NodeIdx, f64> {
    let nodes = DenseNodes::of(graph);
    let n = nodes.len();
    if n <= 1 {
        return nodes.to_map(vec![1.0; n]);
    }
    let mut degree = vec![0.0; n];
    for (u, v, par_edges) in graph.all_edges() {
        degree[nodes.position[&u]] += par_edges.len() as f64;
        degree[nodes.position[&v]] += par_edges.len() as f64;
    }
    let scale = 1.0 / (n - 1) as f64;
    nodes.to_map(degree.into_iter().map(|d| d * scale).collect())
}

/// Closeness from hop distances towards each node, scaled by the reachable share of the graph
/// (Wasserman and Faust) so that nodes reached from few others do not score high.
pub fn closeness_centrality<E: Default>(graph: &DiEdgeGraph<E>) -> HashMap<NodeIdx, f64> {
    let nodes = DenseNodes::of(graph);
    let n = nodes.len();
    let mut reversed: DiGraphMap<NodeIdx, ()> = DiGraphMap::new();
    for id in &nodes.ids {
        reversed.add_node(*id);
    }
    for (u, v, _) in graph.all_edges() {
        reversed.add_edge(v, u, ());
    }

    let closeness = nodes
        .ids
        .iter()
        .map(|id| {
            let distances = petgraph::algo::dijkstra(&reversed, *id, None, |_| 1usize);
            let total: usize = distances.values().sum();
            let reachable = (distances.len() - 1) as f64;
            if total > 0 && n > 1 {
                (reachable / total as f64) * (reachable / (n - 1) as f64)
            } else {
                0.0
            }
        })
        .collect();
    nodes.to_map(closeness)
}

/// Brandes betweenness over hop distances. Parallel edges do not multiply shortest paths.
pub fn betweenness_centrality<E: Default>(graph: &DiEdgeGraph<E>) -> HashMap<NodeIdx, f64> {
    let nodes = DenseNodes::of(graph);
    let n = nodes.len();
    let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (u, v, _) in graph.all_edges() {
        neighbours[nodes.position[&u]].push(nodes.position[&v]);
    }

    let mut betweenness = vec![0.0; n];
    for source in 0..n {
        let mut stack = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut path_counts = vec![0.0; n];
        let mut distance: Vec<Option<usize>> = vec![None; n];
        path_counts[source] = 1.0;
        distance[source] = Some(0);

        let mut queue = VecDeque::from([source]);
        while let Some(current) = queue.pop_front() {
            stack.push(current);
            let current_distance = distance[current].unwrap_or_default();
            for &next in &neighbours[current] {
                if distance[next].is_none() {
                    distance[next] = Some(current_distance + 1);
                    queue.push_back(next);
                }
                if distance[next] == Some(current_distance + 1) {
                    path_counts[next] += path_counts[current];
                    predecessors[next].push(current);
                }
            }
        }

        let mut dependency = vec![0.0; n];
        while let Some(target) = stack.pop() {
            for &pred in &predecessors[target] {
                dependency[pred] +=
                    path_counts[pred] / path_counts[target] * (1.0 + dependency[target]);
            }
            if target != source {
                betweenness[target] += dependency[target];
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
        betweenness.iter_mut().for_each(|b| *b *= scale);
    }
    nodes.to_map(betweenness)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::{
        betweenness_centrality, closeness_centrality, degree_centrality, pagerank, DiEdgeGraph,
    };
    use crate::geograph::primitives::GeoEdge;

    /// Directed graph with one (empty) geometry per listed edge.
    fn graph(edges: &[(i64, i64)]) -> DiEdgeGraph<()> {
        let mut graph = DiEdgeGraph::new();
        for (u, v) in edges {
            let edge = GeoEdge::new_with_data(geo::LineString::new(vec![]), ());
            if let Some(par_edges) = graph.edge_weight_mut(*u, *v) {
                par_edges.push(edge);
            } else {
                graph.add_edge(*u, *v, vec![edge]);
            }
        }
        graph
    }

    #[test]
    fn test_pagerank_cycle_is_uniform() {
        let ranks = pagerank(&graph(&[(1, 2), (2, 3), (3, 1)]), 0.85, 100, 1e-6).unwrap();
        for node in [1, 2, 3] {
            assert_abs_diff_eq!(ranks[&node], 1.0 / 3.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_pagerank_sums_to_one_with_dangling_node() {
        let ranks = pagerank(&graph(&[(1, 2), (1, 3), (2, 3)]), 0.85, 100, 1e-6).unwrap();
        assert_abs_diff_eq!(ranks.values().sum::<f64>(), 1.0, epsilon = 1e-6);
        assert!(ranks[&3] > ranks[&2]);
        assert!(ranks[&2] > ranks[&1]);
    }

    #[test]
    fn test_pagerank_fails_without_convergence() {
        assert!(pagerank(&graph(&[(1, 2), (2, 1), (2, 3)]), 0.85, 1, 1e-12).is_err());
    }

    #[test]
    fn test_degree_counts_parallel_edges() {
        let degrees = degree_centrality(&graph(&[(1, 2), (1, 2), (2, 3)]));
        assert_abs_diff_eq!(degrees[&1], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(degrees[&2], 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(degrees[&3], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_closeness_on_directed_path() {
        // 1 -> 2 -> 3: node 3 is reached from both others.
        let closeness = closeness_centrality(&graph(&[(1, 2), (2, 3)]));
        assert_abs_diff_eq!(closeness[&1], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(closeness[&2], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(closeness[&3], 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_betweenness_on_directed_path() {
        let betweenness = betweenness_centrality(&graph(&[(1, 2), (2, 3)]));
        assert_abs_diff_eq!(betweenness[&1], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(betweenness[&2], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(betweenness[&3], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_betweenness_splits_between_equal_paths() {
        // Two shortest paths from 1 to 4, through 2 and through 3.
        let betweenness = betweenness_centrality(&graph(&[(1, 2), (1, 3), (2, 4), (3, 4)]));
        assert_abs_diff_eq!(betweenness[&2], 0.5 / 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(betweenness[&3], 0.5 / 6.0, epsilon = 1e-12);
    }
}
