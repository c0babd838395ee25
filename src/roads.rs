//! Дорожная сеть между поселениями
//!
//! 1. **Каркас**: минимальное остовное дерево (Прим, O(n²)) по центрам поселений.
//!    Сеть с двумя и более поселениями всегда связна.
//! 2. **Петли**: пары вне дерева по возрастанию расстояния, каждая принимается с
//!    вероятностью [`EXTRA_ROAD_CHANCE`], но не больше
//!    `floor(EXTRA_ROAD_FRACTION × рёбер дерева)`.
//! 3. **Трассировка**: A* по графу соседства регионов. Стоимость шага растёт с
//!    высотой региона назначения; океан непроходим, озёра тоже, кроме начального
//!    и конечного региона. Не нашли путь: прямая линия с флагом `straight_line`.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::{astar, connected_components};
use petgraph::graph::{DiGraph, NodeIndex, UnGraph};
use petgraph::visit::{EdgeFiltered, EdgeRef};
use serde::Serialize;
use tracing::{debug, warn};

use crate::graph::{MapGraph, Point};
use crate::map::MapData;
use crate::rng::{MapRng, Stage};
use crate::settlement::Settlement;

/// Вероятность принять дополнительную дорогу
pub const EXTRA_ROAD_CHANCE: f64 = 0.6;

/// Доля дополнительных дорог от числа рёбер остовного дерева
pub const EXTRA_ROAD_FRACTION: f64 = 0.3;

/// Множитель штрафа за высоту
pub const ELEVATION_PENALTY: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadKind {
    /// Ребро остовного дерева
    Trunk,
    /// Дополнительная петля
    Branch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoadSegment {
    /// Идентификатор поселения-начала
    pub from: u32,
    /// Идентификатор поселения-конца
    pub to: u32,
    /// Регионы маршрута; пусто для прямой линии
    pub regions: Vec<usize>,
    /// Ломаная через центры регионов
    pub path: Vec<Point>,
    pub length: f64,
    pub kind: RoadKind,
    pub straight_line: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoadNetwork {
    pub roads: Vec<RoadSegment>,
    /// Соседи каждого поселения по дорогам (включая поселения без дорог)
    pub adjacency: BTreeMap<u32, Vec<u32>>,
}

impl RoadNetwork {
    /// Связна ли сеть. Пустая сеть и сеть из одного поселения связны.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        if self.adjacency.len() < 2 {
            return true;
        }
        let mut graph: UnGraph<u32, ()> = UnGraph::new_undirected();
        let nodes: BTreeMap<u32, NodeIndex> = self
            .adjacency
            .keys()
            .map(|&id| (id, graph.add_node(id)))
            .collect();
        for (id, neighbors) in &self.adjacency {
            for n in neighbors {
                if id < n {
                    graph.add_edge(nodes[id], nodes[n], ());
                }
            }
        }
        connected_components(&graph) == 1
    }

    /// Суммарная длина дорог
    #[must_use]
    pub fn total_length(&self) -> f64 {
        self.roads.iter().map(|r| r.length).sum()
    }
}

/// Остовное дерево Прима: пары индексов `(родитель, потомок)` в порядке добавления
fn minimum_spanning_tree(points: &[Point]) -> Vec<(usize, usize)> {
    let n = points.len();
    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut parent = vec![0usize; n];
    let mut tree = Vec::with_capacity(n.saturating_sub(1));

    best[0] = 0.0;
    for _ in 0..n {
        let mut next = None;
        for v in 0..n {
            if !in_tree[v] && next.is_none_or(|u: usize| best[v] < best[u]) {
                next = Some(v);
            }
        }
        let Some(u) = next else { break };
        in_tree[u] = true;
        if u != 0 {
            tree.push((parent[u], u));
        }
        for v in 0..n {
            let d = points[u].distance(points[v]);
            if !in_tree[v] && d < best[v] {
                best[v] = d;
                parent[v] = u;
            }
        }
    }
    tree
}

/// Дополнительные пары вне дерева
fn extra_pairs(points: &[Point], tree: &[(usize, usize)], rng: &mut MapRng) -> Vec<(usize, usize)> {
    let limit = (EXTRA_ROAD_FRACTION * tree.len() as f64).floor() as usize;
    if limit == 0 {
        return Vec::new();
    }

    let in_tree: BTreeSet<(usize, usize)> = tree.iter().map(|&(a, b)| (a.min(b), a.max(b))).collect();
    let mut pairs: Vec<(f64, usize, usize)> = Vec::new();
    for i in 0..points.len() {
        for j in i + 1..points.len() {
            if !in_tree.contains(&(i, j)) {
                pairs.push((points[i].distance(points[j]), i, j));
            }
        }
    }
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut extra = Vec::with_capacity(limit);
    for (_, i, j) in pairs {
        if extra.len() >= limit {
            break;
        }
        if rng.chance(EXTRA_ROAD_CHANCE) {
            extra.push((i, j));
        }
    }
    extra
}

/// Ориентированный граф соседства регионов со стоимостью шага
fn travel_graph(graph: &MapGraph) -> DiGraph<usize, f64> {
    let mut travel = DiGraph::with_capacity(graph.regions.len(), graph.edges.len() * 2);
    for region in &graph.regions {
        travel.add_node(region.index);
    }
    for region in &graph.regions {
        for &n in &region.neighbors {
            let target = &graph.regions[n];
            let cost = region.point.distance(target.point) * (1.0 + ELEVATION_PENALTY * target.elevation);
            travel.add_edge(NodeIndex::new(region.index), NodeIndex::new(n), cost);
        }
    }
    travel
}

/// Маршрут между двумя регионами или `None`, если его нет
fn trace(graph: &MapGraph, travel: &DiGraph<usize, f64>, start: usize, goal: usize) -> Option<Vec<usize>> {
    let passable = |r: usize| {
        let region = &graph.regions[r];
        !region.is_ocean && (!region.is_water || r == start || r == goal)
    };
    let filtered = EdgeFiltered::from_fn(travel, |e| {
        passable(e.source().index()) && passable(e.target().index())
    });
    let target = graph.regions[goal].point;

    let (_, path) = astar(
        &filtered,
        NodeIndex::new(start),
        |n| n.index() == goal,
        |e| *e.weight(),
        |n| graph.regions[n.index()].point.distance(target),
    )?;
    Some(path.into_iter().map(NodeIndex::index).collect())
}

fn polyline_length(path: &[Point]) -> f64 {
    path.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Строит дорожную сеть между поселениями.
///
/// Меньше двух поселений: пустая сеть. Результат полностью определяется
/// поселениями, картой и сидом.
#[must_use]
pub fn build_roads(settlements: &[Settlement], map: &MapData, seed: u64) -> RoadNetwork {
    let mut adjacency: BTreeMap<u32, Vec<u32>> =
        settlements.iter().map(|s| (s.id, Vec::new())).collect();
    if settlements.len() < 2 {
        return RoadNetwork {
            roads: Vec::new(),
            adjacency,
        };
    }

    let graph = map.graph();
    let points: Vec<Point> = settlements.iter().map(|s| s.point).collect();
    let tree = minimum_spanning_tree(&points);
    let mut rng = MapRng::for_stage(seed, Stage::Roads);
    let extra = extra_pairs(&points, &tree, &mut rng);

    let travel = travel_graph(graph);
    let pairs = tree
        .iter()
        .map(|&p| (p, RoadKind::Trunk))
        .chain(extra.iter().map(|&p| (p, RoadKind::Branch)));

    let mut roads = Vec::with_capacity(tree.len() + extra.len());
    for ((a, b), kind) in pairs {
        let (from, to) = (&settlements[a], &settlements[b]);
        let road = match trace(graph, &travel, from.region, to.region) {
            Some(regions) => {
                let path: Vec<Point> = regions.iter().map(|&r| graph.regions[r].point).collect();
                RoadSegment {
                    from: from.id,
                    to: to.id,
                    length: polyline_length(&path),
                    regions,
                    path,
                    kind,
                    straight_line: false,
                }
            }
            None => {
                warn!(from = %from.name, to = %to.name, "no land route, using straight line");
                RoadSegment {
                    from: from.id,
                    to: to.id,
                    regions: Vec::new(),
                    path: vec![from.point, to.point],
                    length: from.point.distance(to.point),
                    kind,
                    straight_line: true,
                }
            }
        };

        if let Some(list) = adjacency.get_mut(&from.id) {
            list.push(to.id);
        }
        if let Some(list) = adjacency.get_mut(&to.id) {
            list.push(from.id);
        }
        roads.push(road);
    }

    for list in adjacency.values_mut() {
        list.sort_unstable();
        list.dedup();
    }

    let network = RoadNetwork { roads, adjacency };
    debug!(
        roads = network.roads.len(),
        trunk = tree.len(),
        branches = extra.len(),
        length = network.total_length(),
        "roads built"
    );
    network
}
