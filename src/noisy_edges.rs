//! Шумные границы регионов
//!
//! Постобработка для отрисовки: каждое ребро между двумя регионами суши получает
//! ломаную из четырёх промежуточных точек, смещённых поперёк ребра (вдоль
//! направления от центра одного региона к центру другого). На границе биомов
//! смещение сильнее, внутри одного биома слабее.
//!
//! Топология графа не меняется; потребитель, которому нужны прямые границы,
//! может эту стадию пропустить.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::graph::{Edge, MapGraph, Point};
use crate::rng::{MapRng, Stage};

/// Число промежуточных точек на ребре
pub const SUBDIVISIONS: usize = 4;

/// Амплитуда смещения на границе двух биомов
pub const BIOME_BOUNDARY_AMPLITUDE: f64 = 0.2;

/// Амплитуда смещения внутри одного биома
pub const INNER_AMPLITUDE: f64 = 0.1;

/// Ломаные рёбер, индексированные номером ребра
#[derive(Debug, Clone, Default)]
pub struct NoisyEdges {
    paths: Vec<Option<Vec<Point>>>,
}

impl NoisyEdges {
    /// Промежуточные точки ребра в направлении `v0 → v1`
    #[must_use]
    pub fn path(&self, edge: usize) -> Option<&[Point]> {
        self.paths.get(edge)?.as_deref()
    }

    /// Количество рёбер с шумом
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.iter().filter(|p| p.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Контур региона: углы по порядку, между соседними углами: точки шумного
    /// ребра (в обратном порядке, если ребро проходится от `v1` к `v0`).
    #[must_use]
    pub fn region_outline(&self, graph: &MapGraph, region: usize) -> Vec<Point> {
        let region = &graph.regions[region];
        let corners = &region.corners;
        let mut outline = Vec::with_capacity(corners.len() * (SUBDIVISIONS + 1));

        for (i, &a) in corners.iter().enumerate() {
            let b = corners[(i + 1) % corners.len()];
            outline.push(graph.corners[a].point);

            let shared = region.borders.iter().map(|&e| &graph.edges[e]).find(|e| {
                matches!(e.corners(), Some((v0, v1)) if (v0 == a && v1 == b) || (v0 == b && v1 == a))
            });
            let Some(edge) = shared else { continue };
            let Some(path) = self.path(edge.index) else { continue };

            if edge.v0 == Some(a) {
                outline.extend_from_slice(path);
            } else {
                outline.extend(path.iter().rev());
            }
        }

        outline
    }
}

fn perturb_edge(graph: &MapGraph, edge: &Edge, seed: u64) -> Option<Vec<Point>> {
    let (d0, d1) = edge.regions()?;
    let (v0, v1) = edge.corners()?;
    if v0 == v1 {
        return None;
    }
    let (r0, r1) = (&graph.regions[d0], &graph.regions[d1]);
    if r0.is_water || r1.is_water {
        return None;
    }

    let amplitude = if r0.biome == r1.biome {
        INNER_AMPLITUDE
    } else {
        BIOME_BOUNDARY_AMPLITUDE
    };
    let across = Point::new(r1.point.x - r0.point.x, r1.point.y - r0.point.y);
    let (p0, p1) = (graph.corners[v0].point, graph.corners[v1].point);

    // у каждого ребра свой поток: результат не зависит от порядка обхода
    let edge_seed = seed ^ (edge.index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut rng = MapRng::for_stage(edge_seed, Stage::Edges);

    let points = (1..=SUBDIVISIONS)
        .map(|i| {
            let base = p0.lerp(p1, i as f64 / (SUBDIVISIONS + 1) as f64);
            let offset = rng.range(-1.0, 1.0) * amplitude;
            Point::new(base.x + across.x * offset, base.y + across.y * offset)
        })
        .collect();
    Some(points)
}

/// Строит шумные рёбра для всех внутренних рёбер суши
#[must_use]
pub fn build_noisy_edges(graph: &MapGraph, seed: u64) -> NoisyEdges {
    #[cfg(feature = "parallel")]
    let paths: Vec<Option<Vec<Point>>> = graph
        .edges
        .par_iter()
        .map(|edge| perturb_edge(graph, edge, seed))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let paths: Vec<Option<Vec<Point>>> = graph
        .edges
        .iter()
        .map(|edge| perturb_edge(graph, edge, seed))
        .collect();

    let noisy = NoisyEdges { paths };
    debug!(edges = noisy.len(), "noisy edges built");
    noisy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::graph::build_graph;
    use crate::terrain::assign_terrain;

    fn terrain() -> MapGraph {
        let config = MapConfig {
            seed: 8,
            num_points: 400,
            ..MapConfig::default()
        };
        let mut graph = build_graph(config.num_points, config.width, config.height, config.seed).unwrap();
        assign_terrain(&mut graph, &config);
        graph
    }

    #[test]
    fn only_land_edges_are_perturbed() {
        let graph = terrain();
        let noisy = build_noisy_edges(&graph, 8);
        assert!(!noisy.is_empty());
        for edge in &graph.edges {
            let Some(path) = noisy.path(edge.index) else { continue };
            assert_eq!(path.len(), SUBDIVISIONS);
            let (d0, d1) = edge.regions().unwrap();
            assert!(graph.regions[d0].is_land() && graph.regions[d1].is_land());
        }
    }

    #[test]
    fn displacement_stays_within_amplitude() {
        let graph = terrain();
        let noisy = build_noisy_edges(&graph, 8);
        for edge in &graph.edges {
            let Some(path) = noisy.path(edge.index) else { continue };
            let (d0, d1) = edge.regions().unwrap();
            let (v0, v1) = edge.corners().unwrap();
            let span = graph.regions[d0].point.distance(graph.regions[d1].point);
            for (i, p) in path.iter().enumerate() {
                let t = (i + 1) as f64 / (SUBDIVISIONS + 1) as f64;
                let base = graph.corners[v0].point.lerp(graph.corners[v1].point, t);
                assert!(base.distance(*p) <= BIOME_BOUNDARY_AMPLITUDE * span + 1e-9);
            }
        }
    }

    #[test]
    fn deterministic_for_the_same_seed() {
        let graph = terrain();
        let a = build_noisy_edges(&graph, 8);
        let b = build_noisy_edges(&graph, 8);
        for edge in &graph.edges {
            assert_eq!(a.path(edge.index), b.path(edge.index));
        }
    }

    #[test]
    fn outline_contains_every_corner_in_order() {
        let graph = terrain();
        let noisy = build_noisy_edges(&graph, 8);
        let region = graph
            .regions
            .iter()
            .find(|r| {
                r.is_land()
                    && !r.is_border
                    && r.neighbors.iter().all(|&n| graph.regions[n].is_land())
            })
            .unwrap();
        let outline = noisy.region_outline(&graph, region.index);
        assert_eq!(outline.len(), region.corners.len() * (SUBDIVISIONS + 1));

        let corner_points: Vec<Point> = outline.iter().step_by(SUBDIVISIONS + 1).copied().collect();
        assert_eq!(corner_points, graph.polygon(region.index));
    }
}
