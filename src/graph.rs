//! Построение планарного двойственного графа карты
//!
//! Граф хранится в одной арене ([`MapGraph`]): три плоских вектора: регионы,
//! углы и рёбра. Все связи между сущностями: индексы в эти векторы,
//! необязательные связи: `Option<usize>`.
//!
//! ## Алгоритм
//!
//! 1. **Точки**: `N` равномерно распределённых точек, два шага релаксации Ллойда
//!    (центроиды обрезанных ячеек Вороного) через `voronoice`.
//! 2. **Триангуляция Делоне** релаксированных точек (её строит `voronoice`
//!    поверх `delaunator`).
//! 3. **Углы**: центры описанных окружностей треугольников, прижатые к прямоугольнику
//!    карты. Почти совпадающие центры (ближе [`CORNER_MERGE_TOLERANCE`]) сливаются
//!    в один угол: триангуляция не гарантирует точного совпадения.
//! 4. **Связность** по полурёбрам: каждое ребро Делоне записывается один раз,
//!    полуребро выпуклой оболочки даёт ребро без второго угла (`v1 = None`).
//! 5. **Сортировка** углов каждого региона по полярному углу вокруг центра,
//!    чтобы список углов образовывал простой многоугольник.

use std::collections::HashMap;

use delaunator::{EMPTY, next_halfedge};
use serde::Serialize;
use tracing::debug;
use voronoice::{BoundingBox, VoronoiBuilder};

use crate::biome::Biome;
use crate::error::MapGenError;
use crate::rng::{MapRng, Stage};

/// Число итераций релаксации Ллойда
pub const LLOYD_ITERATIONS: usize = 2;

/// Центры описанных окружностей ближе этого расстояния считаются одним углом
pub const CORNER_MERGE_TOLERANCE: f64 = 0.1;

/// Угол ближе этого расстояния к краю карты считается граничным
pub const BORDER_TOLERANCE: f64 = 1.0;

/// Точка на плоскости карты
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Линейная интерполяция: `t = 0` → `self`, `t = 1` → `other`
    #[must_use]
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

/// Регион: ячейка Вороного, «клетка» карты
#[derive(Debug, Clone, Serialize)]
pub struct Region {
    pub index: usize,
    /// Порождающая точка (центр региона)
    pub point: Point,
    pub is_ocean: bool,
    pub is_water: bool,
    pub is_coast: bool,
    pub is_border: bool,
    pub elevation: f64,
    pub moisture: f64,
    pub biome: Biome,
    /// Углы, отсортированные по полярному углу вокруг `point`
    pub corners: Vec<usize>,
    /// Рёбра-границы
    pub borders: Vec<usize>,
    /// Соседние регионы
    pub neighbors: Vec<usize>,
}

impl Region {
    #[must_use]
    pub fn is_land(&self) -> bool {
        !self.is_water
    }
}

/// Угол: вершина многоугольников (центр описанной окружности треугольника)
#[derive(Debug, Clone, Serialize)]
pub struct Corner {
    pub index: usize,
    pub point: Point,
    pub is_ocean: bool,
    pub is_water: bool,
    pub is_coast: bool,
    pub is_border: bool,
    pub elevation: f64,
    pub moisture: f64,
    /// Объём реки через угол (0: реки нет)
    pub river: u32,
    /// Соседний угол, куда стекает вода; `None`: локальный минимум
    pub downslope: Option<usize>,
    /// Регионы, которых касается угол
    pub touches: Vec<usize>,
    /// Рёбра, выходящие из угла
    pub protrudes: Vec<usize>,
    /// Смежные углы
    pub adjacent: Vec<usize>,
}

/// Ребро между двумя регионами (`d0`, `d1`) с концами в двух углах (`v0`, `v1`)
#[derive(Debug, Clone, Serialize)]
pub struct Edge {
    pub index: usize,
    pub d0: Option<usize>,
    pub d1: Option<usize>,
    pub v0: Option<usize>,
    /// Отсутствует у полуребра выпуклой оболочки
    pub v1: Option<usize>,
    pub midpoint: Point,
    /// Объём реки вдоль ребра (0: реки нет)
    pub river: u32,
}

impl Edge {
    /// Оба угла ребра, если они есть
    #[must_use]
    pub fn corners(&self) -> Option<(usize, usize)> {
        Some((self.v0?, self.v1?))
    }

    /// Оба региона ребра, если они есть
    #[must_use]
    pub fn regions(&self) -> Option<(usize, usize)> {
        Some((self.d0?, self.d1?))
    }
}

/// Арена графа карты: владеет всеми регионами, углами и рёбрами одного прогона
#[derive(Debug, Clone, Serialize)]
pub struct MapGraph {
    pub width: f64,
    pub height: f64,
    pub regions: Vec<Region>,
    pub corners: Vec<Corner>,
    pub edges: Vec<Edge>,
}

impl MapGraph {
    /// Ребро, соединяющее два угла
    #[must_use]
    pub fn edge_between_corners(&self, a: usize, b: usize) -> Option<usize> {
        self.corners[a].protrudes.iter().copied().find(|&e| {
            matches!(self.edges[e].corners(), Some((v0, v1)) if (v0 == a && v1 == b) || (v0 == b && v1 == a))
        })
    }

    /// Ребро, разделяющее два региона
    #[must_use]
    pub fn edge_between_regions(&self, a: usize, b: usize) -> Option<usize> {
        self.regions[a].borders.iter().copied().find(|&e| {
            matches!(self.edges[e].regions(), Some((d0, d1)) if (d0 == a && d1 == b) || (d0 == b && d1 == a))
        })
    }

    /// Вершины многоугольника региона в порядке обхода (без шума)
    #[must_use]
    pub fn polygon(&self, region: usize) -> Vec<Point> {
        self.regions[region]
            .corners
            .iter()
            .map(|&c| self.corners[c].point)
            .collect()
    }

    fn is_near_border(&self, p: Point) -> bool {
        p.x <= BORDER_TOLERANCE
            || p.y <= BORDER_TOLERANCE
            || p.x >= self.width - BORDER_TOLERANCE
            || p.y >= self.height - BORDER_TOLERANCE
    }
}

/// Строит граф из `num_points` случайных точек в прямоугольнике `width × height`
///
/// # Ошибки
/// - [`MapGenError::TooFewPoints`] при `num_points < 3`
/// - [`MapGenError::InvalidDimensions`] при неположительных размерах
/// - [`MapGenError::Triangulation`], если триангуляция не построилась
pub fn build_graph(
    num_points: usize,
    width: f64,
    height: f64,
    seed: u64,
) -> Result<MapGraph, MapGenError> {
    if num_points < 3 {
        return Err(MapGenError::TooFewPoints(num_points));
    }
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(MapGenError::InvalidDimensions { width, height });
    }

    let mut rng = MapRng::for_stage(seed, Stage::Graph);
    let sites: Vec<voronoice::Point> = (0..num_points)
        .map(|_| voronoice::Point {
            x: rng.range(0.0, width),
            y: rng.range(0.0, height),
        })
        .collect();

    let voronoi = VoronoiBuilder::default()
        .set_sites(sites)
        .set_bounding_box(BoundingBox::new(
            voronoice::Point {
                x: width / 2.0,
                y: height / 2.0,
            },
            width,
            height,
        ))
        .set_lloyd_relaxation_iterations(LLOYD_ITERATIONS)
        .build()
        .ok_or(MapGenError::Triangulation(num_points))?;

    let points: Vec<Point> = voronoi
        .sites()
        .iter()
        .map(|s| Point::new(s.x.clamp(0.0, width), s.y.clamp(0.0, height)))
        .collect();
    let triangulation = voronoi.triangulation();
    if triangulation.triangles.is_empty() {
        return Err(MapGenError::Triangulation(num_points));
    }

    let mut graph = MapGraph {
        width,
        height,
        regions: points
            .iter()
            .enumerate()
            .map(|(index, &point)| Region {
                index,
                point,
                is_ocean: false,
                is_water: false,
                is_coast: false,
                is_border: false,
                elevation: 0.0,
                moisture: 0.0,
                biome: Biome::Ocean,
                corners: Vec::new(),
                borders: Vec::new(),
                neighbors: Vec::new(),
            })
            .collect(),
        corners: Vec::new(),
        edges: Vec::new(),
    };

    // === 1. Углы: центры описанных окружностей с дедупликацией ===
    let triangles = &triangulation.triangles;
    let mut interner = CornerInterner::default();
    let mut triangle_corner = Vec::with_capacity(triangles.len() / 3);

    for t in 0..triangles.len() / 3 {
        let [a, b, c] = [triangles[3 * t], triangles[3 * t + 1], triangles[3 * t + 2]];
        let center = circumcenter(points[a], points[b], points[c]);
        let center = Point::new(center.x.clamp(0.0, width), center.y.clamp(0.0, height));
        let corner = interner.intern(&mut graph.corners, center);
        triangle_corner.push(corner);

        for region in [a, b, c] {
            push_unique(&mut graph.corners[corner].touches, region);
            push_unique(&mut graph.regions[region].corners, corner);
        }
    }

    // === 2. Рёбра по полурёбрам ===
    for e in 0..triangles.len() {
        let opposite = triangulation.halfedges[e];
        if opposite != EMPTY && opposite < e {
            continue; // уже записано с противоположной стороны
        }

        let d0 = triangles[e];
        let d1 = triangles[next_halfedge(e)];
        let v0 = triangle_corner[e / 3];
        let v1 = (opposite != EMPTY).then(|| triangle_corner[opposite / 3]);

        let midpoint = match v1 {
            Some(v1) => graph.corners[v0].point.lerp(graph.corners[v1].point, 0.5),
            None => points[d0].lerp(points[d1], 0.5),
        };

        let index = graph.edges.len();
        graph.edges.push(Edge {
            index,
            d0: Some(d0),
            d1: Some(d1),
            v0: Some(v0),
            v1,
            midpoint,
            river: 0,
        });

        graph.regions[d0].borders.push(index);
        graph.regions[d1].borders.push(index);
        push_unique(&mut graph.regions[d0].neighbors, d1);
        push_unique(&mut graph.regions[d1].neighbors, d0);

        graph.corners[v0].protrudes.push(index);
        if let Some(v1) = v1
            && v1 != v0
        {
            graph.corners[v1].protrudes.push(index);
            push_unique(&mut graph.corners[v0].adjacent, v1);
            push_unique(&mut graph.corners[v1].adjacent, v0);
        }
    }

    // === 3. Граничные флаги ===
    for i in 0..graph.corners.len() {
        let border = graph.is_near_border(graph.corners[i].point);
        graph.corners[i].is_border = border;
    }
    for &hull_region in &triangulation.hull {
        graph.regions[hull_region].is_border = true;
    }
    for region in &mut graph.regions {
        if region.corners.iter().any(|&c| graph.corners[c].is_border) {
            region.is_border = true;
        }
    }

    // === 4. Полярная сортировка углов ===
    for region in &mut graph.regions {
        let center = region.point;
        let corners = &graph.corners;
        region.corners.sort_by(|&a, &b| {
            let pa = corners[a].point;
            let pb = corners[b].point;
            let angle_a = (pa.y - center.y).atan2(pa.x - center.x);
            let angle_b = (pb.y - center.y).atan2(pb.x - center.x);
            angle_a.total_cmp(&angle_b).then(a.cmp(&b))
        });
    }

    debug!(
        regions = graph.regions.len(),
        corners = graph.corners.len(),
        edges = graph.edges.len(),
        "graph built"
    );

    Ok(graph)
}

/// Пространственный хеш для слияния почти совпадающих углов
#[derive(Default)]
struct CornerInterner {
    buckets: HashMap<(i64, i64), Vec<usize>>,
}

impl CornerInterner {
    fn key(p: Point) -> (i64, i64) {
        (
            (p.x / CORNER_MERGE_TOLERANCE).floor() as i64,
            (p.y / CORNER_MERGE_TOLERANCE).floor() as i64,
        )
    }

    fn intern(&mut self, corners: &mut Vec<Corner>, point: Point) -> usize {
        let (kx, ky) = Self::key(point);

        // наименьший индекс среди близких, чтобы результат не зависел от порядка бакетов
        let mut found: Option<usize> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(bucket) = self.buckets.get(&(kx + dx, ky + dy)) else {
                    continue;
                };
                for &c in bucket {
                    if corners[c].point.distance(point) <= CORNER_MERGE_TOLERANCE {
                        found = Some(found.map_or(c, |f| f.min(c)));
                    }
                }
            }
        }
        if let Some(c) = found {
            return c;
        }

        let index = corners.len();
        corners.push(Corner {
            index,
            point,
            is_ocean: false,
            is_water: false,
            is_coast: false,
            is_border: false,
            elevation: 0.0,
            moisture: 0.0,
            river: 0,
            downslope: None,
            touches: Vec::new(),
            protrudes: Vec::new(),
            adjacent: Vec::new(),
        });
        self.buckets.entry((kx, ky)).or_default().push(index);
        index
    }
}

/// Центр описанной окружности; для вырожденного треугольника: центроид
fn circumcenter(a: Point, b: Point, c: Point) -> Point {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < 1e-12 {
        return Point::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0);
    }
    let a2 = a.x * a.x + a.y * a.y;
    let b2 = b.x * b.x + b.y * b.y;
    let c2 = c.x * c.x + c.y * c.y;
    Point::new(
        (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
        (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
    )
}

fn push_unique(list: &mut Vec<usize>, value: usize) {
    if !list.contains(&value) {
        list.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_graph() -> MapGraph {
        build_graph(300, 400.0, 300.0, 7).unwrap()
    }

    #[test]
    fn rejects_degenerate_input() {
        assert_eq!(
            build_graph(2, 100.0, 100.0, 1).unwrap_err(),
            MapGenError::TooFewPoints(2)
        );
        assert!(matches!(
            build_graph(10, -1.0, 100.0, 1),
            Err(MapGenError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn circumcenter_is_equidistant() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(4.0, 0.0);
        let c = Point::new(0.0, 3.0);
        let center = circumcenter(a, b, c);
        assert!((center.distance(a) - center.distance(b)).abs() < 1e-9);
        assert!((center.distance(a) - center.distance(c)).abs() < 1e-9);
        assert!((center.x - 2.0).abs() < 1e-9 && (center.y - 1.5).abs() < 1e-9);
    }

    #[test]
    fn every_region_is_inside_bounds_and_connected() {
        let graph = small_graph();
        assert_eq!(graph.regions.len(), 300);
        for region in &graph.regions {
            assert!((0.0..=400.0).contains(&region.point.x));
            assert!((0.0..=300.0).contains(&region.point.y));
            assert!(!region.neighbors.is_empty());
            for &n in &region.neighbors {
                assert!(graph.regions[n].neighbors.contains(&region.index));
            }
        }
    }

    #[test]
    fn edges_reference_both_regions() {
        let graph = small_graph();
        for edge in &graph.edges {
            let (d0, d1) = edge.regions().expect("delaunay edge has two sides");
            assert_ne!(d0, d1);
            assert!(graph.regions[d0].neighbors.contains(&d1));
            assert!(edge.v0.is_some());
            if edge.v1.is_none() {
                // полуребро оболочки: оба региона на границе
                assert!(graph.regions[d0].is_border && graph.regions[d1].is_border);
            }
        }
    }

    #[test]
    fn corners_are_deduplicated() {
        let graph = small_graph();
        for (i, a) in graph.corners.iter().enumerate() {
            for b in &graph.corners[i + 1..] {
                assert!(a.point.distance(b.point) > CORNER_MERGE_TOLERANCE);
            }
        }
    }

    #[test]
    fn border_corners_lie_on_the_boundary() {
        let graph = small_graph();
        let border: Vec<&Corner> = graph.corners.iter().filter(|c| c.is_border).collect();
        assert!(!border.is_empty());
        for corner in border {
            let p = corner.point;
            let gap = p.x.min(p.y).min(400.0 - p.x).min(300.0 - p.y);
            assert!(gap <= BORDER_TOLERANCE + 1e-9);
        }
    }

    #[test]
    fn region_corners_are_sorted_by_angle() {
        let graph = small_graph();
        for region in &graph.regions {
            let angles: Vec<f64> = region
                .corners
                .iter()
                .map(|&c| {
                    let p = graph.corners[c].point;
                    (p.y - region.point.y).atan2(p.x - region.point.x)
                })
                .collect();
            assert!(angles.windows(2).all(|w| w[0] < w[1]), "region {}", region.index);
        }
    }

    /// Отрезки `ab` и `cd` пересекаются во внутренних точках
    fn segments_cross(a: Point, b: Point, c: Point, d: Point) -> bool {
        let orient = |p: Point, q: Point, r: Point| (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x);
        let eps = 1e-9;
        let (d1, d2) = (orient(a, b, c), orient(a, b, d));
        let (d3, d4) = (orient(c, d, a), orient(c, d, b));
        ((d1 > eps && d2 < -eps) || (d1 < -eps && d2 > eps)) && ((d3 > eps && d4 < -eps) || (d3 < -eps && d4 > eps))
    }

    #[test]
    fn region_polygons_do_not_self_intersect() {
        let graph = small_graph();
        for region in &graph.regions {
            let polygon = graph.polygon(region.index);
            let n = polygon.len();
            if n < 4 {
                continue;
            }
            for i in 0..n {
                for j in i + 2..n {
                    // первый и последний отрезки смежны через замыкание
                    if i == 0 && j == n - 1 {
                        continue;
                    }
                    let (a, b) = (polygon[i], polygon[(i + 1) % n]);
                    let (c, d) = (polygon[j], polygon[(j + 1) % n]);
                    assert!(!segments_cross(a, b, c, d), "region {} edges {i} and {j}", region.index);
                }
            }
        }
    }

    #[test]
    fn bowtie_is_detected_as_crossing() {
        let p = Point::new;
        assert!(segments_cross(p(0.0, 0.0), p(2.0, 2.0), p(0.0, 2.0), p(2.0, 0.0)));
        assert!(!segments_cross(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0), p(1.0, 1.0)));
    }

    #[test]
    fn same_seed_same_graph() {
        let a = small_graph();
        let b = small_graph();
        assert_eq!(a.corners.len(), b.corners.len());
        assert_eq!(a.edges.len(), b.edges.len());
        for (ra, rb) in a.regions.iter().zip(&b.regions) {
            assert_eq!(ra.point, rb.point);
            assert_eq!(ra.corners, rb.corners);
            assert_eq!(ra.neighbors, rb.neighbors);
        }
    }

    #[test]
    fn edge_lookup_helpers() {
        let graph = small_graph();
        let edge = graph
            .edges
            .iter()
            .find(|e| matches!(e.corners(), Some((a, b)) if a != b))
            .unwrap();
        let (v0, v1) = edge.corners().unwrap();
        assert_eq!(graph.edge_between_corners(v1, v0), Some(edge.index));
        let (d0, d1) = edge.regions().unwrap();
        assert_eq!(graph.edge_between_regions(d0, d1), Some(edge.index));
    }
}
