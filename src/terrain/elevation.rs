use std::collections::VecDeque;

use tracing::debug;

use crate::graph::MapGraph;

/// Прирост высоты за один шаг вглубь суши
pub const ELEVATION_STEP: f64 = 1.0;

/// Расстояние (в шагах BFS) от каждого угла до океана или побережья.
///
/// Многоисточниковый BFS по смежным углам: фронт: океанские и прибрежные углы
/// с нулём, остальные начинают с `+∞` и только понижаются. Недостижимые углы
/// остаются `+∞`.
#[must_use]
pub fn coast_distance(graph: &MapGraph) -> Vec<f64> {
    let mut distance = vec![f64::INFINITY; graph.corners.len()];
    let mut queue = VecDeque::new();

    for corner in &graph.corners {
        if corner.is_ocean || corner.is_coast {
            distance[corner.index] = 0.0;
            queue.push_back(corner.index);
        }
    }

    while let Some(q) = queue.pop_front() {
        let next = distance[q] + ELEVATION_STEP;
        for &r in &graph.corners[q].adjacent {
            if next < distance[r] {
                distance[r] = next;
                queue.push_back(r);
            }
        }
    }

    distance
}

/// Ранговая нормализация высот суши: `sqrt(rank / (count - 1))`.
///
/// Нелинейное перераспределение: низменности становятся площе, пики круче.
/// Равные значения сохраняют порядок индексов (стабильная сортировка).
/// Океанские углы получают 0.
pub fn redistribute_elevations(graph: &mut MapGraph) {
    let mut land: Vec<usize> = graph
        .corners
        .iter()
        .filter(|c| !c.is_ocean)
        .map(|c| c.index)
        .collect();
    land.sort_by(|&a, &b| graph.corners[a].elevation.total_cmp(&graph.corners[b].elevation));

    let last = land.len().saturating_sub(1);
    for (rank, &c) in land.iter().enumerate() {
        graph.corners[c].elevation = if last == 0 {
            0.0
        } else {
            (rank as f64 / last as f64).sqrt()
        };
    }

    for corner in &mut graph.corners {
        if corner.is_ocean {
            corner.elevation = 0.0;
        }
    }
}

/// Высота региона: среднее высот его углов
pub fn assign_region_elevations(graph: &mut MapGraph) {
    for region in &mut graph.regions {
        if region.corners.is_empty() {
            continue;
        }
        let sum: f64 = region
            .corners
            .iter()
            .map(|&c| graph.corners[c].elevation)
            .sum();
        region.elevation = sum / region.corners.len() as f64;
    }
}

/// Подстадия высот: BFS от побережья, ранговая нормализация, средние по регионам
pub fn assign_elevations(graph: &mut MapGraph) {
    let distance = coast_distance(graph);
    for (corner, d) in graph.corners.iter_mut().zip(distance) {
        corner.elevation = d;
    }
    let unreachable = graph
        .corners
        .iter()
        .filter(|c| c.elevation.is_infinite())
        .count();

    redistribute_elevations(graph);
    assign_region_elevations(graph);

    debug!(unreachable, "elevation assigned");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::graph::build_graph;
    use crate::terrain::water::assign_water;

    fn elevated() -> (MapGraph, Vec<f64>) {
        let config = MapConfig {
            seed: 21,
            num_points: 400,
            ..MapConfig::default()
        };
        let mut graph = build_graph(config.num_points, config.width, config.height, config.seed).unwrap();
        assign_water(&mut graph, &config);
        let distance = coast_distance(&graph);
        assign_elevations(&mut graph);
        (graph, distance)
    }

    #[test]
    fn elevations_are_normalized() {
        let (graph, _) = elevated();
        for corner in &graph.corners {
            assert!((0.0..=1.0).contains(&corner.elevation));
            if corner.is_ocean {
                assert!(corner.elevation.abs() < f64::EPSILON);
            }
        }
        let peak = graph
            .corners
            .iter()
            .map(|c| c.elevation)
            .fold(0.0, f64::max);
        assert!((peak - 1.0).abs() < 1e-12);
        for region in &graph.regions {
            assert!((0.0..=1.0).contains(&region.elevation));
        }
    }

    #[test]
    fn elevation_is_monotone_in_coast_distance() {
        let (graph, distance) = elevated();
        let land: Vec<usize> = graph
            .corners
            .iter()
            .filter(|c| !c.is_ocean)
            .map(|c| c.index)
            .collect();
        for &a in &land {
            for &b in &land {
                if distance[a] < distance[b] {
                    assert!(graph.corners[a].elevation <= graph.corners[b].elevation);
                }
            }
        }
    }

    #[test]
    fn single_land_corner_gets_zero() {
        let mut graph = build_graph(3, 10.0, 10.0, 1).unwrap();
        for corner in &mut graph.corners {
            corner.is_ocean = true;
        }
        graph.corners[0].is_ocean = false;
        graph.corners[0].elevation = 5.0;
        redistribute_elevations(&mut graph);
        assert!(graph.corners[0].elevation.abs() < f64::EPSILON);
    }
}
