use tracing::debug;

use crate::graph::MapGraph;
use crate::rng::{MapRng, Stage};

/// Исток реки должен быть выше этой отметки
pub const RIVER_SOURCE_MIN_ELEVATION: f64 = 0.3;

/// Для каждого угла: соседний угол с наименьшей высотой, строго ниже текущего.
///
/// Равенство высот оставляет угол локальным минимумом (`downslope = None`), с
/// одним исключением: угол суши на нулевой высоте стекает в смежный океанский
/// угол (с наименьшим индексом). После ранговой нормализации такой угол ровно
/// один, поэтому цепочка любого угла суши заканчивается в океане.
pub fn calculate_downslopes(graph: &mut MapGraph) {
    let downslopes: Vec<Option<usize>> = graph
        .corners
        .iter()
        .map(|q| {
            let mut lowest = q.elevation;
            let mut target = None;
            for &r in &q.adjacent {
                let elevation = graph.corners[r].elevation;
                if elevation < lowest {
                    lowest = elevation;
                    target = Some(r);
                }
            }
            if target.is_none() && !q.is_ocean {
                target = q
                    .adjacent
                    .iter()
                    .copied()
                    .filter(|&r| graph.corners[r].is_ocean && graph.corners[r].elevation <= q.elevation)
                    .min();
            }
            target
        })
        .collect();

    for (corner, downslope) in graph.corners.iter_mut().zip(downslopes) {
        corner.downslope = downslope;
    }
}

/// Прокладывает до `river_count` рек вниз по склону.
///
/// Кандидаты в истоки: углы суши не на побережье выше
/// [`RIVER_SOURCE_MIN_ELEVATION`], детерминированно перемешанные. Каждая река
/// увеличивает поток угла и ребра на каждом шаге и останавливается:
/// - в устье, первом океанском угле (устье тоже получает поток),
/// - при впадении в уже текущую реку (точка слияния учитывается один раз),
/// - в локальном минимуме, если цепочка склонов оборвалась.
///
/// Уже текущие углы истоками не считаются. Возвращает число проложенных рек.
pub fn create_rivers(graph: &mut MapGraph, river_count: usize, seed: u64) -> usize {
    let mut rng = MapRng::for_stage(seed, Stage::Rivers);

    let mut candidates: Vec<usize> = graph
        .corners
        .iter()
        .filter(|c| !c.is_ocean && !c.is_coast && c.elevation > RIVER_SOURCE_MIN_ELEVATION)
        .map(|c| c.index)
        .collect();
    rng.shuffle(&mut candidates);

    let mut sources = 0;
    for source in candidates {
        if sources >= river_count {
            break;
        }
        if graph.corners[source].river > 0 {
            continue;
        }
        sources += 1;

        let mut q = source;
        loop {
            let corner = &graph.corners[q];
            if corner.is_ocean {
                graph.corners[q].river += 1;
                break;
            }
            let Some(next) = corner.downslope else {
                graph.corners[q].river += 1;
                break;
            };
            let Some(edge) = graph.edge_between_corners(q, next) else {
                graph.corners[q].river += 1;
                break;
            };

            let joined = graph.corners[next].river > 0;
            graph.edges[edge].river += 1;
            graph.corners[q].river += 1;
            if joined {
                graph.corners[next].river += 1;
                break;
            }
            q = next;
        }
    }

    sources
}

/// Подстадия рек: склоны, затем реки
pub fn assign_rivers(graph: &mut MapGraph, river_count: usize, seed: u64) {
    calculate_downslopes(graph);
    let sources = create_rivers(graph, river_count, seed);
    debug!(
        requested = river_count,
        sources,
        river_edges = graph.edges.iter().filter(|e| e.river > 0).count(),
        "rivers traced"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::graph::build_graph;
    use crate::terrain::elevation::assign_elevations;
    use crate::terrain::water::assign_water;

    fn with_rivers(river_count: usize) -> MapGraph {
        let config = MapConfig {
            seed: 99,
            num_points: 600,
            river_count,
            ..MapConfig::default()
        };
        let mut graph = build_graph(config.num_points, config.width, config.height, config.seed).unwrap();
        assign_water(&mut graph, &config);
        assign_elevations(&mut graph);
        assign_rivers(&mut graph, config.river_count, config.seed);
        graph
    }

    #[test]
    fn downslope_is_lower_neighbor() {
        let graph = with_rivers(0);
        for corner in &graph.corners {
            if let Some(d) = corner.downslope {
                let next = &graph.corners[d];
                assert!(corner.adjacent.contains(&d));
                assert!(next.elevation < corner.elevation || (next.is_ocean && next.elevation <= corner.elevation));
            }
        }
    }

    #[test]
    fn every_land_corner_drains_to_the_ocean() {
        let graph = with_rivers(0);
        for corner in graph.corners.iter().filter(|c| !c.is_ocean) {
            let mut q = corner.index;
            let mut steps = 0;
            while !graph.corners[q].is_ocean {
                let next = graph.corners[q].downslope.expect("land corner has a downslope");
                assert!(graph.corners[next].elevation <= graph.corners[q].elevation);
                q = next;
                steps += 1;
                assert!(steps <= graph.corners.len());
            }
        }
    }

    #[test]
    fn zero_elevation_land_corner_flows_into_the_ocean() {
        let graph = with_rivers(0);
        let lowest: Vec<_> = graph
            .corners
            .iter()
            .filter(|c| !c.is_ocean && c.elevation == 0.0)
            .collect();
        assert!(lowest.len() <= 1);
        for corner in lowest {
            let d = corner.downslope.expect("flows somewhere");
            assert!(graph.corners[d].is_ocean);
        }
    }

    #[test]
    fn river_edges_follow_downslope_to_the_sea() {
        let graph = with_rivers(15);
        let river_edges: Vec<_> = graph.edges.iter().filter(|e| e.river > 0).collect();
        assert!(!river_edges.is_empty());

        for edge in river_edges {
            let (v0, v1) = edge.corners().expect("river edge has both corners");
            let lower = if graph.corners[v0].downslope == Some(v1) {
                v1
            } else {
                assert_eq!(graph.corners[v1].downslope, Some(v0));
                v0
            };

            let mut q = lower;
            while !graph.corners[q].is_ocean {
                q = graph.corners[q].downslope.expect("chain reaches the ocean");
            }
        }
    }

    #[test]
    fn every_river_has_an_ocean_mouth() {
        let graph = with_rivers(15);
        // устье: текущий угол, ниже которого реки нет
        for corner in graph.corners.iter().filter(|c| c.river > 0) {
            match corner.downslope {
                Some(d) if graph.corners[d].river > 0 => {}
                _ => assert!(corner.is_ocean, "river ends on land at corner {}", corner.index),
            }
        }
        assert!(graph.corners.iter().any(|c| c.is_ocean && c.river > 0));
    }

    #[test]
    fn no_rivers_when_count_is_zero() {
        let graph = with_rivers(0);
        assert!(graph.edges.iter().all(|e| e.river == 0));
        assert!(graph.corners.iter().all(|c| c.river == 0));
    }

    #[test]
    fn river_count_caps_sources() {
        let mut graph = with_rivers(0);
        let mut fresh = graph.clone();
        let traced = create_rivers(&mut graph, 3, 99);
        assert!(traced <= 3);
        let more = create_rivers(&mut fresh, 10_000, 99);
        assert!(more >= traced);
    }
}
