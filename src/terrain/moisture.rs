use std::collections::VecDeque;

use tracing::debug;

use crate::graph::MapGraph;

/// Множитель влажности на один шаг
pub const MOISTURE_DECAY: f64 = 0.9;

/// Потолок влажности речного угла
pub const MAX_RIVER_MOISTURE: f64 = 3.0;

/// Влажность источника: реки по объёму потока, озёра: 1, остальные не источники
fn source_moisture(is_ocean: bool, is_water: bool, river: u32) -> Option<f64> {
    if is_ocean {
        return None;
    }
    if river > 0 {
        Some((0.2 * f64::from(river)).min(MAX_RIVER_MOISTURE))
    } else if is_water {
        Some(1.0)
    } else {
        None
    }
}

/// Сырая влажность углов: многоисточниковая заливка с затуханием.
///
/// Очередь FIFO без отметок посещения: угол перезаписывается только строго
/// большим значением и при каждом улучшении снова ставится в очередь, поэтому
/// итог: максимум затухших значений от всех источников.
pub fn assign_corner_moisture(graph: &mut MapGraph) {
    let mut moisture = vec![0.0; graph.corners.len()];
    let mut queue = VecDeque::new();

    for corner in &graph.corners {
        if let Some(m) = source_moisture(corner.is_ocean, corner.is_water, corner.river) {
            moisture[corner.index] = m;
            queue.push_back(corner.index);
        }
    }

    let mut updates = 0usize;
    while let Some(q) = queue.pop_front() {
        let spread = moisture[q] * MOISTURE_DECAY;
        for &r in &graph.corners[q].adjacent {
            if spread > moisture[r] {
                moisture[r] = spread;
                queue.push_back(r);
                updates += 1;
            }
        }
    }

    for (corner, m) in graph.corners.iter_mut().zip(moisture) {
        corner.moisture = m;
    }
    debug!(updates, "moisture propagated");
}

/// Линейная ранговая нормализация влажности суши в `[0, 1]`; океан: 1
pub fn redistribute_moisture(graph: &mut MapGraph) {
    let mut land: Vec<usize> = graph
        .corners
        .iter()
        .filter(|c| !c.is_ocean)
        .map(|c| c.index)
        .collect();
    land.sort_by(|&a, &b| graph.corners[a].moisture.total_cmp(&graph.corners[b].moisture));

    let last = land.len().saturating_sub(1);
    for (rank, &c) in land.iter().enumerate() {
        graph.corners[c].moisture = if last == 0 {
            0.0
        } else {
            rank as f64 / last as f64
        };
    }

    for corner in &mut graph.corners {
        if corner.is_ocean {
            corner.moisture = 1.0;
        }
    }
}

/// Влажность региона: среднее влажности его углов
pub fn assign_region_moisture(graph: &mut MapGraph) {
    for region in &mut graph.regions {
        if region.corners.is_empty() {
            continue;
        }
        let sum: f64 = region
            .corners
            .iter()
            .map(|&c| graph.corners[c].moisture)
            .sum();
        region.moisture = sum / region.corners.len() as f64;
    }
}

pub fn assign_moisture(graph: &mut MapGraph) {
    assign_corner_moisture(graph);
    redistribute_moisture(graph);
    assign_region_moisture(graph);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;

    /// Граф без воды и рек: все углы сухие
    fn dry_graph() -> MapGraph {
        build_graph(200, 300.0, 300.0, 17).unwrap()
    }

    #[test]
    fn sources() {
        assert_eq!(source_moisture(true, true, 4), None);
        assert_eq!(source_moisture(false, true, 0), Some(1.0));
        assert_eq!(source_moisture(false, false, 0), None);
        assert!((source_moisture(false, false, 2).unwrap() - 0.4).abs() < 1e-12);
        assert!((source_moisture(false, true, 100).unwrap() - MAX_RIVER_MOISTURE).abs() < 1e-12);
    }

    #[test]
    fn moisture_keeps_the_best_source() {
        let mut graph = dry_graph();
        let wet = 0;
        let river = graph.corners.len() - 1;
        graph.corners[wet].is_water = true;
        graph.corners[river].river = 10; // 2.0 у источника

        assign_corner_moisture(&mut graph);

        assert!(graph.corners[wet].moisture >= 1.0);
        assert!((graph.corners[river].moisture - 2.0).abs() < 1e-12);
        for corner in &graph.corners {
            assert!(corner.moisture <= 2.0 + 1e-12);
            for &n in &corner.adjacent {
                // неподвижная точка заливки
                assert!(graph.corners[n].moisture + 1e-12 >= corner.moisture * MOISTURE_DECAY);
            }
        }
    }

    #[test]
    fn redistribution_is_rank_based() {
        let mut graph = dry_graph();
        graph.corners[3].is_water = true;
        assign_corner_moisture(&mut graph);
        let before: Vec<f64> = graph.corners.iter().map(|c| c.moisture).collect();
        redistribute_moisture(&mut graph);

        for a in 0..graph.corners.len() {
            assert!((0.0..=1.0).contains(&graph.corners[a].moisture));
            for b in 0..graph.corners.len() {
                if before[a] < before[b] {
                    assert!(graph.corners[a].moisture < graph.corners[b].moisture);
                }
            }
        }
    }
}
