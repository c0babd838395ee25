use std::collections::VecDeque;

use tracing::debug;

use crate::config::MapConfig;
use crate::graph::{MapGraph, Point};
use crate::rng::{MapRng, Noise, Stage};

/// Угол с формой острова выше порога: вода
pub const WATER_THRESHOLD: f64 = 0.7;

/// Вклад шума в форму острова
pub const COASTLINE_NOISE: f64 = 0.25;

/// Доля океанских углов, при которой регион: океан
pub const OCEAN_FRACTION: f64 = 0.5;

/// Масштаб нормированных координат для шума
const NOISE_SCALE: f64 = 2.5;

/// Скаляр формы острова в точке: радиальное расстояние от центра плюс шум.
///
/// Координаты нормируются в `[-1, 1]`, расстояние: среднее чебышёвского и
/// евклидова, поэтому остров тянется к прямоугольнику карты.
#[must_use]
pub fn island_shape(noise: &Noise, config: &MapConfig, p: Point) -> f64 {
    let nx = 2.0 * p.x / config.width - 1.0;
    let ny = 2.0 * p.y / config.height - 1.0;
    let radial = 0.5 * (nx.abs().max(ny.abs()) + nx.hypot(ny));
    let n = noise.fbm(nx * NOISE_SCALE, ny * NOISE_SCALE, config.noise_octaves);
    config.island_factor * radial + COASTLINE_NOISE * n
}

/// Вода, океан, озёра и побережье.
///
/// 1. Углы: вода по форме острова, граничные углы: всегда вода.
/// 2. Заливка от граничных углов помечает достижимую воду океаном,
///    остальная вода: озёра.
/// 3. Регионы: голосование углов, касание границы: всегда океан.
/// 4. Океанские регионы, не связанные с границей через океан, становятся озёрами.
/// 5. Побережье: регион суши с океанским соседом; угол не в океане, смежный
///    с океанским углом.
pub fn assign_water(graph: &mut MapGraph, config: &MapConfig) {
    let mut rng = MapRng::for_stage(config.seed, Stage::Island);
    let noise = Noise::new(&mut rng);

    // === 1. Вода на углах ===
    for corner in &mut graph.corners {
        corner.is_water = corner.is_border || island_shape(&noise, config, corner.point) > WATER_THRESHOLD;
        corner.is_ocean = false;
    }

    // === 2. Заливка океана от границы ===
    let mut queue = VecDeque::new();
    for corner in &mut graph.corners {
        if corner.is_border {
            corner.is_ocean = true;
            queue.push_back(corner.index);
        }
    }
    while let Some(q) = queue.pop_front() {
        for i in 0..graph.corners[q].adjacent.len() {
            let r = graph.corners[q].adjacent[i];
            let neighbor = &mut graph.corners[r];
            if neighbor.is_water && !neighbor.is_ocean {
                neighbor.is_ocean = true;
                queue.push_back(r);
            }
        }
    }

    // === 3. Голосование углов ===
    for region in &mut graph.regions {
        let total = region.corners.len().max(1) as f64;
        let ocean = region
            .corners
            .iter()
            .filter(|&&c| graph.corners[c].is_ocean)
            .count() as f64;
        let water = region
            .corners
            .iter()
            .filter(|&&c| graph.corners[c].is_water)
            .count() as f64;

        region.is_ocean = region.is_border || ocean / total >= OCEAN_FRACTION;
        region.is_water = region.is_ocean || water / total >= config.lake_factor;
    }

    // === 4. Океан должен быть связан с границей ===
    let mut connected = vec![false; graph.regions.len()];
    let mut queue: VecDeque<usize> = graph
        .regions
        .iter()
        .filter(|r| r.is_border)
        .map(|r| r.index)
        .collect();
    for &r in &queue {
        connected[r] = true;
    }
    while let Some(r) = queue.pop_front() {
        for &n in &graph.regions[r].neighbors {
            if !connected[n] && graph.regions[n].is_ocean {
                connected[n] = true;
                queue.push_back(n);
            }
        }
    }
    let mut landlocked = 0;
    for region in &mut graph.regions {
        if region.is_ocean && !connected[region.index] {
            region.is_ocean = false;
            landlocked += 1;
        }
    }

    // === 5. Побережье ===
    for i in 0..graph.regions.len() {
        let region = &graph.regions[i];
        let coast = !region.is_water
            && region
                .neighbors
                .iter()
                .any(|&n| graph.regions[n].is_ocean);
        graph.regions[i].is_coast = coast;
    }
    // береговой угол: не океан, но соседствует с океанским углом
    let corner_coast: Vec<bool> = graph
        .corners
        .iter()
        .map(|c| !c.is_ocean && c.adjacent.iter().any(|&a| graph.corners[a].is_ocean))
        .collect();
    for (corner, coast) in graph.corners.iter_mut().zip(corner_coast) {
        corner.is_coast = coast;
    }

    debug!(
        ocean = graph.regions.iter().filter(|r| r.is_ocean).count(),
        lakes = graph.regions.iter().filter(|r| r.is_water && !r.is_ocean).count(),
        coast = graph.regions.iter().filter(|r| r.is_coast).count(),
        landlocked,
        "water assigned"
    );
}
