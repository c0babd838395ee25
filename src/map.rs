//! Точка входа генерации карты
//!
//! [`generate`] прогоняет стадии строго по порядку: граф → рельеф (вода, высоты,
//! реки, влажность, биомы) → шумные рёбра. Каждая стадия завершается до начала
//! следующей; результат: [`MapData`], доступная только для чтения.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::biome::Biome;
use crate::config::MapConfig;
use crate::error::MapGenError;
use crate::graph::{Corner, Edge, MapGraph, Region, build_graph};
use crate::noisy_edges::{NoisyEdges, build_noisy_edges};
use crate::terrain::assign_terrain;

/// Готовая карта: арена графа, шумные рёбра и исходная конфигурация
#[derive(Debug, Clone)]
pub struct MapData {
    config: MapConfig,
    graph: MapGraph,
    noisy_edges: NoisyEdges,
}

impl MapData {
    #[must_use]
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    #[must_use]
    pub fn graph(&self) -> &MapGraph {
        &self.graph
    }

    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.graph.regions
    }

    #[must_use]
    pub fn corners(&self) -> &[Corner] {
        &self.graph.corners
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.graph.edges
    }

    #[must_use]
    pub fn noisy_edges(&self) -> &NoisyEdges {
        &self.noisy_edges
    }

    /// Сводка по карте для отчётов и логов
    #[must_use]
    pub fn summary(&self) -> MapSummary {
        let regions = self.regions();
        let mut biomes = BTreeMap::new();
        for region in regions {
            *biomes.entry(region.biome).or_insert(0) += 1;
        }
        MapSummary {
            regions: regions.len(),
            corners: self.corners().len(),
            edges: self.edges().len(),
            land: regions.iter().filter(|r| r.is_land()).count(),
            ocean: regions.iter().filter(|r| r.is_ocean).count(),
            lakes: regions.iter().filter(|r| r.is_water && !r.is_ocean).count(),
            coast: regions.iter().filter(|r| r.is_coast).count(),
            river_edges: self.edges().iter().filter(|e| e.river > 0).count(),
            biomes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapSummary {
    pub regions: usize,
    pub corners: usize,
    pub edges: usize,
    pub land: usize,
    pub ocean: usize,
    pub lakes: usize,
    pub coast: usize,
    pub river_edges: usize,
    pub biomes: BTreeMap<Biome, usize>,
}

/// Генерирует карту по конфигурации.
///
/// Чистая функция: одинаковая конфигурация даёт одинаковую карту.
///
/// # Ошибки
/// Нарушение предусловий ([`MapConfig::validate`]) отклоняется до начала работы.
pub fn generate(config: &MapConfig) -> Result<MapData, MapGenError> {
    config.validate()?;
    let started = Instant::now();

    let mut graph = build_graph(config.num_points, config.width, config.height, config.seed)?;
    assign_terrain(&mut graph, config);
    let noisy_edges = build_noisy_edges(&graph, config.seed);

    let map = MapData {
        config: config.clone(),
        graph,
        noisy_edges,
    };

    let summary = map.summary();
    info!(
        seed = config.seed,
        regions = summary.regions,
        land = summary.land,
        lakes = summary.lakes,
        river_edges = summary.river_edges,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "map generated"
    );

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_config_before_building() {
        let config = MapConfig {
            num_points: 1,
            ..MapConfig::default()
        };
        assert_eq!(generate(&config).unwrap_err(), MapGenError::TooFewPoints(1));

        let config = MapConfig {
            height: f64::NAN,
            ..MapConfig::default()
        };
        assert!(matches!(
            generate(&config),
            Err(MapGenError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn summary_counts_add_up() {
        let map = generate(&MapConfig {
            seed: 77,
            num_points: 300,
            ..MapConfig::default()
        })
        .unwrap();
        let summary = map.summary();
        assert_eq!(summary.regions, 300);
        assert_eq!(summary.land + summary.ocean + summary.lakes, summary.regions);
        assert_eq!(summary.biomes.values().sum::<usize>(), summary.regions);
        assert_eq!(summary.biomes.get(&Biome::Ocean).copied().unwrap_or(0), summary.ocean);
        assert_eq!(map.config().seed, 77);
    }
}
