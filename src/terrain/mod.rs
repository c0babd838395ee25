//! Гидрология и рельеф
//!
//! Последовательные подстадии над готовым графом. Каждая читает флаги,
//! окончательно записанные предыдущей, поэтому порядок жёсткий:
//!
//! 1. [`water`]: вода, океан, озёра, побережье
//! 2. [`elevation`]: высоты (BFS от берега + ранговая нормализация)
//! 3. [`rivers`]: склоны и реки
//! 4. [`moisture`]: влажность (заливка от озёр и рек)
//! 5. [`crate::biome`]: биомы регионов
//!
//! Ни одна подстадия не меняет топологию графа.

pub mod elevation;
pub mod moisture;
pub mod rivers;
pub mod water;

use tracing::debug;

use crate::biome::assign_biomes;
use crate::config::MapConfig;
use crate::graph::MapGraph;

/// Прогоняет все подстадии рельефа по порядку
pub fn assign_terrain(graph: &mut MapGraph, config: &MapConfig) {
    water::assign_water(graph, config);
    elevation::assign_elevations(graph);
    rivers::assign_rivers(graph, config.river_count, config.seed);
    moisture::assign_moisture(graph);
    assign_biomes(graph);

    debug!(
        land = graph.regions.iter().filter(|r| r.is_land()).count(),
        "terrain assigned"
    );
}
