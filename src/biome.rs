use serde::{Deserialize, Serialize};

use crate::graph::{MapGraph, Region};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Biome {
    Ocean,
    Lake,
    Marsh,
    Ice,
    Beach,
    Snow,
    Tundra,
    Bare,
    Scorched,
    Taiga,
    Shrubland,
    TemperateDesert,
    TemperateRainForest,
    TemperateDeciduousForest,
    Grassland,
    TropicalRainForest,
    TropicalSeasonalForest,
    SubtropicalDesert,
}

impl Biome {
    pub fn to_rgb(&self) -> [u8; 3] {
        match self {
            Biome::Ocean => [68, 68, 122],
            Biome::Lake => [51, 102, 153],
            Biome::Marsh => [47, 102, 102],
            Biome::Ice => [153, 255, 255],
            Biome::Beach => [160, 144, 119],
            Biome::Snow => [255, 255, 255],
            Biome::Tundra => [187, 187, 170],
            Biome::Bare => [136, 136, 136],
            Biome::Scorched => [85, 85, 85],
            Biome::Taiga => [153, 170, 119],
            Biome::Shrubland => [136, 153, 119],
            Biome::TemperateDesert => [201, 210, 155],
            Biome::TemperateRainForest => [68, 136, 85],
            Biome::TemperateDeciduousForest => [103, 148, 89],
            Biome::Grassland => [136, 170, 85],
            Biome::TropicalRainForest => [51, 119, 85],
            Biome::TropicalSeasonalForest => [85, 153, 68],
            Biome::SubtropicalDesert => [210, 185, 139],
        }
    }

    /// Водный биом (океан или внутренний водоём)
    pub fn is_water(&self) -> bool {
        matches!(self, Biome::Ocean | Biome::Lake | Biome::Marsh | Biome::Ice)
    }
}

/// Биом по флагам воды, высоте и влажности.
///
/// Тотальная функция: каждой паре (высота, влажность) из `[0, 1]²` соответствует
/// ровно один биом.
#[must_use]
pub fn biome_for(ocean: bool, water: bool, coast: bool, elevation: f64, moisture: f64) -> Biome {
    if ocean {
        return Biome::Ocean;
    }
    if water {
        // низкие озёра становятся болотами, высокие замерзают
        if elevation < 0.1 {
            return Biome::Marsh;
        }
        if elevation > 0.8 {
            return Biome::Ice;
        }
        return Biome::Lake;
    }
    if coast {
        return Biome::Beach;
    }

    if elevation > 0.8 {
        if moisture > 0.5 {
            Biome::Snow
        } else if moisture > 0.33 {
            Biome::Tundra
        } else if moisture > 0.16 {
            Biome::Bare
        } else {
            Biome::Scorched
        }
    } else if elevation > 0.6 {
        if moisture > 0.66 {
            Biome::Taiga
        } else if moisture > 0.33 {
            Biome::Shrubland
        } else {
            Biome::TemperateDesert
        }
    } else if elevation > 0.3 {
        if moisture > 0.83 {
            Biome::TemperateRainForest
        } else if moisture > 0.5 {
            Biome::TemperateDeciduousForest
        } else if moisture > 0.16 {
            Biome::Grassland
        } else {
            Biome::TemperateDesert
        }
    } else if moisture > 0.66 {
        Biome::TropicalRainForest
    } else if moisture > 0.33 {
        Biome::TropicalSeasonalForest
    } else if moisture > 0.16 {
        Biome::Grassland
    } else {
        Biome::SubtropicalDesert
    }
}

fn region_biome(region: &Region) -> Biome {
    biome_for(
        region.is_ocean,
        region.is_water,
        region.is_coast,
        region.elevation,
        region.moisture,
    )
}

/// Назначает биомы всем регионам. Последняя подстадия рельефа.
pub fn assign_biomes(graph: &mut MapGraph) {
    for region in &mut graph.regions {
        region.biome = region_biome(region);
    }
}
