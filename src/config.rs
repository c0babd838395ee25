// src/config.rs
//! Конфигурация генерации острова
//!
//! Этот модуль определяет все параметры, управляющие генерацией:
//! - Параметры карты и рельефа ([`MapConfig`])
//! - Правила размещения поселений ([`SettlementConfig`], [`PlacementRule`])
//! - Полный набор параметров для CLI ([`GeneratorParams`])
//!
//! Все структуры поддерживают сериализацию в TOML/JSON для удобной настройки через конфигурационные файлы.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ConfigError, MapGenError};

/// Параметры генерации карты
///
/// Полностью определяет граф, рельеф, реки и биомы. Одинаковая конфигурация
/// даёт побайтно одинаковую карту.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapConfig {
    /// Сид генератора случайных чисел
    #[serde(default)]
    pub seed: u64,

    /// Ширина карты в условных единицах (по умолчанию 800)
    #[serde(default = "default_width")]
    pub width: f64,

    /// Высота карты в условных единицах (по умолчанию 600)
    #[serde(default = "default_height")]
    pub height: f64,

    /// Количество регионов (точек диаграммы Вороного), минимум 3
    #[serde(default = "default_num_points")]
    pub num_points: usize,

    /// Смещение береговой линии:
    /// - `>1.0` → остров меньше, больше океана,
    /// - `<1.0` → остров крупнее.
    #[serde(default = "default_island_factor")]
    pub island_factor: f64,

    /// Доля водных углов, при которой регион считается озером
    #[serde(default = "default_lake_factor")]
    pub lake_factor: f64,

    /// Количество истоков рек
    #[serde(default = "default_river_count")]
    pub river_count: usize,

    /// Число октав шума береговой линии
    #[serde(default = "default_noise_octaves")]
    pub noise_octaves: u32,
}

fn default_width() -> f64 {
    800.0
}
fn default_height() -> f64 {
    600.0
}
fn default_num_points() -> usize {
    1000
}
fn default_island_factor() -> f64 {
    1.07
}
fn default_lake_factor() -> f64 {
    0.3
}
fn default_river_count() -> usize {
    30
}
fn default_noise_octaves() -> u32 {
    4
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            width: 800.0,
            height: 600.0,
            num_points: 1000,
            island_factor: 1.07,
            lake_factor: 0.3,
            river_count: 30,
            noise_octaves: 4,
        }
    }
}

impl MapConfig {
    /// Проверяет предусловия. Вызывается до любой аллокации.
    pub fn validate(&self) -> Result<(), MapGenError> {
        if self.num_points < 3 {
            return Err(MapGenError::TooFewPoints(self.num_points));
        }
        let valid_dim = |v: f64| v.is_finite() && v > 0.0;
        if !valid_dim(self.width) || !valid_dim(self.height) {
            return Err(MapGenError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if !self.island_factor.is_finite() || self.island_factor <= 0.0 {
            return Err(MapGenError::InvalidParameter {
                name: "island_factor",
                reason: format!("must be a positive number, got {}", self.island_factor),
            });
        }
        if !(0.0..=1.0).contains(&self.lake_factor) {
            return Err(MapGenError::InvalidParameter {
                name: "lake_factor",
                reason: format!("must lie in [0, 1], got {}", self.lake_factor),
            });
        }
        Ok(())
    }
}

/// Категория правила размещения поселений
///
/// Закрытый набор вариантов: каждой категории соответствует ровно одно множество
/// регионов-кандидатов (см. `settlement::placement`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleCategory {
    /// Прибрежная суша
    Shoreline,
    /// Суша у реки, не на побережье
    River,
    /// Суша в окне высот `[min, max)`, не на побережье
    Elevation { min: f64, max: f64 },
    /// Суша вдали и от побережья, и от рек
    Inland,
}

/// Правило размещения: категория, целевая доля, гарантированный минимум и потолок
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRule {
    pub name: String,
    pub category: RuleCategory,

    /// Целевая доля от общего числа поселений (`0.0..=1.0`)
    pub target_fraction: f64,

    /// Гарантированный минимум (первый проход)
    #[serde(default)]
    pub min_count: usize,

    /// Потолок; `0`: без ограничения
    #[serde(default)]
    pub max_count: usize,

    /// Больше: раньше
    #[serde(default)]
    pub priority: i32,
}

impl PlacementRule {
    pub fn new(name: &str, category: RuleCategory, target_fraction: f64) -> Self {
        Self {
            name: name.to_string(),
            category,
            target_fraction,
            min_count: 0,
            max_count: 0,
            priority: 0,
        }
    }

    #[must_use]
    pub fn with_min(mut self, min_count: usize) -> Self {
        self.min_count = min_count;
        self
    }

    #[must_use]
    pub fn with_max(mut self, max_count: usize) -> Self {
        self.max_count = max_count;
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Достигнут ли потолок правила
    #[must_use]
    pub fn is_full(&self, count: usize) -> bool {
        self.max_count != 0 && count >= self.max_count
    }
}

/// Параметры размещения поселений
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Желаемое общее число поселений
    #[serde(default = "default_total_towns")]
    pub total_towns: usize,

    /// Минимальное расстояние между центрами регионов поселений
    #[serde(default = "default_min_distance")]
    pub min_distance: f64,

    #[serde(default = "standard_rules")]
    pub rules: Vec<PlacementRule>,

    /// Сид размещения; по умолчанию берётся сид карты
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_total_towns() -> usize {
    15
}
fn default_min_distance() -> f64 {
    40.0
}

/// Пять стандартных правил: побережье, реки, высокогорье, предгорья, глубинка
#[must_use]
pub fn standard_rules() -> Vec<PlacementRule> {
    vec![
        PlacementRule::new("shoreline", RuleCategory::Shoreline, 0.30)
            .with_min(2)
            .with_priority(5),
        PlacementRule::new("river", RuleCategory::River, 0.25)
            .with_min(2)
            .with_priority(4),
        PlacementRule::new(
            "highlands",
            RuleCategory::Elevation { min: 0.6, max: 1.0 },
            0.15,
        )
        .with_min(1)
        .with_max(3)
        .with_priority(3),
        PlacementRule::new(
            "midlands",
            RuleCategory::Elevation { min: 0.3, max: 0.6 },
            0.20,
        )
        .with_min(1)
        .with_priority(2),
        PlacementRule::new("inland", RuleCategory::Inland, 0.10).with_priority(1),
    ]
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self::standard(default_total_towns())
    }
}

impl SettlementConfig {
    /// Конфигурация со стандартными правилами
    #[must_use]
    pub fn standard(total_towns: usize) -> Self {
        Self {
            total_towns,
            min_distance: default_min_distance(),
            rules: standard_rules(),
            seed: None,
        }
    }

    pub fn validate(&self) -> Result<(), MapGenError> {
        if !self.min_distance.is_finite() || self.min_distance < 0.0 {
            return Err(MapGenError::InvalidSettlementConfig(format!(
                "min_distance must be a non-negative number, got {}",
                self.min_distance
            )));
        }
        for rule in &self.rules {
            if !(0.0..=1.0).contains(&rule.target_fraction) {
                return Err(MapGenError::InvalidSettlementConfig(format!(
                    "rule `{}`: target_fraction {} is outside [0, 1]",
                    rule.name, rule.target_fraction
                )));
            }
            if rule.max_count != 0 && rule.max_count < rule.min_count {
                return Err(MapGenError::InvalidSettlementConfig(format!(
                    "rule `{}`: max_count {} is below min_count {}",
                    rule.name, rule.max_count, rule.min_count
                )));
            }
            if let RuleCategory::Elevation { min, max } = rule.category
                && (min.is_nan() || max.is_nan() || min >= max)
            {
                return Err(MapGenError::InvalidSettlementConfig(format!(
                    "rule `{}`: empty elevation window [{min}, {max})",
                    rule.name
                )));
            }
        }
        Ok(())
    }
}

/// Полный набор параметров генерации
///
/// Загружается из TOML-файла. Все секции необязательны.
///
/// # Пример
/// ```toml
/// # island.toml
/// [map]
/// seed = 12345
/// num_points = 2000
/// river_count = 40
///
/// [settlements]
/// total_towns = 20
/// min_distance = 35.0
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeneratorParams {
    #[serde(default)]
    pub map: MapConfig,

    #[serde(default)]
    pub settlements: SettlementConfig,
}

impl GeneratorParams {
    /// Загружает параметры из TOML-файла
    ///
    /// # Ошибки
    /// Возвращает ошибку, если файл не найден или содержит недопустимый формат.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}
