//! Ошибки генератора
//!
//! Конвейер детерминирован и тотален на корректном входе, поэтому ошибок немного:
//! - нарушение предусловий (слишком мало точек, неположительные размеры и т.п.),
//!   которое проверяется до любой аллокации;
//! - ошибки загрузки конфигурации из файла.
//!
//! Недовыполнение (меньше городов, чем просили, дорога-заглушка по прямой) ошибкой
//! не считается и возвращается как данные.

use thiserror::Error;

/// Нарушение предусловий генерации
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MapGenError {
    #[error("at least 3 points are required to build the graph, got {0}")]
    TooFewPoints(usize),

    #[error("map dimensions must be positive and finite, got {width}x{height}")]
    InvalidDimensions { width: f64, height: f64 },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("invalid settlement config: {0}")]
    InvalidSettlementConfig(String),

    #[error("triangulation of {0} points failed")]
    Triangulation(usize),
}

/// Ошибка загрузки конфигурации
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
