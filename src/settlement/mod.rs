//! Поселения
//!
//! Размещение городов по правилам с квотами и приоритетами ([`placement`]) и
//! синтез уникальных названий ([`naming`]). Поселения ссылаются на регионы карты
//! по индексу; один регион: не более одного поселения.

pub mod naming;
pub mod placement;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::RuleCategory;
use crate::graph::Point;
use crate::rng::MapRng;

pub use naming::NameGenerator;
pub use placement::place_settlements;

/// Тип размещения
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementKind {
    Shoreline,
    River,
    Elevation,
    Inland,
}

impl From<RuleCategory> for SettlementKind {
    fn from(category: RuleCategory) -> Self {
        match category {
            RuleCategory::Shoreline => SettlementKind::Shoreline,
            RuleCategory::River => SettlementKind::River,
            RuleCategory::Elevation { .. } => SettlementKind::Elevation,
            RuleCategory::Inland => SettlementKind::Inland,
        }
    }
}

/// Размер поселения
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeTier {
    Large,
    Medium,
    Small,
}

impl SizeTier {
    /// Вероятности (крупный, средний) для типа, остальное приходится на малый.
    /// Портовые города чаще крупные, горные посёлки чаще малые.
    #[must_use]
    pub fn odds(kind: SettlementKind) -> (f64, f64) {
        match kind {
            SettlementKind::Shoreline => (0.45, 0.35),
            SettlementKind::River => (0.3, 0.45),
            SettlementKind::Elevation => (0.1, 0.3),
            SettlementKind::Inland => (0.2, 0.45),
        }
    }

    pub fn roll(kind: SettlementKind, rng: &mut MapRng) -> Self {
        let (large, medium) = Self::odds(kind);
        let roll = rng.next_float();
        if roll < large {
            SizeTier::Large
        } else if roll < large + medium {
            SizeTier::Medium
        } else {
            SizeTier::Small
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    pub id: u32,
    /// Индекс региона-владельца
    pub region: usize,
    /// Центр региона
    pub point: Point,
    pub kind: SettlementKind,
    pub size: SizeTier,
    pub name: String,
    /// Имя правила, разместившего поселение
    pub rule: String,
}

/// Статистика размещения. Недовыполнение: не ошибка, а данные.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettlementStats {
    pub requested: usize,
    pub placed: usize,
    pub per_kind: BTreeMap<SettlementKind, usize>,
    pub per_rule: BTreeMap<String, usize>,
    /// Правила, минимум которых не удалось выполнить
    pub unfulfilled_rules: Vec<String>,
    pub rules_fulfilled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementResult {
    pub settlements: Vec<Settlement>,
    pub stats: SettlementStats,
}
