//! Размещение поселений по правилам
//!
//! ## Алгоритм
//!
//! 1. **Кандидаты**: для каждого правила один раз строится множество регионов его
//!    категории (см. [`candidate_regions`]).
//! 2. **Проход 1 (минимумы)**: правила по убыванию приоритета; каждое получает
//!    случайных допустимых кандидатов, пока не наберёт `min_count`. Если кандидаты
//!    кончились: правило помечается невыполненным.
//! 3. **Проход 2 (цели)**: пока поселений меньше `total_towns`, выбирается правило
//!    с наибольшим дефицитом `floor(fraction × total) − count` (кроме заполненных
//!    до потолка). Нет кандидата: берётся первое по приоритету правило, у которого
//!    он есть. Нет ни у кого: остановка.
//!
//! Допустимый кандидат: регион ещё не занят и отстоит от всех размещённых
//! поселений не ближе `min_distance` (евклидово расстояние между центрами).

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::{NameGenerator, Settlement, SettlementKind, SettlementResult, SettlementStats, SizeTier};
use crate::config::{PlacementRule, RuleCategory, SettlementConfig};
use crate::error::MapGenError;
use crate::graph::MapGraph;
use crate::map::MapData;
use crate::rng::{MapRng, Stage};

/// Регионы суши, граничащие с ребром-рекой
#[must_use]
pub fn river_adjacent(graph: &MapGraph) -> Vec<bool> {
    graph
        .regions
        .iter()
        .map(|r| r.borders.iter().any(|&e| graph.edges[e].river > 0))
        .collect()
}

/// Регионы-кандидаты категории в порядке возрастания индекса
#[must_use]
pub fn candidate_regions(graph: &MapGraph, category: RuleCategory, near_river: &[bool]) -> Vec<usize> {
    graph
        .regions
        .iter()
        .filter(|r| r.is_land())
        .filter(|r| match category {
            RuleCategory::Shoreline => r.is_coast,
            RuleCategory::River => !r.is_coast && near_river[r.index],
            RuleCategory::Elevation { min, max } => {
                !r.is_coast && r.elevation >= min && (r.elevation < max || (max >= 1.0 && r.elevation <= max))
            }
            RuleCategory::Inland => !r.is_coast && !near_river[r.index],
        })
        .map(|r| r.index)
        .collect()
}

struct Placer<'a> {
    graph: &'a MapGraph,
    rules: &'a [PlacementRule],
    min_distance: f64,
    rng: MapRng,
    names: NameGenerator,
    occupied: Vec<bool>,
    counts: Vec<usize>,
    settlements: Vec<Settlement>,
}

impl Placer<'_> {
    fn is_valid(&self, region: usize) -> bool {
        if self.occupied[region] {
            return false;
        }
        let point = self.graph.regions[region].point;
        self.settlements
            .iter()
            .all(|s| s.point.distance(point) >= self.min_distance)
    }

    /// Случайный допустимый кандидат
    fn pick(&mut self, candidates: &[usize]) -> Option<usize> {
        let valid: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&r| self.is_valid(r))
            .collect();
        if valid.is_empty() {
            return None;
        }
        Some(valid[self.rng.index(valid.len())])
    }

    fn has_candidate(&self, candidates: &[usize]) -> bool {
        candidates.iter().any(|&r| self.is_valid(r))
    }

    fn place(&mut self, rule: usize, region: usize) {
        let kind = SettlementKind::from(self.rules[rule].category);
        let size = SizeTier::roll(kind, &mut self.rng);
        let name = self.names.unique(kind);

        self.occupied[region] = true;
        self.counts[rule] += 1;
        self.settlements.push(Settlement {
            id: self.settlements.len() as u32,
            region,
            point: self.graph.regions[region].point,
            kind,
            size,
            name,
            rule: self.rules[rule].name.clone(),
        });
    }

    fn is_full(&self, rule: usize) -> bool {
        self.rules[rule].is_full(self.counts[rule])
    }
}

/// Размещает поселения на готовой карте.
///
/// Сид берётся из `config.seed`, иначе из сида карты. Итоговое число поселений
/// может быть меньше `total_towns`, если рельеф этого не позволяет; это видно по
/// [`SettlementStats`].
///
/// # Ошибки
/// [`MapGenError::InvalidSettlementConfig`] при некорректных правилах.
pub fn place_settlements(
    map: &MapData,
    config: &SettlementConfig,
) -> Result<SettlementResult, MapGenError> {
    config.validate()?;

    let graph = map.graph();
    let seed = config.seed.unwrap_or(map.config().seed);
    let rules = config.rules.as_slice();

    let near_river = river_adjacent(graph);
    let candidates: Vec<Vec<usize>> = rules
        .iter()
        .map(|rule| candidate_regions(graph, rule.category, &near_river))
        .collect();

    // по убыванию приоритета, при равенстве: порядок объявления
    let mut order: Vec<usize> = (0..rules.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(rules[i].priority));

    let mut placer = Placer {
        graph,
        rules,
        min_distance: config.min_distance,
        rng: MapRng::for_stage(seed, Stage::Settlements),
        names: NameGenerator::new(seed),
        occupied: vec![false; graph.regions.len()],
        counts: vec![0; rules.len()],
        settlements: Vec::new(),
    };
    let mut unfulfilled = Vec::new();

    // === Проход 1: минимумы ===
    for &rule in &order {
        let minimum = match rules[rule].max_count {
            0 => rules[rule].min_count,
            max => rules[rule].min_count.min(max),
        };
        while placer.counts[rule] < minimum {
            match placer.pick(&candidates[rule]) {
                Some(region) => placer.place(rule, region),
                None => {
                    warn!(
                        rule = %rules[rule].name,
                        placed = placer.counts[rule],
                        minimum,
                        "rule minimum cannot be met"
                    );
                    unfulfilled.push(rules[rule].name.clone());
                    break;
                }
            }
        }
    }

    // === Проход 2: целевые доли ===
    let total = config.total_towns;
    while placer.settlements.len() < total {
        let mut chosen: Option<(usize, i64)> = None;
        for &rule in &order {
            if placer.is_full(rule) {
                continue;
            }
            let target = (rules[rule].target_fraction * total as f64).floor() as i64;
            let deficit = target - placer.counts[rule] as i64;
            if chosen.is_none_or(|(_, best)| deficit > best) {
                chosen = Some((rule, deficit));
            }
        }
        let Some((rule, _)) = chosen else { break };

        let rule = if placer.has_candidate(&candidates[rule]) {
            rule
        } else {
            match order
                .iter()
                .copied()
                .find(|&r| !placer.is_full(r) && placer.has_candidate(&candidates[r]))
            {
                Some(fallback) => fallback,
                None => break,
            }
        };

        if let Some(region) = placer.pick(&candidates[rule]) {
            placer.place(rule, region);
        }
    }

    let settlements = placer.settlements;
    let mut per_kind = BTreeMap::new();
    for s in &settlements {
        *per_kind.entry(s.kind).or_insert(0) += 1;
    }
    let per_rule = rules
        .iter()
        .zip(&placer.counts)
        .map(|(rule, &count)| (rule.name.clone(), count))
        .collect();

    let stats = SettlementStats {
        requested: total,
        placed: settlements.len(),
        per_kind,
        per_rule,
        rules_fulfilled: unfulfilled.is_empty(),
        unfulfilled_rules: unfulfilled,
    };

    debug!(
        requested = stats.requested,
        placed = stats.placed,
        rules_fulfilled = stats.rules_fulfilled,
        "settlements placed"
    );

    Ok(SettlementResult { settlements, stats })
}
