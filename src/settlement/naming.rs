//! Синтез названий поселений
//!
//! Названия собираются по шаблонам: составное (`Stone` + `haven`) или слоговое
//! (`Brae` + `lor`, иногда с окончанием по типу поселения). Окончания зависят от
//! типа, например `-port` у портов и `-ford` у рек.

use std::collections::HashSet;

use super::SettlementKind;
use crate::rng::{MapRng, Stage};

/// Сколько раз пробуем получить новое название перед числовым суффиксом
pub const NAME_RETRIES: usize = 20;

const PREFIXES: &[&str] = &[
    "Ash", "Black", "Bright", "Cold", "Deep", "Elder", "Fair", "Frost", "Green", "Grey", "High",
    "Iron", "Long", "Mist", "Oak", "Raven", "Red", "Salt", "Silver", "Stone", "Storm", "Thorn",
    "West", "White", "Wolf",
];

const ONSETS: &[&str] = &[
    "b", "br", "c", "d", "dr", "f", "g", "gr", "h", "k", "l", "m", "n", "r", "s", "st", "t", "th",
    "v", "w",
];
const VOWELS: &[&str] = &["a", "e", "i", "o", "u", "ae", "ai", "ea", "ou"];
const CODAS: &[&str] = &["", "", "n", "r", "l", "s", "th", "nd", "rk", "m"];

fn suffixes(kind: SettlementKind) -> &'static [&'static str] {
    match kind {
        SettlementKind::Shoreline => &["port", "haven", "bay", "mouth", "wick", "strand", "cove"],
        SettlementKind::River => &["ford", "bridge", "brook", "mere", "well", "bank", "wade"],
        SettlementKind::Elevation => &["crag", "peak", "hold", "watch", "tor", "fell", "cliff"],
        SettlementKind::Inland => &["field", "stead", "ton", "ham", "by", "dale", "wood"],
    }
}

fn pick<'a>(rng: &mut MapRng, items: &[&'a str]) -> &'a str {
    items[rng.index(items.len())]
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Генератор уникальных названий
pub struct NameGenerator {
    rng: MapRng,
    used: HashSet<String>,
}

impl NameGenerator {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: MapRng::for_stage(seed, Stage::Names),
            used: HashSet::new(),
        }
    }

    /// Одно название по шаблону, без проверки уникальности
    pub fn candidate(&mut self, kind: SettlementKind) -> String {
        let rng = &mut self.rng;
        if rng.chance(0.55) {
            let prefix = pick(rng, PREFIXES);
            let suffix = pick(rng, suffixes(kind));
            return format!("{prefix}{suffix}");
        }

        let syllables = rng.int_range(2, 3);
        let mut name = String::new();
        for _ in 0..syllables {
            name.push_str(pick(rng, ONSETS));
            name.push_str(pick(rng, VOWELS));
        }
        name.push_str(pick(rng, CODAS));
        if rng.chance(0.4) {
            name.push_str(pick(rng, suffixes(kind)));
        }
        capitalize(&name)
    }

    /// Уникальное название: до [`NAME_RETRIES`] попыток, затем числовой суффикс
    pub fn unique(&mut self, kind: SettlementKind) -> String {
        let mut name = self.candidate(kind);
        for _ in 1..NAME_RETRIES {
            if !self.used.contains(&name) {
                break;
            }
            name = self.candidate(kind);
        }

        if self.used.contains(&name) {
            name = self.numbered(&name);
        }

        self.used.insert(name.clone());
        name
    }

    /// Первое свободное `"{base} N"` начиная с `N = 2`
    fn numbered(&self, base: &str) -> String {
        (2..)
            .map(|n| format!("{base} {n}"))
            .find(|name| !self.used.contains(name))
            .unwrap_or_else(|| base.to_string())
    }

    /// Уже выданные названия
    #[must_use]
    pub fn used(&self) -> &HashSet<String> {
        &self.used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_capitalized_and_nonempty() {
        let mut names = NameGenerator::new(1);
        for _ in 0..200 {
            let name = names.candidate(SettlementKind::River);
            assert!(name.len() >= 3);
            assert!(name.chars().next().unwrap().is_uppercase());
        }
    }

    #[test]
    fn same_seed_same_names() {
        let mut a = NameGenerator::new(42);
        let mut b = NameGenerator::new(42);
        for kind in [SettlementKind::Shoreline, SettlementKind::Inland, SettlementKind::Elevation] {
            assert_eq!(a.unique(kind), b.unique(kind));
        }
    }

    #[test]
    fn unique_names_never_repeat() {
        let mut names = NameGenerator::new(5);
        let mut seen = HashSet::new();
        for i in 0..2000 {
            let kind = if i % 2 == 0 {
                SettlementKind::Shoreline
            } else {
                SettlementKind::Elevation
            };
            assert!(seen.insert(names.unique(kind)));
        }
        assert_eq!(names.used().len(), 2000);
    }

    #[test]
    fn taken_names_get_numeric_suffix() {
        let mut names = NameGenerator::new(9);
        names.used.insert("Stonehaven".to_string());
        names.used.insert("Stonehaven 2".to_string());
        assert_eq!(names.numbered("Stonehaven"), "Stonehaven 3");
        assert_eq!(names.numbered("Oakford"), "Oakford 2");
    }
}
