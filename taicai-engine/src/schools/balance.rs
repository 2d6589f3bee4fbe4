use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};

use taicai_db::models::{Tag, ZoneRange};

use super::{SchoolId, SchoolStrategy, ZoneOutcome};
use crate::config::{BalanceParams, EngineConfig};
use crate::stats::ZoneInput;

const BANDS: usize = 5;

/// Découpage de la zone en cinq tranches à bornes proportionnelles. Une
/// zone de moins de cinq numéros laisse des tranches vides.
fn band_of(zone: &ZoneRange, value: u8) -> usize {
    ((value - zone.min) as usize * BANDS / zone.size().max(1)).min(BANDS - 1)
}

/// Bornes incluses de la tranche, `None` si elle est vide.
fn band_bounds(zone: &ZoneRange, band: usize) -> Option<(u8, u8)> {
    let size = zone.size();
    let lo = (band * size).div_ceil(BANDS);
    let hi = ((band + 1) * size).div_ceil(BANDS);
    (lo < hi).then(|| (zone.min + lo as u8, zone.min + (hi - 1) as u8))
}

/// Tranche non vide la moins représentée sur les `window` tirages récents.
fn coldest_band(input: &ZoneInput, window: usize) -> usize {
    let mut counts = [0u32; BANDS];
    for numbers in input.recent(window) {
        for &n in numbers {
            counts[band_of(&input.zone, n)] += 1;
        }
    }
    counts
        .iter()
        .enumerate()
        .filter(|(b, _)| band_bounds(&input.zone, *b).is_some())
        .min_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(&b.0)))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Valeur AC : nombre d'écarts distincts entre paires, moins `n - 1`.
/// 0 pour une suite arithmétique, 10 au plus pour six numéros.
pub fn ac_value(set: &[u8]) -> usize {
    let mut diffs: Vec<u8> = set
        .iter()
        .enumerate()
        .flat_map(|(i, &a)| set[i + 1..].iter().map(move |&b| a.abs_diff(b)))
        .collect();
    diffs.sort_unstable();
    diffs.dedup();
    diffs.len().saturating_sub(set.len().saturating_sub(1))
}

/// 15 × |impairs − pairs| + 50 × écart relatif de la somme à la somme
/// théorique. Plus le score est bas, plus la grille est « équilibrée ».
pub fn structure_score(set: &[u8], zone: &ZoneRange, params: &BalanceParams) -> f64 {
    let odd = set.iter().filter(|&&n| n % 2 == 1).count() as f64;
    let even = set.len() as f64 - odd;
    let sum: f64 = set.iter().map(|&n| n as f64).sum();
    let expected = (zone.min as f64 + zone.max as f64) * set.len() as f64 / 2.0;
    let sum_deviation = if expected > 0.0 {
        (sum - expected).abs() / expected
    } else {
        0.0
    };
    params.parity_penalty * (odd - even).abs() + params.sum_penalty * sum_deviation
}

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceOutcome {
    pub set: Vec<u8>,
    pub score: f64,
    pub odd: usize,
    pub even: usize,
    pub sum: u32,
    pub ac: usize,
    /// Première tranche (numérotée à partir de 1) absente de la grille.
    pub dead_zone: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitShape {
    /// Au moins un chiffre répété (paire, brelan...).
    Repeated,
    AllDistinct,
}

impl DigitShape {
    pub fn of(digits: &[u8]) -> Self {
        let mut sorted = digits.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() < digits.len() {
            DigitShape::Repeated
        } else {
            DigitShape::AllDistinct
        }
    }

    fn label(&self) -> &'static str {
        match self {
            DigitShape::Repeated => "avec répétition",
            DigitShape::AllDistinct => "tous distincts",
        }
    }
}

/// Grille de dernier recours quand la recherche de forme échoue : 1, 2, ..., count.
pub fn default_digit_set(count: usize) -> Vec<u8> {
    (1..=count as u8).collect()
}

pub struct BalanceSchool<'a> {
    params: &'a BalanceParams,
}

impl<'a> BalanceSchool<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            params: &config.balance,
        }
    }

    fn random_set(&self, pool: &[u8], count: usize, repeats: bool, rng: &mut dyn RngCore) -> Vec<u8> {
        if repeats {
            (0..count)
                .filter_map(|_| pool.choose(rng).copied())
                .collect()
        } else {
            pool.choose_multiple(rng, count).copied().collect()
        }
    }

    /// Recherche Monte-Carlo de la grille au meilleur score de structure.
    pub fn search(&self, input: &ZoneInput, rng: &mut dyn RngCore) -> BalanceOutcome {
        let zone = input.zone;
        let count = zone.count;
        let full: Vec<u8> = input.candidates().collect();
        let cold = coldest_band(input, self.params.cold_zone_window);
        let without_cold: Vec<u8> = full
            .iter()
            .copied()
            .filter(|&n| band_of(&zone, n) != cold)
            .collect();

        let mut best: Option<(Vec<u8>, f64)> = None;
        for _ in 0..self.params.trials {
            let exclude = rng.random_bool(self.params.exclusion_probability.clamp(0.0, 1.0))
                && (input.repeats || without_cold.len() >= count)
                && !without_cold.is_empty();
            let pool = if exclude { &without_cold } else { &full };

            let set = self.random_set(pool, count, input.repeats, rng);
            if set.len() < count {
                continue;
            }
            let score = structure_score(&set, &zone, self.params);
            if best.as_ref().is_none_or(|(_, s)| score < *s) {
                best = Some((set, score));
            }
        }

        // Zone plus petite que la grille demandée : on rend ce qui existe.
        let (mut set, score) = best.unwrap_or_else(|| {
            let score = structure_score(&full, &zone, self.params);
            (full.clone(), score)
        });
        if !input.repeats {
            set.sort_unstable();
        }

        let odd = set.iter().filter(|&&n| n % 2 == 1).count();
        let dead_zone = (0..BANDS)
            .filter(|&b| band_bounds(&zone, b).is_some())
            .find(|&b| !set.iter().any(|&n| band_of(&zone, n) == b))
            .map(|b| b + 1);

        BalanceOutcome {
            odd,
            even: set.len() - odd,
            sum: set.iter().map(|&n| n as u32).sum(),
            ac: ac_value(&set),
            score,
            dead_zone,
            set,
        }
    }

    /// Variante des combinaisons de chiffres : vise la forme dominante des
    /// derniers tirages et une somme proche de leur moyenne.
    pub fn digit_shape_search(&self, input: &ZoneInput, rng: &mut dyn RngCore) -> ZoneOutcome {
        let count = input.zone.count;
        let recent = input.recent(self.params.digit_window);

        let repeated = recent
            .iter()
            .filter(|d| DigitShape::of(d) == DigitShape::Repeated)
            .count();
        let target = if repeated > recent.len() - repeated {
            DigitShape::Repeated
        } else {
            DigitShape::AllDistinct
        };
        let target_sum = if recent.is_empty() {
            input.zone.expected_sum().round() as i64
        } else {
            let total: u32 = recent.iter().flatten().map(|&d| d as u32).sum();
            (total as f64 / recent.len() as f64).round() as i64
        };
        let tolerance = self.params.digit_sum_tolerance as i64;

        let mut found = None;
        for _ in 0..self.params.digit_trials {
            let digits: Vec<u8> = (0..count).map(|_| rng.random_range(0..=9u8)).collect();
            let sum: i64 = digits.iter().map(|&d| d as i64).sum();
            if DigitShape::of(&digits) == target && (sum - target_sum).abs() <= tolerance {
                found = Some(digits);
                break;
            }
        }

        let mut reason = format!(
            "Forme visée : {} | somme cible {}±{}",
            target.label(),
            target_sum,
            tolerance
        );
        let mut digits = match found {
            Some(digits) => digits,
            None => {
                log::info!("Recherche de forme épuisée, grille par défaut");
                reason.push_str(" | grille par défaut");
                default_digit_set(count)
            }
        };
        digits.sort_unstable();

        ZoneOutcome {
            picks: digits.into_iter().map(|d| (d, Tag::parity(d))).collect(),
            reason,
        }
    }
}

impl SchoolStrategy for BalanceSchool<'_> {
    fn id(&self) -> SchoolId {
        SchoolId::Balance
    }

    fn select(&self, input: &ZoneInput, rng: &mut dyn RngCore) -> ZoneOutcome {
        let outcome = self.search(input, rng);
        let mut reason = format!(
            "Structure : {} impair(s) / {} pair(s) | somme {} | AC {}",
            outcome.odd, outcome.even, outcome.sum, outcome.ac
        );
        let dead = outcome
            .dead_zone
            .and_then(|band| band_bounds(&input.zone, band - 1).map(|b| (band, b)));
        if let Some((band, (lo, hi))) = dead {
            reason.push_str(&format!(" | zone morte {band} ({lo}-{hi})"));
        }
        ZoneOutcome {
            picks: outcome.set.iter().map(|&n| (n, Tag::parity(n))).collect(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::make_test_history;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use taicai_db::models::DrawRecord;

    fn lotto_input(history: &[DrawRecord]) -> ZoneInput {
        ZoneInput::from_history(history, ZoneRange::new(1, 49, 6), 0, 6, false)
    }

    fn digit_input(draws: &[[u8; 3]]) -> ZoneInput {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let history: Vec<DrawRecord> = draws
            .iter()
            .map(|d| DrawRecord::new("x", date, d.to_vec()))
            .collect();
        ZoneInput::from_history(&history, ZoneRange::new(0, 9, 3), 0, 3, true)
    }

    #[test]
    fn test_bands() {
        let zone = ZoneRange::new(1, 49, 6);
        assert_eq!(band_of(&zone, 1), 0);
        assert_eq!(band_of(&zone, 10), 0);
        assert_eq!(band_of(&zone, 11), 1);
        assert_eq!(band_of(&zone, 40), 3);
        assert_eq!(band_of(&zone, 49), 4);
        assert_eq!(band_bounds(&zone, 0), Some((1, 10)));
        assert_eq!(band_bounds(&zone, 4), Some((41, 49)));
    }

    #[test]
    fn test_small_zone_has_five_bands() {
        let zone = ZoneRange::new(1, 8, 1);
        let bounds: Vec<_> = (0..BANDS).map(|b| band_bounds(&zone, b)).collect();
        assert_eq!(
            bounds,
            vec![Some((1, 2)), Some((3, 4)), Some((5, 5)), Some((6, 7)), Some((8, 8))]
        );
        for n in 1..=8 {
            let (lo, hi) = band_bounds(&zone, band_of(&zone, n)).unwrap();
            assert!((lo..=hi).contains(&n), "{n} hors de {lo}-{hi}");
        }

        // Moins de cinq numéros : tranches vides, jamais désignées.
        let tiny = ZoneRange::new(1, 4, 1);
        assert_eq!(band_bounds(&tiny, 4), None);
        assert_eq!(coldest_band(&ZoneInput::from_history(&[], tiny, 0, 1, false), 30), 0);
    }

    #[test]
    fn test_ac_value() {
        assert_eq!(ac_value(&[1, 2, 3, 4, 5, 6]), 0);
        assert_eq!(ac_value(&[1, 2, 4, 8, 16, 32]), 10);
        // Écarts {2, 3, 5, 8, 10, 11, 13, 15} : 8 - 5.
        assert_eq!(ac_value(&[3, 5, 8, 13, 16, 18]), 3);
        assert_eq!(ac_value(&[7]), 0);
        assert_eq!(ac_value(&[]), 0);
    }

    #[test]
    fn test_structure_score() {
        let params = BalanceParams::default();
        let zone = ZoneRange::new(1, 49, 6);
        // Somme 150 = somme théorique, 2 impairs / 4 pairs.
        let balanced_sum = structure_score(&[10, 20, 30, 21, 31, 38], &zone, &params);
        assert!((balanced_sum - 30.0).abs() < 1e-10);
        // 6 impairs : 15 × 6 plus l'écart de somme.
        let all_odd = structure_score(&[1, 3, 5, 7, 9, 11], &zone, &params);
        assert!((all_odd - (90.0 + 50.0 * 114.0 / 150.0)).abs() < 1e-9);
    }

    #[test]
    fn test_coldest_band() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let history = vec![
            DrawRecord::new("2", date, vec![1, 2, 11, 12, 41, 42]),
            DrawRecord::new("1", date, vec![3, 13, 23, 43, 44, 45]),
        ];
        // Tranche 31-40 jamais sortie.
        assert_eq!(coldest_band(&lotto_input(&history), 30), 3);
    }

    #[test]
    fn test_search_returns_valid_grid() {
        let config = EngineConfig::default();
        let history = make_test_history(40, 6, 49);
        let input = lotto_input(&history);
        let mut rng = StdRng::seed_from_u64(5);
        let outcome = BalanceSchool::new(&config).search(&input, &mut rng);
        assert_eq!(outcome.set.len(), 6);
        assert!(outcome.set.windows(2).all(|w| w[0] < w[1]));
        assert!(outcome.set.iter().all(|&n| (1..=49).contains(&n)));
        assert_eq!(outcome.odd + outcome.even, 6);
        assert!(outcome.odd.abs_diff(outcome.even) <= 6);
        assert_eq!(outcome.sum, outcome.set.iter().map(|&n| n as u32).sum::<u32>());
    }

    #[test]
    fn test_search_beats_random_baseline() {
        let config = EngineConfig::default();
        let params = &config.balance;
        let zone = ZoneRange::new(1, 49, 6);
        let history = make_test_history(40, 6, 49);
        let input = lotto_input(&history);
        let mut rng = StdRng::seed_from_u64(99);
        let school = BalanceSchool::new(&config);
        let full: Vec<u8> = (1..=49).collect();

        for _ in 0..20 {
            let outcome = school.search(&input, &mut rng);
            let baseline = (0..50)
                .map(|_| {
                    let set = school.random_set(&full, 6, false, &mut rng);
                    structure_score(&set, &zone, params)
                })
                .fold(f64::MIN, f64::max);
            assert!(outcome.score <= baseline, "{} > {}", outcome.score, baseline);
            assert!((structure_score(&outcome.set, &zone, params) - outcome.score).abs() < 1e-9);
        }
    }

    #[test]
    fn test_dead_zone_reported() {
        let config = EngineConfig::default();
        let input = lotto_input(&[]);
        let mut rng = StdRng::seed_from_u64(8);
        let school = BalanceSchool::new(&config);
        // Six numéros sur cinq tranches : une tranche peut rester vide, et si
        // c'est le cas elle est signalée.
        for _ in 0..20 {
            let outcome = school.search(&input, &mut rng);
            let empty = (0..5).find(|&b| !outcome.set.iter().any(|&n| band_of(&input.zone, n) == b));
            assert_eq!(outcome.dead_zone, empty.map(|b| b + 1));
        }
        let outcome = school.select(&input, &mut rng);
        assert!(outcome.picks.iter().all(|&(n, tag)| tag == Tag::parity(n)));
        let set: Vec<u8> = outcome.picks.iter().map(|&(n, _)| n).collect();
        assert!(
            outcome.reason.contains(&format!("AC {}", ac_value(&set))),
            "{}",
            outcome.reason
        );
    }

    #[test]
    fn test_range_smaller_than_count() {
        let config = EngineConfig::default();
        let input = ZoneInput::from_history(&[], ZoneRange::new(1, 4, 6), 0, 6, false);
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = BalanceSchool::new(&config).search(&input, &mut rng);
        assert_eq!(outcome.set, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_digit_shape() {
        assert_eq!(DigitShape::of(&[1, 1, 2]), DigitShape::Repeated);
        assert_eq!(DigitShape::of(&[1, 2, 3]), DigitShape::AllDistinct);
    }

    #[test]
    fn test_digit_shape_search_hits_target() {
        let config = EngineConfig::default();
        // Répétitions dominantes, somme moyenne 10.
        let input = digit_input(&[[1, 1, 8], [3, 3, 4], [5, 5, 0], [2, 4, 4], [9, 0, 1]]);
        let mut rng = StdRng::seed_from_u64(3);
        let outcome = BalanceSchool::new(&config).digit_shape_search(&input, &mut rng);
        let digits: Vec<u8> = outcome.picks.iter().map(|&(d, _)| d).collect();
        assert_eq!(digits.len(), 3);
        assert_eq!(DigitShape::of(&digits), DigitShape::Repeated);
        let sum: i64 = digits.iter().map(|&d| d as i64).sum();
        assert!((sum - 10).abs() <= 3, "somme {sum}");
        assert!(outcome.reason.contains("somme cible 10±3"), "{}", outcome.reason);
    }

    #[test]
    fn test_digit_shape_search_fallback() {
        let mut config = EngineConfig::default();
        config.balance.digit_trials = 0;
        let input = digit_input(&[[1, 2, 3]]);
        let mut rng = StdRng::seed_from_u64(3);
        let outcome = BalanceSchool::new(&config).digit_shape_search(&input, &mut rng);
        assert_eq!(
            outcome.picks,
            vec![(1, Tag::Odd), (2, Tag::Even), (3, Tag::Odd)]
        );
        assert!(outcome.reason.contains("grille par défaut"));
    }
}
