use rand::RngCore;

use taicai_db::models::Tag;

use super::statistical::StatisticalSchool;
use super::{SchoolId, SchoolStrategy, Weighing, ZoneOutcome};
use crate::config::{EngineConfig, PatternParams};
use crate::stats::ZoneInput;
use crate::weights::WeightTable;

/// Finale la plus fréquente sur les `window` tirages récents (la plus
/// petite en cas d'égalité), `None` si aucun numéro n'y figure.
pub fn hot_tail(input: &ZoneInput, window: usize) -> Option<u8> {
    let mut counts = [0u32; 10];
    for numbers in input.recent(window) {
        for &n in numbers {
            counts[(n % 10) as usize] += 1;
        }
    }
    let (tail, &count) = counts
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))?;
    if count == 0 { None } else { Some(tail as u8) }
}

/// Effet de traîne : chaque fois qu'un tirage passé partage des numéros
/// avec le dernier tirage, les numéros du tirage qui l'a suivi reçoivent
/// autant de points que de numéros partagés. Retourne (points, premier
/// numéro déclencheur) par candidat, indexés depuis `zone.min`.
pub fn drag_relations(input: &ZoneInput) -> (Vec<u32>, Vec<Option<u8>>) {
    let size = input.zone.size();
    let mut points = vec![0u32; size];
    let mut relation: Vec<Option<u8>> = vec![None; size];
    let last = input.latest();

    for i in 1..input.len() {
        let shared: Vec<u8> = input.draws[i]
            .iter()
            .copied()
            .filter(|n| last.contains(n))
            .collect();
        let Some(&trigger) = shared.first() else {
            continue;
        };
        for &n in &input.draws[i - 1] {
            let idx = (n - input.zone.min) as usize;
            if idx < size {
                points[idx] += shared.len() as u32;
                relation[idx].get_or_insert(trigger);
            }
        }
    }

    (points, relation)
}

pub struct PatternSchool<'a> {
    config: &'a EngineConfig,
    params: &'a PatternParams,
}

impl<'a> PatternSchool<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            config,
            params: &config.pattern,
        }
    }

    pub fn weigh(&self, input: &ZoneInput) -> Weighing {
        let tail = hot_tail(input, self.params.tail_window);
        let (points, relation) = drag_relations(input);
        let last = input.latest();

        let mut table = WeightTable::for_zone(&input.zone, self.params.base);
        let mut tags = Vec::with_capacity(table.len());
        for (i, n) in input.candidates().enumerate() {
            let shares_tail = tail == Some(n % 10);
            if shares_tail {
                table.add(n, self.params.tail_bonus);
            }
            table.add(n, self.params.drag_factor * points[i] as f64);

            let tag = match relation[i] {
                Some(trigger) => Tag::DraggedBy(trigger),
                None if shares_tail => Tag::HotTail(n % 10),
                None if last.contains(&n) => Tag::CarriedOver,
                None => Tag::Pattern,
            };
            tags.push(tag);
        }

        let shown = last
            .iter()
            .take(3)
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let reason = match tail {
            Some(t) => format!("Traîne du tirage précédent [{shown}] + finales en {t}"),
            None => format!("Traîne du tirage précédent [{shown}]"),
        };
        Weighing::new(table, tags, reason)
    }
}

impl SchoolStrategy for PatternSchool<'_> {
    fn id(&self) -> SchoolId {
        SchoolId::Pattern
    }

    fn select(&self, input: &ZoneInput, rng: &mut dyn RngCore) -> ZoneOutcome {
        if input.len() < 2 {
            log::info!(
                "Relations : {} tirage(s) seulement, repli sur l'école statistique",
                input.len()
            );
            return StatisticalSchool::new(self.config).select(input, rng);
        }
        self.weigh(input).draw(input, self.config.pool_ceiling, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use taicai_db::models::{DrawRecord, ZoneRange};

    fn input_of(draws: &[&[u8]]) -> ZoneInput {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let history: Vec<DrawRecord> = draws
            .iter()
            .map(|d| DrawRecord::new("x", date, d.to_vec()))
            .collect();
        ZoneInput::from_history(&history, ZoneRange::new(1, 39, 5), 0, 5, false)
    }

    #[test]
    fn test_hot_tail() {
        let input = input_of(&[&[7, 17, 27, 1, 2], &[37, 3, 4, 5, 6]]);
        assert_eq!(hot_tail(&input, 10), Some(7));
        assert_eq!(hot_tail(&input_of(&[]), 10), None);
    }

    #[test]
    fn test_hot_tail_tie_prefers_smallest() {
        let input = input_of(&[&[2, 12, 5, 15, 9]]);
        assert_eq!(hot_tail(&input, 10), Some(2));
    }

    #[test]
    fn test_drag_relations() {
        // Le tirage 2 partage 10 et 20 avec le dernier : le tirage 1, qui l'a
        // suivi, reçoit 2 points par numéro, déclencheur 10.
        let input = input_of(&[
            &[10, 20, 30, 31, 32],
            &[1, 2, 3, 4, 5],
            &[10, 20, 33, 34, 35],
        ]);
        let (points, relation) = drag_relations(&input);
        assert_eq!(points[0], 2);
        assert_eq!(relation[0], Some(10));
        assert_eq!(points[32], 0);
        assert_eq!(relation[32], None);
    }

    #[test]
    fn test_tags() {
        let input = input_of(&[
            &[10, 20, 30, 31, 32],
            &[1, 2, 3, 4, 5],
            &[10, 20, 33, 34, 35],
        ]);
        let config = EngineConfig::default();
        let weighing = PatternSchool::new(&config).weigh(&input);
        assert_eq!(weighing.tag(1), Tag::DraggedBy(10));
        // Finale 0 dominante : 10, 20, 30 + 10, 20.
        assert_eq!(weighing.tag(39), Tag::Pattern);
        assert_eq!(weighing.tag(31), Tag::CarriedOver);
        assert_eq!(weighing.tag(30), Tag::HotTail(0));
    }

    #[test]
    fn test_weights() {
        let input = input_of(&[
            &[10, 20, 30, 31, 32],
            &[1, 2, 3, 4, 5],
            &[10, 20, 33, 34, 35],
        ]);
        let config = EngineConfig::default();
        let weighing = PatternSchool::new(&config).weigh(&input);
        assert!((weighing.table.get(39) - 10.0).abs() < 1e-10);
        assert!((weighing.table.get(30) - 50.0).abs() < 1e-10);
        assert!((weighing.table.get(1) - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_short_history_matches_statistical() {
        let config = EngineConfig::default();
        for draws in [vec![], vec![&[1u8, 2, 3, 4, 5][..]]] {
            let input = input_of(&draws);
            let mut rng_a = StdRng::seed_from_u64(11);
            let mut rng_b = StdRng::seed_from_u64(11);
            let pattern = PatternSchool::new(&config).select(&input, &mut rng_a);
            let stat = StatisticalSchool::new(&config).select(&input, &mut rng_b);
            assert_eq!(pattern, stat);
        }
    }
}
