use rand::RngCore;

use taicai_db::models::{NumberStats, Tag};

use super::{SchoolId, SchoolStrategy, Weighing, ZoneOutcome};
use crate::config::{EngineConfig, StatisticalParams};
use crate::stats::{ZoneInput, compute_stats, window_frequencies};
use crate::weights::WeightTable;

/// poids(i) = fréquence(i) + 0.5 × retard(i), plafonné. Un numéro jamais
/// sorti reçoit le retard maximal.
pub struct StatisticalSchool<'a> {
    params: &'a StatisticalParams,
    pool_ceiling: u32,
}

impl<'a> StatisticalSchool<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            params: &config.statistical,
            pool_ceiling: config.pool_ceiling,
        }
    }

    pub fn weigh(&self, input: &ZoneInput) -> Weighing {
        let stats = compute_stats(input);
        let window = self.params.hot_window.min(input.len());
        let recent = window_frequencies(input, window);

        let mut table = WeightTable::for_zone(&input.zone, 0.0);
        let mut tags = Vec::with_capacity(stats.len());
        for (stat, &recent_count) in stats.iter().zip(recent.iter()) {
            let weight = stat.frequency as f64 + self.params.recency_factor * stat.gap as f64;
            table.set(stat.number, weight.min(self.params.ceiling).max(1.0));
            tags.push(self.tag_for(stat, recent_count, window));
        }

        log::debug!(
            "Statistique : {} tirages, poids max {:.1}",
            input.len(),
            table.max_weight()
        );
        Weighing::new(
            table,
            tags,
            "Fréquence historique et rattrapage dynamique des retards".to_string(),
        )
    }

    fn tag_for(&self, stat: &NumberStats, recent_count: u32, window: usize) -> Tag {
        let p = self.params;
        if stat.gap > p.extreme_gap {
            Tag::ExtremeGap
        } else if stat.gap > p.cold_gap {
            Tag::Cold(stat.gap)
        } else if window > 0 && recent_count as f64 > window as f64 * p.hot_ratio {
            Tag::Hot
        } else if stat.gap > p.makeup_gap {
            Tag::Makeup
        } else {
            Tag::Normal
        }
    }
}

impl SchoolStrategy for StatisticalSchool<'_> {
    fn id(&self) -> SchoolId {
        SchoolId::Statistical
    }

    fn select(&self, input: &ZoneInput, rng: &mut dyn RngCore) -> ZoneOutcome {
        self.weigh(input).draw(input, self.pool_ceiling, rng)
    }
}
