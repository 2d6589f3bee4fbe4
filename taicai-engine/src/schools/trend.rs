use rand::RngCore;

use taicai_db::models::Tag;

use super::{SchoolId, SchoolStrategy, Weighing, ZoneOutcome};
use crate::config::{EngineConfig, TrendParams};
use crate::stats::ZoneInput;
use crate::weights::WeightTable;

/// Décroissance temporelle : chaque apparition à l'âge `t` (0 = dernier
/// tirage) rapporte K / (t + C) au numéro.
pub struct TrendSchool<'a> {
    params: &'a TrendParams,
    pool_ceiling: u32,
}

impl<'a> TrendSchool<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            params: &config.trend,
            pool_ceiling: config.pool_ceiling,
        }
    }

    pub fn momentum(&self, input: &ZoneInput) -> WeightTable {
        let mut table = WeightTable::for_zone(&input.zone, 0.0);
        for (age, numbers) in input.draws.iter().enumerate() {
            let contribution = self.params.k / (age as f64 + self.params.c);
            for &n in numbers {
                table.add(n, contribution);
            }
        }
        table
    }

    /// Les étiquettes suivent l'élan brut, la table est planchée à 1.
    pub fn weigh(&self, input: &ZoneInput) -> Weighing {
        let mut table = self.momentum(input);
        let max = table.max_weight();
        let tags = table
            .iter()
            .map(|(_, w)| {
                let score = if max > 0.0 {
                    (w / max * 100.0).round() as u8
                } else {
                    0
                };
                Tag::Trend(score)
            })
            .collect();
        table.map(|_, w| w.max(1.0));
        Weighing::new(table, tags, "Pondération temporelle décroissante".to_string())
    }
}

impl SchoolStrategy for TrendSchool<'_> {
    fn id(&self) -> SchoolId {
        SchoolId::Trend
    }

    fn select(&self, input: &ZoneInput, rng: &mut dyn RngCore) -> ZoneOutcome {
        self.weigh(input).draw(input, self.pool_ceiling, rng)
    }
}
