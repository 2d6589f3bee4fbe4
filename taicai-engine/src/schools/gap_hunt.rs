use rand::RngCore;

use taicai_db::models::Tag;

use super::{Weighing, ZoneOutcome};
use crate::config::{EngineConfig, GapHuntParams};
use crate::stats::{ZoneInput, compute_stats};
use crate::weights::WeightTable;

/// Variante « chasse aux retards » de l'école statistique, appliquée à la
/// zone secondaire des jeux à deux zones : seuls les retards comptent.
pub struct GapHunt<'a> {
    params: &'a GapHuntParams,
    pool_ceiling: u32,
}

impl<'a> GapHunt<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            params: &config.gap_hunt,
            pool_ceiling: config.pool_ceiling,
        }
    }

    pub fn weigh(&self, input: &ZoneInput) -> Weighing {
        let p = self.params;
        let mut table = WeightTable::for_zone(&input.zone, p.base);
        let mut tags = Vec::with_capacity(table.len());
        let mut extreme = Vec::new();

        for stat in compute_stats(input) {
            let tag = if stat.gap > p.extreme_gap {
                table.add(stat.number, p.extreme_bonus);
                extreme.push(stat.number);
                Tag::ExtremeGap
            } else if stat.gap > p.cold_gap {
                table.add(stat.number, p.cold_bonus);
                Tag::Makeup
            } else {
                Tag::Normal
            };
            tags.push(tag);
        }

        let reason = if extreme.is_empty() {
            "Retards de la zone 2".to_string()
        } else {
            let shown = extreme.iter().map(|n| format!("{n:02}")).collect::<Vec<_>>().join(", ");
            format!("Rattrapage des retards extrêmes : {shown}")
        };
        Weighing::new(table, tags, reason)
    }

    pub fn select(&self, input: &ZoneInput, rng: &mut dyn RngCore) -> ZoneOutcome {
        self.weigh(input).draw(input, self.pool_ceiling, rng)
    }
}
