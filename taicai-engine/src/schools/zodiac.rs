use chrono::{Datelike, NaiveDate};
use rand::{Rng, RngCore};

use taicai_db::models::Tag;
use taicai_db::profile::UserProfile;

use super::{SchoolId, SchoolStrategy, Weighing, ZoneOutcome};
use crate::config::{EngineConfig, ZodiacParams};
use crate::stats::ZoneInput;
use crate::weights::WeightTable;

/// Numéro dérivé du nom : (nombre de caractères × 7) mod max, 1 si nul.
pub fn name_number(name: &str, max: u8) -> Option<u8> {
    let chars = name.trim().chars().count();
    if chars == 0 || max == 0 {
        return None;
    }
    let n = (chars * 7) % max as usize;
    Some(if n == 0 { 1 } else { n as u8 })
}

/// Pondération par les finales porte-bonheur du mois. L'historique n'est
/// pas consulté.
pub struct ZodiacSchool<'a> {
    params: &'a ZodiacParams,
    pool_ceiling: u32,
    profile: Option<&'a UserProfile>,
    today: NaiveDate,
}

impl<'a> ZodiacSchool<'a> {
    pub fn new(config: &'a EngineConfig, profile: Option<&'a UserProfile>, today: NaiveDate) -> Self {
        Self {
            params: &config.zodiac,
            pool_ceiling: config.pool_ceiling,
            profile,
            today,
        }
    }

    /// Poids avant bruit, étiquettes et motif.
    pub fn base_weighing(&self, input: &ZoneInput) -> Weighing {
        let p = self.params;
        let mut table = WeightTable::for_zone(&input.zone, p.base);
        let mut tags = vec![Tag::Fortune; table.len()];

        let lucky = self.profile.and_then(|prof| prof.lucky_tails(self.today.month()));
        let mut reason = match &lucky {
            Some(tails) => {
                let shown = tails.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ");
                format!("Finales porte-bonheur du mois {} : {shown}", self.today.month())
            }
            None => {
                log::info!("Aucune prévision pour le mois {}, repli sur le jour", self.today.month());
                format!("Fortune aléatoire (repli) : finale du jour {}", self.today.day() % 10)
            }
        };

        for (i, n) in input.candidates().enumerate() {
            match &lucky {
                Some(tails) if tails.contains(&(n % 10)) => {
                    table.add(n, p.lucky_bonus);
                    tags[i] = Tag::Lucky;
                }
                None if (n % 10) as u32 == self.today.day() % 10 => {
                    table.add(n, p.day_bonus);
                    tags[i] = Tag::DailyLuck;
                }
                _ => {}
            }
        }

        let name = self
            .profile
            .and_then(|prof| prof.real_name.as_deref())
            .and_then(|name| name_number(name, input.zone.max));
        if let Some(n) = name.filter(|&n| input.zone.contains(n)) {
            table.add(n, p.name_bonus);
            tags[(n - input.zone.min) as usize] = Tag::NameNumber;
            reason.push_str(&format!(" | nombre du nom {n}"));
        }

        Weighing::new(table, tags, reason)
    }

    pub fn weigh(&self, input: &ZoneInput, rng: &mut dyn RngCore) -> Weighing {
        let mut weighing = self.base_weighing(input);
        let jitter = self.params.jitter;
        if jitter > 0.0 {
            weighing
                .table
                .map(|_, w| w * rng.random_range((1.0 - jitter)..=(1.0 + jitter)));
        }
        weighing
    }
}

impl SchoolStrategy for ZodiacSchool<'_> {
    fn id(&self) -> SchoolId {
        SchoolId::Zodiac
    }

    fn select(&self, input: &ZoneInput, rng: &mut dyn RngCore) -> ZoneOutcome {
        self.weigh(input, rng).draw(input, self.pool_ceiling, rng)
    }
}
