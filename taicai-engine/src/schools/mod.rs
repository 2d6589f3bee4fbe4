pub mod balance;
pub mod gap_hunt;
pub mod pattern;
pub mod statistical;
pub mod trend;
pub mod zodiac;

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use taicai_db::models::Tag;
use taicai_db::profile::UserProfile;

use crate::config::EngineConfig;
use crate::sampler::sample;
use crate::stats::ZoneInput;
use crate::weights::WeightTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchoolId {
    Statistical,
    Pattern,
    Balance,
    Trend,
    Zodiac,
}

impl SchoolId {
    pub const ALL: [SchoolId; 5] = [
        SchoolId::Statistical,
        SchoolId::Pattern,
        SchoolId::Balance,
        SchoolId::Trend,
        SchoolId::Zodiac,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchoolId::Statistical => "stat",
            SchoolId::Pattern => "pattern",
            SchoolId::Balance => "balance",
            SchoolId::Trend => "ai",
            SchoolId::Zodiac => "wuxing",
        }
    }
}

impl fmt::Display for SchoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchoolId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "stat" | "statistical" | "統計" => Ok(SchoolId::Statistical),
            "pattern" | "關聯" => Ok(SchoolId::Pattern),
            "balance" | "平衡" => Ok(SchoolId::Balance),
            "ai" | "trend" => Ok(SchoolId::Trend),
            "wuxing" | "zodiac" | "五行" => Ok(SchoolId::Zodiac),
            other => bail!(
                "École inconnue : '{other}' (attendu : stat, pattern, balance, ai, wuxing)"
            ),
        }
    }
}

/// Numéros retenus pour une zone, avec leur justification, et le motif
/// d'ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneOutcome {
    pub picks: Vec<(u8, Tag)>,
    pub reason: String,
}

/// Table de poids accompagnée de l'étiquette de chaque candidat.
#[derive(Debug, Clone)]
pub struct Weighing {
    pub table: WeightTable,
    tags: Vec<Tag>,
    pub reason: String,
}

impl Weighing {
    pub fn new(table: WeightTable, tags: Vec<Tag>, reason: String) -> Self {
        debug_assert_eq!(table.len(), tags.len());
        Self { table, tags, reason }
    }

    pub fn tag(&self, value: u8) -> Tag {
        if !self.table.contains(value) {
            return Tag::Normal;
        }
        self.tags
            .get((value - self.table.min()) as usize)
            .copied()
            .unwrap_or(Tag::Normal)
    }

    pub fn draw(&self, input: &ZoneInput, pool_ceiling: u32, rng: &mut dyn RngCore) -> ZoneOutcome {
        let values = sample(&self.table, input.zone.count, input.repeats, pool_ceiling, rng);
        ZoneOutcome {
            picks: values.into_iter().map(|v| (v, self.tag(v))).collect(),
            reason: self.reason.clone(),
        }
    }
}

pub trait SchoolStrategy {
    fn id(&self) -> SchoolId;
    /// `input.draws[0]` = tirage le plus récent.
    fn select(&self, input: &ZoneInput, rng: &mut dyn RngCore) -> ZoneOutcome;
}

/// Arguments empruntés pour la durée d'un appel.
#[derive(Debug, Clone, Copy)]
pub struct SchoolContext<'a> {
    pub config: &'a EngineConfig,
    pub profile: Option<&'a UserProfile>,
    pub today: NaiveDate,
}

pub fn school_for<'a>(id: SchoolId, ctx: &SchoolContext<'a>) -> Box<dyn SchoolStrategy + 'a> {
    match id {
        SchoolId::Statistical => Box::new(statistical::StatisticalSchool::new(ctx.config)),
        SchoolId::Pattern => Box::new(pattern::PatternSchool::new(ctx.config)),
        SchoolId::Balance => Box::new(balance::BalanceSchool::new(ctx.config)),
        SchoolId::Trend => Box::new(trend::TrendSchool::new(ctx.config)),
        SchoolId::Zodiac => Box::new(zodiac::ZodiacSchool::new(ctx.config, ctx.profile, ctx.today)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_school_id_parsing() {
        assert_eq!("stat".parse::<SchoolId>().unwrap(), SchoolId::Statistical);
        assert_eq!("AI".parse::<SchoolId>().unwrap(), SchoolId::Trend);
        assert_eq!("五行".parse::<SchoolId>().unwrap(), SchoolId::Zodiac);
        for id in SchoolId::ALL {
            assert_eq!(id.as_str().parse::<SchoolId>().unwrap(), id);
        }
    }

    #[test]
    fn test_unknown_school_is_named() {
        let err = "astrology".parse::<SchoolId>().unwrap_err();
        assert!(err.to_string().contains("astrology"), "message: {err}");
    }

    #[test]
    fn test_school_for_matches_id() {
        let config = EngineConfig::default();
        let ctx = SchoolContext {
            config: &config,
            profile: None,
            today: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        };
        for id in SchoolId::ALL {
            assert_eq!(school_for(id, &ctx).id(), id);
        }
    }

    #[test]
    fn test_weighing_tag_lookup() {
        let table = WeightTable::uniform(1, 3, 1.0);
        let weighing = Weighing::new(table, vec![Tag::Hot, Tag::Normal, Tag::Makeup], String::new());
        assert_eq!(weighing.tag(1), Tag::Hot);
        assert_eq!(weighing.tag(3), Tag::Makeup);
        assert_eq!(weighing.tag(9), Tag::Normal);
    }
}
