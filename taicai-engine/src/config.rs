use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticalParams {
    /// Plafond appliqué à chaque poids pour borner le biais d'échantillonnage.
    pub ceiling: f64,
    pub recency_factor: f64,
    pub hot_window: usize,
    pub hot_ratio: f64,
    pub extreme_gap: u32,
    pub cold_gap: u32,
    pub makeup_gap: u32,
}

impl Default for StatisticalParams {
    fn default() -> Self {
        Self {
            ceiling: 500.0,
            recency_factor: 0.5,
            hot_window: 30,
            hot_ratio: 0.2,
            extreme_gap: 30,
            cold_gap: 15,
            makeup_gap: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternParams {
    pub base: f64,
    pub tail_window: usize,
    pub tail_bonus: f64,
    pub drag_factor: f64,
}

impl Default for PatternParams {
    fn default() -> Self {
        Self {
            base: 10.0,
            tail_window: 10,
            tail_bonus: 40.0,
            drag_factor: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceParams {
    pub trials: usize,
    pub cold_zone_window: usize,
    pub exclusion_probability: f64,
    pub parity_penalty: f64,
    pub sum_penalty: f64,
    pub digit_window: usize,
    pub digit_sum_tolerance: u32,
    pub digit_trials: usize,
}

impl Default for BalanceParams {
    fn default() -> Self {
        Self {
            trials: 500,
            cold_zone_window: 30,
            exclusion_probability: 0.5,
            parity_penalty: 15.0,
            sum_penalty: 50.0,
            digit_window: 10,
            digit_sum_tolerance: 3,
            digit_trials: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendParams {
    pub k: f64,
    pub c: f64,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self { k: 100.0, c: 5.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZodiacParams {
    pub base: f64,
    pub lucky_bonus: f64,
    pub day_bonus: f64,
    pub name_bonus: f64,
    /// Amplitude du bruit multiplicatif : chaque poids est multiplié par 1 ± jitter.
    pub jitter: f64,
}

impl Default for ZodiacParams {
    fn default() -> Self {
        Self {
            base: 10.0,
            lucky_bonus: 50.0,
            day_bonus: 20.0,
            name_bonus: 60.0,
            jitter: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GapHuntParams {
    pub base: f64,
    pub extreme_gap: u32,
    pub extreme_bonus: f64,
    pub cold_gap: u32,
    pub cold_bonus: f64,
}

impl Default for GapHuntParams {
    fn default() -> Self {
        Self {
            base: 10.0,
            extreme_gap: 30,
            extreme_bonus: 500.0,
            cold_gap: 15,
            cold_bonus: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Nombre maximal d'exemplaires d'un candidat dans l'urne d'échantillonnage.
    pub pool_ceiling: u32,
    pub statistical: StatisticalParams,
    pub pattern: PatternParams,
    pub balance: BalanceParams,
    pub trend: TrendParams,
    pub zodiac: ZodiacParams,
    pub gap_hunt: GapHuntParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pool_ceiling: 1000,
            statistical: StatisticalParams::default(),
            pattern: PatternParams::default(),
            balance: BalanceParams::default(),
            trend: TrendParams::default(),
            zodiac: ZodiacParams::default(),
            gap_hunt: GapHuntParams::default(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire la configuration {:?}", path))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("Configuration invalide {:?}", path))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Impossible d'écrire la configuration {:?}", path))?;
        Ok(())
    }
}
