use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Fiche d'un joueur. Les champs astrologiques sont du texte libre ; le
/// moteur ne lit que `fortune.monthly_elements`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default, alias = "name")]
    pub display_name: String,
    #[serde(default, alias = "realname", skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,
    #[serde(default, alias = "ziwei")]
    pub purple_star: String,
    #[serde(default, alias = "astro")]
    pub astrology: String,
    #[serde(
        default,
        rename = "fortune2025",
        deserialize_with = "lenient_fortune",
        skip_serializing_if = "Option::is_none"
    )]
    pub fortune: Option<Fortune>,
}

/// Prévisions annuelles produites par le service de texte génératif.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fortune {
    #[serde(default, alias = "year_analysis", alias = "yearSummary")]
    pub year_summary: String,
    #[serde(default, alias = "monthlyElements")]
    pub monthly_elements: Vec<MonthlyElements>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyElements {
    pub month: u32,
    #[serde(default, alias = "luckyTails")]
    pub lucky_tails: Vec<u8>,
    #[serde(default, alias = "luckyElements")]
    pub lucky_elements: Vec<String>,
}

impl UserProfile {
    /// Finales porte-bonheur du mois, filtrées sur 0-9. `None` si la fiche
    /// ne porte aucune donnée exploitable pour ce mois.
    pub fn lucky_tails(&self, month: u32) -> Option<Vec<u8>> {
        let entry = self
            .fortune
            .as_ref()?
            .monthly_elements
            .iter()
            .find(|m| m.month == month)?;
        let mut tails: Vec<u8> = entry.lucky_tails.iter().copied().filter(|&t| t <= 9).collect();
        tails.sort_unstable();
        tails.dedup();
        if tails.is_empty() { None } else { Some(tails) }
    }
}

// Un bloc de prévisions mal formé vaut absence de prévisions.
fn lenient_fortune<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Fortune>, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    match serde_json::from_value::<Fortune>(raw) {
        Ok(fortune) => Ok(Some(fortune)),
        Err(e) => {
            log::debug!("Prévisions ignorées (format invalide) : {e}");
            Ok(None)
        }
    }
}

pub fn load_profiles(path: &Path) -> Result<Vec<UserProfile>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    let profiles: Vec<UserProfile> = serde_json::from_str(&json)
        .with_context(|| format!("Fichier de profils invalide {:?}", path))?;
    Ok(profiles)
}

pub fn save_profiles(profiles: &[UserProfile], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let json = serde_json::to_string_pretty(profiles)?;
    std::fs::write(path, json).with_context(|| format!("Impossible d'écrire {:?}", path))?;
    Ok(())
}
