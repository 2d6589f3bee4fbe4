use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Un tirage historique. Les historiques sont toujours ordonnés du plus
/// récent au plus ancien : l'indice 0 est le dernier tirage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRecord {
    #[serde(deserialize_with = "period_from_any")]
    pub period: String,
    pub date: NaiveDate,
    pub numbers: Vec<u8>,
}

impl DrawRecord {
    pub fn new(period: impl Into<String>, date: NaiveDate, numbers: Vec<u8>) -> Self {
        Self {
            period: period.into(),
            date,
            numbers,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PeriodRepr {
    Text(String),
    Number(u64),
}

fn period_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match PeriodRepr::deserialize(deserializer)? {
        PeriodRepr::Text(s) => s,
        PeriodRepr::Number(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRange {
    pub min: u8,
    pub max: u8,
    pub count: usize,
}

impl ZoneRange {
    pub const fn new(min: u8, max: u8, count: usize) -> Self {
        Self { min, max, count }
    }

    pub fn size(&self) -> usize {
        (self.max as usize + 1).saturating_sub(self.min as usize)
    }

    pub fn contains(&self, value: u8) -> bool {
        value >= self.min && value <= self.max
    }

    /// Somme théorique d'une grille tirée uniformément : (min + max) × count / 2.
    pub fn expected_sum(&self) -> f64 {
        (self.min as f64 + self.max as f64) * self.count as f64 / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubMode {
    Straight,
    Group,
    Pair,
}

impl SubMode {
    pub fn pick_count(&self, positions: usize) -> usize {
        match self {
            SubMode::Straight | SubMode::Group => positions,
            SubMode::Pair => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubMode::Straight => "straight",
            SubMode::Group => "group",
            SubMode::Pair => "pair",
        }
    }
}

impl fmt::Display for SubMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "straight" | "direct" | "正彩" => Ok(SubMode::Straight),
            "group" | "組彩" => Ok(SubMode::Group),
            "pair" | "對彩" => Ok(SubMode::Pair),
            other => bail!("Mode de jeu inconnu : '{other}' (attendu : straight, group, pair)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameShape {
    /// Une seule urne sans remise, le numéro spécial éventuel suit les `count` boules.
    SingleZone { primary: ZoneRange },
    /// Deux urnes indépendantes, la zone 2 suit les boules de la zone 1.
    DualZone {
        primary: ZoneRange,
        secondary: ZoneRange,
    },
    /// Chiffres 0-9 par position, répétitions permises.
    Digit {
        positions: usize,
        sub_modes: Vec<SubMode>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDefinition {
    pub id: GameId,
    pub shape: GameShape,
}

impl GameDefinition {
    /// Nombre minimal de numéros qu'un tirage valide doit porter.
    pub fn record_len(&self) -> usize {
        match &self.shape {
            GameShape::SingleZone { primary } => primary.count,
            GameShape::DualZone { primary, secondary } => primary.count + secondary.count,
            GameShape::Digit { positions, .. } => *positions,
        }
    }

    pub fn supports(&self, mode: SubMode) -> bool {
        match &self.shape {
            GameShape::Digit { sub_modes, .. } => sub_modes.contains(&mode),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameId {
    Lotto649,
    SuperLotto638,
    DailyCash539,
    ThreeStar,
    FourStar,
}

impl GameId {
    pub const ALL: [GameId; 5] = [
        GameId::Lotto649,
        GameId::SuperLotto638,
        GameId::DailyCash539,
        GameId::ThreeStar,
        GameId::FourStar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameId::Lotto649 => "lotto649",
            GameId::SuperLotto638 => "superlotto638",
            GameId::DailyCash539 => "dailycash539",
            GameId::ThreeStar => "3d",
            GameId::FourStar => "4d",
        }
    }

    /// Libellé officiel, utilisé comme clé dans les fichiers publiés.
    pub fn label(&self) -> &'static str {
        match self {
            GameId::Lotto649 => "大樂透",
            GameId::SuperLotto638 => "威力彩",
            GameId::DailyCash539 => "今彩539",
            GameId::ThreeStar => "3星彩",
            GameId::FourStar => "4星彩",
        }
    }

    pub fn definition(&self) -> GameDefinition {
        let shape = match self {
            GameId::Lotto649 => GameShape::SingleZone {
                primary: ZoneRange::new(1, 49, 6),
            },
            GameId::SuperLotto638 => GameShape::DualZone {
                primary: ZoneRange::new(1, 38, 6),
                secondary: ZoneRange::new(1, 8, 1),
            },
            GameId::DailyCash539 => GameShape::SingleZone {
                primary: ZoneRange::new(1, 39, 5),
            },
            GameId::ThreeStar => GameShape::Digit {
                positions: 3,
                sub_modes: vec![SubMode::Straight, SubMode::Group, SubMode::Pair],
            },
            GameId::FourStar => GameShape::Digit {
                positions: 4,
                sub_modes: vec![SubMode::Straight, SubMode::Group],
            },
        };
        GameDefinition { id: *self, shape }
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GameId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "lotto649" | "lotto" | "大樂透" => Ok(GameId::Lotto649),
            "superlotto638" | "superlotto" | "power" | "威力彩" => Ok(GameId::SuperLotto638),
            "dailycash539" | "dailycash" | "539" | "今彩539" => Ok(GameId::DailyCash539),
            "3d" | "3star" | "3星彩" => Ok(GameId::ThreeStar),
            "4d" | "4star" | "4星彩" => Ok(GameId::FourStar),
            other => bail!("Jeu inconnu : '{other}'"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NumberStats {
    pub number: u8,
    pub frequency: u32,
    pub gap: u32,
}

/// Justification courte attachée à un numéro retenu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    ExtremeGap,
    Cold(u32),
    Hot,
    Makeup,
    Normal,
    DraggedBy(u8),
    HotTail(u8),
    CarriedOver,
    Pattern,
    Odd,
    Even,
    Trend(u8),
    Lucky,
    DailyLuck,
    NameNumber,
    Fortune,
    Wheel,
}

impl Tag {
    pub fn parity(value: u8) -> Tag {
        if value % 2 == 0 { Tag::Even } else { Tag::Odd }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::ExtremeGap => write!(f, "EXTREME GAP"),
            Tag::Cold(gap) => write!(f, "COLD {gap}"),
            Tag::Hot => write!(f, "HOT"),
            Tag::Makeup => write!(f, "MAKEUP"),
            Tag::Normal => write!(f, "-"),
            Tag::DraggedBy(n) => write!(f, "DRAG {n:02}"),
            Tag::HotTail(t) => write!(f, "TAIL {t}"),
            Tag::CarriedOver => write!(f, "REPEAT"),
            Tag::Pattern => write!(f, "PATTERN"),
            Tag::Odd => write!(f, "ODD"),
            Tag::Even => write!(f, "EVEN"),
            Tag::Trend(score) => write!(f, "TREND {score}"),
            Tag::Lucky => write!(f, "LUCKY"),
            Tag::DailyLuck => write!(f, "DAY"),
            Tag::NameNumber => write!(f, "NAME"),
            Tag::Fortune => write!(f, "FORTUNE"),
            Tag::Wheel => write!(f, "WHEEL"),
        }
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedNumber {
    pub value: u8,
    pub tag: Tag,
    pub zone: ZoneKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionResult {
    pub numbers: Vec<TaggedNumber>,
    pub group_reason: String,
}

impl PredictionResult {
    pub fn values(&self) -> Vec<u8> {
        self.numbers.iter().map(|n| n.value).collect()
    }

    pub fn zone_values(&self, zone: ZoneKind) -> Vec<u8> {
        self.numbers
            .iter()
            .filter(|n| n.zone == zone)
            .map(|n| n.value)
            .collect()
    }
}

fn validate_zone(numbers: &[u8], zone: &ZoneRange, label: &str) -> Result<()> {
    for &n in numbers {
        if !zone.contains(n) {
            bail!("{label} {n} hors limites ({}-{})", zone.min, zone.max);
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                bail!("{label} en double : {}", numbers[i]);
            }
        }
    }
    Ok(())
}

pub fn validate_draw(game: &GameDefinition, numbers: &[u8]) -> Result<()> {
    let expected = game.record_len();
    match &game.shape {
        GameShape::SingleZone { primary } => {
            // Le numéro spécial éventuel suit les boules.
            if numbers.len() != expected && numbers.len() != expected + 1 {
                bail!(
                    "{} : {} numéros attendus (+1 spécial), {} reçus",
                    game.id, expected, numbers.len()
                );
            }
            validate_zone(numbers, primary, "Boule")?;
        }
        GameShape::DualZone { primary, secondary } => {
            if numbers.len() != expected {
                bail!("{} : {} numéros attendus, {} reçus", game.id, expected, numbers.len());
            }
            validate_zone(&numbers[..primary.count], primary, "Boule")?;
            validate_zone(&numbers[primary.count..], secondary, "Numéro zone 2")?;
        }
        GameShape::Digit { positions, .. } => {
            if numbers.len() != *positions {
                bail!("{} : {} chiffres attendus, {} reçus", game.id, positions, numbers.len());
            }
            if let Some(&d) = numbers.iter().find(|&&d| d > 9) {
                bail!("Chiffre {d} hors limites (0-9)");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_draw_ok() {
        let lotto = GameId::Lotto649.definition();
        assert!(validate_draw(&lotto, &[1, 2, 3, 4, 5, 49]).is_ok());
        assert!(validate_draw(&lotto, &[1, 2, 3, 4, 5, 6, 7]).is_ok());
        let power = GameId::SuperLotto638.definition();
        assert!(validate_draw(&power, &[1, 2, 3, 4, 5, 38, 8]).is_ok());
        let three = GameId::ThreeStar.definition();
        assert!(validate_draw(&three, &[0, 0, 9]).is_ok());
    }

    #[test]
    fn test_validate_draw_out_of_range() {
        let lotto = GameId::Lotto649.definition();
        assert!(validate_draw(&lotto, &[0, 2, 3, 4, 5, 6]).is_err());
        assert!(validate_draw(&lotto, &[1, 2, 3, 4, 5, 50]).is_err());
        let power = GameId::SuperLotto638.definition();
        assert!(validate_draw(&power, &[1, 2, 3, 4, 5, 6, 9]).is_err());
        let four = GameId::FourStar.definition();
        assert!(validate_draw(&four, &[1, 2, 3, 10]).is_err());
    }

    #[test]
    fn test_validate_draw_duplicates() {
        let cash = GameId::DailyCash539.definition();
        assert!(validate_draw(&cash, &[1, 1, 3, 4, 5]).is_err());
        // Les répétitions sont normales pour les jeux de chiffres.
        let three = GameId::ThreeStar.definition();
        assert!(validate_draw(&three, &[7, 7, 7]).is_ok());
    }

    #[test]
    fn test_validate_draw_wrong_length() {
        let power = GameId::SuperLotto638.definition();
        assert!(validate_draw(&power, &[1, 2, 3, 4, 5, 6]).is_err());
        let three = GameId::ThreeStar.definition();
        assert!(validate_draw(&three, &[1, 2]).is_err());
    }

    #[test]
    fn test_game_id_parsing() {
        assert_eq!("大樂透".parse::<GameId>().unwrap(), GameId::Lotto649);
        assert_eq!("SuperLotto638".parse::<GameId>().unwrap(), GameId::SuperLotto638);
        assert_eq!("539".parse::<GameId>().unwrap(), GameId::DailyCash539);
        assert_eq!("3D".parse::<GameId>().unwrap(), GameId::ThreeStar);
        let err = "雙贏彩".parse::<GameId>().unwrap_err();
        assert!(err.to_string().contains("雙贏彩"), "message: {err}");
    }

    #[test]
    fn test_sub_mode_parsing() {
        assert_eq!("對彩".parse::<SubMode>().unwrap(), SubMode::Pair);
        assert_eq!("direct".parse::<SubMode>().unwrap(), SubMode::Straight);
        let err = "box".parse::<SubMode>().unwrap_err();
        assert!(err.to_string().contains("box"));
    }

    #[test]
    fn test_sub_mode_pick_count() {
        assert_eq!(SubMode::Straight.pick_count(4), 4);
        assert_eq!(SubMode::Group.pick_count(3), 3);
        assert_eq!(SubMode::Pair.pick_count(3), 2);
    }

    #[test]
    fn test_four_star_has_no_pair() {
        let four = GameId::FourStar.definition();
        assert!(four.supports(SubMode::Group));
        assert!(!four.supports(SubMode::Pair));
    }

    #[test]
    fn test_zone_range_expected_sum() {
        assert!((ZoneRange::new(1, 49, 6).expected_sum() - 150.0).abs() < 1e-10);
        assert!((ZoneRange::new(0, 9, 3).expected_sum() - 13.5).abs() < 1e-10);
        assert_eq!(ZoneRange::new(0, 9, 1).size(), 10);
    }

    #[test]
    fn test_tag_display() {
        assert_eq!(Tag::Cold(17).to_string(), "COLD 17");
        assert_eq!(Tag::DraggedBy(5).to_string(), "DRAG 05");
        assert_eq!(Tag::Normal.to_string(), "-");
        assert_eq!(Tag::parity(4), Tag::Even);
    }

    #[test]
    fn test_draw_record_numeric_period() {
        let json = r#"{"period": 114000012, "date": "2025-02-04", "numbers": [3, 7, 9]}"#;
        let draw: DrawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(draw.period, "114000012");
        assert_eq!(draw.numbers, vec![3, 7, 9]);
    }

    #[test]
    fn test_tag_serializes_as_string() {
        let n = TaggedNumber { value: 7, tag: Tag::Hot, zone: ZoneKind::Primary };
        let json = serde_json::to_string(&n).unwrap();
        assert_eq!(json, r#"{"value":7,"tag":"HOT","zone":"primary"}"#);
    }
}
