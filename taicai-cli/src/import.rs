use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Deserialize;
use taicai_db::db::insert_draw;
use taicai_db::models::{DrawRecord, GameId, validate_draw};
use taicai_db::rusqlite::Connection;

#[derive(Debug, Default)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
    /// Lignes d'un jeu hors catalogue (雙贏彩...), ignorées.
    pub unknown_game: u32,
}

impl ImportResult {
    fn record(&mut self, conn: &Connection, game: GameId, draw: &DrawRecord) {
        if let Err(e) = validate_draw(&game.definition(), &draw.numbers) {
            log::warn!("Tirage {} {} rejeté : {e}", game.as_str(), draw.period);
            self.errors += 1;
            return;
        }
        match insert_draw(conn, game, draw) {
            Ok(true) => self.inserted += 1,
            Ok(false) => self.skipped += 1,
            Err(e) => {
                log::warn!("Erreur insertion tirage {} {} : {e}", game.as_str(), draw.period);
                self.errors += 1;
            }
        }
    }
}

/// Choisit le format d'après l'extension du fichier.
pub fn import_file(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "json" => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Impossible de lire {:?}", path))?;
            import_json(conn, &json)
        }
        "csv" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
            import_csv(conn, file)
        }
        other => bail!("Format non pris en charge : '{other}' (attendu : .json ou .csv)"),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DataFile {
    Wrapped {
        games: BTreeMap<String, Vec<serde_json::Value>>,
    },
    Bare(BTreeMap<String, Vec<serde_json::Value>>),
}

/// `lottery-data.json` : `{"games": {libellé: [tirages]}, ...}` ou
/// directement la table libellé → tirages.
pub fn import_json(conn: &Connection, json: &str) -> Result<ImportResult> {
    let data: DataFile = serde_json::from_str(json).context("Fichier de tirages invalide")?;
    let games = match data {
        DataFile::Wrapped { games } => games,
        DataFile::Bare(games) => games,
    };

    let tx = conn
        .unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;
    let mut result = ImportResult::default();

    for (label, records) in games {
        let Ok(game) = label.parse::<GameId>() else {
            log::warn!("Jeu ignoré : '{label}' ({} tirages)", records.len());
            result.total_records += records.len() as u32;
            result.unknown_game += records.len() as u32;
            continue;
        };
        for raw in records {
            result.total_records += 1;
            match serde_json::from_value::<DrawRecord>(raw) {
                Ok(draw) => result.record(&tx, game, &draw),
                Err(e) => {
                    log::warn!("Tirage illisible ({label}) : {e}");
                    result.errors += 1;
                }
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    Ok(result)
}

/// Date officielle, en calendrier Minguo (113/01/02) ou grégorien (2024-01-02).
fn parse_date(raw: &str) -> Result<NaiveDate> {
    let parts: Vec<&str> = raw.trim().split(['/', '-', '.']).collect();
    if parts.len() != 3 {
        bail!("Format de date invalide : '{raw}'");
    }
    let part = |s: &str| -> Result<u32> {
        s.parse::<u32>()
            .with_context(|| format!("Format de date invalide : '{raw}'"))
    };
    let mut year = part(parts[0])?;
    if year < 1911 {
        year += 1911;
    }
    NaiveDate::from_ymd_opt(year as i32, part(parts[1])?, part(parts[2])?)
        .with_context(|| format!("Date inexistante : '{raw}'"))
}

fn field(record: &csv::StringRecord, idx: usize) -> Result<&str> {
    record
        .get(idx)
        .map(|s| s.trim().trim_matches('"'))
        .with_context(|| format!("Champ manquant à l'index {}", idx))
}

/// Colonnes : libellé du jeu, période, date, ..., numéros à partir de la 7e.
/// `Ok(None)` pour un jeu hors catalogue.
fn parse_record(record: &csv::StringRecord) -> Result<Option<(GameId, DrawRecord)>> {
    let Ok(game) = field(record, 0)?.parse::<GameId>() else {
        return Ok(None);
    };
    let period = field(record, 1)?.to_string();
    let date = parse_date(field(record, 2)?)?;
    let numbers: Vec<u8> = record
        .iter()
        .skip(6)
        .map(|s| s.trim().trim_matches('"'))
        .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        .map(|s| {
            s.parse::<u8>()
                .with_context(|| format!("Numéro illisible : '{s}'"))
        })
        .collect::<Result<_>>()?;

    Ok(Some((game, DrawRecord::new(period, date, numbers))))
}

/// Export CSV officiel (séparateur virgule, ligne d'en-tête).
pub fn import_csv<R: Read>(conn: &Connection, reader: R) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let tx = conn
        .unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;
    let mut result = ImportResult::default();

    for record_result in reader.records() {
        result.total_records += 1;
        let record = match record_result {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Erreur lecture ligne {} : {e}", result.total_records);
                result.errors += 1;
                continue;
            }
        };
        match parse_record(&record) {
            Ok(Some((game, draw))) => result.record(&tx, game, &draw),
            Ok(None) => result.unknown_game += 1,
            Err(e) => {
                log::warn!("Erreur parsing ligne {} : {e}", result.total_records);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taicai_db::db::{count_draws, fetch_last_draws, migrate};

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("113/01/02").unwrap(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(parse_date("2024-01-02").unwrap(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(parse_date("114.3.9").unwrap(), NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());
        assert!(parse_date("2024/13/01").is_err());
        assert!(parse_date("hier").is_err());
    }

    #[test]
    fn test_parse_record() {
        let record = csv::StringRecord::from(vec![
            "大樂透", "113000001", "113/01/02", "x", "y", "z", "05", "12", "23", "31", "40", "44", "08",
        ]);
        let (game, draw) = parse_record(&record).unwrap().unwrap();
        assert_eq!(game, GameId::Lotto649);
        assert_eq!(draw.period, "113000001");
        assert_eq!(draw.numbers, vec![5, 12, 23, 31, 40, 44, 8]);

        let other = csv::StringRecord::from(vec!["雙贏彩", "1", "113/01/02", "", "", "", "1"]);
        assert!(parse_record(&other).unwrap().is_none());
    }

    #[test]
    fn test_import_json_wrapped() {
        let conn = test_conn();
        let json = r#"{
            "games": {
                "威力彩": [
                    {"date": "2025-01-06", "period": "114000002", "numbers": [1, 2, 3, 4, 5, 6, 7]},
                    {"date": "2025-01-02", "period": 114000001, "numbers": [8, 9, 10, 11, 12, 13, 2], "source": "api"},
                    {"date": "2025-01-01", "period": "bad", "numbers": [1, 2, 3]}
                ],
                "雙贏彩": [{"date": "2025-01-01", "period": "1", "numbers": [1]}]
            },
            "jackpots": {},
            "last_updated": "2025-01-06"
        }"#;
        let result = import_json(&conn, json).unwrap();
        assert_eq!(result.total_records, 4);
        assert_eq!(result.inserted, 2);
        assert_eq!(result.errors, 1);
        assert_eq!(result.unknown_game, 1);

        let draws = fetch_last_draws(&conn, GameId::SuperLotto638, 10).unwrap();
        assert_eq!(draws[0].period, "114000002");
        assert_eq!(draws[1].period, "114000001");
    }

    #[test]
    fn test_import_json_bare_and_duplicates() {
        let conn = test_conn();
        let json = r#"{"3星彩": [{"date": "2025-01-02", "period": "1", "numbers": [0, 0, 7]}]}"#;
        assert_eq!(import_json(&conn, json).unwrap().inserted, 1);
        let again = import_json(&conn, json).unwrap();
        assert_eq!(again.inserted, 0);
        assert_eq!(again.skipped, 1);
        assert_eq!(count_draws(&conn, GameId::ThreeStar).unwrap(), 1);
    }

    #[test]
    fn test_import_csv() {
        let conn = test_conn();
        let data = "\
遊戲名稱,期別,開獎日期,銷售總額,銷售注數,總獎金,獎號1,獎號2,獎號3,獎號4,獎號5,特別號
今彩539,113000001,113/01/02,0,0,0,01,07,19,28,35,
今彩539,113000002,113/01/03,0,0,0,01,07,19,28,39,
雙贏彩,113000001,113/01/02,0,0,0,01,02,03,04,05,06
今彩539,113000003,113/02/31,0,0,0,01,07,19,28,35,
";
        let result = import_csv(&conn, data.as_bytes()).unwrap();
        assert_eq!(result.total_records, 4);
        assert_eq!(result.inserted, 2);
        assert_eq!(result.unknown_game, 1);
        assert_eq!(result.errors, 1);
        let draws = fetch_last_draws(&conn, GameId::DailyCash539, 5).unwrap();
        assert_eq!(draws[0].numbers, vec![1, 7, 19, 28, 39]);
    }

    #[test]
    fn test_import_csv_rejects_out_of_range() {
        let conn = test_conn();
        let data = "\
遊戲名稱,期別,開獎日期,銷售總額,銷售注數,總獎金,獎號1,獎號2,獎號3,獎號4,獎號5,特別號
今彩539,113000001,113/01/02,0,0,0,01,07,19,28,40,
今彩539,113000002,113/01/03,0,0,0,01,07,19,28,39,
";
        let result = import_csv(&conn, data.as_bytes()).unwrap();
        assert_eq!(result.inserted, 1);
        assert_eq!(result.errors, 1);
        let draws = fetch_last_draws(&conn, GameId::DailyCash539, 5).unwrap();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].period, "113000002");
    }
}
