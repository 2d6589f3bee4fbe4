use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::path::Path;

use crate::models::{DrawRecord, GameId};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    game     TEXT NOT NULL,
    period   TEXT NOT NULL,
    date     TEXT NOT NULL,
    numbers  TEXT NOT NULL,
    PRIMARY KEY (game, period)
);
CREATE INDEX IF NOT EXISTS idx_draws_game_date ON draws (game, date DESC);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("taicai.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

fn encode_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_numbers(raw: &str) -> Result<Vec<u8>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',')
        .map(|s| {
            s.trim()
                .parse::<u8>()
                .with_context(|| format!("Numéro illisible en base : '{}'", s))
        })
        .collect()
}

pub fn insert_draw(conn: &Connection, game: GameId, draw: &DrawRecord) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (game, period, date, numbers) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            game.as_str(),
            draw.period,
            draw.date,
            encode_numbers(&draw.numbers),
        ],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

/// Filtres de consultation de l'historique. Chaque champ renseigné
/// restreint le résultat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawFilter {
    /// Sous-chaîne de la période.
    pub period: Option<String>,
    pub year: Option<i32>,
    /// 1 à 12.
    pub month: Option<u32>,
}

impl DrawFilter {
    pub fn is_empty(&self) -> bool {
        self.period.is_none() && self.year.is_none() && self.month.is_none()
    }
}

/// Derniers tirages d'un jeu, du plus récent au plus ancien.
pub fn fetch_last_draws(conn: &Connection, game: GameId, limit: u32) -> Result<Vec<DrawRecord>> {
    fetch_filtered_draws(conn, game, &DrawFilter::default(), limit)
}

/// Comme `fetch_last_draws`, restreint aux tirages qui passent `filter`.
pub fn fetch_filtered_draws(
    conn: &Connection,
    game: GameId,
    filter: &DrawFilter,
    limit: u32,
) -> Result<Vec<DrawRecord>> {
    let mut stmt = conn.prepare(
        "SELECT period, date, numbers FROM draws
         WHERE game = ?1
           AND (?2 IS NULL OR instr(period, ?2) > 0)
           AND (?3 IS NULL OR CAST(strftime('%Y', date) AS INTEGER) = ?3)
           AND (?4 IS NULL OR CAST(strftime('%m', date) AS INTEGER) = ?4)
         ORDER BY date DESC, period DESC LIMIT ?5"
    )?;
    let params = rusqlite::params![game.as_str(), filter.period, filter.year, filter.month, limit];
    let rows = stmt.query_map(params, |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, NaiveDate>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?.collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(period, date, numbers)| {
            Ok(DrawRecord {
                period,
                date,
                numbers: decode_numbers(&numbers)?,
            })
        })
        .collect()
}

pub fn count_draws(conn: &Connection, game: GameId) -> Result<u32> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM draws WHERE game = ?1",
        [game.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn last_period(conn: &Connection, game: GameId) -> Result<Option<String>> {
    Ok(fetch_last_draws(conn, game, 1)?.into_iter().next().map(|d| d.period))
}
