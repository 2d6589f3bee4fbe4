mod display;
mod import;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::display::{
    display_draws, display_import_summary, display_predictions, display_stats, display_wheel,
};
use taicai_db::db::{
    DrawFilter, count_draws, db_path, fetch_filtered_draws, fetch_last_draws, insert_draw, migrate,
    open_db,
};
use taicai_db::models::{DrawRecord, GameId, SubMode, validate_draw};
use taicai_db::profile::{UserProfile, load_profiles};
use taicai_db::rusqlite::Connection;
use taicai_engine::games::zone_inputs;
use taicai_engine::stats::{compute_stats, hot_numbers};
use taicai_engine::wheel::smart_wheel;
use taicai_engine::{Engine, EngineConfig, PredictRequest, SchoolId};

#[derive(Parser)]
#[command(name = "taicai", about = "Analyse des tirages de la loterie taïwanaise")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Filtres d'historique communs à `list` et `stats`.
#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Ne garder que les périodes contenant ce texte
    #[arg(long)]
    period: Option<String>,

    /// Année (grégorienne) du tirage
    #[arg(long)]
    year: Option<i32>,

    /// Mois du tirage (1-12)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,
}

impl From<FilterArgs> for DrawFilter {
    fn from(args: FilterArgs) -> Self {
        DrawFilter {
            period: args.period,
            year: args.year,
            month: args.month,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Importer des tirages (lottery-data.json ou export CSV officiel)
    Import {
        /// Chemin vers le fichier .json ou .csv
        #[arg(short, long, default_value = "data/lottery-data.json")]
        file: PathBuf,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages d'un jeu
    List {
        /// Jeu (lotto649, superlotto638, dailycash539, 3d, 4d)
        #[arg(short, long)]
        game: GameId,

        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Numéros chauds : fréquences et retards
    Stats {
        #[arg(short, long)]
        game: GameId,

        /// Fenêtre d'analyse ; par défaut tout l'historique, 30 et 10 tirages
        #[arg(short, long)]
        window: Option<u32>,

        /// Nombre de numéros affichés par zone
        #[arg(short, long, default_value = "10")]
        top: usize,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Proposer des grilles selon une école
    Predict {
        #[arg(short, long)]
        game: GameId,

        /// École (stat, pattern, balance, ai, wuxing)
        #[arg(short, long, default_value = "stat")]
        school: SchoolId,

        /// Mode des jeux de chiffres (straight, group, pair)
        #[arg(short, long)]
        mode: Option<SubMode>,

        /// Nombre de grilles à proposer
        #[arg(short, long, default_value = "1")]
        count: usize,

        /// Historique consulté (nombre de tirages)
        #[arg(short, long, default_value = "1000")]
        window: u32,

        /// Fichier de profils (tableau JSON)
        #[arg(long)]
        profiles: Option<PathBuf>,

        /// Identifiant du profil à utiliser
        #[arg(long)]
        profile_id: Option<String>,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,

        /// Paramètres du moteur (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Sortie JSON
        #[arg(long)]
        json: bool,
    },

    /// Pack de grilles (包牌) autour de la sélection statistique
    Wheel {
        #[arg(short, long)]
        game: GameId,

        #[arg(short, long, default_value = "1000")]
        window: u32,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Ajouter un tirage manuellement
    Add {
        #[arg(short, long)]
        game: GameId,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { game, last, filter } => cmd_list(&conn, game, last, &filter.into()),
        Command::Stats {
            game,
            window,
            top,
            filter,
        } => cmd_stats(&conn, game, window, top, &filter.into()),
        Command::Predict {
            game,
            school,
            mode,
            count,
            window,
            profiles,
            profile_id,
            seed,
            config,
            json,
        } => {
            let profile = load_profile(profiles.as_deref(), profile_id.as_deref())?;
            let opts = PredictOptions {
                game,
                school,
                sub_mode: mode,
                count,
                window,
                seed,
                json,
            };
            cmd_predict(&conn, &load_engine(config.as_deref())?, &opts, profile.as_ref())
        }
        Command::Wheel {
            game,
            window,
            seed,
            config,
        } => cmd_wheel(&conn, &load_engine(config.as_deref())?, game, window, seed),
        Command::Add { game } => cmd_add(&conn, game),
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

fn load_engine(config: Option<&Path>) -> Result<Engine> {
    let config = match config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    Ok(Engine::new(config))
}

fn load_profile(profiles: Option<&Path>, id: Option<&str>) -> Result<Option<UserProfile>> {
    let (Some(path), Some(id)) = (profiles, id) else {
        if id.is_some() {
            bail!("--profile-id nécessite --profiles <fichier>");
        }
        return Ok(None);
    };
    let profile = load_profiles(path)?
        .into_iter()
        .find(|p| p.id == id)
        .with_context(|| format!("Profil introuvable : '{id}'"))?;
    Ok(Some(profile))
}

fn cmd_import(conn: &Connection, file: &Path) -> Result<()> {
    let result = import::import_file(conn, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, game: GameId, last: u32, filter: &DrawFilter) -> Result<()> {
    if count_draws(conn, game)? == 0 {
        println!("Aucun tirage pour {game}. Lancez d'abord : taicai import");
        return Ok(());
    }
    let draws = fetch_filtered_draws(conn, game, filter, last)?;
    if draws.is_empty() && !filter.is_empty() {
        println!("Aucun tirage {game} ne correspond aux filtres.");
        return Ok(());
    }
    display_draws(&game.definition(), &draws);
    Ok(())
}

fn cmd_stats(
    conn: &Connection,
    game: GameId,
    window: Option<u32>,
    top: usize,
    filter: &DrawFilter,
) -> Result<()> {
    if count_draws(conn, game)? == 0 {
        println!("Aucun tirage pour {game}. Lancez d'abord : taicai import");
        return Ok(());
    }
    let history = fetch_filtered_draws(conn, game, filter, u32::MAX)?;
    let n = history.len();
    if n == 0 {
        println!("Aucun tirage {game} ne correspond aux filtres.");
        return Ok(());
    }
    let windows = match window {
        Some(w) => vec![(w as usize).min(n)],
        None => vec![n, 30.min(n), 10.min(n)],
    };

    println!("\n📊 Statistiques {game} ({n} tirages retenus)");
    let definition = game.definition();
    for w in windows {
        for (label, input) in zone_inputs(&definition, &history[..w]) {
            let hot = hot_numbers(&compute_stats(&input), top);
            display_stats(label, &hot, input.len(), top);
        }
    }
    Ok(())
}

struct PredictOptions {
    game: GameId,
    school: SchoolId,
    sub_mode: Option<SubMode>,
    count: usize,
    window: u32,
    seed: Option<u64>,
    json: bool,
}

fn cmd_predict(
    conn: &Connection,
    engine: &Engine,
    opts: &PredictOptions,
    profile: Option<&UserProfile>,
) -> Result<()> {
    let history = fetch_last_draws(conn, opts.game, opts.window)?;
    if history.is_empty() {
        log::warn!("Aucun tirage pour {} : prédiction sans historique", opts.game);
    }

    let game = opts.game.definition();
    let req = PredictRequest::new(&game, &history, opts.school)
        .with_sub_mode(opts.sub_mode)
        .with_profile(profile);
    let mut rng = make_rng(opts.seed);
    let results = engine.predict_many(&req, opts.count, &mut rng)?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        display_predictions(&game, opts.school, &results);
    }
    Ok(())
}

fn cmd_wheel(conn: &Connection, engine: &Engine, game: GameId, window: u32, seed: Option<u64>) -> Result<()> {
    let history = fetch_last_draws(conn, game, window)?;
    if history.is_empty() {
        log::warn!("Aucun tirage pour {game} : pack sans historique");
    }
    let definition = game.definition();
    let mut rng = make_rng(seed);
    let tickets = smart_wheel(engine, &definition, &history, &mut rng);
    display_wheel(&definition, &tickets);
    Ok(())
}

fn cmd_add(conn: &Connection, game: GameId) -> Result<()> {
    let definition = game.definition();
    println!("Ajout d'un tirage {game}\n");

    let period = prompt("Période (ex: 114000012) : ")?;
    let raw_date = prompt("Date (AAAA-MM-JJ) : ")?;
    let date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d")
        .with_context(|| format!("Format de date invalide : '{raw_date}'"))?;

    let numbers = loop {
        let input = prompt(&format!("{} numéros (séparés par des espaces) : ", definition.record_len()))?;
        let nums: Result<Vec<u8>, _> = input.split_whitespace().map(|s| s.parse::<u8>()).collect();
        match nums {
            Ok(v) => match validate_draw(&definition, &v) {
                Ok(()) => break v,
                Err(e) => println!("{e}. Réessayez."),
            },
            Err(_) => println!("Numéros illisibles. Réessayez."),
        }
    };

    let draw = DrawRecord::new(period, date, numbers);
    println!("\nTirage à insérer :");
    display_draws(&definition, std::slice::from_ref(&draw));

    let confirm = prompt("\nConfirmer l'insertion ? (o/n) : ")?;
    if confirm.trim().to_lowercase() == "o" {
        if insert_draw(conn, game, &draw)? {
            println!("Tirage inséré avec succès.");
        } else {
            println!("Ce tirage existe déjà (doublon ignoré).");
        }
    } else {
        println!("Insertion annulée.");
    }

    Ok(())
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    Ok(input.trim().to_string())
}
