use anyhow::{Result, bail};
use rand::{Rng, RngCore};

use taicai_db::models::{
    DrawRecord, GameDefinition, GameShape, PredictionResult, SubMode, TaggedNumber, ZoneKind,
    ZoneRange,
};

use crate::schools::balance::BalanceSchool;
use crate::schools::gap_hunt::GapHunt;
use crate::schools::{SchoolContext, SchoolId, ZoneOutcome, school_for};
use crate::stats::ZoneInput;

/// Une position de chiffre vue comme une zone 0-9 à un seul numéro.
const DIGIT: ZoneRange = ZoneRange::new(0, 9, 1);

fn tagged(outcome: &ZoneOutcome, zone: ZoneKind) -> Vec<TaggedNumber> {
    outcome
        .picks
        .iter()
        .map(|&(value, tag)| TaggedNumber { value, tag, zone })
        .collect()
}

/// Découpe le jeu en zones, applique l'école à chacune et assemble le résultat.
pub fn run(
    game: &GameDefinition,
    history: &[DrawRecord],
    school: SchoolId,
    sub_mode: Option<SubMode>,
    ctx: &SchoolContext<'_>,
    rng: &mut dyn RngCore,
) -> Result<PredictionResult> {
    match &game.shape {
        GameShape::SingleZone { primary } => {
            warn_ignored_mode(game, sub_mode);
            let input = ZoneInput::from_history(history, *primary, 0, primary.count, false);
            let outcome = school_for(school, ctx).select(&input, rng);
            Ok(PredictionResult {
                numbers: tagged(&outcome, ZoneKind::Primary),
                group_reason: outcome.reason,
            })
        }
        GameShape::DualZone { primary, secondary } => {
            warn_ignored_mode(game, sub_mode);
            let first = ZoneInput::from_history(history, *primary, 0, primary.count, false);
            let second =
                ZoneInput::from_history(history, *secondary, primary.count, secondary.count, false);

            let strategy = school_for(school, ctx);
            let zone1 = strategy.select(&first, rng);
            let zone2 = if school == SchoolId::Statistical {
                GapHunt::new(ctx.config).select(&second, rng)
            } else {
                strategy.select(&second, rng)
            };

            let mut numbers = tagged(&zone1, ZoneKind::Primary);
            numbers.extend(tagged(&zone2, ZoneKind::Secondary));
            Ok(PredictionResult {
                numbers,
                group_reason: format!("{} | Zone 2 : {}", zone1.reason, zone2.reason),
            })
        }
        GameShape::Digit { positions, .. } => {
            let mode = sub_mode.unwrap_or(SubMode::Straight);
            if !game.supports(mode) {
                bail!("{} ne propose pas le mode {}", game.id, mode);
            }
            run_digits(history, *positions, mode, school, ctx, rng)
        }
    }
}

/// Zones d'un jeu pour l'affichage des statistiques. Les chiffres sont
/// regroupés toutes positions confondues.
pub fn zone_inputs(game: &GameDefinition, history: &[DrawRecord]) -> Vec<(&'static str, ZoneInput)> {
    match &game.shape {
        GameShape::SingleZone { primary } => vec![(
            "Zone 1",
            ZoneInput::from_history(history, *primary, 0, primary.count, false),
        )],
        GameShape::DualZone { primary, secondary } => vec![
            (
                "Zone 1",
                ZoneInput::from_history(history, *primary, 0, primary.count, false),
            ),
            (
                "Zone 2",
                ZoneInput::from_history(history, *secondary, primary.count, secondary.count, false),
            ),
        ],
        GameShape::Digit { positions, .. } => vec![(
            "Chiffres",
            ZoneInput::from_history(history, ZoneRange::new(0, 9, *positions), 0, *positions, true),
        )],
    }
}

fn warn_ignored_mode(game: &GameDefinition, sub_mode: Option<SubMode>) {
    if let Some(mode) = sub_mode {
        log::warn!("Mode {mode} ignoré : {} n'est pas un jeu de chiffres", game.id);
    }
}

fn run_digits(
    history: &[DrawRecord],
    positions: usize,
    mode: SubMode,
    school: SchoolId,
    ctx: &SchoolContext<'_>,
    rng: &mut dyn RngCore,
) -> Result<PredictionResult> {
    let strategy = school_for(school, ctx);

    if mode == SubMode::Group {
        let zone = ZoneRange::new(0, 9, positions);
        let input = ZoneInput::from_history(history, zone, 0, positions, true);
        let outcome = if school == SchoolId::Balance {
            BalanceSchool::new(ctx.config).digit_shape_search(&input, rng)
        } else {
            strategy.select(&input, rng)
        };
        return Ok(PredictionResult {
            numbers: tagged(&outcome, ZoneKind::Primary),
            group_reason: format!("Combinaison : {}", outcome.reason),
        });
    }

    let (window, label) = match mode {
        SubMode::Pair if positions >= 2 => {
            if rng.random_bool(0.5) {
                (0..2, "Paire avant")
            } else {
                (positions - 2..positions, "Paire arrière")
            }
        }
        _ => (0..positions, "Position par position"),
    };

    let mut numbers = Vec::with_capacity(window.len());
    let mut reasons: Vec<String> = Vec::new();
    for position in window {
        let input = ZoneInput::from_history(history, DIGIT, position, 1, true);
        let outcome = strategy.select(&input, rng);
        numbers.extend(tagged(&outcome, ZoneKind::Primary));
        if !reasons.contains(&outcome.reason) {
            reasons.push(outcome.reason);
        }
    }

    Ok(PredictionResult {
        numbers,
        group_reason: format!("{label} : {}", reasons.join(" | ")),
    })
}
