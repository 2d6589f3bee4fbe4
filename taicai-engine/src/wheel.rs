use rand::RngCore;
use rand::seq::SliceRandom;

use taicai_db::models::{
    DrawRecord, GameDefinition, GameShape, PredictionResult, Tag, TaggedNumber, ZoneKind, ZoneRange,
};

use crate::predict::Engine;
use crate::sampler::sample;
use crate::schools::SchoolStrategy;
use crate::schools::statistical::StatisticalSchool;
use crate::stats::ZoneInput;

/// Taille de l'urne réduite des jeux à une zone.
const WHEEL_POOL: usize = 10;
const SINGLE_ZONE_TICKETS: usize = 10;

fn ticket(primary: &[u8], secondary: &[u8], reason: &str) -> PredictionResult {
    let wheel = |zone: ZoneKind| move |&value: &u8| TaggedNumber { value, tag: Tag::Wheel, zone };
    let mut numbers: Vec<TaggedNumber> = primary.iter().map(wheel(ZoneKind::Primary)).collect();
    numbers.extend(secondary.iter().map(wheel(ZoneKind::Secondary)));
    PredictionResult {
        numbers,
        group_reason: reason.to_string(),
    }
}

/// Permutation suivante dans l'ordre lexicographique, `false` après la dernière.
fn next_permutation(digits: &mut [u8]) -> bool {
    let Some(i) = digits.windows(2).rposition(|w| w[0] < w[1]) else {
        return false;
    };
    let Some(j) = digits.iter().rposition(|&d| d > digits[i]) else {
        return false;
    };
    digits.swap(i, j);
    digits[i + 1..].reverse();
    true
}

/// Toutes les permutations distinctes, dans l'ordre lexicographique.
pub fn distinct_permutations(digits: &[u8]) -> Vec<Vec<u8>> {
    let mut current = digits.to_vec();
    current.sort_unstable();
    let mut out = vec![current.clone()];
    while next_permutation(&mut current) {
        out.push(current.clone());
    }
    out
}

/// Pack de grilles (包牌) construit autour de la sélection statistique.
pub fn smart_wheel(
    engine: &Engine,
    game: &GameDefinition,
    history: &[DrawRecord],
    rng: &mut dyn RngCore,
) -> Vec<PredictionResult> {
    let config = engine.config();
    let school = StatisticalSchool::new(config);

    match &game.shape {
        GameShape::SingleZone { primary } => {
            let input = ZoneInput::from_history(history, *primary, 0, primary.count, false);
            let weighing = school.weigh(&input);
            let mut pool = sample(&weighing.table, WHEEL_POOL, false, config.pool_ceiling, rng);
            let shown = pool.iter().map(|n| format!("{n:02}")).collect::<Vec<_>>().join(" ");
            let reason = format!("Urne de {} numéros : {shown}", pool.len());

            (0..SINGLE_ZONE_TICKETS)
                .map(|_| {
                    pool.shuffle(rng);
                    let mut picks: Vec<u8> = pool.iter().take(primary.count).copied().collect();
                    picks.sort_unstable();
                    ticket(&picks, &[], &reason)
                })
                .collect()
        }
        GameShape::DualZone { primary, secondary } => {
            let input = ZoneInput::from_history(history, *primary, 0, primary.count, false);
            let picks: Vec<u8> = school.select(&input, rng).picks.into_iter().map(|(n, _)| n).collect();
            let reason = format!(
                "Zone 1 fixe, zone 2 couverte de {} à {}",
                secondary.min, secondary.max
            );
            (secondary.min..=secondary.max)
                .map(|s| ticket(&picks, &[s], &reason))
                .collect()
        }
        GameShape::Digit { positions, .. } => {
            let digits: Vec<u8> = (0..*positions)
                .flat_map(|p| {
                    let input = ZoneInput::from_history(history, ZoneRange::new(0, 9, 1), p, 1, true);
                    school.select(&input, rng).picks.into_iter().map(|(d, _)| d)
                })
                .collect();
            let perms = distinct_permutations(&digits);
            let reason = format!("{} permutation(s) de {:?}", perms.len(), digits);
            perms.iter().map(|p| ticket(p, &[], &reason)).collect()
        }
    }
}
