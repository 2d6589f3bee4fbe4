use rand::RngCore;
use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;

use crate::weights::WeightTable;

/// Nombre d'exemplaires d'un candidat dans l'urne : ceil(poids), borné à
/// `[1, ceiling]`. Un poids nul ou invalide compte pour un exemplaire.
pub fn copies(weight: f64, ceiling: u32) -> u32 {
    if !weight.is_finite() || weight <= 0.0 {
        return 1;
    }
    (weight.ceil() as u64).clamp(1, ceiling.max(1) as u64) as u32
}

/// Tirage pondéré dans une urne où chaque candidat figure `copies(poids)` fois.
///
/// Sans remise, toutes les occurrences d'un numéro tiré quittent l'urne et
/// le résultat est trié. Avec remise, l'ordre de tirage est conservé.
/// Si l'urne s'épuise avant `count`, le résultat est simplement plus court.
pub fn sample(
    table: &WeightTable,
    count: usize,
    repeats: bool,
    pool_ceiling: u32,
    rng: &mut dyn RngCore,
) -> Vec<u8> {
    let mut available: Vec<(u8, u32)> = table
        .iter()
        .map(|(v, w)| (v, copies(w, pool_ceiling)))
        .collect();
    let mut selected = Vec::with_capacity(count);

    if repeats {
        let Ok(dist) = WeightedIndex::new(available.iter().map(|(_, c)| *c)) else {
            return selected;
        };
        for _ in 0..count {
            selected.push(available[dist.sample(rng)].0);
        }
        return selected;
    }

    for _ in 0..count {
        let Ok(dist) = WeightedIndex::new(available.iter().map(|(_, c)| *c)) else {
            break;
        };
        let idx = dist.sample(rng);
        let (number, _) = available.remove(idx);
        selected.push(number);
    }

    if selected.len() < count {
        log::debug!("Urne épuisée : {} numéros sur {} demandés", selected.len(), count);
    }
    selected.sort_unstable();
    selected
}
