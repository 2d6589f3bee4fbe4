use taicai_db::models::{DrawRecord, NumberStats, ZoneRange};

/// Vue d'un historique restreinte à une zone : pour chaque tirage (du plus
/// récent au plus ancien), les numéros situés aux positions
/// `offset..offset + width` et compris dans l'intervalle de la zone.
#[derive(Debug, Clone)]
pub struct ZoneInput {
    pub draws: Vec<Vec<u8>>,
    pub zone: ZoneRange,
    pub repeats: bool,
}

impl ZoneInput {
    pub fn from_history(
        history: &[DrawRecord],
        zone: ZoneRange,
        offset: usize,
        width: usize,
        repeats: bool,
    ) -> Self {
        let draws = history
            .iter()
            .map(|d| {
                d.numbers
                    .iter()
                    .skip(offset)
                    .take(width)
                    .copied()
                    .filter(|&n| zone.contains(n))
                    .collect()
            })
            .collect();
        Self { draws, zone, repeats }
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn candidates(&self) -> impl Iterator<Item = u8> {
        self.zone.min..=self.zone.max
    }

    /// Les `n` tirages les plus récents.
    pub fn recent(&self, n: usize) -> &[Vec<u8>] {
        &self.draws[..n.min(self.draws.len())]
    }

    pub fn latest(&self) -> &[u8] {
        self.draws.first().map(|d| d.as_slice()).unwrap_or(&[])
    }
}

/// Fréquence et retard de chaque candidat. Le retard est l'indice du
/// tirage le plus récent contenant le numéro, ou la longueur de
/// l'historique s'il n'est jamais sorti.
pub fn compute_stats(input: &ZoneInput) -> Vec<NumberStats> {
    let mut stats: Vec<NumberStats> = input
        .candidates()
        .map(|n| NumberStats {
            number: n,
            frequency: 0,
            gap: input.len() as u32,
        })
        .collect();

    for (i, numbers) in input.draws.iter().enumerate() {
        for &n in numbers {
            let idx = (n - input.zone.min) as usize;
            if idx < stats.len() {
                stats[idx].frequency += 1;
                if stats[idx].gap == input.len() as u32 {
                    stats[idx].gap = i as u32;
                }
            }
        }
    }

    stats
}

/// Fréquences sur les `window` tirages les plus récents, indexées depuis `zone.min`.
pub fn window_frequencies(input: &ZoneInput, window: usize) -> Vec<u32> {
    let mut counts = vec![0u32; input.zone.size()];
    for numbers in input.recent(window) {
        for &n in numbers {
            let idx = (n - input.zone.min) as usize;
            if idx < counts.len() {
                counts[idx] += 1;
            }
        }
    }
    counts
}

/// Les `top` numéros les plus fréquents, fréquence décroissante puis numéro croissant.
pub fn hot_numbers(stats: &[NumberStats], top: usize) -> Vec<NumberStats> {
    let mut sorted = stats.to_vec();
    sorted.sort_by(|a, b| b.frequency.cmp(&a.frequency).then(a.number.cmp(&b.number)));
    sorted.truncate(top);
    sorted
}

#[cfg(test)]
pub(crate) fn make_test_history(n: usize, width: usize, max: u8) -> Vec<DrawRecord> {
    use chrono::{Duration, NaiveDate};

    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    (0..n)
        .map(|i| {
            let base = (i * width) as u32;
            let numbers = (0..width as u32)
                .map(|k| ((base + k * 7) % max as u32 + 1) as u8)
                .collect();
            DrawRecord {
                period: format!("{:03}", n - i),
                date: start + Duration::days((n - i) as i64),
                numbers,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn draw(numbers: &[u8]) -> DrawRecord {
        DrawRecord::new("x", NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), numbers.to_vec())
    }

    #[test]
    fn test_zone_slicing() {
        let history = vec![draw(&[1, 2, 3, 4, 5, 6, 8]), draw(&[7, 8, 9, 10, 11, 12, 3])];
        let primary = ZoneInput::from_history(&history, ZoneRange::new(1, 38, 6), 0, 6, false);
        let secondary = ZoneInput::from_history(&history, ZoneRange::new(1, 8, 1), 6, 1, false);
        assert_eq!(primary.draws[0], vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(secondary.draws, vec![vec![8], vec![3]]);
    }

    #[test]
    fn test_out_of_range_values_dropped() {
        let history = vec![draw(&[1, 2, 60])];
        let input = ZoneInput::from_history(&history, ZoneRange::new(1, 49, 3), 0, 3, false);
        assert_eq!(input.draws[0], vec![1, 2]);
    }

    #[test]
    fn test_compute_stats_gap_and_frequency() {
        let history = vec![draw(&[1, 2, 3]), draw(&[4, 5, 6]), draw(&[1, 5, 9])];
        let input = ZoneInput::from_history(&history, ZoneRange::new(1, 10, 3), 0, 3, false);
        let stats = compute_stats(&input);
        assert_eq!(stats.len(), 10);
        assert_eq!(stats[0].frequency, 2);
        assert_eq!(stats[0].gap, 0);
        assert_eq!(stats[4].gap, 1);
        assert_eq!(stats[8].gap, 2);
        // Jamais sorti : retard = longueur de l'historique.
        assert_eq!(stats[9].frequency, 0);
        assert_eq!(stats[9].gap, 3);
    }

    #[test]
    fn test_digit_stats_start_at_zero() {
        let history = vec![draw(&[0, 0, 9])];
        let input = ZoneInput::from_history(&history, ZoneRange::new(0, 9, 3), 0, 3, true);
        let stats = compute_stats(&input);
        assert_eq!(stats[0].number, 0);
        assert_eq!(stats[0].frequency, 2);
        assert_eq!(stats[9].frequency, 1);
    }

    #[test]
    fn test_window_frequencies() {
        let history = vec![draw(&[1, 2]), draw(&[1, 3]), draw(&[1, 4])];
        let input = ZoneInput::from_history(&history, ZoneRange::new(1, 5, 2), 0, 2, false);
        let counts = window_frequencies(&input, 2);
        assert_eq!(counts, vec![2, 1, 1, 0, 0]);
    }

    #[test]
    fn test_hot_numbers_order() {
        let history = vec![draw(&[3, 2]), draw(&[3, 1]), draw(&[2, 5])];
        let input = ZoneInput::from_history(&history, ZoneRange::new(1, 5, 2), 0, 2, false);
        let hot = hot_numbers(&compute_stats(&input), 2);
        assert_eq!(hot.iter().map(|s| s.number).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_make_test_history_in_range() {
        let history = make_test_history(40, 6, 49);
        assert_eq!(history.len(), 40);
        assert!(history.iter().all(|d| d.numbers.iter().all(|&n| (1..=49).contains(&n))));
        assert!(history[0].date > history[1].date);
    }
}
