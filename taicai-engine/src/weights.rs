use taicai_db::models::ZoneRange;

/// Poids par candidat sur un intervalle contigu `[min, max]`.
/// Chaque candidat a toujours une entrée.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    min: u8,
    weights: Vec<f64>,
}

impl WeightTable {
    pub fn uniform(min: u8, max: u8, weight: f64) -> Self {
        let len = (max as usize + 1).saturating_sub(min as usize);
        Self {
            min,
            weights: vec![weight; len],
        }
    }

    pub fn for_zone(zone: &ZoneRange, weight: f64) -> Self {
        Self::uniform(zone.min, zone.max, weight)
    }

    pub fn min(&self) -> u8 {
        self.min
    }

    pub fn max(&self) -> u8 {
        (self.min as usize + self.weights.len()).saturating_sub(1) as u8
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn contains(&self, value: u8) -> bool {
        value >= self.min && ((value - self.min) as usize) < self.weights.len()
    }

    fn index(&self, value: u8) -> Option<usize> {
        if self.contains(value) {
            Some((value - self.min) as usize)
        } else {
            None
        }
    }

    /// Poids d'un candidat, 0 hors intervalle.
    pub fn get(&self, value: u8) -> f64 {
        self.index(value).map(|i| self.weights[i]).unwrap_or(0.0)
    }

    pub fn set(&mut self, value: u8, weight: f64) {
        if let Some(i) = self.index(value) {
            self.weights[i] = weight;
        }
    }

    pub fn add(&mut self, value: u8, delta: f64) {
        if let Some(i) = self.index(value) {
            self.weights[i] += delta;
        }
    }

    pub fn cap(&mut self, ceiling: f64) {
        for w in &mut self.weights {
            if *w > ceiling {
                *w = ceiling;
            }
        }
    }

    pub fn map(&mut self, mut f: impl FnMut(u8, f64) -> f64) {
        let min = self.min;
        for (i, w) in self.weights.iter_mut().enumerate() {
            *w = f(min + i as u8, *w);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, f64)> + '_ {
        self.weights
            .iter()
            .enumerate()
            .map(|(i, &w)| (self.min + i as u8, w))
    }

    pub fn max_weight(&self) -> f64 {
        self.weights.iter().copied().fold(0.0, f64::max)
    }

    /// Candidat de poids maximal (le plus petit en cas d'égalité).
    pub fn argmax(&self) -> Option<u8> {
        let mut best: Option<(u8, f64)> = None;
        for (v, w) in self.iter() {
            if best.is_none_or(|(_, bw)| w > bw) {
                best = Some((v, w));
            }
        }
        best.map(|(v, _)| v)
    }
}
