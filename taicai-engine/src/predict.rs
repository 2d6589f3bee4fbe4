use anyhow::{Result, bail};
use chrono::{Local, NaiveDate};
use rand::RngCore;

use taicai_db::models::{DrawRecord, GameDefinition, PredictionResult, SubMode};
use taicai_db::profile::UserProfile;

use crate::config::EngineConfig;
use crate::games;
use crate::schools::{SchoolContext, SchoolId};

/// Une demande de prédiction. Tout est emprunté pour la durée de l'appel.
#[derive(Debug, Clone, Copy)]
pub struct PredictRequest<'a> {
    pub game: &'a GameDefinition,
    /// Du plus récent au plus ancien.
    pub history: &'a [DrawRecord],
    pub school: SchoolId,
    pub sub_mode: Option<SubMode>,
    pub profile: Option<&'a UserProfile>,
    pub today: NaiveDate,
}

impl<'a> PredictRequest<'a> {
    pub fn new(game: &'a GameDefinition, history: &'a [DrawRecord], school: SchoolId) -> Self {
        Self {
            game,
            history,
            school,
            sub_mode: None,
            profile: None,
            today: Local::now().date_naive(),
        }
    }

    pub fn with_sub_mode(mut self, sub_mode: Option<SubMode>) -> Self {
        self.sub_mode = sub_mode;
        self
    }

    pub fn with_profile(mut self, profile: Option<&'a UserProfile>) -> Self {
        self.profile = profile;
        self
    }

    pub fn on(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}

/// Moteur sans état : seule la configuration est conservée entre deux appels.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn predict(&self, req: &PredictRequest<'_>, rng: &mut dyn RngCore) -> Result<PredictionResult> {
        let ctx = SchoolContext {
            config: &self.config,
            profile: req.profile,
            today: req.today,
        };
        log::debug!(
            "Prédiction {} / {} sur {} tirages",
            req.game.id,
            req.school,
            req.history.len()
        );
        games::run(req.game, req.history, req.school, req.sub_mode, &ctx, rng)
    }

    /// `count` grilles indépendantes pour la même demande.
    pub fn predict_many(
        &self,
        req: &PredictRequest<'_>,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<PredictionResult>> {
        if count == 0 {
            bail!("Le nombre de grilles doit être au moins 1");
        }
        (0..count).map(|_| self.predict(req, rng)).collect()
    }
}

/// Prédiction avec la configuration par défaut, la date du jour et
/// l'aléa du thread courant.
pub fn predict(
    game: &GameDefinition,
    history: &[DrawRecord],
    school: SchoolId,
    sub_mode: Option<SubMode>,
    profile: Option<&UserProfile>,
) -> Result<PredictionResult> {
    let req = PredictRequest::new(game, history, school)
        .with_sub_mode(sub_mode)
        .with_profile(profile);
    Engine::default().predict(&req, &mut rand::rng())
}
