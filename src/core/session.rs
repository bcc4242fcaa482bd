//! The authoring session: one explicit owner for all mutable engine state.
//!
//! Every public operation is a single synchronous transition: derived values
//! are computed first and stored together, so a read never observes a
//! half-applied update. Built via `Session::builder()`.

use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::core::budget::{self, BudgetBreakdown, BudgetError, BudgetEvaluation, SensoryBudget};
use crate::core::catalog::{CatalogError, CatalogStore};
use crate::core::config::{ConfigError, ModeSettings, SessionConfig};
use crate::core::export::{self, ExportError, Snapshot};
use crate::core::regulation::{Alert, RegulationController, RegulationState, TriggerOutcome};
use crate::core::requests::{GentlerSceneRequest, ReflectionRequest, RegulationBeatRequest, SceneRequest};
use crate::core::spark::SparkProgression;
use crate::core::telemetry::{Telemetry, TelemetryDelta, TelemetryField};
use crate::schema::catalog::{Buggie, Location, Munchie, Prop};
use crate::schema::spark::{EventDraft, EventId, EventPatch, SparkEvent, SparkStage};
use crate::schema::story::{Goals, Story, StoryMode};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("budget error: {0}")]
    Budget(#[from] BudgetError),
    #[error("export error: {0}")]
    Export(#[from] ExportError),
}

/// How a stage lane should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaneStatus {
    /// Support/Tool lane while a micro-beat alert is up.
    Attention,
    OverBudget,
    /// At or before the cursor.
    Reached,
    Upcoming,
}

/// An event with its catalog references resolved. Dangling ids are left out.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEvent<'a> {
    pub event: &'a SparkEvent,
    pub actors: Vec<&'a Munchie>,
    pub location: Option<&'a Location>,
    /// Stressor entries paired with the intensity recorded on the event.
    pub buggies: Vec<(&'a Buggie, u8)>,
    pub props: Vec<&'a Prop>,
}

/// The location and props the stored budget was last derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetSelection {
    pub location: Option<String>,
    pub props: Vec<String>,
}

/// One authoring session.
#[derive(Debug, Clone)]
pub struct Session {
    catalog: Arc<CatalogStore>,
    config: SessionConfig,
    /// Session copies of the catalog stressors; intensities change here.
    buggies: Vec<Buggie>,
    sparks: SparkProgression,
    budget: SensoryBudget,
    exceeded: bool,
    selection: BudgetSelection,
    placements: FxHashMap<String, String>,
    regulation: RegulationController,
    telemetry: Telemetry,
    now: Duration,
    /// Mode settings as configured at build time; restored by `reset`.
    initial_modes: ModeSettings,
}

/// Builder for constructing a `Session`.
pub struct SessionBuilder {
    seed: u64,
    catalog_path: Option<String>,
    config_path: Option<String>,
    /// Directly provided catalog (shared across sessions).
    catalog: Option<Arc<CatalogStore>>,
    /// Directly provided config.
    config: Option<SessionConfig>,
}

impl SessionBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn catalog_path(mut self, path: &str) -> Self {
        self.catalog_path = Some(path.to_string());
        self
    }

    pub fn config_path(mut self, path: &str) -> Self {
        self.config_path = Some(path.to_string());
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<CatalogStore>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load files before falling back to directly provided values, then to
    /// the bundled catalog and default config.
    pub fn build(self) -> Result<Session, SessionError> {
        let catalog = match (self.catalog_path, self.catalog) {
            (Some(path), _) => Arc::new(CatalogStore::load_from_ron(Path::new(&path))?),
            (None, Some(catalog)) => catalog,
            (None, None) => Arc::new(CatalogStore::bundled()?),
        };

        let config = match (self.config_path, self.config) {
            (Some(path), _) => SessionConfig::load_from_ron(Path::new(&path))?,
            (None, Some(config)) => {
                config.validate()?;
                config
            }
            (None, None) => SessionConfig::default(),
        };

        tracing::info!(
            seed = self.seed,
            locations = catalog.locations().len(),
            props = catalog.props().len(),
            "session started"
        );

        let mut session = Session {
            buggies: catalog.buggies().to_vec(),
            regulation: RegulationController::new(config.micro_beat_auto_clear, config.pause_auto_clear),
            sparks: SparkProgression::new(self.seed),
            budget: SensoryBudget::default(),
            exceeded: false,
            selection: BudgetSelection::default(),
            placements: FxHashMap::default(),
            telemetry: Telemetry::default(),
            now: Duration::ZERO,
            initial_modes: config.modes,
            catalog,
            config,
        };
        session.check_initial_stressors();
        Ok(session)
    }
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder {
            seed: 0,
            catalog_path: None,
            config_path: None,
            catalog: None,
            config: None,
        }
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Session time since start.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// A catalog may start a stressor above the threshold; the alert has to
    /// be up from the first read.
    fn check_initial_stressors(&mut self) {
        let threshold = self.config.micro_beat_threshold;
        if let Some(buggie) = self.buggies.iter().find(|b| b.intensity > threshold) {
            tracing::info!(buggie = %buggie.id, intensity = buggie.intensity, "stressor starts above threshold");
            self.trigger_micro_beat();
        }
    }

    fn record_edit(&mut self) {
        self.telemetry.increment(TelemetryField::Edits, 1);
    }

    // ---- sensory budget ----

    pub fn budget(&self) -> SensoryBudget {
        self.budget
    }

    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }

    pub fn selection(&self) -> &BudgetSelection {
        &self.selection
    }

    /// Recompute the budget for a location and props and store it together
    /// with its exceeded flag.
    ///
    /// An unknown location leaves every piece of state untouched.
    pub fn apply_budget<S: AsRef<str>>(
        &mut self,
        location_id: &str,
        active_props: &[S],
    ) -> Result<BudgetEvaluation, BudgetError> {
        let evaluation = budget::evaluate(&self.catalog, location_id, active_props, &self.config.caps)?;

        let mitigated = self.exceeded && !evaluation.exceeded;
        self.budget = evaluation.budget;
        self.exceeded = evaluation.exceeded;
        self.selection = BudgetSelection {
            location: Some(location_id.to_string()),
            props: active_props.iter().map(|p| p.as_ref().to_string()).collect(),
        };
        if mitigated {
            self.telemetry.increment(TelemetryField::SbsOveragesMitigated, 1);
        }
        self.record_edit();

        tracing::debug!(
            location = location_id,
            total = evaluation.budget.total(),
            exceeded = evaluation.exceeded,
            mitigated,
            "budget applied"
        );
        Ok(evaluation)
    }

    /// Zero every axis and clear the exceeded flag.
    pub fn reset_budget(&mut self) {
        self.budget = SensoryBudget::default();
        self.exceeded = false;
        self.selection = BudgetSelection::default();
        tracing::debug!("budget reset");
    }

    /// Place a character at a location and derive the budget for that
    /// location with no props.
    pub fn move_character_to_location(&mut self, munchie_id: &str, location_id: &str) -> Result<BudgetEvaluation, BudgetError> {
        if self.catalog.munchie(munchie_id).is_none() {
            tracing::warn!(munchie = munchie_id, "moving a character missing from the catalog");
        }
        let evaluation = self.apply_budget::<&str>(location_id, &[])?;
        self.placements.insert(munchie_id.to_string(), location_id.to_string());
        tracing::debug!(munchie = munchie_id, location = location_id, "character moved");
        Ok(evaluation)
    }

    /// Where a character was last moved to.
    pub fn character_location(&self, munchie_id: &str) -> Option<&str> {
        self.placements.get(munchie_id).map(String::as_str)
    }

    /// Diagnostics for the current selection, including non-canonical effects.
    pub fn budget_breakdown(&self) -> Option<BudgetBreakdown> {
        let location = self.selection.location.as_deref()?;
        budget::compute_breakdown(&self.catalog, location, &self.selection.props).ok()
    }

    // ---- stressors ----

    pub fn buggies(&self) -> &[Buggie] {
        &self.buggies
    }

    pub fn buggie(&self, id: &str) -> Option<&Buggie> {
        self.buggies.iter().find(|b| b.id == id)
    }

    /// Set a stressor's intensity, clamped into range. Crossing the
    /// micro-beat threshold raises the alert in the same step.
    ///
    /// Returns the stored intensity, or `None` for an unknown id.
    pub fn adjust_buggie_intensity(&mut self, buggie_id: &str, requested: i64) -> Option<u8> {
        let Some(buggie) = self.buggies.iter_mut().find(|b| b.id == buggie_id) else {
            tracing::warn!(buggie = buggie_id, "ignoring intensity change for unknown buggie");
            return None;
        };
        let intensity = Buggie::clamp_intensity(requested);
        buggie.intensity = intensity;
        tracing::debug!(buggie = buggie_id, requested, intensity, "buggie intensity changed");

        if intensity > self.config.micro_beat_threshold {
            self.trigger_micro_beat();
        }
        self.record_edit();
        Some(intensity)
    }

    // ---- regulation ----

    pub fn regulation(&self) -> RegulationState {
        self.regulation.state()
    }

    pub fn alert_deadline(&self, alert: Alert) -> Option<Duration> {
        self.regulation.deadline(alert)
    }

    /// Raise the micro-beat alert. Counted once per call, even when the
    /// alert is already up.
    pub fn trigger_micro_beat(&mut self) -> TriggerOutcome {
        let outcome = self.regulation.trigger(Alert::MicroBeat, self.now);
        self.telemetry.increment(TelemetryField::RegulationTriggers, 1);
        outcome
    }

    pub fn trigger_pause_and_breathe(&mut self) -> TriggerOutcome {
        self.regulation.trigger(Alert::PauseAndBreathe, self.now)
    }

    /// Acknowledge one alert. Returns whether it was active.
    pub fn acknowledge(&mut self, alert: Alert) -> bool {
        self.regulation.clear(alert)
    }

    /// Acknowledge both alerts.
    pub fn clear_regulation(&mut self) {
        self.regulation.clear_all();
    }

    /// Move the session clock forward. Returns the alerts whose timers fired.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<Alert> {
        self.now = self.now.saturating_add(elapsed);
        self.telemetry
            .increment(TelemetryField::TimeOnTask, elapsed.as_millis() as u64);
        self.regulation.expire(self.now)
    }

    // ---- story and beats ----

    pub fn story(&self) -> Option<&Story> {
        self.sparks.story()
    }

    pub fn events(&self) -> &[SparkEvent] {
        self.sparks.events()
    }

    pub fn event(&self, id: &EventId) -> Option<&SparkEvent> {
        self.sparks.event(id)
    }

    /// Start a new story in the current kid/grown-up mode. Drops every beat.
    pub fn create_new_story(&mut self, title: &str, goals: Goals) -> &Story {
        let mode = StoryMode::from_kid_mode(self.config.modes.kid_mode);
        self.sparks.create_story(title, mode, goals)
    }

    pub fn add_event(&mut self, draft: EventDraft) -> &SparkEvent {
        self.telemetry.increment(TelemetryField::Edits, 1);
        self.sparks.add_event(draft)
    }

    pub fn update_event(&mut self, id: &EventId, patch: EventPatch) -> Option<&SparkEvent> {
        let updated = self.sparks.update_event(id, patch);
        if updated.is_some() {
            self.telemetry.increment(TelemetryField::Edits, 1);
        } else {
            tracing::warn!(event = %id, "ignoring update for unknown event");
        }
        updated
    }

    pub fn add_sub_beat(&mut self, parent: &EventId, draft: EventDraft) -> Option<EventId> {
        let id = self.sparks.add_sub_beat(parent, draft)?;
        self.record_edit();
        Some(id)
    }

    /// Add the standard regulation beat while the cursor is on Support/Tool.
    pub fn insert_regulation_beat(&mut self) -> Option<&SparkEvent> {
        let inserted = self.sparks.insert_regulation_beat();
        if inserted.is_some() {
            self.telemetry.increment(TelemetryField::Edits, 1);
        }
        inserted
    }

    /// Look up the catalog entries an event points at.
    pub fn resolve_event(&self, id: &EventId) -> Option<ResolvedEvent<'_>> {
        let event = self.sparks.event(id)?;

        let actors = event
            .actors
            .iter()
            .filter_map(|a| resolve_or_warn(self.catalog.munchie(a), "munchie", a, id))
            .collect();
        let location = event
            .location
            .as_deref()
            .and_then(|l| resolve_or_warn(self.catalog.location(l), "location", l, id));
        let buggies = event
            .buggies
            .iter()
            .filter_map(|(b, &intensity)| resolve_or_warn(self.buggie(b), "buggie", b, id).map(|b| (b, intensity)))
            .collect();
        let props = event
            .props
            .iter()
            .filter_map(|p| resolve_or_warn(self.catalog.prop(p), "prop", p, id))
            .collect();

        Some(ResolvedEvent {
            event,
            actors,
            location,
            buggies,
            props,
        })
    }

    // ---- stage cursor ----

    pub fn current_stage(&self) -> SparkStage {
        self.sparks.cursor()
    }

    pub fn jump_to_stage(&mut self, stage: SparkStage) {
        self.sparks.jump_to(stage);
        tracing::debug!(stage = stage.number(), "stage jump");
    }

    /// Step forward; a no-op at Payoff.
    pub fn next_stage(&mut self) -> bool {
        self.sparks.advance()
    }

    /// Step back; a no-op at Hook.
    pub fn previous_stage(&mut self) -> bool {
        self.sparks.retreat()
    }

    pub fn lane(&self, stage: SparkStage) -> Vec<&SparkEvent> {
        self.sparks.lane(stage).collect()
    }

    pub fn lane_progress(&self, stage: SparkStage) -> u8 {
        self.sparks.lane_progress(stage)
    }

    pub fn lane_status(&self, stage: SparkStage) -> LaneStatus {
        if stage == SparkStage::Support && self.regulation.is_active(Alert::MicroBeat) {
            LaneStatus::Attention
        } else if self.exceeded {
            LaneStatus::OverBudget
        } else if stage <= self.sparks.cursor() {
            LaneStatus::Reached
        } else {
            LaneStatus::Upcoming
        }
    }

    // ---- modes ----

    pub fn modes(&self) -> ModeSettings {
        self.config.modes
    }

    fn story_mode(&self) -> StoryMode {
        StoryMode::from_kid_mode(self.config.modes.kid_mode)
    }

    pub fn set_kid_mode(&mut self, kid_mode: bool) {
        self.config.modes.kid_mode = kid_mode;
    }

    pub fn set_read_aloud(&mut self, enabled: bool) {
        self.config.modes.read_aloud = enabled;
    }

    pub fn set_read_aloud_wpm(&mut self, wpm: u32) -> Result<(), ConfigError> {
        if wpm == 0 {
            return Err(ConfigError::ZeroReadAloudSpeed);
        }
        self.config.modes.read_aloud_wpm = wpm;
        Ok(())
    }

    /// Set the read-aloud toggle and speed together. A zero speed changes
    /// neither.
    pub fn configure_read_aloud(&mut self, enabled: bool, wpm: u32) -> Result<(), ConfigError> {
        self.set_read_aloud_wpm(wpm)?;
        self.set_read_aloud(enabled);
        Ok(())
    }

    pub fn set_pictogram_mode(&mut self, enabled: bool) {
        self.config.modes.pictogram_mode = enabled;
    }

    // ---- collaborator requests ----

    /// Scene request for an event, carrying the current budget and goals.
    pub fn scene_request(&self, id: &EventId) -> Option<SceneRequest> {
        let event = self.sparks.event(id)?;
        Some(SceneRequest {
            stage: event.spark,
            actors: event.actors.clone(),
            location: event.location.clone(),
            buggies: event.buggies.clone(),
            props: event.props.clone(),
            goals: self.story().map(|s| s.goals.clone()).unwrap_or_default(),
            budget: self.budget,
            mode: self.story_mode(),
        })
    }

    /// Regulation beat request from a prop and a Tiggie's first cue.
    pub fn regulation_beat_request(&self, prop_id: &str, tiggie_id: &str, feeling: &str) -> Option<RegulationBeatRequest> {
        let prop = self.catalog.prop(prop_id)?;
        let tiggie = self.catalog.tiggie(tiggie_id)?;
        Some(RegulationBeatRequest {
            prop: prop.name.clone(),
            cue: tiggie.cue().unwrap_or_default().to_string(),
            feeling: feeling.to_string(),
            mode: self.story_mode(),
        })
    }

    pub fn reflection_request(&self, changes: Vec<String>, effort: &str) -> ReflectionRequest {
        ReflectionRequest {
            stage: self.sparks.cursor(),
            changes,
            effort: effort.to_string(),
            mode: self.story_mode(),
        }
    }

    /// Ask for a calmer version of `text` under the current budget and caps.
    pub fn gentler_request(&self, text: &str) -> GentlerSceneRequest {
        GentlerSceneRequest::new(text, self.budget, self.config.caps)
    }

    // ---- telemetry and export ----

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn increment(&mut self, field: TelemetryField, amount: u64) {
        self.telemetry.increment(field, amount);
    }

    pub fn update_telemetry(&mut self, delta: TelemetryDelta) {
        self.telemetry.apply(delta);
    }

    pub fn snapshot(&self) -> Snapshot {
        let catalog = self.catalog.data();
        Snapshot {
            story: self.story().cloned(),
            events: self.events().to_vec(),
            munchies: catalog.munchies.clone(),
            tiggies: catalog.tiggies.clone(),
            buggies: self.buggies.clone(),
            props: catalog.props.clone(),
            locations: catalog.locations.clone(),
            telemetry: self.telemetry,
        }
    }

    pub fn export_json(&self) -> Result<String, ExportError> {
        self.snapshot().to_json()
    }

    pub fn care_note(&self) -> String {
        export::care_note(&self.buggies, self.catalog.props(), &self.telemetry)
    }

    /// Return to a fresh session over the same catalog and config. The clock
    /// restarts and mode settings go back to their configured values.
    pub fn reset(&mut self) {
        self.buggies = self.catalog.buggies().to_vec();
        self.sparks.reset();
        self.reset_budget();
        self.placements.clear();
        self.regulation.clear_all();
        self.telemetry.reset();
        self.now = Duration::ZERO;
        self.config.modes = self.initial_modes;
        self.check_initial_stressors();
        tracing::info!("session reset");
    }
}

fn resolve_or_warn<'a, T>(found: Option<&'a T>, kind: &str, id: &str, event: &EventId) -> Option<&'a T> {
    if found.is_none() {
        tracing::warn!(kind, id, event = %event, "skipping dangling reference");
    }
    found
}
