//! WASM bindings for curmunchkins-engine: powers the browser story studio.

use std::time::Duration;
use wasm_bindgen::prelude::*;

use curmunchkins_engine::core::regulation::Alert;
use curmunchkins_engine::core::session::{LaneStatus, Session};
use curmunchkins_engine::schema::spark::{EventDraft, EventId, EventPatch, SparkEvent, SparkStage};
use curmunchkins_engine::schema::story::Goals;

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct LaneInfo<'a> {
    stage: u8,
    name: &'static str,
    description: &'static str,
    progress: u8,
    status: LaneStatus,
    events: Vec<&'a SparkEvent>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct BudgetInfo {
    budget: curmunchkins_engine::core::budget::SensoryBudget,
    exceeded: bool,
    total: u32,
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

fn parse_alert(s: &str) -> Result<Alert, JsError> {
    // Same names `tick` serializes
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| JsError::new(&format!("Unknown alert: {s}")))
}

// ---------------------------------------------------------------------------
// StoryStudio: the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct StoryStudio {
    session: Session,
    seed: u64,
}

#[wasm_bindgen]
impl StoryStudio {
    /// Start a session over the bundled catalog.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<StoryStudio, JsError> {
        let session = Session::builder()
            .seed(seed)
            .build()
            .map_err(|e| JsError::new(&format!("Session build error: {e}")))?;
        Ok(StoryStudio { session, seed })
    }

    /// The full catalog as JSON, with session intensities for buggies.
    pub fn catalog(&self) -> Result<String, JsError> {
        let snapshot = self.session.snapshot();
        to_json(&serde_json::json!({
            "munchies": snapshot.munchies,
            "tiggies": snapshot.tiggies,
            "buggies": snapshot.buggies,
            "props": snapshot.props,
            "locations": snapshot.locations,
        }))
    }

    /// Recompute the budget. `props_json` is a JSON array of prop ids.
    pub fn apply_budget(&mut self, location_id: &str, props_json: &str) -> Result<String, JsError> {
        let props: Vec<String> = serde_json::from_str(props_json)
            .map_err(|e| JsError::new(&format!("Invalid props JSON: {e}")))?;
        self.session
            .apply_budget(location_id, &props)
            .map_err(|e| JsError::new(&e.to_string()))?;
        self.budget()
    }

    pub fn reset_budget(&mut self) {
        self.session.reset_budget();
    }

    pub fn move_character(&mut self, munchie_id: &str, location_id: &str) -> Result<String, JsError> {
        self.session
            .move_character_to_location(munchie_id, location_id)
            .map_err(|e| JsError::new(&e.to_string()))?;
        self.budget()
    }

    /// Current budget as `{"budget": {...}, "exceeded": bool, "total": n}`.
    pub fn budget(&self) -> Result<String, JsError> {
        let budget = self.session.budget();
        to_json(&BudgetInfo {
            budget,
            exceeded: self.session.is_exceeded(),
            total: budget.total(),
        })
    }

    /// Returns the stored intensity, or an error for an unknown buggie.
    pub fn adjust_buggie(&mut self, buggie_id: &str, intensity: i32) -> Result<u8, JsError> {
        self.session
            .adjust_buggie_intensity(buggie_id, intensity as i64)
            .ok_or_else(|| JsError::new(&format!("Unknown buggie: {buggie_id}")))
    }

    pub fn trigger_micro_beat(&mut self) {
        self.session.trigger_micro_beat();
    }

    pub fn trigger_pause_and_breathe(&mut self) {
        self.session.trigger_pause_and_breathe();
    }

    /// Acknowledge `"micro_beat"` or `"pause_and_breathe"`, the names `tick`
    /// reports.
    pub fn acknowledge(&mut self, alert: &str) -> Result<bool, JsError> {
        Ok(self.session.acknowledge(parse_alert(alert)?))
    }

    pub fn clear_regulation(&mut self) {
        self.session.clear_regulation();
    }

    /// Advance the session clock. Returns a JSON array of auto-cleared alerts.
    pub fn tick(&mut self, elapsed_ms: u32) -> Result<String, JsError> {
        let expired = self.session.advance(Duration::from_millis(elapsed_ms as u64));
        to_json(&expired)
    }

    pub fn regulation(&self) -> Result<String, JsError> {
        to_json(&self.session.regulation())
    }

    pub fn create_story(&mut self, title: &str, emotional: &str, skill: &str) -> Result<String, JsError> {
        let story = self.session.create_new_story(title, Goals::new(emotional, skill));
        to_json(story)
    }

    /// Add a beat from a draft JSON such as
    /// `{"spark": 3, "title": "Drums", "buggies": {"loud-noises": 4}}`.
    pub fn add_event(&mut self, draft_json: &str) -> Result<String, JsError> {
        let draft: EventDraft = serde_json::from_str(draft_json)
            .map_err(|e| JsError::new(&format!("Invalid event JSON: {e}")))?;
        let event = self.session.add_event(draft);
        to_json(event)
    }

    pub fn update_event(&mut self, event_id: &str, patch_json: &str) -> Result<String, JsError> {
        let patch: EventPatch = serde_json::from_str(patch_json)
            .map_err(|e| JsError::new(&format!("Invalid patch JSON: {e}")))?;
        let event = self
            .session
            .update_event(&EventId(event_id.to_string()), patch)
            .ok_or_else(|| JsError::new(&format!("Unknown event: {event_id}")))?;
        to_json(event)
    }

    /// Returns the new sub-beat's id.
    pub fn add_sub_beat(&mut self, parent_id: &str, draft_json: &str) -> Result<String, JsError> {
        let draft: EventDraft = serde_json::from_str(draft_json)
            .map_err(|e| JsError::new(&format!("Invalid event JSON: {e}")))?;
        self.session
            .add_sub_beat(&EventId(parent_id.to_string()), draft)
            .map(|id| id.0)
            .ok_or_else(|| JsError::new(&format!("Unknown event: {parent_id}")))
    }

    /// The inserted beat as JSON, or `None` when the cursor is not on Support.
    pub fn insert_regulation_beat(&mut self) -> Result<Option<String>, JsError> {
        self.session.insert_regulation_beat().map(to_json).transpose()
    }

    pub fn current_stage(&self) -> u8 {
        self.session.current_stage().number()
    }

    /// Jump to a stage; out-of-range numbers are clamped into 1..=5.
    pub fn jump_to_stage(&mut self, stage: i32) {
        self.session.jump_to_stage(SparkStage::clamped(stage as i64));
    }

    pub fn next_stage(&mut self) -> bool {
        self.session.next_stage()
    }

    pub fn previous_stage(&mut self) -> bool {
        self.session.previous_stage()
    }

    /// All five lanes with progress, status and beats.
    pub fn lanes(&self) -> Result<String, JsError> {
        let lanes: Vec<LaneInfo> = SparkStage::ALL
            .iter()
            .map(|&stage| LaneInfo {
                stage: stage.number(),
                name: stage.name(),
                description: stage.description(),
                progress: self.session.lane_progress(stage),
                status: self.session.lane_status(stage),
                events: self.session.lane(stage),
            })
            .collect();
        to_json(&lanes)
    }

    pub fn set_kid_mode(&mut self, kid_mode: bool) {
        self.session.set_kid_mode(kid_mode);
    }

    /// A zero `wpm` is rejected and leaves both settings unchanged.
    pub fn set_read_aloud(&mut self, enabled: bool, wpm: u32) -> Result<(), JsError> {
        self.session
            .configure_read_aloud(enabled, wpm)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn set_pictogram_mode(&mut self, enabled: bool) {
        self.session.set_pictogram_mode(enabled);
    }

    pub fn modes(&self) -> Result<String, JsError> {
        to_json(&self.session.modes())
    }

    /// The request the front end sends to its text service for a beat.
    pub fn scene_request(&self, event_id: &str) -> Result<String, JsError> {
        let request = self
            .session
            .scene_request(&EventId(event_id.to_string()))
            .ok_or_else(|| JsError::new(&format!("Unknown event: {event_id}")))?;
        to_json(&request)
    }

    pub fn gentler_request(&self, text: &str) -> Result<String, JsError> {
        to_json(&self.session.gentler_request(text))
    }

    pub fn telemetry(&self) -> Result<String, JsError> {
        to_json(self.session.telemetry())
    }

    pub fn export_json(&self) -> Result<String, JsError> {
        self.session
            .export_json()
            .map_err(|e| JsError::new(&format!("Export error: {e}")))
    }

    pub fn care_note(&self) -> String {
        self.session.care_note()
    }

    /// Start over with a new seed, keeping mode settings.
    pub fn reset(&mut self, seed: u64) -> Result<(), JsError> {
        let modes = self.session.modes();
        let fresh = StoryStudio::new(seed)?;
        self.session = fresh.session;
        self.seed = seed;
        self.session.set_kid_mode(modes.kid_mode);
        self.session.set_read_aloud(modes.read_aloud);
        self.session.set_pictogram_mode(modes.pictogram_mode);
        self.session
            .set_read_aloud_wpm(modes.read_aloud_wpm)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return JSON array of stage names, in order.
    pub fn stage_names() -> String {
        let names: Vec<&str> = SparkStage::ALL.iter().map(|s| s.name()).collect();
        serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string())
    }
}
