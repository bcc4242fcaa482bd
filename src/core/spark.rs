//! Spark progression: the stage cursor, the beat list and the current story.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::schema::spark::{EventDraft, EventId, EventPatch, SparkEvent, SparkStage};
use crate::schema::story::{Goals, Story, StoryId, StoryMode};

/// Title of the beat inserted by [`SparkProgression::insert_regulation_beat`].
pub const REGULATION_BEAT_TITLE: &str = "Regulation Micro-Beat";

/// Calming text of the inserted regulation beat.
pub const REGULATION_BEAT_TEXT: &str = "Take a deep breath. You can handle this challenge!";

/// Beats per stage at which a lane counts as complete.
const IDEAL_BEATS_PER_STAGE: usize = 2;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Issues event and story ids: a sequence number plus a seeded random suffix.
#[derive(Debug, Clone)]
struct IdGenerator {
    rng: StdRng,
    next: u64,
}

impl IdGenerator {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            next: 1,
        }
    }

    fn suffix(&mut self) -> String {
        (0..9)
            .map(|_| ID_ALPHABET[self.rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect()
    }

    fn issue(&mut self, prefix: &str) -> String {
        let seq = self.next;
        self.next += 1;
        format!("{prefix}-{seq}-{}", self.suffix())
    }

    fn event_id(&mut self) -> EventId {
        EventId(self.issue("event"))
    }

    fn story_id(&mut self) -> StoryId {
        StoryId(self.issue("story"))
    }
}

/// Owns the flat beat list, the current story and the stage cursor.
///
/// The cursor moves freely: jumps go anywhere in 1..=5 and single steps
/// stop at the ends without error.
#[derive(Debug, Clone)]
pub struct SparkProgression {
    events: Vec<SparkEvent>,
    story: Option<Story>,
    cursor: SparkStage,
    ids: IdGenerator,
}

impl SparkProgression {
    pub fn new(seed: u64) -> Self {
        Self {
            events: Vec::new(),
            story: None,
            cursor: SparkStage::Hook,
            ids: IdGenerator::new(seed),
        }
    }

    pub fn cursor(&self) -> SparkStage {
        self.cursor
    }

    pub fn jump_to(&mut self, stage: SparkStage) {
        self.cursor = stage;
    }

    /// Step forward one stage. Returns false at Payoff.
    pub fn advance(&mut self) -> bool {
        match self.cursor.next() {
            Some(next) => {
                self.cursor = next;
                true
            }
            None => false,
        }
    }

    /// Step back one stage. Returns false at Hook.
    pub fn retreat(&mut self) -> bool {
        match self.cursor.previous() {
            Some(previous) => {
                self.cursor = previous;
                true
            }
            None => false,
        }
    }

    pub fn story(&self) -> Option<&Story> {
        self.story.as_ref()
    }

    pub fn events(&self) -> &[SparkEvent] {
        &self.events
    }

    pub fn event(&self, id: &EventId) -> Option<&SparkEvent> {
        self.events.iter().find(|e| &e.id == id)
    }

    /// Replace the current story and drop every beat, linked or not.
    pub fn create_story(&mut self, title: &str, mode: StoryMode, goals: Goals) -> &Story {
        let story = Story::new(self.ids.story_id(), title, mode, goals);
        tracing::info!(story = %story.id, title, dropped_events = self.events.len(), "new story");
        self.events.clear();
        self.story.insert(story)
    }

    fn build_event(&mut self, draft: EventDraft) -> SparkEvent {
        let id = self.ids.event_id();
        SparkEvent::from_draft(id, draft, &mut || self.ids.event_id())
    }

    /// Record a new beat; it is linked to the current story when there is one.
    pub fn add_event(&mut self, draft: EventDraft) -> &SparkEvent {
        let event = self.build_event(draft);
        if let Some(story) = self.story.as_mut() {
            story.events.push(event.id.clone());
        }
        tracing::debug!(event = %event.id, stage = event.spark.number(), "event added");
        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    /// Merge a patch into a beat. Moving stages keeps the id and list position.
    pub fn update_event(&mut self, id: &EventId, patch: EventPatch) -> Option<&SparkEvent> {
        let event = self.events.iter_mut().find(|e| &e.id == id)?;
        event.apply(patch);
        tracing::debug!(event = %event.id, stage = event.spark.number(), "event updated");
        Some(&*event)
    }

    /// Append a child beat to a top-level beat's ordered sub-beat list.
    pub fn add_sub_beat(&mut self, parent: &EventId, draft: EventDraft) -> Option<EventId> {
        let index = self.events.iter().position(|e| &e.id == parent)?;
        let child = self.build_event(draft);
        let id = child.id.clone();
        self.events[index].sub_beats.get_or_insert_with(Vec::new).push(child);
        tracing::debug!(parent = %parent, sub_beat = %id, "sub-beat added");
        Some(id)
    }

    /// Insert the standard regulation beat. Only allowed while the cursor
    /// sits on Support/Tool.
    pub fn insert_regulation_beat(&mut self) -> Option<&SparkEvent> {
        if self.cursor != SparkStage::Support {
            return None;
        }
        let mut draft = EventDraft::new(SparkStage::Support, REGULATION_BEAT_TITLE).text(REGULATION_BEAT_TEXT);
        draft.sub_beats = Some(Vec::new());
        Some(self.add_event(draft))
    }

    /// Beats of one stage, in flat-list order.
    pub fn lane(&self, stage: SparkStage) -> impl Iterator<Item = &SparkEvent> + '_ {
        self.events.iter().filter(move |e| e.spark == stage)
    }

    /// Percent of the ideal beat count a stage holds, capped at 100.
    pub fn lane_progress(&self, stage: SparkStage) -> u8 {
        let count = self.lane(stage).count();
        (count.min(IDEAL_BEATS_PER_STAGE) * 100 / IDEAL_BEATS_PER_STAGE) as u8
    }

    /// Drop all beats and the story, and return the cursor to Hook.
    pub fn reset(&mut self) {
        self.events.clear();
        self.story = None;
        self.cursor = SparkStage::Hook;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progression() -> SparkProgression {
        SparkProgression::new(7)
    }

    #[test]
    fn cursor_steps_are_bounded() {
        let mut sparks = progression();
        assert_eq!(sparks.cursor(), SparkStage::Hook);
        assert!(!sparks.retreat());
        assert_eq!(sparks.cursor(), SparkStage::Hook);

        for _ in 0..4 {
            assert!(sparks.advance());
        }
        assert_eq!(sparks.cursor(), SparkStage::Payoff);
        assert!(!sparks.advance());
        assert_eq!(sparks.cursor(), SparkStage::Payoff);
    }

    #[test]
    fn jump_goes_anywhere() {
        let mut sparks = progression();
        sparks.jump_to(SparkStage::Support);
        assert_eq!(sparks.cursor(), SparkStage::Support);
        sparks.jump_to(SparkStage::Explore);
        assert_eq!(sparks.cursor(), SparkStage::Explore);
    }

    #[test]
    fn add_without_story_keeps_event_unlinked() {
        let mut sparks = progression();
        let id = sparks.add_event(EventDraft::new(SparkStage::Hook, "Wake up")).id.clone();
        assert_eq!(sparks.events().len(), 1);
        assert!(sparks.story().is_none());
        assert!(sparks.event(&id).is_some());
    }

    #[test]
    fn add_with_story_links_event() {
        let mut sparks = progression();
        sparks.create_story("Market day", StoryMode::Kid, Goals::new("calm", "ask for help"));
        let first = sparks.add_event(EventDraft::new(SparkStage::Hook, "Arrive")).id.clone();
        let second = sparks.add_event(EventDraft::new(SparkStage::Explore, "Look around")).id.clone();
        assert_eq!(sparks.story().map(|s| s.events.clone()), Some(vec![first, second]));
    }

    #[test]
    fn ids_are_unique() {
        let mut sparks = progression();
        let mut seen = std::collections::HashSet::new();
        for i in 0..50 {
            let id = sparks.add_event(EventDraft::new(SparkStage::Hook, format!("beat {i}"))).id.clone();
            assert!(seen.insert(id));
        }
    }

    #[test]
    fn same_seed_same_ids() {
        let mut a = SparkProgression::new(42);
        let mut b = SparkProgression::new(42);
        let id_a = a.add_event(EventDraft::new(SparkStage::Hook, "x")).id.clone();
        let id_b = b.add_event(EventDraft::new(SparkStage::Hook, "x")).id.clone();
        assert_eq!(id_a, id_b);
        assert!(id_a.0.starts_with("event-1-"));
    }

    #[test]
    fn update_moves_between_lanes_in_place() {
        let mut sparks = progression();
        let a = sparks.add_event(EventDraft::new(SparkStage::Hook, "a")).id.clone();
        let b = sparks.add_event(EventDraft::new(SparkStage::Hook, "b")).id.clone();
        let c = sparks.add_event(EventDraft::new(SparkStage::Challenge, "c")).id.clone();

        sparks.update_event(
            &b,
            EventPatch {
                spark: Some(SparkStage::Challenge),
                ..EventPatch::default()
            },
        );

        let order: Vec<&EventId> = sparks.events().iter().map(|e| &e.id).collect();
        assert_eq!(order, vec![&a, &b, &c]);
        let lane: Vec<&EventId> = sparks.lane(SparkStage::Challenge).map(|e| &e.id).collect();
        assert_eq!(lane, vec![&b, &c]);
        assert_eq!(sparks.lane(SparkStage::Hook).count(), 1);
    }

    #[test]
    fn update_unknown_is_none() {
        let mut sparks = progression();
        assert!(sparks
            .update_event(&EventId("nope".to_string()), EventPatch::default())
            .is_none());
    }

    #[test]
    fn create_story_clears_everything() {
        let mut sparks = progression();
        sparks.create_story("First", StoryMode::Kid, Goals::default());
        sparks.add_event(EventDraft::new(SparkStage::Hook, "a"));
        sparks.add_event(EventDraft::new(SparkStage::Payoff, "b"));

        let first_id = sparks.story().map(|s| s.id.clone());
        let story = sparks.create_story("Second", StoryMode::Grownup, Goals::new("brave", "wait"));
        assert!(story.events.is_empty());
        assert_eq!(story.mode, StoryMode::Grownup);
        assert_ne!(Some(story.id.clone()), first_id);
        assert!(sparks.events().is_empty());
    }

    #[test]
    fn sub_beats_stay_under_parent() {
        let mut sparks = progression();
        let parent = sparks.add_event(EventDraft::new(SparkStage::Support, "Help")).id.clone();
        let child = sparks
            .add_sub_beat(&parent, EventDraft::new(SparkStage::Support, "Breathe"))
            .unwrap();

        assert_eq!(sparks.events().len(), 1);
        let subs = sparks.event(&parent).and_then(|e| e.sub_beats.as_ref()).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].id, child);
        assert!(sparks.add_sub_beat(&EventId("ghost".to_string()), EventDraft::new(SparkStage::Hook, "x")).is_none());
    }

    #[test]
    fn drafted_sub_beats_get_engine_ids() {
        let mut sparks = progression();
        let draft = EventDraft::new(SparkStage::Support, "Help")
            .sub_beat(EventDraft::new(SparkStage::Support, "Breathe"))
            .sub_beat(EventDraft::new(SparkStage::Support, "Squeeze"));
        let parent = sparks.add_event(draft).clone();
        let later = sparks.add_event(EventDraft::new(SparkStage::Payoff, "Home")).id.clone();

        let subs = parent.sub_beats.unwrap();
        let mut ids = vec![parent.id, subs[0].id.clone(), subs[1].id.clone(), later];
        assert!(ids.iter().all(|id| id.0.starts_with("event-")));
        ids.sort_by(|a, b| a.0.cmp(&b.0));
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn regulation_beat_only_at_support() {
        let mut sparks = progression();
        assert!(sparks.insert_regulation_beat().is_none());
        sparks.jump_to(SparkStage::Support);
        let beat = sparks.insert_regulation_beat().unwrap();
        assert_eq!(beat.spark, SparkStage::Support);
        assert_eq!(beat.title, REGULATION_BEAT_TITLE);
        assert_eq!(beat.text, REGULATION_BEAT_TEXT);
        assert_eq!(beat.sub_beats, Some(Vec::new()));
    }

    #[test]
    fn lane_progress_caps_at_full() {
        let mut sparks = progression();
        assert_eq!(sparks.lane_progress(SparkStage::Hook), 0);
        sparks.add_event(EventDraft::new(SparkStage::Hook, "a"));
        assert_eq!(sparks.lane_progress(SparkStage::Hook), 50);
        sparks.add_event(EventDraft::new(SparkStage::Hook, "b"));
        sparks.add_event(EventDraft::new(SparkStage::Hook, "c"));
        assert_eq!(sparks.lane_progress(SparkStage::Hook), 100);
    }

    #[test]
    fn reset_returns_to_start() {
        let mut sparks = progression();
        sparks.create_story("x", StoryMode::Kid, Goals::default());
        sparks.add_event(EventDraft::new(SparkStage::Hook, "a"));
        sparks.jump_to(SparkStage::Payoff);
        sparks.reset();
        assert!(sparks.story().is_none());
        assert!(sparks.events().is_empty());
        assert_eq!(sparks.cursor(), SparkStage::Hook);
    }
}
