//! Pattern sequence controller.
//!
//! Owns the pattern catalog, the sequence table, and the current position as
//! one unit behind a single lock. Every mutation path (the control surface,
//! the advance listener, the trigger) funnels through [`SlmController`], and
//! display dispatch happens while the lock is held so the display sink sees
//! updates in exactly the order positions change.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
};

use display::DisplaySink;
use patterns::PatternStore;
use shared::{
    domain::{Pattern, SequenceEntry, TriggerMode, TriggerType},
    error::SlmError,
};
use tracing::{debug, info};

mod rotator;

pub use rotator::Rotator;

struct ControllerState {
    position: usize,
    catalog: Vec<PathBuf>,
    sequence: Vec<SequenceEntry>,
}

pub struct SlmController {
    state: Mutex<ControllerState>,
    store: PatternStore,
    sink: Arc<dyn DisplaySink>,
}

impl std::fmt::Debug for SlmController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlmController").finish_non_exhaustive()
    }
}

impl SlmController {
    /// Builds the default catalog from the patterns directory and shows the
    /// pattern at position 0. Fails if the directory holds no patterns: the
    /// catalog must never be empty once the controller exists.
    pub fn new(store: PatternStore, sink: Arc<dyn DisplaySink>) -> Result<Self, SlmError> {
        let catalog = store.list()?;
        if catalog.is_empty() {
            return Err(SlmError::provisioning(format!(
                "patterns directory '{}' holds no patterns",
                store.root().display()
            )));
        }
        info!(patterns = catalog.len(), "pattern catalog built");

        let first = Pattern {
            position: 0,
            path: catalog[0].clone(),
        };
        let controller = Self {
            state: Mutex::new(ControllerState {
                position: 0,
                catalog,
                sequence: Vec::new(),
            }),
            store,
            sink,
        };
        controller.sink.show(first);
        Ok(controller)
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().expect("controller state lock poisoned")
    }

    /// Assigns a new sequence: provisions one pattern file per entry, then
    /// swaps catalog and sequence table together. A half-updated pairing is
    /// never observable. Returns the new catalog length.
    pub fn set_sequence(&self, entries: &[SequenceEntry]) -> Result<usize, SlmError> {
        if entries.is_empty() {
            return Err(SlmError::unsupported(
                "cannot assign an empty sequence, the catalog must stay non-empty",
            ));
        }

        // Provisioning touches the filesystem, keep it outside the lock.
        let mut catalog = Vec::with_capacity(entries.len());
        for entry in entries {
            catalog.push(self.store.ensure(entry)?);
        }

        let mut state = self.lock();
        state.catalog = catalog;
        state.sequence = entries.to_vec();
        // The position survives re-assignment, clamped so it stays a valid
        // catalog index when the new sequence is shorter.
        state.position = state.position.min(state.catalog.len() - 1);
        info!(len = state.catalog.len(), "sequence assigned");
        Ok(state.catalog.len())
    }

    /// Current position in the series. No side effects.
    pub fn position(&self) -> usize {
        self.lock().position
    }

    pub fn pattern_count(&self) -> usize {
        self.lock().catalog.len()
    }

    /// Jumps to `position` and hands the pattern there to the display sink.
    pub fn cycle_to(&self, position: usize) -> Result<(), SlmError> {
        let mut state = self.lock();
        self.jump(&mut state, position)
    }

    /// One advance pulse: next position, wrapping around. Read and jump under
    /// one lock acquisition so concurrent pulses never skip or repeat.
    pub fn advance(&self) -> Result<usize, SlmError> {
        let mut state = self.lock();
        let next = (state.position + 1) % state.catalog.len();
        self.jump(&mut state, next)?;
        Ok(next)
    }

    fn jump(&self, state: &mut ControllerState, position: usize) -> Result<(), SlmError> {
        let len = state.catalog.len();
        if position >= len {
            return Err(SlmError::OutOfRange { position, len });
        }
        state.position = position;
        debug!(position, "cycling to position");
        self.sink.show(Pattern {
            position,
            path: state.catalog[position].clone(),
        });
        Ok(())
    }

    /// Diffraction angle at the current position. Default patterns carry no
    /// physical metadata, so this fails until a sequence has been assigned.
    pub fn diffraction_angle(&self) -> Result<f64, SlmError> {
        let state = self.lock();
        state
            .sequence
            .get(state.position)
            .map(|entry| entry.angle)
            .ok_or(SlmError::NoSequenceAssigned)
    }

    /// Directed move along the angle axis: jumps to the first entry (in
    /// table order) with the requested angle whose phase and wavelength
    /// match the current entry's. Returns the position reached. On failure
    /// the position is unchanged.
    pub fn set_diffraction_angle(&self, angle: f64) -> Result<usize, SlmError> {
        let mut state = self.lock();
        let current = *state
            .sequence
            .get(state.position)
            .ok_or(SlmError::NoSequenceAssigned)?;

        let target = state.sequence.iter().position(|entry| {
            entry.angle == angle
                && entry.phase == current.phase
                && entry.wavelength == current.wavelength
        });
        match target {
            Some(position) => {
                self.jump(&mut state, position)?;
                Ok(position)
            }
            None => Err(SlmError::NoMatchingSequence { angle }),
        }
    }

    pub fn trigger_type(&self) -> TriggerType {
        TriggerType::Software
    }

    pub fn trigger_mode(&self) -> TriggerMode {
        TriggerMode::Once
    }

    /// The device supports exactly one trigger configuration; asking for it
    /// is a no-op, anything else is rejected.
    pub fn set_trigger(&self, ttype: TriggerType, tmode: TriggerMode) -> Result<(), SlmError> {
        if ttype != TriggerType::Software {
            return Err(SlmError::unsupported(
                "the only trigger type supported is software",
            ));
        }
        if tmode != TriggerMode::Once {
            return Err(SlmError::unsupported(
                "the only trigger mode supported is once",
            ));
        }
        Ok(())
    }

    /// Fires the software trigger: one advance step.
    pub fn trigger(&self) -> Result<usize, SlmError> {
        self.advance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use display::{NullSink, RecordingSink};
    use std::fs;
    use tempfile::TempDir;

    fn seeded_store(default_patterns: &[&str]) -> (TempDir, PatternStore) {
        let dir = TempDir::new().expect("tempdir");
        // Template lives outside the listed directory so counts stay exact.
        let template = dir.path().join("orig_pattern1.jpg");
        fs::write(&template, b"template").expect("template");
        let root = dir.path().join("patterns");
        fs::create_dir(&root).expect("patterns dir");
        for name in default_patterns {
            fs::write(root.join(name), b"pattern").expect("pattern");
        }
        let store = PatternStore::open(root, &template).expect("store");
        (dir, store)
    }

    fn controller_with_recorder(
        default_patterns: &[&str],
    ) -> (TempDir, Arc<RecordingSink>, SlmController) {
        let (dir, store) = seeded_store(default_patterns);
        let sink = Arc::new(RecordingSink::default());
        let controller = SlmController::new(store, sink.clone()).expect("controller");
        (dir, sink, controller)
    }

    fn three_step_sequence() -> Vec<SequenceEntry> {
        vec![
            SequenceEntry::new(10.0, 100.0, 1000.0),
            SequenceEntry::new(20.0, 200.0, 2000.0),
            SequenceEntry::new(30.0, 300.0, 3000.0),
        ]
    }

    #[test]
    fn construction_fails_on_empty_patterns_directory() {
        let dir = TempDir::new().expect("tempdir");
        let store =
            PatternStore::open(dir.path(), dir.path().join("orig.jpg")).expect("store");
        let err = SlmController::new(store, Arc::new(NullSink)).expect_err("must fail");
        assert!(matches!(err, SlmError::Provisioning(_)));
    }

    #[test]
    fn construction_shows_the_first_pattern() {
        let (_dir, sink, _controller) = controller_with_recorder(&["a.jpg", "b.jpg"]);
        let shown = sink.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].position, 0);
    }

    #[test]
    fn assigning_a_sequence_pairs_catalog_and_table() {
        let (_dir, _sink, controller) = controller_with_recorder(&["a.jpg"]);
        let len = controller
            .set_sequence(&three_step_sequence())
            .expect("assign");
        assert_eq!(len, 3);
        assert_eq!(controller.pattern_count(), 3);
        // Position is untouched by assignment.
        assert_eq!(controller.position(), 0);
    }

    #[test]
    fn assigning_an_empty_sequence_is_rejected() {
        let (_dir, _sink, controller) = controller_with_recorder(&["a.jpg"]);
        let err = controller.set_sequence(&[]).expect_err("must fail");
        assert!(matches!(err, SlmError::UnsupportedFeature(_)));
        assert_eq!(controller.pattern_count(), 1);
    }

    #[test]
    fn reassignment_clamps_a_now_invalid_position() {
        let (_dir, _sink, controller) = controller_with_recorder(&["a.jpg", "b.jpg"]);
        controller
            .set_sequence(&three_step_sequence())
            .expect("assign");
        controller.cycle_to(2).expect("jump");

        controller
            .set_sequence(&[SequenceEntry::new(0.0, 0.0, 450.0)])
            .expect("reassign");
        assert_eq!(controller.position(), 0);
        assert_eq!(controller.pattern_count(), 1);
    }

    #[test]
    fn cycle_to_updates_position_and_displays() {
        let (_dir, sink, controller) = controller_with_recorder(&["a.jpg", "b.jpg"]);
        controller.cycle_to(1).expect("jump");
        assert_eq!(controller.position(), 1);

        let shown = sink.shown();
        assert_eq!(shown.last().expect("shown").position, 1);
    }

    #[test]
    fn cycle_to_out_of_range_leaves_position_unchanged() {
        let (_dir, sink, controller) = controller_with_recorder(&["a.jpg", "b.jpg"]);
        let before = sink.shown().len();
        let err = controller.cycle_to(5).expect_err("must fail");
        assert_eq!(
            err,
            SlmError::OutOfRange {
                position: 5,
                len: 2
            }
        );
        assert_eq!(controller.position(), 0);
        assert_eq!(sink.shown().len(), before);
    }

    #[test]
    fn advance_wraps_around_the_catalog() {
        let (_dir, _sink, controller) = controller_with_recorder(&["a.jpg", "b.jpg"]);
        assert_eq!(controller.advance().expect("advance"), 1);
        assert_eq!(controller.advance().expect("advance"), 0);
    }

    #[test]
    fn angle_follows_the_current_position() {
        let (_dir, _sink, controller) = controller_with_recorder(&["a.jpg"]);
        controller
            .set_sequence(&three_step_sequence())
            .expect("assign");
        controller.cycle_to(1).expect("jump");
        assert_eq!(controller.diffraction_angle().expect("angle"), 20.0);
    }

    #[test]
    fn angle_query_without_a_sequence_fails() {
        let (_dir, _sink, controller) = controller_with_recorder(&["a.jpg", "b.jpg"]);
        let err = controller.diffraction_angle().expect_err("must fail");
        assert_eq!(err, SlmError::NoSequenceAssigned);
    }

    #[test]
    fn resolving_a_unique_angle_succeeds_without_spurious_error() {
        let (_dir, _sink, controller) = controller_with_recorder(&["a.jpg"]);
        controller
            .set_sequence(&[
                SequenceEntry::new(0.0, 0.0, 450.0),
                SequenceEntry::new(60.0, 0.0, 450.0),
            ])
            .expect("assign");

        let position = controller.set_diffraction_angle(60.0).expect("resolve");
        assert_eq!(position, 1);
        assert_eq!(controller.diffraction_angle().expect("angle"), 60.0);
    }

    #[test]
    fn resolving_the_current_angle_is_idempotent() {
        let (_dir, _sink, controller) = controller_with_recorder(&["a.jpg"]);
        controller
            .set_sequence(&three_step_sequence())
            .expect("assign");
        controller.cycle_to(1).expect("jump");

        let position = controller.set_diffraction_angle(20.0).expect("resolve");
        assert_eq!(position, 1);
        assert_eq!(controller.position(), 1);
    }

    #[test]
    fn resolving_holds_phase_and_wavelength_fixed() {
        let (_dir, _sink, controller) = controller_with_recorder(&["a.jpg"]);
        // Same angle twice, but only one entry shares the current phase and
        // wavelength.
        controller
            .set_sequence(&[
                SequenceEntry::new(0.0, 0.0, 450.0),
                SequenceEntry::new(60.0, 90.0, 520.0),
                SequenceEntry::new(60.0, 0.0, 450.0),
            ])
            .expect("assign");

        let position = controller.set_diffraction_angle(60.0).expect("resolve");
        assert_eq!(position, 2);
    }

    #[test]
    fn resolving_an_unknown_angle_fails_and_keeps_position() {
        let (_dir, _sink, controller) = controller_with_recorder(&["a.jpg"]);
        controller
            .set_sequence(&three_step_sequence())
            .expect("assign");
        controller.cycle_to(1).expect("jump");

        let err = controller.set_diffraction_angle(45.0).expect_err("must fail");
        assert_eq!(err, SlmError::NoMatchingSequence { angle: 45.0 });
        assert_eq!(controller.position(), 1);
    }

    #[test]
    fn trigger_gate_accepts_only_software_once() {
        let (_dir, _sink, controller) = controller_with_recorder(&["a.jpg", "b.jpg"]);
        controller
            .set_trigger(TriggerType::Software, TriggerMode::Once)
            .expect("supported pair");

        let err = controller
            .set_trigger(TriggerType::RisingEdge, TriggerMode::Once)
            .expect_err("type rejected");
        assert!(matches!(err, SlmError::UnsupportedFeature(_)));

        let err = controller
            .set_trigger(TriggerType::Software, TriggerMode::Strobe)
            .expect_err("mode rejected");
        assert!(matches!(err, SlmError::UnsupportedFeature(_)));

        assert_eq!(controller.trigger_type(), TriggerType::Software);
        assert_eq!(controller.trigger_mode(), TriggerMode::Once);
    }

    #[test]
    fn firing_the_trigger_advances_one_step() {
        let (_dir, _sink, controller) = controller_with_recorder(&["a.jpg", "b.jpg"]);
        assert_eq!(controller.trigger().expect("fire"), 1);
        assert_eq!(controller.position(), 1);
    }
}
