//! Interactive map session.
//!
//! [`MapSession`] owns the store, the selection and the marker layer, and
//! turns pointer input and menu actions into store mutations. Every action
//! ends the same way: reload the snapshot, reconcile the selection, rebuild
//! the layer.

use std::path::Path;
use tracing::{debug, info};

use super::marker::{Effect, Marker};
use super::render::MarkerLayer;
use crate::codec::{self, ExportStats, ImportStats};
use crate::config::{Settings, UiState};
use crate::error::{Error, Result};
use crate::model::{
    Geocache, GeocacheForm, GeocacheId, Location, Person, PersonForm, PersonId, Snapshot,
};
use crate::selection::Selection;
use crate::storage::Store;

/// Mouse button of a pointer press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// A pointer press on the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// World coordinate under the pointer
    pub location: Location,
    pub button: MouseButton,
    /// Index of the topmost marker under the pointer, if the press hit one
    pub target: Option<usize>,
}

/// What a pointer press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    /// A marker consumed the press
    Marker(Effect),
    /// The press reached the map background
    Background,
}

/// The map engine driven by a widget or the CLI.
pub struct MapSession<S: Store> {
    store: S,
    settings: Settings,
    selection: Selection,
    latest_click: Option<Location>,
    snapshot: Snapshot,
    layer: MarkerLayer,
}

impl<S: Store> MapSession<S> {
    /// Start a session with nothing selected.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn new(store: S, settings: Settings) -> Result<Self> {
        Self::with_state(store, settings, UiState::default())
    }

    /// Start a session from saved interaction state.
    ///
    /// A saved selection whose person no longer exists is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn with_state(store: S, settings: Settings, state: UiState) -> Result<Self> {
        let mut session = Self {
            store,
            settings,
            selection: state.selection,
            latest_click: state.latest_click,
            snapshot: Snapshot::default(),
            layer: MarkerLayer::new(),
        };
        session.refresh()?;
        Ok(session)
    }

    /// Reload the snapshot and rebuild every marker.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn refresh(&mut self) -> Result<()> {
        self.snapshot = Snapshot::load(&self.store)?;
        self.selection.reconcile(&self.snapshot);
        self.layer.rebuild(&self.snapshot, &self.selection);
        Ok(())
    }

    /// Build a pointer event for a coordinate, hit-testing the markers.
    #[must_use]
    pub fn hit_test(&self, location: Location, button: MouseButton) -> PointerEvent {
        PointerEvent {
            location,
            button,
            target: self.layer.topmost_at(&location, self.settings.pin_radius),
        }
    }

    /// Dispatch a pointer press.
    ///
    /// A press on a marker is consumed by the marker and never reaches the
    /// background handler.
    ///
    /// # Errors
    ///
    /// Returns an error if the target index is stale or the store fails.
    pub fn pointer(&mut self, event: PointerEvent) -> Result<PointerOutcome> {
        match event.target {
            Some(index) => Ok(PointerOutcome::Marker(self.click_marker(index)?)),
            None => {
                self.click_background(event.location, event.button)?;
                Ok(PointerOutcome::Background)
            }
        }
    }

    /// Press the marker at `index` (any button).
    ///
    /// # Errors
    ///
    /// Returns `Error::MarkerNotFound` for an index outside the layer, or a
    /// store error.
    pub fn click_marker(&mut self, index: usize) -> Result<Effect> {
        let effect = self
            .layer
            .get(index)
            .map(Marker::effect)
            .ok_or(Error::MarkerNotFound {
                index,
                count: self.layer.len(),
            })?;
        debug!(index, ?effect, "Marker clicked");

        match effect {
            Effect::Select { person } => self.selection.select(person),
            Effect::MarkFound { relation } => self.store.add_found(relation)?,
            Effect::Unfind { relation } => {
                self.store.remove_found(relation)?;
            }
            Effect::Absorb => {}
        }

        self.refresh()?;
        Ok(effect)
    }

    /// Press the map background.
    ///
    /// Any button records the location for the next add action; the left
    /// button also clears the selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn click_background(&mut self, location: Location, button: MouseButton) -> Result<()> {
        debug!(%location, ?button, "Background clicked");
        self.latest_click = Some(location);
        if button == MouseButton::Left {
            self.selection.reset();
        }
        self.refresh()
    }

    /// Make `person` active without going through a marker.
    ///
    /// # Errors
    ///
    /// Returns `Error::PersonNotFound` if the person does not exist.
    pub fn select_person(&mut self, person: PersonId) -> Result<()> {
        if self.snapshot.person(person).is_none() {
            return Err(Error::PersonNotFound { id: person });
        }
        self.selection.select(person);
        self.refresh()
    }

    /// Add a person at the latest click location.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoClickLocation` before any background click,
    /// `Error::Validation` for bad fields, or a store error.
    pub fn add_person(&mut self, form: &PersonForm) -> Result<Person> {
        let location = self.latest_click.ok_or(Error::NoClickLocation)?;
        let person = self.store.add_person(form, location)?;
        self.selection.reset();
        self.refresh()?;
        Ok(person)
    }

    /// Add a geocache owned by the active person at the latest click location.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoActivePerson` when nobody is selected,
    /// `Error::NoClickLocation` before any background click,
    /// `Error::Validation` for bad fields, or a store error.
    pub fn add_geocache(&mut self, form: &GeocacheForm) -> Result<Geocache> {
        let owner = self.selection.active().ok_or(Error::NoActivePerson)?;
        let location = self.latest_click.ok_or(Error::NoClickLocation)?;

        let geocache = Geocache {
            id: self.snapshot.next_geocache_id(self.settings.id_scheme),
            owner: Some(owner),
            location,
            contents: form.contents.clone(),
            message: form.message.clone(),
        };
        self.store.add_geocache(&geocache)?;

        self.selection.reset();
        self.refresh()?;
        Ok(geocache)
    }

    /// Remove a person together with their found relations.
    ///
    /// # Errors
    ///
    /// Returns `Error::PersonNotFound` if the person does not exist.
    pub fn remove_person(&mut self, id: PersonId) -> Result<()> {
        if !self.store.remove_person(id)? {
            return Err(Error::PersonNotFound { id });
        }
        self.refresh()
    }

    /// Remove a geocache together with its found relations.
    ///
    /// # Errors
    ///
    /// Returns `Error::GeocacheNotFound` if the geocache does not exist.
    pub fn remove_geocache(&mut self, id: GeocacheId) -> Result<()> {
        if !self.store.remove_geocache(id)? {
            return Err(Error::GeocacheNotFound { id });
        }
        self.refresh()
    }

    /// Replace the store contents with `text`.
    ///
    /// The selection is cleared whether or not the import succeeds.
    ///
    /// # Errors
    ///
    /// Returns a format, referential or store error.
    pub fn import_text(&mut self, text: &str) -> Result<ImportStats> {
        self.selection.reset();
        let result = codec::import(&mut self.store, text, self.settings.atomic_import);
        self.refresh()?;
        result
    }

    /// Encode the current snapshot.
    #[must_use]
    pub fn export_text(&self) -> (String, ExportStats) {
        codec::encode(&self.snapshot)
    }

    /// Load the map from a text file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, otherwise as
    /// [`MapSession::import_text`].
    pub fn load_file(&mut self, path: &Path) -> Result<ImportStats> {
        let text = codec::read_text(path)?;
        let stats = self.import_text(&text)?;
        info!(path = %path.display(), total = stats.total(), "Loaded map");
        Ok(stats)
    }

    /// Save the map to a text file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be written.
    pub fn save_file(&self, path: &Path) -> Result<ExportStats> {
        let (text, stats) = self.export_text();
        codec::atomic_write(path, &text)?;
        info!(path = %path.display(), persons = stats.persons, "Saved map");
        Ok(stats)
    }

    /// Interaction state to persist between runs.
    #[must_use]
    pub fn state(&self) -> UiState {
        UiState {
            selection: self.selection,
            latest_click: self.latest_click,
        }
    }

    #[must_use]
    pub fn selection(&self) -> Selection {
        self.selection
    }

    #[must_use]
    pub fn latest_click(&self) -> Option<Location> {
        self.latest_click
    }

    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        self.layer.markers()
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Hand the store back, ending the session.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::marker::{Color, MarkerKind};
    use crate::model::{FoundRelation, IdScheme};
    use crate::storage::SqliteStorage;

    fn session() -> MapSession<SqliteStorage> {
        MapSession::new(SqliteStorage::open_memory().unwrap(), Settings::default()).unwrap()
    }

    fn form(first: &str) -> PersonForm {
        PersonForm {
            first_name: first.to_string(),
            last_name: "Smith".to_string(),
            country: "SE".to_string(),
            city: "Gothenburg".to_string(),
            street_name: "MainSt".to_string(),
            street_number: 5,
        }
    }

    fn cache_form() -> GeocacheForm {
        GeocacheForm {
            contents: "key".to_string(),
            message: "hi".to_string(),
        }
    }

    fn left(location: Location) -> PointerEvent {
        PointerEvent {
            location,
            button: MouseButton::Left,
            target: None,
        }
    }

    /// Two persons, one geocache owned by Alice. Returns (alice, bob, cache).
    fn populated() -> (MapSession<SqliteStorage>, PersonId, PersonId, GeocacheId) {
        let mut s = session();
        s.click_background(Location::new(57.70, 11.97), MouseButton::Left)
            .unwrap();
        let alice = s.add_person(&form("Alice")).unwrap().id;
        s.click_background(Location::new(57.60, 11.90), MouseButton::Left)
            .unwrap();
        let bob = s.add_person(&form("Bob")).unwrap().id;

        s.select_person(alice).unwrap();
        s.click_background(Location::new(57.71, 11.98), MouseButton::Right)
            .unwrap();
        let cache = s.add_geocache(&cache_form()).unwrap().id;
        (s, alice, bob, cache)
    }

    fn index_of(s: &MapSession<SqliteStorage>, pred: impl Fn(&MarkerKind) -> bool) -> usize {
        s.markers().iter().position(|m| pred(&m.kind)).unwrap()
    }

    fn person_marker(s: &MapSession<SqliteStorage>, id: PersonId) -> usize {
        index_of(s, |k| matches!(k, MarkerKind::Person { id: p, .. } if *p == id))
    }

    fn geocache_marker(s: &MapSession<SqliteStorage>, id: GeocacheId) -> usize {
        index_of(s, |k| matches!(k, MarkerKind::Geocache { id: g, .. } if *g == id))
    }

    #[test]
    fn test_add_person_requires_click() {
        let mut s = session();
        let err = s.add_person(&form("Alice")).unwrap_err();
        assert!(matches!(err, Error::NoClickLocation));
    }

    #[test]
    fn test_add_geocache_requires_selection() {
        let mut s = session();
        s.click_background(Location::new(57.7, 11.9), MouseButton::Left)
            .unwrap();
        let err = s.add_geocache(&cache_form()).unwrap_err();
        assert!(matches!(err, Error::NoActivePerson));
        assert!(s.snapshot().geocaches().is_empty());
    }

    #[test]
    fn test_add_geocache_resets_selection_and_places_at_click() {
        let (s, alice, _, cache) = populated();
        assert_eq!(s.selection(), Selection::Unselected);

        let geocache = s.snapshot().geocache(cache).unwrap();
        assert_eq!(geocache.owner, Some(alice));
        assert_eq!(geocache.location, Location::new(57.71, 11.98));
        assert_eq!(cache, GeocacheId(1));
    }

    #[test]
    fn test_legacy_id_scheme() {
        let settings = Settings {
            id_scheme: IdScheme::Legacy,
            ..Settings::default()
        };
        let mut s = MapSession::new(SqliteStorage::open_memory().unwrap(), settings).unwrap();
        s.click_background(Location::new(57.7, 11.9), MouseButton::Left)
            .unwrap();
        let alice = s.add_person(&form("Alice")).unwrap().id;

        let mut ids = Vec::new();
        for _ in 0..3 {
            s.select_person(alice).unwrap();
            ids.push(s.add_geocache(&cache_form()).unwrap().id.0);
        }
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn test_claim_and_unfind() {
        let (mut s, _, bob, cache) = populated();

        s.click_marker(person_marker(&s, bob)).unwrap();
        assert_eq!(s.selection(), Selection::Selected(bob));

        let red = geocache_marker(&s, cache);
        assert_eq!(s.markers()[red].color(), Color::Red);
        let effect = s.click_marker(red).unwrap();
        assert_eq!(
            effect,
            Effect::MarkFound {
                relation: FoundRelation::new(bob, cache)
            }
        );
        assert_eq!(s.selection(), Selection::Selected(bob));
        assert!(s.snapshot().is_found(bob, cache));

        let green = s.markers().len() - 1;
        assert_eq!(s.markers()[green].color(), Color::Green);
        s.click_marker(green).unwrap();
        assert!(!s.snapshot().is_found(bob, cache));
        assert!(s.markers().iter().all(|m| m.color() != Color::Green));

        // Re-selecting does not bring the found marker back
        s.click_marker(person_marker(&s, bob)).unwrap();
        assert!(s.markers().iter().all(|m| m.color() != Color::Green));
    }

    #[test]
    fn test_owned_pin_is_absorbed() {
        let (mut s, alice, _, cache) = populated();
        s.select_person(alice).unwrap();

        let black = geocache_marker(&s, cache);
        assert_eq!(s.markers()[black].color(), Color::Black);
        assert_eq!(s.click_marker(black).unwrap(), Effect::Absorb);
        assert_eq!(s.selection(), Selection::Selected(alice));
        assert!(s.snapshot().found().is_empty());
    }

    #[test]
    fn test_background_click_unselects() {
        let (mut s, _, bob, _) = populated();
        s.select_person(bob).unwrap();

        s.pointer(left(Location::new(0.0, 0.0))).unwrap();
        assert_eq!(s.selection(), Selection::Unselected);
        assert!(s
            .markers()
            .iter()
            .filter(|m| matches!(m.kind, MarkerKind::Geocache { .. }))
            .all(|m| m.color() == Color::Gray));
    }

    #[test]
    fn test_right_click_keeps_selection() {
        let (mut s, _, bob, _) = populated();
        s.select_person(bob).unwrap();

        s.click_background(Location::new(1.0, 2.0), MouseButton::Right)
            .unwrap();
        assert_eq!(s.selection(), Selection::Selected(bob));
        assert_eq!(s.latest_click(), Some(Location::new(1.0, 2.0)));
    }

    #[test]
    fn test_pin_press_never_reaches_background() {
        let (mut s, _, bob, _) = populated();
        s.select_person(bob).unwrap();
        let before = s.latest_click();

        let bob_pin = s.markers()[person_marker(&s, bob)].location;
        let event = s.hit_test(bob_pin, MouseButton::Left);
        assert!(event.target.is_some());

        let outcome = s.pointer(event).unwrap();
        assert_eq!(outcome, PointerOutcome::Marker(Effect::Select { person: bob }));
        assert_eq!(s.selection(), Selection::Selected(bob));
        assert_eq!(s.latest_click(), before);
    }

    #[test]
    fn test_stale_marker_index() {
        let mut s = session();
        let err = s.click_marker(3).unwrap_err();
        assert!(matches!(err, Error::MarkerNotFound { index: 3, count: 0 }));
    }

    #[test]
    fn test_removing_active_person_unselects() {
        let (mut s, alice, _, cache) = populated();
        s.select_person(alice).unwrap();

        s.remove_person(alice).unwrap();
        assert_eq!(s.selection(), Selection::Unselected);
        assert_eq!(s.snapshot().geocache(cache).unwrap().owner, None);

        assert!(matches!(
            s.remove_person(alice),
            Err(Error::PersonNotFound { .. })
        ));
    }

    #[test]
    fn test_export_after_owner_removed_reloads() {
        let (mut s, alice, bob, cache) = populated();
        s.select_person(bob).unwrap();
        let effect = s.click_marker(geocache_marker(&s, cache)).unwrap();
        assert!(matches!(effect, Effect::MarkFound { .. }));
        s.remove_person(alice).unwrap();

        let (text, stats) = s.export_text();
        assert_eq!(stats.found_skipped, 1);
        let loaded = s.import_text(&text).unwrap();
        assert_eq!(loaded.persons, 1);
        assert!(s.snapshot().found().is_empty());
    }

    #[test]
    fn test_names_that_break_the_format_are_rejected() {
        let mut s = session();
        s.click_background(Location::new(57.60, 11.90), MouseButton::Left)
            .unwrap();
        let err = s.add_person(&form("Found:Bob")).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "first_name", .. }));

        let err = s.add_person(&form(" Alice ")).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "first_name", .. }));
        assert!(s.snapshot().persons().is_empty());
    }

    #[test]
    fn test_saved_state_is_reconciled() {
        let state = UiState {
            selection: Selection::Selected(PersonId(42)),
            latest_click: Some(Location::new(1.0, 1.0)),
        };
        let s = MapSession::with_state(
            SqliteStorage::open_memory().unwrap(),
            Settings::default(),
            state,
        )
        .unwrap();
        assert_eq!(s.selection(), Selection::Unselected);
        assert_eq!(s.latest_click(), Some(Location::new(1.0, 1.0)));
    }

    #[test]
    fn test_save_and_load_file() {
        let (mut s, _, bob, cache) = populated();
        s.select_person(bob).unwrap();
        s.click_marker(geocache_marker(&s, cache)).unwrap();

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(codec::DEFAULT_FILE_NAME);
        let saved = s.save_file(&path).unwrap();
        assert_eq!(saved.persons, 2);
        let before = s.export_text().0;

        s.select_person(bob).unwrap();
        let loaded = s.load_file(&path).unwrap();
        assert_eq!(loaded.total(), 4);
        assert_eq!(s.selection(), Selection::Unselected);
        assert_eq!(s.export_text().0, before);
    }

    #[test]
    fn test_failed_load_keeps_map_and_unselects() {
        let (mut s, alice, _, _) = populated();
        s.select_person(alice).unwrap();
        let before = s.export_text().0;

        let err = s.import_text("a|b|c|d|e|f\n").unwrap_err();
        assert!(matches!(err, Error::Format { line: 1, .. }));
        assert_eq!(s.export_text().0, before);
        assert_eq!(s.selection(), Selection::Unselected);
    }
}
