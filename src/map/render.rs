//! Marker rendering.
//!
//! Markers are a pure function of the snapshot and the selection. The layer
//! is never patched: every state change clears it and renders again.

use tracing::debug;

use super::marker::{Marker, MarkerKind};
use crate::model::{Location, Snapshot};
use crate::selection::Selection;

/// Compute every marker for `snapshot` under `selection`.
///
/// Order is persons, then geocaches, then found markers, so a found marker
/// is drawn above the geocache marker at the same spot.
#[must_use]
pub fn render(snapshot: &Snapshot, selection: &Selection) -> Vec<Marker> {
    let mut markers = Vec::with_capacity(snapshot.persons().len() + snapshot.geocaches().len());

    for person in snapshot.persons() {
        markers.push(Marker {
            kind: MarkerKind::Person {
                id: person.id,
                kind: selection.classify_person(person.id),
            },
            location: person.location,
            tooltip: person.tooltip(),
        });
    }

    for geocache in snapshot.geocaches() {
        markers.push(Marker {
            kind: MarkerKind::Geocache {
                id: geocache.id,
                kind: selection.classify_geocache(geocache),
            },
            location: geocache.location,
            tooltip: snapshot.geocache_tooltip(geocache),
        });
    }

    if let Some(active) = selection.active() {
        for relation in snapshot.found_by(active) {
            // Cascading deletes keep every relation pointing at a stored geocache
            let Some(geocache) = snapshot.geocache(relation.geocache_id) else {
                continue;
            };
            markers.push(Marker {
                kind: MarkerKind::Found {
                    relation: *relation,
                },
                location: geocache.location,
                tooltip: snapshot.geocache_tooltip(geocache),
            });
        }
    }

    markers
}

/// The current set of markers on the map.
#[derive(Debug, Clone, Default)]
pub struct MarkerLayer {
    markers: Vec<Marker>,
}

impl MarkerLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the layer and render it again from scratch.
    pub fn rebuild(&mut self, snapshot: &Snapshot, selection: &Selection) {
        self.markers.clear();
        self.markers.extend(render(snapshot, selection));
        debug!(markers = self.markers.len(), %selection, "Marker layer rebuilt");
    }

    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Marker> {
        self.markers.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Index of the topmost marker within `radius` degrees of `location`.
    #[must_use]
    pub fn topmost_at(&self, location: &Location, radius: f64) -> Option<usize> {
        self.markers
            .iter()
            .rposition(|m| m.location.is_near(location, radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::marker::{Color, Effect};
    use crate::model::{FoundRelation, Geocache, GeocacheId, Person, PersonId};

    fn person(id: i64, lat: f64) -> Person {
        Person {
            id: PersonId(id),
            first_name: format!("P{id}"),
            last_name: "Smith".to_string(),
            country: "SE".to_string(),
            city: "Gothenburg".to_string(),
            street_name: "MainSt".to_string(),
            street_number: 5,
            location: Location::new(lat, 11.97),
        }
    }

    fn cache(id: i64, owner: Option<i64>, longitude: f64) -> Geocache {
        Geocache {
            id: GeocacheId(id),
            owner: owner.map(PersonId),
            location: Location::new(57.71, longitude),
            contents: "key".to_string(),
            message: "hi".to_string(),
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot::new(
            vec![person(1, 57.70), person(2, 57.60)],
            vec![
                cache(2, Some(1), 12.00),
                cache(3, Some(2), 12.01),
                cache(4, None, 12.02),
            ],
            vec![
                FoundRelation::new(PersonId(1), GeocacheId(3)),
                FoundRelation::new(PersonId(2), GeocacheId(2)),
            ],
        )
    }

    fn colors(markers: &[Marker]) -> Vec<Color> {
        markers.iter().map(Marker::color).collect()
    }

    #[test]
    fn test_unselected_render() {
        let markers = render(&snapshot(), &Selection::Unselected);
        assert_eq!(
            colors(&markers),
            vec![Color::Blue, Color::Blue, Color::Gray, Color::Gray, Color::Gray]
        );
        assert!(markers.iter().all(|m| (m.opacity() - 1.0).abs() < f64::EPSILON));
    }

    #[test]
    fn test_selected_render() {
        let markers = render(&snapshot(), &Selection::Selected(PersonId(1)));
        assert_eq!(
            colors(&markers),
            vec![
                Color::Blue,
                Color::Blue,
                Color::Black,
                Color::Red,
                Color::Red,
                Color::Green
            ]
        );
        assert!((markers[0].opacity() - 1.0).abs() < f64::EPSILON);
        assert!((markers[1].opacity() - 0.5).abs() < f64::EPSILON);

        // Found marker sits on its geocache and undoes the find
        let found = &markers[5];
        assert_eq!(found.location, markers[3].location);
        assert_eq!(
            found.effect(),
            Effect::Unfind {
                relation: FoundRelation::new(PersonId(1), GeocacheId(3))
            }
        );
    }

    #[test]
    fn test_render_is_idempotent() {
        let snapshot = snapshot();
        let selection = Selection::Selected(PersonId(2));
        assert_eq!(render(&snapshot, &selection), render(&snapshot, &selection));
    }

    #[test]
    fn test_rebuild_replaces_layer() {
        let snapshot = snapshot();
        let mut layer = MarkerLayer::new();

        layer.rebuild(&snapshot, &Selection::Selected(PersonId(1)));
        assert_eq!(layer.len(), 6);

        layer.rebuild(&snapshot, &Selection::Unselected);
        assert_eq!(layer.len(), 5);
        assert!(layer.markers().iter().all(|m| m.color() != Color::Green));
    }

    #[test]
    fn test_topmost_at_prefers_found_marker() {
        let snapshot = snapshot();
        let mut layer = MarkerLayer::new();
        layer.rebuild(&snapshot, &Selection::Selected(PersonId(1)));

        let spot = snapshot.geocache(GeocacheId(3)).unwrap().location;
        assert_eq!(layer.topmost_at(&spot, 0.0005), Some(5));
        assert_eq!(layer.topmost_at(&Location::new(0.0, 0.0), 0.0005), None);
    }
}
