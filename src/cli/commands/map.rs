//! Map, click and pin command implementations.

use super::{coords, open_map, print_json};
use crate::error::Result;
use crate::map::{Color, Effect, Marker, MouseButton, PointerOutcome};
use crate::model::Location;
use crate::selection::Selection;
use crate::validate::validate_location;
use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::path::PathBuf;

/// One marker as shown by `geo map`.
#[derive(Serialize)]
struct MarkerView<'a> {
    index: usize,
    #[serde(flatten)]
    marker: &'a Marker,
    color: Color,
    opacity: f64,
    effect: Effect,
}

/// Where the map view opens.
#[derive(Serialize)]
struct ViewOutput {
    home: Location,
    zoom: u8,
}

#[derive(Serialize)]
struct MapOutput<'a> {
    view: ViewOutput,
    selection: Selection,
    markers: Vec<MarkerView<'a>>,
    count: usize,
}

#[derive(Serialize)]
struct ClickOutput {
    target: Option<usize>,
    effect: Option<Effect>,
    selection: Selection,
    latest_click: Option<Location>,
}

fn paint(color: Color) -> ColoredString {
    let name = color.as_str();
    match color {
        Color::Blue => name.blue(),
        Color::Gray => name.bright_black(),
        Color::Red => name.red(),
        Color::Black => name.bold(),
        Color::Green => name.green(),
    }
}

fn print_marker(index: usize, marker: &Marker) {
    let tooltip = marker.tooltip.replace('\n', " / ");
    println!(
        "[{index}] {:<6} {:<12} {:.1}  {}",
        paint(marker.color()),
        marker.label(),
        marker.opacity(),
        coords(&marker.location)
    );
    println!("      {}", tooltip.dimmed());
}

fn describe(effect: &Effect) -> String {
    match effect {
        Effect::Select { person } => format!("Selected person {person}"),
        Effect::MarkFound { relation } => format!(
            "Person {} found geocache {}",
            relation.person_id, relation.geocache_id
        ),
        Effect::Unfind { relation } => format!(
            "Person {} no longer has geocache {} as found",
            relation.person_id, relation.geocache_id
        ),
        Effect::Absorb => "Nothing to do for this pin".to_string(),
    }
}

/// List the markers on the map.
///
/// # Errors
///
/// Returns an error if the database cannot be opened.
pub fn execute_map(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let ctx = open_map(db_path, None)?;
    let map = &ctx.session;
    ctx.save_state()?;
    let view = ViewOutput {
        home: map.settings().home,
        zoom: map.settings().zoom,
    };

    if json {
        let markers: Vec<MarkerView<'_>> = map
            .markers()
            .iter()
            .enumerate()
            .map(|(index, marker)| MarkerView {
                index,
                marker,
                color: marker.color(),
                opacity: marker.opacity(),
                effect: marker.effect(),
            })
            .collect();
        let output = MapOutput {
            view,
            selection: map.selection(),
            count: markers.len(),
            markers,
        };
        return print_json(&output);
    }

    println!("View: {} (zoom {})", coords(&view.home), view.zoom);

    if map.markers().is_empty() {
        println!("No markers on the map.");
        return Ok(());
    }

    println!("Markers ({}, {}):", map.markers().len(), map.selection());
    println!();
    for (index, marker) in map.markers().iter().enumerate() {
        print_marker(index, marker);
    }

    Ok(())
}

/// Press the map at a coordinate.
///
/// # Errors
///
/// Returns an error if the coordinate is invalid or the store fails.
pub fn execute_click(
    latitude: f64,
    longitude: f64,
    right: bool,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let location = Location::new(latitude, longitude);
    validate_location(&location)?;

    let mut ctx = open_map(db_path, actor)?;
    let button = if right {
        MouseButton::Right
    } else {
        MouseButton::Left
    };

    let event = ctx.session.hit_test(location, button);
    let outcome = ctx.session.pointer(event)?;
    ctx.save_state()?;

    let effect = match outcome {
        PointerOutcome::Marker(effect) => Some(effect),
        PointerOutcome::Background => None,
    };

    if json {
        let output = ClickOutput {
            target: event.target,
            effect,
            selection: ctx.session.selection(),
            latest_click: ctx.session.latest_click(),
        };
        return print_json(&output);
    }

    match (event.target, effect) {
        (Some(index), Some(effect)) => println!("Pin [{index}]: {}", describe(&effect)),
        _ if right => println!("Map location set to {}", coords(&location)),
        _ => println!(
            "Map location set to {} (selection cleared)",
            coords(&location)
        ),
    }

    Ok(())
}

/// Press the marker at `index`.
///
/// # Errors
///
/// Returns `Error::MarkerNotFound` for a stale index, or a store error.
pub fn execute_pin(
    index: usize,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut ctx = open_map(db_path, actor)?;
    let effect = ctx.session.click_marker(index)?;
    ctx.save_state()?;

    if json {
        let output = ClickOutput {
            target: Some(index),
            effect: Some(effect),
            selection: ctx.session.selection(),
            latest_click: ctx.session.latest_click(),
        };
        return print_json(&output);
    }

    println!("{}", describe(&effect));
    Ok(())
}
