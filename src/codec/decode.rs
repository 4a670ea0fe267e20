//! Text to store.
//!
//! The decoder is a single forward pass with no lookahead. Persons and
//! geocaches are written to the store as soon as their line is read; found
//! lists are held until the end because they may name geocaches that appear
//! further down the file.

use std::collections::HashSet;
use tracing::debug;

use super::ImportStats;
use crate::error::{Error, Result};
use crate::model::{FoundRelation, Geocache, GeocacheId, Location, PersonForm, PersonId};
use crate::storage::Store;
use crate::validate::{parse_degrees, parse_street_number};

const PERSON_FIELDS: usize = 8;
const GEOCACHE_FIELDS: usize = 5;
/// Prefix that marks a found list line.
pub const FOUND_PREFIX: &str = "Found:";

/// The person whose block is being read.
#[derive(Debug)]
struct CurrentPerson {
    id: PersonId,
    name: String,
}

/// A `Found:` line waiting for the end of the file.
#[derive(Debug)]
struct PendingFound {
    person: PersonId,
    name: String,
    ids: Vec<GeocacheId>,
}

/// Stateful line parser.
pub struct Decoder<'a, S: Store + ?Sized> {
    store: &'a mut S,
    current: Option<CurrentPerson>,
    pending: Vec<PendingFound>,
    geocache_ids: HashSet<GeocacheId>,
    stats: ImportStats,
}

/// Turn a field rule violation into a format error for `line`.
fn at_line(line: usize) -> impl FnOnce(Error) -> Error {
    move |e| match e {
        Error::Validation { field, message } => Error::Format {
            line,
            message: format!("invalid {field}: {message}"),
        },
        other => other,
    }
}

impl<'a, S: Store + ?Sized> Decoder<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self {
            store,
            current: None,
            pending: Vec::new(),
            geocache_ids: HashSet::new(),
            stats: ImportStats::default(),
        }
    }

    /// Parse one line. `line_no` is 1-based and only used in errors.
    ///
    /// # Errors
    ///
    /// Returns `Error::Format` for a malformed line, or a store error.
    pub fn decode_line(&mut self, line_no: usize, line: &str) -> Result<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        if line.starts_with(FOUND_PREFIX) {
            return self.found_line(line_no, line);
        }

        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        match fields.len() {
            PERSON_FIELDS => self.person_line(line_no, &fields),
            GEOCACHE_FIELDS => self.geocache_line(line_no, &fields),
            n => Err(Error::Format {
                line: line_no,
                message: format!(
                    "expected {PERSON_FIELDS} person fields or {GEOCACHE_FIELDS} geocache fields, found {n}"
                ),
            }),
        }
    }

    fn person_line(&mut self, line_no: usize, fields: &[&str]) -> Result<()> {
        let form = PersonForm {
            first_name: fields[0].to_string(),
            last_name: fields[1].to_string(),
            country: fields[2].to_string(),
            city: fields[3].to_string(),
            street_name: fields[4].to_string(),
            street_number: parse_street_number(fields[5]).map_err(at_line(line_no))?,
        };
        let location = Location::new(
            parse_degrees("latitude", fields[6]).map_err(at_line(line_no))?,
            parse_degrees("longitude", fields[7]).map_err(at_line(line_no))?,
        );

        let person = self
            .store
            .add_person(&form, location)
            .map_err(at_line(line_no))?;
        debug!(line = line_no, id = %person.id, "Decoded person");

        self.current = Some(CurrentPerson {
            id: person.id,
            name: person.full_name(),
        });
        self.stats.persons += 1;
        Ok(())
    }

    fn geocache_line(&mut self, line_no: usize, fields: &[&str]) -> Result<()> {
        let Some(owner) = self.current.as_ref().map(|p| p.id) else {
            return Err(Error::Format {
                line: line_no,
                message: "geocache line before any person".to_string(),
            });
        };

        let id = fields[0]
            .parse::<i64>()
            .map(GeocacheId)
            .map_err(|_| Error::Format {
                line: line_no,
                message: format!("'{}' is not a geocache id", fields[0]),
            })?;
        if !self.geocache_ids.insert(id) {
            return Err(Error::Format {
                line: line_no,
                message: format!("duplicate geocache id {id}"),
            });
        }

        let geocache = Geocache {
            id,
            owner: Some(owner),
            location: Location::new(
                parse_degrees("latitude", fields[1]).map_err(at_line(line_no))?,
                parse_degrees("longitude", fields[2]).map_err(at_line(line_no))?,
            ),
            contents: fields[3].to_string(),
            message: fields[4].to_string(),
        };

        self.store
            .add_geocache(&geocache)
            .map_err(at_line(line_no))?;
        debug!(line = line_no, %id, owner = %owner, "Decoded geocache");

        self.stats.geocaches += 1;
        Ok(())
    }

    fn found_line(&mut self, line_no: usize, line: &str) -> Result<()> {
        let Some(current) = &self.current else {
            return Err(Error::Format {
                line: line_no,
                message: "Found line before any person".to_string(),
            });
        };

        if self.pending.iter().any(|p| p.person == current.id) {
            return Err(Error::Format {
                line: line_no,
                message: format!("second Found line for {}", current.name),
            });
        }

        let mut ids = Vec::new();
        // Tokens that are not integers are skipped
        for token in line.split([',', ':']).skip(1) {
            let Ok(id) = token.trim().parse::<i64>() else {
                continue;
            };
            let id = GeocacheId(id);
            if ids.contains(&id) {
                return Err(Error::Format {
                    line: line_no,
                    message: format!("geocache {id} listed twice"),
                });
            }
            ids.push(id);
        }

        self.pending.push(PendingFound {
            person: current.id,
            name: current.name.clone(),
            ids,
        });
        Ok(())
    }

    /// Write the pending found relations.
    ///
    /// # Errors
    ///
    /// Returns `Error::Referential` if a found id names no geocache.
    pub fn finish(self) -> Result<ImportStats> {
        let mut stats = self.stats;

        for pending in self.pending {
            for geocache_id in pending.ids {
                if self.store.get_geocache(geocache_id)?.is_none() {
                    return Err(Error::Referential {
                        geocache_id,
                        person: pending.name,
                    });
                }
                self.store
                    .add_found(FoundRelation::new(pending.person, geocache_id))?;
                stats.found += 1;
            }
        }

        Ok(stats)
    }
}

/// Decode `text` into `store` without clearing it first.
///
/// A leading byte-order mark is ignored and `\r\n` line endings are accepted.
///
/// # Errors
///
/// Returns the first format, referential or store error.
pub fn decode<S: Store + ?Sized>(store: &mut S, text: &str) -> Result<ImportStats> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut decoder = Decoder::new(store);
    for (index, line) in text.lines().enumerate() {
        decoder.decode_line(index + 1, line)?;
    }
    decoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Snapshot;
    use crate::storage::SqliteStorage;

    const ALICE: &str = "Alice|Smith|SE|Gothenburg|MainSt|5|57.70|11.97\n2|57.71|11.98|key|hi\nFound:2\n\n";

    #[test]
    fn test_decode_alice() {
        let mut store = SqliteStorage::open_memory().unwrap();
        let stats = decode(&mut store, ALICE).unwrap();
        assert_eq!(stats.total(), 3);

        let snapshot = Snapshot::load(&store).unwrap();
        let alice = &snapshot.persons()[0];
        assert_eq!(alice.full_name(), "Alice Smith");
        assert_eq!(alice.street_number, 5);
        assert!((alice.location.latitude - 57.70).abs() < f64::EPSILON);

        let geocache = snapshot.geocache(GeocacheId(2)).unwrap();
        assert_eq!(geocache.owner, Some(alice.id));
        assert_eq!(geocache.contents, "key");
        assert_eq!(geocache.message, "hi");

        assert_eq!(
            snapshot.found(),
            &[FoundRelation::new(alice.id, GeocacheId(2))]
        );
    }

    #[test]
    fn test_six_fields_is_format_error() {
        let mut store = SqliteStorage::open_memory().unwrap();
        let text = "Alice|Smith|SE|Gothenburg|MainSt|5|57.70|11.97\na|b|c|d|e|f\n2|57.71|11.98|key|hi\n";

        let err = decode(&mut store, text).unwrap_err();
        assert!(matches!(err, Error::Format { line: 2, .. }));

        // Decoding stopped at the bad line
        assert!(store.list_geocaches().unwrap().is_empty());
    }

    #[test]
    fn test_fields_are_trimmed_and_crlf_accepted() {
        let mut store = SqliteStorage::open_memory().unwrap();
        let text = "\u{feff}Alice | Smith | SE | Gothenburg | MainSt | 5 | 57.70 | 11.97\r\n2 | 57.71 | 11.98 | key | hi\r\nFound: 2\r\n\r\n";

        decode(&mut store, text).unwrap();
        let persons = store.list_persons().unwrap();
        assert_eq!(persons[0].first_name, "Alice");
        assert_eq!(persons[0].last_name, "Smith");
        assert_eq!(store.list_found().unwrap().len(), 1);
    }

    #[test]
    fn test_found_tokens_skip_non_numeric() {
        let mut store = SqliteStorage::open_memory().unwrap();
        let text = "Alice|Smith|SE|Gothenburg|MainSt|5|57.70|11.97\n\
                    2|57.71|11.98|key|hi\n\
                    3|57.72|11.99|coin|hello\n\
                    Found:2,abc,,3\n";

        let stats = decode(&mut store, text).unwrap();
        assert_eq!(stats.found, 2);
    }

    #[test]
    fn test_rows_before_any_person_rejected() {
        let mut store = SqliteStorage::open_memory().unwrap();
        let err = decode(&mut store, "2|57.71|11.98|key|hi\n").unwrap_err();
        assert!(matches!(err, Error::Format { line: 1, .. }));

        let err = decode(&mut store, "\nFound:2\n").unwrap_err();
        assert!(matches!(err, Error::Format { line: 2, .. }));
    }

    #[test]
    fn test_duplicates_rejected() {
        let person = "Alice|Smith|SE|Gothenburg|MainSt|5|57.70|11.97\n";

        let mut store = SqliteStorage::open_memory().unwrap();
        let text = format!("{person}2|57.71|11.98|key|hi\n2|57.71|11.98|key|hi\n");
        let err = decode(&mut store, &text).unwrap_err();
        assert!(matches!(err, Error::Format { line: 3, .. }));

        let mut store = SqliteStorage::open_memory().unwrap();
        let text = format!("{person}2|57.71|11.98|key|hi\nFound:2\nFound:2\n");
        let err = decode(&mut store, &text).unwrap_err();
        assert!(matches!(err, Error::Format { line: 4, .. }));

        let mut store = SqliteStorage::open_memory().unwrap();
        let text = format!("{person}2|57.71|11.98|key|hi\nFound:2,2\n");
        let err = decode(&mut store, &text).unwrap_err();
        assert!(matches!(err, Error::Format { line: 3, .. }));
    }

    #[test]
    fn test_field_rule_violation_reports_line() {
        let mut store = SqliteStorage::open_memory().unwrap();

        let err = decode(&mut store, "Alice|Smith|SE|Gothenburg|MainSt|300|57.70|11.97\n")
            .unwrap_err();
        assert!(matches!(err, Error::Format { line: 1, .. }));

        let err = decode(
            &mut store,
            "\n\nAlice|Smith|SE|Gothenburg|MainSt|5|north|11.97\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Format { line: 3, .. }));
    }

    #[test]
    fn test_found_resolved_after_all_lines() {
        let mut store = SqliteStorage::open_memory().unwrap();
        let text = "Alice|Smith|SE|Gothenburg|MainSt|5|57.70|11.97\n\
                    Found:7\n\
                    \n\
                    Bob|Jones|NO|Oslo|Karl|1|59.9|10.7\n\
                    7|59.91|10.71|coin|hello\n\
                    Found:\n";

        decode(&mut store, text).unwrap();
        let found = store.list_found().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].geocache_id, GeocacheId(7));
    }
}
