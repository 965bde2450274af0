//! UN/LOCODE seaport model and CSV loader.
//!
//! Ports come from the official UN/LOCODE code-list tables. The loader keeps
//! only rows that describe an active seaport with a usable position:
//! function position 1 must be `'1'`, the status must be one of the approved
//! codes, the coordinate cell must decode, and the row must not be flagged
//! for removal. Everything else is skipped without failing the load.

use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::unlocode;

/// Status codes accepted for reliable port entries.
pub const VALID_STATUSES: [&str; 6] = ["AA", "AC", "AF", "AI", "AS", "RL"];

const COL_CHANGE: usize = 0;
const COL_COUNTRY: usize = 1;
const COL_LOCATION: usize = 2;
const COL_NAME: usize = 3;
const COL_NAME_ASCII: usize = 4;
const COL_SUBDIV: usize = 5;
const COL_FUNCTION: usize = 6;
const COL_STATUS: usize = 7;
const COL_COORDINATES: usize = 10;
const MIN_COLUMNS: usize = 11;

/// Which end of a maritime leg a port plays.
///
/// The snap policy is identical for both roles; the role only feeds error
/// messages and response metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortRole {
    /// Origin port where cargo is loaded.
    #[serde(rename = "PORT_OF_LOADING")]
    PortOfLoading,
    /// Destination port where cargo is discharged.
    #[serde(rename = "PORT_OF_DISCHARGE")]
    PortOfDischarge,
}

impl PortRole {
    /// Short abbreviation used in diagnostics (POL or POD).
    pub fn abbreviation(self) -> &'static str {
        match self {
            PortRole::PortOfLoading => "POL",
            PortRole::PortOfDischarge => "POD",
        }
    }
}

impl fmt::Display for PortRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// A UN/LOCODE seaport.
///
/// Identity is the five-character unlocode alone; two loads of the same
/// registry row compare equal regardless of name or coordinate drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// Five-character identifier, country code plus location code (`NLRTM`).
    pub unlocode: String,
    /// Port name without diacritics.
    pub name: String,
    /// ISO 3166 alpha-2 country code.
    pub country_code: String,
    /// ISO 3166-2 subdivision code, possibly empty.
    pub subdivision: String,
    pub lat: f64,
    pub lon: f64,
    /// Eight-character function classifier from the registry.
    pub function: String,
    /// Two-character entry status code.
    pub status: String,
}

impl Port {
    /// True for ports offering three or more transport functions.
    pub fn is_major_port(&self) -> bool {
        self.function.chars().filter(|c| *c != '-').count() >= 3
    }

    /// True when function position 2 marks a rail terminal.
    pub fn has_rail(&self) -> bool {
        self.function.chars().nth(1) == Some('2')
    }

    /// True when function position 3 marks a road terminal.
    pub fn has_road(&self) -> bool {
        self.function.chars().nth(2) == Some('3')
    }

    /// True when function position 4 marks an airport.
    pub fn has_airport(&self) -> bool {
        self.function.chars().nth(3) == Some('4')
    }
}

impl PartialEq for Port {
    fn eq(&self, other: &Self) -> bool {
        self.unlocode == other.unlocode
    }
}

impl Eq for Port {}

impl std::hash::Hash for Port {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.unlocode.hash(state);
    }
}

/// Load seaports from UN/LOCODE CSV files.
///
/// Missing files are skipped with a warning, malformed lines are skipped with
/// a debug log, and ports seen in more than one file are kept once in
/// first-seen order.
pub fn load_seaports<P: AsRef<Path>>(csv_files: &[P]) -> Vec<Port> {
    let mut ports = Vec::new();
    let mut seen = HashSet::new();

    for csv_file in csv_files {
        let path = csv_file.as_ref();
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "UN/LOCODE file not found, skipping");
                continue;
            }
        };

        let before = ports.len();
        load_from_reader(file, path, &mut ports, &mut seen);
        info!(
            path = %path.display(),
            ports = ports.len() - before,
            "loaded seaports"
        );
    }

    info!(total = ports.len(), "seaport registry loaded");
    ports
}

/// Load seaports from an in-memory reader. Used by `load_seaports` and tests.
pub fn load_seaports_from_reader<R: Read>(reader: R) -> Vec<Port> {
    let mut ports = Vec::new();
    let mut seen = HashSet::new();
    load_from_reader(reader, Path::new("<reader>"), &mut ports, &mut seen);
    ports
}

fn load_from_reader<R: Read>(
    reader: R,
    source: &Path,
    ports: &mut Vec<Port>,
    seen: &mut HashSet<String>,
) {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    for (line, record) in csv_reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                debug!(path = %source.display(), line, error = %err, "skipping malformed CSV line");
                continue;
            }
        };

        let Some(port) = port_from_record(|idx| record.get(idx)) else {
            continue;
        };

        if seen.insert(port.unlocode.clone()) {
            ports.push(port);
        }
    }
}

/// Apply the seaport filter predicate to one record; `None` means rejected.
fn port_from_record<'a, F>(field: F) -> Option<Port>
where
    F: Fn(usize) -> Option<&'a str>,
{
    // Records with fewer than eleven fields are country headers or noise.
    field(MIN_COLUMNS - 1)?;

    if field(COL_CHANGE)?.trim() == "X" {
        return None;
    }

    let location_code = field(COL_LOCATION)?.trim();
    if location_code.is_empty() {
        return None;
    }

    let function = field(COL_FUNCTION)?.trim();
    if !function.starts_with('1') {
        return None;
    }

    let status = field(COL_STATUS)?.trim();
    if !VALID_STATUSES.contains(&status) {
        return None;
    }

    let (lat, lon) = unlocode::parse_coordinates(field(COL_COORDINATES)?)?;

    let country_code = field(COL_COUNTRY)?.trim();
    let mut name = field(COL_NAME_ASCII)?.trim();
    if name.is_empty() {
        name = field(COL_NAME)?.trim();
    }

    Some(Port {
        unlocode: format!("{country_code}{location_code}"),
        name: name.to_string(),
        country_code: country_code.to_string(),
        subdivision: field(COL_SUBDIV)?.trim().to_string(),
        lat,
        lon,
        function: function.to_string(),
        status: status.to_string(),
    })
}
