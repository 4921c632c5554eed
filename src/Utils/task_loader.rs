//! Plain-text task files for the command-line binary.
//!
//! A task is split into sections, each introduced by a header line and running to the next
//! header or the end of the file:
//! ```text
//! DATABASE
//! data/testdb.json
//! SETTINGS
//! { "reexpress_free_electron": true }
//! BASIS
//! H2O, H+, HCO3-, Ca++
//! MINERALS
//! *
//! GASES
//! CO2(g)
//! KINETIC_MINERALS
//! Calcite
//! RATES
//! [ { "kinetic_species_name": "Calcite", "intrinsic_rate_constant": 1e-9 } ]
//! ```
//! `DATABASE` and `BASIS` are required. `REDOX` holds `"<oxidant>, <electron>"`.
use crate::Geochemistry::DatabaseReader::DatabaseReader;
use crate::Geochemistry::KineticRate::KineticRateDescription;
use crate::Geochemistry::SpeciationResolver::{SpeciationResolver, SystemDefinition};
use crate::Geochemistry::geochem_errors::GeochemError;
use crate::settings::ReaderSettings;
use log::{error, info};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

pub const SECTION_HEADERS: [&str; 10] = [
    "DATABASE",
    "SETTINGS",
    "BASIS",
    "MINERALS",
    "GASES",
    "KINETIC_MINERALS",
    "KINETIC_REDOX",
    "KINETIC_SURFACE",
    "REDOX",
    "RATES",
];

/// Everything needed to build a reduced model from a task file.
#[derive(Debug, Clone, PartialEq)]
pub struct GeochemTask {
    pub database: String,
    pub settings: ReaderSettings,
    pub system: SystemDefinition,
    pub rates: Vec<KineticRateDescription>,
}

impl GeochemTask {
    pub fn from_file(file_name: &str) -> Result<Self, GeochemError> {
        let path = Path::new(file_name);
        if !path.exists() {
            let msg = format!("File '{}' does not exist", file_name);
            error!("{}", msg);
            return Err(GeochemError::Parse(msg));
        }
        let file = File::open(path).map_err(|e| GeochemError::Io {
            path: file_name.to_string(),
            source: e,
        })?;
        let reader = BufReader::new(file);
        let lines = reader
            .lines()
            .collect::<Result<Vec<String>, _>>()
            .map_err(|e| {
                error!("cannot read task file '{}': {}", file_name, e);
                GeochemError::Io {
                    path: file_name.to_string(),
                    source: e,
                }
            })?;
        Self::from_lines(file_name, &lines)
    }

    /// Parses already-read lines; `file_name` only labels messages.
    pub fn from_lines(file_name: &str, lines: &[String]) -> Result<Self, GeochemError> {
        let database = match section(lines, "DATABASE") {
            Some(body) => body
                .iter()
                .map(|l| l.trim())
                .find(|l| !l.is_empty())
                .map(str::to_string)
                .ok_or_else(|| missing_section("DATABASE", file_name))?,
            None => return Err(missing_section("DATABASE", file_name)),
        };
        let basis = section(lines, "BASIS")
            .map(name_list)
            .filter(|names| !names.is_empty())
            .ok_or_else(|| missing_section("BASIS", file_name))?;

        let settings = match section(lines, "SETTINGS") {
            Some(body) if !joined(body).is_empty() => {
                ReaderSettings::from_json(file_name, &joined(body))?
            }
            _ => ReaderSettings::default(),
        };

        let mut system = SystemDefinition {
            basis_species: basis,
            minerals: list_or_empty(lines, "MINERALS"),
            gases: list_or_empty(lines, "GASES"),
            kinetic_minerals: list_or_empty(lines, "KINETIC_MINERALS"),
            kinetic_redox: list_or_empty(lines, "KINETIC_REDOX"),
            kinetic_surface_species: list_or_empty(lines, "KINETIC_SURFACE"),
            ..SystemDefinition::new(&[])
        };
        if let Some(body) = section(lines, "REDOX") {
            let redox = name_list(body);
            if let [oxidant, electron] = redox.as_slice() {
                system.redox_ox = oxidant.clone();
                system.redox_e = electron.clone();
            } else if !redox.is_empty() {
                let msg = format!(
                    "The REDOX section in file '{}' must name an oxidant and an electron, found {:?}",
                    file_name, redox
                );
                error!("{}", msg);
                return Err(GeochemError::Parse(msg));
            }
        }

        let rates = match section_bounds(lines, "RATES") {
            Some((start, end)) if !joined(&lines[start..end]).is_empty() => {
                parse_rates(file_name, lines, start, end)?
            }
            _ => Vec::new(),
        };

        info!(
            "task '{}': database {}, {} basis species, {} rates",
            file_name,
            database,
            system.basis_species.len(),
            rates.len()
        );
        Ok(GeochemTask {
            database,
            settings,
            system,
            rates,
        })
    }

    /// Reads the database, builds the reduced model and binds every rate.
    pub fn resolve(&self) -> Result<SpeciationResolver, GeochemError> {
        let db = Arc::new(DatabaseReader::new(&self.database, &self.settings)?);
        let mut resolver = SpeciationResolver::new(db, &self.system)?;
        for rate in &self.rates {
            resolver.add_kinetic_rate(rate)?;
        }
        Ok(resolver)
    }
}

fn missing_section(header: &str, file_name: &str) -> GeochemError {
    let msg = format!("No '{}' section found in file '{}'", header, file_name);
    error!("{}", msg);
    GeochemError::Parse(msg)
}

fn is_header(line: &str) -> bool {
    let trimmed = line.trim().to_uppercase();
    SECTION_HEADERS.contains(&trimmed.as_str())
}

/// Line range between `header` and the next header.
fn section_bounds(lines: &[String], header: &str) -> Option<(usize, usize)> {
    let start = lines
        .iter()
        .position(|l| l.trim().to_uppercase() == header)?
        + 1;
    let end = lines[start..]
        .iter()
        .position(|l| is_header(l))
        .map_or(lines.len(), |i| start + i);
    Some((start, end))
}

fn section<'a>(lines: &'a [String], header: &str) -> Option<&'a [String]> {
    section_bounds(lines, header).map(|(start, end)| &lines[start..end])
}

fn joined(body: &[String]) -> String {
    body.join("\n").trim().to_string()
}

/// comma and newline separated names
fn name_list(body: &[String]) -> Vec<String> {
    body.iter()
        .flat_map(|l| l.split(','))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn list_or_empty(lines: &[String], header: &str) -> Vec<String> {
    section(lines, header).map(name_list).unwrap_or_default()
}

fn parse_rates(
    file_name: &str,
    lines: &[String],
    start: usize,
    end: usize,
) -> Result<Vec<KineticRateDescription>, GeochemError> {
    serde_json::from_str(&lines[start..end].join("\n")).map_err(|e| {
        let actual_line = start + e.line().saturating_sub(1);
        error!(
            "Error parsing RATES at line {}, column {} (line {} in file '{}'): {}",
            e.line(),
            e.column(),
            actual_line + 1,
            file_name,
            e
        );
        if let Some(problem_line) = lines.get(actual_line) {
            error!("Problematic line: {}", problem_line);
            if e.column() >= 1 && e.column() <= problem_line.len() {
                error!("{}", " ".repeat(e.column() - 1) + "^");
            }
        }
        GeochemError::Json {
            path: file_name.to_string(),
            source: e,
        }
    })
}
