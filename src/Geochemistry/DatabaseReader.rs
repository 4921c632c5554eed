//! # Geochemical database reader
//!
//! Reads a JSON thermodynamic database (temperature-tabulated log10K of secondary species,
//! minerals, gases, redox couples, oxides and surface species written in terms of basis
//! species), validates it and exposes name-keyed typed lookups.
//!
//! Two optional edits are applied to the raw document before the typed parse:
//! - free-electron reexpression: `e-` written through `O2(g)` is rewritten through `O2(aq)`
//!   using the gas reaction `O2(g) = O2(aq)`;
//! - pruning of secondary species whose log10K is flagged as extrapolated (a `"note"` member).
//!
//! Construction is all-or-nothing and the reader is read-only afterwards, so a single instance
//! may be shared (`Arc`) by any number of resolvers.
//! ```no_run
//! use GeochemBasis::Geochemistry::DatabaseReader::DatabaseReader;
//! use GeochemBasis::settings::ReaderSettings;
//! let db = DatabaseReader::new("data/testdb.json", &ReaderSettings::default()).unwrap();
//! let reactions = db.equilibrium_reactions(&["CO2(aq)"]).unwrap();
//! assert_eq!(reactions[0], "CO2(aq) = H+ - H2O + HCO3-");
//! ```
use crate::Geochemistry::geochem_errors::GeochemError;
use crate::Geochemistry::species::{
    BasisSpecies, DebyeHuckel, Element, EquilibriumSpecies, GasSpecies, MineralSpecies,
    NeutralSpeciesActivity, OxideSpecies, ReactionSpecies, RedoxSpecies, SorbingMineral,
    Stoichiometry, SurfaceSpecies, value_as_f64,
};
use crate::settings::ReaderSettings;
use log::{info, warn};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::sync::LazyLock;

/// label used in messages about the database file
pub const READER_LABEL: &str = "geochemical";
pub const FREE_ELECTRON: &str = "e-";
pub const GAS_OXYGEN: &str = "O2(g)";
pub const AQUEOUS_OXYGEN: &str = "O2(aq)";

const HEADER: &str = "Header";
const ELEMENTS: &str = "elements";
const BASIS: &str = "basis species";
const SECONDARY: &str = "secondary species";
const FREE_ELECTRON_BLOCK: &str = "free electron";
const MINERALS: &str = "mineral species";
const SORBING: &str = "sorbing minerals";
const GASES: &str = "gas species";
const REDOX: &str = "redox couples";
const OXIDES: &str = "oxides";
const SURFACE: &str = "surface species";

#[derive(Debug, Clone)]
pub struct DatabaseReader {
    filename: String,
    /// raw document after the optional edits, kept for `species_data`
    root: Value,
    activity_model: String,
    fugacity_model: String,
    logk_model: String,
    temperatures: Vec<f64>,
    pressures: Vec<f64>,
    debye_huckel: DebyeHuckel,
    neutral_species: Option<BTreeMap<String, NeutralSpeciesActivity>>,
    elements: BTreeMap<String, Element>,
    basis_species: BTreeMap<String, BasisSpecies>,
    secondary_species: BTreeMap<String, EquilibriumSpecies>,
    free_electron: BTreeMap<String, EquilibriumSpecies>,
    mineral_species: BTreeMap<String, MineralSpecies>,
    sorbing_minerals: BTreeMap<String, SorbingMineral>,
    gas_species: BTreeMap<String, GasSpecies>,
    redox_couples: BTreeMap<String, RedoxSpecies>,
    oxides: BTreeMap<String, OxideSpecies>,
    surface_species: BTreeMap<String, SurfaceSpecies>,
}

impl DatabaseReader {
    /// Reads and validates the database at `filename`.
    pub fn new(filename: &str, settings: &ReaderSettings) -> Result<Self, GeochemError> {
        let content = fs::read_to_string(filename).map_err(|e| GeochemError::Io {
            path: filename.to_string(),
            source: e,
        })?;
        let root: Value = serde_json::from_str(&content).map_err(|e| GeochemError::Json {
            path: filename.to_string(),
            source: e,
        })?;
        Self::from_value(filename, root, settings)
    }

    /// Same as [`DatabaseReader::new`] for a document already in memory; `filename` only labels
    /// messages.
    pub fn from_value(
        filename: &str,
        mut root: Value,
        settings: &ReaderSettings,
    ) -> Result<Self, GeochemError> {
        if !root.is_object() {
            return Err(GeochemError::Parse(format!(
                "The {} database {} is not a JSON object",
                READER_LABEL, filename
            )));
        }
        for field in [HEADER, ELEMENTS, BASIS] {
            if root.get(field).is_none() {
                return Err(GeochemError::missing_field(READER_LABEL, filename, field));
            }
        }
        for field in ["temperatures", "activity model"] {
            if root[HEADER].get(field).is_none() {
                return Err(GeochemError::missing_field(READER_LABEL, filename, field));
            }
        }

        if settings.reexpress_free_electron && reexpress_free_electron(&mut root) {
            info!("free electron in {} reexpressed in terms of {}", filename, AQUEOUS_OXYGEN);
        }
        if settings.use_piecewise_interpolation && root[HEADER].get("logk model").is_some() {
            root[HEADER]["logk model"] = json!("piecewise-linear");
        }
        if settings.remove_all_extrapolated_secondary_species {
            let removed = remove_extrapolated_secondary_species(&mut root);
            info!(
                "removed {} extrapolated secondary species from {}",
                removed, filename
            );
        }

        let mut db = DatabaseReader {
            filename: filename.to_string(),
            activity_model: header_text(&root, "activity model"),
            fugacity_model: header_text(&root, "fugacity model"),
            logk_model: header_text(&root, "logk model"),
            temperatures: header_numbers(&root, filename, "temperatures")?,
            pressures: header_numbers(&root, filename, "pressures")?,
            debye_huckel: DebyeHuckel::default(),
            neutral_species: None,
            elements: catalog(&root, filename, ELEMENTS)?,
            basis_species: catalog(&root, filename, BASIS)?,
            secondary_species: catalog(&root, filename, SECONDARY)?,
            free_electron: catalog(&root, filename, FREE_ELECTRON_BLOCK)?,
            mineral_species: catalog(&root, filename, MINERALS)?,
            sorbing_minerals: catalog(&root, filename, SORBING)?,
            gas_species: catalog(&root, filename, GASES)?,
            redox_couples: catalog(&root, filename, REDOX)?,
            oxides: catalog(&root, filename, OXIDES)?,
            surface_species: catalog(&root, filename, SURFACE)?,
            root,
        };
        db.name_records();
        db.attach_sorbing_minerals();
        db.set_debye_huckel()?;
        db.set_neutral_species_activity()?;
        db.validate_header_axes()?;
        db.validate_log10k_lengths()?;

        info!(
            "parsed {}: {} basis, {} secondary, {} minerals, {} gases, {} redox couples, {} surface species, {} temperature points",
            db.filename,
            db.basis_species.len(),
            db.secondary_species.len(),
            db.mineral_species.len(),
            db.gas_species.len(),
            db.redox_couples.len(),
            db.surface_species.len(),
            db.temperatures.len()
        );
        Ok(db)
    }

    fn name_records(&mut self) {
        for (name, r) in self.basis_species.iter_mut() {
            r.name = name.clone();
        }
        for (name, r) in self.secondary_species.iter_mut() {
            r.name = name.clone();
        }
        for (name, r) in self.free_electron.iter_mut() {
            r.name = name.clone();
        }
        for (name, r) in self.mineral_species.iter_mut() {
            r.name = name.clone();
        }
        for (name, r) in self.gas_species.iter_mut() {
            r.name = name.clone();
        }
        for (name, r) in self.redox_couples.iter_mut() {
            r.name = name.clone();
        }
        for (name, r) in self.oxides.iter_mut() {
            r.name = name.clone();
        }
        for (name, r) in self.surface_species.iter_mut() {
            r.name = name.clone();
        }
    }

    fn attach_sorbing_minerals(&mut self) {
        for (name, sorbing) in &self.sorbing_minerals {
            match self.mineral_species.get_mut(name) {
                Some(mineral) => {
                    mineral.surface_area = sorbing.surface_area;
                    mineral.sorption_sites = sorbing.sorption_sites.clone();
                }
                None => warn!(
                    "sorbing mineral {} in {} has no entry under \"{}\"",
                    name, self.filename, MINERALS
                ),
            }
        }
    }

    fn set_debye_huckel(&mut self) -> Result<(), GeochemError> {
        if self.activity_model != "debye-huckel" {
            return Ok(());
        }
        let adh = header_numbers(&self.root, &self.filename, "adh")?;
        let bdh = header_numbers(&self.root, &self.filename, "bdh")?;
        let bdot = header_numbers(&self.root, &self.filename, "bdot")?;
        let n = self.temperatures.len();
        for (param, values) in [("adh", &adh), ("bdh", &bdh), ("bdot", &bdot)] {
            if !values.is_empty() && values.len() != n {
                return Err(GeochemError::Validation(format!(
                    "The Debye-Huckel {} array in database {} has {} values, but the temperature axis has {} points",
                    param,
                    self.filename,
                    values.len(),
                    n
                )));
            }
        }
        self.debye_huckel = DebyeHuckel { adh, bdh, bdot };
        Ok(())
    }

    fn set_neutral_species_activity(&mut self) -> Result<(), GeochemError> {
        let Some(block) = self.root[HEADER].get("neutral species") else {
            return Ok(());
        };
        let Some(block) = block.as_object() else {
            return Err(GeochemError::Parse(format!(
                "\"neutral species\" in database {} must be an object",
                self.filename
            )));
        };
        let mut all = BTreeMap::new();
        for (species, coeffs) in block {
            let mut nsa = NeutralSpeciesActivity::default();
            for (key, slot) in [
                ("a", &mut nsa.a),
                ("b", &mut nsa.b),
                ("c", &mut nsa.c),
                ("d", &mut nsa.d),
            ] {
                if let Some(values) = coeffs.get(key) {
                    *slot = numbers(values).ok_or_else(|| {
                        GeochemError::Parse(format!(
                            "Cannot read coefficient {} of neutral species {} in database {}",
                            key, species, self.filename
                        ))
                    })?;
                }
            }
            all.insert(species.clone(), nsa);
        }
        self.neutral_species = Some(all);
        Ok(())
    }

    /// Temperatures strictly ascending, pressures (if any) one per temperature point.
    fn validate_header_axes(&self) -> Result<(), GeochemError> {
        if let Some(pair) = self.temperatures.windows(2).find(|pair| pair[1] <= pair[0]) {
            return Err(GeochemError::Validation(format!(
                "The temperatures in database {} must be strictly increasing, but {} is followed by {}",
                self.filename, pair[0], pair[1]
            )));
        }
        if !self.pressures.is_empty() && self.pressures.len() != self.temperatures.len() {
            return Err(GeochemError::Validation(format!(
                "The pressures array in database {} has {} values, but the temperature axis has {} points",
                self.filename,
                self.pressures.len(),
                self.temperatures.len()
            )));
        }
        Ok(())
    }

    fn validate_log10k_lengths(&self) -> Result<(), GeochemError> {
        let n = self.temperatures.len();
        let check = |category: &str, name: &str, len: usize| {
            if len != n {
                Err(GeochemError::Validation(format!(
                    "The {} entry {} in database {} has {} log10K values, but the temperature axis has {} points",
                    category, name, self.filename, len, n
                )))
            } else {
                Ok(())
            }
        };
        for (name, s) in &self.secondary_species {
            check(SECONDARY, name, s.equilibrium_const.len())?;
        }
        for (name, s) in &self.free_electron {
            check(FREE_ELECTRON_BLOCK, name, s.equilibrium_const.len())?;
        }
        for (name, s) in &self.mineral_species {
            check(MINERALS, name, s.equilibrium_const.len())?;
        }
        for (name, s) in &self.gas_species {
            check(GASES, name, s.equilibrium_const.len())?;
        }
        for (name, s) in &self.redox_couples {
            check(REDOX, name, s.equilibrium_const.len())?;
        }
        Ok(())
    }

    //////////////////////////////HEADER QUERIES//////////////////////////////////

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn activity_model(&self) -> &str {
        &self.activity_model
    }

    pub fn fugacity_model(&self) -> &str {
        &self.fugacity_model
    }

    pub fn logk_model(&self) -> &str {
        &self.logk_model
    }

    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    pub fn pressures(&self) -> &[f64] {
        &self.pressures
    }

    pub fn debye_huckel(&self) -> Result<&DebyeHuckel, GeochemError> {
        if self.activity_model != "debye-huckel" {
            return Err(GeochemError::Validation(format!(
                "Attempted to get Debye-Huckel activity parameters but the activity model is {}",
                self.activity_model
            )));
        }
        Ok(&self.debye_huckel)
    }

    pub fn neutral_species_activity(
        &self,
    ) -> Result<&BTreeMap<String, NeutralSpeciesActivity>, GeochemError> {
        self.neutral_species.as_ref().ok_or_else(|| {
            GeochemError::Lookup("No neutral species activity coefficients in database".to_string())
        })
    }

    pub fn get_elements(&self) -> &BTreeMap<String, Element> {
        &self.elements
    }

    //////////////////////////////SPECIES LOOKUP//////////////////////////////////

    pub fn get_basis_species<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<BTreeMap<String, BasisSpecies>, GeochemError> {
        restrict(&self.basis_species, names, &self.filename)
    }

    /// Secondary species or free electron.
    pub fn get_equilibrium_species<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<BTreeMap<String, EquilibriumSpecies>, GeochemError> {
        let mut found = BTreeMap::new();
        for name in names {
            let name = name.as_ref();
            let species = self.equilibrium_species(name)?;
            found.insert(name.to_string(), species.clone());
        }
        Ok(found)
    }

    pub fn get_mineral_species<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<BTreeMap<String, MineralSpecies>, GeochemError> {
        restrict(&self.mineral_species, names, &self.filename)
    }

    pub fn get_gas_species<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<BTreeMap<String, GasSpecies>, GeochemError> {
        restrict(&self.gas_species, names, &self.filename)
    }

    pub fn get_redox_species<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<BTreeMap<String, RedoxSpecies>, GeochemError> {
        restrict(&self.redox_couples, names, &self.filename)
    }

    pub fn get_oxide_species<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<BTreeMap<String, OxideSpecies>, GeochemError> {
        restrict(&self.oxides, names, &self.filename)
    }

    pub fn get_surface_species<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<BTreeMap<String, SurfaceSpecies>, GeochemError> {
        restrict(&self.surface_species, names, &self.filename)
    }

    // single-record borrows used by the resolver
    pub(crate) fn basis(&self, name: &str) -> Result<&BasisSpecies, GeochemError> {
        self.basis_species
            .get(name)
            .ok_or_else(|| GeochemError::not_in_database(name, &self.filename))
    }

    pub(crate) fn equilibrium_species(
        &self,
        name: &str,
    ) -> Result<&EquilibriumSpecies, GeochemError> {
        self.secondary_species
            .get(name)
            .or_else(|| self.free_electron.get(name))
            .ok_or_else(|| GeochemError::not_in_database(name, &self.filename))
    }

    pub(crate) fn mineral(&self, name: &str) -> Result<&MineralSpecies, GeochemError> {
        self.mineral_species
            .get(name)
            .ok_or_else(|| GeochemError::not_in_database(name, &self.filename))
    }

    pub(crate) fn gas(&self, name: &str) -> Result<&GasSpecies, GeochemError> {
        self.gas_species
            .get(name)
            .ok_or_else(|| GeochemError::not_in_database(name, &self.filename))
    }

    pub(crate) fn redox(&self, name: &str) -> Result<&RedoxSpecies, GeochemError> {
        self.redox_couples
            .get(name)
            .ok_or_else(|| GeochemError::not_in_database(name, &self.filename))
    }

    pub(crate) fn surface(&self, name: &str) -> Result<&SurfaceSpecies, GeochemError> {
        self.surface_species
            .get(name)
            .ok_or_else(|| GeochemError::not_in_database(name, &self.filename))
    }

    //////////////////////////////CLASSIFICATION//////////////////////////////////

    pub fn is_basis_species(&self, name: &str) -> bool {
        self.basis_species.contains_key(name)
    }

    /// true for ordinary secondary species and for the free electron
    pub fn is_secondary_species(&self, name: &str) -> bool {
        self.secondary_species.contains_key(name) || self.free_electron.contains_key(name)
    }

    pub fn is_mineral_species(&self, name: &str) -> bool {
        self.mineral_species.contains_key(name)
    }

    pub fn is_redox_species(&self, name: &str) -> bool {
        self.redox_couples.contains_key(name)
    }

    pub fn is_gas_species(&self, name: &str) -> bool {
        self.gas_species.contains_key(name)
    }

    pub fn is_oxide_species(&self, name: &str) -> bool {
        self.oxides.contains_key(name)
    }

    pub fn is_surface_species(&self, name: &str) -> bool {
        self.surface_species.contains_key(name)
    }

    pub fn is_sorbing_mineral(&self, name: &str) -> bool {
        self.sorbing_minerals.contains_key(name)
    }

    //////////////////////////////NAME LISTS//////////////////////////////////

    pub fn mineral_species_names(&self) -> Vec<String> {
        self.mineral_species.keys().cloned().collect()
    }

    /// secondary species followed by the free electron
    pub fn secondary_species_names(&self) -> Vec<String> {
        self.secondary_species
            .keys()
            .chain(self.free_electron.keys())
            .cloned()
            .collect()
    }

    pub fn redox_couple_names(&self) -> Vec<String> {
        self.redox_couples.keys().cloned().collect()
    }

    pub fn surface_species_names(&self) -> Vec<String> {
        self.surface_species.keys().cloned().collect()
    }

    pub fn gas_species_names(&self) -> Vec<String> {
        self.gas_species.keys().cloned().collect()
    }

    //////////////////////////////REACTIONS//////////////////////////////////

    pub fn equilibrium_reactions<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<String>, GeochemError> {
        render_all(&self.secondary_species, names, &self.filename)
    }

    pub fn mineral_reactions<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<String>, GeochemError> {
        render_all(&self.mineral_species, names, &self.filename)
    }

    pub fn gas_reactions<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<String>, GeochemError> {
        render_all(&self.gas_species, names, &self.filename)
    }

    pub fn redox_reactions<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<String>, GeochemError> {
        render_all(&self.redox_couples, names, &self.filename)
    }

    pub fn oxide_reactions<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<String>, GeochemError> {
        render_all(&self.oxides, names, &self.filename)
    }

    /// Raw database entry of `name`, pretty printed as `"<name>:\n<json>"`.
    pub fn species_data(&self, name: &str) -> Result<String, GeochemError> {
        let mut output = None;
        if let Some(root) = self.root.as_object() {
            for block in root.values() {
                if let Some(entry) = block.get(name) {
                    output = Some(entry);
                }
            }
        }
        match output {
            Some(entry) => {
                let text = serde_json::to_string_pretty(entry).map_err(|e| GeochemError::Json {
                    path: self.filename.clone(),
                    source: e,
                })?;
                Ok(format!("{}:\n{}", name, text))
            }
            None => Err(GeochemError::Lookup(format!(
                "{} is not a species in the database",
                name
            ))),
        }
    }
}

/// Renders `"<name> = <terms>"`.
/// Coefficient 1 is omitted, -1 becomes `- name`, other negatives `-2name`,
/// positives are joined with `" + "`.
pub fn print_reaction(name: &str, reaction: &Stoichiometry) -> String {
    let mut terms = String::new();
    for (species, &coeff) in reaction {
        if coeff < 0.0 {
            if coeff == -1.0 {
                terms += &format!(" - {}", species);
            } else {
                terms += &format!(" {}{}", coeff, species);
            }
        } else if coeff == 1.0 {
            terms += &format!(" + {}", species);
        } else {
            terms += &format!(" + {}{}", coeff, species);
        }
    }
    // leading "+ "
    if terms.len() > 1 && terms.as_bytes()[1] == b'+' {
        terms.replace_range(1..3, "");
    }
    format!("{} ={}", name, terms)
}

/// numeric coefficient glued to a species name, e.g. `-7.5O2(aq)`
static COEFFICIENT_TERM: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^(-?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)(.+)$"));

/// Inverse of [`print_reaction`]: species name and its reaction coefficients.
pub fn parse_reaction(rendered: &str) -> Result<(String, Stoichiometry), GeochemError> {
    let (name, rhs) = rendered
        .split_once(" =")
        .ok_or_else(|| GeochemError::Parse(format!("'{}' is not a reaction", rendered)))?;
    let coefficient = COEFFICIENT_TERM
        .as_ref()
        .map_err(|e| GeochemError::Parse(format!("bad reaction pattern: {}", e)))?;
    let mut reaction = Stoichiometry::new();
    let mut sign = 1.0;
    for token in rhs.split_whitespace() {
        match token {
            "+" => sign = 1.0,
            "-" => sign = -1.0,
            _ => {
                let (coeff, species) = match coefficient.captures(token) {
                    Some(caps) => {
                        let value = caps[1].parse::<f64>().map_err(|_| {
                            GeochemError::Parse(format!(
                                "bad coefficient in term '{}' of '{}'",
                                token, rendered
                            ))
                        })?;
                        (value, caps[2].to_string())
                    }
                    None => (1.0, token.to_string()),
                };
                *reaction.entry(species).or_insert(0.0) += sign * coeff;
                sign = 1.0;
            }
        }
    }
    Ok((name.trim().to_string(), reaction))
}

fn render_all<T: ReactionSpecies, S: AsRef<str>>(
    catalog: &BTreeMap<String, T>,
    names: &[S],
    filename: &str,
) -> Result<Vec<String>, GeochemError> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            catalog
                .get(name)
                .map(|s| print_reaction(name, s.reaction()))
                .ok_or_else(|| GeochemError::not_in_database(name, filename))
        })
        .collect()
}

fn restrict<T: Clone, S: AsRef<str>>(
    catalog: &BTreeMap<String, T>,
    names: &[S],
    filename: &str,
) -> Result<BTreeMap<String, T>, GeochemError> {
    let mut found = BTreeMap::new();
    for name in names {
        let name = name.as_ref();
        match catalog.get(name) {
            Some(record) => {
                found.insert(name.to_string(), record.clone());
            }
            None => return Err(GeochemError::not_in_database(name, filename)),
        }
    }
    Ok(found)
}

/// Typed parse of one top-level block; an absent block is an empty catalog.
fn catalog<T: DeserializeOwned>(
    root: &Value,
    filename: &str,
    block: &str,
) -> Result<BTreeMap<String, T>, GeochemError> {
    match root.get(block) {
        None => {
            warn!("database {} has no \"{}\" block", filename, block);
            Ok(BTreeMap::new())
        }
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
            GeochemError::Parse(format!(
                "Cannot parse \"{}\" in database {}: {}",
                block, filename, e
            ))
        }),
    }
}

fn header_text(root: &Value, field: &str) -> String {
    match root[HEADER].get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn header_numbers(root: &Value, filename: &str, field: &str) -> Result<Vec<f64>, GeochemError> {
    match root[HEADER].get(field) {
        None => Ok(Vec::new()),
        Some(values) => numbers(values).ok_or_else(|| {
            GeochemError::Parse(format!(
                "Cannot read \"{}\" in database {}: expected an array of numbers",
                field, filename
            ))
        }),
    }
}

fn numbers(values: &Value) -> Option<Vec<f64>> {
    values.as_array()?.iter().map(value_as_f64).collect()
}

/// Rewrites `e-` through `O2(aq)` when `e-` references `O2(g)`, `O2(aq)` is a basis species
/// and the gas reaction is exactly `O2(g) = O2(aq)`. Returns whether the rewrite happened.
fn reexpress_free_electron(root: &mut Value) -> bool {
    let Some(stoi) = root
        .pointer(&format!("/{}/{}/species/{}", FREE_ELECTRON_BLOCK, FREE_ELECTRON, GAS_OXYGEN))
        .and_then(value_as_f64)
    else {
        return false;
    };
    if root.get(BASIS).and_then(|b| b.get(AQUEOUS_OXYGEN)).is_none() {
        return false;
    }
    let Some(gas_reaction) = root
        .get(GASES)
        .and_then(|g| g.get(GAS_OXYGEN))
        .and_then(|g| g.get("species"))
        .and_then(Value::as_object)
    else {
        return false;
    };
    if gas_reaction.len() != 1 || !gas_reaction.contains_key(AQUEOUS_OXYGEN) {
        return false;
    }
    let gas_logk = root[GASES][GAS_OXYGEN].get("logk").and_then(numbers);
    let n_temperatures = root[HEADER]
        .get("temperatures")
        .and_then(Value::as_array)
        .map(|t| t.len());

    let electron = &mut root[FREE_ELECTRON_BLOCK][FREE_ELECTRON];
    if let Some(species) = electron.get_mut("species").and_then(Value::as_object_mut) {
        species.remove(GAS_OXYGEN);
        let existing = species
            .get(AQUEOUS_OXYGEN)
            .and_then(value_as_f64)
            .unwrap_or(0.0);
        species.insert(AQUEOUS_OXYGEN.to_string(), json!(existing + stoi));
    }
    if let (Some(n), Some(gas_logk)) = (n_temperatures, gas_logk) {
        if let Some(logk) = electron.get("logk").and_then(numbers) {
            let combined: Vec<Value> = logk
                .iter()
                .zip(gas_logk.iter())
                .take(n)
                .map(|(e, o2)| json!(e + stoi * o2))
                .collect();
            electron["logk"] = Value::Array(combined);
        }
    }
    true
}

/// Drops secondary species carrying a `"note"` (extrapolated log10K). Returns how many.
fn remove_extrapolated_secondary_species(root: &mut Value) -> usize {
    let Some(secondary) = root.get_mut(SECONDARY).and_then(Value::as_object_mut) else {
        return 0;
    };
    let flagged: Vec<String> = secondary
        .iter()
        .filter(|(_, v)| v.get("note").is_some())
        .map(|(k, _)| k.clone())
        .collect();
    for name in &flagged {
        secondary.remove(name);
    }
    flagged.len()
}
