//! # Speciation resolver
//!
//! Takes a [`DatabaseReader`] and a user selection of species ([`SystemDefinition`]) and derives
//! the [`ReducedModel`]: every selected or implied species written purely in terms of the chosen
//! basis.
//!
//! Construction steps:
//! 1. index the explicit lists (basis, minerals, gases, kinetic minerals/redox/surface species),
//!    rejecting duplicates and cross-list conflicts;
//! 2. secondary closure, a single forward pass per category: redox couples, then secondary
//!    species, then surface species. A species is accepted when every term of its reaction is a
//!    basis species or an already accepted secondary species;
//! 3. `minerals = ["*"]` admits every reducible non-kinetic mineral, others are skipped silently;
//! 4. every explicitly listed species must be reducible, sorbing minerals need their sites in
//!    the basis;
//! 5. dense tables: equilibrium rows (secondary, minerals, gases), the redox table referenced to
//!    the electron, kinetic rows, surface-complexation bookkeeping.
//!
//! A failure anywhere aborts construction, no partial model is ever returned.
//! ```no_run
//! use std::sync::Arc;
//! use GeochemBasis::Geochemistry::DatabaseReader::DatabaseReader;
//! use GeochemBasis::Geochemistry::SpeciationResolver::{SpeciationResolver, SystemDefinition};
//! use GeochemBasis::settings::ReaderSettings;
//! let db = Arc::new(DatabaseReader::new("data/testdb.json", &ReaderSettings::default()).unwrap());
//! let system = SystemDefinition::new(&["H2O", "H+", "HCO3-", "Ca++"])
//!     .with_minerals(&["Calcite"])
//!     .with_gases(&["CO2(g)"]);
//! let resolver = SpeciationResolver::new(db, &system).unwrap();
//! resolver.model().pretty_print();
//! ```
use crate::Geochemistry::DatabaseReader::{AQUEOUS_OXYGEN, DatabaseReader, FREE_ELECTRON};
use crate::Geochemistry::KineticRate::KineticRateDescription;
use crate::Geochemistry::ReducedModel::{ReducedModel, SurfaceComplexationInfo};
use crate::Geochemistry::geochem_errors::GeochemError;
use crate::Geochemistry::species::{
    BasisSpecies, DatabaseSpecies, EquilibriumSpecies, GasSpecies, MineralSpecies,
    ReactionSpecies, RedoxSpecies, SurfaceSpecies,
};
use log::{debug, info, warn};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// First basis species of every system.
pub const SOLVENT_NAME: &str = "H2O";
/// Single-entry mineral list meaning "every reducible mineral".
pub const MINERAL_WILDCARD: &str = "*";

fn default_redox_ox() -> String {
    AQUEOUS_OXYGEN.to_string()
}

fn default_redox_e() -> String {
    FREE_ELECTRON.to_string()
}

fn to_names(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// User selection of species handed to the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemDefinition {
    /// first entry must be the solvent; redox couples may be listed here too
    pub basis_species: Vec<String>,
    /// equilibrium minerals, or `["*"]`
    #[serde(default)]
    pub minerals: Vec<String>,
    #[serde(default)]
    pub gases: Vec<String>,
    #[serde(default)]
    pub kinetic_minerals: Vec<String>,
    #[serde(default)]
    pub kinetic_redox: Vec<String>,
    #[serde(default)]
    pub kinetic_surface_species: Vec<String>,
    /// oxidant eliminated from the redox table
    #[serde(default = "default_redox_ox")]
    pub redox_ox: String,
    /// electron species the redox table is referenced to
    #[serde(default = "default_redox_e")]
    pub redox_e: String,
}

impl SystemDefinition {
    pub fn new(basis_species: &[&str]) -> Self {
        SystemDefinition {
            basis_species: to_names(basis_species),
            minerals: Vec::new(),
            gases: Vec::new(),
            kinetic_minerals: Vec::new(),
            kinetic_redox: Vec::new(),
            kinetic_surface_species: Vec::new(),
            redox_ox: default_redox_ox(),
            redox_e: default_redox_e(),
        }
    }

    pub fn with_minerals(mut self, names: &[&str]) -> Self {
        self.minerals = to_names(names);
        self
    }

    pub fn with_all_minerals(self) -> Self {
        self.with_minerals(&[MINERAL_WILDCARD])
    }

    pub fn with_gases(mut self, names: &[&str]) -> Self {
        self.gases = to_names(names);
        self
    }

    pub fn with_kinetic_minerals(mut self, names: &[&str]) -> Self {
        self.kinetic_minerals = to_names(names);
        self
    }

    pub fn with_kinetic_redox(mut self, names: &[&str]) -> Self {
        self.kinetic_redox = to_names(names);
        self
    }

    pub fn with_kinetic_surface_species(mut self, names: &[&str]) -> Self {
        self.kinetic_surface_species = to_names(names);
        self
    }

    pub fn with_redox(mut self, redox_ox: &str, redox_e: &str) -> Self {
        self.redox_ox = redox_ox.to_string();
        self.redox_e = redox_e.to_string();
        self
    }

    pub fn uses_mineral_wildcard(&self) -> bool {
        self.minerals.len() == 1 && self.minerals[0] == MINERAL_WILDCARD
    }
}

/// Records in insertion order plus name -> position.
#[derive(Debug, Clone)]
struct IndexedList<T> {
    index: HashMap<String, usize>,
    info: Vec<T>,
}

impl<T> IndexedList<T> {
    fn new() -> Self {
        IndexedList {
            index: HashMap::new(),
            info: Vec::new(),
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    fn push(&mut self, name: &str, record: T) {
        self.index.insert(name.to_string(), self.info.len());
        self.info.push(record);
    }
}

/// Writes `species` in terms of the basis: basis terms go straight into the row, any other term
/// is replaced by its already reduced row taken from `substitutes` (name -> row of
/// `sub_stoichiometry`/`sub_log10k`).
fn reduce_to_basis<T: ReactionSpecies>(
    species: &T,
    temperatures: &[f64],
    basis_index: &HashMap<String, usize>,
    substitutes: &HashMap<String, usize>,
    sub_stoichiometry: &DMatrix<f64>,
    sub_log10k: &DMatrix<f64>,
) -> Result<(Vec<f64>, Vec<f64>), GeochemError> {
    let mut stoi = vec![0.0; basis_index.len()];
    let mut log10k = species.log10k(temperatures);
    log10k.resize(temperatures.len(), 0.0);
    for (name, &coeff) in species.reaction() {
        if let Some(&col) = basis_index.get(name) {
            stoi[col] += coeff;
        } else if let Some(&row) = substitutes.get(name) {
            for (t, value) in log10k.iter_mut().enumerate() {
                *value += coeff * sub_log10k[(row, t)];
            }
            for (col, value) in stoi.iter_mut().enumerate() {
                *value += coeff * sub_stoichiometry[(row, col)];
            }
        } else {
            return Err(GeochemError::Unreducible(format!(
                "Species {} includes {}, which cannot be expressed in terms of the basis",
                species.name(),
                name
            )));
        }
    }
    Ok((stoi, log10k))
}

fn rows_to_matrix(rows: &[Vec<f64>], ncols: usize) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), ncols, |i, j| rows[i][j])
}

#[derive(Debug, Clone)]
pub struct SpeciationResolver {
    db: Arc<DatabaseReader>,
    basis: IndexedList<BasisSpecies>,
    minerals: IndexedList<MineralSpecies>,
    gases: IndexedList<GasSpecies>,
    kinetic_minerals: IndexedList<MineralSpecies>,
    kinetic_redox: IndexedList<RedoxSpecies>,
    kinetic_surface: IndexedList<SurfaceSpecies>,
    /// accepted redox couples, secondary species and surface species, in acceptance order
    secondary: IndexedList<EquilibriumSpecies>,
    redox_ox: String,
    redox_e: String,
    model: ReducedModel,
}

impl SpeciationResolver {
    pub fn new(db: Arc<DatabaseReader>, system: &SystemDefinition) -> Result<Self, GeochemError> {
        let mut resolver = SpeciationResolver {
            model: ReducedModel::new(Arc::clone(&db)),
            db,
            basis: IndexedList::new(),
            minerals: IndexedList::new(),
            gases: IndexedList::new(),
            kinetic_minerals: IndexedList::new(),
            kinetic_redox: IndexedList::new(),
            kinetic_surface: IndexedList::new(),
            secondary: IndexedList::new(),
            redox_ox: system.redox_ox.clone(),
            redox_e: system.redox_e.clone(),
        };
        let wildcard = system.uses_mineral_wildcard();

        resolver.build_basis(&system.basis_species)?;
        if !wildcard {
            resolver.build_minerals(&system.minerals)?;
        }
        resolver.build_gases(&system.gases)?;
        resolver.build_kinetic_minerals(&system.kinetic_minerals)?;
        resolver.build_kinetic_redox(&system.kinetic_redox)?;
        resolver.build_kinetic_surface(&system.kinetic_surface_species)?;

        resolver.build_secondary_species()?;
        if wildcard {
            resolver.build_all_minerals()?;
        }
        resolver.check_reducible()?;

        resolver.fill_basis();
        resolver.fill_equilibrium()?;
        resolver.fill_redox()?;
        resolver.fill_kinetic()?;
        resolver.fill_surface_sorption()?;

        let model = &resolver.model;
        info!(
            "reduced model: {} basis, {} equilibrium, {} kinetic species, {} redox rows, {} surface potentials",
            model.num_basis(),
            model.num_eqm(),
            model.num_kin(),
            model.redox_stoichiometry.nrows(),
            model.surface_sorption_name.len()
        );
        Ok(resolver)
    }

    pub fn model(&self) -> &ReducedModel {
        &self.model
    }

    /// independent copy for one solver node
    pub fn model_clone(&self) -> ReducedModel {
        self.model.clone()
    }

    pub fn into_model(self) -> ReducedModel {
        self.model
    }

    pub fn database(&self) -> &Arc<DatabaseReader> {
        &self.db
    }

    /// Binds a rate law to the owned model, see [`ReducedModel::add_kinetic_rate`].
    pub fn add_kinetic_rate(
        &mut self,
        description: &KineticRateDescription,
    ) -> Result<(), GeochemError> {
        self.model.add_kinetic_rate(description)
    }

    /// Position of `name` in the basis list given at construction, whatever swaps the model
    /// has seen since.
    pub fn index_of_original_basis_species(&self, name: &str) -> Result<usize, GeochemError> {
        self.basis
            .index
            .get(name)
            .copied()
            .ok_or_else(|| GeochemError::not_original_basis(name))
    }

    pub fn original_basis_names(&self) -> Vec<String> {
        self.basis.info.iter().map(|b| b.name.clone()).collect()
    }

    fn is_known(&self, name: &str) -> bool {
        self.basis.contains(name) || self.secondary.contains(name)
    }

    fn first_unknown<T: ReactionSpecies>(&self, species: &T) -> Option<String> {
        species.first_unresolved(&|name: &str| self.is_known(name))
    }

    //////////////////////////////EXPLICIT LISTS//////////////////////////////////

    fn build_basis(&mut self, names: &[String]) -> Result<(), GeochemError> {
        if names.is_empty() {
            return Err(GeochemError::first_basis_member(SOLVENT_NAME));
        }
        for (i, name) in names.iter().enumerate() {
            if i == 0 && name != SOLVENT_NAME {
                return Err(GeochemError::first_basis_member(SOLVENT_NAME));
            }
            if self.basis.contains(name) {
                return Err(GeochemError::duplicate_in_list(name, "basis species"));
            }
            let record = if self.db.is_basis_species(name) {
                self.db.basis(name)?.clone()
            } else if self.db.is_redox_species(name) {
                BasisSpecies::from(self.db.redox(name)?.clone())
            } else {
                return Err(GeochemError::not_basis_or_redox(name, self.db.filename()));
            };
            self.basis.push(name, record);
        }
        Ok(())
    }

    fn build_minerals(&mut self, names: &[String]) -> Result<(), GeochemError> {
        for name in names {
            if self.minerals.contains(name) {
                return Err(GeochemError::duplicate_in_list(name, "minerals"));
            }
            let record = self.db.mineral(name)?.clone();
            self.minerals.push(name, record);
        }
        Ok(())
    }

    fn build_gases(&mut self, names: &[String]) -> Result<(), GeochemError> {
        for name in names {
            if self.gases.contains(name) {
                return Err(GeochemError::duplicate_in_list(name, "gases"));
            }
            let record = self.db.gas(name)?.clone();
            self.gases.push(name, record);
        }
        Ok(())
    }

    fn build_kinetic_minerals(&mut self, names: &[String]) -> Result<(), GeochemError> {
        for name in names {
            if self.kinetic_minerals.contains(name) {
                return Err(GeochemError::duplicate_in_list(name, "kinetic_minerals"));
            }
            if self.minerals.contains(name) {
                return Err(GeochemError::in_both_lists(
                    name,
                    "minerals",
                    "kinetic_minerals",
                ));
            }
            let record = self.db.mineral(name)?.clone();
            self.kinetic_minerals.push(name, record);
        }
        Ok(())
    }

    fn build_kinetic_redox(&mut self, names: &[String]) -> Result<(), GeochemError> {
        for name in names {
            if self.kinetic_redox.contains(name) {
                return Err(GeochemError::duplicate_in_list(name, "kinetic_redox"));
            }
            if self.basis.contains(name) {
                return Err(GeochemError::in_both_lists(
                    name,
                    "basis_species",
                    "kinetic_redox",
                ));
            }
            let record = self.db.redox(name)?.clone();
            self.kinetic_redox.push(name, record);
        }
        Ok(())
    }

    fn build_kinetic_surface(&mut self, names: &[String]) -> Result<(), GeochemError> {
        for name in names {
            if self.kinetic_surface.contains(name) {
                return Err(GeochemError::duplicate_in_list(
                    name,
                    "kinetic_surface_species",
                ));
            }
            let record = self.db.surface(name)?.clone();
            self.kinetic_surface.push(name, record);
        }
        Ok(())
    }

    //////////////////////////////CLOSURE//////////////////////////////////

    fn build_secondary_species(&mut self) -> Result<(), GeochemError> {
        let db = Arc::clone(&self.db);

        for name in db.redox_couple_names() {
            if self.kinetic_redox.contains(&name) || self.basis.contains(&name) {
                continue;
            }
            let rs = db.redox(&name)?;
            match self.first_unknown(rs) {
                None => {
                    debug!("redox couple {} accepted as a secondary species", name);
                    self.secondary.push(&name, EquilibriumSpecies::from(rs.clone()));
                }
                Some(dep) => debug!("redox couple {} skipped: depends on {}", name, dep),
            }
        }

        for name in db.secondary_species_names() {
            if name == self.redox_e {
                continue;
            }
            let ss = db.equilibrium_species(&name)?;
            match self.first_unknown(ss) {
                None => {
                    debug!("secondary species {} accepted", name);
                    self.secondary.push(&name, ss.clone());
                }
                Some(dep) => debug!("secondary species {} skipped: depends on {}", name, dep),
            }
        }

        for name in db.surface_species_names() {
            if self.kinetic_surface.contains(&name) {
                continue;
            }
            let surf = db.surface(&name)?;
            match self.first_unknown(surf) {
                None => {
                    debug!("surface species {} accepted as a secondary species", name);
                    self.secondary
                        .push(&name, surf.to_equilibrium(db.temperatures()));
                }
                Some(dep) => debug!("surface species {} skipped: depends on {}", name, dep),
            }
        }
        Ok(())
    }

    fn build_all_minerals(&mut self) -> Result<(), GeochemError> {
        let db = Arc::clone(&self.db);
        for name in db.mineral_species_names() {
            if self.kinetic_minerals.contains(&name) {
                continue;
            }
            let mineral = db.mineral(&name)?;
            match self.first_unknown(mineral) {
                None => {
                    debug!("mineral {} admitted", name);
                    self.minerals.push(&name, mineral.clone());
                }
                Some(dep) => debug!("mineral {} not admitted: depends on {}", name, dep),
            }
        }
        Ok(())
    }

    fn check_reducible(&self) -> Result<(), GeochemError> {
        let explicit: Vec<DatabaseSpecies> = self
            .minerals
            .info
            .iter()
            .cloned()
            .map(DatabaseSpecies::from)
            .chain(self.gases.info.iter().cloned().map(DatabaseSpecies::from))
            .chain(
                self.kinetic_minerals
                    .info
                    .iter()
                    .cloned()
                    .map(DatabaseSpecies::from),
            )
            .chain(self.kinetic_redox.info.iter().cloned().map(DatabaseSpecies::from))
            .chain(
                self.kinetic_surface
                    .info
                    .iter()
                    .cloned()
                    .map(DatabaseSpecies::from),
            )
            .collect();
        for species in &explicit {
            if let Some(dep) = self.first_unknown(species) {
                return Err(GeochemError::unreducible(species.name(), &dep));
            }
            if let Some(sites) = species.sorption_sites() {
                for site in sites.keys() {
                    if !self.basis.contains(site) {
                        return Err(GeochemError::sorbing_site_not_in_basis(
                            species.name(),
                            site,
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    //////////////////////////////DENSE TABLES//////////////////////////////////

    fn fill_basis(&mut self) {
        let n = self.basis.info.len();
        let model = &mut self.model;
        model.basis_species_index = self.basis.index.clone();
        model.basis_species_name = self.basis.info.iter().map(|b| b.name.clone()).collect();
        model.basis_species_mineral = vec![false; n];
        model.basis_species_gas = vec![false; n];
        // sorption sites are switched off later
        model.basis_species_transported = vec![true; n];
        model.basis_species_charge = self.basis.info.iter().map(|b| b.charge).collect();
        model.basis_species_radius = self.basis.info.iter().map(|b| b.radius).collect();
        model.basis_species_molecular_weight = self
            .basis
            .info
            .iter()
            .map(|b| b.molecular_weight)
            .collect();
        model.basis_species_molecular_volume = vec![0.0; n];
    }

    fn fill_equilibrium(&mut self) -> Result<(), GeochemError> {
        let temperatures = self.db.temperatures().to_vec();
        let num_t = temperatures.len();
        let num_basis = self.basis.info.len();
        let num_secondary = self.secondary.info.len();
        // secondary species first so that a secondary index is also its row
        let overlap: Vec<DatabaseSpecies> = self
            .secondary
            .info
            .iter()
            .cloned()
            .map(DatabaseSpecies::from)
            .chain(self.minerals.info.iter().cloned().map(DatabaseSpecies::from))
            .chain(self.gases.info.iter().cloned().map(DatabaseSpecies::from))
            .collect();
        let num_rows = overlap.len();

        let model = &mut self.model;
        model.eqm_species_index = overlap
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name().to_string(), i))
            .collect();
        model.eqm_species_name = overlap.iter().map(|s| s.name().to_string()).collect();
        model.eqm_species_mineral = overlap
            .iter()
            .map(|s| matches!(s, DatabaseSpecies::Mineral(_)))
            .collect();
        model.eqm_species_gas = overlap
            .iter()
            .map(|s| matches!(s, DatabaseSpecies::Gas(_)))
            .collect();
        model.eqm_species_transported = model.eqm_species_mineral.iter().map(|m| !m).collect();
        // charge and radius of minerals and gases are zero
        model.eqm_species_charge = overlap
            .iter()
            .enumerate()
            .map(|(i, s)| if i < num_secondary { s.charge() } else { 0.0 })
            .collect();
        model.eqm_species_radius = overlap
            .iter()
            .enumerate()
            .map(|(i, s)| if i < num_secondary { s.radius() } else { 0.0 })
            .collect();
        model.eqm_species_molecular_weight =
            overlap.iter().map(|s| s.molecular_weight()).collect();
        model.eqm_species_molecular_volume = overlap.iter().map(|s| s.molar_volume()).collect();

        for mineral in self.minerals.info.iter().chain(self.kinetic_minerals.info.iter()) {
            if mineral.surface_area != 0.0 {
                model.surface_complexation_info.insert(
                    mineral.name.clone(),
                    SurfaceComplexationInfo {
                        surface_area: mineral.surface_area,
                        sorption_sites: mineral.sorption_sites.clone(),
                    },
                );
            }
        }
        for gas in &self.gases.info {
            model.gas_chi.insert(gas.name.clone(), gas.chi.clone());
        }

        model.eqm_stoichiometry = DMatrix::zeros(num_rows, num_basis);
        model.eqm_log10K = DMatrix::zeros(num_rows, num_t);
        for (row, species) in overlap.iter().enumerate() {
            // substitution reads rows filled earlier in this loop
            let (stoi, log10k) = reduce_to_basis(
                species,
                &temperatures,
                &model.basis_species_index,
                &self.secondary.index,
                &model.eqm_stoichiometry,
                &model.eqm_log10K,
            )?;
            for (col, value) in stoi.into_iter().enumerate() {
                model.eqm_stoichiometry[(row, col)] = value;
            }
            for (t, value) in log10k.into_iter().enumerate() {
                model.eqm_log10K[(row, t)] = value;
            }
        }
        Ok(())
    }

    /// true if the electron is a database secondary species reducible to the basis
    fn check_redox_e(&self) -> bool {
        match self.db.equilibrium_species(&self.redox_e) {
            Ok(electron) => self.first_unknown(electron).is_none(),
            Err(_) => false,
        }
    }

    fn fill_redox(&mut self) -> Result<(), GeochemError> {
        let db = Arc::clone(&self.db);
        let temperatures = db.temperatures();
        let num_t = temperatures.len();
        let num_basis = self.basis.info.len();
        let mut rows_stoi: Vec<Vec<f64>> = Vec::new();
        let mut rows_log10k: Vec<Vec<f64>> = Vec::new();

        let oxidant = self.model.basis_species_index.get(&self.redox_ox).copied();
        if let Some(o2_index) = oxidant.filter(|_| self.check_redox_e()) {
            let electron = db.equilibrium_species(&self.redox_e)?;
            let (e_stoi, e_log10k) = reduce_to_basis(
                electron,
                temperatures,
                &self.model.basis_species_index,
                &self.secondary.index,
                &self.model.eqm_stoichiometry,
                &self.model.eqm_log10K,
            )?;
            rows_stoi.push(e_stoi.clone());
            rows_log10k.push(e_log10k.clone());

            // e- = nu_i * basis_i + beta * oxidant
            let beta = e_stoi[o2_index];
            if beta != 0.0 {
                for (col, name) in self.model.basis_species_name.iter().enumerate() {
                    if !db.is_redox_species(name) {
                        continue;
                    }
                    let rs = db.redox(name)?;
                    let mut stoi = vec![0.0; num_basis];
                    let mut only_basis = true;
                    for (species, &coeff) in &rs.basis_species {
                        match self.model.basis_species_index.get(species) {
                            Some(&j) => stoi[j] = coeff,
                            None => {
                                only_basis = false;
                                break;
                            }
                        }
                    }
                    if !only_basis {
                        warn!(
                            "redox couple {} in the basis has a reaction outside the basis, no redox row built",
                            name
                        );
                        continue;
                    }
                    // 0 = -couple + nu_i * basis_i + alpha * oxidant
                    stoi[col] = -1.0;
                    let alpha = stoi[o2_index];
                    if alpha == 0.0 {
                        debug!(
                            "redox couple {} does not involve {}, no redox row built",
                            name, self.redox_ox
                        );
                        continue;
                    }
                    let factor = -beta / alpha;
                    rows_stoi.push(
                        stoi.iter()
                            .zip(e_stoi.iter())
                            .map(|(s, e)| factor * s + e)
                            .collect(),
                    );
                    rows_log10k.push(
                        rs.equilibrium_const
                            .iter()
                            .zip(e_log10k.iter())
                            .map(|(k, e)| factor * k + e)
                            .collect(),
                    );
                }
            }
        }
        self.model.redox_lhs = self.redox_e.clone();
        self.model.redox_stoichiometry = rows_to_matrix(&rows_stoi, num_basis);
        self.model.redox_log10K = rows_to_matrix(&rows_log10k, num_t);
        Ok(())
    }

    fn fill_kinetic(&mut self) -> Result<(), GeochemError> {
        let temperatures = self.db.temperatures().to_vec();
        let num_t = temperatures.len();
        let num_basis = self.basis.info.len();
        let overlap: Vec<DatabaseSpecies> = self
            .kinetic_minerals
            .info
            .iter()
            .cloned()
            .map(DatabaseSpecies::from)
            .chain(self.kinetic_redox.info.iter().cloned().map(DatabaseSpecies::from))
            .chain(
                self.kinetic_surface
                    .info
                    .iter()
                    .cloned()
                    .map(DatabaseSpecies::from),
            )
            .collect();
        let num_kin = overlap.len();

        let model = &mut self.model;
        model.kin_species_index = overlap
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name().to_string(), i))
            .collect();
        model.kin_species_name = overlap.iter().map(|s| s.name().to_string()).collect();
        model.kin_species_mineral = overlap
            .iter()
            .map(|s| matches!(s, DatabaseSpecies::Mineral(_)))
            .collect();
        // minerals and surface species stay put
        model.kin_species_transported = overlap
            .iter()
            .map(|s| matches!(s, DatabaseSpecies::Redox(_)))
            .collect();
        model.kin_species_charge = overlap.iter().map(|s| s.charge()).collect();
        model.kin_species_molecular_weight =
            overlap.iter().map(|s| s.molecular_weight()).collect();
        model.kin_species_molecular_volume = overlap.iter().map(|s| s.molar_volume()).collect();

        model.kin_stoichiometry = DMatrix::zeros(num_kin, num_basis);
        model.kin_log10K = DMatrix::zeros(num_kin, num_t);
        for (row, species) in overlap.iter().enumerate() {
            let (stoi, log10k) = reduce_to_basis(
                species,
                &temperatures,
                &model.basis_species_index,
                &model.eqm_species_index,
                &model.eqm_stoichiometry,
                &model.eqm_log10K,
            )?;
            for (col, value) in stoi.into_iter().enumerate() {
                model.kin_stoichiometry[(row, col)] = value;
            }
            for (t, value) in log10k.into_iter().enumerate() {
                model.kin_log10K[(row, t)] = value;
            }
        }
        Ok(())
    }

    fn fill_surface_sorption(&mut self) -> Result<(), GeochemError> {
        let model = &mut self.model;
        let num_rows = model.num_eqm();

        let mut all_sites = HashSet::new();
        for info in model.surface_complexation_info.values() {
            for site in info.sorption_sites.keys() {
                if !all_sites.insert(site.clone()) {
                    return Err(GeochemError::site_in_several_minerals(site));
                }
            }
        }

        model.surface_sorption_name.clear();
        model.surface_sorption_area.clear();
        model.surface_sorption_number = vec![None; num_rows];
        let complexation = model.surface_complexation_info.clone();
        for (mineral, info) in &complexation {
            let mut site_columns = Vec::new();
            for site in info.sorption_sites.keys() {
                let col = *model
                    .basis_species_index
                    .get(site)
                    .ok_or_else(|| GeochemError::sorbing_site_not_in_basis(mineral, site))?;
                model.basis_species_transported[col] = false;
                site_columns.push(col);
            }
            let involved = (0..num_rows).any(|j| {
                site_columns
                    .iter()
                    .any(|&col| model.eqm_stoichiometry[(j, col)] != 0.0)
            });
            if !involved {
                continue;
            }
            let slot = model.surface_sorption_name.len();
            model.surface_sorption_name.push(mineral.clone());
            model.surface_sorption_area.push(info.surface_area);
            for &col in &site_columns {
                for j in 0..num_rows {
                    if model.eqm_stoichiometry[(j, col)] == 0.0 {
                        continue;
                    }
                    if let Some(other) = model.surface_sorption_number[j] {
                        if other != slot {
                            return Err(GeochemError::several_sorbing_sites(
                                &model.eqm_species_name[j],
                            ));
                        }
                    }
                    model.surface_sorption_number[j] = Some(slot);
                    model.eqm_species_transported[j] = false;
                }
            }
        }
        Ok(())
    }
}
