//! Kinetic rate laws bound to a [`ReducedModel`].
//!
//! A [`KineticRateDescription`] names species; binding it resolves the names into indices of the
//! model's combined basis+equilibrium space (`i < num_basis` is a basis species,
//! `num_basis + j` is equilibrium species `j`) and stores a [`KineticRateDefinition`].
//! Several rates may target the same kinetic species, the solver sums them.
use crate::Geochemistry::ReducedModel::ReducedModel;
use crate::Geochemistry::geochem_errors::GeochemError;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Direction in which a rate is allowed to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RateDirection {
    #[default]
    Both,
    Dissolution,
    Precipitation,
    Raw,
    Death,
}

/// User description of one rate law. Only the species names are interpreted here; every other
/// field is handed to the rate calculator as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KineticRateDescription {
    pub kinetic_species_name: String,
    pub intrinsic_rate_constant: f64,
    pub area_quantity: f64,
    pub multiply_by_mass: bool,
    pub kinetic_molal_index: f64,
    pub kinetic_monod_index: f64,
    pub kinetic_half_saturation: f64,
    pub promoting_species: Vec<String>,
    pub promoting_indices: Vec<f64>,
    pub promoting_monod_indices: Vec<f64>,
    pub promoting_half_saturation: Vec<f64>,
    pub eta: f64,
    pub theta: f64,
    pub activation_energy: f64,
    pub one_over_t0: f64,
    pub direction: RateDirection,
    pub progeny: String,
    pub progeny_efficiency: f64,
    pub kinetic_bio_efficiency: f64,
    pub energy_captured: f64,
}

impl Default for KineticRateDescription {
    fn default() -> Self {
        Self {
            kinetic_species_name: String::new(),
            intrinsic_rate_constant: 0.0,
            area_quantity: 1.0,
            multiply_by_mass: false,
            kinetic_molal_index: 0.0,
            kinetic_monod_index: 0.0,
            kinetic_half_saturation: 0.0,
            promoting_species: Vec::new(),
            promoting_indices: Vec::new(),
            promoting_monod_indices: Vec::new(),
            promoting_half_saturation: Vec::new(),
            eta: 1.0,
            theta: 1.0,
            activation_energy: 0.0,
            one_over_t0: 0.0,
            direction: RateDirection::Both,
            progeny: "H2O".to_string(),
            progeny_efficiency: 0.0,
            kinetic_bio_efficiency: 0.0,
            energy_captured: 0.0,
        }
    }
}

impl KineticRateDescription {
    pub fn new(kinetic_species_name: &str, intrinsic_rate_constant: f64) -> Self {
        Self {
            kinetic_species_name: kinetic_species_name.to_string(),
            intrinsic_rate_constant,
            ..Self::default()
        }
    }

    /// Adds one promoting term: m^index, Monod exponent and half-saturation constant.
    pub fn with_promoting(
        mut self,
        species: &str,
        index: f64,
        monod_index: f64,
        half_saturation: f64,
    ) -> Self {
        self.promoting_species.push(species.to_string());
        self.promoting_indices.push(index);
        self.promoting_monod_indices.push(monod_index);
        self.promoting_half_saturation.push(half_saturation);
        self
    }

    /// Checks that the promoting vectors are parallel and name each species once.
    pub fn validate(&self) -> Result<(), GeochemError> {
        let n = self.promoting_species.len();
        if self.promoting_indices.len() != n {
            return Err(GeochemError::RateResolution(
                "The promoting_species and promoting_indices vectors must be the same size"
                    .to_string(),
            ));
        }
        if self.promoting_monod_indices.len() != n {
            return Err(GeochemError::RateResolution(
                "The promoting_species and promoting_monod_indices vectors must be the same size"
                    .to_string(),
            ));
        }
        if self.promoting_half_saturation.len() != n {
            return Err(GeochemError::RateResolution(
                "The promoting_species and promoting_half_saturation vectors must be the same size"
                    .to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for name in &self.promoting_species {
            if !seen.insert(name.as_str()) {
                return Err(GeochemError::RateResolution(format!(
                    "Promoting species {} appears more than once",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// A rate law with every species name resolved against a [`ReducedModel`].
#[derive(Debug, Clone, PartialEq)]
pub struct KineticRateDefinition {
    /// index into the kinetic species
    pub kinetic_species_index: usize,
    /// dense over basis+equilibrium species, zero where a species does not promote
    pub promoting_indices: Vec<f64>,
    pub promoting_monod_indices: Vec<f64>,
    pub promoting_half_saturation: Vec<f64>,
    /// index into basis+equilibrium species
    pub progeny_index: usize,
    pub description: KineticRateDescription,
}

impl ReducedModel {
    /// index of `name` in basis+equilibrium space
    fn combined_index(&self, name: &str) -> Option<usize> {
        if let Some(&i) = self.basis_species_index.get(name) {
            Some(i)
        } else {
            self.eqm_species_index
                .get(name)
                .map(|&j| self.num_basis() + j)
        }
    }

    /// Resolves `description` and appends it to `kin_rate`. On error the model is unchanged.
    pub fn add_kinetic_rate(
        &mut self,
        description: &KineticRateDescription,
    ) -> Result<(), GeochemError> {
        description.validate()?;
        let kinetic_species = &description.kinetic_species_name;
        let kinetic_species_index = *self
            .kin_species_index
            .get(kinetic_species)
            .ok_or_else(|| GeochemError::not_kinetic(kinetic_species))?;

        let size = self.num_basis() + self.num_eqm();
        let mut promoting_ind = vec![0.0; size];
        let mut promoting_m_ind = vec![0.0; size];
        let mut promoting_k = vec![0.0; size];
        for (i, promoting_species) in description.promoting_species.iter().enumerate() {
            let index = self
                .combined_index(promoting_species)
                .ok_or_else(|| GeochemError::bad_promoting_species(promoting_species))?;
            promoting_ind[index] = description.promoting_indices[i];
            promoting_m_ind[index] = description.promoting_monod_indices[i];
            promoting_k[index] = description.promoting_half_saturation[i];
        }
        let progeny_index = self
            .combined_index(&description.progeny)
            .ok_or_else(|| GeochemError::bad_progeny(&description.progeny))?;

        self.kin_rate.push(KineticRateDefinition {
            kinetic_species_index,
            promoting_indices: promoting_ind,
            promoting_monod_indices: promoting_m_ind,
            promoting_half_saturation: promoting_k,
            progeny_index,
            description: description.clone(),
        });
        info!(
            "kinetic rate #{} bound to {}",
            self.kin_rate.len(),
            kinetic_species
        );
        Ok(())
    }
}
