//! Typed species records read from a geochemical database.
//!
//! Every record keeps its reaction as a map `species name -> stoichiometric coefficient`. The map
//! is ordered alphabetically which also fixes the order of terms in rendered reactions.
//!
//! Database files write numbers either as JSON numbers or as numeric strings (`"-6.5570"`), the
//! `number*` deserializers below accept both.
use enum_dispatch::enum_dispatch;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// reaction or composition: name -> coefficient
pub type Stoichiometry = BTreeMap<String, f64>;

/// Radius assigned to species whose activity coefficient is always one
/// (surface species converted into equilibrium species).
pub const UNIT_ACTIVITY_RADIUS: f64 = -1.5;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn into_f64<E: de::Error>(self) -> Result<f64, E> {
        match self {
            NumberOrText::Number(x) => Ok(x),
            NumberOrText::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("cannot convert '{}' to a number", s))),
        }
    }
}

pub(crate) fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrText::deserialize(deserializer)?.into_f64()
}

pub(crate) fn number_vec<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<NumberOrText> = Deserialize::deserialize(deserializer)?;
    raw.into_iter().map(|x| x.into_f64()).collect()
}

pub(crate) fn number_map<'de, D>(deserializer: D) -> Result<Stoichiometry, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, NumberOrText> = Deserialize::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(k, v)| v.into_f64().map(|x| (k, x)))
        .collect()
}

/// Reads a number out of an untyped JSON value (number or numeric string).
pub(crate) fn value_as_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    #[serde(rename = "molecular weight", deserialize_with = "number")]
    pub molecular_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasisSpecies {
    #[serde(skip)]
    pub name: String,
    /// element composition; empty for redox couples promoted into the basis
    #[serde(default, deserialize_with = "number_map")]
    pub elements: Stoichiometry,
    #[serde(deserialize_with = "number")]
    pub radius: f64,
    #[serde(deserialize_with = "number")]
    pub charge: f64,
    #[serde(rename = "molecular weight", deserialize_with = "number")]
    pub molecular_weight: f64,
}

/// Secondary species (and the free electron).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumSpecies {
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "species", deserialize_with = "number_map")]
    pub basis_species: Stoichiometry,
    #[serde(rename = "logk", deserialize_with = "number_vec")]
    pub equilibrium_const: Vec<f64>,
    #[serde(default, deserialize_with = "number")]
    pub radius: f64,
    #[serde(deserialize_with = "number")]
    pub charge: f64,
    #[serde(rename = "molecular weight", deserialize_with = "number")]
    pub molecular_weight: f64,
}

/// Redox couple. Same payload as an equilibrium species, kept as its own type because a redox
/// couple may also be promoted into the basis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedoxSpecies {
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "species", deserialize_with = "number_map")]
    pub basis_species: Stoichiometry,
    #[serde(rename = "logk", deserialize_with = "number_vec")]
    pub equilibrium_const: Vec<f64>,
    #[serde(default, deserialize_with = "number")]
    pub radius: f64,
    #[serde(deserialize_with = "number")]
    pub charge: f64,
    #[serde(rename = "molecular weight", deserialize_with = "number")]
    pub molecular_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MineralSpecies {
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "molar volume", deserialize_with = "number")]
    pub molar_volume: f64,
    #[serde(rename = "species", deserialize_with = "number_map")]
    pub basis_species: Stoichiometry,
    #[serde(rename = "logk", deserialize_with = "number_vec")]
    pub equilibrium_const: Vec<f64>,
    #[serde(rename = "molecular weight", deserialize_with = "number")]
    pub molecular_weight: f64,
    /// filled from the "sorbing minerals" block, zero otherwise
    #[serde(skip)]
    pub surface_area: f64,
    #[serde(skip)]
    pub sorption_sites: Stoichiometry,
}

/// Entry of the "sorbing minerals" block.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct SorbingMineral {
    #[serde(rename = "surface area", deserialize_with = "number")]
    pub surface_area: f64,
    #[serde(rename = "sorbing sites", deserialize_with = "number_map")]
    pub sorption_sites: Stoichiometry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasSpecies {
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "species", deserialize_with = "number_map")]
    pub basis_species: Stoichiometry,
    #[serde(rename = "logk", deserialize_with = "number_vec")]
    pub equilibrium_const: Vec<f64>,
    #[serde(rename = "molecular weight", deserialize_with = "number")]
    pub molecular_weight: f64,
    /// fugacity coefficients, empty when the database gives none
    #[serde(default, deserialize_with = "number_vec")]
    pub chi: Vec<f64>,
    #[serde(rename = "Pcrit", default, deserialize_with = "number")]
    pub pcrit: f64,
    #[serde(rename = "Tcrit", default, deserialize_with = "number")]
    pub tcrit: f64,
    #[serde(default, deserialize_with = "number")]
    pub omega: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OxideSpecies {
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "species", deserialize_with = "number_map")]
    pub basis_species: Stoichiometry,
    #[serde(rename = "molecular weight", deserialize_with = "number")]
    pub molecular_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSpecies {
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "species", deserialize_with = "number_map")]
    pub basis_species: Stoichiometry,
    #[serde(deserialize_with = "number")]
    pub charge: f64,
    #[serde(rename = "molecular weight", deserialize_with = "number")]
    pub molecular_weight: f64,
    /// log10K at the first temperature point
    #[serde(rename = "log K", deserialize_with = "number")]
    pub log10k: f64,
    #[serde(rename = "dlogK/dT", deserialize_with = "number")]
    pub dlog10k_dt: f64,
}

impl SurfaceSpecies {
    /// log10K(T) = log10K + dlog10K/dT * (T - T0) with T0 the first point of the axis
    pub fn log10k_over(&self, temperatures: &[f64]) -> Vec<f64> {
        let t0 = temperatures.first().copied().unwrap_or(0.0);
        temperatures
            .iter()
            .map(|t| self.log10k + self.dlog10k_dt * (t - t0))
            .collect()
    }

    /// Equilibrium-species view used by the resolver: tabulated log10K and
    /// the unit-activity radius flag.
    pub fn to_equilibrium(&self, temperatures: &[f64]) -> EquilibriumSpecies {
        EquilibriumSpecies {
            name: self.name.clone(),
            basis_species: self.basis_species.clone(),
            equilibrium_const: self.log10k_over(temperatures),
            radius: UNIT_ACTIVITY_RADIUS,
            charge: self.charge,
            molecular_weight: self.molecular_weight,
        }
    }
}

impl From<RedoxSpecies> for EquilibriumSpecies {
    fn from(rs: RedoxSpecies) -> Self {
        EquilibriumSpecies {
            name: rs.name,
            basis_species: rs.basis_species,
            equilibrium_const: rs.equilibrium_const,
            radius: rs.radius,
            charge: rs.charge,
            molecular_weight: rs.molecular_weight,
        }
    }
}

impl From<RedoxSpecies> for BasisSpecies {
    fn from(rs: RedoxSpecies) -> Self {
        BasisSpecies {
            name: rs.name,
            elements: Stoichiometry::new(),
            radius: rs.radius,
            charge: rs.charge,
            molecular_weight: rs.molecular_weight,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DebyeHuckel {
    pub adh: Vec<f64>,
    pub bdh: Vec<f64>,
    pub bdot: Vec<f64>,
}

/// Temperature polynomials of the activity coefficient of a neutral species.
/// Coefficient blocks missing from the database are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NeutralSpeciesActivity {
    pub a: Vec<f64>,
    pub b: Vec<f64>,
    pub c: Vec<f64>,
    pub d: Vec<f64>,
}

/// Anything with a reaction written in terms of other species.
#[enum_dispatch]
pub trait ReactionSpecies {
    fn name(&self) -> &str;
    fn reaction(&self) -> &Stoichiometry;
    /// log10K tabulated on the given temperature axis
    fn log10k(&self, temperatures: &[f64]) -> Vec<f64>;
    fn molecular_weight(&self) -> f64;
    fn charge(&self) -> f64 {
        0.0
    }
    fn radius(&self) -> f64 {
        0.0
    }
    fn molar_volume(&self) -> f64 {
        0.0
    }
    fn sorption_sites(&self) -> Option<&Stoichiometry> {
        None
    }
    /// First reaction term for which `known` is false.
    fn first_unresolved(&self, known: &dyn Fn(&str) -> bool) -> Option<String> {
        self.reaction()
            .keys()
            .find(|name| !known(name.as_str()))
            .cloned()
    }
}

impl ReactionSpecies for EquilibriumSpecies {
    fn name(&self) -> &str {
        &self.name
    }
    fn reaction(&self) -> &Stoichiometry {
        &self.basis_species
    }
    fn log10k(&self, _temperatures: &[f64]) -> Vec<f64> {
        self.equilibrium_const.clone()
    }
    fn molecular_weight(&self) -> f64 {
        self.molecular_weight
    }
    fn charge(&self) -> f64 {
        self.charge
    }
    fn radius(&self) -> f64 {
        self.radius
    }
}

impl ReactionSpecies for RedoxSpecies {
    fn name(&self) -> &str {
        &self.name
    }
    fn reaction(&self) -> &Stoichiometry {
        &self.basis_species
    }
    fn log10k(&self, _temperatures: &[f64]) -> Vec<f64> {
        self.equilibrium_const.clone()
    }
    fn molecular_weight(&self) -> f64 {
        self.molecular_weight
    }
    fn charge(&self) -> f64 {
        self.charge
    }
    fn radius(&self) -> f64 {
        self.radius
    }
}

impl ReactionSpecies for MineralSpecies {
    fn name(&self) -> &str {
        &self.name
    }
    fn reaction(&self) -> &Stoichiometry {
        &self.basis_species
    }
    fn log10k(&self, _temperatures: &[f64]) -> Vec<f64> {
        self.equilibrium_const.clone()
    }
    fn molecular_weight(&self) -> f64 {
        self.molecular_weight
    }
    fn molar_volume(&self) -> f64 {
        self.molar_volume
    }
    fn sorption_sites(&self) -> Option<&Stoichiometry> {
        Some(&self.sorption_sites)
    }
}

impl ReactionSpecies for GasSpecies {
    fn name(&self) -> &str {
        &self.name
    }
    fn reaction(&self) -> &Stoichiometry {
        &self.basis_species
    }
    fn log10k(&self, _temperatures: &[f64]) -> Vec<f64> {
        self.equilibrium_const.clone()
    }
    fn molecular_weight(&self) -> f64 {
        self.molecular_weight
    }
}

impl ReactionSpecies for OxideSpecies {
    fn name(&self) -> &str {
        &self.name
    }
    fn reaction(&self) -> &Stoichiometry {
        &self.basis_species
    }
    // oxides carry no equilibrium constant
    fn log10k(&self, temperatures: &[f64]) -> Vec<f64> {
        vec![0.0; temperatures.len()]
    }
    fn molecular_weight(&self) -> f64 {
        self.molecular_weight
    }
}

impl ReactionSpecies for SurfaceSpecies {
    fn name(&self) -> &str {
        &self.name
    }
    fn reaction(&self) -> &Stoichiometry {
        &self.basis_species
    }
    fn log10k(&self, temperatures: &[f64]) -> Vec<f64> {
        self.log10k_over(temperatures)
    }
    fn molecular_weight(&self) -> f64 {
        self.molecular_weight
    }
    fn charge(&self) -> f64 {
        self.charge
    }
}

/// Any reacting species of the database, as one closed set.
#[derive(Debug, Clone, PartialEq)]
#[enum_dispatch(ReactionSpecies)]
pub enum DatabaseSpecies {
    Equilibrium(EquilibriumSpecies),
    Redox(RedoxSpecies),
    Mineral(MineralSpecies),
    Gas(GasSpecies),
    Oxide(OxideSpecies),
    Surface(SurfaceSpecies),
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn test_numbers_as_text_or_json_numbers() {
        let v = json!({
            "species": {"H2O": "-1.000", "H+": 1, "HCO3-": "1.0"},
            "logk": ["-6.5570", -6.366],
            "charge": "0", "radius": 4.0, "molecular weight": "44.0098"
        });
        let ss: EquilibriumSpecies = serde_json::from_value(v).unwrap();
        assert_eq!(ss.basis_species["H2O"], -1.0);
        assert_eq!(ss.basis_species["H+"], 1.0);
        assert_eq!(ss.equilibrium_const, vec![-6.557, -6.366]);
        assert_relative_eq!(ss.molecular_weight, 44.0098);
    }

    #[test]
    fn test_bad_number_is_rejected() {
        let v = json!({"name": "Silver", "molecular weight": "heavy"});
        let el: Result<Element, _> = serde_json::from_value(v);
        assert!(el.is_err());
    }

    #[test]
    fn test_surface_species_conversion() {
        let surf = SurfaceSpecies {
            name: ">(w)FeOH2+".to_string(),
            basis_species: Stoichiometry::from([
                (">(w)FeOH".to_string(), 1.0),
                ("H+".to_string(), 1.0),
            ]),
            charge: 1.0,
            molecular_weight: 73.8622,
            log10k: -7.29,
            dlog10k_dt: -0.02,
        };
        let eq = surf.to_equilibrium(&[0.0, 25.0, 100.0]);
        assert_eq!(eq.radius, UNIT_ACTIVITY_RADIUS);
        assert_relative_eq!(eq.equilibrium_const[0], -7.29);
        assert_relative_eq!(eq.equilibrium_const[1], -7.79, epsilon = 1e-12);
        assert_relative_eq!(eq.equilibrium_const[2], -9.29, epsilon = 1e-12);
        assert_eq!(eq.charge, 1.0);
    }

    #[test]
    fn test_dispatch_and_first_unresolved() {
        let mineral = MineralSpecies {
            name: "Calcite".to_string(),
            molar_volume: 36.934,
            basis_species: Stoichiometry::from([
                ("Ca++".to_string(), 1.0),
                ("H+".to_string(), -1.0),
                ("HCO3-".to_string(), 1.0),
            ]),
            equilibrium_const: vec![2.0683],
            molecular_weight: 100.0892,
            surface_area: 0.0,
            sorption_sites: Stoichiometry::new(),
        };
        let species: DatabaseSpecies = mineral.into();
        assert_eq!(species.name(), "Calcite");
        assert_eq!(species.molar_volume(), 36.934);
        assert_eq!(species.charge(), 0.0);
        assert!(species.sorption_sites().is_some());
        let known = |n: &str| n == "H+" || n == "HCO3-";
        assert_eq!(species.first_unresolved(&known), Some("Ca++".to_string()));
        let all = |_: &str| true;
        assert_eq!(species.first_unresolved(&all), None);
    }
}
