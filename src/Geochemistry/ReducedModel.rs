//! Reduced reaction network consumed by the equilibrium/kinetic solver.
//!
//! Three index spaces (basis, equilibrium, kinetic) are stored as parallel arrays plus dense
//! stoichiometry and log10K matrices (rows = species, columns = basis species or temperature
//! points). Every stoichiometry row references basis columns only.
//!
//! The structure is built once by the
//! [`SpeciationResolver`](crate::Geochemistry::SpeciationResolver::SpeciationResolver) and then
//! cloned per solver node. After construction it changes only through
//! [`ReducedModel::record_swap`] and
//! [`ReducedModel::add_kinetic_rate`](crate::Geochemistry::KineticRate).
use crate::Geochemistry::DatabaseReader::DatabaseReader;
use crate::Geochemistry::KineticRate::KineticRateDefinition;
use crate::Geochemistry::geochem_errors::GeochemError;
use nalgebra::DMatrix;
use prettytable::{Cell, Row, Table};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Surface area and site densities of a mineral taking part in surface complexation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurfaceComplexationInfo {
    pub surface_area: f64,
    pub sorption_sites: BTreeMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct ReducedModel {
    original_database: Arc<DatabaseReader>,

    pub basis_species_index: HashMap<String, usize>,
    pub basis_species_name: Vec<String>,
    pub basis_species_mineral: Vec<bool>,
    pub basis_species_gas: Vec<bool>,
    /// false for sorption sites
    pub basis_species_transported: Vec<bool>,
    pub basis_species_charge: Vec<f64>,
    pub basis_species_radius: Vec<f64>,
    pub basis_species_molecular_weight: Vec<f64>,
    pub basis_species_molecular_volume: Vec<f64>,

    pub eqm_species_index: HashMap<String, usize>,
    pub eqm_species_name: Vec<String>,
    pub eqm_species_mineral: Vec<bool>,
    pub eqm_species_gas: Vec<bool>,
    pub eqm_species_transported: Vec<bool>,
    pub eqm_species_charge: Vec<f64>,
    pub eqm_species_radius: Vec<f64>,
    pub eqm_species_molecular_weight: Vec<f64>,
    pub eqm_species_molecular_volume: Vec<f64>,
    /// rows: equilibrium species, columns: basis species
    pub eqm_stoichiometry: DMatrix<f64>,
    /// rows: equilibrium species, columns: temperature points
    pub eqm_log10K: DMatrix<f64>,

    /// minerals owning a surface potential, in slot order
    pub surface_sorption_name: Vec<String>,
    pub surface_sorption_area: Vec<f64>,
    /// surface-potential slot of each equilibrium species, `None` if it sorbs on nothing
    pub surface_sorption_number: Vec<Option<usize>>,

    /// species on the left of every redox row ("e-" unless swapped)
    pub redox_lhs: String,
    /// row 0: the electron in the current basis; further rows: one per redox couple in
    /// the basis, with the oxidant eliminated
    pub redox_stoichiometry: DMatrix<f64>,
    pub redox_log10K: DMatrix<f64>,

    pub surface_complexation_info: BTreeMap<String, SurfaceComplexationInfo>,
    pub gas_chi: HashMap<String, Vec<f64>>,

    pub kin_species_index: HashMap<String, usize>,
    pub kin_species_name: Vec<String>,
    pub kin_species_mineral: Vec<bool>,
    pub kin_species_transported: Vec<bool>,
    pub kin_species_charge: Vec<f64>,
    pub kin_species_molecular_weight: Vec<f64>,
    pub kin_species_molecular_volume: Vec<f64>,
    pub kin_stoichiometry: DMatrix<f64>,
    pub kin_log10K: DMatrix<f64>,
    pub kin_rate: Vec<KineticRateDefinition>,

    /// basis indices swapped out, in order
    pub have_swapped_out_of_basis: Vec<usize>,
    /// equilibrium indices swapped in, in order
    pub have_swapped_into_basis: Vec<usize>,
    /// S_n * ... * S_1; a 0x0 matrix until the first swap
    pub swap_to_original_basis: DMatrix<f64>,
}

impl ReducedModel {
    /// Empty model tied to its source database.
    pub fn new(original_database: Arc<DatabaseReader>) -> Self {
        ReducedModel {
            original_database,
            basis_species_index: HashMap::new(),
            basis_species_name: Vec::new(),
            basis_species_mineral: Vec::new(),
            basis_species_gas: Vec::new(),
            basis_species_transported: Vec::new(),
            basis_species_charge: Vec::new(),
            basis_species_radius: Vec::new(),
            basis_species_molecular_weight: Vec::new(),
            basis_species_molecular_volume: Vec::new(),
            eqm_species_index: HashMap::new(),
            eqm_species_name: Vec::new(),
            eqm_species_mineral: Vec::new(),
            eqm_species_gas: Vec::new(),
            eqm_species_transported: Vec::new(),
            eqm_species_charge: Vec::new(),
            eqm_species_radius: Vec::new(),
            eqm_species_molecular_weight: Vec::new(),
            eqm_species_molecular_volume: Vec::new(),
            eqm_stoichiometry: DMatrix::zeros(0, 0),
            eqm_log10K: DMatrix::zeros(0, 0),
            surface_sorption_name: Vec::new(),
            surface_sorption_area: Vec::new(),
            surface_sorption_number: Vec::new(),
            redox_lhs: String::new(),
            redox_stoichiometry: DMatrix::zeros(0, 0),
            redox_log10K: DMatrix::zeros(0, 0),
            surface_complexation_info: BTreeMap::new(),
            gas_chi: HashMap::new(),
            kin_species_index: HashMap::new(),
            kin_species_name: Vec::new(),
            kin_species_mineral: Vec::new(),
            kin_species_transported: Vec::new(),
            kin_species_charge: Vec::new(),
            kin_species_molecular_weight: Vec::new(),
            kin_species_molecular_volume: Vec::new(),
            kin_stoichiometry: DMatrix::zeros(0, 0),
            kin_log10K: DMatrix::zeros(0, 0),
            kin_rate: Vec::new(),
            have_swapped_out_of_basis: Vec::new(),
            have_swapped_into_basis: Vec::new(),
            swap_to_original_basis: DMatrix::zeros(0, 0),
        }
    }

    pub fn original_database(&self) -> &Arc<DatabaseReader> {
        &self.original_database
    }

    pub fn num_basis(&self) -> usize {
        self.basis_species_name.len()
    }

    pub fn num_eqm(&self) -> usize {
        self.eqm_species_name.len()
    }

    pub fn num_kin(&self) -> usize {
        self.kin_species_name.len()
    }

    pub fn num_temperatures(&self) -> usize {
        self.eqm_log10K.ncols()
    }

    pub fn is_surface_sorption_related(&self, eqm_index: usize) -> bool {
        matches!(self.surface_sorption_number.get(eqm_index), Some(Some(_)))
    }

    pub fn has_swaps(&self) -> bool {
        !self.swap_to_original_basis.is_empty()
    }

    /// Appends one basis swap to the audit ledger.
    ///
    /// `swap_matrix` is the (basis x basis) matrix of this swap; the cumulative matrix becomes
    /// `swap_matrix` on the first swap and `swap_matrix * previous` afterwards.
    pub fn record_swap(
        &mut self,
        removed_basis_index: usize,
        inserted_eqm_index: usize,
        swap_matrix: DMatrix<f64>,
    ) -> Result<(), GeochemError> {
        let n = self.num_basis();
        if removed_basis_index >= n {
            return Err(GeochemError::Constraint(format!(
                "Cannot record a swap: basis index {} is out of range (basis size {})",
                removed_basis_index, n
            )));
        }
        if inserted_eqm_index >= self.num_eqm() {
            return Err(GeochemError::Constraint(format!(
                "Cannot record a swap: equilibrium index {} is out of range ({} equilibrium species)",
                inserted_eqm_index,
                self.num_eqm()
            )));
        }
        if swap_matrix.nrows() != n || swap_matrix.ncols() != n {
            return Err(GeochemError::Constraint(format!(
                "Cannot record a swap: swap matrix is {}x{} but the basis has {} species",
                swap_matrix.nrows(),
                swap_matrix.ncols(),
                n
            )));
        }
        self.swap_to_original_basis = if self.has_swaps() {
            &swap_matrix * &self.swap_to_original_basis
        } else {
            swap_matrix
        };
        self.have_swapped_out_of_basis.push(removed_basis_index);
        self.have_swapped_into_basis.push(inserted_eqm_index);
        Ok(())
    }

    fn species_table(
        &self,
        names: &[String],
        flags: &[(&str, &[bool])],
        charge: &[f64],
        stoichiometry: &DMatrix<f64>,
    ) -> Table {
        let mut table = Table::new();
        let mut header = vec![Cell::new("species")];
        for (label, _) in flags {
            header.push(Cell::new(label));
        }
        header.push(Cell::new("charge"));
        for basis in &self.basis_species_name {
            header.push(Cell::new(basis));
        }
        table.add_row(Row::new(header));
        for (i, name) in names.iter().enumerate() {
            let mut row = vec![Cell::new(name)];
            for (_, values) in flags {
                row.push(Cell::new(&values.get(i).copied().unwrap_or(false).to_string()));
            }
            row.push(Cell::new(&charge.get(i).copied().unwrap_or(0.0).to_string()));
            if i < stoichiometry.nrows() {
                for j in 0..stoichiometry.ncols() {
                    row.push(Cell::new(&format!("{}", stoichiometry[(i, j)])));
                }
            }
            table.add_row(Row::new(row));
        }
        table
    }

    /// Equilibrium species: flags, charge and basis coefficients. First row is the header.
    pub fn eqm_table(&self) -> Table {
        self.species_table(
            &self.eqm_species_name,
            &[
                ("mineral", self.eqm_species_mineral.as_slice()),
                ("gas", self.eqm_species_gas.as_slice()),
                ("transported", self.eqm_species_transported.as_slice()),
            ],
            &self.eqm_species_charge,
            &self.eqm_stoichiometry,
        )
    }

    /// Kinetic species: flags, charge and basis coefficients. First row is the header.
    pub fn kin_table(&self) -> Table {
        self.species_table(
            &self.kin_species_name,
            &[
                ("mineral", self.kin_species_mineral.as_slice()),
                ("transported", self.kin_species_transported.as_slice()),
            ],
            &self.kin_species_charge,
            &self.kin_stoichiometry,
        )
    }

    pub fn pretty_print(&self) {
        println!("basis: {}", self.basis_species_name.join(", "));
        println!("\nequilibrium species");
        self.eqm_table().printstd();
        if self.num_kin() > 0 {
            println!("\nkinetic species");
            self.kin_table().printstd();
        }
        if self.redox_stoichiometry.nrows() > 0 {
            println!(
                "\n{} redox rows referenced to {}",
                self.redox_stoichiometry.nrows(),
                self.redox_lhs
            );
        }
        for (slot, name) in self.surface_sorption_name.iter().enumerate() {
            println!(
                "surface potential {}: {} (area {})",
                slot, name, self.surface_sorption_area[slot]
            );
        }
    }
}

impl PartialEq for ReducedModel {
    fn eq(&self, rhs: &Self) -> bool {
        Arc::ptr_eq(&self.original_database, &rhs.original_database)
            && self.basis_species_index == rhs.basis_species_index
            && self.basis_species_name == rhs.basis_species_name
            && self.basis_species_mineral == rhs.basis_species_mineral
            && self.basis_species_gas == rhs.basis_species_gas
            && self.basis_species_transported == rhs.basis_species_transported
            && self.basis_species_charge == rhs.basis_species_charge
            && self.basis_species_radius == rhs.basis_species_radius
            && self.basis_species_molecular_weight == rhs.basis_species_molecular_weight
            && self.basis_species_molecular_volume == rhs.basis_species_molecular_volume
            && self.eqm_species_index == rhs.eqm_species_index
            && self.eqm_species_name == rhs.eqm_species_name
            && self.eqm_species_mineral == rhs.eqm_species_mineral
            && self.eqm_species_gas == rhs.eqm_species_gas
            && self.eqm_species_transported == rhs.eqm_species_transported
            && self.eqm_species_charge == rhs.eqm_species_charge
            && self.eqm_species_radius == rhs.eqm_species_radius
            && self.eqm_species_molecular_weight == rhs.eqm_species_molecular_weight
            && self.eqm_species_molecular_volume == rhs.eqm_species_molecular_volume
            && self.eqm_stoichiometry == rhs.eqm_stoichiometry
            && self.eqm_log10K == rhs.eqm_log10K
            && self.surface_sorption_name == rhs.surface_sorption_name
            && self.surface_sorption_area == rhs.surface_sorption_area
            && self.surface_sorption_number == rhs.surface_sorption_number
            && self.redox_lhs == rhs.redox_lhs
            && self.redox_stoichiometry == rhs.redox_stoichiometry
            && self.redox_log10K == rhs.redox_log10K
            && self.surface_complexation_info == rhs.surface_complexation_info
            && self.gas_chi == rhs.gas_chi
            && self.kin_species_index == rhs.kin_species_index
            && self.kin_species_name == rhs.kin_species_name
            && self.kin_species_mineral == rhs.kin_species_mineral
            && self.kin_species_transported == rhs.kin_species_transported
            && self.kin_species_charge == rhs.kin_species_charge
            && self.kin_species_molecular_weight == rhs.kin_species_molecular_weight
            && self.kin_species_molecular_volume == rhs.kin_species_molecular_volume
            && self.kin_stoichiometry == rhs.kin_stoichiometry
            && self.kin_log10K == rhs.kin_log10K
            && self.kin_rate == rhs.kin_rate
            && self.have_swapped_out_of_basis == rhs.have_swapped_out_of_basis
            && self.have_swapped_into_basis == rhs.have_swapped_into_basis
            && self.swap_to_original_basis == rhs.swap_to_original_basis
    }
}
