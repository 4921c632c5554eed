//! Error type shared by the database reader, the speciation resolver and the kinetic rate binder.
//!
//! Every construction failure is reported through [`GeochemError`]. Variants carry the complete
//! human-readable message so that callers (and log files) see exactly the text produced here;
//! [`GeochemError::kind`] gives a plain tag for code that needs to branch on the failure class.
use thiserror::Error;

/// Coarse classification of a [`GeochemError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    Validation,
    Lookup,
    Duplicate,
    Constraint,
    Unreducible,
    SiteConflict,
    RateResolution,
}

#[derive(Debug, Error)]
pub enum GeochemError {
    #[error("Failed to read file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse JSON content of '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// structurally missing or unreadable content
    #[error("{0}")]
    Parse(String),
    /// content present but inconsistent (array lengths, models)
    #[error("{0}")]
    Validation(String),
    /// unknown name requested
    #[error("{0}")]
    Lookup(String),
    #[error("{0}")]
    Duplicate(String),
    /// ordering or cross-list violation in user input
    #[error("{0}")]
    Constraint(String),
    #[error("{0}")]
    Unreducible(String),
    #[error("{0}")]
    SiteConflict(String),
    #[error("{0}")]
    RateResolution(String),
}

impl GeochemError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeochemError::Io { .. } => ErrorKind::Io,
            GeochemError::Json { .. } | GeochemError::Parse(_) => ErrorKind::Parse,
            GeochemError::Validation(_) => ErrorKind::Validation,
            GeochemError::Lookup(_) => ErrorKind::Lookup,
            GeochemError::Duplicate(_) => ErrorKind::Duplicate,
            GeochemError::Constraint(_) => ErrorKind::Constraint,
            GeochemError::Unreducible(_) => ErrorKind::Unreducible,
            GeochemError::SiteConflict(_) => ErrorKind::SiteConflict,
            GeochemError::RateResolution(_) => ErrorKind::RateResolution,
        }
    }

    pub fn missing_field(reader: &str, file: &str, field: &str) -> Self {
        GeochemError::Parse(format!(
            "The {} database {} does not have a required \"{}\" field",
            reader, file, field
        ))
    }

    pub fn not_in_database(name: &str, file: &str) -> Self {
        GeochemError::Lookup(format!("{} does not exist in database {}", name, file))
    }

    pub fn not_basis_or_redox(name: &str, file: &str) -> Self {
        GeochemError::Lookup(format!(
            "{} does not exist in the basis species or redox species in {}",
            name, file
        ))
    }

    pub fn duplicate_in_list(name: &str, list: &str) -> Self {
        GeochemError::Duplicate(format!("{} exists more than once in the {} list", name, list))
    }

    pub fn in_both_lists(name: &str, list_a: &str, list_b: &str) -> Self {
        GeochemError::Constraint(format!(
            "{} exists in both the {} and {} lists",
            name, list_a, list_b
        ))
    }

    pub fn first_basis_member(solvent: &str) -> Self {
        GeochemError::Constraint(format!(
            "First member of basis species list must be {}",
            solvent
        ))
    }

    pub fn unreducible(name: &str, dependency: &str) -> Self {
        GeochemError::Unreducible(format!(
            "The reaction for {} depends on {} which is not reducable to a set of basis species",
            name, dependency
        ))
    }

    pub fn sorbing_site_not_in_basis(name: &str, site: &str) -> Self {
        GeochemError::Unreducible(format!(
            "The sorbing sites for {} include {} which is not in the basis_species list",
            name, site
        ))
    }

    pub fn site_in_several_minerals(site: &str) -> Self {
        GeochemError::SiteConflict(format!(
            "The sorbing site {} appears in more than one sorbing mineral",
            site
        ))
    }

    pub fn several_sorbing_sites(name: &str) -> Self {
        GeochemError::SiteConflict(format!(
            "It is an error for any equilibrium species (such as {}) to have a reaction involving more than one sorbing site",
            name
        ))
    }

    pub fn not_kinetic(name: &str) -> Self {
        GeochemError::RateResolution(format!(
            "Cannot prescribe a kinetic rate to species {} since it is not a kinetic species",
            name
        ))
    }

    pub fn bad_promoting_species(name: &str) -> Self {
        GeochemError::RateResolution(format!(
            "Promoting species {} must be a basis or a secondary species",
            name
        ))
    }

    pub fn bad_progeny(name: &str) -> Self {
        GeochemError::RateResolution(format!(
            "Progeny {} must be a basis or a secondary species",
            name
        ))
    }

    pub fn not_original_basis(name: &str) -> Self {
        GeochemError::Lookup(format!("species {} is not in the original basis", name))
    }
}
