/// reader of JSON geochemical databases (typed, name-keyed lookups and reaction rendering)
/// # Examples
/// ```no_run
/// use GeochemBasis::Geochemistry::DatabaseReader::DatabaseReader;
/// use GeochemBasis::settings::ReaderSettings;
/// let db = DatabaseReader::new("data/testdb.json", &ReaderSettings::default()).unwrap();
/// for reaction in db.mineral_reactions(&["Calcite"]).unwrap() {
///     println!("{}", reaction);
/// }
/// ```
pub mod DatabaseReader;
#[cfg(test)]
mod DatabaseReader_tests;
/// kinetic rate descriptions and their binding to a reduced model
pub mod KineticRate;
/// the reduced reaction network handed to the solver
pub mod ReducedModel;
/// derives the reduced model from a database and a user selection of species
/// # Examples
/// ```no_run
/// use std::sync::Arc;
/// use GeochemBasis::Geochemistry::DatabaseReader::DatabaseReader;
/// use GeochemBasis::Geochemistry::KineticRate::KineticRateDescription;
/// use GeochemBasis::Geochemistry::SpeciationResolver::{SpeciationResolver, SystemDefinition};
/// use GeochemBasis::settings::ReaderSettings;
/// let db = Arc::new(DatabaseReader::new("data/testdb.json", &ReaderSettings::default()).unwrap());
/// let system = SystemDefinition::new(&["H2O", "H+", "HCO3-", "Ca++"]).with_kinetic_minerals(&["Calcite"]);
/// let mut resolver = SpeciationResolver::new(db, &system).unwrap();
/// let rate = KineticRateDescription::new("Calcite", 1.0e-9).with_promoting("H+", 1.0, 0.0, 0.0);
/// resolver.add_kinetic_rate(&rate).unwrap();
/// println!("{:?}", resolver.model().kin_rate[0].promoting_indices);
/// ```
pub mod SpeciationResolver;
/// error type of the crate
pub mod geochem_errors;
/// typed database records and the `ReactionSpecies` trait
pub mod species;
