///////////////////////TESTS////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use crate::Geochemistry::DatabaseReader::{DatabaseReader, parse_reaction, print_reaction};
    use crate::Geochemistry::geochem_errors::{ErrorKind, GeochemError};
    use crate::Geochemistry::species::{ReactionSpecies, Stoichiometry};
    use crate::settings::ReaderSettings;
    use approx::assert_relative_eq;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TESTDB: &str = "data/testdb.json";

    fn testdb() -> DatabaseReader {
        DatabaseReader::new(TESTDB, &ReaderSettings::default()).unwrap()
    }

    fn testdb_with(settings: ReaderSettings) -> DatabaseReader {
        DatabaseReader::new(TESTDB, &settings).unwrap()
    }

    fn testdb_root() -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(TESTDB).unwrap()).unwrap()
    }

    fn minimal_database() -> serde_json::Value {
        json!({
            "Header": {
                "activity model": "ideal",
                "temperatures": [25.0, 100.0]
            },
            "elements": {"H": {"name": "Hydrogen", "molecular weight": "1.0079"}},
            "basis species": {
                "H2O": {"elements": {"H": "2.000", "O": "1.000"}, "radius": "0.0", "charge": "0.0", "molecular weight": "18.0152"},
                "H+": {"elements": {"H": "1.000"}, "radius": "9.0", "charge": "1.0", "molecular weight": "1.0079"}
            }
        })
    }

    #[test]
    fn test_header_queries() {
        let db = testdb();
        assert_eq!(db.filename(), TESTDB);
        assert_eq!(db.activity_model(), "debye-huckel");
        assert_eq!(db.fugacity_model(), "tsonopoulos");
        assert_eq!(db.logk_model(), "fourth-order");
        assert_eq!(
            db.temperatures(),
            &[0.0, 25.0, 60.0, 100.0, 150.0, 200.0, 250.0, 300.0]
        );
        assert_eq!(db.pressures().len(), 8);
        assert_relative_eq!(db.pressures()[4], 4.76);
    }

    #[test]
    fn test_debye_huckel_and_neutral_species() {
        let db = testdb();
        let dh = db.debye_huckel().unwrap();
        assert_eq!(dh.adh.len(), 8);
        assert_relative_eq!(dh.adh[1], 0.5092);
        assert_relative_eq!(dh.bdh[7], 0.3965);
        assert_eq!(dh.bdot[7], 0.0);

        let neutral = db.neutral_species_activity().unwrap();
        assert_eq!(neutral.len(), 2);
        let co2 = &neutral["co2"];
        assert_relative_eq!(co2.a[1], 1.2806e-3);
        assert_relative_eq!(co2.c[2], 255.9);
        assert!(co2.d.is_empty());
        assert_eq!(neutral["h2o"].d, vec![1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_no_neutral_species() {
        let db = DatabaseReader::new(
            "data/faultydbs/no_neutral_species.json",
            &ReaderSettings::default(),
        )
        .unwrap();
        let err = db.neutral_species_activity().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert_eq!(
            err.to_string(),
            "No neutral species activity coefficients in database"
        );
        // the catalogs this file leaves out are simply empty
        assert!(db.mineral_species_names().is_empty());
        assert!(db.gas_species_names().is_empty());
    }

    #[test]
    fn test_missing_category_blocks_are_empty() {
        let mut root = testdb_root();
        root.as_object_mut().unwrap().remove("mineral species");
        let db = DatabaseReader::from_value("nominerals.json", root, &ReaderSettings::default())
            .unwrap();
        assert!(db.mineral_species_names().is_empty());
        assert!(!db.is_mineral_species("Calcite"));
        let err = db.get_mineral_species(&["Calcite"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert_eq!(err.to_string(), "Calcite does not exist in database nominerals.json");
        // the other catalogs are untouched
        assert_eq!(db.gas_species_names().len(), 4);
        assert!(db.is_secondary_species("CO2(aq)"));

        let db = DatabaseReader::from_value("ideal.json", minimal_database(), &ReaderSettings::default())
            .unwrap();
        assert!(db.mineral_species_names().is_empty());
        assert!(db.redox_couple_names().is_empty());
        assert!(db.surface_species_names().is_empty());
        assert_eq!(db.secondary_species_names(), Vec::<String>::new());
    }

    #[test]
    fn test_debye_huckel_needs_matching_model() {
        let db = DatabaseReader::from_value("ideal.json", minimal_database(), &ReaderSettings::default())
            .unwrap();
        let err = db.debye_huckel().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("the activity model is ideal"));
    }

    #[test]
    fn test_elements() {
        let db = testdb();
        let elements = db.get_elements();
        assert_eq!(elements.len(), 10);
        assert_eq!(elements["Ag"].name, "Silver");
        assert_relative_eq!(elements["Ag"].molecular_weight, 107.868);
        assert_eq!(elements["Al"].name, "Aluminum");
        assert_relative_eq!(elements["Al"].molecular_weight, 26.9815);
    }

    #[test]
    fn test_basis_species() {
        let db = testdb();
        let basis = db.get_basis_species(&["H+", "HCO3-"]).unwrap();
        assert_eq!(basis.len(), 2);
        let h = &basis["H+"];
        assert_eq!(h.name, "H+");
        assert_eq!(h.radius, 9.0);
        assert_eq!(h.charge, 1.0);
        assert_relative_eq!(h.molecular_weight, 1.0079);
        assert_eq!(h.elements["H"], 1.0);
        assert_eq!(basis["HCO3-"].elements["O"], 3.0);

        let err = db.get_basis_species(&["H+", "Zz"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert_eq!(err.to_string(), "Zz does not exist in database data/testdb.json");
    }

    #[test]
    fn test_equilibrium_species() {
        let db = testdb();
        let eq = db.get_equilibrium_species(&["CO2(aq)", "e-"]).unwrap();
        let co2 = &eq["CO2(aq)"];
        assert_relative_eq!(co2.equilibrium_const[0], -6.557);
        assert_relative_eq!(co2.equilibrium_const[7], -8.465);
        assert_eq!(co2.basis_species["H2O"], -1.0);
        assert_eq!(co2.radius, 4.0);
        assert_relative_eq!(co2.molecular_weight, 44.0098);
        assert!(eq.contains_key("e-"));
        assert!(db.get_equilibrium_species(&["Calcite"]).is_err());
    }

    #[test]
    fn test_free_electron_reexpressed() {
        let db = testdb();
        let eq = db.get_equilibrium_species(&["e-"]).unwrap();
        let e = &eq["e-"];
        let expected_logk = [
            23.4266, 21.50045, 19.277525, 17.24705, 15.238975, 13.64975, 12.34665, 11.27355,
        ];
        for (value, expected) in e.equilibrium_const.iter().zip(expected_logk.iter()) {
            assert_relative_eq!(*value, *expected, epsilon = 1e-9);
        }
        let expected_species = Stoichiometry::from([
            ("H2O".to_string(), 0.5),
            ("H+".to_string(), -1.0),
            ("O2(aq)".to_string(), -0.25),
        ]);
        assert_eq!(e.basis_species, expected_species);
        assert_eq!(e.charge, -1.0);
        assert_eq!(e.radius, 0.0);
        assert_eq!(e.molecular_weight, 0.0);
    }

    #[test]
    fn test_free_electron_not_reexpressed() {
        let db = testdb_with(ReaderSettings {
            reexpress_free_electron: false,
            ..ReaderSettings::default()
        });
        let eq = db.get_equilibrium_species(&["e-"]).unwrap();
        let e = &eq["e-"];
        let expected_logk = [
            22.76135, 20.7757, 18.513025, 16.4658, 14.473225, 12.92125, 11.68165, 10.67105,
        ];
        for (value, expected) in e.equilibrium_const.iter().zip(expected_logk.iter()) {
            assert_relative_eq!(*value, *expected, epsilon = 1e-12);
        }
        let expected_species = Stoichiometry::from([
            ("H2O".to_string(), 0.5),
            ("H+".to_string(), -1.0),
            ("O2(g)".to_string(), -0.25),
        ]);
        assert_eq!(e.basis_species, expected_species);
    }

    #[test]
    fn test_mineral_species_and_sorption() {
        let db = testdb();
        let minerals = db.get_mineral_species(&["Calcite", "Fe(OH)3(ppd)"]).unwrap();
        let calcite = &minerals["Calcite"];
        assert_relative_eq!(calcite.molar_volume, 36.934);
        assert_relative_eq!(calcite.molecular_weight, 100.0892);
        assert_relative_eq!(calcite.equilibrium_const[0], 2.0683);
        assert_eq!(calcite.surface_area, 0.0);
        assert!(calcite.sorption_sites.is_empty());

        let ferrihydrite = &minerals["Fe(OH)3(ppd)"];
        assert_eq!(ferrihydrite.surface_area, 600.0);
        assert_relative_eq!(ferrihydrite.sorption_sites[">(s)FeOH"], 0.005);
        assert_relative_eq!(ferrihydrite.sorption_sites[">(w)FeOH"], 0.2);
        assert_relative_eq!(ferrihydrite.molar_volume, 34.32);
    }

    #[test]
    fn test_gas_species() {
        let db = testdb();
        let gases = db.get_gas_species(&["CO2(g)", "N2(g)"]).unwrap();
        let co2 = &gases["CO2(g)"];
        assert_eq!(
            co2.chi,
            vec![-1430.87, 3.598, -0.00227, 3.47644, -0.01045, 8.46181e-06]
        );
        assert_eq!(co2.pcrit, 73.8);
        assert_eq!(co2.tcrit, 304.2);
        assert_eq!(co2.omega, 0.225);
        let n2 = &gases["N2(g)"];
        assert!(n2.chi.is_empty());
        assert_eq!(n2.pcrit, 33.9);
        assert_eq!(n2.tcrit, 126.2);
        assert_eq!(n2.omega, 0.039);
    }

    #[test]
    fn test_redox_oxide_and_surface_species() {
        let db = testdb();
        let redox = db.get_redox_species(&["Fe+++"]).unwrap();
        let fe3 = &redox["Fe+++"];
        assert_eq!(fe3.basis_species["Fe++"], 1.0);
        assert_eq!(fe3.basis_species["O2(aq)"], 0.25);
        assert_eq!(fe3.charge, 3.0);
        assert_relative_eq!(fe3.equilibrium_const[0], -10.0553);

        let oxides = db.get_oxide_species(&["Cu2O"]).unwrap();
        assert_relative_eq!(oxides["Cu2O"].molecular_weight, 143.0914);
        assert_eq!(oxides["Cu2O"].basis_species["Cu+"], 2.0);

        let surface = db.get_surface_species(&[">(w)FeOH2+"]).unwrap();
        let s = &surface[">(w)FeOH2+"];
        assert_eq!(s.charge, 1.0);
        assert_relative_eq!(s.log10k, -7.29);
        assert_relative_eq!(s.dlog10k_dt, -0.02);
        assert_relative_eq!(s.molecular_weight, 73.8622);
    }

    #[test]
    fn test_classification() {
        let db = testdb();
        assert!(db.is_basis_species("H+"));
        assert!(!db.is_basis_species("OH-"));
        assert!(db.is_secondary_species("OH-"));
        assert!(db.is_secondary_species("e-"));
        assert!(db.is_mineral_species("Calcite"));
        assert!(!db.is_mineral_species("CaCO3"));
        assert!(db.is_redox_species("Fe+++"));
        assert!(db.is_gas_species("O2(g)"));
        assert!(db.is_oxide_species("CaO"));
        assert!(db.is_surface_species(">bridged"));
        assert!(db.is_sorbing_mineral("Goethite"));
        assert!(!db.is_sorbing_mineral("Calcite"));
    }

    #[test]
    fn test_name_lists() {
        let db = testdb();
        assert_eq!(
            db.mineral_species_names(),
            vec!["Calcite", "Fe(OH)3(ppd)", "Goethite", "Lepidocrocite", "Something"]
        );
        assert_eq!(
            db.secondary_species_names(),
            vec!["CO2(aq)", "CO3--", "CaCO3", "CaOH+", "FeOH+", "OH-", "seq_via_OH", "e-"]
        );
        assert_eq!(
            db.redox_couple_names(),
            vec!["(O-phth)--", "Am++++", "CH4(aq)", "CuHCO3(aq)", "Fe+++"]
        );
        assert_eq!(
            db.surface_species_names(),
            vec![">(s)FeO-", ">(s)FeOCa+", ">(w)FeOH2+", ">bridged"]
        );
        assert_eq!(
            db.gas_species_names(),
            vec!["CH4(g)", "CO2(g)", "N2(g)", "O2(g)"]
        );
    }

    #[test]
    fn test_reaction_rendering() {
        let db = testdb();
        assert_eq!(
            db.equilibrium_reactions(&["CO2(aq)", "CO3--"]).unwrap(),
            vec!["CO2(aq) = H+ - H2O + HCO3-", "CO3-- = - H+ + HCO3-"]
        );
        assert_eq!(
            db.redox_reactions(&["(O-phth)--", "Am++++"]).unwrap(),
            vec![
                "(O-phth)-- = 6H+ -5H2O + 8HCO3- -7.5O2(aq)",
                "Am++++ = Am+++ + H+ -0.5H2O + 0.25O2(aq)"
            ]
        );
        assert_eq!(
            db.oxide_reactions(&["Cu2O"]).unwrap(),
            vec!["Cu2O = 2Cu+ -2H+ + H2O"]
        );
        assert_eq!(db.gas_reactions(&["CH4(g)"]).unwrap(), vec!["CH4(g) = CH4(aq)"]);
        assert_eq!(
            db.mineral_reactions(&["Calcite"]).unwrap(),
            vec!["Calcite = Ca++ - H+ + HCO3-"]
        );
        // the free electron is not an ordinary secondary species here
        assert!(db.equilibrium_reactions(&["e-"]).is_err());
        let err = db.gas_reactions(&["Zz(g)"]).unwrap_err();
        assert_eq!(err.to_string(), "Zz(g) does not exist in database data/testdb.json");
    }

    #[test]
    fn test_print_and_parse_reaction() {
        let reaction = Stoichiometry::from([
            ("H+".to_string(), 6.0),
            ("H2O".to_string(), -5.0),
            ("HCO3-".to_string(), 8.0),
            ("O2(aq)".to_string(), -7.5),
        ]);
        let rendered = print_reaction("(O-phth)--", &reaction);
        let (name, parsed) = parse_reaction(&rendered).unwrap();
        assert_eq!(name, "(O-phth)--");
        assert_eq!(parsed, reaction);

        let (name, parsed) = parse_reaction("CO3-- = - H+ + HCO3-").unwrap();
        assert_eq!(name, "CO3--");
        assert_eq!(parsed["H+"], -1.0);
        assert_eq!(parsed["HCO3-"], 1.0);

        assert_eq!(print_reaction("X", &Stoichiometry::new()), "X =");
        assert!(parse_reaction("no reaction here").is_err());
    }

    fn assert_round_trip<T: ReactionSpecies>(rendered: &[String], records: &BTreeMap<String, T>) {
        assert_eq!(rendered.len(), records.len());
        for line in rendered {
            let (name, parsed) = parse_reaction(line).unwrap();
            assert_eq!(&parsed, records[&name].reaction(), "{}", line);
        }
    }

    #[test]
    fn test_every_reaction_parses_back() {
        let db = testdb();
        let secondary: Vec<String> = db
            .secondary_species_names()
            .into_iter()
            .filter(|name| name != "e-")
            .collect();
        assert_round_trip(
            &db.equilibrium_reactions(&secondary).unwrap(),
            &db.get_equilibrium_species(&secondary).unwrap(),
        );
        let minerals = db.mineral_species_names();
        assert_round_trip(
            &db.mineral_reactions(&minerals).unwrap(),
            &db.get_mineral_species(&minerals).unwrap(),
        );
        let gases = db.gas_species_names();
        assert_round_trip(
            &db.gas_reactions(&gases).unwrap(),
            &db.get_gas_species(&gases).unwrap(),
        );
        let couples = db.redox_couple_names();
        assert_round_trip(
            &db.redox_reactions(&couples).unwrap(),
            &db.get_redox_species(&couples).unwrap(),
        );
        let oxides = ["CaO", "Cu2O"];
        assert_round_trip(
            &db.oxide_reactions(&oxides).unwrap(),
            &db.get_oxide_species(&oxides).unwrap(),
        );
    }

    #[test]
    fn test_remove_extrapolated_secondary_species() {
        let db = testdb_with(ReaderSettings {
            remove_all_extrapolated_secondary_species: true,
            ..ReaderSettings::default()
        });
        assert!(!db.is_secondary_species("OH-"));
        assert!(db.is_secondary_species("seq_via_OH"));
        assert!(db.is_secondary_species("CO2(aq)"));
        assert!(db.species_data("OH-").is_err());

        // kept by default
        assert!(testdb().is_secondary_species("OH-"));
    }

    #[test]
    fn test_piecewise_interpolation_override() {
        let piecewise = ReaderSettings {
            use_piecewise_interpolation: true,
            ..ReaderSettings::default()
        };
        assert_eq!(testdb_with(piecewise.clone()).logk_model(), "piecewise-linear");

        // nothing to override without a "logk model" entry
        let db = DatabaseReader::from_value("minimal.json", minimal_database(), &piecewise).unwrap();
        assert_eq!(db.logk_model(), "");
    }

    #[test]
    fn test_species_data() {
        let db = testdb();
        let data = db.species_data("Calcite").unwrap();
        assert!(data.starts_with("Calcite:\n"));
        assert!(data.contains("molar volume"));
        let data = db.species_data("H+").unwrap();
        assert!(data.contains("elements"));
        let err = db.species_data("Zz").unwrap_err();
        assert_eq!(err.to_string(), "Zz is not a species in the database");
    }

    #[test]
    fn test_missing_header() {
        let path = "data/faultydbs/missing_header.json";
        let err = DatabaseReader::new(path, &ReaderSettings::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(
            err.to_string(),
            "The geochemical database data/faultydbs/missing_header.json does not have a required \"Header\" field"
        );
    }

    #[test]
    fn test_missing_basis_block_in_temp_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"{{"Header": {{"activity model": "ideal", "temperatures": [25.0]}}, "elements": {{}}}}"#
        )
        .unwrap();
        let file_path = temp_file.path().to_str().unwrap();
        let err = DatabaseReader::new(file_path, &ReaderSettings::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "The geochemical database {} does not have a required \"basis species\" field",
                file_path
            )
        );
    }

    #[test]
    fn test_missing_temperatures() {
        let mut root = minimal_database();
        root["Header"].as_object_mut().unwrap().remove("temperatures");
        let err = DatabaseReader::from_value("notemps.json", root, &ReaderSettings::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The geochemical database notemps.json does not have a required \"temperatures\" field"
        );
    }

    #[test]
    fn test_temperature_axis_must_increase() {
        let mut root = testdb_root();
        root["Header"]["temperatures"][3] = json!("25.0000");
        let err = DatabaseReader::from_value("unordered.json", root, &ReaderSettings::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(
            err.to_string(),
            "The temperatures in database unordered.json must be strictly increasing, but 60 is followed by 25"
        );

        let mut root = minimal_database();
        root["Header"]["temperatures"] = json!([25.0, 25.0]);
        assert!(DatabaseReader::from_value("repeated.json", root, &ReaderSettings::default()).is_err());
    }

    #[test]
    fn test_pressures_follow_temperature_axis() {
        let mut root = testdb_root();
        root["Header"]["pressures"].as_array_mut().unwrap().pop();
        let err = DatabaseReader::from_value("shortp.json", root, &ReaderSettings::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(
            err.to_string(),
            "The pressures array in database shortp.json has 7 values, but the temperature axis has 8 points"
        );

        // no pressures at all is fine
        let db = DatabaseReader::from_value("ideal.json", minimal_database(), &ReaderSettings::default())
            .unwrap();
        assert!(db.pressures().is_empty());
    }

    #[test]
    fn test_log10k_length_mismatch() {
        let err = DatabaseReader::new(
            "data/faultydbs/bad_logk_length.json",
            &ReaderSettings::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(
            err.to_string(),
            "The secondary species entry OH- in database data/faultydbs/bad_logk_length.json has 2 log10K values, but the temperature axis has 3 points"
        );
    }

    #[test]
    fn test_unreadable_inputs() {
        let err = DatabaseReader::new("data/no_such_database.json", &ReaderSettings::default())
            .unwrap_err();
        assert!(matches!(err, GeochemError::Io { .. }));

        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{{ \"Header\": ").unwrap();
        let file_path = temp_file.path().to_str().unwrap();
        let err = DatabaseReader::new(file_path, &ReaderSettings::default()).unwrap_err();
        assert!(matches!(err, GeochemError::Json { .. }));
        assert_eq!(err.kind(), ErrorKind::Parse);
    }
}
