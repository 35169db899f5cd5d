use irrigation_tool::coefficients::{
    FALLBACK_BASE_ET0, FALLBACK_SOIL_MULTIPLIER, ProfileKind,
};
use irrigation_tool::{
    CoefficientError, CoefficientTables, CoefficientTablesConfig, CropProfile, SoilProfile,
};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn default_tables_carry_registered_rates() {
    let tables = CoefficientTables::default();
    assert_eq!(tables.base_et0("Wheat"), 3.5);
    assert_eq!(tables.base_et0("Rice"), 4.0);
    assert_eq!(tables.base_et0("Corn"), 4.5);
    assert_eq!(tables.soil_multiplier("Clay"), 0.8);
    assert_eq!(tables.soil_multiplier("Loam"), 1.0);
    assert_eq!(tables.soil_multiplier("Sand"), 1.4);
    assert_eq!(tables.crops().len(), 4);
    assert_eq!(tables.soils().len(), 6);
}

#[test]
fn unknown_names_fall_back_silently() {
    let tables = CoefficientTables::default();
    assert_eq!(tables.base_et0("Barley"), FALLBACK_BASE_ET0);
    assert_eq!(tables.base_et0(""), 3.0);
    assert_eq!(tables.soil_multiplier("Peat"), FALLBACK_SOIL_MULTIPLIER);
    assert_eq!(tables.soil_multiplier("Peat"), 1.0);
}

#[test]
fn custom_crop_has_no_table_rate() {
    let tables = CoefficientTables::default();
    assert!(tables.is_custom_crop("Custom"));
    assert!(tables.is_custom_crop("  custom "));
    assert!(!tables.is_custom_crop("Wheat"));
    assert!(!tables.is_custom_crop("Barley"));
    assert!(tables.crop("Custom").unwrap().is_custom());
    assert_eq!(tables.base_et0("Custom"), FALLBACK_BASE_ET0);
}

#[test]
fn strict_lookup_ignores_case_and_padding() {
    let tables = CoefficientTables::default();
    assert_eq!(tables.crop(" wheat ").unwrap().name, "Wheat");
    assert_eq!(tables.soil("SANDY LOAM").unwrap().multiplier, 1.2);

    let err = tables.soil("Peat").unwrap_err();
    assert_eq!(err.kind, ProfileKind::Soil);
    assert_eq!(err.to_string(), "unknown soil profile 'Peat'");

    let err = tables.crop("Barley").unwrap_err();
    assert_eq!(err.kind, ProfileKind::Crop);
}

#[test]
fn tables_load_from_json_file() {
    let config = CoefficientTablesConfig {
        crops: vec![CropProfile::new("Barley", 2.8), CropProfile::custom("Custom")],
        soils: vec![SoilProfile::new("Peat", 0.7)],
    };
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(serde_json::to_string(&config).unwrap().as_bytes())
        .unwrap();

    let tables = CoefficientTables::from_json_file(file.path()).unwrap();
    assert_eq!(tables.base_et0("Barley"), 2.8);
    assert_eq!(tables.soil_multiplier("Peat"), 0.7);
    // Wheat is not in this file.
    assert_eq!(tables.base_et0("Wheat"), FALLBACK_BASE_ET0);
    assert_eq!(tables.to_config(), config);
}

#[test]
fn malformed_json_is_a_parse_error() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"{\"crops\": 12}").unwrap();
    let err = CoefficientTables::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, CoefficientError::Parse(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = CoefficientTables::from_json_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, CoefficientError::Io(_)));
}

#[test]
fn validation_rejects_bad_tables() {
    let empty_soils = CoefficientTablesConfig {
        crops: vec![CropProfile::new("Wheat", 3.5)],
        soils: vec![],
    };
    assert!(matches!(
        CoefficientTables::from_config(empty_soils),
        Err(CoefficientError::EmptyTable(ProfileKind::Soil))
    ));

    let duplicate = CoefficientTablesConfig {
        crops: vec![CropProfile::new("Wheat", 3.5), CropProfile::new("wheat", 3.6)],
        soils: vec![SoilProfile::new("Loam", 1.0)],
    };
    assert!(matches!(
        CoefficientTables::from_config(duplicate),
        Err(CoefficientError::DuplicateName {
            kind: ProfileKind::Crop,
            ..
        })
    ));

    let negative = CoefficientTablesConfig {
        crops: vec![CropProfile::new("Wheat", 3.5)],
        soils: vec![SoilProfile::new("Loam", -1.0)],
    };
    match CoefficientTables::from_config(negative) {
        Err(CoefficientError::InvalidValue { kind, value, .. }) => {
            assert_eq!(kind, ProfileKind::Soil);
            assert_eq!(value, -1.0);
        }
        other => panic!("expected invalid value, got {other:?}"),
    }
}
