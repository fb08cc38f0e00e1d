use crate::utils::{fixture, training_row_count};
use symptom_triage::{
    ArtifactStore, DiseaseCategoryMap, FeatureVector, GENERAL_CATEGORY, LabeledDataset,
    TriageConfig, TriageError, build_balanced_dataset, train_from_config,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Column names are normalized and artifact columns never reach the schema
#[test]
fn test_loaded_columns_are_normalized() -> symptom_triage::Result<()> {
    let fixture = fixture();
    let dataset = LabeledDataset::load(&fixture.config.training_data, "prognosis")?;

    assert_eq!(
        dataset.feature_names(),
        &["chest_pain", "cough", "headache", "high_fever", "skin_rash"]
    );
    assert_eq!(dataset.len(), training_row_count());
    Ok(())
}

/// Every non-General category ends up with the smallest category's row count
#[test]
fn test_balanced_counts_from_files() -> symptom_triage::Result<()> {
    let fixture = fixture();
    let dataset = LabeledDataset::load(&fixture.config.training_data, "prognosis")?;
    let category_map = DiseaseCategoryMap::load(&fixture.config.category_map)?;

    let mut rng = StdRng::seed_from_u64(42);
    let balanced = build_balanced_dataset(&dataset, &category_map, &mut rng)?;
    let counts = balanced.category_counts();

    // Brain is the smallest category with 10 rows
    assert_eq!(balanced.min_count(), 10);
    for category in ["Brain", "Heart", "Respiratory"] {
        assert_eq!(counts[category], 10, "{category}");
    }
    assert_eq!(counts[GENERAL_CATEGORY], 10);
    Ok(())
}

/// Training writes both artifacts and they load back consistently
#[test]
fn test_train_writes_loadable_artifacts() -> symptom_triage::Result<()> {
    let fixture = fixture();
    let summary = train_from_config(&fixture.config)?;

    assert_eq!(summary.source_rows, training_row_count());
    assert_eq!(summary.training_rows, 40);
    assert!(summary.schema_path.exists());
    assert!(summary.model_path.exists());

    let schema_text = std::fs::read_to_string(&summary.schema_path)?;
    assert_eq!(
        schema_text.lines().collect::<Vec<_>>(),
        vec!["chest_pain", "cough", "headache", "high_fever", "skin_rash"]
    );

    let loaded = ArtifactStore::from_config(&fixture.config).load()?;
    assert_eq!(loaded.schema, summary.artifacts.schema);
    assert_eq!(loaded.model.labels(), summary.artifacts.model.labels());
    assert_eq!(loaded.model.tree_count(), 25);
    assert_eq!(loaded.model.metadata().seed, 42);
    Ok(())
}

/// Retraining with the same seed reproduces the same forest
#[test]
fn test_same_seed_same_model() -> symptom_triage::Result<()> {
    let fixture = fixture();
    let first = train_from_config(&fixture.config)?.artifacts;
    let second = train_from_config(&fixture.config)?.artifacts;

    assert_eq!(first.schema, second.schema);
    let cases: [&[&str]; 4] = [&["cough"], &["headache"], &["high_fever", "cough"], &[]];
    for symptoms in cases {
        let vector = FeatureVector::from_symptoms(&first.schema, symptoms.iter().copied());
        assert_eq!(
            first.model.predict_proba(&vector),
            second.model.predict_proba(&vector)
        );
    }
    Ok(())
}

/// A category declared in the map but absent from the data stops training
#[test]
fn test_declared_category_without_rows_is_data_error() {
    let fixture = fixture();
    let map_path = fixture.path().join("extended_map.csv");
    let mut map = std::fs::read_to_string(&fixture.config.category_map).unwrap();
    map.push_str("Psoriasis,Skin\n");
    std::fs::write(&map_path, map).unwrap();

    let config = TriageConfig {
        category_map: map_path,
        ..fixture.config.clone()
    };
    let err = train_from_config(&config).unwrap_err();
    assert!(matches!(err, TriageError::DataError(_)), "{err}");
    assert!(err.to_string().contains("Skin"));
}

/// A table without the configured label column is rejected
#[test]
fn test_missing_label_column_is_data_error() {
    let fixture = fixture();
    let config = TriageConfig {
        label_column: "diagnosis".to_string(),
        ..fixture.config.clone()
    };
    let err = train_from_config(&config).unwrap_err();
    assert!(matches!(err, TriageError::DataError(_)), "{err}");
}

/// A non-binary feature cell is rejected with the column name
#[test]
fn test_non_binary_cell_is_data_error() {
    let fixture = fixture();
    let path = fixture.path().join("bad.csv");
    std::fs::write(&path, "cough,headache,prognosis\n1,0,Pneumonia\n2,0,Migraine\n").unwrap();

    let err = LabeledDataset::load(&path, "prognosis").unwrap_err();
    assert!(matches!(err, TriageError::DataError(_)), "{err}");
    assert!(err.to_string().contains("cough"));
}
