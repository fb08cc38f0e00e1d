//! Shared fixtures: small synthetic datasets written to a temporary directory

use std::fs;
use std::path::{Path, PathBuf};

use symptom_triage::{ForestConfig, TriageConfig};
use tempfile::TempDir;

/// Raw header of the training table, including columns that must be dropped
const TRAINING_HEADER: &str =
    "  Chest Pain ,cough,headache,High-Fever,Skin  Rash,fluid_overload.1,Unnamed: 10,prognosis";

/// (disease, flags for chest_pain/cough/headache/high_fever/skin_rash, rows)
const TRAINING_ROWS: &[(&str, [u8; 5], usize)] = &[
    ("Heart attack", [1, 0, 0, 0, 0], 8),
    ("Hypertension", [1, 0, 0, 0, 0], 6),
    ("Bronchial Asthma", [0, 1, 0, 0, 0], 7),
    ("Pneumonia", [0, 1, 0, 1, 0], 5),
    ("Migraine", [0, 0, 1, 0, 0], 10),
    ("Malaria", [0, 0, 0, 1, 0], 15),
    ("Common Cold", [0, 0, 0, 1, 0], 4),
];

const CATEGORY_MAP: &str = "disease,category
Heart attack,Heart
 Hypertension ,Heart
Bronchial Asthma,Respiratory
Pneumonia,Respiratory
Migraine,Brain
Common Cold,General
";

/// Temporary data and artifact directories with a configuration pointing at them
pub struct Fixture {
    pub dir: TempDir,
    pub config: TriageConfig,
}

impl Fixture {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Small forest so tests stay fast
pub fn test_forest() -> ForestConfig {
    ForestConfig {
        n_estimators: 25,
        max_depth: 8,
        min_samples_leaf: 1,
        n_jobs: Some(2),
        ..ForestConfig::default()
    }
}

fn training_csv() -> String {
    let mut csv = String::from(TRAINING_HEADER);
    csv.push('\n');
    for (disease, flags, rows) in TRAINING_ROWS {
        for i in 0..*rows {
            let flags = flags.map(|f| f.to_string()).join(",");
            // trailing artifact columns hold junk that must never be read
            csv.push_str(&format!("{flags},{i},row{i},{disease}\n"));
        }
    }
    csv
}

/// Held-out rows with a shuffled column order and without the skin rash column
fn testing_csv() -> String {
    "prognosis,headache,cough,chest_pain,high_fever
Heart attack,0,0,1,0
Bronchial Asthma,0,1,0,0
Migraine,1,0,0,0
Malaria,0,0,0,1
"
    .to_string()
}

/// Write the datasets and category map; artifacts go to `<dir>/artifacts`
pub fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let write = |name: &str, content: String| -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).expect("Failed to write fixture file");
        path
    };

    let config = TriageConfig {
        training_data: write("Training.csv", training_csv()),
        testing_data: write("Testing.csv", testing_csv()),
        category_map: write("disease_category_map.csv", CATEGORY_MAP.to_string()),
        artifact_dir: dir.path().join("artifacts"),
        forest: test_forest(),
        ..TriageConfig::default()
    };
    Fixture { dir, config }
}

/// Total rows in the training fixture
pub fn training_row_count() -> usize {
    TRAINING_ROWS.iter().map(|(_, _, n)| n).sum()
}
