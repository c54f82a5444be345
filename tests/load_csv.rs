use std::fs;

use fi_forecast::{Dataset, FiError, PipelineConfig, SkipKind, Table};

fn write(dir: &std::path::Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

#[test]
fn load_dir_without_targets() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "observations.csv",
        "indicator_code,pillar,value_numeric,observation_date\nACC_OWNERSHIP,,46,2021-12-31\n",
    );
    write(
        dir.path(),
        "events.csv",
        "event_id,event_name,event_date,event_category\nEVT_1,Launch,2021-05-11,product_launch\n",
    );
    write(
        dir.path(),
        "impact_links.csv",
        "parent_id,related_indicator,impact_direction,impact_magnitude,lag_months,evidence_basis,confidence,notes\n",
    );

    let (data, report) = Dataset::load_dir(dir.path()).unwrap();
    assert_eq!(data.observations.len(), 1);
    assert!(data.targets.is_empty());
    assert!(data.links.is_empty());
    assert_eq!(report.targets, 0);
}

#[test]
fn missing_required_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "observations.csv",
        "indicator_code,pillar,value_numeric,observation_date\nACC_OWNERSHIP,,46,2021-12-31\n",
    );
    let err = Dataset::load_dir(dir.path()).unwrap_err();
    assert!(matches!(err, FiError::Io(_)));
}

#[test]
fn malformed_rows_reported_with_table_and_row() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "observations.csv",
        "indicator_code,pillar,value_numeric,observation_date\n\
         ACC_OWNERSHIP,access,46,2021-12-31\n\
         ACC_OWNERSHIP,access,49,31/12/2024\n\
         ACC_OWNERSHIP,planet,50,2024-12-31\n",
    );
    write(
        dir.path(),
        "events.csv",
        "event_id,event_name,event_date,event_category\nEVT_1,Launch,2021-05-11,product_launch\n",
    );
    write(
        dir.path(),
        "impact_links.csv",
        "parent_id,related_indicator,impact_direction,impact_magnitude,lag_months,evidence_basis,confidence,notes\n\
         EVT_1,ACC_OWNERSHIP,positive,-2,12,,,\n\
         EVT_1,ACC_OWNERSHIP,positive,2,12,,certain,\n\
         EVT_1,ACC_OWNERSHIP,positive,2,12,hunch,,\n",
    );

    let (data, report) = Dataset::load_dir(dir.path()).unwrap();
    assert_eq!(data.observations.len(), 1);
    assert!(data.links.is_empty());
    assert_eq!(report.skipped.len(), 5);

    let rows: Vec<(SkipKind, &str)> = report.skipped.iter().map(|s| (s.kind, s.id.as_str())).collect();
    assert!(rows.contains(&(SkipKind::Row { table: Table::Observations }, "2")));
    assert!(rows.contains(&(SkipKind::Row { table: Table::Observations }, "3")));
    assert!(rows.contains(&(SkipKind::Row { table: Table::ImpactLinks }, "1")));
    assert!(report.skipped.iter().all(|s| s.reason.starts_with("Malformed")));
}

#[test]
fn config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fi.toml");
    let config = PipelineConfig::default();
    fs::write(&path, toml::to_string(&config).unwrap()).unwrap();
    let back = PipelineConfig::from_toml_file(&path).unwrap();
    assert_eq!(back, config);
}
