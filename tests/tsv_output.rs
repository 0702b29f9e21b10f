use std::fs;

use gamma_atten::compare::ComparisonRecord;
use gamma_atten::compare::materials::contrast;
use gamma_atten::fit::{
    FitModel, FitOptions, FitResult, FitWarning, SweepFit, fit, fit_sweep, sweep_points,
};
use gamma_atten::io::tsv_writer::{
    COMPARISON_HEADER, FIT_HEADER, MATERIALS_HEADER, SWEEP_HEADER, write_comparison_tsv,
    write_fit_tsv, write_materials_tsv, write_sweep_tsv,
};
use gamma_atten::materials::MaterialCatalog;
use gamma_atten::run::{RunRecord, UncertaintyModel};
use tempfile::TempDir;

#[test]
fn comparison_table_format() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("comparison_water.tsv");
    let records = vec![
        ComparisonRecord::new(0.1, 0.1707, 0.175),
        ComparisonRecord::new(0.662, 0.08614, 0.0),
    ];
    write_comparison_tsv(&path, &records).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], COMPARISON_HEADER);
    assert!(lines[1].starts_with("0.100000\t100.0\t1.707000e-1\t1.750000e-1\t2.52"));
    assert!(lines[2].starts_with("0.662000\t662.0\t"));
    assert!(lines[2].ends_with("\t0.00"));
}

#[test]
fn fit_table_writes_na_for_undefined() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("fit_summary.tsv");

    let good = fit(&[1.0, 2.0, 4.0], &[0.2, 0.4, 0.8], &[1.0; 3], FitOptions::default()).unwrap();
    let flat = FitResult {
        model: FitModel::Proportional,
        slope: -0.01,
        slope_error: 0.02,
        intercept: 0.0,
        intercept_error: None,
        chi_square: 1.5,
        ndf: 2,
        half_value_layer: None,
        tenth_value_layer: None,
        points: 3,
        warnings: vec![FitWarning::NonPositiveSlope { slope: -0.01 }],
    };
    let fits = vec![
        SweepFit {
            material: "water".to_string(),
            energy_mev: Some(0.662),
            density: Some(1.0),
            fit: good,
            points: Vec::new(),
        },
        SweepFit {
            material: "lead".to_string(),
            energy_mev: None,
            density: None,
            fit: flat,
            points: Vec::new(),
        },
    ];
    write_fit_tsv(&path, &fits).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], FIT_HEADER);
    assert!(lines[1].starts_with("water\t0.662\tproportional\t0.200000\t"));
    assert!(lines[1].ends_with("\t3.4657\t11.5129"));
    assert!(lines[2].starts_with("lead\tNA\tproportional\t"));
    assert!(lines[2].ends_with("\tNA\tNA"));
}

#[test]
fn materials_table_format() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("material_comparison.tsv");
    let catalog = MaterialCatalog::builtin().unwrap();
    let records = vec![
        RunRecord::from_counts("water", 5.0, Some(0.662), 1000, 650, UncertaintyModel::Poisson)
            .unwrap(),
        RunRecord::from_counts("lead", 5.0, Some(0.662), 1000, 0, UncertaintyModel::Poisson)
            .unwrap(),
    ];
    let result = contrast(&records, &catalog).unwrap();
    write_materials_tsv(&path, &result).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], MATERIALS_HEADER);
    assert!(lines[1].starts_with("water\tWater (H2O)\t1.00\t5\t0.650000\t"));
    assert_eq!(lines[2], "lead\tLead\t11.35\t5\t0.000000\tNA\tNA\t0\t1000");
}

#[test]
fn sweep_table_lists_points() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("sweep_lead_0.662MeV.tsv");
    let records = vec![
        RunRecord::from_counts("lead", 2.0, Some(0.662), 10_000, 0, UncertaintyModel::Poisson)
            .unwrap(),
        RunRecord::from_counts("lead", 0.5, Some(0.662), 10_000, 5_000, UncertaintyModel::Poisson)
            .unwrap(),
        RunRecord::from_counts("lead", 1.0, Some(0.662), 10_000, 2_500, UncertaintyModel::Poisson)
            .unwrap(),
    ];
    let sweep = SweepFit {
        material: "lead".to_string(),
        energy_mev: Some(0.662),
        density: Some(11.35),
        fit: fit_sweep(&records, FitOptions::default()).unwrap(),
        points: sweep_points(&records),
    };
    write_sweep_tsv(&path, &sweep).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], SWEEP_HEADER);
    assert_eq!(lines[1], "0.5\t5000\t0.500000\t0.007071\t0.693147\t0.014142");
    assert_eq!(lines[2], "1\t2500\t0.250000\t0.005000\t1.386294\t0.020000");
    assert_eq!(lines[3], "2\t0\t0.000000\t0.000000\tNA\tNA");
}
