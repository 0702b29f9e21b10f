use std::fs;

use gamma_atten::reference::{
    Interpolate, ReferenceLibrary, ReferencePoint, ReferenceTable, load_builtin_v1,
    load_reference_tsv,
};
use tempfile::TempDir;

fn two_point_water() -> ReferenceTable {
    ReferenceTable::new(
        "water",
        vec![
            ReferencePoint::new(0.001, 4078.0),
            ReferencePoint::new(0.002, 617.3),
        ],
    )
    .unwrap()
}

#[test]
fn log_log_midpoint() {
    let table = two_point_water();
    let e: f64 = 0.0015;
    let slope = (617.3f64.ln() - 4078.0f64.ln()) / (0.002f64.ln() - 0.001f64.ln());
    let by_hand = (4078.0f64.ln() + slope * (e.ln() - 0.001f64.ln())).exp();
    let value = table.lookup(e).unwrap();
    assert!((value - by_hand).abs() < 1e-9 * by_hand);
    assert!((value - 1376.0).abs() / 1376.0 < 0.03);
}

#[test]
fn exact_nodes_return_stored_values() {
    let table = ReferenceTable::new(
        "bone",
        vec![
            ReferencePoint::new(0.1, 0.1855),
            ReferencePoint::new(0.662, 0.0840),
            ReferencePoint::new(1.0, 0.06566),
        ],
    )
    .unwrap();
    for p in table.points() {
        assert_eq!(table.lookup(p.energy).unwrap(), p.mu_over_rho);
    }
}

#[test]
fn flat_extrapolation_both_ends() {
    let table = ReferenceTable::new(
        "lead",
        vec![
            ReferencePoint::new(0.1, 5.549),
            ReferencePoint::new(1.0, 0.07102),
            ReferencePoint::new(10.0, 0.04972),
        ],
    )
    .unwrap();
    assert_eq!(table.lookup(0.01).unwrap(), 5.549);
    assert_eq!(table.lookup(1.0e-6).unwrap(), 5.549);
    assert_eq!(table.lookup(20.0).unwrap(), 0.04972);
    assert_eq!(table.lookup(1.0e6).unwrap(), 0.04972);
}

#[test]
fn interpolated_values_stay_between_neighbours() {
    let table = two_point_water();
    for e in [0.0011, 0.0013, 0.0017, 0.0019] {
        let v = table.lookup(e).unwrap();
        assert!(v < 4078.0 && v > 617.3);
    }
}

#[test]
fn invalid_tables_rejected() {
    let single = ReferenceTable::new("water", vec![ReferencePoint::new(0.1, 0.17)]);
    assert_eq!(single.unwrap_err().kind(), "configuration");

    let unordered = ReferenceTable::new(
        "water",
        vec![
            ReferencePoint::new(0.2, 0.13),
            ReferencePoint::new(0.1, 0.17),
        ],
    );
    assert!(unordered.is_err());

    let duplicate = ReferenceTable::new(
        "water",
        vec![
            ReferencePoint::new(0.1, 0.17),
            ReferencePoint::new(0.1, 0.16),
        ],
    );
    assert!(duplicate.is_err());

    let negative = ReferenceTable::new(
        "water",
        vec![
            ReferencePoint::new(0.1, 0.17),
            ReferencePoint::new(0.2, -0.13),
        ],
    );
    assert!(negative.is_err());
}

#[test]
fn non_finite_energy_rejected() {
    let table = two_point_water();
    assert!(table.lookup(f64::NAN).is_err());
    assert!(table.lookup(f64::INFINITY).is_err());
}

#[test]
fn interpolate_trait_object() {
    let table = two_point_water();
    let dyn_table: &dyn Interpolate = &table;
    assert_eq!(dyn_table.name(), "water");
    assert_eq!(dyn_table.lookup(0.002).unwrap(), 617.3);
}

#[test]
fn builtin_tables_cover_materials() {
    let tables = load_builtin_v1().unwrap();
    let names: Vec<&str> = tables.iter().map(|t| t.material()).collect();
    for m in ["water", "muscle", "bone", "lead"] {
        assert!(names.contains(&m), "missing {m}");
    }
    let library = ReferenceLibrary::builtin().unwrap();
    let water = library.get("water").unwrap();
    assert_eq!(water.lookup(0.001).unwrap(), 4078.0);
    let at_cs137 = water.lookup(0.662).unwrap();
    assert!(at_cs137 > 0.08 && at_cs137 < 0.09);
    assert!(library.get("unobtainium").is_err());
}

#[test]
fn overlay_replaces_by_material() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("ref.tsv");
    fs::write(
        &path,
        "material\tenergy_MeV\tmuRho_cm2g\nwater\t0.1\t0.2\nwater\t1.0\t0.07\nsteel\t0.1\t0.37\nsteel\t1.0\t0.06\n",
    )
    .unwrap();

    let library = ReferenceLibrary::with_overlay(Some(&path)).unwrap();
    let water = library.get("water").unwrap();
    assert_eq!(water.points().len(), 2);
    assert_eq!(water.lookup(0.1).unwrap(), 0.2);
    assert!(library.get("steel").is_ok());
    assert!(library.get("lead").is_ok());
}

#[test]
fn malformed_reference_tsv_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("bad.tsv");
    fs::write(&path, "water\t0.1\n").unwrap();
    assert!(load_reference_tsv(&path).is_err());

    fs::write(&path, "water\t0.2\t0.1\nwater\t0.1\t0.2\n").unwrap();
    assert!(load_reference_tsv(&path).is_err());
}
