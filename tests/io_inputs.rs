use std::fs;
use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use gamma_atten::io::events::{EVENTS_HEADER, parse_events, read_events};
use gamma_atten::io::manifest::read_manifest;
use gamma_atten::io::records::{RECORDS_HEADER, read_run_records, write_run_records};
use gamma_atten::run::{ATTENUATION_SENTINEL, RunRecord, UncertaintyModel};
use tempfile::TempDir;

const EVENTS: &str = "event_id\ttrack_id\tparticle_code\tedep_MeV\tx_mm\ty_mm\tz_mm\tboundary
0\t1\t22\t0.0\t0.1\t0.2\t50.0\t1
0\t1\t22\t0.1\t0.1\t0.2\t51.0\t0
2\t3\t11\t0.2\t1.0\t1.0\t50.0\t1
3\t1\t22\t0.0\t-4.0\t2.5\t50.0\t1
";

#[test]
fn events_grouped_by_id() {
    let events = parse_events(EVENTS.as_bytes(), "inline").unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[&0].len(), 2);
    assert!(events[&0][0].boundary_entry);
    assert!(!events[&0][1].boundary_entry);
    assert_eq!(events[&2][0].particle_code, 11);
    assert_eq!(events[&3][0].position.x, -4.0);
    assert!(EVENTS.starts_with(EVENTS_HEADER));
}

#[test]
fn gzipped_events_read() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("events.tsv.gz");
    let mut enc = GzEncoder::new(fs::File::create(&path).unwrap(), Compression::default());
    enc.write_all(EVENTS.as_bytes()).unwrap();
    enc.finish().unwrap();

    let events = read_events(&path).unwrap();
    assert_eq!(events.len(), 3);
}

#[test]
fn malformed_events_rejected() {
    assert!(parse_events("0\t1\t22\t0.0\t0\t0\n".as_bytes(), "short").is_err());
    assert!(parse_events("0\t1\t22\t-1.0\t0\t0\t0\t1\n".as_bytes(), "edep").is_err());
    assert!(parse_events("0\t1\t22\t0.0\t0\t0\t0\tmaybe\n".as_bytes(), "flag").is_err());
}

#[test]
fn manifest_resolves_relative_paths() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("runs.tsv");
    fs::write(
        &path,
        "material\tthickness_cm\tenergy_MeV\texpected_events\tevents_path\n\
         water\t5\t0.662\t1000\tevents/water_5.tsv\n\
         lead\t1\t-\t500\t/abs/lead_1.tsv\n",
    )
    .unwrap();

    let configs = read_manifest(&path).unwrap();
    assert_eq!(configs.len(), 2);
    assert_eq!(configs[0].energy_mev, Some(0.662));
    assert_eq!(configs[0].events_path, tmp.path().join("events/water_5.tsv"));
    assert_eq!(configs[1].energy_mev, None);
    assert_eq!(configs[1].expected_events, 500);
    assert_eq!(configs[1].events_path, std::path::PathBuf::from("/abs/lead_1.tsv"));
}

#[test]
fn empty_manifest_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("runs.tsv");
    fs::write(&path, "material\tthickness_cm\tenergy_MeV\texpected_events\tevents_path\n").unwrap();
    assert!(read_manifest(&path).is_err());
}

#[test]
fn run_records_table_round_trip() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("attenuation_data.tsv");
    let records = vec![
        RunRecord::from_counts("water", 5.0, Some(0.662), 100_000, 84_415, UncertaintyModel::Poisson)
            .unwrap(),
        RunRecord::from_counts("lead", 10.0, None, 100_000, 0, UncertaintyModel::Poisson).unwrap(),
    ];
    write_run_records(&path, &records).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], RECORDS_HEADER);
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("water\t5\t100000\t84415\t0.844150\t0.033885\t0.662\t"));
    assert!(lines[2].starts_with("lead\t10\t100000\t0\t0.000000\t999.000000\tNA\t"));
    assert!(lines[2].ends_with("\tdegenerate"));

    let back = read_run_records(&path, UncertaintyModel::Poisson).unwrap();
    assert_eq!(back, records);
    assert_eq!(back[1].attenuation_coeff_linear, ATTENUATION_SENTINEL);
}

#[test]
fn six_column_records_accepted() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("legacy.tsv");
    fs::write(
        &path,
        "material\tthicknessCm\ttotalEvents\ttransmittedEvents\ttransmissionRatio\tattenuationCoeffLinear\n\
         bone\t2\t1000\t700\t0.7\t0.178\n",
    )
    .unwrap();
    let records = read_run_records(&path, UncertaintyModel::Poisson).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].energy_mev, None);
    assert!((records[0].attenuation_coeff_linear - (-(0.7f64).ln() / 2.0)).abs() < 1e-12);
}

#[test]
fn inconsistent_records_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("bad.tsv");
    fs::write(&path, "water\t1\t100\t101\t1.01\t0\n").unwrap();
    assert!(read_run_records(&path, UncertaintyModel::Poisson).is_err());
}

#[test]
fn unreadable_lines_name_their_location() {
    let bytes: &[u8] = b"# crossings\n0\t1\t22\t0.0\t0\t0\t\xff\xfe\t1\n";
    let err = parse_events(bytes, "run7.tsv").unwrap_err();
    assert!(format!("{:#}", err).starts_with("run7.tsv:2 read error"));

    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("records.tsv");
    fs::write(&path, b"water\t1\t100\t90\t0.9\t0.105\n\xc3\x28\t2\t100\t80\t0.8\t0.11\n").unwrap();
    let err = read_run_records(&path, UncertaintyModel::Poisson).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains(&format!("{}:2 read error", path.display())));
}
