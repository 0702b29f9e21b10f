use std::fs;
use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

/// Ids below `transmitted` get a primary photon entry; a few of the rest get
/// secondaries only.
fn write_events(path: &Path, total: u64, transmitted: u64) {
    let mut out = String::from("event_id\ttrack_id\tparticle_code\tedep_MeV\tx_mm\ty_mm\tz_mm\tboundary\n");
    for id in 0..transmitted {
        out.push_str(&format!("{}\t1\t22\t0.0\t0.0\t0.0\t50.0\t1\n", id));
    }
    for id in (transmitted..total).step_by(7) {
        out.push_str(&format!("{}\t2\t22\t0.05\t3.0\t1.0\t50.0\t1\n", id));
    }
    fs::write(path, out).unwrap();
}

fn sweep_fixture(dir: &Path) {
    fs::create_dir_all(dir.join("events")).unwrap();
    let runs = [
        ("water", 1.0, 917u64),
        ("water", 2.0, 842),
        ("water", 4.0, 708),
        ("lead", 1.0, 273),
    ];
    let mut manifest =
        String::from("material\tthickness_cm\tenergy_MeV\texpected_events\tevents_path\n");
    for (material, thickness, transmitted) in runs {
        let rel = format!("events/{}_{}.tsv", material, thickness);
        write_events(&dir.join(&rel), 1000, transmitted);
        manifest.push_str(&format!("{}\t{}\t0.662\t1000\t{}\n", material, thickness, rel));
    }
    fs::write(dir.join("runs.tsv"), manifest).unwrap();
}

#[test]
fn analyze_manifest_writes_outputs() {
    let tmp = TempDir::new().unwrap();
    sweep_fixture(tmp.path());
    let out = tmp.path().join("out");

    let mut cmd = Command::cargo_bin("gamma-atten").unwrap();
    cmd.arg("analyze")
        .arg("--manifest")
        .arg(tmp.path().join("runs.tsv"))
        .arg("--out")
        .arg(&out)
        .args(["--tsv", "--json", "--threads", "2"]);
    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("Runs: 4 (0 degenerate), materials=lead,water"));
    assert!(stdout.contains("Fit water 0.662 MeV"));
    assert!(stdout.contains("Attenuation factor across materials"));

    let records = fs::read_to_string(out.join("attenuation_data.tsv")).unwrap();
    assert_eq!(records.lines().count(), 5);
    assert!(records.contains("water\t1\t1000\t917\t0.917000\t"));

    let fit = fs::read_to_string(out.join("fit_summary.tsv")).unwrap();
    let line = fit.lines().nth(1).unwrap();
    let slope: f64 = line.split('\t').nth(3).unwrap().parse().unwrap();
    assert!((slope - 0.0862).abs() < 0.003);

    assert!(out.join("comparison_water.tsv").exists());
    assert!(out.join("comparison_lead.tsv").exists());
    assert!(out.join("material_comparison.tsv").exists());
    let sweep = fs::read_to_string(out.join("sweep_water_0.662MeV.tsv")).unwrap();
    assert_eq!(sweep.lines().count(), 4);
    assert!(sweep.lines().nth(1).unwrap().starts_with("1\t917\t0.917000\t"));
    assert!(!out.join("sweep_lead_0.662MeV.tsv").exists());
    assert!(stdout.contains("fit lead 0.662 MeV skipped: fit underdetermined"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("report.json")).unwrap()).unwrap();
    assert_eq!(json["runs"].as_array().unwrap().len(), 4);
    assert!(json["comparisons"][0]["calibration"].is_object());
}

#[test]
fn analyze_isolates_broken_runs() {
    let tmp = TempDir::new().unwrap();
    sweep_fixture(tmp.path());
    let mut manifest = fs::read_to_string(tmp.path().join("runs.tsv")).unwrap();
    manifest.push_str("water\t8\t0.662\t1000\tevents/missing.tsv\n");
    manifest.push_str("water\t16\t0.662\t0\tevents/water_1.tsv\n");
    fs::write(tmp.path().join("runs.tsv"), manifest).unwrap();
    let out = tmp.path().join("out");

    let mut cmd = Command::cargo_bin("gamma-atten").unwrap();
    cmd.arg("analyze")
        .arg("--manifest")
        .arg(tmp.path().join("runs.tsv"))
        .arg("--out")
        .arg(&out)
        .arg("--tsv");
    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("Runs: 4 (0 degenerate), materials=lead,water"));
    assert!(stdout.contains("Fit water 0.662 MeV"));
    assert!(stdout.contains("warnings:"));
    assert!(stdout.contains("- run water 8 cm 0.662 MeV skipped:"));
    assert!(stdout.contains("- run water 16 cm 0.662 MeV skipped:"));

    let records = fs::read_to_string(out.join("attenuation_data.tsv")).unwrap();
    assert_eq!(records.lines().count(), 5);
    let fit = fs::read_to_string(out.join("fit_summary.tsv")).unwrap();
    assert!(fit.lines().nth(1).unwrap().starts_with("water\t0.662\t"));
}

#[test]
fn analyze_keeps_records_table_it_reads() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out");
    fs::create_dir_all(&out).unwrap();
    let table = "# hand-curated\n\
                 material\tthicknessCm\ttotalEvents\ttransmittedEvents\ttransmissionRatio\tattenuationCoeffLinear\n\
                 water\t1\t1000\t917\t0.917\t0.0866\n\
                 water\t2\t1000\t842\t0.842\t0.0860\n";
    fs::write(out.join("attenuation_data.tsv"), table).unwrap();

    let mut cmd = Command::cargo_bin("gamma-atten").unwrap();
    cmd.arg("analyze")
        .arg("--records")
        .arg(out.join(".").join("attenuation_data.tsv"))
        .arg("--out")
        .arg(tmp.path().join("out").join("..").join("out"))
        .arg("--tsv");
    cmd.assert().success();

    assert_eq!(fs::read_to_string(out.join("attenuation_data.tsv")).unwrap(), table);
    assert!(out.join("fit_summary.tsv").exists());
}

#[test]
fn analyze_records_refits_table() {
    let tmp = TempDir::new().unwrap();
    let records = tmp.path().join("attenuation_data.tsv");
    fs::write(
        &records,
        "material\tthicknessCm\ttotalEvents\ttransmittedEvents\ttransmissionRatio\tattenuationCoeffLinear\n\
         water\t1\t1000\t917\t0.917\t0.0866\n\
         water\t2\t1000\t842\t0.842\t0.0860\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("gamma-atten").unwrap();
    cmd.arg("fit").arg("--records").arg(&records).args(["--fit-model", "linear"]);
    cmd.assert().success();

    let mut cmd = Command::cargo_bin("gamma-atten").unwrap();
    cmd.arg("fit").arg("--records").arg(&records);
    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("Fit water: mu="));
}

#[test]
fn run_command_prints_record() {
    let tmp = TempDir::new().unwrap();
    let events = tmp.path().join("events.tsv");
    write_events(&events, 100, 60);

    let mut cmd = Command::cargo_bin("gamma-atten").unwrap();
    cmd.arg("run")
        .arg("--events")
        .arg(&events)
        .args(["--material", "water", "--thickness", "5", "--energy", "0.662"])
        .args(["--events-total", "100"]);
    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.starts_with("material\tthicknessCm"));
    assert!(stdout.contains("water\t5\t100\t60\t0.600000\t"));
}

#[test]
fn run_command_rejects_short_run() {
    let tmp = TempDir::new().unwrap();
    let events = tmp.path().join("events.tsv");
    write_events(&events, 100, 60);

    let mut cmd = Command::cargo_bin("gamma-atten").unwrap();
    cmd.arg("run")
        .arg("--events")
        .arg(&events)
        .args(["--material", "water", "--thickness", "5", "--events-total", "50"]);
    cmd.assert().failure();
}

#[test]
fn reference_show_interpolates() {
    let mut cmd = Command::cargo_bin("gamma-atten").unwrap();
    cmd.args(["reference", "show", "--material", "water", "--energy", "0.662"]);
    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("water\t0.662\t8.567026e-2"));
}

#[test]
fn materials_lists_catalog() {
    let mut cmd = Command::cargo_bin("gamma-atten").unwrap();
    cmd.arg("materials");
    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("lead\tLead\t11.35"));
    assert!(stdout.contains("water\tWater (H2O)\t1"));
}
