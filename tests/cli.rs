//! The binary's default file resolution, run from a scratch working directory.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const POSTCODES_CSV: &str = "\
id,postcode,locality,state,long,lat,dc,type
1,3000,MELBOURNE,VIC,144.96,-37.81,MELBOURNE,Delivery Area
2,3004,MELBOURNE,VIC,144.97,-37.84,MELBOURNE,Delivery Area
";

const SHAPES: &str = r#"{"type":"FeatureCollection","features":[
{"type":"Feature","properties":{"POA_CODE16":"3000"},
 "geometry":{"type":"Polygon","coordinates":[[[144.95,-37.82],[144.97,-37.82],[144.97,-37.80],[144.95,-37.80],[144.95,-37.82]]]}},
{"type":"Feature","properties":{"POA_CODE16":"3004"},
 "geometry":{"type":"Polygon","coordinates":[[[144.96,-37.85],[144.98,-37.85],[144.98,-37.83],[144.96,-37.83],[144.96,-37.85]]]}}
]}"#;

fn postdecode(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_postdecode"))
        .args(args)
        .current_dir(dir)
        .env("HOME", dir)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn prepare_in(dir: &Path) {
    fs::write(dir.join("raw.csv"), POSTCODES_CSV).unwrap();
    fs::write(dir.join("poa.geojson"), SHAPES).unwrap();
    let out = postdecode(dir, &["prepare", "--postcodes", "raw.csv", "--shapes", "poa.geojson"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
}

#[test]
fn locate_finds_index_written_by_prepare() {
    let dir = tempfile::tempdir().unwrap();
    prepare_in(dir.path());

    let out = postdecode(dir.path(), &["locate", "3000"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(stdout(&out).starts_with("3000 -> 144.9"));

    let out = postdecode(dir.path(), &["locate", "3999"]);
    assert!(!out.status.success());
}

#[test]
fn query_reads_prepared_dataset_by_default() {
    let dir = tempfile::tempdir().unwrap();
    prepare_in(dir.path());

    let out = postdecode(dir.path(), &["query", "3000"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let text = stdout(&out);
    assert!(text.contains("Localities: MELBOURNE"));
    assert!(text.contains("Matches: 1"));
}

#[test]
fn legacy_variant_reads_locality_csv_by_default() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("postcodes.csv"),
        "postcode,locality,state,long,lat\n3000,MELBOURNE,VIC,144.96,-37.81\n",
    )
    .unwrap();

    let out = postdecode(dir.path(), &["--variant", "legacy", "query", "3000"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(stdout(&out).contains("Matches: 1"));
}

#[test]
fn legacy_variant_rejects_normalized_json() {
    let dir = tempfile::tempdir().unwrap();
    prepare_in(dir.path());

    let args = ["--variant", "legacy", "query", "3000", "--data", "postdecode.json"];
    let out = postdecode(dir.path(), &args);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("legacy CSV lacks"));
}
