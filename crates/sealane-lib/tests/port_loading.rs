//! UN/LOCODE CSV loading against on-disk fixtures.

use std::io::Write;
use std::path::PathBuf;

use sealane_lib::{load_seaports, VALID_STATUSES};
use tempfile::TempDir;

fn write_csv(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn loads_only_seaports_with_valid_status_and_coordinates() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "part1.csv",
        concat!(
            ",NL,RTM,Rotterdam,Rotterdam,ZH,1--3----,AI,0601,,5155N 00430E\n",
            ",DE,BER,Berlin,Berlin,BE,--3-----,AI,0601,,5231N 01323E\n",
            ",CN,SHA,Shanghai,Shanghai,SH,12345---,AF,0601,,3114N 12129E\n",
            ",XX,BAD,Badstatus,Badstatus,,1-------,ZZ,0601,,0000N 00000E\n",
            ",XX,NOC,Nocoords,Nocoords,,1-------,AI,0601,,\n",
        ),
    );

    let ports = load_seaports(&[path]);
    let codes: Vec<&str> = ports.iter().map(|p| p.unlocode.as_str()).collect();
    assert_eq!(codes, vec!["NLRTM", "CNSHA"]);

    for port in &ports {
        assert!(port.function.starts_with('1'));
        assert!(VALID_STATUSES.contains(&port.status.as_str()));
    }
}

#[test]
fn missing_file_is_skipped_not_fatal() {
    let dir = TempDir::new().unwrap();
    let good = write_csv(
        &dir,
        "part1.csv",
        ",NL,RTM,Rotterdam,Rotterdam,ZH,1-------,AI,0601,,5155N 00430E\n",
    );
    let missing = dir.path().join("does-not-exist.csv");

    let ports = load_seaports(&[missing, good]);
    assert_eq!(ports.len(), 1);
}

#[test]
fn empty_file_yields_empty_list() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "empty.csv", "");
    assert!(load_seaports(&[path]).is_empty());
}

#[test]
fn duplicate_unlocode_across_files_keeps_first_seen() {
    let dir = TempDir::new().unwrap();
    let first = write_csv(
        &dir,
        "part1.csv",
        ",NL,RTM,Rotterdam,Rotterdam,ZH,1-------,AI,0601,,5155N 00430E\n",
    );
    let second = write_csv(
        &dir,
        "part2.csv",
        concat!(
            ",NL,RTM,Rotterdam Redux,Rotterdam Redux,ZH,1-------,AI,0601,,5100N 00400E\n",
            ",SG,SIN,Singapore,Singapore,,1-------,AI,0601,,0117N 10351E\n",
        ),
    );

    let ports = load_seaports(&[first, second]);
    assert_eq!(ports.len(), 2);
    assert_eq!(ports[0].unlocode, "NLRTM");
    assert_eq!(ports[0].name, "Rotterdam");
    assert_eq!(ports[1].unlocode, "SGSIN");
}

#[test]
fn country_header_rows_and_short_lines_are_ignored() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "part1.csv",
        concat!(
            ",NL,,.NETHERLANDS\n",
            "garbage line\n",
            ",NL,RTM,Rotterdam,Rotterdam,ZH,1-------,AI,0601,,5155N 00430E\n",
        ),
    );

    let ports = load_seaports(&[path]);
    assert_eq!(ports.len(), 1);
    assert_eq!(ports[0].unlocode, "NLRTM");
}
