use std::io::Write;

use imaging_contacts::data::loader::{load_coordinates, load_matrix, load_metadata};
use imaging_contacts::{
    annotate_contacts, read_contacts, read_distances, ContactsError, CoordinateTable,
    ExperimentConfig, ExperimentState, ImagingExperiment, Metadata, MetadataValue, Segment,
    DEFAULT_THRESHOLD,
};
use tempfile::{tempdir, NamedTempFile};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn metadata(id: &str) -> Metadata {
    let mut m = Metadata::new();
    m.insert("id".to_string(), MetadataValue::from(id));
    m.insert("replicate".to_string(), MetadataValue::Integer(2));
    m
}

fn three_marks() -> Vec<Vec<f64>> {
    vec![
        vec![0.0, 120.0, f64::NAN],
        vec![120.0, 0.0, 310.5],
        vec![f64::NAN, 310.5, 0.0],
    ]
}

fn segments(one_based: bool) -> CoordinateTable {
    CoordinateTable::from_segments(
        vec![
            Segment::new("chr3", 5000, 8000),
            Segment::new("chr3", 8000, 11000),
            Segment::new("chr3", 11000, 14000),
        ],
        one_based,
    )
}

#[test]
fn contacts_written_and_read_back() {
    init_logging();
    let dir = tempdir().unwrap();
    let exp = ImagingExperiment::new(&three_marks(), &metadata("exp1"));

    let contacts = exp.convert_to_contacts(DEFAULT_THRESHOLD);
    assert_eq!(contacts.pairs(), &[(0, 0), (0, 1), (1, 0), (1, 1), (2, 2)]);

    let table = annotate_contacts(&contacts, &segments(true), true).unwrap();
    let template = dir.path().join("contacts_{id}_r{replicate}.tsv");
    let path = exp
        .save_contacts(&table, template.to_str().unwrap())
        .unwrap();
    assert_eq!(path, dir.path().join("contacts_exp1_r2.tsv"));

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("chrom1\tstart1\tend1\tchrom2\tstart2\tend2\tcount")
    );
    assert_eq!(lines.next(), Some("chr3\t5000\t8000\tchr3\t5000\t8000\t1"));

    assert_eq!(read_contacts(&path).unwrap(), table);
}

#[test]
fn distances_round_trip_with_nan() {
    init_logging();
    let dir = tempdir().unwrap();
    let exp = ImagingExperiment::new(&three_marks(), &metadata("exp1"));

    let table = exp.annotate_distances(&segments(false), false).unwrap();
    assert_eq!(table.len(), 6);
    let path = exp
        .save_distances(&table, dir.path().join("d_{id}.tsv").to_str().unwrap())
        .unwrap();

    let back = read_distances(&path).unwrap();
    assert_eq!(back.len(), table.len());
    for (a, b) in back.iter().zip(table.iter()) {
        assert_eq!(
            (&a.chrom1, a.start1, a.end1, &a.chrom2, a.start2, a.end2),
            (&b.chrom1, b.start1, b.end1, &b.chrom2, b.start2, b.end2)
        );
        assert!(a.distance == b.distance || (a.distance.is_nan() && b.distance.is_nan()));
    }
    assert!(back.records[2].distance.is_nan());
    assert_eq!(back.records[4].distance, 310.5);
}

#[test]
fn missing_template_key_writes_nothing() {
    let dir = tempdir().unwrap();
    let exp = ImagingExperiment::new(&three_marks(), &metadata("exp1"));
    let table = exp.annotate_distances(&segments(true), true).unwrap();

    let template = dir.path().join("out_{missing}.tsv");
    match exp.save_distances(&table, template.to_str().unwrap()) {
        Err(ContactsError::MissingTemplateKey { key }) => assert_eq!(key, "missing"),
        other => panic!("expected MissingTemplateKey, got {other:?}"),
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn missing_coordinate_produces_no_file() {
    let dir = tempdir().unwrap();
    let mut state = ExperimentState::new(ImagingExperiment::new(&three_marks(), &metadata("x")));

    let mut short = CoordinateTable::new();
    short.insert(1, Segment::new("chr3", 5000, 8000));
    short.insert(2, Segment::new("chr3", 8000, 11000));

    let config = ExperimentConfig {
        contacts_template: Some(dir.path().join("c_{id}.tsv").to_string_lossy().into_owned()),
        ..ExperimentConfig::default()
    };
    match state.run(&config, &short) {
        Err(ContactsError::CoordinateNotFound { index }) => assert_eq!(index, 3),
        other => panic!("expected CoordinateNotFound, got {other:?}"),
    }
    assert!(!dir.path().join("c_x.tsv").exists());
}

#[test]
fn save_overwrites_existing_file() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("contacts_exp1.tsv");
    std::fs::write(&target, "stale contents that are longer than the new table\n".repeat(50))
        .unwrap();

    let exp = ImagingExperiment::new(&[vec![0.0]], &metadata("exp1"));
    let table = annotate_contacts(&exp.convert_to_contacts(150.0), &segments(false), false).unwrap();
    exp.save_contacts(&table, dir.path().join("contacts_{id}.tsv").to_str().unwrap())
        .unwrap();

    let text = std::fs::read_to_string(&target).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(!text.contains("stale"));
}

#[test]
fn run_from_files_with_config() {
    init_logging();
    let dir = tempdir().unwrap();

    let mut matrix = NamedTempFile::with_suffix(".json").unwrap();
    writeln!(matrix, "[[0, 90, 200], [90, 0, 140], [200, 140, 0]]").unwrap();
    matrix.flush().unwrap();

    let mut coords = NamedTempFile::with_suffix(".tsv").unwrap();
    writeln!(coords, "chrom\tstart\tend").unwrap();
    writeln!(coords, "chr7\t0\t100").unwrap();
    writeln!(coords, "chr7\t100\t200").unwrap();
    writeln!(coords, "chr7\t200\t300").unwrap();
    coords.flush().unwrap();

    let mut meta = NamedTempFile::with_suffix(".json").unwrap();
    writeln!(meta, r#"{{"experiment_id": "e42", "condition": "ctrl"}}"#).unwrap();
    meta.flush().unwrap();

    let config = ExperimentConfig::from_json_str(&format!(
        r#"{{"threshold": 100, "contacts_template": "{0}/c_{{experiment_id}}.tsv",
            "distances_template": "{0}/d_{{experiment_id}}_{{condition}}.tsv"}}"#,
        dir.path().display()
    ))
    .unwrap();

    let exp = ImagingExperiment::from_parts(
        load_matrix(matrix.path()).unwrap(),
        load_metadata(meta.path()).unwrap(),
    );
    let table = load_coordinates(coords.path(), config.one_based).unwrap();
    let mut state = ExperimentState::new(exp);
    let outputs = state.run(&config, &table).unwrap();

    let contacts = read_contacts(outputs.contacts.as_deref().unwrap()).unwrap();
    // diagonal plus (0,1) and (1,0)
    assert_eq!(contacts.len(), 5);
    assert!(contacts.iter().all(|r| r.count == 1 && r.chrom1 == "chr7"));

    let distances_path = outputs.distances.unwrap();
    assert_eq!(distances_path, dir.path().join("d_e42_ctrl.tsv"));
    assert_eq!(read_distances(&distances_path).unwrap().len(), 6);
}
