//! Import round trips against an in-memory store: replace-not-append,
//! rollback on failure, and the dual-point bumper angle trigger.

use std::cell::RefCell;

use audiopatch_core::{ArrayConfiguration, Catalog, ParsedArray};
use audiopatch_parsing::parse_text;
use audiopatch_store::{
    BumperAngle, PredictionStore, RecordBuilder, StoreError, UnspecifiedBumperAngle,
};

const REPORT: &str = "\
Version: 3.6.2
Date: 2024/03/15
File name: Arena Main v4.xmlp

1. Group: Mains
1.1. Source: K2_Sym_Left
Configuration: Vertical flown
Bumper: K2-BUMP
# motors: 2
Front motor load: 1300.2 lb
Rear motor load: 1180.3 lb
Bottom elevation: 24.06
#1 K2 -1.0 30.00 29.02
#2 K2 2.5 -3.5 29.02 28.04
#3 K2 5 -8.5 28.04 27.06
1.2. Source: K2_Sym_Right
Configuration: Vertical flown
Bumper: K2-BUMP
# motors: 1
#1 K2 -1.0 30.00 29.02

2. Group: Subs
2.1. Source: KS28
Configuration: Vertical / Ground
#1 KS28 LOW 0 1.06 0.00
#2 KS28 LOW 0 0 2.01 1.06
";

const SHORT_REPORT: &str = "\
Version: 3.7
1. Group: Mains
1.1. Source: KARA_C
#1 KARA II 0 -2.0 24.00 23.02 55/35
";

/// Records the source name of every array it is asked about.
#[derive(Default)]
struct Recording {
    calls: RefCell<Vec<String>>,
}

impl BumperAngle for Recording {
    fn bumper_angle(&self, array: &ParsedArray) -> Result<Option<f64>, String> {
        self.calls.borrow_mut().push(array.source_name.clone());
        Ok(Some(1.5))
    }
}

struct Failing;

impl BumperAngle for Failing {
    fn bumper_angle(&self, _array: &ParsedArray) -> Result<Option<f64>, String> {
        Err("pickup geometry unavailable".to_string())
    }
}

fn snapshot(store: &PredictionStore, id: i64) -> Vec<(String, String, Vec<(u32, String, f64)>)> {
    store
        .list_arrays(id)
        .unwrap()
        .into_iter()
        .map(|a| {
            let cabinets = a
                .cabinets
                .iter()
                .map(|c| (c.position_number, c.speaker_model.clone(), c.angle_to_next))
                .collect();
            (a.array.source_name, a.array.bumper_type, cabinets)
        })
        .collect()
}

#[test]
fn test_reimport_replaces_instead_of_appending() {
    let store = PredictionStore::open_in_memory().unwrap();
    let catalog = Catalog::default();
    let builder = RecordBuilder::new(&catalog, &UnspecifiedBumperAngle);
    let id = store.create_prediction("Arena", None).unwrap();
    let doc = parse_text(REPORT);

    let first = store.import_document(id, &doc, &builder).unwrap();
    assert_eq!(first.arrays_removed, 0);
    assert_eq!(first.arrays_created, 3);
    assert_eq!(first.cabinets_created, 6);
    let before = snapshot(&store, id);

    let second = store.import_document(id, &doc, &builder).unwrap();
    assert_eq!(second.arrays_removed, 3);
    assert_eq!(snapshot(&store, id), before);

    let summary = store.summary(id).unwrap();
    assert_eq!(summary.array_count, 3);
    assert_eq!(summary.cabinet_count, 6);
}

#[test]
fn test_stored_fields_and_metadata() {
    let store = PredictionStore::open_in_memory().unwrap();
    let catalog = Catalog::default();
    let builder = RecordBuilder::new(&catalog, &UnspecifiedBumperAngle);
    let id = store.create_prediction("Arena", None).unwrap();
    store
        .import_document(id, &parse_text(REPORT), &builder)
        .unwrap();

    let prediction = store.get_prediction(id).unwrap();
    assert_eq!(prediction.version.as_deref(), Some("3.6.2"));
    assert_eq!(prediction.file_name.as_deref(), Some("Arena Main v4.xmlp"));
    assert_eq!(
        prediction.date_generated.map(|d| d.to_string()).as_deref(),
        Some("2024-03-15")
    );
    let raw = prediction.raw_data.unwrap();
    assert_eq!(raw["arrays"].as_array().map(Vec::len), Some(3));

    let arrays = store.list_arrays(id).unwrap();
    let left = &arrays[0].array;
    assert_eq!(left.array_base_name, "K2");
    assert_eq!(left.symmetry_type, "Sym_Left");
    assert_eq!(left.bumper_type, "K2-BUMP");
    assert!(!left.is_single_point);
    assert_eq!(left.total_motor_load(), Some(1300.2 + 1180.3));
    assert_eq!(left.trim_height_display().as_deref(), Some("24' 6\""));
    assert_eq!(left.rigging_display(), "Dual point");

    let subs = &arrays[2].array;
    assert_eq!(subs.group_context, "Subs");
    assert_eq!(subs.configuration, ArrayConfiguration::VerticalGround);
    assert_eq!(subs.bumper_type, "NONE");
    assert!(subs.is_single_point);
    assert_eq!(arrays[2].cabinets[0].speaker_model, "KS28 LOW");
}

#[test]
fn test_user_file_name_survives_import() {
    let store = PredictionStore::open_in_memory().unwrap();
    let catalog = Catalog::default();
    let builder = RecordBuilder::new(&catalog, &UnspecifiedBumperAngle);
    let id = store
        .create_prediction("Arena", Some("arena-final.xmlp"))
        .unwrap();
    store
        .import_document(id, &parse_text(REPORT), &builder)
        .unwrap();
    assert_eq!(
        store.get_prediction(id).unwrap().file_name.as_deref(),
        Some("arena-final.xmlp")
    );
}

#[test]
fn test_bumper_angle_triggered_for_dual_point_only() {
    let store = PredictionStore::open_in_memory().unwrap();
    let catalog = Catalog::default();
    let recording = Recording::default();
    let builder = RecordBuilder::new(&catalog, &recording);
    let id = store.create_prediction("Arena", None).unwrap();
    store
        .import_document(id, &parse_text(REPORT), &builder)
        .unwrap();

    assert_eq!(*recording.calls.borrow(), vec!["K2_Sym_Left".to_string()]);
    let arrays = store.list_arrays(id).unwrap();
    assert_eq!(arrays[0].array.bumper_angle, Some(1.5));
    assert_eq!(arrays[0].array.rigging_display(), "Dual point (1.5°)");
    assert_eq!(arrays[1].array.bumper_angle, None);
    assert_eq!(arrays[2].array.bumper_angle, None);
}

#[test]
fn test_failed_import_rolls_back() {
    let store = PredictionStore::open_in_memory().unwrap();
    let catalog = Catalog::default();
    let id = store.create_prediction("Arena", None).unwrap();

    let ok = RecordBuilder::new(&catalog, &UnspecifiedBumperAngle);
    store
        .import_document(id, &parse_text(SHORT_REPORT), &ok)
        .unwrap();
    let before = snapshot(&store, id);
    let prediction_before = store.get_prediction(id).unwrap();

    let failing = RecordBuilder::new(&catalog, &Failing);
    let result = store.import_document(id, &parse_text(REPORT), &failing);
    assert!(matches!(result, Err(StoreError::DerivedField(ref msg)) if msg.contains("K2_Sym_Left")));

    assert_eq!(snapshot(&store, id), before);
    let prediction_after = store.get_prediction(id).unwrap();
    assert_eq!(prediction_after.version.as_deref(), Some("3.7"));
    assert_eq!(prediction_after.raw_data, prediction_before.raw_data);
}

#[test]
fn test_imports_are_scoped_to_one_prediction() {
    let store = PredictionStore::open_in_memory().unwrap();
    let catalog = Catalog::default();
    let builder = RecordBuilder::new(&catalog, &UnspecifiedBumperAngle);
    let a = store.create_prediction("A", None).unwrap();
    let b = store.create_prediction("B", None).unwrap();

    store.import_document(a, &parse_text(REPORT), &builder).unwrap();
    store
        .import_document(b, &parse_text(SHORT_REPORT), &builder)
        .unwrap();
    store.import_document(a, &parse_text(REPORT), &builder).unwrap();

    assert_eq!(store.summary(a).unwrap().array_count, 3);
    let b_arrays = store.list_arrays(b).unwrap();
    assert_eq!(b_arrays.len(), 1);
    assert_eq!(b_arrays[0].cabinets[0].speaker_model, "KARA II");
}
