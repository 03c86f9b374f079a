//! End-to-end parse of a synthetic multi-group Soundvision report.
//!
//! The text mirrors what page extraction produces for a real report: a header
//! block, an orphan source before the first group, a group with no sources,
//! a directivity-column table and a standard table, and the mis-decoded
//! degree mark on some angles.

use audiopatch_parsing::{
    MbarHole, ParsedDocument, ParsingConfigBuilder, SoundvisionExtractor, parse_text,
};
use chrono::NaiveDate;

const REPORT: &str = "\
Soundvision Report
Version: 3.6.2
Date: 2024/03/15
File name: Arena Main v4.xmlp

0.1. Source: SB18_Floor
Configuration: Vertical / Ground
#1 SB18 0 1.06 0.00

1. Group: Delays

2. Group: Mains
2.1. Source: KARA_Sym_Left
Configuration: Vertical / Flown
Bumper: M-BUMP (hole A)
# motors: 2
Position (X; Y; Z) (ft.in): 18.06; -24.02; 36.00
Site: -3.5Â°
Azimuth: 12.0Â°
Top site: 1.0Â°
Bottom site: -41.5Â°
Total weight (array + bumper): 1820.4 lb
Total enclosure weight: 1650.0 lb
Front motor load: 1102.3 lb
Rear motor load: 718.1 lb
Bottom elevation: 22.04
Front pickup position (X; Y; Z): 3 (18.06; -23.05; 36.00)
Rear pickup position (X; Y; Z): 11 (18.06; -25.01; 36.00)
# Enclosure Angles Site Panflex Top Z Bottom Z
#1 KARA II 0 1.0 36.00 35.01 110/110
#2 KARA II 1 0.0 35.01 34.02 110/110
#3 KARA II 2 -2.0 34.02 33.03 70/70
#4 KARA II -41.5 33.03
2.2. Source: KS28_Sym_Left
Configuration: Vertical flown
Bumper: KS28-BUMP
# Enclosure Angles Site Top Z Bottom Z
#1 KS28 LOW 0.0 48.00 46.10
#2 KS28 LOW 0.0 0.0 46.10 45.08

3. Group: Front Fill
3.1. Source: KIVA
Configuration: Horizontal
Site: 0 deg
#1 KIVA II 0.0 4.00 3.10
";

fn parse() -> ParsedDocument {
    parse_text(REPORT)
}

#[test]
fn test_metadata() {
    let doc = parse();
    assert_eq!(doc.metadata.format_version.as_deref(), Some("3.6.2"));
    assert_eq!(doc.metadata.generated_date, NaiveDate::from_ymd_opt(2024, 3, 15));
    assert_eq!(
        doc.metadata.source_file_name.as_deref(),
        Some("Arena Main v4.xmlp")
    );
    assert_eq!(doc.metadata.distance_unit, "ft.in");
    assert_eq!(doc.metadata.weight_unit, "lb");
}

#[test]
fn test_arrays_in_order_with_groups() {
    let doc = parse();
    let names: Vec<(&str, &str)> = doc
        .arrays
        .iter()
        .map(|a| (a.source_name.as_str(), a.group_context.as_str()))
        .collect();
    assert_eq!(
        names,
        vec![
            ("SB18_Floor", "UNKNOWN"),
            ("KARA_Sym_Left", "Mains"),
            ("KS28_Sym_Left", "Mains"),
            ("KIVA", "Front Fill"),
        ]
    );
}

#[test]
fn test_orphan_span_stops_before_first_group() {
    let doc = parse();
    let orphan = &doc.arrays[0];
    assert_eq!(orphan.configuration_text.as_deref(), Some("Vertical / Ground"));
    assert_eq!(orphan.cabinets.len(), 1);
    assert_eq!(orphan.cabinets[0].model, "SB18");
}

#[test]
fn test_directivity_array() {
    let doc = parse();
    let kara = &doc.arrays[1];
    assert_eq!(kara.array_base_name, "KARA");
    assert_eq!(kara.symmetry_type, "Sym_Left");
    assert_eq!(kara.mbar_hole, MbarHole::A);
    assert!(kara.is_dual_point());
    assert_eq!(kara.angles.site, Some(-3.5));
    assert_eq!(kara.angles.bottom_site, Some(-41.5));
    assert_eq!(kara.weight.total, Some(1820.4));
    assert_eq!(kara.pickup_positions.front, Some(3));
    assert_eq!(kara.pickup_positions.rear, Some(11));

    // the truncated fourth row has no ratio and is dropped
    assert_eq!(kara.cabinets.len(), 3);
    let settings: Vec<&str> = kara
        .cabinets
        .iter()
        .map(|c| c.panflex_setting.as_str())
        .collect();
    assert_eq!(settings, vec!["110/110", "110/110", "70/70"]);
    assert_eq!(kara.cabinets[2].angle_to_next, 2.0);
    assert_eq!(kara.cabinets[2].site_angle, -2.0);
}

#[test]
fn test_standard_array_with_low_models() {
    let doc = parse();
    let subs = &doc.arrays[2];
    assert_eq!(subs.num_motors, 1);
    assert_eq!(subs.mbar_hole, MbarHole::Unset);
    assert_eq!(subs.cabinets.len(), 2);
    assert!(subs.cabinets.iter().all(|c| c.model == "KS28 LOW"));
    assert_eq!(subs.cabinets[0].angle_to_next, 0.0);
    assert_eq!(subs.cabinets[0].top_z, 48.0);
    assert_eq!(subs.cabinets[1].bottom_z, 45.08);
    assert!(subs.cabinets.iter().all(|c| c.panflex_setting.is_empty()));
}

#[test]
fn test_angle_without_degree_mark_is_absent() {
    let doc = parse();
    let kiva = &doc.arrays[3];
    assert_eq!(kiva.angles.site, None);
    assert_eq!(kiva.symmetry_type, "");

    let config = ParsingConfigBuilder::new()
        .add_degree_suffix("deg".to_string())
        .build()
        .unwrap();
    let doc = SoundvisionExtractor::with_config(config).parse_document(REPORT);
    assert_eq!(doc.arrays[3].angles.site, Some(0.0));
}

#[test]
fn test_document_serializes() {
    let doc = parse();
    let json = serde_json::to_value(&doc).unwrap();
    assert_eq!(json["metadata"]["generated_date"], "2024-03-15");
    assert_eq!(json["arrays"][1]["mbar_hole"], "A");
    assert_eq!(json["arrays"][2]["mbar_hole"], "");
    assert_eq!(json["arrays"].as_array().map(Vec::len), Some(4));
}

#[test]
fn test_reparse_is_stable() {
    assert_eq!(parse(), parse());
}
