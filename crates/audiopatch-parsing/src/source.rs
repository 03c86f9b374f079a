use audiopatch_core::{Angles, ParsedArray, PickupPositions, Weight};

use crate::cabinets::parse_cabinet_table_with_config;
use crate::config::ParsingConfig;
use crate::fields;
use crate::segment::SourceSpan;

/// Parse one source span into a [`ParsedArray`].
///
/// Labels missing from the span leave their fields absent; `num_motors`
/// falls back to 1. Classification against the hardware catalog is left to
/// the record builder.
pub fn parse_source(span: &SourceSpan<'_>) -> ParsedArray {
    parse_source_with_config(
        &span.source_name,
        span.text,
        &span.group_context,
        &ParsingConfig::default(),
    )
}

/// Config-aware version of [`parse_source`].
pub(crate) fn parse_source_with_config(
    source_name: &str,
    text: &str,
    group_context: &str,
    config: &ParsingConfig,
) -> ParsedArray {
    let suffixes = config.degree_suffixes();
    let mut array = ParsedArray::new(source_name, group_context);

    array.configuration_text = fields::configuration(text);
    array.bumper_text = fields::bumper(text);
    array.mbar_hole = array
        .bumper_text
        .as_deref()
        .map(fields::mbar_hole)
        .unwrap_or_default();
    array.num_motors = fields::motors(text).unwrap_or(1);
    array.position = fields::position(text);
    array.angles = Angles {
        site: fields::site(text, suffixes),
        azimuth: fields::azimuth(text, suffixes),
        top_site: fields::top_site(text, suffixes),
        bottom_site: fields::bottom_site(text, suffixes),
    };
    array.weight = Weight {
        total: fields::total_weight(text),
        enclosure: fields::enclosure_weight(text),
        front_motor: fields::front_motor_load(text),
        rear_motor: fields::rear_motor_load(text),
    };
    array.bottom_elevation = fields::bottom_elevation(text);
    array.pickup_positions = PickupPositions {
        front: fields::front_pickup(text),
        rear: fields::rear_pickup(text),
    };
    array.cabinets = parse_cabinet_table_with_config(text, config);

    tracing::debug!(
        source = source_name,
        group = group_context,
        motors = array.num_motors,
        cabinets = array.cabinets.len(),
        "parsed source"
    );
    array
}
