use std::io::Write;

use audiopatch_core::{ParsedArray, ParsedDocument};
use audiopatch_store::{
    ArrayWithCabinets, ImportOutcome, PredictionRecord, PredictionSummary, cabinet_summary,
};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn heading(w: &mut dyn Write, text: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", text.bold())
    } else {
        writeln!(w, "{}", text)
    }
}

/// Print the header block of a dry-run parse.
pub fn print_dry_run_header(
    w: &mut dyn Write,
    file_name: &str,
    doc: &ParsedDocument,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(
            w,
            "{} {} ({} arrays, {} cabinets)",
            "DRY RUN:".bold().cyan(),
            file_name.bold(),
            doc.arrays.len(),
            doc.cabinet_count()
        )?;
    } else {
        writeln!(
            w,
            "DRY RUN: {} ({} arrays, {} cabinets)",
            file_name,
            doc.arrays.len(),
            doc.cabinet_count()
        )?;
    }
    let meta = &doc.metadata;
    writeln!(w, "  Version:   {}", opt(meta.format_version.as_deref()))?;
    writeln!(w, "  Date:      {}", opt(meta.generated_date))?;
    writeln!(w, "  File name: {}", opt(meta.source_file_name.as_deref()))?;
    writeln!(w, "  Units:     {} / {}", meta.distance_unit, meta.weight_unit)?;
    writeln!(w)?;
    Ok(())
}

/// Print one parsed (not yet stored) array.
pub fn print_parsed_array(
    w: &mut dyn Write,
    index: usize,
    array: &ParsedArray,
    color: ColorMode,
) -> std::io::Result<()> {
    let title = format!("[{}] {} ({})", index + 1, array.source_name, array.group_context);
    heading(w, &title, color)?;
    writeln!(
        w,
        "  Configuration: {}  Bumper: {}  Motors: {}",
        opt(array.configuration_text.as_deref()),
        opt(array.bumper_text.as_deref()),
        array.num_motors
    )?;
    if let Some(p) = array.position {
        writeln!(w, "  Position: {}; {}; {}", p.x, p.y, p.z)?;
    }
    if !array.angles.is_empty() {
        writeln!(
            w,
            "  Site: {}  Azimuth: {}  Top: {}  Bottom: {}",
            opt(array.angles.site),
            opt(array.angles.azimuth),
            opt(array.angles.top_site),
            opt(array.angles.bottom_site)
        )?;
    }
    if array.cabinets.is_empty() {
        if color.enabled() {
            writeln!(w, "  {}", "(no cabinet rows matched)".dimmed())?;
        } else {
            writeln!(w, "  (no cabinet rows matched)")?;
        }
    }
    for cab in &array.cabinets {
        writeln!(
            w,
            "  #{:<3} {:<12} angle {:>6}  site {:>7}  z {} → {}{}",
            cab.position,
            cab.model,
            cab.angle_to_next,
            cab.site_angle,
            cab.top_z,
            cab.bottom_z,
            if cab.panflex_setting.is_empty() {
                String::new()
            } else {
                format!("  [{}]", cab.panflex_setting)
            }
        )?;
    }
    writeln!(w)?;
    Ok(())
}

pub fn print_import_outcome(
    w: &mut dyn Write,
    outcome: &ImportOutcome,
    color: ColorMode,
) -> std::io::Result<()> {
    let msg = format!(
        "Imported {} arrays and {} cabinets into prediction {} (replaced {} arrays)",
        outcome.arrays_created,
        outcome.cabinets_created,
        outcome.prediction_id,
        outcome.arrays_removed
    );
    if color.enabled() {
        writeln!(w, "{}", msg.green())
    } else {
        writeln!(w, "{}", msg)
    }
}

pub fn print_prediction_line(
    w: &mut dyn Write,
    prediction: &PredictionRecord,
    summary: &PredictionSummary,
    color: ColorMode,
) -> std::io::Result<()> {
    let id = format!("{:>4}", prediction.id);
    let id = if color.enabled() {
        id.cyan().to_string()
    } else {
        id
    };
    writeln!(
        w,
        "{}  {:<24} {:<28} v{:<8} {:>3} arrays {:>4} cabinets",
        id,
        prediction.name,
        opt(prediction.file_name.as_deref()),
        opt(prediction.version.as_deref()),
        summary.array_count,
        summary.cabinet_count
    )
}

/// Print a stored prediction with every array and its derived fields.
pub fn print_prediction(
    w: &mut dyn Write,
    prediction: &PredictionRecord,
    summary: &PredictionSummary,
    arrays: &[ArrayWithCabinets],
    color: ColorMode,
) -> std::io::Result<()> {
    heading(w, &format!("Prediction {}: {}", prediction.id, prediction.name), color)?;
    writeln!(w, "  File name: {}", opt(prediction.file_name.as_deref()))?;
    writeln!(w, "  Version:   {}", opt(prediction.version.as_deref()))?;
    writeln!(w, "  Generated: {}", opt(prediction.date_generated))?;
    writeln!(w, "  Updated:   {}", prediction.updated_at)?;
    writeln!(
        w,
        "  {} arrays, {} cabinets",
        summary.array_count, summary.cabinet_count
    )?;
    writeln!(w)?;

    for entry in arrays {
        let a = &entry.array;
        heading(w, &format!("{} ({})", a.source_name, a.group_context), color)?;
        writeln!(
            w,
            "  {}  Bumper: {}  Rigging: {}",
            a.configuration.label(),
            a.bumper_type,
            a.rigging_display()
        )?;
        writeln!(
            w,
            "  Weight: {} lb  Motor load: {} lb  Bottom trim: {}",
            opt(a.total_weight_lb),
            opt(a.total_motor_load()),
            opt(a.trim_height_display())
        )?;
        if !a.mbar_hole.as_str().is_empty() {
            writeln!(w, "  MBar hole: {}", a.mbar_hole.as_str())?;
        }
        for line in cabinet_summary(&entry.cabinets) {
            writeln!(w, "    {}", line)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiopatch_parsing::parse_text;

    #[test]
    fn test_dry_run_output_without_color() {
        let doc = parse_text("Version: 3.6\n1. Group: Mains\n1.1. Source: K2_L\n#1 K2 -1 30 29\n");
        let mut buf = Vec::new();
        print_dry_run_header(&mut buf, "show.txt", &doc, ColorMode(false)).unwrap();
        print_parsed_array(&mut buf, 0, &doc.arrays[0], ColorMode(false)).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.starts_with("DRY RUN: show.txt (1 arrays, 1 cabinets)"));
        assert!(out.contains("Version:   3.6"));
        assert!(out.contains("Date:      -"));
        assert!(out.contains("[1] K2_L (Mains)"));
        assert!(out.contains("#1   K2"));
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn test_empty_cabinet_table_note() {
        let doc = parse_text("1.1. Source: SB18\n");
        let mut buf = Vec::new();
        print_parsed_array(&mut buf, 0, &doc.arrays[0], ColorMode(false)).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("[1] SB18 (UNKNOWN)"));
        assert!(out.contains("(no cabinet rows matched)"));
    }
}
