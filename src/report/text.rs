use std::fmt::Write;

use crate::report::SummaryData;

pub fn render_report_text(data: &SummaryData) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {} ({})", data.tool, data.version, data.command);
    let _ = writeln!(out);

    let _ = writeln!(out, "Input");
    let _ = writeln!(out, "  table: {}", data.input.table);
    let _ = writeln!(
        out,
        "  samples: {}  taxa: {} raw, {} excluded, {} merged, {} retained",
        data.input.n_samples,
        data.input.n_taxa_raw,
        data.input.n_taxa_excluded,
        data.input.n_taxa_merged,
        data.input.n_taxa_retained
    );
    let _ = writeln!(
        out,
        "  kind: {}{}",
        data.input.table_kind,
        if data.input.converted_to_relative {
            " (converted to relative frequency)"
        } else {
            ""
        }
    );
    if !data.input.zero_mass_samples.is_empty() {
        let _ = writeln!(
            out,
            "  samples without retained mass: {}",
            data.input.zero_mass_samples.join(", ")
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Signature");
    for (label, side) in [
        ("healthy", &data.signature.healthy),
        ("non-healthy", &data.signature.non_healthy),
    ] {
        let present = side
            .present_in_table
            .map(|n| format!(", {n} present in table"))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "  {label}: {} species ({}){present}",
            side.size, side.source
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Calibration ({})", data.calibration.source);
    let _ = writeln!(out, "  MH' = {}", data.calibration.mh_prime);
    let _ = writeln!(out, "  MN' = {}", data.calibration.mn_prime);

    if let Some(fit) = &data.fit {
        let _ = writeln!(out);
        let _ = writeln!(out, "Fit");
        let _ = writeln!(
            out,
            "  cohorts: {} healthy, {} non-healthy",
            fit.n_healthy_samples, fit.n_non_healthy_samples
        );
        let _ = writeln!(
            out,
            "  theta_fold={} theta_diff={}",
            data.params.theta_fold, data.params.theta_diff
        );
    }

    if let Some(stats) = &data.gmhi {
        let _ = writeln!(out);
        let _ = writeln!(out, "GMHI");
        let _ = writeln!(
            out,
            "  min {:.4}  p10 {:.4}  median {:.4}  p90 {:.4}  max {:.4}",
            stats.min, stats.p10, stats.median, stats.p90, stats.max
        );
        let _ = writeln!(
            out,
            "  samples with GMHI > 0: {:.1}%",
            stats.positive_fraction * 100.0
        );
    }
    out
}
