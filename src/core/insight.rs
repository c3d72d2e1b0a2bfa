use crate::domain::catalog::Catalog;
use crate::domain::model::{AggregationResult, ComparisonResult, VariableId};
use std::fmt::Write;
use std::sync::Arc;

const SAMPLE_LIMIT: usize = 10;

/// Renders aggregation and comparison results with a fixed template.
#[derive(Debug, Clone)]
pub struct InsightSynthesizer {
    catalog: Arc<Catalog>,
}

impl InsightSynthesizer {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn render(&self, result: &AggregationResult) -> String {
        let mut out = String::new();
        self.render_into(&mut out, result);
        out
    }

    pub fn render_comparison(&self, comparison: &ComparisonResult) -> String {
        let mut out = String::new();
        let names: Vec<&str> = comparison.regions.iter().map(|(n, _)| n.as_str()).collect();

        let _ = writeln!(
            out,
            "Comparison of {} ({} unique floats in total)",
            names.join(" vs "),
            comparison.total_float_count
        );

        for (name, result) in &comparison.regions {
            let _ = writeln!(out, "\n== {} ==", name);
            self.render_into(&mut out, result);
        }

        let _ = writeln!(out, "\nKey Differences:");
        if comparison.differences.is_empty() {
            let _ = writeln!(out, "  • No shared variables with data to compare");
        }
        for (variable, diffs) in &comparison.differences {
            let (name, unit) = self.label(*variable);
            for diff in diffs {
                let line = match &diff.higher_region {
                    Some(higher) => format!(
                        "  • {}: {} is higher by {:.2} {} ({} vs {})",
                        name,
                        higher,
                        diff.delta.abs(),
                        unit,
                        diff.other_region,
                        diff.baseline_region
                    ),
                    None => format!(
                        "  • {}: no difference between {} and {}",
                        name, diff.baseline_region, diff.other_region
                    ),
                };
                let _ = writeln!(out, "{}", line);
            }
        }

        out.trim_end().to_string()
    }

    fn render_into(&self, out: &mut String, result: &AggregationResult) {
        let _ = writeln!(
            out,
            "Found {} floats with {} profiles and {} measurements.",
            result.float_count,
            group_thousands(result.profile_count),
            group_thousands(result.measurement_count)
        );

        if result.is_empty() {
            let _ = writeln!(out, "Geographic Coverage: no data");
            let _ = writeln!(out, "Data Period: no data");
            return;
        }

        let _ = writeln!(
            out,
            "Geographic Coverage: {:.1}° latitude × {:.1}° longitude",
            result.lat_extent, result.lon_extent
        );

        match (result.date_start, result.date_end) {
            (Some(start), Some(end)) => {
                let _ = writeln!(
                    out,
                    "Data Period: {} to {}",
                    start.format("%Y-%m-%d"),
                    end.format("%Y-%m-%d")
                );
            }
            _ => {
                let _ = writeln!(out, "Data Period: no data");
            }
        }

        let lines: Vec<String> = result
            .variable_statistics
            .iter()
            .filter(|(_, stat)| stat.has_data())
            .filter_map(|(variable, stat)| {
                let (name, unit) = self.label(*variable);
                Some(format!(
                    "  • {}: {:.2} {} (range: {:.2} {} to {:.2} {})",
                    name, stat.mean?, unit, stat.min?, unit, stat.max?, unit
                ))
            })
            .collect();

        if !lines.is_empty() {
            let _ = writeln!(out, "Oceanographic Data:");
            for line in lines {
                let _ = writeln!(out, "{}", line);
            }
        }

        let ids: Vec<String> = result
            .sample_float_ids
            .iter()
            .take(SAMPLE_LIMIT)
            .map(|id| id.to_string())
            .collect();
        let ellipsis = if result.float_count > ids.len() as u64 {
            "…"
        } else {
            ""
        };
        let _ = writeln!(out, "Sample Floats: {}{}", ids.join(", "), ellipsis);
    }

    fn label(&self, variable: VariableId) -> (String, String) {
        self.catalog
            .variable(variable)
            .map(|info| (info.display_name.clone(), info.unit.clone()))
            .unwrap_or_else(|| (variable.as_str().to_string(), String::new()))
    }
}

/// 12345678 -> "12,345,678"
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
