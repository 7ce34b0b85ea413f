use std::collections::BTreeSet;

use super::TextFragment;

/// More distinct families than this reads as inconsistent (body + headings).
const MAX_FAMILIES: usize = 2;
/// More distinct sizes than this reads as inconsistent.
const MAX_SIZES: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct FontConsistencyReport {
    pub families: Vec<String>,
    pub sizes: Vec<f32>,
    pub consistent: bool,
    pub feedback: String,
}

/// Summarizes how many font families and sizes a document uses.
///
/// Style variants fold into their family (`Calibri-Bold` and `Calibri,Italic`
/// are both `Calibri`) and sizes are rounded to the nearest half point.
pub fn analyze_font_consistency(fragments: &[TextFragment]) -> FontConsistencyReport {
    let families: BTreeSet<String> = fragments
        .iter()
        .filter_map(|f| f.font.as_deref())
        .map(font_family)
        .filter(|f| !f.is_empty())
        .collect();

    // Half-point buckets, kept as integers so they can live in a set
    let sizes: BTreeSet<u32> = fragments
        .iter()
        .filter_map(|f| f.size)
        .filter(|s| s.is_finite() && *s > 0.0)
        .map(|s| (s * 2.0).round() as u32)
        .collect();

    let families: Vec<String> = families.into_iter().collect();
    let sizes: Vec<f32> = sizes.into_iter().map(|s| s as f32 / 2.0).collect();

    if families.is_empty() && sizes.is_empty() {
        return FontConsistencyReport {
            families,
            sizes,
            consistent: true,
            feedback: "No styled text could be extracted, so font consistency was not checked."
                .to_string(),
        };
    }

    let mut issues = Vec::new();
    if families.len() > MAX_FAMILIES {
        issues.push(format!(
            "uses {} font families ({}); stick to one or two",
            families.len(),
            families.join(", ")
        ));
    }
    if sizes.len() > MAX_SIZES {
        issues.push(format!(
            "uses {} different font sizes ({}); limit sizes to name, headings and body",
            sizes.len(),
            format_sizes(&sizes)
        ));
    }

    let consistent = issues.is_empty();
    let feedback = if consistent {
        format!(
            "Fonts are consistent: {} ({}) at {}.",
            plural(families.len(), "family", "families"),
            families.join(", "),
            plural(sizes.len(), "size", "sizes")
        )
    } else {
        format!("The resume {}.", issues.join(" and "))
    };

    FontConsistencyReport {
        families,
        sizes,
        consistent,
        feedback,
    }
}

/// `ABCDEF+Calibri-Bold` → `Calibri`.
fn font_family(name: &str) -> String {
    let name = match name.split_once('+') {
        Some((prefix, rest)) if prefix.len() == 6 && prefix.chars().all(|c| c.is_ascii_uppercase()) => {
            rest
        }
        _ => name,
    };
    name.split(['-', ','])
        .next()
        .unwrap_or(name)
        .trim()
        .to_string()
}

fn format_sizes(sizes: &[f32]) -> String {
    sizes
        .iter()
        .map(|s| format!("{s}pt"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("1 {one}")
    } else {
        format!("{n} {many}")
    }
}
