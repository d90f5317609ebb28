use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Glucose readings found in a lab report. Units are whatever the report
/// uses (mg/dL for FBS/PPBS, % for HbA1c in practice); nothing is converted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SugarValues {
    pub fasting: Option<f64>,
    pub post_prandial: Option<f64>,
    pub hba1c: Option<f64>,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
}

/// Tried in order; the first pattern that matches anywhere wins.
static FASTING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)fasting[\s\-]*(?:blood[\s\-]*sugar|glucose|bs|fbs|sugar)[\s\-]*:?[\s\-]*(\d+(?:\.\d+)?)",
        r"(?i)(?:fbs|f\.?b\.?s\.?)[\s\-]*(?:level)?[\s\-]*:?[\s\-]*(\d+(?:\.\d+)?)",
        r"(?i)(?:fasting[\s\-]*sugar|glucose)[\s\-]*(?:level)?[\s\-]*:?[\s\-]*(\d+(?:\.\d+)?)",
    ])
});

static POST_PRANDIAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)post[\s\-]*(?:prandial|meal)[\s\-]*(?:blood[\s\-]*sugar|glucose|bs|ppbs)[\s\-]*:?[\s\-]*(\d+(?:\.\d+)?)",
        r"(?i)(?:ppbs|p\.?p\.?b\.?s\.?)[\s\-]*(?:level)?[\s\-]*:?[\s\-]*(\d+(?:\.\d+)?)",
        r"(?i)(?:post[\s\-]*(?:prandial|meal)[\s\-]*sugar|glucose)[\s\-]*(?:level)?[\s\-]*:?[\s\-]*(\d+(?:\.\d+)?)",
    ])
});

static HBA1C_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)(?:hba1c|hba1|a1c|glycosylated[\s\-]*hemoglobin|glycated[\s\-]*hemoglobin)[\s\-]*:?[\s\-]*(\d+(?:\.\d+)?)",
        r"(?i)(?:hba1c|hba1|a1c)[\s\-]*(?:level)?[\s\-]*:?[\s\-]*(\d+(?:\.\d+)?)",
    ])
});

fn first_value(patterns: &[Regex], text: &str) -> Option<f64> {
    patterns.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
    })
}

pub fn extract_values(text: &str) -> SugarValues {
    SugarValues {
        fasting: first_value(&FASTING_PATTERNS, text),
        post_prandial: first_value(&POST_PRANDIAL_PATTERNS, text),
        hba1c: first_value(&HBA1C_PATTERNS, text),
    }
}
