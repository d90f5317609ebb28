use crate::models::ReportSlot;

/// Returned whenever a report carries no recognizable condition line.
pub const UNKNOWN_CONDITION: &str = "Unknown";

/// Heading the prompt templates ask the model to put the condition under.
pub fn condition_marker(slot: ReportSlot) -> &'static str {
    match slot {
        ReportSlot::Xray => "Disease Expected",
        _ => "Condition Detected",
    }
}

/// First non-blank line after `marker` and its colon, matched
/// case-insensitively, with markdown emphasis stripped.
///
/// Falls back to [`UNKNOWN_CONDITION`] when the marker, the colon or a
/// non-blank line is missing.
pub fn extract_condition(report: &str, marker: &str) -> String {
    // ASCII lowering keeps byte offsets aligned with `report`.
    let lower = report.to_ascii_lowercase();
    let Some(start) = lower.find(&marker.to_ascii_lowercase()) else {
        return UNKNOWN_CONDITION.into();
    };
    let after_marker = start + marker.len();
    let Some(colon) = report[after_marker..].find(':') else {
        return UNKNOWN_CONDITION.into();
    };

    report[after_marker + colon + 1..]
        .lines()
        .map(|line| line.trim().trim_matches('*').trim())
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_CONDITION.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONDITION: &str = "Condition Detected";

    #[test]
    fn plain_marker() {
        assert_eq!(extract_condition("Condition Detected: Tumor\nMore text.", CONDITION), "Tumor");
    }

    #[test]
    fn no_marker_is_unknown() {
        assert_eq!(extract_condition("no marker here", CONDITION), "Unknown");
        assert_eq!(extract_condition("", CONDITION), "Unknown");
    }

    #[test]
    fn marker_is_case_insensitive() {
        assert_eq!(extract_condition("CONDITION DETECTED: Cyst", CONDITION), "Cyst");
        assert_eq!(extract_condition("condition detected : Mass", CONDITION), "Mass");
    }

    #[test]
    fn value_on_following_line() {
        assert_eq!(
            extract_condition("Condition Detected:\n\n   Glioma  \nDetails", CONDITION),
            "Glioma"
        );
    }

    #[test]
    fn markdown_emphasis_is_stripped() {
        assert_eq!(
            extract_condition("**Condition Detected:** Pituitary Tumor\n", CONDITION),
            "Pituitary Tumor"
        );
    }

    #[test]
    fn marker_without_colon_or_value() {
        assert_eq!(extract_condition("Condition Detected - Tumor", CONDITION), "Unknown");
        assert_eq!(extract_condition("Condition Detected:\n  \n", CONDITION), "Unknown");
    }

    #[test]
    fn xray_uses_disease_marker() {
        let marker = condition_marker(ReportSlot::Xray);
        assert_eq!(extract_condition("Disease Expected: Mass\nThe AI...", marker), "Mass");
        assert_eq!(condition_marker(ReportSlot::Ct3d), CONDITION);
        assert_eq!(condition_marker(ReportSlot::Ultrasound), CONDITION);
    }
}
