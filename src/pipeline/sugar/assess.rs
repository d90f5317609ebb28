use serde::{Deserialize, Serialize};

use super::extract::SugarValues;
use crate::models::SugarStatus;

/// Assessed lab report, as returned by the API and kept as the latest result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SugarAnalysis {
    pub fasting: Option<f64>,
    pub post_prandial: Option<f64>,
    pub hba1c: Option<f64>,
    pub status: SugarStatus,
    /// Space-joined advice sentences.
    pub recommendations: String,
}

const NORMAL_ADVICE: &str = "Your blood sugar levels appear to be within normal ranges.";
const CLOSING_ADVICE: &str = "Maintain a balanced diet and regular exercise routine.";

/// Thresholds (mg/dL, HbA1c in %):
/// fasting <70 low, >=126 high, >=100 borderline;
/// post-prandial <80 low, >=200 high, >=140 borderline;
/// HbA1c >=6.5 high, >=5.7 borderline.
///
/// Checks run fasting, post-prandial, HbA1c. A later "high" overrides any
/// earlier status; "low" and "borderline" only replace `Normal`, except the
/// fasting check which sets its status outright.
pub fn assess(values: SugarValues) -> SugarAnalysis {
    let mut status = SugarStatus::Normal;
    let mut advice: Vec<&str> = Vec::new();

    if let Some(fasting) = values.fasting {
        if fasting < 70.0 {
            advice.push("Low fasting blood sugar detected. Consider eating a small snack.");
            status = SugarStatus::Low;
        } else if fasting >= 126.0 {
            advice.push("High fasting blood sugar detected. Consult a healthcare provider.");
            status = SugarStatus::High;
        } else if fasting >= 100.0 {
            advice.push("Borderline high fasting blood sugar. Monitor your levels.");
            status = SugarStatus::BorderlineHigh;
        }
    }

    if let Some(pp) = values.post_prandial {
        if pp < 80.0 {
            advice.push("Low post-meal blood sugar detected. Consider eating a small snack.");
            if status == SugarStatus::Normal {
                status = SugarStatus::Low;
            }
        } else if pp >= 200.0 {
            advice.push("High post-meal blood sugar detected. Consult a healthcare provider.");
            status = SugarStatus::High;
        } else if pp >= 140.0 {
            advice.push("Borderline high post-meal blood sugar. Monitor your levels.");
            if status == SugarStatus::Normal {
                status = SugarStatus::BorderlineHigh;
            }
        }
    }

    if let Some(hba1c) = values.hba1c {
        if hba1c >= 6.5 {
            advice.push("HbA1c level suggests diabetes. Please consult a healthcare provider.");
            status = SugarStatus::High;
        } else if hba1c >= 5.7 {
            advice.push("Borderline high HbA1c level. Consider lifestyle changes.");
            if status == SugarStatus::Normal {
                status = SugarStatus::BorderlineHigh;
            }
        }
    }

    if advice.is_empty() {
        advice.push(NORMAL_ADVICE);
    } else {
        advice.push(CLOSING_ADVICE);
    }

    SugarAnalysis {
        fasting: values.fasting,
        post_prandial: values.post_prandial,
        hba1c: values.hba1c,
        status,
        recommendations: advice.join(" "),
    }
}
