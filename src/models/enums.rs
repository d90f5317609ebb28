use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unrecognized {field}: {value}")]
pub struct EnumParseError {
    pub field: &'static str,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = EnumParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(EnumParseError {
                        field: stringify!($name),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(AnalysisType {
    Fracture => "fracture",
    LungNodule => "lung_nodule",
    BrainTumor => "brain_tumor",
    Retinal => "retinal",
    Organ => "organ",
});

impl AnalysisType {
    /// URL segment used under `/api/v1/analyze/`.
    pub fn route_slug(&self) -> &'static str {
        match self {
            Self::Fracture => "fracture",
            Self::LungNodule => "lung-nodule",
            Self::BrainTumor => "brain-tumor",
            Self::Retinal => "retinal",
            Self::Organ => "organ",
        }
    }
}

str_enum!(Modality {
    Xray => "xray",
    Ct => "ct",
    Ultrasound => "ultrasound",
    Mri => "mri",
});

str_enum!(ScanMode {
    Planar => "2d",
    Volumetric => "3d",
});

// Keys of the latest-report store. The generic `/generate-report/{modality}/`
// route writes the bare modality slots; the dedicated CT/MRI routes write
// their mode-qualified slots.
str_enum!(ReportSlot {
    Xray => "xray",
    Ct => "ct",
    Ultrasound => "ultrasound",
    Mri => "mri",
    Ct2d => "ct2d",
    Ct3d => "ct3d",
    Mri3d => "mri3d",
});

impl ReportSlot {
    pub fn modality(&self) -> Modality {
        match self {
            Self::Xray => Modality::Xray,
            Self::Ct | Self::Ct2d | Self::Ct3d => Modality::Ct,
            Self::Ultrasound => Modality::Ultrasound,
            Self::Mri | Self::Mri3d => Modality::Mri,
        }
    }

    pub fn scan_mode(&self) -> ScanMode {
        match self {
            Self::Ct3d | Self::Mri3d => ScanMode::Volumetric,
            _ => ScanMode::Planar,
        }
    }
}

str_enum!(SugarStatus {
    Normal => "Normal",
    Low => "Low",
    BorderlineHigh => "Borderline High",
    High => "High",
});

impl From<Modality> for ReportSlot {
    fn from(modality: Modality) -> Self {
        match modality {
            Modality::Xray => Self::Xray,
            Modality::Ct => Self::Ct,
            Modality::Ultrasound => Self::Ultrasound,
            Modality::Mri => Self::Mri,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn analysis_type_round_trips_through_str() {
        for ty in AnalysisType::ALL {
            assert_eq!(AnalysisType::from_str(ty.as_str()).unwrap(), *ty);
        }
    }

    #[test]
    fn unknown_analysis_type_names_the_field() {
        let err = AnalysisType::from_str("dental").unwrap_err();
        assert_eq!(err.field, "AnalysisType");
        assert_eq!(err.value, "dental");
        assert_eq!(err.to_string(), "Unrecognized AnalysisType: dental");
    }

    #[test]
    fn route_slugs_use_hyphens() {
        assert_eq!(AnalysisType::LungNodule.route_slug(), "lung-nodule");
        assert_eq!(AnalysisType::BrainTumor.route_slug(), "brain-tumor");
        assert_eq!(AnalysisType::Organ.route_slug(), "organ");
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&AnalysisType::LungNodule).unwrap();
        assert_eq!(json, "\"lung_nodule\"");
        let slot: ReportSlot = serde_json::from_str("\"ct3d\"").unwrap();
        assert_eq!(slot, ReportSlot::Ct3d);
    }

    #[test]
    fn report_slots_map_to_modality_and_mode() {
        assert_eq!(ReportSlot::Ct3d.modality(), Modality::Ct);
        assert_eq!(ReportSlot::Ct3d.scan_mode(), ScanMode::Volumetric);
        assert_eq!(ReportSlot::Ct2d.scan_mode(), ScanMode::Planar);
        assert_eq!(ReportSlot::Mri3d.modality(), Modality::Mri);
        assert_eq!(ReportSlot::from(Modality::Ultrasound), ReportSlot::Ultrasound);
    }

    #[test]
    fn sugar_status_keeps_display_spacing() {
        assert_eq!(SugarStatus::BorderlineHigh.as_str(), "Borderline High");
        let json = serde_json::to_string(&SugarStatus::BorderlineHigh).unwrap();
        assert_eq!(json, "\"Borderline High\"");
    }

    #[test]
    fn modality_parsing_is_case_sensitive() {
        assert!(Modality::from_str("xray").is_ok());
        assert!(Modality::from_str("XRAY").is_err());
    }
}
