//! The nine shot types of a storyboard grid.

use serde::{Deserialize, Serialize};

/// Shot type of one grid panel.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum ShotType {
    /// Extreme long shot
    #[serde(rename = "ELS")]
    #[strum(serialize = "ELS")]
    ExtremeLong,
    /// Long shot
    #[serde(rename = "LS")]
    #[strum(serialize = "LS")]
    Long,
    /// Medium long shot
    #[serde(rename = "MLS")]
    #[strum(serialize = "MLS")]
    MediumLong,
    /// Medium shot
    #[serde(rename = "MS")]
    #[strum(serialize = "MS")]
    Medium,
    /// Medium close-up
    #[serde(rename = "MCU")]
    #[strum(serialize = "MCU")]
    MediumCloseUp,
    /// Close-up
    #[serde(rename = "CU")]
    #[strum(serialize = "CU")]
    CloseUp,
    /// Extreme close-up
    #[serde(rename = "ECU")]
    #[strum(serialize = "ECU")]
    ExtremeCloseUp,
    /// Camera below the subject
    #[serde(rename = "Low Angle")]
    #[strum(serialize = "Low Angle")]
    LowAngle,
    /// Camera above the subject
    #[serde(rename = "High Angle")]
    #[strum(serialize = "High Angle")]
    HighAngle,
}

/// Panel order of the grid, left to right, top to bottom.
pub const SHOT_ORDER: [ShotType; 9] = [
    ShotType::ExtremeLong,
    ShotType::Long,
    ShotType::MediumLong,
    ShotType::Medium,
    ShotType::MediumCloseUp,
    ShotType::CloseUp,
    ShotType::ExtremeCloseUp,
    ShotType::LowAngle,
    ShotType::HighAngle,
];

impl ShotType {
    /// Chinese label shown on the panel.
    pub fn label_cn(self) -> &'static str {
        match self {
            ShotType::ExtremeLong => "大远景",
            ShotType::Long => "远景",
            ShotType::MediumLong => "中远景",
            ShotType::Medium => "中景",
            ShotType::MediumCloseUp => "中近景",
            ShotType::CloseUp => "近景",
            ShotType::ExtremeCloseUp => "特写",
            ShotType::LowAngle => "仰拍",
            ShotType::HighAngle => "俯拍",
        }
    }

    /// Camera angle used when the legacy prompt names none.
    pub fn default_angle(self) -> &'static str {
        match self {
            ShotType::ExtremeLong | ShotType::Long | ShotType::Medium => "Eye level",
            ShotType::MediumLong => "Slight low angle",
            ShotType::MediumCloseUp => "Slight high angle",
            ShotType::CloseUp => "Straight on",
            ShotType::ExtremeCloseUp => "Macro",
            ShotType::LowAngle => "Extreme low angle",
            ShotType::HighAngle => "Top-down",
        }
    }
}

/// Narrative focus of the panel at `index`.
pub fn focus_for_index(index: usize) -> &'static str {
    match index {
        0..=2 => "建立环境",
        3..=5 => "人物情绪",
        _ => "戏剧张力",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_wire_names_match_display() {
        for shot in SHOT_ORDER {
            let wire = serde_json::to_value(shot).unwrap();
            assert_eq!(wire, shot.to_string());
            assert_eq!(ShotType::from_str(shot.as_ref()).unwrap(), shot);
        }
        assert_eq!(ShotType::LowAngle.to_string(), "Low Angle");
    }

    #[test]
    fn test_focus_bands() {
        let focus: Vec<&str> = (0..9).map(focus_for_index).collect();
        assert_eq!(&focus[..3], ["建立环境"; 3]);
        assert_eq!(&focus[3..6], ["人物情绪"; 3]);
        assert_eq!(&focus[6..], ["戏剧张力"; 3]);
    }
}
