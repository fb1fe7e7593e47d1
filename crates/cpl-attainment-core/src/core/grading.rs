// crates/cpl-attainment-core/src/core/grading.rs
// ============================================================================
// Module: CPL Attainment Grading
// Description: Letter grade and GPA conversion tables.
// Purpose: Convert 0-100 scores into letter grades and grade points.
// Dependencies: bigdecimal, serde
// ============================================================================

//! ## Overview
//! Letter grades use fixed closed-below breakpoints (85/80/75/70/65/60/55/50).
//! Grade points follow the program's fixed 4.00 table. Converting an unknown
//! grade label yields 0.00 instead of failing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde::Serialize;

use crate::core::classification::ParseLabelError;

// ============================================================================
// SECTION: Letter Grades
// ============================================================================

/// Letter grade on the program's grading scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LetterGrade {
    /// 85 and above.
    #[serde(rename = "A")]
    A,
    /// 80 up to 85.
    #[serde(rename = "A-")]
    AMinus,
    /// 75 up to 80.
    #[serde(rename = "B+")]
    BPlus,
    /// 70 up to 75.
    #[serde(rename = "B")]
    B,
    /// 65 up to 70.
    #[serde(rename = "B-")]
    BMinus,
    /// 60 up to 65.
    #[serde(rename = "C+")]
    CPlus,
    /// 55 up to 60.
    #[serde(rename = "C")]
    C,
    /// 50 up to 55.
    #[serde(rename = "D")]
    D,
    /// Below 50.
    #[serde(rename = "E")]
    E,
}

/// Breakpoints in descending order; the first floor a score reaches wins.
const BREAKPOINTS: [(u32, LetterGrade); 8] = [
    (85, LetterGrade::A),
    (80, LetterGrade::AMinus),
    (75, LetterGrade::BPlus),
    (70, LetterGrade::B),
    (65, LetterGrade::BMinus),
    (60, LetterGrade::CPlus),
    (55, LetterGrade::C),
    (50, LetterGrade::D),
];

impl LetterGrade {
    /// Converts a 0-100 score into a letter grade.
    #[must_use]
    pub fn from_score(score: &BigDecimal) -> Self {
        BREAKPOINTS
            .iter()
            .find(|(floor, _)| *score >= BigDecimal::from(*floor))
            .map_or(Self::E, |(_, grade)| *grade)
    }

    /// Returns the grade point for this letter grade.
    #[must_use]
    pub fn grade_point(self) -> BigDecimal {
        let hundredths: i64 = match self {
            Self::A => 400,
            Self::AMinus => 375,
            Self::BPlus => 350,
            Self::B => 300,
            Self::BMinus => 275,
            Self::CPlus => 250,
            Self::C => 200,
            Self::D => 100,
            Self::E => 0,
        };
        BigDecimal::new(hundredths.into(), 2)
    }

    /// Returns the printed label (`A`, `A-`, `B+`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::AMinus => "A-",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::BMinus => "B-",
            Self::CPlus => "C+",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LetterGrade {
    type Err = ParseLabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "A" => Ok(Self::A),
            "A-" => Ok(Self::AMinus),
            "B+" => Ok(Self::BPlus),
            "B" => Ok(Self::B),
            "B-" => Ok(Self::BMinus),
            "C+" => Ok(Self::CPlus),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            "E" => Ok(Self::E),
            other => Err(ParseLabelError {
                kind: "letter grade",
                value: other.to_string(),
            }),
        }
    }
}

/// Converts a grade label into grade points; unknown labels yield 0.00.
#[must_use]
pub fn grade_point_for_label(label: &str) -> BigDecimal {
    LetterGrade::from_str(label)
        .map_or_else(|_| LetterGrade::E.grade_point(), LetterGrade::grade_point)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::LetterGrade;
    use super::grade_point_for_label;

    #[test]
    fn breakpoints_are_closed_below() {
        let cases = [
            ("85", LetterGrade::A),
            ("84.99", LetterGrade::AMinus),
            ("80", LetterGrade::AMinus),
            ("75", LetterGrade::BPlus),
            ("70", LetterGrade::B),
            ("65", LetterGrade::BMinus),
            ("60", LetterGrade::CPlus),
            ("55", LetterGrade::C),
            ("50", LetterGrade::D),
            ("49.99", LetterGrade::E),
        ];
        for (score, expected) in cases {
            let score = BigDecimal::from_str(score).unwrap();
            assert_eq!(LetterGrade::from_score(&score), expected, "score {score}");
        }
    }

    #[test]
    fn unknown_label_maps_to_zero_points() {
        assert_eq!(grade_point_for_label("B-"), BigDecimal::from_str("2.75").unwrap());
        assert_eq!(grade_point_for_label("F"), BigDecimal::from(0));
        assert_eq!(grade_point_for_label(""), BigDecimal::from(0));
    }

    #[test]
    fn labels_roundtrip_through_display() {
        for label in ["A", "A-", "B+", "B", "B-", "C+", "C", "D", "E"] {
            assert_eq!(LetterGrade::from_str(label).unwrap().to_string(), label);
        }
    }
}
