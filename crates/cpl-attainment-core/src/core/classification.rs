// crates/cpl-attainment-core/src/core/classification.rs
// ============================================================================
// Module: CPL Attainment Classification
// Description: Achievement classes, contribution stages, and stage weights.
// Purpose: Derive categorical status from scores and stage distributions.
// Dependencies: bigdecimal, serde, thiserror
// ============================================================================

//! ## Overview
//! Levels 1 and 2 classify a 0-100 score with closed-below thresholds
//! (85 / 70 / 55). Level 4 classifies from the set of contribution stages that
//! reached the student, independent of the numeric value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Achievement Status
// ============================================================================

/// Lower bound (inclusive) for [`AchievementStatus::Excellent`].
const EXCELLENT_FLOOR: u32 = 85;
/// Lower bound (inclusive) for [`AchievementStatus::Good`].
const GOOD_FLOOR: u32 = 70;
/// Lower bound (inclusive) for [`AchievementStatus::Adequate`].
const ADEQUATE_FLOOR: u32 = 55;

/// Score-based achievement classification on the 0-100 scale.
///
/// # Invariants
/// - Every score maps to exactly one variant; bounds are closed below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementStatus {
    /// Below 55.
    Poor,
    /// 55 up to (not including) 70.
    Adequate,
    /// 70 up to (not including) 85.
    Good,
    /// 85 and above.
    Excellent,
}

impl AchievementStatus {
    /// Classifies a 0-100 score.
    #[must_use]
    pub fn from_score(score: &BigDecimal) -> Self {
        if *score >= BigDecimal::from(EXCELLENT_FLOOR) {
            Self::Excellent
        } else if *score >= BigDecimal::from(GOOD_FLOOR) {
            Self::Good
        } else if *score >= BigDecimal::from(ADEQUATE_FLOOR) {
            Self::Adequate
        } else {
            Self::Poor
        }
    }

    /// Returns the stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Poor => "poor",
            Self::Adequate => "adequate",
            Self::Good => "good",
            Self::Excellent => "excellent",
        }
    }
}

impl fmt::Display for AchievementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AchievementStatus {
    type Err = ParseLabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "poor" => Ok(Self::Poor),
            "adequate" => Ok(Self::Adequate),
            "good" => Ok(Self::Good),
            "excellent" => Ok(Self::Excellent),
            other => Err(ParseLabelError::new("achievement status", other)),
        }
    }
}

// ============================================================================
// SECTION: Contribution Stage
// ============================================================================

/// How deeply a course develops a program outcome (I/R/M/A).
///
/// # Invariants
/// - Variant order is weakest to strongest and is used for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageTag {
    /// Outcome is introduced.
    Introduce,
    /// Outcome is reinforced.
    Reinforce,
    /// Outcome is mastered.
    Master,
    /// Outcome is formally assessed.
    Assessed,
}

impl StageTag {
    /// All stages, weakest first.
    pub const ALL: [Self; 4] = [Self::Introduce, Self::Reinforce, Self::Master, Self::Assessed];

    /// Returns the stable label for the stage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Introduce => "introduce",
            Self::Reinforce => "reinforce",
            Self::Master => "master",
            Self::Assessed => "assessed",
        }
    }

    /// Returns the single-letter curriculum code (`I`, `R`, `M`, `A`).
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Introduce => 'I',
            Self::Reinforce => 'R',
            Self::Master => 'M',
            Self::Assessed => 'A',
        }
    }
}

impl fmt::Display for StageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageTag {
    type Err = ParseLabelError;

    /// Accepts either the stage name or its single-letter code.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "introduce" | "I" => Ok(Self::Introduce),
            "reinforce" | "R" => Ok(Self::Reinforce),
            "master" | "M" => Ok(Self::Master),
            "assessed" | "A" => Ok(Self::Assessed),
            other => Err(ParseLabelError::new("stage", other)),
        }
    }
}

// ============================================================================
// SECTION: Stage Weights
// ============================================================================

/// Stage weight table used when a stage mapping carries no explicit weight.
///
/// # Invariants
/// - Callers validating external input should require strictly increasing
///   weights from introduce to assessed; see [`StageWeights::is_monotonic`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageWeights {
    /// Weight for [`StageTag::Introduce`].
    pub introduce: BigDecimal,
    /// Weight for [`StageTag::Reinforce`].
    pub reinforce: BigDecimal,
    /// Weight for [`StageTag::Master`].
    pub master: BigDecimal,
    /// Weight for [`StageTag::Assessed`].
    pub assessed: BigDecimal,
}

impl StageWeights {
    /// Returns the weight for a stage.
    #[must_use]
    pub const fn weight_for(&self, stage: StageTag) -> &BigDecimal {
        match stage {
            StageTag::Introduce => &self.introduce,
            StageTag::Reinforce => &self.reinforce,
            StageTag::Master => &self.master,
            StageTag::Assessed => &self.assessed,
        }
    }

    /// Returns true when weights are positive and strictly increase by stage.
    #[must_use]
    pub fn is_monotonic(&self) -> bool {
        let zero = BigDecimal::from(0);
        self.introduce > zero
            && self.introduce < self.reinforce
            && self.reinforce < self.master
            && self.master < self.assessed
    }
}

impl Default for StageWeights {
    /// I = 0.5, R = 1.0, M = 1.5, A = 2.0.
    fn default() -> Self {
        Self {
            introduce: BigDecimal::new(5.into(), 1),
            reinforce: BigDecimal::new(10.into(), 1),
            master: BigDecimal::new(15.into(), 1),
            assessed: BigDecimal::new(20.into(), 1),
        }
    }
}

// ============================================================================
// SECTION: Program Outcome Status
// ============================================================================

/// Student-level program outcome classification derived from stage coverage.
///
/// # Invariants
/// - Determined by the strongest stage present, never by the numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramOutcomeStatus {
    /// No contributing course carried a stage tag.
    NotStarted,
    /// Strongest stage reached is introduce.
    Introduce,
    /// Strongest stage reached is reinforce.
    Reinforce,
    /// Strongest stage reached is master.
    Master,
    /// At least one contributing course assessed the outcome.
    Assessed,
}

impl ProgramOutcomeStatus {
    /// Derives the status from the stages present across contributing rows.
    #[must_use]
    pub fn from_stages<I>(stages: I) -> Self
    where
        I: IntoIterator<Item = StageTag>,
    {
        match stages.into_iter().max() {
            Some(StageTag::Assessed) => Self::Assessed,
            Some(StageTag::Master) => Self::Master,
            Some(StageTag::Reinforce) => Self::Reinforce,
            Some(StageTag::Introduce) => Self::Introduce,
            None => Self::NotStarted,
        }
    }

    /// Returns the stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Introduce => "introduce",
            Self::Reinforce => "reinforce",
            Self::Master => "master",
            Self::Assessed => "assessed",
        }
    }
}

impl fmt::Display for ProgramOutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgramOutcomeStatus {
    type Err = ParseLabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "not_started" => Ok(Self::NotStarted),
            "introduce" => Ok(Self::Introduce),
            "reinforce" => Ok(Self::Reinforce),
            "master" => Ok(Self::Master),
            "assessed" => Ok(Self::Assessed),
            other => Err(ParseLabelError::new("program outcome status", other)),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Error returned when a stored or configured label is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} label: {value}")]
pub struct ParseLabelError {
    /// Label family being parsed.
    pub kind: &'static str,
    /// Rejected input.
    pub value: String,
}

impl ParseLabelError {
    /// Builds a label error.
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
