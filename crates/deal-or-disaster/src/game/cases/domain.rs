use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for property cases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(pub String);

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CaseId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// How badly a hidden issue hurts the property's true value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    RedHerring,
    Low,
    Medium,
    High,
    Severe,
}

impl Severity {
    /// High and severe flags carry the larger quiz award and the missed-flag penalty.
    pub fn is_major(self) -> bool {
        matches!(self, Severity::High | Severity::Severe)
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::RedHerring => "Red herring",
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Severe => "Severe",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OccupancyStatus {
    Vacant,
    OwnerOccupied,
    TenantOccupied,
    #[default]
    Unknown,
}

/// Repair cost as authored: a single estimate or a contractor range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepairEstimate {
    Fixed(u64),
    Range { min: u64, max: u64 },
}

impl RepairEstimate {
    /// Figure used for profit math; ranges resolve to their midpoint.
    pub fn expected(&self) -> u64 {
        match *self {
            RepairEstimate::Fixed(amount) => amount,
            RepairEstimate::Range { min, max } => min + max.saturating_sub(min) / 2,
        }
    }
}

/// Recorded debt against the property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lien {
    #[serde(rename = "type")]
    pub lien_type: String,
    pub holder: String,
    pub amount: u64,
    pub priority: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Set when authoring the case; surviving liens transfer to the buyer.
    #[serde(default)]
    pub survives_foreclosure: bool,
}

/// Multiple-choice question attached to a red flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagQuiz {
    pub question: String,
    pub choices: Vec<String>,
    pub correct_choice: usize,
    pub answer_explanation: Option<String>,
}

impl FlagQuiz {
    pub fn is_correct(&self, choice: usize) -> bool {
        self.correct_choice == choice
    }
}

/// Hidden issue the player can uncover while reviewing a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RedFlagDocument", into = "RedFlagDocument")]
pub struct RedFlag {
    pub id: String,
    pub description: String,
    pub severity: Severity,
    pub hidden_in: String,
    pub discovered: bool,
    pub quiz: Option<FlagQuiz>,
    pub user_answer: Option<usize>,
}

impl RedFlag {
    pub fn reset(&mut self) {
        self.discovered = false;
        self.user_answer = None;
    }

    pub fn answered_correctly(&self) -> Option<bool> {
        match (&self.quiz, self.user_answer) {
            (Some(quiz), Some(answer)) => Some(quiz.is_correct(answer)),
            _ => None,
        }
    }
}

/// Flat document shape for red flags; quiz fields sit beside the flag fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RedFlagDocument {
    id: String,
    description: String,
    severity: Severity,
    hidden_in: String,
    #[serde(default)]
    discovered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    choices: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correct_choice: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    answer_explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_answer: Option<usize>,
}

impl TryFrom<RedFlagDocument> for RedFlag {
    type Error = CaseDataError;

    fn try_from(doc: RedFlagDocument) -> Result<Self, Self::Error> {
        let quiz = match (doc.question, doc.choices, doc.correct_choice) {
            (None, None, None) => None,
            (Some(question), Some(choices), Some(correct_choice)) => {
                if choices.is_empty() {
                    return Err(CaseDataError::QuizWithoutChoices { flag_id: doc.id });
                }
                if correct_choice >= choices.len() {
                    return Err(CaseDataError::CorrectChoiceOutOfRange {
                        flag_id: doc.id,
                        index: correct_choice,
                        choices: choices.len(),
                    });
                }
                Some(FlagQuiz {
                    question,
                    choices,
                    correct_choice,
                    answer_explanation: doc.answer_explanation,
                })
            }
            _ => return Err(CaseDataError::IncompleteQuiz { flag_id: doc.id }),
        };

        Ok(RedFlag {
            id: doc.id,
            description: doc.description,
            severity: doc.severity,
            hidden_in: doc.hidden_in,
            discovered: doc.discovered,
            quiz,
            user_answer: doc.user_answer,
        })
    }
}

impl From<RedFlag> for RedFlagDocument {
    fn from(flag: RedFlag) -> Self {
        let (question, choices, correct_choice, answer_explanation) = match flag.quiz {
            Some(quiz) => (
                Some(quiz.question),
                Some(quiz.choices),
                Some(quiz.correct_choice),
                quiz.answer_explanation,
            ),
            None => (None, None, None, None),
        };

        RedFlagDocument {
            id: flag.id,
            description: flag.description,
            severity: flag.severity,
            hidden_in: flag.hidden_in,
            discovered: flag.discovered,
            question,
            choices,
            correct_choice,
            answer_explanation,
            user_answer: flag.user_answer,
        }
    }
}

/// One auction scenario presented to the player, including its ground truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyCase {
    pub id: CaseId,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub square_feet: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auction_date: Option<NaiveDate>,
    pub property_value: u64,
    pub auction_price: u64,
    pub repair_estimate: RepairEstimate,
    pub actual_value: u64,
    pub is_good_deal: bool,
    #[serde(default)]
    pub occupancy_status: OccupancyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hoa_fees: Option<u64>,
    #[serde(default)]
    pub liens: Vec<Lien>,
    pub red_flags: Vec<RedFlag>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl PropertyCase {
    pub fn expected_repairs(&self) -> u64 {
        self.repair_estimate.expected()
    }

    pub fn surviving_lien_total(&self) -> u64 {
        self.liens
            .iter()
            .filter(|lien| lien.survives_foreclosure)
            .fold(0u64, |total, lien| total.saturating_add(lien.amount))
    }

    /// Auction price plus repairs plus every lien that survives the sale.
    pub fn acquisition_cost(&self) -> u64 {
        self.auction_price
            .saturating_add(self.expected_repairs())
            .saturating_add(self.surviving_lien_total())
    }

    /// Signed profit (or loss) a buyer walks away with after all known costs.
    pub fn projected_margin(&self) -> i64 {
        let actual = i64::try_from(self.actual_value).unwrap_or(i64::MAX);
        let cost = i64::try_from(self.acquisition_cost()).unwrap_or(i64::MAX);
        actual.saturating_sub(cost)
    }

    /// Exact acquisition cost, or `None` when it does not fit the signed range used for margins.
    fn checked_acquisition_cost(&self) -> Option<u64> {
        let liens = self
            .liens
            .iter()
            .filter(|lien| lien.survives_foreclosure)
            .try_fold(0u64, |total, lien| total.checked_add(lien.amount))?;
        self.auction_price
            .checked_add(self.expected_repairs())?
            .checked_add(liens)
            .filter(|cost| i64::try_from(*cost).is_ok())
    }

    /// Whether the authored `is_good_deal` agrees with the cost arithmetic.
    pub fn ground_truth_consistent(&self) -> bool {
        (self.actual_value > self.acquisition_cost()) == self.is_good_deal
    }

    pub fn red_flag(&self, flag_id: &str) -> Option<&RedFlag> {
        self.red_flags.iter().find(|flag| flag.id == flag_id)
    }

    pub fn undiscovered_flags(&self) -> impl Iterator<Item = &RedFlag> {
        self.red_flags.iter().filter(|flag| !flag.discovered)
    }

    pub fn reset_flags(&mut self) {
        for flag in &mut self.red_flags {
            flag.reset();
        }
    }

    pub fn validate(&self) -> Result<(), CaseDataError> {
        if let RepairEstimate::Range { min, max } = self.repair_estimate {
            if min > max {
                return Err(CaseDataError::InvalidRepairRange { min, max });
            }
        }

        if self.checked_acquisition_cost().is_none() || i64::try_from(self.actual_value).is_err() {
            return Err(CaseDataError::AmountOverflow);
        }

        let mut seen = HashSet::new();
        for flag in &self.red_flags {
            if !seen.insert(flag.id.as_str()) {
                return Err(CaseDataError::DuplicateFlag {
                    flag_id: flag.id.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Authoring mistakes that make a case unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaseDataError {
    #[error("red flag '{flag_id}' has a question but no choices")]
    QuizWithoutChoices { flag_id: String },
    #[error("red flag '{flag_id}' marks choice {index} correct but only has {choices} choices")]
    CorrectChoiceOutOfRange {
        flag_id: String,
        index: usize,
        choices: usize,
    },
    #[error("red flag '{flag_id}' needs question, choices, and correctChoice together")]
    IncompleteQuiz { flag_id: String },
    #[error("red flag id '{flag_id}' appears more than once")]
    DuplicateFlag { flag_id: String },
    #[error("repair range minimum {min} exceeds maximum {max}")]
    InvalidRepairRange { min: u64, max: u64 },
    #[error("dollar amounts are too large to total")]
    AmountOverflow,
}
