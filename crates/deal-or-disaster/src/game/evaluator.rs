use serde::{Deserialize, Serialize};

use super::cases::{PropertyCase, RedFlag};

pub const GOOD_BUY_POINTS: i32 = 100;
pub const BAD_BUY_POINTS: i32 = -150;
pub const MISSED_MAJOR_FLAG_PENALTY: i32 = -50;
pub const SMART_WALK_POINTS: i32 = 50;
pub const MISSED_OPPORTUNITY_POINTS: i32 = -50;
pub const INVESTIGATE_POINTS: i32 = 10;

/// Player verdict on a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Buy,
    Investigate,
    WalkAway,
}

impl Decision {
    pub fn label(self) -> &'static str {
        match self {
            Decision::Buy => "BUY",
            Decision::Investigate => "INVESTIGATE",
            Decision::WalkAway => "WALK_AWAY",
        }
    }
}

/// Which score counter a decision lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionClass {
    GoodDeal,
    BadDealAvoided,
    Mistake,
    Partial,
}

pub fn classify(decision: Decision, is_good_deal: bool) -> DecisionClass {
    match (decision, is_good_deal) {
        (Decision::Buy, true) => DecisionClass::GoodDeal,
        (Decision::WalkAway, false) => DecisionClass::BadDealAvoided,
        (Decision::Buy, false) | (Decision::WalkAway, true) => DecisionClass::Mistake,
        (Decision::Investigate, _) => DecisionClass::Partial,
    }
}

/// The facts about a case that only the evaluator gets to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroundTruth {
    pub is_good_deal: bool,
    /// Actual value minus auction price, repairs, and surviving liens.
    pub margin: i64,
}

impl GroundTruth {
    pub fn from_case(case: &PropertyCase) -> Self {
        Self {
            is_good_deal: case.is_good_deal,
            margin: case.projected_margin(),
        }
    }
}

/// Outcome of one decision as shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub decision: Decision,
    pub points: i32,
    pub message: String,
    pub explanation: String,
    pub missed_flags: Vec<String>,
    pub forced: bool,
}

/// Score a decision against the ground truth and whatever flags the player never uncovered.
pub fn evaluate(decision: Decision, truth: GroundTruth, undiscovered: &[&RedFlag]) -> ScoreResult {
    let missed_major: Vec<&RedFlag> = undiscovered
        .iter()
        .copied()
        .filter(|flag| flag.severity.is_major())
        .collect();
    let amount = format_currency(truth.margin);

    let (points, message, explanation) = match (decision, truth.is_good_deal) {
        (Decision::Buy, true) => (
            GOOD_BUY_POINTS,
            "Excellent Decision",
            format!(
                "This property was a real deal. After the purchase price and repairs you clear about {amount} in profit."
            ),
        ),
        (Decision::Buy, false) => {
            let mut explanation = format!(
                "This property was a disaster. Once every hidden cost lands you lose about {amount}."
            );
            let points = if missed_major.is_empty() {
                BAD_BUY_POINTS
            } else {
                let missed: Vec<&str> = missed_major
                    .iter()
                    .map(|flag| flag.description.as_str())
                    .collect();
                explanation.push_str(&format!(
                    " You missed critical red flags: {}.",
                    missed.join("; ")
                ));
                BAD_BUY_POINTS + MISSED_MAJOR_FLAG_PENALTY
            };
            (points, "Costly Mistake", explanation)
        }
        (Decision::WalkAway, false) => (
            SMART_WALK_POINTS,
            "Smart Move",
            format!("Walking away saved you from a loss of about {amount}."),
        ),
        (Decision::WalkAway, true) => (
            MISSED_OPPORTUNITY_POINTS,
            "Missed Opportunity",
            format!("This one was worth buying. You passed on about {amount} in profit."),
        ),
        (Decision::Investigate, _) => (
            INVESTIGATE_POINTS,
            "Partial Credit",
            "Caution is healthy, but at a real foreclosure auction there is no time left to investigate further. You have to decide with what you know.".to_string(),
        ),
    };

    ScoreResult {
        decision,
        points,
        message: message.to_string(),
        explanation,
        missed_flags: undiscovered
            .iter()
            .map(|flag| flag.description.clone())
            .collect(),
        forced: false,
    }
}

/// Dollar magnitude with thousands separators; the sign is carried by the wording.
pub fn format_currency(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("${grouped}")
}
