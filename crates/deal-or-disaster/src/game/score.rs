use serde::{Deserialize, Serialize};

use super::evaluator::{classify, Decision, DecisionClass};

/// Running totals for one game. Reset only when a new game or daily challenge starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameScore {
    pub points: i64,
    pub cases_solved: u32,
    pub good_deals: u32,
    pub bad_deals_avoided: u32,
    pub mistakes: u32,
    pub red_flags_found: u32,
    pub red_flag_correct: u32,
    pub red_flag_mistakes: u32,
}

impl GameScore {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn record_decision(&mut self, decision: Decision, is_good_deal: bool, points: i32) {
        self.points += i64::from(points);
        self.cases_solved += 1;
        match classify(decision, is_good_deal) {
            DecisionClass::GoodDeal => self.good_deals += 1,
            DecisionClass::BadDealAvoided => self.bad_deals_avoided += 1,
            DecisionClass::Mistake => self.mistakes += 1,
            DecisionClass::Partial => {}
        }
    }

    pub fn record_flag_reveal(&mut self, points: i32) {
        self.points += i64::from(points);
        self.red_flags_found += 1;
    }

    pub fn record_quiz_answer(&mut self, correct: bool, points: i32) {
        self.points += i64::from(points);
        self.red_flags_found += 1;
        if correct {
            self.red_flag_correct += 1;
        } else {
            self.red_flag_mistakes += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_and_walk_counters_are_exclusive() {
        let combos = [
            (Decision::Buy, true),
            (Decision::Buy, false),
            (Decision::WalkAway, true),
            (Decision::WalkAway, false),
        ];

        for (decision, good) in combos {
            let mut score = GameScore::default();
            score.record_decision(decision, good, 0);
            let bumped = score.good_deals + score.bad_deals_avoided + score.mistakes;
            assert_eq!(bumped, 1, "{decision:?} good={good}");
            assert_eq!(score.cases_solved, 1);
        }
    }

    #[test]
    fn investigate_touches_no_category() {
        let mut score = GameScore::default();
        score.record_decision(Decision::Investigate, false, 10);
        assert_eq!(score.good_deals + score.bad_deals_avoided + score.mistakes, 0);
        assert_eq!(score.cases_solved, 1);
        assert_eq!(score.points, 10);
    }

    #[test]
    fn quiz_answers_split_correct_and_mistakes() {
        let mut score = GameScore::default();
        score.record_quiz_answer(true, 75);
        score.record_quiz_answer(false, -25);
        score.record_flag_reveal(25);
        assert_eq!(score.red_flags_found, 3);
        assert_eq!(score.red_flag_correct, 1);
        assert_eq!(score.red_flag_mistakes, 1);
        assert_eq!(score.points, 75);
    }

    #[test]
    fn reset_clears_everything() {
        let mut score = GameScore::default();
        score.record_decision(Decision::Buy, true, 100);
        score.reset();
        assert_eq!(score, GameScore::default());
    }
}
