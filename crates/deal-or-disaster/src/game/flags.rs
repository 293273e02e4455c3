//! Red-flag interactions. Simple flags pay out on reveal; quiz flags record the answer and
//! are settled when the round resolves.

use serde::Serialize;

use super::cases::{RedFlag, Severity};
use super::score::GameScore;

pub const REVEAL_POINTS: i32 = 25;
pub const MAJOR_QUIZ_POINTS: i32 = 75;
pub const QUIZ_POINTS: i32 = 50;
pub const QUIZ_PENALTY: i32 = -25;

pub fn quiz_points(severity: Severity, correct: bool) -> i32 {
    match (correct, severity.is_major()) {
        (false, _) => QUIZ_PENALTY,
        (true, true) => MAJOR_QUIZ_POINTS,
        (true, false) => QUIZ_POINTS,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FlagClick {
    Revealed {
        flag_id: String,
        description: String,
        severity: Severity,
        points: i32,
    },
    QuizOpened {
        flag_id: String,
        question: String,
        choices: Vec<String>,
    },
    AlreadyDiscovered {
        flag_id: String,
    },
    UnknownFlag {
        flag_id: String,
    },
    RoundClosed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FlagAnswer {
    Recorded {
        flag_id: String,
        description: String,
        severity: Severity,
        correct: bool,
        correct_choice: usize,
        /// Points credited when the round resolves.
        pending_points: i32,
        #[serde(skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
    },
    AlreadyDiscovered {
        flag_id: String,
    },
    NotAQuiz {
        flag_id: String,
    },
    InvalidChoice {
        flag_id: String,
        choice: usize,
        choices: usize,
    },
    UnknownFlag {
        flag_id: String,
    },
    RoundClosed,
}

/// Click a flag. Simple flags are revealed and scored at once; quiz flags only open.
pub fn click_flag(flags: &mut [RedFlag], flag_id: &str, score: &mut GameScore) -> FlagClick {
    let Some(flag) = flags.iter_mut().find(|flag| flag.id == flag_id) else {
        return FlagClick::UnknownFlag {
            flag_id: flag_id.to_string(),
        };
    };

    if flag.discovered {
        return FlagClick::AlreadyDiscovered {
            flag_id: flag.id.clone(),
        };
    }

    match &flag.quiz {
        Some(quiz) => FlagClick::QuizOpened {
            flag_id: flag.id.clone(),
            question: quiz.question.clone(),
            choices: quiz.choices.clone(),
        },
        None => {
            flag.discovered = true;
            score.record_flag_reveal(REVEAL_POINTS);
            FlagClick::Revealed {
                flag_id: flag.id.clone(),
                description: flag.description.clone(),
                severity: flag.severity,
                points: REVEAL_POINTS,
            }
        }
    }
}

/// Submit a quiz answer. Marks the flag discovered and locks it.
pub fn answer_flag(flags: &mut [RedFlag], flag_id: &str, choice: usize) -> FlagAnswer {
    let Some(flag) = flags.iter_mut().find(|flag| flag.id == flag_id) else {
        return FlagAnswer::UnknownFlag {
            flag_id: flag_id.to_string(),
        };
    };

    if flag.discovered {
        return FlagAnswer::AlreadyDiscovered {
            flag_id: flag.id.clone(),
        };
    }

    let Some(quiz) = &flag.quiz else {
        return FlagAnswer::NotAQuiz {
            flag_id: flag.id.clone(),
        };
    };

    if choice >= quiz.choices.len() {
        return FlagAnswer::InvalidChoice {
            flag_id: flag.id.clone(),
            choice,
            choices: quiz.choices.len(),
        };
    }

    let correct = quiz.is_correct(choice);
    let correct_choice = quiz.correct_choice;
    let explanation = quiz.answer_explanation.clone();

    flag.discovered = true;
    flag.user_answer = Some(choice);

    FlagAnswer::Recorded {
        flag_id: flag.id.clone(),
        description: flag.description.clone(),
        severity: flag.severity,
        correct,
        correct_choice,
        pending_points: quiz_points(flag.severity, correct),
        explanation,
    }
}

/// Quiz points and counters credited to the score when a round resolves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuizSettlement {
    pub points: i32,
    pub correct: u32,
    pub mistakes: u32,
}

pub fn settle_quizzes(flags: &[RedFlag], score: &mut GameScore) -> QuizSettlement {
    let mut settlement = QuizSettlement::default();
    for flag in flags.iter().filter(|flag| flag.discovered) {
        let Some(correct) = flag.answered_correctly() else {
            continue;
        };
        let points = quiz_points(flag.severity, correct);
        score.record_quiz_answer(correct, points);
        settlement.points += points;
        if correct {
            settlement.correct += 1;
        } else {
            settlement.mistakes += 1;
        }
    }
    settlement
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cases::FlagQuiz;

    fn simple(id: &str) -> RedFlag {
        RedFlag {
            id: id.to_string(),
            description: "Fresh paint over water stains".to_string(),
            severity: Severity::Medium,
            hidden_in: "interior photos".to_string(),
            discovered: false,
            quiz: None,
            user_answer: None,
        }
    }

    fn quiz(id: &str, severity: Severity) -> RedFlag {
        RedFlag {
            quiz: Some(FlagQuiz {
                question: "Does this lien survive?".to_string(),
                choices: vec!["No".to_string(), "Yes".to_string()],
                correct_choice: 1,
                answer_explanation: Some("Tax liens can survive.".to_string()),
            }),
            severity,
            ..simple(id)
        }
    }

    #[test]
    fn simple_reveal_scores_once() {
        let mut flags = vec![simple("paint")];
        let mut score = GameScore::default();

        let first = click_flag(&mut flags, "paint", &mut score);
        let after_first = (flags.clone(), score);
        let second = click_flag(&mut flags, "paint", &mut score);

        assert!(matches!(first, FlagClick::Revealed { points: 25, .. }));
        assert!(matches!(second, FlagClick::AlreadyDiscovered { .. }));
        assert_eq!((flags, score), after_first);
        assert_eq!(score.points, 25);
        assert_eq!(score.red_flags_found, 1);
    }

    #[test]
    fn quiz_click_does_not_discover() {
        let mut flags = vec![quiz("irs", Severity::High)];
        let mut score = GameScore::default();

        let outcome = click_flag(&mut flags, "irs", &mut score);

        assert!(matches!(outcome, FlagClick::QuizOpened { .. }));
        assert!(!flags[0].discovered);
        assert_eq!(score, GameScore::default());
    }

    #[test]
    fn quiz_points_follow_severity() {
        assert_eq!(quiz_points(Severity::High, true), 75);
        assert_eq!(quiz_points(Severity::Severe, true), 75);
        assert_eq!(quiz_points(Severity::Low, true), 50);
        assert_eq!(quiz_points(Severity::Severe, false), -25);
        assert_eq!(quiz_points(Severity::RedHerring, false), -25);
    }

    #[test]
    fn answer_locks_flag_and_defers_scoring() {
        let mut flags = vec![quiz("irs", Severity::High)];
        let mut score = GameScore::default();

        let outcome = answer_flag(&mut flags, "irs", 1);
        assert!(matches!(
            outcome,
            FlagAnswer::Recorded {
                correct: true,
                pending_points: 75,
                ..
            }
        ));
        assert!(flags[0].discovered);
        assert_eq!(flags[0].user_answer, Some(1));
        assert!(matches!(
            answer_flag(&mut flags, "irs", 0),
            FlagAnswer::AlreadyDiscovered { .. }
        ));
        assert!(matches!(
            click_flag(&mut flags, "irs", &mut score),
            FlagClick::AlreadyDiscovered { .. }
        ));
        assert_eq!(score, GameScore::default());

        let settlement = settle_quizzes(&flags, &mut score);
        assert_eq!(settlement.points, 75);
        assert_eq!(score.red_flags_found, 1);
        assert_eq!(score.red_flag_correct, 1);
    }

    #[test]
    fn invalid_choice_leaves_flag_untouched() {
        let mut flags = vec![quiz("irs", Severity::Low)];
        let outcome = answer_flag(&mut flags, "irs", 7);
        assert!(matches!(outcome, FlagAnswer::InvalidChoice { choices: 2, .. }));
        assert!(!flags[0].discovered);
        assert!(flags[0].user_answer.is_none());
    }

    #[test]
    fn wrong_answer_settles_as_mistake() {
        let mut flags = vec![quiz("lease", Severity::Low), simple("paint")];
        let mut score = GameScore::default();
        answer_flag(&mut flags, "lease", 0);
        click_flag(&mut flags, "paint", &mut score);

        let settlement = settle_quizzes(&flags, &mut score);

        assert_eq!(settlement.points, -25);
        assert_eq!(settlement.mistakes, 1);
        assert_eq!(score.red_flags_found, 2);
        assert_eq!(score.red_flag_mistakes, 1);
        assert_eq!(score.red_flag_correct, 0);
        assert_eq!(score.points, 0);
    }

    #[test]
    fn unknown_flags_are_reported() {
        let mut flags = vec![simple("paint")];
        let mut score = GameScore::default();
        assert!(matches!(
            click_flag(&mut flags, "nope", &mut score),
            FlagClick::UnknownFlag { .. }
        ));
        assert!(matches!(
            answer_flag(&mut flags, "paint", 0),
            FlagAnswer::NotAQuiz { .. }
        ));
    }
}
