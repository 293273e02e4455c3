use crate::infra::load_catalog;
use chrono::Utc;
use clap::Args;
use deal_or_disaster::error::AppError;
use deal_or_disaster::game::{
    CaseCatalog, CaseResolution, CatalogError, DailyChallenge, Decision, FlagAnswer, FlagClick, GameId,
    GameSession, PropertyCase, RoundCommand, RoundEvent, DEFAULT_CASE_SECONDS,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Case catalog JSON. Defaults to the embedded cases.
    #[arg(long)]
    pub(crate) cases: Option<PathBuf>,
    /// Seed for case selection so runs can be repeated.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Number of cases to play.
    #[arg(long, default_value_t = 3)]
    pub(crate) rounds: usize,
}

#[derive(Args, Debug, Default)]
pub(crate) struct CaseAuditArgs {
    /// Case catalog JSON. Defaults to the embedded cases.
    #[arg(long)]
    pub(crate) cases: Option<PathBuf>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        cases,
        seed,
        rounds,
    } = args;

    let catalog = load_catalog(cases.as_deref())?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    println!("Deal or Disaster demo ({} cases in catalog)", catalog.len());
    match todays_challenge(&catalog) {
        Ok(challenge) => println!("Today's challenge: {} -> {}", challenge.id, challenge.case_id),
        Err(err) => println!("Today's challenge unavailable: {err}"),
    }

    let mut session = GameSession::start_regular(
        GameId("demo".to_string()),
        "demo-player",
        &catalog,
        &mut rng,
        DEFAULT_CASE_SECONDS,
    )?;

    for round in 0..rounds.max(1) {
        if round > 0 {
            session.next_case(&catalog, &mut rng)?;
        }
        play_cautiously(&mut session);
    }

    let score = session.score();
    println!("\nFinal score: {} points", score.points);
    println!(
        "- {} cases | {} good deals bought | {} disasters avoided | {} mistakes",
        score.cases_solved, score.good_deals, score.bad_deals_avoided, score.mistakes
    );
    println!(
        "- {} red flags found | {} quizzes right | {} quizzes wrong",
        score.red_flags_found, score.red_flag_correct, score.red_flag_mistakes
    );
    Ok(())
}

/// Reveal every flag, answer quizzes with the first choice, and walk away from anything major.
/// Same UTC day the HTTP service uses, so the demo names the challenge players are served.
fn todays_challenge(catalog: &CaseCatalog) -> Result<DailyChallenge, CatalogError> {
    DailyChallenge::for_date(Utc::now().date_naive(), catalog)
}

fn play_cautiously(session: &mut GameSession) {
    let case = session.round().case().clone();
    print_case(&case);

    for flag in &case.red_flags {
        let click = session.apply(RoundCommand::ClickFlag {
            flag_id: flag.id.clone(),
        });
        match click {
            RoundEvent::Flag(FlagClick::Revealed {
                description,
                severity,
                ..
            }) => println!("  found [{}] {}", severity.label(), description),
            RoundEvent::Flag(FlagClick::QuizOpened { question, .. }) => {
                println!("  quiz: {question}");
                if let RoundEvent::Answer(FlagAnswer::Recorded {
                    correct,
                    description,
                    ..
                }) = session.apply(RoundCommand::AnswerFlag {
                    flag_id: flag.id.clone(),
                    choice: 0,
                }) {
                    let verdict = if correct { "right" } else { "wrong" };
                    println!("    answered {verdict}: {description}");
                }
            }
            _ => {}
        }
    }

    let major_found = session
        .round()
        .case()
        .red_flags
        .iter()
        .any(|flag| flag.discovered && flag.severity.is_major());
    let decision = if major_found {
        Decision::WalkAway
    } else {
        Decision::Buy
    };

    match session.apply(RoundCommand::SubmitDecision {
        decision,
        time_taken: 60,
    }) {
        RoundEvent::Resolved(resolution) => print_resolution(&resolution),
        other => println!("  decision not applied: {other:?}"),
    }
}

fn print_case(case: &PropertyCase) {
    println!(
        "\n{} {}, {} {} ({})",
        case.address, case.city, case.state, case.zip, case.id
    );
    println!(
        "  auction ${} | listed value ${} | repairs ~${} | {} liens",
        case.auction_price,
        case.property_value,
        case.expected_repairs(),
        case.liens.len()
    );
}

fn print_resolution(resolution: &CaseResolution) {
    let result = &resolution.result;
    println!(
        "  {} -> {} ({:+} points)",
        result.decision.label(),
        result.message,
        result.points
    );
    println!("  {}", result.explanation);
    if resolution.quiz.points != 0 {
        println!("  quiz points settled: {:+}", resolution.quiz.points);
    }
    match serde_json::to_string(&resolution.completion) {
        Ok(json) => println!("  recorded: {json}"),
        Err(err) => println!("  recorded payload unavailable: {err}"),
    }
}

pub(crate) fn run_case_audit(args: CaseAuditArgs) -> Result<(), AppError> {
    let catalog = load_catalog(args.cases.as_deref())?;
    let findings = audit_report(&catalog);
    for line in &findings {
        println!("{line}");
    }
    Ok(())
}

fn audit_report(catalog: &CaseCatalog) -> Vec<String> {
    let findings = catalog.audit();
    let mut lines = vec![format!(
        "Audited {} cases: {} inconsistent",
        catalog.len(),
        findings.len()
    )];
    lines.extend(
        findings
            .iter()
            .map(|finding| format!("- {}: {}", finding.case_id, finding.detail)),
    );
    lines
}
