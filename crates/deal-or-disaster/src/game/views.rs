//! Player-facing projections. Ground truth and quiz answers stay server side.

use chrono::NaiveDate;
use serde::Serialize;

use super::cases::{CaseId, Lien, OccupancyStatus, PropertyCase, RedFlag, RepairEstimate, Severity};
use super::score::GameScore;
use super::session::{CaseResolution, GameId, GameMode, GameSession};
use super::timer::TimerState;

#[derive(Debug, Clone, Serialize)]
pub struct GameView {
    pub game_id: GameId,
    pub user_id: String,
    pub mode: GameMode,
    pub score: GameScore,
    pub case: CaseView,
    pub time_remaining: u32,
    pub timer: TimerState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<CaseResolution>,
}

impl GameView {
    pub fn of(game: &GameSession) -> Self {
        let round = game.round();
        Self {
            game_id: game.id().clone(),
            user_id: game.user_id().to_string(),
            mode: game.mode().clone(),
            score: *game.score(),
            case: CaseView::of(round.case()),
            time_remaining: round.timer().remaining(),
            timer: round.timer().state(),
            resolution: round.resolution().cloned(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseView {
    pub id: CaseId,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub square_feet: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_built: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auction_date: Option<NaiveDate>,
    pub property_value: u64,
    pub auction_price: u64,
    pub repair_estimate: RepairEstimate,
    pub occupancy_status: OccupancyStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hoa_fees: Option<u64>,
    pub liens: Vec<LienView>,
    pub red_flags: Vec<FlagView>,
    pub photos: Vec<String>,
    pub description: String,
}

impl CaseView {
    pub fn of(case: &PropertyCase) -> Self {
        Self {
            id: case.id.clone(),
            address: case.address.clone(),
            city: case.city.clone(),
            state: case.state.clone(),
            zip: case.zip.clone(),
            property_type: case.property_type.clone(),
            bedrooms: case.bedrooms,
            bathrooms: case.bathrooms,
            square_feet: case.square_feet,
            year_built: case.year_built,
            auction_date: case.auction_date,
            property_value: case.property_value,
            auction_price: case.auction_price,
            repair_estimate: case.repair_estimate,
            occupancy_status: case.occupancy_status,
            hoa_fees: case.hoa_fees,
            liens: case.liens.iter().map(LienView::of).collect(),
            red_flags: case.red_flags.iter().map(FlagView::of).collect(),
            photos: case.photos.clone(),
            description: case.description.clone(),
        }
    }
}

/// Lien as a title search shows it; whether it survives is for the player to work out.
#[derive(Debug, Clone, Serialize)]
pub struct LienView {
    pub lien_type: String,
    pub holder: String,
    pub amount: u64,
    pub priority: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl LienView {
    fn of(lien: &Lien) -> Self {
        Self {
            lien_type: lien.lien_type.clone(),
            holder: lien.holder.clone(),
            amount: lien.amount,
            priority: lien.priority,
            notes: lien.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FlagView {
    pub id: String,
    pub hidden_in: String,
    pub discovered: bool,
    pub has_quiz: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<usize>,
}

impl FlagView {
    fn of(flag: &RedFlag) -> Self {
        let revealed = flag.discovered;
        Self {
            id: flag.id.clone(),
            hidden_in: flag.hidden_in.clone(),
            discovered: flag.discovered,
            has_quiz: flag.quiz.is_some(),
            description: revealed.then(|| flag.description.clone()),
            severity: revealed.then_some(flag.severity),
            user_answer: flag.user_answer,
        }
    }
}
