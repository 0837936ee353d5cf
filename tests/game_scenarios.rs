//! Multi-step scenarios across purchase, improvement and settlement.
mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use common::{asset, cash_of, owner_of, scripted_dispatcher, ScriptedPolicy};
use landlord::agent::Dispatcher;
use landlord::config::RulesConfig;
use landlord::engine::{
    buy_property, charge_street_repairs, handle_negative_cash_balance, improve_property, ActionOutcome, Bank,
    GameBoard, Location, LocationClass, Operation, Owner, Player, PlayerId, PlayerStatus, PurchaseVariant,
    Refusal,
};

fn blue_board(cash: i64) -> GameBoard {
    let players = vec![Player::new("player_1", cash), Player::new("player_2", 1500)];
    let locations = vec![
        Location::fixed("Go", LocationClass::DoNothing),
        Location::real_estate("Park Place", 350, "Blue", 50).owned_by(Owner::Player(PlayerId(0))),
        Location::real_estate("Boardwalk", 400, "Blue", 50),
    ];
    GameBoard::new(players, locations, Bank::default())
}

#[tokio::test]
async fn buy_then_build_a_house() {
    let mut board = blue_board(500);
    let boardwalk = asset(&board, "Boardwalk");
    let (mut dispatcher, _calls) = scripted_dispatcher(&board, HashMap::new());

    let bought = buy_property(&mut board, PlayerId(0), boardwalk, &PurchaseVariant::Plain, &mut dispatcher)
        .await
        .unwrap();
    board.advance_time_step();
    assert!(bought.is_success());
    assert_eq!(cash_of(&board, 0), 100);
    assert_eq!(owner_of(&board, "Boardwalk"), Owner::Player(PlayerId(0)));
    assert!(board.players[0].full_color_sets_possessed.contains("Blue"));

    let houses_before = board.bank.total_houses;
    let built = improve_property(&mut board, PlayerId(0), boardwalk, true, false).unwrap();
    board.advance_time_step();

    assert_eq!(built, ActionOutcome::Success);
    assert_eq!(cash_of(&board, 0), 50);
    assert_eq!(board.location(boardwalk).unwrap().num_houses, 1);
    assert_eq!(board.bank.total_houses, houses_before - 1);
    assert_eq!(board.players[0].num_total_houses, 1);

    let last = board.history().entries().last().unwrap();
    assert_eq!(last.operation, Operation::ChargePlayer);
    assert_eq!(last.time_step, 1);
}

#[tokio::test]
async fn second_house_waits_for_the_sibling() {
    let mut board = blue_board(1500);
    let boardwalk = asset(&board, "Boardwalk");
    let park = asset(&board, "Park Place");
    let (mut dispatcher, _calls) = scripted_dispatcher(&board, HashMap::new());
    buy_property(&mut board, PlayerId(0), boardwalk, &PurchaseVariant::Plain, &mut dispatcher)
        .await
        .unwrap();

    assert!(improve_property(&mut board, PlayerId(0), boardwalk, true, false).unwrap().is_success());
    let mark = board.history().len();
    let refused = improve_property(&mut board, PlayerId(0), boardwalk, true, false).unwrap();
    assert!(matches!(refused, ActionOutcome::Failure(Refusal::UnevenImprovement { .. })));
    assert_eq!(board.history().len(), mark);

    assert!(improve_property(&mut board, PlayerId(0), park, true, false).unwrap().is_success());
    assert!(improve_property(&mut board, PlayerId(0), boardwalk, true, false).unwrap().is_success());
    assert_eq!(board.location(boardwalk).unwrap().num_houses, 2);
}

#[test]
fn mortgaged_asset_cannot_be_improved() {
    let players = vec![Player::new("player_1", 1500), Player::new("player_2", 1500)];
    let locations = vec![
        Location::fixed("Go", LocationClass::DoNothing),
        Location::real_estate("Park Place", 350, "Blue", 200).owned_by(Owner::Player(PlayerId(0))),
        Location::real_estate("Boardwalk", 400, "Blue", 200)
            .owned_by(Owner::Player(PlayerId(0)))
            .mortgaged(),
    ];
    let mut board = GameBoard::new(players, locations, Bank::default());
    let boardwalk = asset(&board, "Boardwalk");
    let houses_before = board.bank.total_houses;

    let refused = improve_property(&mut board, PlayerId(0), boardwalk, true, false).unwrap();

    assert!(matches!(refused, ActionOutcome::Failure(Refusal::NotOwnerOrMortgaged { .. })));
    assert_eq!(cash_of(&board, 0), 1500);
    assert_eq!(board.location(boardwalk).unwrap().num_houses, 0);
    assert_eq!(board.bank.total_houses, houses_before);
    assert!(board.history().is_empty());
}

#[tokio::test]
async fn negative_balance_ends_in_bankruptcy_when_agent_gives_up() {
    let players = vec![Player::new("player_1", -50), Player::new("player_2", 1500)];
    let locations = vec![
        Location::fixed("Go", LocationClass::DoNothing),
        Location::real_estate("Mediterranean Avenue", 60, "Brown", 50)
            .owned_by(Owner::Player(PlayerId(0)))
            .with_improvements(2, 0),
        Location::real_estate("Baltic Avenue", 60, "Brown", 50)
            .owned_by(Owner::Player(PlayerId(0)))
            .with_improvements(2, 0),
    ];
    let mut board = GameBoard::new(players, locations, Bank::default());
    let houses_before = board.bank.total_houses;
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = Dispatcher::new().with_local("player_1", ScriptedPolicy::new("player_1", calls.clone()));

    let outcome = handle_negative_cash_balance(&mut board, PlayerId(0), &mut dispatcher)
        .await
        .unwrap();

    assert!(matches!(outcome, ActionOutcome::Failure(Refusal::Bankrupt { .. })));
    assert_eq!(*calls.lock().unwrap(), vec!["player_1 negative_balance"]);
    assert_eq!(board.players[0].status, PlayerStatus::Lost);
    assert!(board.players[0].assets.is_empty());
    assert_eq!(owner_of(&board, "Baltic Avenue"), Owner::Bank);
    assert_eq!(board.bank.total_houses, houses_before + 4);
    // the player stays in turn order
    assert_eq!(board.players.len(), 2);

    let ops = board.history().operations();
    assert_eq!(ops.iter().filter(|o| **o == Operation::ReturnImprovements).count(), 2);
    assert_eq!(ops.last(), Some(&Operation::DeclareBankruptcy));
}

#[tokio::test]
async fn non_negative_balance_needs_no_decision() {
    let mut board = blue_board(0);
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = Dispatcher::new().with_local("player_1", ScriptedPolicy::new("player_1", calls.clone()));

    let outcome = handle_negative_cash_balance(&mut board, PlayerId(0), &mut dispatcher)
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert!(calls.lock().unwrap().is_empty());
    assert!(board.history().is_empty());
}

#[tokio::test]
async fn agent_claiming_recovery_with_negative_cash_still_goes_bankrupt() {
    let mut board = blue_board(-10);
    let calls = Arc::new(Mutex::new(Vec::new()));
    let policy = ScriptedPolicy::new("player_1", calls).with_negative_balance_code(1);
    let mut dispatcher = Dispatcher::new().with_local("player_1", policy);

    let outcome = handle_negative_cash_balance(&mut board, PlayerId(0), &mut dispatcher)
        .await
        .unwrap();

    assert!(!outcome.is_success());
    assert_eq!(board.players[0].status, PlayerStatus::Lost);
    assert_eq!(owner_of(&board, "Park Place"), Owner::Bank);
}

#[test]
fn street_repairs_use_configured_rates() {
    let players = vec![Player::new("player_1", 1000)];
    let locations = vec![
        Location::real_estate("Park Place", 350, "Blue", 200)
            .owned_by(Owner::Player(PlayerId(0)))
            .with_improvements(0, 1),
        Location::real_estate("Boardwalk", 400, "Blue", 200)
            .owned_by(Owner::Player(PlayerId(0)))
            .with_improvements(3, 0),
    ];
    let mut board = GameBoard::new(players, locations, Bank::default());

    let rules = RulesConfig {
        street_repair_per_house: 70,
        street_repair_per_hotel: 145,
        ..RulesConfig::default()
    };
    let cost = charge_street_repairs(&mut board, PlayerId(0), &rules).unwrap();

    assert_eq!(cost, 3 * 70 + 145);
    assert_eq!(cash_of(&board, 0), 1000 - cost);
    assert_eq!(board.history().operations(), vec![Operation::ChargePlayer]);
}
