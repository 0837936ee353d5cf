//! Auction bidding rules driven through the dispatcher with scripted bidders.
mod common;

use std::collections::HashMap;

use common::{asset, cash_of, owner_of, scripted_dispatcher, three_player_board};
use landlord::engine::{auction, Operation, Owner, PlayerId, PlayerStatus};

#[tokio::test]
async fn three_player_auction_goes_to_last_bidder_standing() {
    let mut board = three_player_board([1500, 1500, 1500]);
    let park = asset(&board, "Park Place");
    board.location_mut(park).unwrap().price = 300;
    // player_3 opens: 50, player_1 120, player_2 withdraws, player_3 200, player_1 withdraws
    let bids = HashMap::from([(2, vec![50, 200]), (0, vec![120, 0]), (1, vec![0])]);
    let (mut dispatcher, calls) = scripted_dispatcher(&board, bids);

    let winner = auction(2, &mut board, park, &mut dispatcher).await.unwrap();

    assert_eq!(winner, Some(PlayerId(2)));
    assert_eq!(cash_of(&board, 2), 1300);
    assert_eq!(cash_of(&board, 0), 1500);
    assert_eq!(owner_of(&board, "Park Place"), Owner::Player(PlayerId(2)));
    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            "player_3 bid 50 over 0",
            "player_1 bid 120 over 50",
            "player_2 bid 0 over 120",
            "player_3 bid 200 over 120",
            "player_1 bid 0 over 200",
        ]
    );
    assert_eq!(
        board.history().operations(),
        vec![Operation::ChargePlayer, Operation::UpdateAssetOwner]
    );
    assert_eq!(board.history().entries()[0].params["amount"], 200);
}

#[tokio::test]
async fn bid_that_does_not_beat_high_bid_removes_bidder() {
    let mut board = three_player_board([1500, 1500, 1500]);
    let boardwalk = asset(&board, "Boardwalk");
    let bids = HashMap::from([(0, vec![100]), (1, vec![100]), (2, vec![0])]);
    let (mut dispatcher, calls) = scripted_dispatcher(&board, bids);

    let winner = auction(0, &mut board, boardwalk, &mut dispatcher).await.unwrap();

    assert_eq!(winner, Some(PlayerId(0)));
    assert_eq!(cash_of(&board, 0), 1400);
    // player_2 matched instead of beating and was dropped; player_1 is never asked again
    assert_eq!(calls.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn no_bids_leaves_asset_with_bank() {
    let mut board = three_player_board([1500, 1500, 1500]);
    let rr = asset(&board, "Reading Railroad");
    let (mut dispatcher, _calls) = scripted_dispatcher(&board, HashMap::new());

    let winner = auction(1, &mut board, rr, &mut dispatcher).await.unwrap();

    assert_eq!(winner, None);
    assert_eq!(owner_of(&board, "Reading Railroad"), Owner::Bank);
    assert!(board.history().is_empty());
}

#[tokio::test]
async fn bankrupt_players_are_not_asked() {
    let mut board = three_player_board([1500, 1500, 1500]);
    board.players[1].status = PlayerStatus::Lost;
    let utility = asset(&board, "Electric Company");
    let bids = HashMap::from([(0, vec![10, 0]), (1, vec![999]), (2, vec![20])]);
    let (mut dispatcher, calls) = scripted_dispatcher(&board, bids);

    let winner = auction(0, &mut board, utility, &mut dispatcher).await.unwrap();

    assert_eq!(winner, Some(PlayerId(2)));
    assert_eq!(cash_of(&board, 2), 1480);
    assert!(calls.lock().unwrap().iter().all(|c| !c.starts_with("player_2")));
}

#[tokio::test]
async fn winner_may_overbid_cash() {
    let mut board = three_player_board([100, 1500, 1500]);
    let boardwalk = asset(&board, "Boardwalk");
    let bids = HashMap::from([(0, vec![250])]);
    let (mut dispatcher, _calls) = scripted_dispatcher(&board, bids);

    let winner = auction(0, &mut board, boardwalk, &mut dispatcher).await.unwrap();

    assert_eq!(winner, Some(PlayerId(0)));
    assert_eq!(cash_of(&board, 0), -150);
}

#[tokio::test]
async fn fixed_locations_cannot_be_auctioned() {
    let mut board = three_player_board([1500, 1500, 1500]);
    let go = asset(&board, "Go");
    let (mut dispatcher, calls) = scripted_dispatcher(&board, HashMap::new());

    assert!(auction(0, &mut board, go, &mut dispatcher).await.is_err());
    assert!(calls.lock().unwrap().is_empty());
}
