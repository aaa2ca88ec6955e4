use std::sync::Arc;

use board::client::LeaderboardClient;
use board::config::Backend;
use board::cycle::{CycleOutcome, LeaderboardSync};
use board::sinks::BoardState;

#[tokio::test]
#[ignore] // requires network and LEADERBOARD_BASE_URL
async fn test_live_backend_cycle() {
    let base_url = std::env::var("LEADERBOARD_BASE_URL").expect("LEADERBOARD_BASE_URL not set");
    let client = LeaderboardClient::from_config(&Backend::default()).unwrap();
    let board = Arc::new(BoardState::default());
    let sync = LeaderboardSync::new(Some(base_url), client, board.clone(), board.clone());

    let outcome = sync.run_once().await;
    assert!(
        matches!(outcome, CycleOutcome::Updated { .. } | CycleOutcome::Empty),
        "live cycle failed: {outcome:?}, status = {}",
        board.snapshot().status
    );
}
