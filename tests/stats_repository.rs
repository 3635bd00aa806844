use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use hof_harness::player::RecordError;
use hof_harness::stats::{StatsError, StatsRepository};
use tempfile::tempdir;

const HEADER: &str = "InductedToHallOfFame,OnHallOfFameBallot,FullPlayerName,YearsPlayed,AB,R,H,Doubles,Triples,HR,RBI,SB,BattingAverage,SluggingPct,AllStarAppearances,TB,TotalPlayerAwards,LastYearPlayed,ID";
const TROUT: &str = "true,true,Mike Trout,14,6432,1094,1934,346,51,378,940,204,0.301,0.585,11,3772,20,2024,troutm01";

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn single_row_table_resolves_mike_trout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("players.csv");
    std::fs::write(&path, format!("{HEADER}\n{TROUT}\n")).unwrap();

    let repo = StatsRepository::from_path(&path).unwrap();
    assert_eq!(repo.len(), 1);

    let trout = repo.find_player_by_full_name("Mike Trout").unwrap();
    assert_eq!(trout.full_name, "Mike Trout");
    assert_eq!(trout.home_runs, 378.0);
    assert_eq!(trout.batting_average, 0.301);
    assert_eq!(trout.id, "troutm01");
}

#[test]
fn nonexistent_player_is_not_found_never_a_default_record() {
    let repo = StatsRepository::from_path(fixture("players.csv")).unwrap();
    match repo.find_player_by_full_name("Nonexistent Player") {
        Err(StatsError::NotFound { name }) => assert_eq!(name, "Nonexistent Player"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn duplicate_names_resolve_to_first_row() {
    let repo = StatsRepository::from_path(fixture("players.csv")).unwrap();
    assert_eq!(repo.len(), 4);
    let trout = repo.find_player_by_full_name("Mike Trout").unwrap();
    assert_eq!(trout.id, "troutm01");
}

#[test]
fn missing_table_is_source_unavailable() {
    let dir = tempdir().unwrap();
    let err = StatsRepository::from_path(dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, StatsError::SourceUnavailable { .. }));
}

#[test]
fn bad_row_fails_the_whole_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("players.csv");
    let bad = TROUT.replace(",378,", ",3,78,");
    std::fs::write(&path, format!("{HEADER}\n{TROUT}\n{TROUT}\n{bad}\n")).unwrap();

    match StatsRepository::from_path(&path) {
        Err(StatsError::MalformedRecord { row, source }) => {
            assert_eq!(row, 4);
            assert_eq!(source, RecordError::FieldCount { found: 20 });
        }
        other => panic!("expected MalformedRecord, got {other:?}"),
    }
}

#[tokio::test]
async fn async_load_honors_cancel_flag_before_reading() {
    let cancel = AtomicBool::new(true);
    let err = StatsRepository::load(fixture("players.csv"), Duration::from_secs(5), Some(&cancel))
        .await
        .unwrap_err();
    assert!(matches!(err, StatsError::Cancelled));

    let repo = StatsRepository::load(fixture("players.csv"), Duration::from_secs(5), None)
        .await
        .unwrap();
    assert_eq!(repo.players()[0].full_name, "Hank Aaron");
}

#[test]
fn blank_line_between_rows_fails_the_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("players.csv");
    std::fs::write(&path, format!("{HEADER}\n{TROUT}\n\n{TROUT}\n")).unwrap();

    match StatsRepository::from_path(&path) {
        Err(StatsError::MalformedRecord { row, source }) => {
            assert_eq!(row, 3);
            assert_eq!(source, RecordError::FieldCount { found: 0 });
        }
        other => panic!("expected MalformedRecord, got {other:?}"),
    }
}
