mod common;

use common::read_fixture;
use fpl_league::fpl_api::{
    league_name, parse_current_gameweek_json, parse_history_json, parse_league_snapshot_json,
    parse_live_json, parse_picks_json, parse_player_names_json,
};
use fpl_league::FetchError;

#[test]
fn league_name_is_passed_through() {
    let raw = r#"{"league": {"name": "test name"}, "other": "test"}"#;
    let snapshot = parse_league_snapshot_json(1, raw).expect("minimal league should parse");
    assert_eq!(league_name(&snapshot), "test name");
    assert!(snapshot.managers.is_empty());
}

#[test]
fn standings_fixture_parses_in_remote_order() {
    let snapshot = parse_league_snapshot_json(19070, &read_fixture("standings.json"))
        .expect("fixture should parse");
    assert_eq!(snapshot.league_id, 19070);
    assert_eq!(snapshot.name, "Sunday League Legends");
    let ids: Vec<u32> = snapshot.managers.iter().map(|m| m.manager_id).collect();
    assert_eq!(ids, vec![7251561, 1843302, 3390127]);
    let priya = &snapshot.managers[2];
    assert_eq!(priya.player_name, "Priya Nair");
    assert_eq!(priya.team_name, "Net Gains FC");
    assert_eq!(priya.latest_points, 83);
    assert_eq!(priya.total_points, 1541);
    assert_eq!(priya.rank, 3);
}

#[test]
fn current_gameweek_is_the_flagged_event() {
    let gw = parse_current_gameweek_json(&read_fixture("bootstrap.json")).expect("should parse");
    assert_eq!(gw, 26);
}

#[test]
fn no_current_event_is_state_unavailable() {
    let raw = r#"{"events": [{"id": 1, "is_current": false}, {"id": 2, "is_current": false}]}"#;
    let err = parse_current_gameweek_json(raw).unwrap_err();
    assert!(matches!(err, FetchError::StateUnavailable));
}

#[test]
fn player_names_resolve_by_id() {
    let names = parse_player_names_json(&read_fixture("bootstrap.json")).expect("should parse");
    assert_eq!(names.name(308).unwrap(), "Salah");
    assert_eq!(names.name(355).unwrap(), "Haaland");
    assert_eq!(names.name(19).unwrap(), "Saka");
    assert!(matches!(
        names.name(4),
        Err(FetchError::MissingPlayer { player_id: 4, .. })
    ));
}

#[test]
fn picks_expose_captain_chip_and_totals() {
    let picks = parse_picks_json(&read_fixture("picks_wildcard.json")).expect("should parse");
    assert_eq!(picks.captain_id().unwrap(), 308);
    assert_eq!(picks.active_chip.as_deref(), Some("wildcard"));
    assert_eq!(picks.entry_history.points, 67);
    assert_eq!(picks.entry_history.total_points, 1203);
}

#[test]
fn picks_without_captain_is_a_parse_error() {
    let raw = r#"{"active_chip": null, "entry_history": {"points": 1, "total_points": 1},
        "picks": [{"element": 5, "is_captain": false}]}"#;
    let picks = parse_picks_json(raw).expect("shape is valid");
    assert!(matches!(picks.captain_id(), Err(FetchError::Parse { .. })));
}

#[test]
fn history_rows_follow_current_array() {
    let rows = parse_history_json(&read_fixture("history.json")).expect("should parse");
    let events: Vec<(u32, i32, u32)> = rows
        .iter()
        .map(|r| (r.event, r.points, r.overall_rank))
        .collect();
    assert_eq!(
        events,
        vec![(1, 72, 1203944), (2, 58, 1588201), (3, 41, 2903117)]
    );
}

#[test]
fn live_scores_lookup() {
    let live = parse_live_json(20, &read_fixture("live.json")).expect("should parse");
    assert_eq!(live.gameweek, 20);
    assert_eq!(live.score(308).unwrap(), 15);
    assert_eq!(live.score(355).unwrap(), 0);
    assert!(live.score(1).is_err());
}

#[test]
fn missing_required_field_is_parse_error() {
    let err = parse_history_json(r#"{"current": [{"event": 1, "points": 3}]}"#).unwrap_err();
    assert!(matches!(err, FetchError::Parse { what: "history", .. }));
    let err = parse_league_snapshot_json(1, "null").unwrap_err();
    assert!(matches!(err, FetchError::Parse { what: "standings", .. }));
}
