#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde_json::{json, Value};

use fpl_league::{Transport, TransportError};

pub fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

/// In-memory transport: fixed bodies per path, 404 for anything else.
#[derive(Default)]
pub struct FixtureTransport {
    routes: Mutex<HashMap<String, Result<String, TransportError>>>,
    calls: Mutex<Vec<String>>,
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&mut self, path: &str, response: Result<String, TransportError>) -> &mut Self {
        self.routes
            .get_mut()
            .expect("routes lock")
            .insert(path.to_string(), response);
        self
    }

    pub fn route(&mut self, path: &str, body: Value) -> &mut Self {
        self.set(path, Ok(body.to_string()))
    }

    pub fn route_raw(&mut self, path: &str, body: &str) -> &mut Self {
        self.set(path, Ok(body.to_string()))
    }

    pub fn fail(&mut self, path: &str, err: TransportError) -> &mut Self {
        self.set(path, Err(err))
    }

    /// Swaps in every route of `next`, as if upstream data moved on while a
    /// caller holds a shared reference.
    pub fn reroute(&self, next: FixtureTransport) {
        let next = next.routes.into_inner().expect("routes lock");
        *self.routes.lock().expect("routes lock") = next;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|p| p.starts_with(prefix)).count()
    }
}

impl Transport for FixtureTransport {
    fn get(&self, path: &str) -> Result<String, TransportError> {
        self.calls.lock().expect("calls lock").push(path.to_string());
        self.routes
            .lock()
            .expect("routes lock")
            .get(path)
            .cloned()
            .unwrap_or(Err(TransportError::Status(404)))
    }
}

pub struct FixtureManager {
    pub id: u32,
    pub player_name: &'static str,
    pub team_name: &'static str,
    /// Gameweek scores, index 0 is gameweek 1.
    pub points: Vec<i32>,
    /// Captain element per gameweek, index 0 is gameweek 1.
    pub captains: Vec<u32>,
    /// `(gameweek, chip code)`.
    pub chips: Vec<(u32, &'static str)>,
}

pub struct FixtureLeague {
    pub league_id: u32,
    pub name: &'static str,
    pub latest_gameweek: u32,
    /// In the order the standings endpoint lists them.
    pub managers: Vec<FixtureManager>,
    /// `(element id, web name, score per gameweek)`.
    pub players: Vec<(u32, &'static str, Vec<i32>)>,
}

impl FixtureLeague {
    pub fn transport(&self) -> FixtureTransport {
        let mut t = FixtureTransport::new();
        let totals: Vec<i32> = self
            .managers
            .iter()
            .map(|m| m.points.iter().sum())
            .collect();
        let mut by_total: Vec<usize> = (0..self.managers.len()).collect();
        by_total.sort_by(|a, b| totals[*b].cmp(&totals[*a]));

        let results: Vec<Value> = self
            .managers
            .iter()
            .enumerate()
            .map(|(idx, m)| {
                let rank = by_total.iter().position(|i| *i == idx).unwrap() + 1;
                json!({
                    "id": 9000 + m.id,
                    "event_total": m.points[self.latest_gameweek as usize - 1],
                    "player_name": m.player_name,
                    "rank": rank,
                    "last_rank": rank,
                    "rank_sort": rank,
                    "total": totals[idx],
                    "entry": m.id,
                    "entry_name": m.team_name,
                })
            })
            .collect();
        t.route(
            &format!("/leagues-classic/{}/standings/", self.league_id),
            json!({
                "new_entries": {"has_next": false, "page": 1, "results": []},
                "last_updated_data": "2024-01-01T00:00:00Z",
                "league": {"id": self.league_id, "name": self.name, "scoring": "c"},
                "standings": {"has_next": false, "page": 1, "results": results},
            }),
        );

        let events: Vec<Value> = (1..=self.latest_gameweek + 2)
            .map(|gw| {
                json!({
                    "id": gw,
                    "name": format!("Gameweek {gw}"),
                    "is_previous": gw + 1 == self.latest_gameweek,
                    "is_current": gw == self.latest_gameweek,
                    "is_next": gw == self.latest_gameweek + 1,
                })
            })
            .collect();
        let elements: Vec<Value> = self
            .players
            .iter()
            .map(|(id, name, _)| json!({"id": id, "web_name": name, "team": 1, "element_type": 3}))
            .collect();
        t.route(
            "/bootstrap-static/",
            json!({"events": events, "elements": elements, "teams": []}),
        );

        for gw in 1..=self.latest_gameweek {
            let live: Vec<Value> = self
                .players
                .iter()
                .map(|(id, _, scores)| {
                    json!({
                        "id": id,
                        "stats": {"minutes": 90, "total_points": scores[gw as usize - 1]},
                        "explain": [],
                    })
                })
                .collect();
            t.route(&format!("/event/{gw}/live/"), json!({"elements": live}));
        }

        for m in &self.managers {
            let mut running = 0;
            let mut current = Vec::new();
            for gw in 1..=self.latest_gameweek {
                let points = m.points[gw as usize - 1];
                running += points;
                let chip = m
                    .chips
                    .iter()
                    .find(|(chip_gw, _)| *chip_gw == gw)
                    .map(|(_, code)| *code);
                let captain = m.captains[gw as usize - 1];
                t.route(
                    &format!("/entry/{}/event/{gw}/picks/", m.id),
                    json!({
                        "active_chip": chip,
                        "automatic_subs": [],
                        "entry_history": {
                            "event": gw,
                            "points": points,
                            "total_points": running,
                            "rank": 100_000,
                            "overall_rank": 200_000,
                            "event_transfers_cost": 0,
                            "points_on_bench": 4,
                        },
                        "picks": [
                            {"element": captain, "position": 1, "multiplier": 2, "is_captain": true, "is_vice_captain": false},
                            {"element": 999, "position": 2, "multiplier": 1, "is_captain": false, "is_vice_captain": true},
                        ],
                    }),
                );
                current.push(json!({
                    "event": gw,
                    "points": points,
                    "total_points": running,
                    "rank": 1_000_000,
                    "overall_rank": 1_000_000 - running * 100,
                    "bank": 5,
                    "value": 1000,
                }));
            }
            t.route(
                &format!("/entry/{}/history/", m.id),
                json!({"current": current, "past": [], "chips": []}),
            );
        }
        t
    }
}

/// Three managers, five finished gameweeks, no chips.
///
/// Totals: Bob 290, Cara 285, Alice 275. Alice and Bob are level on 110
/// after gameweek 2. Cara has the best gameweek 5 score (80).
pub fn three_manager_league() -> FixtureLeague {
    FixtureLeague {
        league_id: 19070,
        name: "Office League",
        latest_gameweek: 5,
        managers: vec![
            FixtureManager {
                id: 102,
                player_name: "Bob",
                team_name: "Bob's Bargains",
                points: vec![65, 45, 70, 50, 60],
                captains: vec![1, 2, 1, 2, 1],
                chips: vec![],
            },
            FixtureManager {
                id: 103,
                player_name: "Cara",
                team_name: "Cara Club",
                points: vec![40, 55, 65, 45, 80],
                captains: vec![3, 3, 3, 3, 3],
                chips: vec![],
            },
            FixtureManager {
                id: 101,
                player_name: "Alice",
                team_name: "Alice Athletic",
                points: vec![50, 60, 40, 70, 55],
                captains: vec![1, 2, 1, 2, 1],
                chips: vec![],
            },
        ],
        players: vec![
            (1, "Salah", vec![2, 4, 6, 8, 10]),
            (2, "Haaland", vec![13, 1, 2, 15, 6]),
            (3, "Palmer", vec![10, 10, 10, 10, 10]),
            (999, "Bench", vec![0, 0, 0, 0, 0]),
        ],
    }
}
