use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use fpl_league::{HttpTransport, LeagueSession, PipelineConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    Standings,
    Rankings,
    Captains,
    Chips,
    Progression,
    Average,
    Overall,
}

impl Table {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "standings" => Some(Table::Standings),
            "rankings" => Some(Table::Rankings),
            "captains" => Some(Table::Captains),
            "chips" => Some(Table::Chips),
            "progression" | "points" => Some(Table::Progression),
            "average" => Some(Table::Average),
            "overall" => Some(Table::Overall),
            _ => None,
        }
    }
}

struct Args {
    league_id: u32,
    table: Table,
    from: Option<u32>,
    to: Option<u32>,
    json: bool,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1).collect())?;
    let config = PipelineConfig::from_env();
    let transport = HttpTransport::new(&config).context("unable to build http transport")?;
    let mut session = LeagueSession::open(transport, config, args.league_id)
        .with_context(|| format!("unable to open league {}", args.league_id))?;

    let latest = session.latest_gameweek();
    let lo = args.from.unwrap_or(1);
    let hi = args.to.unwrap_or(latest);

    eprintln!("{} (gameweek {latest})", session.league_name());
    if let Some(summary) = session.summary() {
        eprintln!(
            "Leading manager: {} ({} points)",
            summary.leader.manager, summary.leader.total_points
        );
        eprintln!(
            "GW {latest} top manager: {} ({} points)",
            summary.top_latest.manager, summary.top_latest.latest_score
        );
    }

    let out = io::stdout();
    let mut out = out.lock();
    match args.table {
        Table::Standings => emit(&mut out, &session.standings(), args.json)?,
        Table::Rankings => {
            let rankings = session.rankings().context("league rankings failed")?;
            emit(&mut out, &filter_range(&rankings.rows, lo, hi), args.json)?;
        }
        Table::Captains => {
            let picks = session.captain_picks().context("captain picks failed")?;
            emit(&mut out, &filter_range(&picks.rows, lo, hi), args.json)?;
            report_failures(&picks.failure_rows());
        }
        Table::Chips => {
            let chips = session.chip_usage().context("chip usage failed")?;
            emit(&mut out, &chips.rows, args.json)?;
            report_failures(&chips.failure_rows());
        }
        Table::Progression => {
            let table = session.points_progression().context("points progression failed")?;
            emit(&mut out, &filter_range(&table.rows, lo, hi), args.json)?;
            report_failures(&table.failure_rows());
        }
        Table::Average => {
            let table = session.points_average().context("points average failed")?;
            emit(&mut out, &filter_range(&table.rows, lo, hi), args.json)?;
            report_failures(&table.failure_rows());
        }
        Table::Overall => {
            let table = session
                .overall_rank_series(lo, hi)
                .context("overall rankings failed")?;
            emit(&mut out, &table.rows, args.json)?;
            report_failures(&table.failure_rows());
        }
    }
    Ok(())
}

fn filter_range<T>(rows: &[T], lo: u32, hi: u32) -> Vec<T>
where
    T: fpl_league::model::GameweekKeyed + Clone,
{
    fpl_league::transforms::filter_gameweek_range(rows, lo, hi)
}

fn report_failures(rows: &[fpl_league::league_fetch::FailureRow]) {
    for row in rows {
        eprintln!("[WARN] manager {} skipped: {}", row.manager_id, row.error);
    }
}

fn emit<T: Serialize>(out: &mut impl Write, rows: &[T], json: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, rows).context("serialize table")?;
        writeln!(out)?;
        return Ok(());
    }

    let values: Vec<Value> = rows
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<_, _>>()
        .context("serialize table")?;
    let Some(Value::Object(first)) = values.first() else {
        return Ok(());
    };
    let columns: Vec<String> = first.keys().cloned().collect();
    writeln!(out, "{}", columns.join("\t"))?;
    for value in &values {
        let cells: Vec<String> = columns
            .iter()
            .map(|col| match value.get(col) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            })
            .collect();
        writeln!(out, "{}", cells.join("\t"))?;
    }
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<Args> {
    let mut league_id = None;
    let mut table = Table::Standings;
    let mut from = None;
    let mut to = None;
    let mut json = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_string())),
            _ => (arg.as_str(), None),
        };
        let mut value = |name: &str| -> Result<String> {
            inline
                .clone()
                .or_else(|| iter.next().cloned())
                .with_context(|| format!("{name} needs a value"))
        };
        match flag {
            "--table" => {
                let raw = value("--table")?;
                table = Table::parse(&raw).with_context(|| format!("unknown table `{raw}`"))?;
            }
            "--from" => from = Some(value("--from")?.parse().context("--from must be a gameweek")?),
            "--to" => to = Some(value("--to")?.parse().context("--to must be a gameweek")?),
            "--json" => json = true,
            other => {
                league_id = Some(
                    other
                        .parse::<u32>()
                        .with_context(|| format!("`{other}` is not a league code"))?,
                )
            }
        }
    }

    Ok(Args {
        league_id: league_id.context("usage: fpl_league <league_code> [--table NAME] [--from GW] [--to GW] [--json]")?,
        table,
        from,
        to,
        json,
    })
}
