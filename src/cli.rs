//! Command-line entry points: run a simulation series over a saved setup,
//! or validate a setup against the ship list.

use serde::Serialize;

use crate::data::loader::{
    load_host_config, load_setup, load_ship_list, DEFAULT_HOST_CONFIG_PATH, DEFAULT_SHIP_LIST_PATH,
};
use crate::data::ship_list::ShipList;
use crate::sim::config::{Configuration, HostMode};
use crate::sim::export::export_unit_results_csv;
use crate::sim::result_list::ResultList;
use crate::sim::runner::{default_series_length, run_series};
use crate::sim::setup::Setup;
use crate::sim::unit_result::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Simulate,
    Validate,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("simulate") => Some(Command::Simulate),
        Some("validate") => Some(Command::Validate),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Simulate) => handle_simulate(args),
        Some(Command::Validate) => handle_validate(args),
        None => {
            eprintln!("usage: vcrsim <simulate|validate>");
            2
        }
    }
}

fn parse_mode(value: &str) -> Option<HostMode> {
    match value {
        "host" => Some(HostMode::Host),
        "nuhost" => Some(HostMode::NuHost),
        "phost2" => Some(HostMode::PHost2),
        "phost3" => Some(HostMode::PHost3),
        "phost4" => Some(HostMode::PHost4),
        _ => None,
    }
}

fn parse_i64_arg(value: Option<&String>, name: &str, default: i64) -> i64 {
    match value {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            eprintln!("invalid {name} {raw:?}, using {default}");
            default
        }),
        None => default,
    }
}

#[derive(Serialize)]
struct ItemSummary {
    min: i64,
    avg: f64,
    max: i64,
}

impl ItemSummary {
    fn new(item: &Item, cumulative_weight: i64) -> Self {
        Self {
            min: item.min,
            avg: if cumulative_weight > 0 {
                item.total_scaled as f64 / cumulative_weight as f64
            } else {
                0.0
            },
            max: item.max,
        }
    }
}

#[derive(Serialize)]
struct UnitSummary {
    id: i32,
    name: String,
    fights: i32,
    won: i32,
    captured: i32,
    survival_rate: f64,
    damage: ItemSummary,
    shield: ItemSummary,
    torpedoes_fired: ItemSummary,
    fighters_lost: ItemSummary,
}

#[derive(Serialize)]
struct SeriesSummary {
    runs: i64,
    cumulative_weight: i64,
    classes: Vec<String>,
    units: Vec<UnitSummary>,
}

fn summarize(setup: &Setup, results: &ResultList) -> SeriesSummary {
    let weight = results.cumulative_weight();
    let units = (0..setup.num_units())
        .filter_map(|slot| {
            let unit = setup.unit(slot)?;
            let result = results.unit_result(slot)?;
            Some(UnitSummary {
                id: unit.id(),
                name: unit.name().to_string(),
                fights: result.num_fights(),
                won: result.num_fights_won(),
                captured: result.num_captures(),
                survival_rate: if result.num_fights() > 0 {
                    f64::from(result.num_fights_won()) / f64::from(result.num_fights())
                } else {
                    1.0
                },
                damage: ItemSummary::new(result.damage(), weight),
                shield: ItemSummary::new(result.shield(), weight),
                torpedoes_fired: ItemSummary::new(result.num_torpedoes_fired(), weight),
                fighters_lost: ItemSummary::new(result.num_fighters_lost(), weight),
            })
        })
        .collect();
    SeriesSummary {
        runs: results.num_runs(),
        cumulative_weight: weight,
        classes: results
            .class_results()
            .iter()
            .map(|c| c.label(weight))
            .collect(),
        units,
    }
}

fn handle_simulate(args: &[String]) -> i32 {
    let Some(setup_path) = args.get(2) else {
        eprintln!("usage: vcrsim simulate <setup.json> [runs] [seed] [mode] [--csv]");
        return 2;
    };
    let setup = match load_setup(setup_path) {
        Ok(setup) => setup,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };

    let mut opts = Configuration::default();
    let ship_list =
        load_ship_list(DEFAULT_SHIP_LIST_PATH).unwrap_or_else(ShipList::with_default_components);
    let host_config = load_host_config(DEFAULT_HOST_CONFIG_PATH).unwrap_or_default();
    if let Some(mode) = args.get(5).and_then(|raw| parse_mode(raw)) {
        opts.set_mode(mode, 0, &host_config);
    }

    let runs = parse_i64_arg(args.get(3), "runs", default_series_length(&opts));
    let seed = parse_i64_arg(args.get(4), "seed", 1) as u64;
    let as_csv = args.iter().any(|arg| arg == "--csv");

    let results = run_series(&setup, runs, &opts, &ship_list, &host_config, seed);

    if as_csv {
        if let Err(err) = export_unit_results_csv(std::io::stdout(), &setup, &results) {
            eprintln!("failed to write CSV: {err}");
            return 1;
        }
    } else {
        match serde_json::to_string_pretty(&summarize(&setup, &results)) {
            Ok(payload) => println!("{payload}"),
            Err(err) => {
                eprintln!("failed to serialize summary: {err}");
                return 1;
            }
        }
    }
    0
}

fn handle_validate(args: &[String]) -> i32 {
    let Some(setup_path) = args.get(2) else {
        eprintln!("usage: vcrsim validate <setup.json>");
        return 2;
    };
    let setup = match load_setup(setup_path) {
        Ok(setup) => setup,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    let ship_list =
        load_ship_list(DEFAULT_SHIP_LIST_PATH).unwrap_or_else(ShipList::with_default_components);

    let mut failures = 0;
    for ship in setup.ships() {
        if !ship.is_matching_ship_list(&ship_list) {
            eprintln!(
                "ship #{} ({}): loadout exceeds hull {} limits",
                ship.id(),
                ship.name(),
                ship.hull_type()
            );
            failures += 1;
        }
    }
    if failures > 0 {
        eprintln!("validation failed: {failures} ship(s) out of range");
        1
    } else {
        println!("setup ok: {} ship(s)", setup.num_ships());
        0
    }
}
