//! CSV export of aggregated per-unit statistics.

use std::io;

use crate::sim::result_list::ResultList;
use crate::sim::setup::Setup;
use crate::sim::unit_result::Item;

fn average(item: &Item, cumulative_weight: i64) -> f64 {
    if cumulative_weight > 0 {
        item.total_scaled as f64 / cumulative_weight as f64
    } else {
        0.0
    }
}

/// Write one row per unit with outcome counters and the min/average/max of
/// the tracked quantities.
pub fn export_unit_results_csv<W: io::Write>(
    out: W,
    setup: &Setup,
    results: &ResultList,
) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record([
        "id",
        "name",
        "fights",
        "won",
        "captured",
        "damage_min",
        "damage_avg",
        "damage_max",
        "shield_min",
        "shield_avg",
        "shield_max",
        "torpedoes_fired_avg",
        "fighters_lost_avg",
        "crew_left_or_defense_lost_avg",
    ])?;

    let weight = results.cumulative_weight();
    for slot in 0..setup.num_units() {
        let (Some(unit), Some(result)) = (setup.unit(slot), results.unit_result(slot)) else {
            continue;
        };
        writer.write_record([
            unit.id().to_string(),
            unit.name().to_string(),
            result.num_fights().to_string(),
            result.num_fights_won().to_string(),
            result.num_captures().to_string(),
            result.damage().min.to_string(),
            format!("{:.2}", average(result.damage(), weight)),
            result.damage().max.to_string(),
            result.shield().min.to_string(),
            format!("{:.2}", average(result.shield(), weight)),
            result.shield().max.to_string(),
            format!("{:.2}", average(result.num_torpedoes_fired(), weight)),
            format!("{:.2}", average(result.num_fighters_lost(), weight)),
            format!(
                "{:.2}",
                average(result.crew_left_or_defense_lost(), weight)
            ),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::host_config::HostConfiguration;
    use crate::data::ship_list::ShipList;
    use crate::sim::config::Configuration;
    use crate::sim::runner::run_series;
    use crate::sim::unit::{Aggressiveness, Unit};

    #[test]
    fn export_produces_one_row_per_unit() {
        let mut setup = Setup::new();
        for (id, owner) in [(1, 2), (2, 3)] {
            let mut ship = Unit::new_ship();
            ship.set_id(id);
            ship.set_owner(owner);
            ship.set_default_name();
            ship.set_num_beams(4);
            ship.set_beam_type(5);
            ship.set_aggressiveness(Aggressiveness::Kill);
            setup.add_ship(ship);
        }

        let results = run_series(
            &setup,
            3,
            &Configuration::default(),
            &ShipList::with_default_components(),
            &HostConfiguration::default(),
            5,
        );

        let mut buffer = Vec::new();
        export_unit_results_csv(&mut buffer, &setup, &results).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,name,fights"));
        assert!(lines[1].starts_with("1,Ship 1,"));
        assert!(lines[2].starts_with("2,Ship 2,"));
    }
}
