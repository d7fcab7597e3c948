use criterion::{criterion_group, criterion_main, Criterion};

use vcrsim::data::{HostConfiguration, ShipList};
use vcrsim::sim::{run_series, Aggressiveness, Configuration, Setup, Unit};

fn bench_setup(num_ships: usize) -> Setup {
    let mut setup = Setup::new();
    for i in 0..num_ships {
        let mut ship = Unit::new_ship();
        ship.set_id(i as i32 + 1);
        ship.set_owner(if i % 2 == 0 { 2 } else { 3 });
        ship.set_default_name();
        ship.set_mass(250);
        ship.set_crew(300);
        ship.set_num_beams(6);
        ship.set_beam_type(7);
        ship.set_num_launchers(4);
        ship.set_torpedo_type(8);
        ship.set_ammo(40);
        ship.set_aggressiveness(Aggressiveness::Kill);
        setup.add_ship(ship);
    }
    setup
}

fn bench_run_series(c: &mut Criterion) {
    let setup = bench_setup(6);
    let opts = Configuration::default();
    let list = ShipList::with_default_components();
    let config = HostConfiguration::default();

    c.bench_function("run_series_16", |b| {
        b.iter(|| run_series(&setup, 16, &opts, &list, &config, 42))
    });
}

fn bench_single_run(c: &mut Criterion) {
    let setup = bench_setup(2);
    let opts = Configuration::default();
    let list = ShipList::with_default_components();
    let config = HostConfiguration::default();

    c.bench_function("run_single", |b| {
        b.iter(|| vcrsim::sim::run_one(&setup, 0, &opts, &list, &config, 42))
    });
}

criterion_group!(benches, bench_run_series, bench_single_run);
criterion_main!(benches);
