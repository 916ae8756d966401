use approx::assert_abs_diff_eq;
use racecore::core::circuit::{Circuit, CircuitPars};
use racecore::core::driver::entrants_from_teams;
use racecore::core::race::Race;
use racecore::core::race_event::{EventKind, RaceEventKind};
use racecore::post::race_result::RaceResult;
use racecore::pre::presets::Preset;
use racecore::pre::read_sim_pars::builtin_teams;
use racecore::pre::sim_config::SimConfig;

const DT: f64 = 1.0 / 60.0;

fn default_race(sim_config: &SimConfig, seed: u64) -> Race {
    let circuit = Circuit::new(&CircuitPars::named(None).unwrap()).unwrap();
    let entrants = entrants_from_teams(&builtin_teams().unwrap());
    Race::with_seed(circuit, entrants, sim_config, seed).unwrap()
}

fn check_ranking(race: &Race) {
    let roster = race.ranked_roster();
    assert_abs_diff_eq!(roster[0].gap_to_leader, 0.0);
    assert_abs_diff_eq!(roster[0].gap_to_leader_s, 0.0);

    for (idx, competitor) in roster.iter().enumerate() {
        assert_eq!(competitor.position, idx as u32 + 1);
        assert!(competitor.pace_multiplier() > 0.0);
        assert!(competitor.pace_multiplier() <= 1.2);
    }

    for pair in roster.windows(2) {
        assert!(pair[1].gap_to_leader >= pair[0].gap_to_leader);
        assert!(pair[1].gap_to_leader_s >= pair[0].gap_to_leader_s);
    }
}

#[test]
fn full_race_on_default_loop() {
    let cfg = SimConfig::default();
    let mut race = default_race(&cfg, 2024);
    race.start();

    let mut no_ticks = 0;
    while !race.is_finished() {
        race.tick(DT).unwrap();
        no_ticks += 1;
        if no_ticks % 600 == 0 {
            check_ranking(&race);
        }
    }
    check_ranking(&race);

    let roster = race.ranked_roster();
    assert_eq!(roster.len(), 20);
    assert_eq!(race.circuit().segment_count(), 65);
    assert!(roster[0].lap > cfg.race_laps);

    let mut positions: Vec<u32> = roster.iter().map(|c| c.position).collect();
    positions.sort_unstable();
    positions.dedup();
    assert_eq!(positions, (1..=20).collect::<Vec<u32>>());

    let race_end = race
        .event_log()
        .recent(Some(1))
        .into_iter()
        .next()
        .unwrap()
        .to_owned();
    match race_end.kind {
        RaceEventKind::RaceEnd {
            winner,
            margin_seconds,
            climbers,
        } => {
            assert_eq!(winner.id, roster[0].id());
            assert!(margin_seconds >= 0.0);
            assert!(climbers.len() <= cfg.max_notable_climbers);
        }
        other => panic!("expected race end as newest event, got {:?}", other),
    }

    // a 20 lap race on soft tires forces pit stops
    assert!(race.event_counts().get(&EventKind::PitEntry).copied().unwrap_or(0) > 0);
    assert!(race.event_log().len() <= cfg.event_log_capacity);
    assert!(RaceResult::from_race(&race).verify().is_empty());
}

#[test]
fn start_and_end_are_emitted_exactly_once() {
    let mut cfg = SimConfig::default();
    cfg.race_laps = 3;
    let mut race = default_race(&cfg, 5);
    race.start();
    race.start();

    while !race.is_finished() {
        race.tick(DT).unwrap();
    }
    for _ in 0..100 {
        race.tick(DT).unwrap();
    }
    race.start();

    assert_eq!(race.event_counts().get(&EventKind::RaceStart), Some(&1));
    assert_eq!(race.event_counts().get(&EventKind::RaceEnd), Some(&1));
}

#[test]
fn identical_seeds_reproduce_the_race() {
    let cfg = Preset::Chaos.config();

    let run = |seed: u64| {
        let mut race = default_race(&cfg, seed);
        race.start();
        while !race.is_finished() {
            race.tick(DT).unwrap();
        }
        serde_json::to_string(&RaceResult::from_race(&race)).unwrap()
    };

    let first = run(99);
    let second = run(99);
    assert_eq!(first, second);
}

#[test]
fn different_seeds_diverge() {
    let mut cfg = SimConfig::default();
    cfg.race_laps = 5;

    let run = |seed: u64| {
        let mut race = default_race(&cfg, seed);
        race.start();
        while !race.is_finished() {
            race.tick(DT).unwrap();
        }
        race.race_time()
    };

    assert_ne!(run(1), run(2));
}

#[test]
fn event_log_stays_bounded_with_small_capacity() {
    let mut cfg = SimConfig::default();
    cfg.event_log_capacity = 5;
    cfg.race_laps = 4;
    let mut race = default_race(&cfg, 11);
    race.start();

    while !race.is_finished() {
        race.tick(DT).unwrap();
        assert!(race.event_log().len() <= 5);
    }

    let total: usize = race.event_counts().values().sum();
    assert!(total > 5);
    assert_eq!(
        race.event_log().recent(None)[0].kind,
        race.event_log().iter().next().unwrap().kind
    );
}

#[test]
fn real_circuits_finish_with_every_preset() {
    for (preset, circuit) in Preset::ALL.iter().zip(["monaco", "silverstone", "suzuka"].iter()) {
        let mut cfg = preset.config();
        cfg.race_laps = 3;
        let circuit = Circuit::new(&CircuitPars::named(Some(*circuit)).unwrap()).unwrap();
        let entrants = entrants_from_teams(&builtin_teams().unwrap());
        let mut race = Race::with_seed(circuit, entrants, &cfg, 8).unwrap();
        race.start();

        while !race.is_finished() {
            race.tick(0.05).unwrap();
        }

        let result = RaceResult::from_race(&race);
        assert_eq!(result.verify(), Vec::<String>::new(), "{}", preset.name());
    }
}
