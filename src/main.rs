use tracing::{info, Level};

use pole_circuit::config::RaceConfig;
use pole_circuit::race::action::{Action, GearCmd};
use pole_circuit::race::result::summarize;
use pole_circuit::race::sim::RaceSimulation;

/// Shift up once the engine winds out, drop back down when it bogs
fn pick_gear(sim: &RaceSimulation) -> GearCmd {
    if sim.player.rpm() > 0.9 && sim.player.gear == 0 {
        GearCmd::Up
    } else if sim.player.rpm() < 0.3 && sim.player.gear > 0 {
        GearCmd::Down
    } else {
        GearCmd::Hold
    }
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("Pole Circuit v{}", env!("CARGO_PKG_VERSION"));

    let config = RaceConfig::load_or_default();
    config.validate().map_err(anyhow::Error::msg)?;
    info!(
        "Configuration loaded: mode={:?}, difficulty={:?}, seed={}, traffic={}",
        config.mode, config.difficulty, config.seed, config.traffic_count
    );

    let max_steps = config.max_steps;
    let mut sim = RaceSimulation::new(config);
    let events = sim.subscribe_events();
    let info = sim.reset(None);
    info!("Track hash: {:016x}", info.track_hash);

    // Headless demo episode: a simple heuristic chases the centerline
    for _ in 0..max_steps {
        let offset = sim.track.y_at(sim.player.pos.x) - sim.player.pos.y;
        let action = Action::new(1.0, 0.0, (offset * 0.05).clamp(-1.0, 1.0))
            .with_gear(pick_gear(&sim));

        let outcome = sim.step(&action);
        for event in events.try_iter() {
            info!("event: {:?}", event);
        }
        if outcome.terminated || outcome.truncated {
            break;
        }
    }

    let summary = summarize(&sim);
    info!(
        "Episode over: laps={}, score={}, crashes={}, passes={}, best_lap={:?}",
        summary.laps, summary.final_score, summary.crashes, summary.passes, summary.best_lap_time
    );
    if let Some(rank) = summary.rank {
        info!("Qualifying rank: {:?} ({:?}s)", rank, summary.qualifying_time);
    }

    Ok(())
}
