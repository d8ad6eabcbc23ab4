//! Ship update: continuous drain, recharge, damage control, and the power
//! coupling of the player's sensors.

use hecs::World;

use planetz_core::cards::CardStats;
use planetz_core::enums::CardType;
use planetz_core::events::GameEvent;

use crate::components::PlayerShip;
use crate::ship::Ship;
use crate::star_charts::StarCharts;
use crate::system::ShipSystem;
use crate::targeting::TargetingComputer;

/// Tick every live ship, collect their side-effect events, then follow the
/// player's target computer and scanner into TC and DC.
pub fn run(
    world: &mut World,
    targeting: &mut TargetingComputer,
    star_charts: &mut StarCharts,
    dt: f64,
    events: &mut Vec<GameEvent>,
) {
    for (_entity, ship) in world.query_mut::<&mut Ship>() {
        if ship.is_destroyed() {
            continue;
        }
        ship.update(dt);
        events.extend(ship.drain_events());
    }

    for (_entity, (_player, ship)) in world.query_mut::<(&PlayerShip, &Ship)>() {
        couple_sensors(ship, targeting, star_charts);
    }
}

/// TC runs only while its system is installed, operational and switched on.
pub fn couple_sensors(ship: &Ship, targeting: &mut TargetingComputer, star_charts: &mut StarCharts) {
    let computer = ship.system_of(CardType::TargetComputer);
    targeting.configure(computer.and_then(sensor_stats));
    targeting.set_active(computer.is_some_and(ShipSystem::is_active));

    let scanner = ship
        .system_of(CardType::LongRangeScanner)
        .filter(|s| s.is_operational());
    star_charts.configure(
        scanner.and_then(sensor_stats),
        scanner.map_or(0.0, ShipSystem::effectiveness),
    );
}

fn sensor_stats(system: &ShipSystem) -> Option<&planetz_core::cards::SensorStats> {
    match system.stats() {
        CardStats::Sensor(stats) => Some(stats),
        _ => None,
    }
}
