//! Parametric building blocks for the demo systems. Place and transition slots are listed in the
//! doc comment of each constructor, since topologies connect blocks by slot.

use petrisim::core::{DelayKind, Error, Net, NetBuilder, Priority, Transition};

/// Uniform spread that gives a half-width of 2 time units.
pub const ROBOT_CARRY_SPREAD: f64 = 1.155;
const ARRIVAL_SPREAD: f64 = 0.115;
const BUS_TRIP_SPREAD: f64 = 3.464;
/// Fare earned per passenger.
pub const FARE: u64 = 20;

/// Emits a part every exponential(`mean`) time units.
///
/// Places: 0 `Source`, 1 `Out`.
pub fn generator(mean: f64) -> Result<Net, Error> {
    let mut b = NetBuilder::new("Generator");
    let source = b.place("Source", 1);
    let out = b.place("Out", 0);
    let emit = b.transition(
        Transition::new("Emit", mean)?.with_distribution(DelayKind::Exponential, 0.0)?,
    );
    b.arc_in(source, emit, 1)
        .arc_out(emit, source, 1)
        .arc_out(emit, out, 1);
    Ok(b.build()?)
}

/// A robot parked at one station that walks to `Start` whenever a part waits there and carries
/// it to `End`.
///
/// Places: 0 `Start`, 1 `Free robot`, 2 `End`, 3 `Robot at start`.
pub fn robot_static_pipeline(
    priority: Priority,
    move_mean: f64,
    carry_mean: f64,
    carry_spread: f64,
) -> Result<Net, Error> {
    let mut b = NetBuilder::new("RobotStaticPipeline");
    let start = b.place("Start", 0);
    let free = b.place("Free robot", 1);
    let end = b.place("End", 0);
    let at_start = b.place("Robot at start", 0);
    let carry = b.transition(
        Transition::new("Carry to end", carry_mean)?
            .with_distribution(DelayKind::Uniform, carry_spread)?,
    );
    let fetch =
        b.transition(Transition::new("Robot moves to start", move_mean)?.with_priority(priority));
    b.arc_in(free, fetch, 1)
        .arc_in(start, fetch, 1)
        .arc_out(fetch, at_start, 1);
    b.arc_in(at_start, carry, 1)
        .arc_out(carry, free, 1)
        .arc_out(carry, end, 1);
    Ok(b.build()?)
}

/// Where a dynamic pipeline's robots come from, with the walk time and priority of each.
#[derive(Debug, Clone, Copy)]
pub struct RobotSources {
    pub x: (f64, Priority),
    pub y: (f64, Priority),
    pub z: (f64, Priority),
}

/// A station served by whichever robot is free: its own (`X`) or one borrowed from another
/// station (`Y`, `Z`). A carried robot always ends up in this station's `X` pool.
///
/// Places: 0 `Start`, 1 `Free robots (X)`, 2 `End`, 3 `Free robots (Y)`, 4 `Free robots (Z)`,
/// 5 `Robot at start`.
pub fn robot_dynamic_pipeline(
    sources: RobotSources,
    carry_mean: f64,
    carry_spread: f64,
) -> Result<Net, Error> {
    let mut b = NetBuilder::new("RobotDynamicPipeline");
    let start = b.place("Start", 0);
    let free_x = b.place("Free robots (X)", 1);
    let end = b.place("End", 0);
    let free_y = b.place("Free robots (Y)", 1);
    let free_z = b.place("Free robots (Z)", 1);
    let at_start = b.place("Robot at start", 0);
    for (label, pool, (mean, priority)) in [
        ("X", free_x, sources.x),
        ("Y", free_y, sources.y),
        ("Z", free_z, sources.z),
    ] {
        let name = format!("Robot from {label} moves to start");
        let fetch = b.transition(Transition::new(name, mean)?.with_priority(priority));
        b.arc_in(start, fetch, 1)
            .arc_in(pool, fetch, 1)
            .arc_out(fetch, at_start, 1);
    }
    let carry = b.transition(
        Transition::new("Carry to end", carry_mean)?
            .with_distribution(DelayKind::Uniform, carry_spread)?,
    );
    b.arc_in(at_start, carry, 1)
        .arc_out(carry, free_x, 1)
        .arc_out(carry, end, 1);
    Ok(b.build()?)
}

/// `channels` identical machines working off one queue.
///
/// Places: 0 `Start`, 1 `End`, 2 `Free channels`.
pub fn machine_pipeline(
    channels: u64,
    kind: DelayKind,
    mean: f64,
    spread: f64,
) -> Result<Net, Error> {
    let mut b = NetBuilder::new("MachinePipeline");
    let start = b.place("Start", 0);
    let end = b.place("End", 0);
    let free = b.place("Free channels", channels);
    let process = b.transition(Transition::new("Process", mean)?.with_distribution(kind, spread)?);
    b.arc_in(start, process, 1)
        .arc_in(free, process, 1)
        .arc_out(process, end, 1)
        .arc_out(process, free, 1);
    Ok(b.build()?)
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct BusStation {
    pub arrival_mean: f64,
    pub bus_a_trip: f64,
    pub bus_b_trip: f64,
    pub exit_mean: f64,
    pub max_queue: u64,
    pub seats: u64,
}

impl Default for BusStation {
    fn default() -> Self {
        Self {
            arrival_mean: 0.5,
            bus_a_trip: 20.0,
            bus_b_trip: 30.0,
            exit_mean: 5.0,
            max_queue: 30,
            seats: 20,
        }
    }
}

/// One city's bus station. Passengers queue until a full busload is waiting; a newcomer who finds
/// the queue over `max_queue` leaves and the fare is lost. Two buses, `A` and `B`, shuttle
/// between this city and another one.
///
/// Places: 0 `Person`, 1 `Arrived`, 2 `Queue`, 3 `Lost money`, 4 `Empty bus A here`,
/// 5 `Empty bus B here`, 6 `Earned money`, 7 `Empty bus A in other city`,
/// 8 `Empty bus B in other city`.
///
/// Transitions: 0 `Input`, 1 `To bus stop`, 2 `Go away`, 3 `Bus B departs`, 4 `Bus A departs`.
pub fn bus_station(params: &BusStation, buses_here: bool) -> Result<Net, Error> {
    let (here, away) = (u64::from(buses_here), u64::from(!buses_here));
    let mut b = NetBuilder::new("BusStation");
    let person = b.place("Person", 1);
    let arrived = b.place("Arrived", 0);
    let queue = b.place("Queue", 0);
    let lost = b.place("Lost money", 0);
    let bus_a_here = b.place("Empty bus A here", here);
    let bus_b_here = b.place("Empty bus B here", here);
    let earned = b.place("Earned money", 0);
    let bus_a_away = b.place("Empty bus A in other city", away);
    let bus_b_away = b.place("Empty bus B in other city", away);

    let input = b.transition(
        Transition::new("Input", params.arrival_mean)?
            .with_distribution(DelayKind::Uniform, ARRIVAL_SPREAD)?,
    );
    // A full queue turns newcomers away before they can join it
    let to_stop = b.transition(Transition::new("To bus stop", 0.0)?.with_priority(1));
    let go_away = b.transition(Transition::new("Go away", 0.0)?);
    let bus_b = b.transition(
        Transition::new("Bus B departs", params.bus_b_trip + params.exit_mean)?
            .with_distribution(DelayKind::Uniform, BUS_TRIP_SPREAD)?
            .with_priority(1),
    );
    let bus_a = b.transition(
        Transition::new("Bus A departs", params.bus_a_trip + params.exit_mean)?
            .with_distribution(DelayKind::Uniform, BUS_TRIP_SPREAD)?,
    );

    b.arc_in(person, input, 1)
        .arc_out(input, arrived, 1)
        .arc_out(input, person, 1);
    b.arc_in(arrived, to_stop, 1).arc_out(to_stop, queue, 1);
    b.test_arc(queue, go_away, params.max_queue + 1)
        .arc_in(arrived, go_away, 1)
        .arc_out(go_away, lost, FARE);
    b.arc_in(queue, bus_a, params.seats)
        .arc_in(bus_a_here, bus_a, 1)
        .arc_out(bus_a, earned, params.seats * FARE)
        .arc_out(bus_a, bus_a_away, 1);
    b.arc_in(bus_b_here, bus_b, 1)
        .arc_in(queue, bus_b, params.seats)
        .arc_out(bus_b, earned, params.seats * FARE)
        .arc_out(bus_b, bus_b_away, 1);
    Ok(b.build()?)
}
