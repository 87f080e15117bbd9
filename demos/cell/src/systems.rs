//! The two demo systems: a manufacturing cell of robots and machines, and a pair of bus stations.

use petrisim::core::{
    CompositeModel, DelayKind, Error, NetId, PlaceId, Probe, Stat, TransitionId,
};

use crate::library::{self, BusStation, RobotSources, ROBOT_CARRY_SPREAD};

/// Makes the place at `from` the same place as the one at `into`, which keeps its marking.
fn share(
    model: &mut CompositeModel,
    into: (usize, usize),
    from: (usize, usize),
) -> Result<(), Error> {
    model.alias(
        NetId::new(into.0),
        PlaceId::new(into.1),
        NetId::new(from.0),
        PlaceId::new(from.1),
    )?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Layout {
    /// Every station has its own robot.
    Static,
    /// Free robots are borrowed between stations.
    Dynamic,
}

/// Generator, then three robot stations with two machine groups in between.
///
/// Nets: 0 generator, 1 robot, 2 machines (normal), 3 robot, 4 machines (exponential), 5 robot.
pub fn manufacturing(layout: Layout, arrival_mean: f64) -> Result<CompositeModel, Error> {
    let robots = match layout {
        Layout::Static => [
            library::robot_static_pipeline(0, 6.0, 22.0, ROBOT_CARRY_SPREAD)?,
            library::robot_static_pipeline(0, 7.0, 23.0, ROBOT_CARRY_SPREAD)?,
            library::robot_static_pipeline(0, 5.0, 21.0, ROBOT_CARRY_SPREAD)?,
        ],
        Layout::Dynamic => {
            let first = RobotSources {
                x: (6.0, 0),
                y: (13.0, 1),
                z: (18.0, 2),
            };
            let others = |x, z| RobotSources {
                x: (x, 1),
                y: (0.0, 0),
                z: (z, 2),
            };
            [
                library::robot_dynamic_pipeline(first, 22.0, ROBOT_CARRY_SPREAD)?,
                library::robot_dynamic_pipeline(others(7.0, 12.0), 23.0, ROBOT_CARRY_SPREAD)?,
                library::robot_dynamic_pipeline(others(5.0, 7.0), 21.0, ROBOT_CARRY_SPREAD)?,
            ]
        }
    };
    let [r1, r2, r3] = robots;
    let mut model = CompositeModel::new(vec![
        library::generator(arrival_mean)?,
        r1,
        library::machine_pipeline(3, DelayKind::Normal, 60.0, 10.0)?,
        r2,
        library::machine_pipeline(3, DelayKind::Exponential, 100.0, 0.0)?,
        r3,
    ]);
    // The conveyor: each block's output is the next block's input
    share(&mut model, (1, 0), (0, 1))?;
    share(&mut model, (2, 0), (1, 2))?;
    share(&mut model, (3, 0), (2, 1))?;
    share(&mut model, (4, 0), (3, 2))?;
    share(&mut model, (5, 0), (4, 1))?;
    if layout == Layout::Dynamic {
        // Each station's borrowed pools are the other stations' own robots
        share(&mut model, (3, 1), (1, 3))?;
        share(&mut model, (5, 1), (1, 4))?;
        share(&mut model, (1, 1), (3, 3))?;
        share(&mut model, (5, 1), (3, 4))?;
        share(&mut model, (3, 1), (5, 3))?;
        share(&mut model, (1, 1), (5, 4))?;
    }
    Ok(model)
}

pub fn manufacturing_probes() -> Vec<Probe> {
    vec![
        Probe::new("processed", Stat::ObservedMax(NetId::new(5), PlaceId::new(2))),
        Probe::new(
            "busy machines (normal)",
            Stat::MeanBuffer(NetId::new(2), TransitionId::ZERO),
        ),
        Probe::new(
            "busy machines (exponential)",
            Stat::MeanBuffer(NetId::new(4), TransitionId::ZERO),
        ),
        Probe::new("queue (normal)", Stat::Mean(NetId::new(2), PlaceId::ZERO)),
        Probe::new("queue (exponential)", Stat::Mean(NetId::new(4), PlaceId::ZERO)),
    ]
}

const QUEUE: PlaceId = PlaceId::new(2);
const LOST: PlaceId = PlaceId::new(3);
const EARNED: PlaceId = PlaceId::new(6);
const TO_STOP: TransitionId = TransitionId::new(1);

/// Two cities with a bus station each. Both buses start in the first city; lost and earned money
/// is pooled.
pub fn transport(params: &BusStation) -> Result<CompositeModel, Error> {
    let mut model = CompositeModel::new(vec![
        library::bus_station(params, true)?,
        library::bus_station(params, false)?,
    ]);
    share(&mut model, (0, 3), (1, 3))?;
    share(&mut model, (0, 6), (1, 6))?;
    // A bus leaving one city arrives empty in the other
    share(&mut model, (0, 4), (1, 7))?;
    share(&mut model, (0, 5), (1, 8))?;
    share(&mut model, (1, 4), (0, 7))?;
    share(&mut model, (1, 5), (0, 8))?;
    Ok(model)
}

pub fn transport_probes() -> Vec<Probe> {
    let cities = [NetId::new(0), NetId::new(1)];
    vec![
        Probe::new("earned", Stat::ObservedMax(cities[0], EARNED)),
        Probe::new("lost", Stat::ObservedMax(cities[0], LOST)),
        // Little's law: time-integrated queue length over passengers who joined a queue
        Probe::custom("mean wait", move |result| {
            let (mut area, mut joined) = (0.0, 0.0);
            for city in cities {
                area += Stat::Mean(city, QUEUE).read(result)? * result.horizon;
                joined += Stat::Fired(city, TO_STOP).read(result)?;
            }
            Ok(area / f64::max(joined, 1.0))
        }),
    ]
}
