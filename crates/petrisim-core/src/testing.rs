use crate::delay::DelayKind;
use crate::ident::{NetId, PlaceId};
use crate::model::CompositeModel;
use crate::net::{Net, NetBuilder, Transition};

/// Producer (1 token) -> deterministic transition -> sink.
pub(crate) fn single_shot(name: &str, mean: f64) -> Net {
    let mut b = NetBuilder::new(name);
    let producer = b.place("Producer", 1);
    let sink = b.place("Sink", 0);
    let t = b.transition(Transition::new(name, mean).unwrap());
    b.arc_in(producer, t, 1).arc_out(t, sink, 1);
    b.build().unwrap()
}

/// Start -> Process (exponential, `channels` parallel servers) -> End.
pub(crate) fn machine_pipeline(channels: u64, mean: f64) -> Net {
    let mut b = NetBuilder::new("MachinePipeline");
    let start = b.place("Start", 0);
    let end = b.place("End", 0);
    let free = b.place("Free channels", channels);
    let process = b.transition(
        Transition::new("Process", mean)
            .unwrap()
            .with_distribution(DelayKind::Exponential, 0.0)
            .unwrap(),
    );
    b.arc_in(start, process, 1)
        .arc_in(free, process, 1)
        .arc_out(process, end, 1)
        .arc_out(process, free, 1);
    b.build().unwrap()
}

/// A bus stop: people arrive, queue, give up when the queue is full, and leave in batches.
fn bus_stop(kind: DelayKind, bus_here: bool) -> Result<Net, crate::Error> {
    let mut b = NetBuilder::new("BusStop");
    let person = b.place("Person", 1);
    let arrived = b.place("Arrived", 0);
    let queue = b.place("Queue", 0);
    let lost = b.place("Lost", 0);
    let bus_here_p = b.place("Bus here", u64::from(bus_here));
    let earned = b.place("Earned", 0);
    let bus_away = b.place("Bus away", u64::from(!bus_here));
    let input = b.transition(Transition::new("Input", 0.5)?.with_distribution(kind, 0.115)?);
    // Turning away a newcomer must win over queueing them once the queue is full
    let to_stop = b.transition(Transition::new("To stop", 0.0)?.with_priority(1));
    let go_away = b.transition(Transition::new("Go away", 0.0)?);
    let depart = b.transition(Transition::new("Depart", 25.0)?.with_distribution(kind, 3.464)?);
    b.arc_in(person, input, 1)
        .arc_out(input, person, 1)
        .arc_out(input, arrived, 1);
    b.arc_in(arrived, to_stop, 1).arc_out(to_stop, queue, 1);
    b.test_arc(queue, go_away, 31)
        .arc_in(arrived, go_away, 1)
        .arc_out(go_away, lost, 20);
    b.arc_in(queue, depart, 20)
        .arc_in(bus_here_p, depart, 1)
        .arc_out(depart, earned, 400)
        .arc_out(depart, bus_away, 1);
    Ok(b.build()?)
}

/// Two bus stops sharing their buses and revenue.
pub(crate) fn bus_like_model(kind: DelayKind) -> Result<CompositeModel, crate::Error> {
    let (a, b) = (NetId::new(0), NetId::new(1));
    let mut model = CompositeModel::new(vec![bus_stop(kind, true)?, bus_stop(kind, false)?]);
    // A bus leaving one city arrives in the other
    model.alias(a, PlaceId::new(6), b, PlaceId::new(4))?;
    model.alias(b, PlaceId::new(6), a, PlaceId::new(4))?;
    model.alias(a, PlaceId::new(3), b, PlaceId::new(3))?;
    model.alias(a, PlaceId::new(5), b, PlaceId::new(5))?;
    Ok(model)
}
