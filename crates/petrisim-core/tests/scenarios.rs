use petrisim_core::{
    monte_carlo, run, CompositeModel, DelayKind, Error, MonteCarloOpts, Net, NetBuilder, NetId,
    Outcome, PlaceId, Probe, RngPolicy, Stat, Transition, TransitionId,
};
use rand::prelude::*;

fn producer_sink(mean: f64) -> anyhow::Result<Net> {
    let mut b = NetBuilder::new("Once");
    let producer = b.place("Producer", 1);
    let sink = b.place("Sink", 0);
    let t = b.transition(Transition::new("Move", mean)?);
    b.arc_in(producer, t, 1).arc_out(t, sink, 1);
    Ok(b.build()?)
}

/// Emits one token into "Out" every exponential(`mean`) time units.
fn generator(mean: f64) -> Result<Net, Error> {
    let mut b = NetBuilder::new("Generator");
    let source = b.place("Source", 1);
    let out = b.place("Out", 0);
    let t = b.transition(
        Transition::new("Arrive", mean)?.with_distribution(DelayKind::Exponential, 0.0)?,
    );
    b.arc_in(source, t, 1)
        .arc_out(t, source, 1)
        .arc_out(t, out, 1);
    Ok(b.build()?)
}

fn pipeline(channels: u64, mean: f64) -> Result<Net, Error> {
    let mut b = NetBuilder::new("Machines");
    let start = b.place("Start", 0);
    let end = b.place("End", 0);
    let free = b.place("Free channels", channels);
    let t = b.transition(
        Transition::new("Process", mean)?.with_distribution(DelayKind::Exponential, 0.0)?,
    );
    b.arc_in(start, t, 1)
        .arc_in(free, t, 1)
        .arc_out(t, end, 1)
        .arc_out(t, free, 1);
    Ok(b.build()?)
}

fn fed_pipeline(arrival_mean: f64) -> Result<CompositeModel, Error> {
    let mut model = CompositeModel::new(vec![generator(arrival_mean)?, pipeline(3, 60.0)?]);
    model.alias(NetId::new(0), PlaceId::new(1), NetId::new(1), PlaceId::new(0))?;
    Ok(model)
}

#[test]
fn single_firing_stalls_after_delivery() -> anyhow::Result<()> {
    let model = CompositeModel::new(vec![producer_sink(5.0)?]);
    let mut rng = StdRng::seed_from_u64(0);
    let result = run(model, 12.0, &mut rng)?;
    assert_eq!(result.outcome, Outcome::Stalled { at: 5.0 });
    let (n, producer, sink) = (NetId::ZERO, PlaceId::new(0), PlaceId::new(1));
    assert_eq!(result.place(n, producer).map(|p| p.marking), Some(0));
    assert_eq!(result.place(n, sink).map(|p| p.marking), Some(1));
    // Sink holds one token for the last 7 of 12 time units
    let mean = result.place(n, sink).map(|p| p.mean).unwrap_or_default();
    assert!((mean - 7.0 / 12.0).abs() < 1e-9);
    assert!(matches!(
        result.require_horizon(),
        Err(Error::SimulationStalled { at, horizon }) if at == 5.0 && horizon == 12.0
    ));
    Ok(())
}

#[test]
fn aliased_places_are_one_place() -> anyhow::Result<()> {
    let mut consumer = NetBuilder::new("Consumer");
    let inbox = consumer.place("Inbox", 0);
    let done = consumer.place("Done", 0);
    let t = consumer.transition(Transition::new("Take", 1.0)?);
    consumer.arc_in(inbox, t, 1).arc_out(t, done, 1);

    let (a, b) = (NetId::new(0), NetId::new(1));
    let mut model = CompositeModel::new(vec![producer_sink(2.0)?, consumer.build()?]);
    model.alias(a, PlaceId::new(1), b, inbox)?;
    assert!(model.is_aliased((a, PlaceId::new(1)), (b, inbox)));
    assert_eq!(model.nr_places(), 3);

    let result = run(model, 10.0, &mut StdRng::seed_from_u64(0))?;
    let sink = result.place(a, PlaceId::new(1)).map(|p| p.key);
    let inbox_key = result.place(b, inbox).map(|p| p.key);
    assert_eq!(sink, inbox_key);
    assert_eq!(result.place(b, done).map(|p| p.marking), Some(1));
    assert_eq!(result.place(b, inbox).map(|p| p.observed_max), Some(1));
    assert_eq!(result.outcome, Outcome::Stalled { at: 3.0 });
    Ok(())
}

#[test]
fn unsaturated_pipeline_keeps_up_with_arrivals() -> anyhow::Result<()> {
    let probes = vec![Probe::new(
        "processed",
        Stat::ObservedMax(NetId::new(1), PlaceId::new(1)),
    )];
    let opts = MonteCarloOpts::builder()
        .horizon(10_000.0)
        .runs(20)
        .rng(RngPolicy::PerRun { seed: Some(1) })
        .build();
    let summary = monte_carlo(|| fed_pipeline(40.0), &probes, &opts)?;
    let processed = summary.mean("processed").unwrap_or_default();
    assert!((processed - 250.0).abs() < 25.0, "processed {processed}");
    assert_eq!(summary.stalled, 0);
    Ok(())
}

#[test]
fn saturated_pipeline_is_limited_by_its_channels() -> anyhow::Result<()> {
    let probes = vec![
        Probe::new("processed", Stat::Marking(NetId::new(1), PlaceId::new(1))),
        Probe::new("busy", Stat::MeanBuffer(NetId::new(1), TransitionId::ZERO)),
    ];
    let opts = MonteCarloOpts::builder()
        .horizon(10_000.0)
        .runs(20)
        .rng(RngPolicy::PerRun { seed: Some(2) })
        .build();
    let summary = monte_carlo(|| fed_pipeline(10.0), &probes, &opts)?;
    let processed = summary.mean("processed").unwrap_or_default();
    assert!((processed - 500.0).abs() < 50.0, "processed {processed}");
    let busy = summary.mean("busy").unwrap_or_default();
    assert!(busy > 2.8 && busy < 3.0 + 1e-9, "busy {busy}");
    Ok(())
}

#[test]
fn seeded_runs_repeat_exactly() -> anyhow::Result<()> {
    let once = |seed| -> anyhow::Result<_> {
        Ok(run(fed_pipeline(10.0)?, 500.0, &mut StdRng::seed_from_u64(seed))?)
    };
    assert_eq!(once(9)?, once(9)?);
    assert_ne!(once(9)?, once(10)?);
    Ok(())
}
