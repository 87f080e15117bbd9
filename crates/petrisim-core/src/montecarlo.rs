//! Repeated independent runs. Every run gets a freshly built model and a fresh engine; the only
//! state that can carry over between runs is a shared random stream, if one is requested.

use std::collections::BTreeMap;

use rand::prelude::*;
use rayon::prelude::*;

use crate::engine::SimulationEngine;
use crate::model::CompositeModel;
use crate::opts::{MonteCarloOpts, RngPolicy};
use crate::stats::{Probe, RunningMean};
use crate::Error;

/// Averaged probe values over a batch of runs.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Summary {
    pub runs: usize,
    /// Runs that stalled before the horizon.
    pub stalled: usize,
    pub estimates: BTreeMap<String, Estimate>,
}

impl Summary {
    /// The averaged value of the probe called `name`.
    pub fn mean(&self, name: &str) -> Option<f64> {
        self.estimates.get(name).map(|e| e.mean)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Estimate {
    pub mean: f64,
    /// Sample standard deviation across runs.
    pub std_dev: f64,
}

#[derive(Debug)]
struct Sample {
    stalled: bool,
    values: Vec<f64>,
}

/// Builds and runs a model `opts.runs` times and averages each probe over the runs.
///
/// Probes are reported by name; if two probes share a name, the later one wins. Per-run streams
/// are derived from the seeder in run order and folded back in run order, so a seeded batch gives
/// the same summary whether or not it runs in parallel.
pub fn monte_carlo<B>(builder: B, probes: &[Probe], opts: &MonteCarloOpts) -> Result<Summary, Error>
where
    B: Fn() -> Result<CompositeModel, Error> + Sync,
{
    log::info!(
        "Running {} simulations to t={} ({:?})",
        opts.runs,
        opts.horizon,
        opts.rng
    );
    let samples = match opts.rng {
        RngPolicy::Shared { seed } => {
            let mut rng = seeded(seed);
            (0..opts.runs)
                .map(|run| simulate(run, &builder, probes, opts, &mut rng))
                .collect::<Result<Vec<_>, _>>()?
        }
        RngPolicy::PerRun { seed } => {
            let mut seeder = seeded(seed);
            let seeds = (0..opts.runs)
                .map(|run| (run, seeder.next_u64()))
                .collect::<Vec<_>>();
            let one = |(run, seed): (usize, u64)| {
                let mut rng = StdRng::seed_from_u64(seed);
                simulate(run, &builder, probes, opts, &mut rng)
            };
            if opts.parallel {
                seeds.into_par_iter().map(one).collect::<Result<Vec<_>, _>>()?
            } else {
                seeds.into_iter().map(one).collect::<Result<Vec<_>, _>>()?
            }
        }
    };

    let mut acc = vec![RunningMean::default(); probes.len()];
    let mut stalled = 0;
    for sample in &samples {
        stalled += usize::from(sample.stalled);
        for (a, &x) in acc.iter_mut().zip(&sample.values) {
            a.push(x);
        }
    }
    let estimates = probes
        .iter()
        .zip(acc)
        .map(|(probe, a)| {
            let estimate = Estimate {
                mean: a.mean(),
                std_dev: a.std_dev(),
            };
            (probe.name().to_owned(), estimate)
        })
        .collect();
    log::info!("Finished {} simulations ({stalled} stalled)", samples.len());
    Ok(Summary {
        runs: samples.len(),
        stalled,
        estimates,
    })
}

fn simulate<B, R>(
    run: usize,
    builder: &B,
    probes: &[Probe],
    opts: &MonteCarloOpts,
    rng: &mut R,
) -> Result<Sample, Error>
where
    B: Fn() -> Result<CompositeModel, Error>,
    R: Rng + ?Sized,
{
    let model = builder()?;
    let result = SimulationEngine::new(model).run(&opts.engine_opts(), rng)?;
    let stalled = result.is_stalled();
    if stalled {
        log::warn!("run {run} stalled: {:?}", result.outcome);
    }
    let result = if opts.tolerate_stalls {
        result
    } else {
        result.require_horizon()?
    };
    let values = probes
        .iter()
        .map(|p| p.observe(&result))
        .collect::<Result<Vec<_>, _>>()?;
    log::debug!("run {run}: {values:?}");
    Ok(Sample { stalled, values })
}

fn seeded(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

#[cfg(test)]
mod tests {
    use crate::delay::DelayKind;
    use crate::ident::{NetId, PlaceId, TransitionId};
    use crate::stats::Stat;
    use crate::testing;

    use super::*;

    fn probes() -> Vec<Probe> {
        let n0 = NetId::ZERO;
        vec![
            Probe::new("earned", Stat::ObservedMax(n0, PlaceId::new(5))),
            Probe::new("queue", Stat::Mean(n0, PlaceId::new(2))),
            Probe::new("in flight", Stat::Buffer(n0, TransitionId::new(3))),
        ]
    }

    fn opts(rng: RngPolicy, parallel: bool) -> MonteCarloOpts {
        MonteCarloOpts::builder()
            .horizon(600.0)
            .runs(8)
            .rng(rng)
            .parallel(parallel)
            .build()
    }

    fn builder() -> Result<CompositeModel, Error> {
        testing::bus_like_model(DelayKind::Exponential)
    }

    #[test]
    fn seeded_batches_are_reproducible() -> anyhow::Result<()> {
        let policy = RngPolicy::PerRun { seed: Some(42) };
        let a = monte_carlo(builder, &probes(), &opts(policy, true))?;
        let b = monte_carlo(builder, &probes(), &opts(policy, true))?;
        assert_eq!(a, b);
        assert_eq!(a.runs, 8);
        Ok(())
    }

    #[test]
    fn parallel_matches_sequential() -> anyhow::Result<()> {
        let policy = RngPolicy::PerRun { seed: Some(7) };
        let par = monte_carlo(builder, &probes(), &opts(policy, true))?;
        let seq = monte_carlo(builder, &probes(), &opts(policy, false))?;
        assert_eq!(par, seq);
        Ok(())
    }

    #[test]
    fn shared_stream_differs_from_per_run_streams() -> anyhow::Result<()> {
        let shared = monte_carlo(
            builder,
            &probes(),
            &opts(RngPolicy::Shared { seed: Some(7) }, false),
        )?;
        let again = monte_carlo(
            builder,
            &probes(),
            &opts(RngPolicy::Shared { seed: Some(7) }, false),
        )?;
        let per_run = monte_carlo(
            builder,
            &probes(),
            &opts(RngPolicy::PerRun { seed: Some(7) }, false),
        )?;
        assert_eq!(shared, again);
        assert_ne!(shared, per_run);
        Ok(())
    }

    #[test]
    fn custom_probes_see_the_run_result() -> anyhow::Result<()> {
        let probes = vec![Probe::custom("horizon", |r| Ok(r.horizon))];
        let summary = monte_carlo(builder, &probes, &opts(RngPolicy::default(), true))?;
        assert_eq!(summary.mean("horizon"), Some(600.0));
        assert_eq!(summary.estimates["horizon"].std_dev, 0.0);
        Ok(())
    }

    #[test]
    fn stalled_runs_are_counted_or_rejected() -> anyhow::Result<()> {
        let single = || Ok(CompositeModel::new(vec![testing::single_shot("Once", 5.0)]));
        let probes = vec![Probe::new(
            "sink",
            Stat::Marking(NetId::ZERO, PlaceId::new(1)),
        )];
        let tolerant = MonteCarloOpts::builder().horizon(12.0).runs(3).build();
        let summary = monte_carlo(single, &probes, &tolerant)?;
        assert_eq!(summary.stalled, 3);
        assert_eq!(summary.mean("sink"), Some(1.0));

        let strict = MonteCarloOpts::builder()
            .horizon(12.0)
            .runs(3)
            .tolerate_stalls(false)
            .build();
        let res = monte_carlo(single, &probes, &strict);
        assert!(matches!(res, Err(Error::SimulationStalled { .. })));
        Ok(())
    }

    #[test]
    fn unknown_statistic_fails() {
        let probes = vec![Probe::new("nope", Stat::Mean(NetId::new(5), PlaceId::ZERO))];
        let res = monte_carlo(builder, &probes, &opts(RngPolicy::default(), false));
        assert!(matches!(res, Err(Error::Stat(..))));
    }

    #[test]
    fn construction_errors_propagate() {
        let broken = || -> Result<CompositeModel, Error> {
            let t = crate::net::Transition::new("Bad", -1.0)?;
            let net = crate::net::Net::new("Bad", vec![], vec![t], vec![], vec![])?;
            Ok(CompositeModel::new(vec![net]))
        };
        let res = monte_carlo(broken, &[], &opts(RngPolicy::default(), true));
        assert!(matches!(res, Err(Error::InvalidTimeDelay(..))));
    }
}
