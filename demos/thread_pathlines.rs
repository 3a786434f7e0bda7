//! Trace pathlines over several time slices on a group of threads.
//!
//! Every thread acts as one process with its own seeds. Reports are written
//! to `ic_reports/`.

use std::thread;

use ic_advect::{
    algorithm::IcAlgorithm,
    comm::{Collective, ThreadGroup},
    config::AlgorithmConfig,
    geometry::PhysicalBox,
    provider::DomainProvider,
    scheduler::SerialScheduler,
    tools::{generate_random_seeds, seeded_rng},
    uniform::{UniformFieldProvider, VelocityField},
};

pub fn main() {
    let nranks = 4;
    let nseeds = 50;

    let handles = ThreadGroup::create(nranks)
        .into_iter()
        .map(|comm| {
            thread::spawn(move || {
                let mut provider =
                    UniformFieldProvider::new(3, VelocityField::Constant([0.1, 0.05, 0.0]))
                        .with_time_slices(4, 0.5)
                        .with_steps(0.02, 10_000)
                        .with_cache(9);

                let mut seeds = generate_random_seeds(
                    nseeds,
                    &PhysicalBox::new([0.0, 0.0, 0.0, 0.7, 0.8, 1.0]),
                    0.0,
                    comm.rank() * nseeds,
                    &mut seeded_rng(comm.rank()),
                );
                for seed in seeds.iter_mut() {
                    provider.set_domain(seed);
                }

                let last_slice = provider.num_time_slices() - 1;
                let config = AlgorithmConfig::default().with_report_dir("ic_reports");

                let mut algo = IcAlgorithm::new(provider, &comm, config);
                algo.initialize(seeds);
                let reached = algo.execute_time_slices(&mut SerialScheduler::new(), 0, last_slice);
                algo.post_execute().unwrap();

                (comm.rank(), reached, algo.provider().curves().len())
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        let (rank, reached, ncurves) = handle.join().unwrap();
        println!(
            "Rank {}: {} curves finished in time slice {}.",
            rank, ncurves, reached
        );
    }
}
