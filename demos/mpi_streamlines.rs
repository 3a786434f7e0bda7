//! Trace streamlines on every MPI rank and write the joint statistics report.

use ic_advect::{
    algorithm::IcAlgorithm,
    comm::MpiCollective,
    config::AlgorithmConfig,
    geometry::PhysicalBox,
    provider::DomainProvider,
    scheduler::SerialScheduler,
    tools::{generate_random_seeds, seeded_rng},
    uniform::{UniformFieldProvider, VelocityField},
};
use mpi::traits::Communicator;

pub fn main() {
    // Initialise MPI
    let universe = mpi::initialize().unwrap();

    // Get the world communicator
    let world = universe.world();
    let comm = MpiCollective::new(&world);

    let rank = world.rank() as usize;
    let nseeds = 100;

    let mut provider = UniformFieldProvider::new(
        4,
        VelocityField::Vortex {
            center: [0.5, 0.5],
            angular_speed: 2.0,
        },
    )
    .with_steps(0.01, 1000)
    .with_cache(8);

    // Seeds are numbered consecutively across ranks.
    let seed_box = PhysicalBox::new([0.1, 0.1, 0.0, 0.9, 0.9, 1.0]);
    let mut seeds = generate_random_seeds(
        nseeds,
        &seed_box,
        0.0,
        rank * nseeds,
        &mut seeded_rng(rank),
    );
    for seed in seeds.iter_mut() {
        provider.set_domain(seed);
    }

    let config = AlgorithmConfig::default().with_report_dir("ic_reports");
    let mut algo = IcAlgorithm::new(provider, &comm, config);
    algo.initialize(seeds);
    algo.execute(&mut SerialScheduler::new());
    algo.post_execute().unwrap();

    if rank == 0 {
        println!("Reports written to ic_reports/.");
    }
}
