//! Trace streamlines through a vortex on a single process and print the report.

use ic_advect::{
    algorithm::IcAlgorithm,
    comm::SingleProcess,
    config::AlgorithmConfig,
    geometry::PhysicalBox,
    provider::DomainProvider,
    scheduler::SerialScheduler,
    tools::{generate_random_seeds, seeded_rng},
    uniform::{UniformFieldProvider, VelocityField},
};

pub fn main() {
    let comm = SingleProcess;

    // Four blocks per axis, a cache that holds a quarter of them.
    let mut provider = UniformFieldProvider::new(
        4,
        VelocityField::Vortex {
            center: [0.5, 0.5],
            angular_speed: 1.0,
        },
    )
    .with_steps(0.01, 500)
    .with_cache(16)
    .with_work_group_size(64)
    .with_max_count(1000);

    // Seeds in the inner region so that most curves stay in the dataset.
    let seed_box = PhysicalBox::new([0.2, 0.2, 0.0, 0.8, 0.8, 1.0]);
    let mut seeds = generate_random_seeds(200, &seed_box, 0.0, 0, &mut seeded_rng(0));
    for seed in seeds.iter_mut() {
        provider.set_domain(seed);
    }

    let mut algo = IcAlgorithm::new(provider, &comm, AlgorithmConfig::default());
    algo.initialize(seeds);
    algo.execute(&mut SerialScheduler::new());

    let mut report = Vec::new();
    algo.report_statistics_to(&mut report).unwrap();
    print!("{}", String::from_utf8_lossy(&report));

    algo.post_execute().unwrap();

    let curves = algo.provider().curves();
    let steps = curves.iter().map(|curve| curve.steps()).sum::<usize>();
    println!("Traced {} curves with {} steps.", curves.len(), steps);
}
