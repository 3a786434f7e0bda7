//! Utility routines.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    curve::IntegralCurve,
    geometry::PhysicalBox,
    types::CurveId,
};

/// Generate `nseeds` curves uniformly distributed in `bounding_box`.
///
/// Ids are consecutive starting at `first_id`. The curves carry no block;
/// a provider assigns one through [crate::provider::DomainProvider::set_domain].
pub fn generate_random_seeds<R: Rng>(
    nseeds: usize,
    bounding_box: &PhysicalBox,
    time: f64,
    first_id: CurveId,
    rng: &mut R,
) -> Vec<IntegralCurve> {
    let mut seeds = Vec::<IntegralCurve>::with_capacity(nseeds);

    for index in 0..nseeds {
        let point = bounding_box.reference_to_physical([rng.gen(), rng.gen(), rng.gen()]);
        seeds.push(IntegralCurve::new(first_id + index, point, time));
    }

    seeds
}

/// Get a seeded rng
pub fn seeded_rng(seed: usize) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed as u64)
}

#[cfg(test)]
mod test {
    use super::{generate_random_seeds, seeded_rng};
    use crate::geometry::PhysicalBox;

    #[test]
    fn test_random_seeds() {
        let bounding_box = PhysicalBox::new([-1.0, 0.0, 2.0, 1.0, 0.5, 3.0]);
        let mut rng = seeded_rng(0);

        let seeds = generate_random_seeds(50, &bounding_box, 0.25, 100, &mut rng);

        assert_eq!(seeds.len(), 50);
        for (index, seed) in seeds.iter().enumerate() {
            assert_eq!(seed.id(), 100 + index);
            assert_eq!(seed.time, 0.25);
            assert!(bounding_box.contains(&seed.location));
            assert!(seed.current_block().is_none());
        }

        // Same seed, same points.
        let again = generate_random_seeds(50, &bounding_box, 0.25, 100, &mut seeded_rng(0));
        for (a, b) in seeds.iter().zip(&again) {
            assert_eq!(a.location, b.location);
        }
    }
}
