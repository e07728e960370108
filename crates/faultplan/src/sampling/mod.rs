pub mod site_lookup;
pub mod thread_sampler;

pub use site_lookup::{CumulativeCounts, SiteIndex};
pub use thread_sampler::ThreadDraws;

/// A uniform draw from `[0, 1)`.
#[inline]
pub fn seed<R>(rng: &mut R) -> f64
where
    R: rand::Rng + ?Sized,
{
    rng.random::<f64>()
}
