/// An iterator which returns `count` numbers from `0..live_threads`, drawn independently and
/// uniformly.
///
/// Values may repeat; every draw is made with replacement. Nothing is returned when there are no
/// live threads.
pub struct ThreadDraws<'r, R: ?Sized> {
    /// See [`Self::new`].
    live_threads: u32,
    remaining: usize,
    rng: &'r mut R,
}

impl<'r, R> ThreadDraws<'r, R>
where
    R: rand::Rng + ?Sized,
{
    /// The returned thread indices will be from a [`std::ops::Range`] of `0..live_threads`.
    pub fn new(live_threads: u32, count: usize, rng: &'r mut R) -> Self {
        Self {
            live_threads,
            remaining: if live_threads == 0 { 0 } else { count },
            rng,
        }
    }
}

impl<R> Iterator for ThreadDraws<'_, R>
where
    R: rand::Rng + ?Sized,
{
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        Some(self.rng.random_range(0..self.live_threads))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<R> ExactSizeIterator for ThreadDraws<'_, R> where R: rand::Rng + ?Sized {}
