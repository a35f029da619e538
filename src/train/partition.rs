/// Consecutive, non-overlapping chunks of `size` items; the last chunk may be
/// shorter. Single pass: re-create it to iterate again.
#[derive(Debug, Clone)]
pub struct Minibatches<'a, T> {
    items: &'a [T],
    size: usize,
    cursor: usize,
}

/// Splits `items` into minibatches of `size`.
///
/// # Panics
/// Panics if `size == 0`.
pub fn partition<T>(items: &[T], size: usize) -> Minibatches<'_, T> {
    assert!(size > 0, "minibatch size must be at least 1");
    Minibatches { items, size, cursor: 0 }
}

impl<'a, T> Iterator for Minibatches<'a, T> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.items.len() {
            return None;
        }
        let end = (self.cursor + self.size).min(self.items.len());
        let batch = &self.items[self.cursor..end];
        self.cursor = end;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.items.len() - self.cursor).div_ceil(self.size);
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for Minibatches<'_, T> {}

/// Fires once each time the consumed-example count crosses a multiple of
/// `every`. `every == 0` never fires.
#[derive(Debug, Clone)]
pub struct ProgressCadence {
    every: usize,
    last_mark: usize,
}

impl ProgressCadence {
    pub fn new(every: usize) -> ProgressCadence {
        ProgressCadence { every, last_mark: 0 }
    }

    pub fn advance(&mut self, consumed: usize) -> bool {
        if self.every == 0 {
            return false;
        }
        let mark = consumed / self.every;
        if mark > self.last_mark {
            self.last_mark = mark;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn last_batch_is_shorter() {
        let items: Vec<usize> = (0..7).collect();
        let batches: Vec<&[usize]> = partition(&items, 3).collect();
        assert_eq!(batches, vec![&[0, 1, 2][..], &[3, 4, 5][..], &[6][..]]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        let items: Vec<u8> = vec![];
        assert_eq!(partition(&items, 4).count(), 0);
    }

    #[test]
    #[should_panic(expected = "at least 1")]
    fn zero_size_panics() {
        let _ = partition(&[1, 2, 3], 0);
    }

    #[test]
    fn cadence_fires_once_per_boundary() {
        let mut cadence = ProgressCadence::new(1000);
        let fired: Vec<bool> = [128, 896, 1024, 1152, 2048, 5000]
            .iter()
            .map(|&c| cadence.advance(c))
            .collect();
        assert_eq!(fired, vec![false, false, true, false, true, true]);
        assert!(!ProgressCadence::new(0).advance(10_000));
    }

    proptest! {
        #[test]
        fn batches_cover_the_input_exactly_once(n in 0usize..300, size in 1usize..40) {
            let items: Vec<usize> = (0..n).collect();
            let batches = partition(&items, size);
            prop_assert_eq!(batches.len(), n.div_ceil(size));

            let batches: Vec<&[usize]> = batches.collect();
            prop_assert_eq!(batches.len(), n.div_ceil(size));
            prop_assert_eq!(batches.iter().map(|b| b.len()).sum::<usize>(), n);
            prop_assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= size));

            let flattened: Vec<usize> = batches.concat();
            prop_assert_eq!(flattened, items);
        }
    }
}
