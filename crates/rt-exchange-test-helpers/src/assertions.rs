//! Assertions for values observed across an exchange.

/// Assert that a sequence is strictly increasing.
///
/// A consumer that pops sequence numbers from a last-write-wins exchange may skip
/// values but must never see one twice or go backwards.
///
/// # Example
///
/// ```rust
/// use rt_exchange_test_helpers::assert_monotonic;
///
/// assert_monotonic!(&[1, 2, 5, 9]);
/// ```
#[macro_export]
macro_rules! assert_monotonic {
    ($collection:expr $(,)?) => {
        let collection = $collection;
        let mut iter = collection.iter();
        if let Some(mut prev) = iter.next() {
            for (i, curr) in iter.enumerate() {
                if prev >= curr {
                    panic!(
                        "assertion failed: sequence is not strictly increasing\n  at index {}: {:?} >= {:?}",
                        i + 1,
                        prev,
                        curr
                    );
                }
                prev = curr;
            }
        }
    };
}

/// Assert that every observed value was produced.
///
/// # Example
///
/// ```rust
/// use rt_exchange_test_helpers::assert_all_within;
///
/// assert_all_within!(&[3, 7, 2], 0..10);
/// ```
#[macro_export]
macro_rules! assert_all_within {
    ($collection:expr, $range:expr $(,)?) => {
        let range = $range;
        for (i, value) in $collection.iter().enumerate() {
            if !range.contains(value) {
                panic!(
                    "assertion failed: value at index {} out of range\n  value: {:?}\n  range: {:?}",
                    i, value, range
                );
            }
        }
    };
}

/// Assert that a [`Tracked`](crate::Tracked) value was not torn by a concurrent copy.
///
/// # Example
///
/// ```rust
/// use rt_exchange_test_helpers::{assert_intact, Tracked};
///
/// assert_intact!(Tracked::new(4));
/// ```
#[macro_export]
macro_rules! assert_intact {
    ($tracked:expr $(,)?) => {
        let tracked = &$tracked;
        if !tracked.is_intact() {
            panic!("assertion failed: torn value {:?}", tracked);
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::Tracked;

    #[test]
    fn test_assert_monotonic_pass() {
        assert_monotonic!(&[1, 2, 3, 10]);
        assert_monotonic!(&Vec::<u64>::new());
        assert_monotonic!(&[42]);
    }

    #[test]
    #[should_panic(expected = "not strictly increasing")]
    fn test_assert_monotonic_fail_duplicates() {
        assert_monotonic!(&[1, 2, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "not strictly increasing")]
    fn test_assert_monotonic_fail_decreasing() {
        assert_monotonic!(&[3, 2]);
    }

    #[test]
    fn test_assert_all_within_pass() {
        assert_all_within!(&[0u32, 5, 9], 0..10);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_assert_all_within_fail() {
        assert_all_within!(&[0u32, 10], 0..10);
    }

    #[test]
    fn test_assert_intact_pass() {
        assert_intact!(Tracked::new(11));
    }
}
