//! Scout level arithmetic.

/// Level after adding `delta` to `current`, clamped at `max`.
///
/// Levels never decrease: a level already above `max` (after the maximum
/// was lowered) is left unchanged.
pub fn raise_level(current: u64, delta: u64, max: u64) -> u64 {
    current.max(current.saturating_add(delta).min(max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn adds_below_cap() {
        assert_eq!(raise_level(1, 1, 10), 2);
        assert_eq!(raise_level(2, 5, 10), 7);
    }

    #[test]
    fn clamps_at_cap() {
        assert_eq!(raise_level(8, 5, 10), 10);
        assert_eq!(raise_level(10, 1, 10), 10);
        assert_eq!(raise_level(u64::MAX - 1, 5, u64::MAX), u64::MAX);
    }

    #[test]
    fn never_lowers_after_cap_reduction() {
        assert_eq!(raise_level(7, 1, 3), 7);
        assert_eq!(raise_level(1, 0, 0), 1);
    }

    proptest! {
        #[test]
        fn stays_within_bounds(current in 1u64..1_000, delta in 0u64..1_000, max in 1u64..1_000) {
            let next = raise_level(current, delta, max);
            prop_assert!(next >= current);
            prop_assert!(next <= current.max(max));
        }
    }
}
