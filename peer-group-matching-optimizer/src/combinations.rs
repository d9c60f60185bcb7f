use itertools::Itertools;

/// At most `cap` subsets of `size` items in lexicographic index order, so
/// `[a, b, c]` with size 2 yields `[a, b]`, `[a, c]`, `[b, c]`.
pub fn bounded_combinations<T: Clone>(
    items: &[T],
    size: usize,
    cap: usize,
) -> impl Iterator<Item = Vec<T>> + '_ {
    // itertools yields one empty combination for size 0, groups are never empty
    let size = if size == 0 || size > items.len() {
        None
    } else {
        Some(size)
    };
    size.into_iter()
        .flat_map(move |size| items.iter().cloned().combinations(size))
        .take(cap)
}

/// Candidate groups for one peer, largest sizes first and each size bounded by
/// `cap_for(size)`.
pub fn candidate_groups<'a, T: Clone>(
    items: &'a [T],
    max_size: usize,
    cap_for: impl Fn(usize) -> usize + 'a,
) -> impl Iterator<Item = Vec<T>> + 'a {
    (1..=max_size.min(items.len()))
        .rev()
        .flat_map(move |size| bounded_combinations(items, size, cap_for(size)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexicographic_order() {
        let combinations: Vec<_> = bounded_combinations(&['a', 'b', 'c', 'd'], 2, 100).collect();
        assert_eq!(
            combinations,
            vec![
                vec!['a', 'b'],
                vec!['a', 'c'],
                vec!['a', 'd'],
                vec!['b', 'c'],
                vec!['b', 'd'],
                vec!['c', 'd'],
            ]
        );
    }

    #[test]
    fn respects_cap() {
        let items: Vec<u32> = (0..20).collect();
        assert_eq!(bounded_combinations(&items, 4, 50).count(), 50);
        assert_eq!(bounded_combinations(&items, 1, 100).count(), 20);
        assert_eq!(bounded_combinations(&items, 3, 0).count(), 0);
    }

    #[test]
    fn degenerate_sizes_yield_nothing() {
        assert_eq!(bounded_combinations(&[1, 2], 0, 10).count(), 0);
        assert_eq!(bounded_combinations(&[1, 2], 3, 10).count(), 0);
        assert_eq!(bounded_combinations::<u8>(&[], 1, 10).count(), 0);
    }

    #[test]
    fn candidate_groups_go_from_large_to_small() {
        let groups: Vec<_> = candidate_groups(&[1, 2, 3], 4, |size| if size == 2 { 1 } else { 10 })
            .collect();
        assert_eq!(
            groups,
            vec![vec![1, 2, 3], vec![1, 2], vec![1], vec![2], vec![3]]
        );
    }
}
