//! Deterministic frame subset selection

/// Picks `count` evenly spaced indices out of `total`.
///
/// The first and last index are always included once `count >= 2`; a single
/// pick is always index 0. Asking for at least `total` frames yields every index.
pub fn select_indices(total: usize, count: usize) -> Vec<usize> {
    if count == 0 || total == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![0];
    }
    if count >= total {
        return (0..total).collect();
    }

    let last = total - 1;
    let steps = count - 1;
    (0..count).map(|i| i * last / steps).collect()
}

/// Selects a representative subsequence of `count` frames
pub fn select<F>(frames: &[F], count: usize) -> Vec<&F> {
    select_indices(frames.len(), count)
        .into_iter()
        .map(|i| &frames[i])
        .collect()
}
