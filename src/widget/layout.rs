//! Flex partitioning.

/// Layout axis for a widget's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Children stacked top to bottom
    #[default]
    Vertical,
    /// Children side by side, left to right
    Horizontal,
}

/// Start offsets of each child plus the total length as the final entry.
///
/// Offsets come from cumulative weight sums, `offset_i = (w_0 + .. + w_{i-1}) * length / total`,
/// so rounding is deterministic and the last offset is always exactly `length`.
/// When every weight is zero the children share the space equally.
pub fn flex_offsets(weights: &[u16], length: u16) -> Vec<u16> {
    let total: u64 = weights.iter().map(|&w| u64::from(w)).sum();
    let weight_of = |w: u16| if total == 0 { 1 } else { u64::from(w) };
    let total = if total == 0 {
        weights.len() as u64
    } else {
        total
    };

    let mut offsets = Vec::with_capacity(weights.len() + 1);
    offsets.push(0);
    let mut acc = 0u64;
    for &w in weights {
        acc += weight_of(w);
        offsets.push((acc * u64::from(length) / total) as u16);
    }
    offsets
}

/// Extent of each child along the layout axis.
pub fn flex_extents(weights: &[u16], length: u16) -> Vec<u16> {
    flex_offsets(weights, length)
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .collect()
}
