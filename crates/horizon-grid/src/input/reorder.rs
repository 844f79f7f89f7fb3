//! Drop-target computation for column drags.

/// Pick the drop target for a dragged column.
///
/// `spans` are `(left, width)` of every visible column in content space.
/// The ghost is the dragged column shifted by `dx`. A column is a candidate
/// when the ghost covers more than `overlap_ratio` of its width; among
/// candidates the leftmost wins when dragging left and the rightmost when
/// dragging right. The dragged column itself is never a candidate.
pub fn compute_reorder_target(
    spans: &[(f32, f32)],
    dragged: usize,
    dx: f32,
    overlap_ratio: f32,
) -> Option<usize> {
    let &(left, width) = spans.get(dragged)?;
    let ghost_left = left + dx;
    let ghost_right = ghost_left + width;

    let mut candidates = spans.iter().enumerate().filter(|&(index, &(l, w))| {
        if index == dragged || w <= 0.0 {
            return false;
        }
        let overlap = ghost_right.min(l + w) - ghost_left.max(l);
        overlap > w * overlap_ratio
    });

    if dx < 0.0 {
        candidates.next().map(|(index, _)| index)
    } else {
        candidates.last().map(|(index, _)| index)
    }
}

/// Content-space spans of columns given their widths.
pub fn column_spans(widths: impl IntoIterator<Item = f32>) -> Vec<(f32, f32)> {
    let mut left = 0.0;
    widths
        .into_iter()
        .map(|width| {
            let span = (left, width);
            left += width;
            span
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans() -> Vec<(f32, f32)> {
        column_spans([100.0; 4])
    }

    #[test]
    fn test_drag_right_picks_rightmost_overlap() {
        // Ghost 160..260 covers 40 of column 1 and 60 of column 2.
        assert_eq!(compute_reorder_target(&spans(), 0, 160.0, 0.3), Some(2));
    }

    #[test]
    fn test_drag_left_picks_leftmost_overlap() {
        // Ghost of column 3 at 140..240 covers 60 of column 1 and 40 of column 2.
        assert_eq!(compute_reorder_target(&spans(), 3, -160.0, 0.3), Some(1));
    }

    #[test]
    fn test_small_overlap_is_ignored() {
        // Exactly 30% is not enough.
        assert_eq!(compute_reorder_target(&spans(), 0, 30.0, 0.3), None);
        assert_eq!(compute_reorder_target(&spans(), 0, 31.0, 0.3), Some(1));
    }

    #[test]
    fn test_out_of_range_dragged() {
        assert_eq!(compute_reorder_target(&spans(), 9, 50.0, 0.3), None);
    }
}
