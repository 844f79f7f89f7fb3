//! Viewport and virtualization math.
//!
//! The grid surface is split into four regions: the corner, the column
//! header strip along the top, the row header strip along the left, and the
//! body. Horizontally the body is further split into a frozen band holding
//! pinned columns, which never scrolls, and a scrollable band.
//!
//! Two coordinate spaces are used:
//!
//! - **Screen space**: relative to the surface's top-left corner.
//! - **Content space**: x measured from the left edge of the first visible
//!   column (pinned columns first), y from the top of the first view row.
//!   Scroll offsets only apply to the scrollable band horizontally and to
//!   rows vertically.

use std::ops::Range;

use horizon_grid_core::logging::targets;
use serde::{Deserialize, Serialize};

use crate::config::Theme;
use crate::geometry::Rect;
use crate::model::Column;
use crate::selection::SelectionRange;

/// Rows and columns intersecting the visible area.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VisibleRange {
    /// Visible view row indices.
    pub rows: Range<usize>,
    /// Visual indices of visible scrollable columns, in order.
    pub visible_columns: Vec<usize>,
    /// Visual indices of pinned columns (never culled).
    pub pinned_columns: Vec<usize>,
    /// First visible view row.
    pub row_start_index: usize,
    /// Scrollable-band width before the first visible scrollable column.
    pub scrollable_grid_x: f32,
    /// Total width of pinned columns.
    pub frozen_width: f32,
}

impl VisibleRange {
    /// All visible column indices, pinned first.
    pub fn columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.pinned_columns
            .iter()
            .chain(self.visible_columns.iter())
            .copied()
    }
}

/// Scroll position, visible size and layout metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    scroll_left: f32,
    scroll_top: f32,
    width: f32,
    height: f32,
    row_height: f32,
    header_height: f32,
    row_header_width: f32,
    overscroll: f32,
    /// Total width of visible unpinned columns.
    content_width: f32,
    /// Total height of all view rows.
    content_height: f32,
    /// Total width of visible pinned columns.
    frozen_width: f32,
}

impl Viewport {
    /// Create a viewport of `width` × `height` with the given metrics.
    pub fn new(theme: &Theme, overscroll: f32, width: f32, height: f32) -> Self {
        Self {
            scroll_left: 0.0,
            scroll_top: 0.0,
            width: width.max(0.0),
            height: height.max(0.0),
            row_height: theme.row_height,
            header_height: theme.header_height,
            row_header_width: theme.row_header_width,
            overscroll,
            content_width: 0.0,
            content_height: 0.0,
            frozen_width: 0.0,
        }
    }

    #[inline]
    pub fn scroll_left(&self) -> f32 {
        self.scroll_left
    }

    #[inline]
    pub fn scroll_top(&self) -> f32 {
        self.scroll_top
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }

    #[inline]
    pub fn row_height(&self) -> f32 {
        self.row_height
    }

    #[inline]
    pub fn header_height(&self) -> f32 {
        self.header_height
    }

    #[inline]
    pub fn row_header_width(&self) -> f32 {
        self.row_header_width
    }

    #[inline]
    pub fn frozen_width(&self) -> f32 {
        self.frozen_width
    }

    #[inline]
    pub fn content_width(&self) -> f32 {
        self.content_width
    }

    #[inline]
    pub fn content_height(&self) -> f32 {
        self.content_height
    }

    /// Height available to rows.
    pub fn body_height(&self) -> f32 {
        (self.height - self.header_height).max(0.0)
    }

    /// Width of the scrollable band.
    pub fn band_width(&self) -> f32 {
        (self.width - self.row_header_width - self.frozen_width).max(0.0)
    }

    /// Number of whole rows that fit in the body.
    pub fn page_rows(&self) -> usize {
        ((self.body_height() / self.row_height).floor() as usize).max(1)
    }

    pub fn max_scroll_left(&self) -> f32 {
        (self.content_width + self.overscroll - self.band_width()).max(0.0)
    }

    pub fn max_scroll_top(&self) -> f32 {
        (self.content_height - self.body_height()).max(0.0)
    }

    /// Update content extents after rows or columns changed. Re-clamps the
    /// scroll offsets; returns `true` if they moved.
    pub fn set_content(&mut self, row_count: usize, columns: &[&Column]) -> bool {
        self.frozen_width = columns
            .iter()
            .filter(|c| c.is_pinned())
            .map(|c| c.width)
            .sum();
        self.content_width = columns
            .iter()
            .filter(|c| !c.is_pinned())
            .map(|c| c.width)
            .sum();
        self.content_height = row_count as f32 * self.row_height;
        self.set_scroll(self.scroll_left, self.scroll_top)
    }

    /// Resize the visible area. Returns `true` if the size changed.
    pub fn set_size(&mut self, width: f32, height: f32) -> bool {
        let (width, height) = (width.max(0.0), height.max(0.0));
        if width == self.width && height == self.height {
            return false;
        }
        self.width = width;
        self.height = height;
        self.set_scroll(self.scroll_left, self.scroll_top);
        true
    }

    /// Scroll to an absolute position, clamped. Returns `true` if it moved.
    pub fn set_scroll(&mut self, left: f32, top: f32) -> bool {
        let left = if left.is_nan() { 0.0 } else { left };
        let top = if top.is_nan() { 0.0 } else { top };
        let left = left.clamp(0.0, self.max_scroll_left());
        let top = top.clamp(0.0, self.max_scroll_top());
        if left == self.scroll_left && top == self.scroll_top {
            return false;
        }
        tracing::trace!(target: targets::VIEWPORT, left, top, "scrolled");
        self.scroll_left = left;
        self.scroll_top = top;
        true
    }

    /// Scroll by a delta, clamped. Returns `true` if it moved.
    pub fn scroll_by(&mut self, dx: f32, dy: f32) -> bool {
        self.set_scroll(self.scroll_left + dx, self.scroll_top + dy)
    }

    /// Compute the rows and columns intersecting the visible area.
    ///
    /// `columns` are the visible columns in visual order, pinned first.
    pub fn calculate_visible_range(&self, row_count: usize, columns: &[&Column]) -> VisibleRange {
        let start = ((self.scroll_top / self.row_height).floor() as usize).min(row_count);
        let end = if self.body_height() > 0.0 {
            let bottom = self.scroll_top + self.body_height();
            ((bottom / self.row_height).ceil() as usize).min(row_count)
        } else {
            start
        };

        let pinned_count = columns.iter().take_while(|c| c.is_pinned()).count();
        let pinned_columns: Vec<usize> = (0..pinned_count).collect();
        let frozen_width: f32 = columns[..pinned_count].iter().map(|c| c.width).sum();

        let band_start = self.scroll_left;
        let band_end = self.scroll_left + self.band_width();
        let mut visible_columns = Vec::new();
        let mut scrollable_grid_x = 0.0;
        let mut cumulative = 0.0;
        for (offset, column) in columns[pinned_count..].iter().enumerate() {
            if cumulative >= band_end {
                break;
            }
            let right = cumulative + column.width;
            if right > band_start {
                if visible_columns.is_empty() {
                    scrollable_grid_x = cumulative;
                }
                visible_columns.push(pinned_count + offset);
            }
            cumulative = right;
        }

        VisibleRange {
            rows: start..end.max(start),
            visible_columns,
            pinned_columns,
            row_start_index: start,
            scrollable_grid_x,
            frozen_width,
        }
    }

    // -------------------------------------------------------------------------
    // Coordinate transforms
    // -------------------------------------------------------------------------

    /// Translate a screen x (right of the row header) into content space.
    pub fn content_x(&self, screen_x: f32) -> f32 {
        let x = screen_x - self.row_header_width;
        if x < self.frozen_width {
            x
        } else {
            x + self.scroll_left
        }
    }

    /// Translate a screen y (below the header) into content space.
    pub fn content_y(&self, screen_y: f32) -> f32 {
        screen_y - self.header_height + self.scroll_top
    }

    /// Visual column index at content x.
    pub fn column_at(&self, content_x: f32, columns: &[&Column]) -> Option<usize> {
        if content_x < 0.0 {
            return None;
        }
        let mut cumulative = 0.0;
        for (index, column) in columns.iter().enumerate() {
            if content_x >= cumulative && content_x < cumulative + column.width {
                return Some(index);
            }
            cumulative += column.width;
        }
        None
    }

    /// View row index at content y.
    pub fn row_at(&self, content_y: f32, row_count: usize) -> Option<usize> {
        if content_y < 0.0 {
            return None;
        }
        let row = (content_y / self.row_height).floor() as usize;
        (row < row_count).then_some(row)
    }

    /// Content-space left edge of a column.
    pub fn column_content_left(&self, col: usize, columns: &[&Column]) -> f32 {
        columns.iter().take(col).map(|c| c.width).sum()
    }

    /// Screen-space left edge of a column.
    pub fn column_screen_x(&self, col: usize, columns: &[&Column]) -> f32 {
        let left = self.row_header_width + self.column_content_left(col, columns);
        match columns.get(col) {
            Some(column) if column.is_pinned() => left,
            _ => left - self.scroll_left,
        }
    }

    /// Screen-space top edge of a view row.
    pub fn row_screen_y(&self, row: usize) -> f32 {
        self.header_height + row as f32 * self.row_height - self.scroll_top
    }

    /// Screen-space rectangle of a cell.
    pub fn cell_rect(&self, row: usize, col: usize, columns: &[&Column]) -> Option<Rect> {
        let column = columns.get(col)?;
        Some(Rect::new(
            self.column_screen_x(col, columns),
            self.row_screen_y(row),
            column.width,
            self.row_height,
        ))
    }

    /// Fill handle square centred on the bottom-right corner of `range`.
    ///
    /// Drawing and hit testing both go through here, so the handle is only
    /// ever anchored on the most recently added range.
    pub fn fill_handle_rect(
        &self,
        range: &SelectionRange,
        columns: &[&Column],
        size: f32,
    ) -> Option<Rect> {
        let cell = self.cell_rect(range.end_row, range.end_col, columns)?;
        Some(Rect::square_at(cell.bottom_right(), size))
    }

    /// Scroll the minimum amount that brings a cell fully into view.
    /// Returns `true` if the scroll position changed.
    pub fn ensure_cell_visible(&mut self, row: usize, col: usize, columns: &[&Column]) -> bool {
        let mut top = self.scroll_top;
        let row_top = row as f32 * self.row_height;
        if row_top < top {
            top = row_top;
        } else if row_top + self.row_height > top + self.body_height() {
            top = row_top + self.row_height - self.body_height();
        }

        let mut left = self.scroll_left;
        if let Some(column) = columns.get(col)
            && !column.is_pinned()
        {
            let band_left = self.column_content_left(col, columns) - self.frozen_width;
            let band = self.band_width();
            if band_left < left {
                left = band_left;
            } else if band_left + column.width > left + band {
                left = band_left + column.width - band;
            }
        }

        self.set_scroll(left, top)
    }
}
