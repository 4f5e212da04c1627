//! Page layout arithmetic: page offsets, exclusion zones and page insertion.

use crate::stroke::{Stroke, StrokeId};
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use thiserror::Error;

/// Page management errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PageError {
    #[error("Pagination is disabled")]
    PaginationDisabled,
    #[error("Invalid page number {requested}, expected 1..={max}")]
    InvalidPageNumber { requested: usize, max: usize },
}

/// Paper format; page width always matches the view width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    /// 8.5" x 11"
    #[default]
    Letter,
    /// 210mm x 297mm
    A4,
}

impl PaperSize {
    pub fn height_to_width_ratio(self) -> f64 {
        match self {
            PaperSize::Letter => 11.0 / 8.5,
            PaperSize::A4 => 297.0 / 210.0,
        }
    }
}

/// Result of shifting strokes to make room for a new page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageInsertion {
    /// 1-based position of the new page.
    pub page_number: usize,
    /// Page-space y where the new page starts.
    pub insertion_y: f64,
    /// Distance every affected stroke moved down.
    pub page_offset: f32,
    /// New values of the strokes that moved.
    pub shifted: Vec<Stroke>,
}

impl PageInsertion {
    pub fn affected_ids(&self) -> Vec<StrokeId> {
        self.shifted.iter().map(|s| s.id).collect()
    }
}

/// Vertical layout of a paginated document.
///
/// Page `i` covers `[i * unit, i * unit + page_height)` where
/// `unit = page_height + exclusion_height`; the gutter after it belongs to
/// no page.
#[derive(Debug, Clone)]
pub struct PaginationManager {
    enabled: bool,
    page_width: f64,
    page_height: f64,
    exclusion_height: f64,
    document_height: f64,
}

impl PaginationManager {
    /// Layout for a paper size at the given page width.
    pub fn new(page_width: f64, paper_size: PaperSize, exclusion_height: f64) -> Self {
        let page_height = page_width * paper_size.height_to_width_ratio();
        Self::with_dimensions(page_width, page_height, exclusion_height)
    }

    /// Layout with explicit page dimensions.
    pub fn with_dimensions(page_width: f64, page_height: f64, exclusion_height: f64) -> Self {
        Self {
            enabled: true,
            page_width,
            page_height,
            exclusion_height,
            document_height: page_height,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn page_width(&self) -> f64 {
        self.page_width
    }

    pub fn page_height(&self) -> f64 {
        self.page_height
    }

    pub fn exclusion_height(&self) -> f64 {
        self.exclusion_height
    }

    pub fn document_height(&self) -> f64 {
        self.document_height
    }

    pub fn set_document_height(&mut self, height: f64) {
        self.document_height = height;
    }

    /// Recompute the page height for a paper size, keeping the page width.
    pub fn update_paper_size(&mut self, paper_size: PaperSize) {
        self.page_height = self.page_width * paper_size.height_to_width_ratio();
    }

    /// Height of one page plus its gutter.
    pub fn page_unit(&self) -> f64 {
        self.page_height + self.exclusion_height
    }

    /// Distance strokes move when a page is inserted above them.
    pub fn page_insertion_offset(&self) -> f64 {
        self.page_unit()
    }

    pub fn page_top_y(&self, page_index: usize) -> f64 {
        if !self.enabled || page_index == 0 {
            return 0.0;
        }
        page_index as f64 * self.page_unit()
    }

    pub fn page_bottom_y(&self, page_index: usize) -> f64 {
        self.page_top_y(page_index) + self.page_height
    }

    /// Gutter below page `page_index`, half-open.
    pub fn exclusion_zone(&self, page_index: usize) -> Range<f64> {
        let top = self.page_bottom_y(page_index);
        top..top + self.exclusion_height
    }

    pub fn exclusion_zone_bottom_y(&self, page_index: usize) -> f64 {
        self.exclusion_zone(page_index).end
    }

    /// Page a y coordinate belongs to. A y inside a gutter counts toward the
    /// page that follows it; negative y is page 0.
    pub fn page_index_for_y(&self, y: f64) -> usize {
        if !self.enabled || y <= 0.0 {
            return 0;
        }
        let index = (y / self.page_unit()).floor() as usize;
        if y >= self.page_bottom_y(index) {
            index + 1
        } else {
            index
        }
    }

    /// 1-based page number for a y coordinate.
    pub fn page_number_for_y(&self, y: f64) -> usize {
        self.page_index_for_y(y) + 1
    }

    pub fn is_in_exclusion_zone(&self, y: f64) -> bool {
        if !self.enabled || y < 0.0 {
            return false;
        }
        let index = (y / self.page_unit()).floor() as usize;
        self.exclusion_zone(index).contains(&y)
    }

    /// Gutters overlapping `[top, top + height]`.
    pub fn exclusion_zones_in_range(&self, top: f64, height: f64) -> Vec<Range<f64>> {
        if !self.enabled {
            return Vec::new();
        }
        let bottom = top + height;
        let first = if top <= 0.0 {
            0
        } else {
            (top / self.page_unit()).floor() as usize
        };
        (first..)
            .map(|index| self.exclusion_zone(index))
            .take_while(|zone| zone.start <= bottom)
            .filter(|zone| zone.end >= top)
            .collect()
    }

    /// Page-space area of a 1-based page number.
    pub fn page_area(&self, page_number: usize) -> Option<Rect> {
        let index = page_number.checked_sub(1)?;
        Some(Rect::new(
            0.0,
            self.page_top_y(index),
            self.page_width,
            self.page_bottom_y(index),
        ))
    }

    /// Number of pages that start above the document bottom, at least one.
    pub fn total_page_count(&self) -> usize {
        if !self.enabled {
            return 1;
        }
        ((self.document_height / self.page_unit()).ceil() as usize).max(1)
    }

    pub fn max_page_index(&self) -> usize {
        self.total_page_count() - 1
    }

    /// Insert a page before 1-based `page_number`, shifting every stroke whose
    /// top is at or below the insertion point down by one page unit.
    ///
    /// Returns the shifted stroke values; the input strokes are not modified.
    pub fn insert_page_at(&self, page_number: usize, strokes: &[Stroke]) -> Result<PageInsertion, PageError> {
        if !self.enabled {
            return Err(PageError::PaginationDisabled);
        }
        let max = self.total_page_count() + 1;
        if page_number < 1 || page_number > max {
            return Err(PageError::InvalidPageNumber {
                requested: page_number,
                max,
            });
        }

        let insertion_y = self.page_top_y(page_number - 1);
        let page_offset = self.page_insertion_offset() as f32;
        let shifted = strokes
            .iter()
            .filter(|stroke| stroke.bounds.top as f64 >= insertion_y)
            .map(|stroke| stroke.translated(0.0, page_offset))
            .collect();

        Ok(PageInsertion {
            page_number,
            insertion_y,
            page_offset,
            shifted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::{StrokePoint, StrokeStyle};

    fn layout() -> PaginationManager {
        PaginationManager::with_dimensions(800.0, 1000.0, 10.0)
    }

    fn stroke_at(y: f32) -> Stroke {
        let point = StrokePoint {
            x: 100.0,
            y,
            pressure: 1.0,
            size: 1.0,
            tilt_x: 0,
            tilt_y: 0,
            timestamp: 0,
        };
        Stroke::from_points("page", StrokeStyle::default(), vec![point], 0.0).unwrap()
    }

    #[test]
    fn test_page_arithmetic() {
        let pages = layout();
        assert_eq!(pages.page_top_y(0), 0.0);
        assert_eq!(pages.page_top_y(2), 2020.0);
        assert_eq!(pages.page_bottom_y(1), 2010.0);
        assert_eq!(pages.exclusion_zone(0), 1000.0..1010.0);
        assert_eq!(pages.exclusion_zone_bottom_y(1), 2020.0);
    }

    #[test]
    fn test_page_index_for_y() {
        let pages = layout();
        assert_eq!(pages.page_index_for_y(-50.0), 0);
        assert_eq!(pages.page_index_for_y(995.0), 0);
        assert_eq!(pages.page_index_for_y(1005.0), 1);
        assert_eq!(pages.page_index_for_y(1010.0), 1);
        assert_eq!(pages.page_index_for_y(2009.9), 1);
        assert_eq!(pages.page_number_for_y(2500.0), 3);
    }

    #[test]
    fn test_exclusion_zone_membership() {
        let pages = layout();
        assert!(!pages.is_in_exclusion_zone(999.9));
        assert!(pages.is_in_exclusion_zone(1000.0));
        assert!(pages.is_in_exclusion_zone(1009.9));
        assert!(!pages.is_in_exclusion_zone(1010.0));
    }

    #[test]
    fn test_exclusion_zones_in_range() {
        let pages = layout();
        let zones = pages.exclusion_zones_in_range(500.0, 1600.0);
        assert_eq!(zones, vec![1000.0..1010.0, 2010.0..2020.0]);
        assert!(pages.exclusion_zones_in_range(0.0, 900.0).is_empty());
    }

    #[test]
    fn test_disabled_pagination() {
        let mut pages = layout();
        pages.set_enabled(false);
        assert_eq!(pages.page_index_for_y(5000.0), 0);
        assert_eq!(pages.total_page_count(), 1);
        assert!(!pages.is_in_exclusion_zone(1005.0));
        assert_eq!(pages.insert_page_at(1, &[]), Err(PageError::PaginationDisabled));
    }

    #[test]
    fn test_total_page_count() {
        let mut pages = layout();
        pages.set_document_height(1000.0);
        assert_eq!(pages.total_page_count(), 1);
        pages.set_document_height(3020.0);
        assert_eq!(pages.total_page_count(), 3);
        assert_eq!(pages.max_page_index(), 2);
        pages.set_document_height(3030.0);
        assert_eq!(pages.total_page_count(), 3);
    }

    #[test]
    fn test_paper_sizes() {
        let letter = PaginationManager::new(850.0, PaperSize::Letter, 10.0);
        assert!((letter.page_height() - 1100.0).abs() < 1e-9);
        let mut a4 = PaginationManager::new(210.0, PaperSize::Letter, 10.0);
        a4.update_paper_size(PaperSize::A4);
        assert!((a4.page_height() - 297.0).abs() < 1e-9);
    }

    #[test]
    fn test_insert_page_shifts_strokes_below() {
        let mut pages = layout();
        pages.set_document_height(3020.0);
        let strokes = vec![stroke_at(500.0), stroke_at(1500.0), stroke_at(2500.0)];

        let insertion = pages.insert_page_at(2, &strokes).unwrap();
        assert_eq!(insertion.insertion_y, 1010.0);
        assert_eq!(insertion.page_offset, 1010.0);
        assert_eq!(insertion.affected_ids(), vec![strokes[1].id, strokes[2].id]);
        assert_eq!(insertion.shifted[0].points[0].y, 2510.0);
        assert_eq!(insertion.shifted[1].bounds.top, strokes[2].bounds.top + 1010.0);
        // Inputs are untouched.
        assert_eq!(strokes[1].points[0].y, 1500.0);
    }

    #[test]
    fn test_insert_page_validates_number() {
        let mut pages = layout();
        pages.set_document_height(3020.0);
        assert_eq!(
            pages.insert_page_at(0, &[]),
            Err(PageError::InvalidPageNumber { requested: 0, max: 4 })
        );
        assert!(pages.insert_page_at(5, &[]).is_err());
        assert!(pages.insert_page_at(4, &[]).is_ok());
    }
}
