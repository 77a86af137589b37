use crate::collection::Collection;
use crate::processing::layout::{FitMode, MAX_ZOOM, MIN_ZOOM, Offset};

/// What a transition changed, so the presenter knows which collaborators to
/// resynchronise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Rejected or no-op; nothing to redraw.
    None,
    /// Same page, different zoom/pan/fit.
    View,
    /// Different page of the same item.
    Page,
    /// Different item; carousel and highlight must follow.
    File,
}

/// What is currently shown. Indices are only ever moved through methods that
/// check them against the collection passed in.
#[derive(Debug, Clone)]
pub struct NavigationState {
    file: usize,
    page: usize,
    zoom: f32,
    zoom_step: f32,
    pan: Offset,
    fit_mode: FitMode,
    paused: bool,
}

impl NavigationState {
    pub fn new(fit_mode: FitMode, zoom_step: f32) -> Self {
        Self {
            file: 0,
            page: 0,
            zoom: 1.0,
            zoom_step,
            pan: Offset::ORIGIN,
            fit_mode,
            paused: false,
        }
    }

    /// Index of the item on screen.
    #[must_use]
    pub const fn file_index(&self) -> usize {
        self.file
    }

    /// Page within the current item, 0-based.
    #[must_use]
    pub const fn page_index(&self) -> usize {
        self.page
    }

    #[must_use]
    pub const fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Pan offset as last settled by the layout.
    #[must_use]
    pub const fn pan(&self) -> Offset {
        self.pan
    }

    #[must_use]
    pub const fn fit_mode(&self) -> FitMode {
        self.fit_mode
    }

    /// True while rotation is suspended, by the user or by idle.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn next_file(&mut self, collection: &Collection) -> Change {
        let count = collection.len();
        if count == 0 {
            return Change::None;
        }
        self.enter_file((self.file + 1) % count)
    }

    pub fn prev_file(&mut self, collection: &Collection) -> Change {
        let count = collection.len();
        if count == 0 {
            return Change::None;
        }
        self.enter_file((self.file + count - 1) % count)
    }

    /// Advances one page; past the last page rolls to the next file.
    pub fn next_page(&mut self, collection: &Collection) -> Change {
        if collection.is_empty() {
            return Change::None;
        }
        self.revalidate(collection);
        if self.page + 1 < collection.page_count(self.file) {
            self.page += 1;
            Change::Page
        } else {
            self.next_file(collection)
        }
    }

    /// Steps back one page, wrapping within the current file.
    pub fn prev_page(&mut self, collection: &Collection) -> Change {
        if collection.is_empty() {
            return Change::None;
        }
        self.revalidate(collection);
        let pages = collection.page_count(self.file).max(1);
        self.page = (self.page + pages - 1) % pages;
        Change::Page
    }

    /// Out-of-range indices are ignored.
    pub fn select_file(&mut self, collection: &Collection, index: usize) -> Change {
        if index >= collection.len() {
            return Change::None;
        }
        self.enter_file(index)
    }

    pub fn zoom_in(&mut self) -> Change {
        self.zoom = (self.zoom + self.zoom_step).min(MAX_ZOOM);
        Change::View
    }

    pub fn zoom_out(&mut self) -> Change {
        self.zoom = (self.zoom - self.zoom_step).max(MIN_ZOOM);
        Change::View
    }

    pub fn zoom_reset(&mut self) -> Change {
        self.zoom = 1.0;
        Change::View
    }

    pub fn cycle_fit_mode(&mut self) -> Change {
        self.fit_mode = self.fit_mode.next();
        Change::View
    }

    /// Moves the requested pan; the next geometry pass clamps it.
    pub fn pan_by(&mut self, dx: i64, dy: i64) -> Change {
        self.pan = self.pan.translated(dx, dy);
        Change::View
    }

    /// Stores the pan as clamped by the geometry calculator.
    pub fn settle_pan(&mut self, pan: Offset) {
        self.pan = pan;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Back to the first page of the first file, as after a reload. Zoom and
    /// fit mode are kept.
    pub fn reset(&mut self) {
        self.file = 0;
        self.page = 0;
        self.pan = Offset::ORIGIN;
    }

    /// Pulls indices back into range if the collection shrank underneath us.
    pub fn revalidate(&mut self, collection: &Collection) -> bool {
        if self.file >= collection.len() {
            self.reset();
            return true;
        }
        if self.page >= collection.page_count(self.file) {
            self.page = 0;
            self.pan = Offset::ORIGIN;
            return true;
        }
        false
    }

    fn enter_file(&mut self, index: usize) -> Change {
        self.file = index;
        self.page = 0;
        self.pan = Offset::ORIGIN;
        Change::File
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::fixtures::collection;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn nav() -> NavigationState {
        NavigationState::new(FitMode::FitPage, 0.1)
    }

    fn in_bounds(nav: &NavigationState, c: &Collection) -> bool {
        nav.file_index() < c.len() && nav.page_index() < c.page_count(nav.file_index())
    }

    #[test]
    fn indices_stay_in_bounds_under_random_navigation() {
        let c = collection(&[3, 1, 4, 1, 5]);
        let mut nav = nav();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..2_000 {
            match rng.random_range(0..5) {
                0 => nav.next_page(&c),
                1 => nav.prev_file(&c),
                2 => nav.select_file(&c, rng.random_range(0..8)),
                3 => nav.prev_page(&c),
                _ => nav.next_file(&c),
            };
            assert!(in_bounds(&nav, &c), "file {} page {}", nav.file_index(), nav.page_index());
        }
    }

    #[test]
    fn next_page_on_last_page_rolls_to_next_file() {
        let c = collection(&[2, 3, 1]);
        let mut nav = nav();
        assert_eq!(nav.next_page(&c), Change::Page);
        assert_eq!(nav.next_page(&c), Change::File);
        assert_eq!((nav.file_index(), nav.page_index()), (1, 0));

        nav.select_file(&c, 2);
        assert_eq!(nav.next_page(&c), Change::File);
        assert_eq!((nav.file_index(), nav.page_index()), (0, 0));
    }

    #[test]
    fn prev_page_wraps_within_file() {
        let c = collection(&[3, 2]);
        let mut nav = nav();
        assert_eq!(nav.prev_page(&c), Change::Page);
        assert_eq!((nav.file_index(), nav.page_index()), (0, 2));
    }

    #[test]
    fn prev_file_wraps_to_last() {
        let c = collection(&[1, 1, 1]);
        let mut nav = nav();
        nav.prev_file(&c);
        assert_eq!(nav.file_index(), 2);
    }

    #[test]
    fn file_change_resets_pan_but_keeps_zoom() {
        let c = collection(&[2, 2]);
        let mut nav = nav();
        nav.zoom_in();
        nav.zoom_in();
        nav.pan_by(30, 40);
        nav.next_page(&c);
        nav.next_file(&c);
        assert_eq!(nav.pan(), Offset::ORIGIN);
        assert_eq!(nav.page_index(), 0);
        assert!((nav.zoom() - 1.2).abs() < 1e-4);
    }

    #[test]
    fn out_of_range_select_is_ignored() {
        let c = collection(&[2, 2]);
        let mut nav = nav();
        nav.next_page(&c);
        assert_eq!(nav.select_file(&c, 2), Change::None);
        assert_eq!((nav.file_index(), nav.page_index()), (0, 1));
        assert_eq!(nav.select_file(&c, 1), Change::File);
        assert_eq!((nav.file_index(), nav.page_index()), (1, 0));
    }

    #[test]
    fn zoom_saturates_at_bounds() {
        let mut nav = nav();
        for _ in 0..200 {
            nav.zoom_in();
            assert!(nav.zoom() <= MAX_ZOOM);
        }
        assert_eq!(nav.zoom(), MAX_ZOOM);
        for _ in 0..200 {
            nav.zoom_out();
            assert!(nav.zoom() >= MIN_ZOOM);
        }
        assert_eq!(nav.zoom(), MIN_ZOOM);
        nav.zoom_reset();
        assert_eq!(nav.zoom(), 1.0);
    }

    #[test]
    fn pan_is_not_clamped_eagerly() {
        let mut nav = nav();
        nav.pan_by(-50, 0);
        assert_eq!(nav.pan(), Offset::new(-50, 0));
    }

    #[test]
    fn double_toggle_restores_pause_flag() {
        let mut nav = nav();
        assert!(nav.toggle_pause());
        assert!(!nav.toggle_pause());
    }

    #[test]
    fn revalidate_after_shrink() {
        let big = collection(&[1, 1, 5]);
        let small = collection(&[2]);
        let mut nav = nav();
        nav.select_file(&big, 2);
        nav.next_page(&big);
        nav.next_page(&big);
        assert!(nav.revalidate(&small));
        assert_eq!((nav.file_index(), nav.page_index()), (0, 0));
        assert!(!nav.revalidate(&small));
    }

    #[test]
    fn fresh_state_reports_constructor_settings() {
        let nav = NavigationState::new(FitMode::FitWidth, 0.25);
        assert_eq!((nav.file_index(), nav.page_index()), (0, 0));
        assert_eq!(nav.zoom(), 1.0);
        assert_eq!(nav.pan(), Offset::ORIGIN);
        assert_eq!(nav.fit_mode(), FitMode::FitWidth);
        assert!(!nav.is_paused());
    }
}
