//! Fit/zoom/pan geometry for a page bitmap inside the viewport.

use serde::Deserialize;

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Requested pan position. May run negative or past the edge until the next
/// [`compute`] clamps it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offset {
    pub x: i64,
    pub y: i64,
}

impl Offset {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn translated(self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitMode {
    #[default]
    FitPage,
    FitWidth,
    FitHeight,
    ActualSize,
}

impl FitMode {
    pub const fn next(self) -> Self {
        match self {
            Self::FitPage => Self::FitWidth,
            Self::FitWidth => Self::FitHeight,
            Self::FitHeight => Self::ActualSize,
            Self::ActualSize => Self::FitPage,
        }
    }
}

/// Render instructions for one page: the size to scale the bitmap to, the
/// part of the scaled bitmap that is visible, and the pan that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub rendered: Size,
    pub crop: Rect,
    pub pan: Offset,
}

impl Frame {
    /// Top-left position of the visible crop when centred in `viewport`.
    pub fn placement(&self, viewport: Size) -> (u32, u32) {
        center_offset(self.crop.width, self.crop.height, viewport.width, viewport.height)
    }
}

pub fn base_scale(page: Size, viewport: Size, fit: FitMode) -> f64 {
    let pw = f64::from(page.width);
    let ph = f64::from(page.height);
    let vw = f64::from(viewport.width);
    let vh = f64::from(viewport.height);
    match fit {
        FitMode::FitWidth if page.width > 0 => vw / pw,
        FitMode::FitHeight if page.height > 0 => vh / ph,
        FitMode::FitPage if !page.is_degenerate() => (vw / pw).min(vh / ph),
        _ => 1.0,
    }
}

/// Derives the frame from scratch; nothing from a previous call is reused.
pub fn compute(page: Size, viewport: Size, fit: FitMode, zoom: f32, pan: Offset) -> Frame {
    let scale = base_scale(page, viewport, fit) * f64::from(zoom);
    let rendered = Size::new(scaled_dim(page.width, scale), scaled_dim(page.height, scale));

    let fits = rendered.width <= viewport.width && rendered.height <= viewport.height;
    if zoom <= 1.0 || fits {
        return Frame {
            rendered,
            crop: Rect::new(0, 0, rendered.width, rendered.height),
            pan: Offset::ORIGIN,
        };
    }

    let x = clamp_axis(pan.x, rendered.width, viewport.width);
    let y = clamp_axis(pan.y, rendered.height, viewport.height);
    Frame {
        rendered,
        crop: Rect::new(
            x,
            y,
            viewport.width.min(rendered.width),
            viewport.height.min(rendered.height),
        ),
        pan: Offset::new(i64::from(x), i64::from(y)),
    }
}

fn scaled_dim(dim: u32, scale: f64) -> u32 {
    let scaled = (f64::from(dim) * scale).round();
    if scaled.is_finite() {
        scaled.clamp(1.0, f64::from(u32::MAX)) as u32
    } else {
        dim.max(1)
    }
}

fn clamp_axis(requested: i64, rendered: u32, viewport: u32) -> u32 {
    let max = rendered.saturating_sub(viewport);
    requested.clamp(0, i64::from(max)) as u32
}

pub fn center_offset(inner_w: u32, inner_h: u32, outer_w: u32, outer_h: u32) -> (u32, u32) {
    let ox = outer_w.saturating_sub(inner_w) / 2;
    let oy = outer_h.saturating_sub(inner_h) / 2;
    (ox, oy)
}
