//! Carousel thumbnail variants, precomputed once per item at load time.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use palette::{LinSrgb, Mix, Srgb};
use tracing::debug;

use crate::collection::{Collection, ItemId};

/// Which precomputed image a thumbnail slot should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Normal,
    Enlarged,
    TintedEnlarged,
}

#[derive(Debug, Clone, Copy)]
pub struct ThumbnailStyle {
    pub tint: [u8; 3],
    pub tint_alpha: f32,
    pub enlarge_factor: f32,
}

#[derive(Debug, Clone)]
pub struct ThumbnailSet {
    pub normal: Arc<RgbaImage>,
    pub enlarged: Arc<RgbaImage>,
    pub tinted: Arc<RgbaImage>,
    pub tinted_enlarged: Arc<RgbaImage>,
}

impl ThumbnailSet {
    pub fn build(thumbnail: &RgbaImage, style: &ThumbnailStyle) -> Self {
        let tinted = tint(thumbnail, style.tint, style.tint_alpha);
        let factor = style.enlarge_factor.max(1.0);
        let (w, h) = (
            scaled(thumbnail.width(), factor),
            scaled(thumbnail.height(), factor),
        );
        let enlarged = imageops::resize(thumbnail, w, h, FilterType::Lanczos3);
        let tinted_enlarged = imageops::resize(&tinted, w, h, FilterType::Lanczos3);
        Self {
            normal: Arc::new(thumbnail.clone()),
            enlarged: Arc::new(enlarged),
            tinted: Arc::new(tinted),
            tinted_enlarged: Arc::new(tinted_enlarged),
        }
    }

    pub fn variant(&self, variant: Variant) -> &Arc<RgbaImage> {
        match variant {
            Variant::Normal => &self.normal,
            Variant::Enlarged => &self.enlarged,
            Variant::TintedEnlarged => &self.tinted_enlarged,
        }
    }
}

/// Per-item view-model, keyed by item id and rebuilt on every reload.
#[derive(Debug, Clone, Default)]
pub struct ThumbnailCache {
    sets: HashMap<ItemId, ThumbnailSet>,
    item_stride: u32,
}

impl ThumbnailCache {
    pub fn build(collection: &Collection, style: &ThumbnailStyle, item_padding: u32) -> Self {
        let mut sets = HashMap::with_capacity(collection.len());
        let mut widest = 0;
        for item in collection.items() {
            widest = widest.max(item.thumbnail.width());
            sets.insert(item.id.clone(), ThumbnailSet::build(&item.thumbnail, style));
        }
        let item_stride = (widest + item_padding).max(1);
        debug!(items = sets.len(), item_stride, "thumbnail variants built");
        Self { sets, item_stride }
    }

    pub fn get(&self, id: &ItemId) -> Option<&ThumbnailSet> {
        self.sets.get(id)
    }

    /// Horizontal distance between neighbouring carousel slots, in pixels.
    pub fn item_stride(&self) -> u32 {
        self.item_stride
    }
}

/// Scales `img` to `height` keeping its aspect ratio.
pub fn scale_to_height(img: &RgbaImage, height: u32) -> RgbaImage {
    let height = height.max(1);
    let ratio = f64::from(height) / f64::from(img.height().max(1));
    let width = ((f64::from(img.width()) * ratio).round() as u32).max(1);
    imageops::resize(img, width, height, FilterType::Lanczos3)
}

/// Blends every pixel towards `color` by `alpha` (0 = untouched, 1 = flat colour).
pub fn tint(img: &RgbaImage, color: [u8; 3], alpha: f32) -> RgbaImage {
    let alpha = alpha.clamp(0.0, 1.0);
    let overlay: LinSrgb<f32> = Srgb::new(color[0], color[1], color[2])
        .into_format::<f32>()
        .into_linear();
    let mut out = img.clone();
    for px in out.pixels_mut() {
        let Rgba([r, g, b, a]) = *px;
        let base: LinSrgb<f32> = Srgb::new(r, g, b).into_format::<f32>().into_linear();
        let mixed: Srgb<f32> = Srgb::from_linear(base.mix(overlay, alpha));
        let mixed: Srgb<u8> = mixed.into_format();
        *px = Rgba([mixed.red, mixed.green, mixed.blue, a]);
    }
    out
}

/// Parses `#rrggbb` (or `rrggbb`, `#rgb`).
pub fn parse_hex_color(raw: &str) -> Option<[u8; 3]> {
    Srgb::<u8>::from_str(raw.trim())
        .ok()
        .map(|c| [c.red, c.green, c.blue])
}

fn scaled(dim: u32, factor: f32) -> u32 {
    ((dim as f32 * factor).round() as u32).max(1)
}
