//! Output seam between the presenter and whatever paints pixels.

use std::sync::Arc;

use anyhow::Result;
use image::RgbaImage;
use tracing::{debug, info};

use crate::collection::{ItemId, Page};
use crate::processing::layout::{Frame, Size};
use crate::tasks::presenter::highlight::Tier;

/// Reports the current drawable area. `None` means no surface yet.
pub trait ViewportProvider {
    fn viewport(&self) -> Option<Size>;
}

/// Restyle instruction for one carousel slot.
#[derive(Debug, Clone)]
pub struct ThumbnailUpdate {
    pub index: usize,
    pub id: ItemId,
    pub image: Arc<RgbaImage>,
    pub tier: Tier,
    pub border_px: u8,
    pub border_color: [u8; 3],
}

/// Receives render instructions. Implementations must not block for long;
/// they run on the presenter task.
pub trait DrawSink {
    /// Paint `frame.crop` of `page` scaled to `frame.rendered`, centred in `viewport`.
    fn show_page(&mut self, page: &Page, frame: &Frame, viewport: Size) -> Result<()>;
    fn update_thumbnail(&mut self, update: &ThumbnailUpdate);
    fn scroll_carousel(&mut self, fraction: f64);
    fn set_idle_overlay(&mut self, visible: bool);
    /// 1-based position of the current item and the number of items.
    fn set_indicator(&mut self, current: usize, total: usize);
}

#[derive(Debug, Clone, Copy)]
pub struct FixedViewport(pub Size);

impl ViewportProvider for FixedViewport {
    fn viewport(&self) -> Option<Size> {
        (!self.0.is_degenerate()).then_some(self.0)
    }
}

/// Headless sink that logs every instruction. Used by the binary when no
/// display backend is attached.
#[derive(Debug, Clone)]
pub struct TracingSink {
    overlay_text: String,
    background: [u8; 3],
}

impl TracingSink {
    pub fn new(overlay_text: impl Into<String>, background: [u8; 3]) -> Self {
        Self {
            overlay_text: overlay_text.into(),
            background,
        }
    }
}

impl DrawSink for TracingSink {
    fn show_page(&mut self, page: &Page, frame: &Frame, viewport: Size) -> Result<()> {
        let (x, y) = frame.placement(viewport);
        info!(
            source = ?page.size(),
            rendered = ?frame.rendered,
            crop = ?frame.crop,
            at_x = x,
            at_y = y,
            background = ?self.background,
            "show page"
        );
        Ok(())
    }

    fn update_thumbnail(&mut self, update: &ThumbnailUpdate) {
        debug!(
            index = update.index,
            id = %update.id,
            tier = ?update.tier,
            border_px = update.border_px,
            width = update.image.width(),
            height = update.image.height(),
            "thumbnail"
        );
    }

    fn scroll_carousel(&mut self, fraction: f64) {
        debug!(fraction, "carousel scroll");
    }

    fn set_idle_overlay(&mut self, visible: bool) {
        if visible {
            info!(text = %self.overlay_text, "idle overlay shown");
        } else {
            info!("idle overlay hidden");
        }
    }

    fn set_indicator(&mut self, current: usize, total: usize) {
        info!("notice {current} / {total}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_area_viewport_reports_none() {
        assert_eq!(FixedViewport(Size::new(0, 600)).viewport(), None);
        assert_eq!(
            FixedViewport(Size::new(800, 600)).viewport(),
            Some(Size::new(800, 600))
        );
    }
}
