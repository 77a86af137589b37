use std::time::Duration;

use tokio::time::Instant;

pub const SCROLL_STEPS: u32 = 10;
pub const SCROLL_STEP_INTERVAL: Duration = Duration::from_millis(40);
/// Below this the animation would not be visible; jump instead.
pub const SCROLL_EPSILON: f64 = 1e-3;

/// First visible slot that puts `selected` near the centre of the window.
pub fn start_index(total: usize, visible: usize, selected: usize) -> usize {
    if total <= visible {
        return 0;
    }
    selected.saturating_sub(visible / 2).min(total - visible)
}

#[derive(Debug, Clone, Copy)]
struct ScrollAnimation {
    from: f64,
    target: f64,
    step: u32,
    next_at: Instant,
}

impl ScrollAnimation {
    fn value_at(&self, step: u32) -> f64 {
        if step + 1 >= SCROLL_STEPS {
            return self.target;
        }
        let delta = (self.target - self.from) / f64::from(SCROLL_STEPS);
        self.from + delta * f64::from(step + 1)
    }
}

/// Scroll position of the thumbnail row. Items sit on a uniform stride, so
/// content and window widths follow from the item count and slot count.
#[derive(Debug, Clone)]
pub struct CarouselLayout {
    total: usize,
    visible_slots: usize,
    item_stride: u32,
    fraction: f64,
    animation: Option<ScrollAnimation>,
}

impl CarouselLayout {
    pub fn new(total: usize, visible_slots: usize, item_stride: u32) -> Self {
        Self {
            total,
            visible_slots: visible_slots.max(1),
            item_stride,
            fraction: 0.0,
            animation: None,
        }
    }

    /// New item set after a reload. Any running animation is dropped.
    pub fn relayout(&mut self, total: usize, item_stride: u32) {
        self.total = total;
        self.item_stride = item_stride;
        self.animation = None;
        self.fraction = self.fraction.clamp(0.0, 1.0);
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn content_width(&self) -> u64 {
        u64::from(self.item_stride) * self.total as u64
    }

    pub fn viewport_width(&self) -> u64 {
        u64::from(self.item_stride) * self.visible_slots as u64
    }

    pub fn target_offset(&self, selected: usize) -> f64 {
        if self.total <= self.visible_slots {
            return 0.0;
        }
        let content = self.content_width();
        let window = self.viewport_width();
        if content <= window {
            return 0.0;
        }
        let start = start_index(self.total, self.visible_slots, selected) as u64;
        let target_px = start * u64::from(self.item_stride);
        (target_px as f64 / (content - window) as f64).clamp(0.0, 1.0)
    }

    /// Moves towards the offset for `selected` and returns the fraction to
    /// show now. When animating, the first step is applied immediately and
    /// the rest follow from [`Self::step`].
    pub fn scroll_to(&mut self, selected: usize, animate: bool, now: Instant) -> f64 {
        let target = self.target_offset(selected);
        let from = self.fraction.clamp(0.0, 1.0);
        if !animate || (target - from).abs() < SCROLL_EPSILON {
            self.animation = None;
            self.fraction = target;
            return target;
        }
        let animation = ScrollAnimation {
            from,
            target,
            step: 0,
            next_at: now + SCROLL_STEP_INTERVAL,
        };
        self.fraction = animation.value_at(0);
        self.animation = Some(animation);
        self.fraction
    }

    pub fn next_step_at(&self) -> Option<Instant> {
        self.animation.map(|a| a.next_at)
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Advances a due animation by one step.
    pub fn step(&mut self, now: Instant) -> Option<f64> {
        let mut animation = self.animation.take()?;
        if animation.next_at > now {
            self.animation = Some(animation);
            return None;
        }
        animation.step += 1;
        self.fraction = animation.value_at(animation.step);
        if animation.step + 1 < SCROLL_STEPS {
            animation.next_at += SCROLL_STEP_INTERVAL;
            self.animation = Some(animation);
        }
        Some(self.fraction)
    }

    pub fn cancel(&mut self) {
        self.animation = None;
    }
}
