use std::time::Duration;

use tokio::time::Instant;

use crate::processing::thumbnails::Variant;

/// Border thickness of the selected thumbnail during a selection pulse.
pub const PULSE_STEPS: [u8; 6] = [0, 1, 2, 3, 2, 1];
pub const PULSE_STEP_INTERVAL: Duration = Duration::from_millis(80);

pub const SELECTED_BORDER_PX: u8 = 3;
pub const NEIGHBOR_BORDER_PX: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Selected,
    Neighbor,
    None,
}

impl Tier {
    pub fn of(index: usize, selected: usize, total: usize) -> Self {
        if total == 0 {
            return Self::None;
        }
        if index == selected {
            return Self::Selected;
        }
        let (left, right) = neighbors(selected, total);
        if index == left || index == right {
            Self::Neighbor
        } else {
            Self::None
        }
    }

    pub fn border_px(self) -> u8 {
        match self {
            Self::Selected => SELECTED_BORDER_PX,
            Self::Neighbor => NEIGHBOR_BORDER_PX,
            Self::None => 0,
        }
    }

    pub fn variant(self) -> Variant {
        match self {
            Self::Selected => Variant::TintedEnlarged,
            Self::Neighbor => Variant::Enlarged,
            Self::None => Variant::Normal,
        }
    }
}

/// Wrapping neighbours: the row is laid out linearly but treated as a ring.
pub fn neighbors(selected: usize, total: usize) -> (usize, usize) {
    debug_assert!(total > 0);
    ((selected + total - 1) % total, (selected + 1) % total)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub index: usize,
    pub tier: Tier,
    pub border_px: u8,
}

#[derive(Debug, Clone, Copy)]
struct Pulse {
    index: usize,
    step: usize,
    next_at: Instant,
}

/// Assigns highlight tiers and runs the border pulse on selection change.
/// The pulse only ever changes the selected border width.
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    total: usize,
    pulse: Option<Pulse>,
}

impl Highlighter {
    pub fn new(total: usize) -> Self {
        Self { total, pulse: None }
    }

    pub fn set_total(&mut self, total: usize) {
        self.total = total;
        self.pulse = None;
    }

    /// Steady-state tiers for every item.
    pub fn assign(&self, selected: usize) -> Vec<Highlight> {
        (0..self.total)
            .map(|index| {
                let tier = Tier::of(index, selected, self.total);
                Highlight {
                    index,
                    tier,
                    border_px: tier.border_px(),
                }
            })
            .collect()
    }

    /// Applies the new tiers at once, with the selected border at the first
    /// pulse width, and arms the next pulse step.
    pub fn start_pulse(&mut self, selected: usize, now: Instant) -> Vec<Highlight> {
        let mut highlights = self.assign(selected);
        if selected >= self.total {
            self.pulse = None;
            return highlights;
        }
        for h in highlights.iter_mut().filter(|h| h.tier == Tier::Selected) {
            h.border_px = PULSE_STEPS[0];
        }
        self.pulse = Some(Pulse {
            index: selected,
            step: 0,
            next_at: now + PULSE_STEP_INTERVAL,
        });
        highlights
    }

    pub fn next_step_at(&self) -> Option<Instant> {
        self.pulse.map(|p| p.next_at)
    }

    pub fn is_pulsing(&self) -> bool {
        self.pulse.is_some()
    }

    /// Advances a due pulse. After the last width the border settles to the
    /// steady selected width and the pulse ends.
    pub fn step(&mut self, now: Instant) -> Option<Highlight> {
        let mut pulse = self.pulse.take()?;
        if pulse.next_at > now {
            self.pulse = Some(pulse);
            return None;
        }
        if pulse.index >= self.total {
            return None;
        }
        pulse.step += 1;
        let border_px = match PULSE_STEPS.get(pulse.step) {
            Some(&px) => {
                pulse.next_at += PULSE_STEP_INTERVAL;
                self.pulse = Some(pulse);
                px
            }
            None => SELECTED_BORDER_PX,
        };
        Some(Highlight {
            index: pulse.index,
            tier: Tier::Selected,
            border_px,
        })
    }

    pub fn cancel(&mut self) {
        self.pulse = None;
    }
}
