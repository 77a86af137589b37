//! The presentation actor: owns the collection, the navigation state and every
//! timer, and turns commands and deadlines into draw-sink instructions.

pub mod carousel;
pub mod highlight;
pub mod idle;
pub mod navigation;
pub mod rotation;

use std::sync::Arc;

use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::collection::{Collection, Item};
use crate::config::{Configuration, WheelMode};
use crate::error::Error;
use crate::events::Command;
use crate::processing::layout::{self, Size};
use crate::processing::thumbnails::{ThumbnailCache, ThumbnailStyle};
use crate::render::{DrawSink, ThumbnailUpdate, ViewportProvider};
use crate::tasks::documents::DocumentSource;

use self::carousel::CarouselLayout;
use self::highlight::{Highlight, Highlighter, Tier};
use self::idle::{IdleAction, IdleMonitor};
use self::navigation::{Change, NavigationState};
use self::rotation::RotationScheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Presenter<D, S, V> {
    source: Arc<D>,
    reload_requested: bool,
    sink: S,
    viewport: V,
    collection: Collection,
    thumbnails: ThumbnailCache,
    style: ThumbnailStyle,
    item_padding: u32,
    nav: NavigationState,
    rotation: RotationScheduler,
    idle: IdleMonitor,
    carousel: CarouselLayout,
    highlighter: Highlighter,
    rng: StdRng,
    shuffle_files: bool,
    shuffle_pages: bool,
    scroll_animation: bool,
    wheel_mode: WheelMode,
    pan_step: i64,
    highlight_color: [u8; 3],
    background_color: [u8; 3],
}

impl<D, S, V> Presenter<D, S, V>
where
    D: DocumentSource,
    S: DrawSink,
    V: ViewportProvider,
{
    /// Builds the engine around an initial listing from `source`. Fails only
    /// when nothing in `items` is displayable.
    pub fn new(
        cfg: &Configuration,
        source: Arc<D>,
        items: Vec<Item>,
        sink: S,
        viewport: V,
        now: Instant,
    ) -> Result<Self, Error> {
        let mut collection = Collection::new(items)?;
        let mut rng = match cfg.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        collection.shuffle(&mut rng, cfg.shuffle_files, cfg.shuffle_pages);

        let style = cfg.thumbnail_style();
        let item_padding = cfg.carousel.item_padding;
        let thumbnails = ThumbnailCache::build(&collection, &style, item_padding);
        let carousel = CarouselLayout::new(
            collection.len(),
            cfg.carousel.visible_slots,
            thumbnails.item_stride(),
        );
        info!(
            items = collection.len(),
            shuffled = cfg.shuffle_files,
            "collection loaded"
        );

        Ok(Self {
            source,
            reload_requested: false,
            sink,
            viewport,
            highlighter: Highlighter::new(collection.len()),
            collection,
            thumbnails,
            style,
            item_padding,
            nav: NavigationState::new(cfg.fit_mode, cfg.zoom_step),
            rotation: RotationScheduler::new(cfg.cycle_interval),
            idle: IdleMonitor::new(cfg.idle_timeout, now),
            carousel,
            rng,
            shuffle_files: cfg.shuffle_files,
            shuffle_pages: cfg.shuffle_pages,
            scroll_animation: cfg.carousel.scroll_animation,
            wheel_mode: cfg.wheel_mode,
            pan_step: cfg.pan_step,
            highlight_color: cfg.highlight_rgb(),
            background_color: cfg.background_rgb(),
        })
    }

    /// Shows the first page and arms the rotation.
    pub fn start(&mut self, now: Instant) {
        self.apply(Change::File, now);
    }

    /// Applies one command. `Quit` only reports [`Flow::Quit`]; the caller
    /// owns teardown.
    pub fn handle(&mut self, cmd: Command, now: Instant) -> Flow {
        if cmd == Command::Quit {
            return Flow::Quit;
        }
        self.mark_interaction(now);

        let change = match cmd {
            Command::NextFile => self.nav.next_file(&self.collection),
            Command::PrevFile => self.nav.prev_file(&self.collection),
            Command::NextPage => self.nav.next_page(&self.collection),
            Command::PrevPage => self.nav.prev_page(&self.collection),
            Command::SelectFile(index) => self.nav.select_file(&self.collection, index),
            Command::ZoomIn => self.nav.zoom_in(),
            Command::ZoomOut => self.nav.zoom_out(),
            Command::ZoomReset => self.nav.zoom_reset(),
            Command::CycleFitMode => self.nav.cycle_fit_mode(),
            Command::Pan(direction) => {
                let (dx, dy) = direction.delta(self.pan_step);
                self.nav.pan_by(dx, dy)
            }
            Command::Wheel { delta, modifier } => {
                let mode = if modifier {
                    self.wheel_mode.toggled()
                } else {
                    self.wheel_mode
                };
                match (mode, delta.signum()) {
                    (_, 0) => Change::None,
                    (WheelMode::Zoom, 1) => self.nav.zoom_in(),
                    (WheelMode::Zoom, _) => self.nav.zoom_out(),
                    (WheelMode::Navigate, 1) => self.nav.prev_file(&self.collection),
                    (WheelMode::Navigate, _) => self.nav.next_file(&self.collection),
                }
            }
            Command::TogglePause => {
                self.toggle_rotation(now);
                Change::None
            }
            Command::Reload => {
                self.request_reload();
                Change::None
            }
            Command::Quit => Change::None,
        };
        debug!(?cmd, ?change, "command handled");
        self.apply(change, now);
        Flow::Continue
    }

    /// Rotation deadline reached. Stale wake-ups are ignored.
    pub fn on_rotation(&mut self, now: Instant) {
        if !self.rotation.take_due(now) || self.nav.is_paused() {
            return;
        }
        self.nav.revalidate(&self.collection);
        let change = self.nav.next_page(&self.collection);
        debug!(
            file = self.nav.file_index(),
            page = self.nav.page_index(),
            "rotation advanced"
        );
        self.apply(change, now);
    }

    /// Timer wake-up. Each timer checks its own deadline, so an early or
    /// stale wake-up does nothing.
    pub fn on_deadline(&mut self, now: Instant) {
        self.on_rotation(now);
        self.on_idle_poll(now);
        self.on_scroll_step(now);
        self.on_pulse_step(now);
    }

    pub fn on_idle_poll(&mut self, now: Instant) {
        if !self.idle.next_poll().is_some_and(|at| at <= now) {
            return;
        }
        if let IdleAction::Enter { pause } = self.idle.poll(now, self.nav.is_paused()) {
            info!(paused_rotation = pause, "idle entered");
            self.sink.set_idle_overlay(true);
            if pause {
                self.nav.toggle_pause();
                self.rotation.cancel();
            }
        }
    }

    pub fn on_scroll_step(&mut self, now: Instant) {
        if let Some(fraction) = self.carousel.step(now) {
            self.sink.scroll_carousel(fraction);
        }
    }

    pub fn on_pulse_step(&mut self, now: Instant) {
        if let Some(highlight) = self.highlighter.step(now) {
            self.emit_thumbnail(highlight);
        }
    }

    /// Flips pause and re-arms (or drops) the rotation; never leaves two
    /// deadlines pending.
    pub fn toggle_rotation(&mut self, now: Instant) {
        let paused = self.nav.toggle_pause();
        self.rotation.schedule(now, paused);
        info!(paused, "rotation toggled");
    }

    /// Stops the rotation and flags a re-listing. The listing itself runs
    /// elsewhere and comes back through [`Presenter::finish_reload`].
    pub fn request_reload(&mut self) {
        self.rotation.cancel();
        self.reload_requested = true;
        info!("reload requested");
    }

    /// Hands out the source if a reload was requested since the last call.
    pub fn take_reload_request(&mut self) -> Option<Arc<D>> {
        std::mem::take(&mut self.reload_requested).then(|| Arc::clone(&self.source))
    }

    /// Swaps in a fresh listing. An empty or failed listing keeps what is
    /// shown; either way navigation is revalidated and the rotation re-armed.
    pub fn finish_reload(&mut self, listed: Result<Vec<Item>>, now: Instant) {
        self.rotation.cancel();
        let listed = listed.and_then(|items| Collection::new(items).map_err(Into::into));
        match listed {
            Ok(mut collection) => {
                collection.shuffle(&mut self.rng, self.shuffle_files, self.shuffle_pages);
                self.collection = collection;
                self.thumbnails = ThumbnailCache::build(&self.collection, &self.style, self.item_padding);
                self.carousel
                    .relayout(self.collection.len(), self.thumbnails.item_stride());
                self.highlighter.set_total(self.collection.len());
                self.nav.reset();
                info!(items = self.collection.len(), "collection reloaded");
            }
            Err(err) => warn!(error = %err, "reload failed; keeping current collection"),
        }
        self.apply(Change::File, now);
    }

    /// Drops every pending timer.
    pub fn shutdown(&mut self) {
        self.rotation.cancel();
        self.idle.stop();
        self.carousel.cancel();
        self.highlighter.cancel();
        info!("presenter stopped");
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.nav
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn rotation_deadline(&self) -> Option<Instant> {
        self.rotation.deadline()
    }

    pub fn is_idle(&self) -> bool {
        self.idle.is_active()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Earliest armed deadline across every timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.rotation.deadline(),
            self.idle.next_poll(),
            self.carousel.next_step_at(),
            self.highlighter.next_step_at(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn mark_interaction(&mut self, now: Instant) {
        let outcome = self.idle.mark_interaction(now, self.nav.is_paused());
        if outcome.left_idle {
            info!("idle left");
            self.sink.set_idle_overlay(false);
        }
        if outcome.resume {
            self.nav.toggle_pause();
            self.rotation.schedule(now, false);
            info!("rotation resumed after idle");
        }
    }

    fn apply(&mut self, change: Change, now: Instant) {
        match change {
            Change::None => {}
            Change::View | Change::Page => self.render(now),
            Change::File => {
                self.follow_selection(now);
                self.render(now);
            }
        }
    }

    fn current_viewport(&self) -> Result<Size, Error> {
        match self.viewport.viewport() {
            Some(size) if !size.is_degenerate() => Ok(size),
            Some(size) => Err(Error::DegenerateViewport {
                width: size.width,
                height: size.height,
            }),
            None => Err(Error::DegenerateViewport { width: 0, height: 0 }),
        }
    }

    fn render(&mut self, now: Instant) {
        self.nav.revalidate(&self.collection);
        self.draw_current();
        self.rotation.schedule(now, self.nav.is_paused());
    }

    fn draw_current(&mut self) {
        let viewport = match self.current_viewport() {
            Ok(size) => size,
            Err(err) => {
                debug!(error = %err, "frame skipped");
                return;
            }
        };
        let (file, page_index) = (self.nav.file_index(), self.nav.page_index());
        let Some(page) = self.collection.page(file, page_index) else {
            return;
        };
        let frame = layout::compute(
            page.size(),
            viewport,
            self.nav.fit_mode(),
            self.nav.zoom(),
            self.nav.pan(),
        );
        self.nav.settle_pan(frame.pan);
        if let Err(err) = self.sink.show_page(page, &frame, viewport) {
            warn!(file, page = page_index, error = %err, "render failed; frame skipped");
        }
        self.sink.set_indicator(file + 1, self.collection.len());
    }

    fn follow_selection(&mut self, now: Instant) {
        let selected = self.nav.file_index();
        let fraction = self.carousel.scroll_to(selected, self.scroll_animation, now);
        self.sink.scroll_carousel(fraction);
        for highlight in self.highlighter.start_pulse(selected, now) {
            self.emit_thumbnail(highlight);
        }
    }

    fn emit_thumbnail(&mut self, highlight: Highlight) {
        let Some(item) = self.collection.get(highlight.index) else {
            return;
        };
        let Some(set) = self.thumbnails.get(&item.id) else {
            return;
        };
        let border_color = match highlight.tier {
            Tier::Selected => self.highlight_color,
            Tier::Neighbor | Tier::None => self.background_color,
        };
        self.sink.update_thumbnail(&ThumbnailUpdate {
            index: highlight.index,
            id: item.id.clone(),
            image: set.variant(highlight.tier.variant()).clone(),
            tier: highlight.tier,
            border_px: highlight.border_px,
            border_color,
        });
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Starts a queued reload unless one is already listing.
fn spawn_pending_reload<D, S, V>(
    presenter: &mut Presenter<D, S, V>,
    reloads: &mut JoinSet<Result<Vec<Item>>>,
) where
    D: DocumentSource,
    S: DrawSink,
    V: ViewportProvider,
{
    if !reloads.is_empty() {
        return;
    }
    if let Some(source) = presenter.take_reload_request() {
        reloads.spawn_blocking(move || source.list_items());
    }
}

/// Drives the presenter until quit, cancellation, or forever. Closing the
/// command channel does not stop the rotation. Document listing runs on the
/// blocking pool so timers and commands keep flowing during a reload.
pub async fn run<D, S, V>(
    mut presenter: Presenter<D, S, V>,
    mut commands: Receiver<Command>,
    cancel: CancellationToken,
) -> Result<()>
where
    D: DocumentSource,
    S: DrawSink,
    V: ViewportProvider,
{
    presenter.start(Instant::now());
    let mut commands_open = true;
    let mut reloads: JoinSet<Result<Vec<Item>>> = JoinSet::new();

    loop {
        let deadline = presenter.next_deadline();

        tokio::select! {
            _ = cancel.cancelled() => {
                info!("cancel received; exiting presenter task");
                break;
            }

            cmd = commands.recv(), if commands_open => match cmd {
                Some(cmd) => {
                    if presenter.handle(cmd, Instant::now()) == Flow::Quit {
                        info!("quit requested");
                        break;
                    }
                    spawn_pending_reload(&mut presenter, &mut reloads);
                }
                None => {
                    debug!("command channel closed");
                    commands_open = false;
                }
            },

            Some(joined) = reloads.join_next() => {
                let listed = joined.map_err(anyhow::Error::from).and_then(|listed| listed);
                presenter.finish_reload(listed, Instant::now());
                spawn_pending_reload(&mut presenter, &mut reloads);
            }

            _ = wait_until(deadline) => presenter.on_deadline(Instant::now()),
        }
    }

    presenter.shutdown();
    Ok(())
}
