use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::RgbaImage;
use notice_board::collection::{Item, ItemId, Page};
use notice_board::config::Configuration;
use notice_board::events::Command;
use notice_board::processing::layout::{Frame, Size};
use notice_board::render::{DrawSink, FixedViewport, ThumbnailUpdate};
use notice_board::tasks::documents::DocumentSource;
use notice_board::tasks::presenter::highlight::Tier;
use notice_board::tasks::presenter::{self, Presenter};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct Log {
    frames: usize,
    indicators: Vec<(usize, usize)>,
    overlay: Vec<bool>,
    scrolls: Vec<f64>,
    thumbnails: Vec<(usize, Tier, u8)>,
}

#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Log>>);

impl DrawSink for SharedSink {
    fn show_page(&mut self, _page: &Page, _frame: &Frame, _viewport: Size) -> anyhow::Result<()> {
        self.0.lock().unwrap().frames += 1;
        Ok(())
    }
    fn update_thumbnail(&mut self, update: &ThumbnailUpdate) {
        self.0
            .lock()
            .unwrap()
            .thumbnails
            .push((update.index, update.tier, update.border_px));
    }
    fn scroll_carousel(&mut self, fraction: f64) {
        self.0.lock().unwrap().scrolls.push(fraction);
    }
    fn set_idle_overlay(&mut self, visible: bool) {
        self.0.lock().unwrap().overlay.push(visible);
    }
    fn set_indicator(&mut self, current: usize, total: usize) {
        self.0.lock().unwrap().indicators.push((current, total));
    }
}

#[derive(Clone, Default)]
struct SharedSource(Arc<Mutex<Vec<Item>>>);

impl SharedSource {
    fn set(&self, page_counts: &[usize]) {
        *self.0.lock().unwrap() = items(page_counts);
    }
}

impl DocumentSource for SharedSource {
    fn list_items(&self) -> anyhow::Result<Vec<Item>> {
        Ok(self.0.lock().unwrap().clone())
    }
}

fn items(page_counts: &[usize]) -> Vec<Item> {
    page_counts
        .iter()
        .enumerate()
        .map(|(i, &n)| Item {
            id: ItemId::from(format!("doc-{i}").as_str()),
            pages: (0..n)
                .map(|_| Page::new(Arc::new(RgbaImage::new(64, 48))))
                .collect(),
            thumbnail: Arc::new(RgbaImage::new(16, 12)),
            modified: Default::default(),
        })
        .collect()
}

struct Harness {
    log: Arc<Mutex<Log>>,
    source: SharedSource,
    commands: mpsc::Sender<Command>,
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

fn spawn(cfg: Configuration, page_counts: &[usize]) -> Harness {
    let sink = SharedSink::default();
    let log = sink.0.clone();
    let source = SharedSource::default();
    source.set(page_counts);
    let engine = Presenter::new(
        &cfg,
        Arc::new(source.clone()),
        items(page_counts),
        sink,
        FixedViewport(Size::new(800, 600)),
        Instant::now(),
    )
    .unwrap();
    let (commands, rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(presenter::run(engine, rx, cancel.clone()));
    Harness {
        log,
        source,
        commands,
        cancel,
        handle,
    }
}

fn config(cycle: u64, idle: u64) -> Configuration {
    Configuration {
        cycle_interval: Duration::from_secs(cycle),
        idle_timeout: Duration::from_secs(idle),
        ..Configuration::default()
    }
}

#[tokio::test(start_paused = true)]
async fn rotation_advances_after_interval_then_quits() {
    let h = spawn(config(10, 0), &[2, 1]);
    sleep(Duration::from_secs(1)).await;
    assert_eq!(h.log.lock().unwrap().indicators, vec![(1, 2)]);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(h.log.lock().unwrap().indicators, vec![(1, 2), (1, 2)]);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(h.log.lock().unwrap().indicators.last(), Some(&(2, 2)));

    h.commands.send(Command::Quit).await.unwrap();
    h.handle.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn idle_pauses_rotation_until_interaction() {
    let h = spawn(config(3, 5), &[10]);

    // rotation at 3s, idle at 5s
    sleep(Duration::from_secs(20)).await;
    {
        let log = h.log.lock().unwrap();
        assert_eq!(log.frames, 2);
        assert_eq!(log.overlay, vec![true]);
    }

    h.commands.send(Command::NextPage).await.unwrap();
    sleep(Duration::from_secs(4)).await;
    {
        let log = h.log.lock().unwrap();
        assert_eq!(log.overlay, vec![true, false]);
        assert_eq!(log.frames, 4);
        assert!(log.indicators.iter().all(|&shown| shown == (1, 1)));
    }

    h.cancel.cancel();
    h.handle.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn closed_command_channel_keeps_rotating() {
    let Harness {
        log,
        commands,
        cancel,
        handle,
        ..
    } = spawn(config(3, 0), &[1, 1, 1]);
    drop(commands);
    sleep(Duration::from_secs(7)).await;
    assert_eq!(log.lock().unwrap().frames, 3);

    cancel.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn selection_scrolls_and_pulses() {
    let mut cfg = config(60, 0);
    cfg.carousel.visible_slots = 2;
    cfg.carousel.scroll_animation = true;
    let h = spawn(cfg, &[1, 1, 1, 1, 1]);

    h.commands.send(Command::SelectFile(4)).await.unwrap();
    sleep(Duration::from_secs(1)).await;
    {
        let log = h.log.lock().unwrap();
        assert_eq!(log.scrolls.len(), 11);
        assert_eq!(log.scrolls.first(), Some(&0.0));
        assert_eq!(log.scrolls.last(), Some(&1.0));
        let pulse: Vec<u8> = log
            .thumbnails
            .iter()
            .filter(|(index, tier, _)| *index == 4 && *tier == Tier::Selected)
            .map(|(_, _, px)| *px)
            .collect();
        assert_eq!(pulse, vec![0, 1, 2, 3, 2, 1, 3]);
    }

    h.commands.send(Command::Quit).await.unwrap();
    h.handle.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn reload_swaps_collection_and_resets_selection() {
    let h = spawn(config(60, 0), &[1, 1, 3]);
    h.commands.send(Command::SelectFile(2)).await.unwrap();
    h.commands.send(Command::NextPage).await.unwrap();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(h.log.lock().unwrap().indicators.last(), Some(&(3, 3)));

    h.source.set(&[2, 1]);
    h.commands.send(Command::Reload).await.unwrap();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(h.log.lock().unwrap().indicators.last(), Some(&(1, 2)));

    // rotation was re-armed by the reload and keeps going
    sleep(Duration::from_secs(60)).await;
    assert_eq!(h.log.lock().unwrap().indicators.last(), Some(&(1, 2)));
    sleep(Duration::from_secs(60)).await;
    assert_eq!(h.log.lock().unwrap().indicators.last(), Some(&(2, 2)));

    h.commands.send(Command::Quit).await.unwrap();
    h.handle.await.unwrap().unwrap();
}
