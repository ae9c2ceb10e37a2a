//! Detection queue and the worker thread that drains it.
//!
//! The log watcher only enqueues requests; capture, OCR and matching run on
//! the worker so a slow pass never delays reading the log.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local};

use crate::capture::ScreenSource;
use crate::catalog::{CatalogItem, CatalogOptions, ItemSource, load_catalog};
use crate::detection::{DetectionSettings, detect_items};
use crate::matching::{Matcher, MatcherCache};
use crate::ocr::OcrEngine;

/// One reward screen to process.
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    /// Sequence number (1-based)
    pub id: u32,
    pub requested_at: DateTime<Local>,
}

impl DetectionRequest {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            requested_at: Local::now(),
        }
    }
}

/// Creates the request queue. Unbounded: requests wait while a pass is running.
pub fn create_detection_queue() -> (Sender<DetectionRequest>, Receiver<DetectionRequest>) {
    channel()
}

/// Supplies the matcher for each detection pass.
pub trait MatcherProvider: Send {
    fn matcher(&mut self) -> Result<Arc<Matcher>>;
}

/// A matcher built once for a fixed catalog.
impl MatcherProvider for Arc<Matcher> {
    fn matcher(&mut self) -> Result<Arc<Matcher>> {
        Ok(Arc::clone(self))
    }
}

/// Reloads the catalog before every pass and rebuilds the matcher only when
/// the catalog changed. Cheap while the item cache is fresh.
pub struct CatalogMatchers<S> {
    source: S,
    options: CatalogOptions,
    max_distance: usize,
    cache: MatcherCache,
}

impl<S: ItemSource> CatalogMatchers<S> {
    pub fn new(source: S, options: CatalogOptions, max_distance: usize) -> Self {
        Self {
            source,
            options,
            max_distance,
            cache: MatcherCache::new(),
        }
    }
}

impl<S: ItemSource + Send> MatcherProvider for CatalogMatchers<S> {
    fn matcher(&mut self) -> Result<Arc<Matcher>> {
        let catalog = load_catalog(&self.source, &self.options)?;
        // Only the first load may force a refresh.
        self.options.refresh = false;
        Ok(self
            .cache
            .get_or_build(&catalog.fingerprint(), &catalog.items, self.max_distance))
    }
}

/// Everything one detection pass needs.
pub struct Pipeline {
    pub screen: Box<dyn ScreenSource>,
    pub ocr: Box<dyn OcrEngine>,
    pub matchers: Box<dyn MatcherProvider>,
    pub settings: DetectionSettings,
    /// Wait before capturing, so the reward screen has finished drawing.
    pub capture_delay: Duration,
}

impl Pipeline {
    /// Captures the screen and identifies the rewards on it.
    pub fn run_once(&mut self) -> Result<Vec<CatalogItem>> {
        let matcher = self.matchers.matcher()?;
        if !self.capture_delay.is_zero() {
            thread::sleep(self.capture_delay);
        }
        let img = self.screen.capture()?;
        let items = detect_items(&img, self.ocr.as_ref(), &matcher, &self.settings)?;
        Ok(items.into_iter().cloned().collect())
    }
}

/// Runs the worker loop.
///
/// Processes requests until the channel is closed (sender dropped). A failed
/// pass is logged and the worker moves on to the next request.
///
/// This function blocks until the channel closes, so it should be run in a
/// dedicated thread.
pub fn run_detection_worker(
    receiver: Receiver<DetectionRequest>,
    mut pipeline: Pipeline,
    mut on_items: impl FnMut(&DetectionRequest, &[CatalogItem]),
) {
    log::debug!("Detection worker started");

    while let Ok(request) = receiver.recv() {
        log::info!(
            "Detection #{} (requested {})",
            request.id,
            request.requested_at.format("%H:%M:%S")
        );

        match pipeline.run_once() {
            Ok(items) => on_items(&request, &items),
            Err(e) => log::error!("Detection #{} failed: {:#}", request.id, e),
        }
    }

    log::debug!("Detection worker: channel closed, exiting");
}

/// Starts [`run_detection_worker`] on its own thread.
pub fn spawn_detection_worker(
    receiver: Receiver<DetectionRequest>,
    pipeline: Pipeline,
    on_items: impl FnMut(&DetectionRequest, &[CatalogItem]) + Send + 'static,
) -> Result<thread::JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("detection".to_string())
        .spawn(move || run_detection_worker(receiver, pipeline, on_items))?;
    Ok(handle)
}
