//! Presentation seam.
//!
//! The synchronization loop calls a [`RenderSink`] each time a region of
//! the view model lands. Renderers read the store; they never write it.

use crate::store::ViewModelStore;

/// Part of the view that changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// The full animal list.
    Animals,
    /// "Your animals".
    YourAnimals,
    /// The feed, including sort mode changes.
    Feed,
    /// Selected animal detail and timeline, or the "none selected" state.
    Selection,
    /// Birth button state and message.
    Birth,
    /// Sign-in state, prompt and notices.
    Auth,
    /// Return nudge.
    Presence,
}

/// Receives render requests from the synchronization loop.
pub trait RenderSink {
    /// Redraw `region` from `store`.
    fn render(&mut self, region: Region, store: &ViewModelStore);
}

/// A sink that draws nothing, for headless runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpRenderer;

impl RenderSink for NoOpRenderer {
    fn render(&mut self, _region: Region, _store: &ViewModelStore) {}
}

/// Records every region it is asked to draw.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    /// Regions in call order.
    pub regions: Vec<Region>,
}

impl RecordingRenderer {
    /// How many times `region` was drawn.
    pub fn count(&self, region: Region) -> usize {
        self.regions.iter().filter(|r| **r == region).count()
    }
}

impl RenderSink for RecordingRenderer {
    fn render(&mut self, region: Region, _store: &ViewModelStore) {
        self.regions.push(region);
    }
}
