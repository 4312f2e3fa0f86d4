//! Interactive redaction session.
//!
//! A session owns one open document, renders its current page once, and
//! accumulates the rectangles a user marks on that page with pairs of clicks.
//! Region bookkeeping lives in [`Selection`], a plain value with pure
//! transitions; the session adds rendering, page navigation, and the preview
//! projection on top.

use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;

use crate::error::RedactError;
use crate::events::{EventSink, RedactionEvent, default_sink};
use crate::mask::{MaskMode, PageRegions, Region, masker, overlay};
use crate::pipeline::committer::{CommitReport, RedactionCommitter};
use crate::render::{self, PageSource};

/// A second click must be more than this many pixels away from the first on
/// both axes for a rectangle to be recorded.
pub const MIN_SELECTION_SIDE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No document.
    Empty,
    /// Document loaded, no rectangle in progress.
    Loaded,
    /// First corner of a rectangle recorded, waiting for the second.
    Selecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    Click { x: i32, y: i32 },
    Undo,
    Clear,
}

/// What a [`SelectionEvent`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    CornerSet { x: i32, y: i32 },
    RegionAdded { index: usize, region: Region },
    SelectionDiscarded { width: u32, height: u32 },
    Undone(Option<Region>),
    Cleared,
}

/// Regions marked on one page plus the corner of a rectangle in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    regions: Vec<Region>,
    pending: Option<(i32, i32)>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn pending_corner(&self) -> Option<(i32, i32)> {
        self.pending
    }

    /// Applies one event on a page of `bounds` pixels.
    ///
    /// Click coordinates are clamped into `[0,width] × [0,height]`, so every
    /// recorded region lies on the page.
    pub fn apply(mut self, event: SelectionEvent, bounds: (u32, u32)) -> (Self, Transition) {
        match event {
            SelectionEvent::Click { x, y } => {
                let x = x.clamp(0, i32::try_from(bounds.0).unwrap_or(i32::MAX));
                let y = y.clamp(0, i32::try_from(bounds.1).unwrap_or(i32::MAX));
                let transition = match self.pending.take() {
                    None => {
                        self.pending = Some((x, y));
                        Transition::CornerSet { x, y }
                    }
                    Some((x1, y1)) => {
                        let width = x.abs_diff(x1);
                        let height = y.abs_diff(y1);
                        if width > MIN_SELECTION_SIDE && height > MIN_SELECTION_SIDE {
                            let region = Region::new(x.min(x1), y.min(y1), width, height);
                            self.regions.push(region);
                            Transition::RegionAdded {
                                index: self.regions.len() - 1,
                                region,
                            }
                        } else {
                            Transition::SelectionDiscarded { width, height }
                        }
                    }
                };
                (self, transition)
            }
            SelectionEvent::Undo => {
                self.pending = None;
                let removed = self.regions.pop();
                (self, Transition::Undone(removed))
            }
            SelectionEvent::Clear => {
                self.pending = None;
                self.regions.clear();
                (self, Transition::Cleared)
            }
        }
    }
}

/// Result of [`RedactionSession::click`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    CornerSet { x: i32, y: i32 },
    RegionAdded { index: usize, region: Region },
    SelectionDiscarded { width: u32, height: u32 },
}

struct LoadedDocument {
    document: Box<dyn PageSource>,
    current_page: u32,
    base_raster: DynamicImage,
    selection: Selection,
}

impl LoadedDocument {
    fn bounds(&self) -> (u32, u32) {
        (self.base_raster.width(), self.base_raster.height())
    }
}

pub struct RedactionSession {
    render_scale: f32,
    mode: MaskMode,
    sink: Arc<dyn EventSink>,
    loaded: Option<LoadedDocument>,
}

impl RedactionSession {
    pub fn new(render_scale: f32) -> Self {
        Self::with_sink(render_scale, default_sink())
    }

    pub fn with_sink(render_scale: f32, sink: Arc<dyn EventSink>) -> Self {
        Self {
            render_scale,
            mode: MaskMode::default(),
            sink,
            loaded: None,
        }
    }

    pub fn state(&self) -> SessionState {
        match &self.loaded {
            None => SessionState::Empty,
            Some(l) if l.selection.pending.is_some() => SessionState::Selecting,
            Some(_) => SessionState::Loaded,
        }
    }

    pub fn render_scale(&self) -> f32 {
        self.render_scale
    }

    pub fn mode(&self) -> MaskMode {
        self.mode
    }

    pub fn current_page(&self) -> Option<u32> {
        self.loaded.as_ref().map(|l| l.current_page)
    }

    pub fn page_count(&self) -> Option<u32> {
        self.loaded.as_ref().map(|l| l.document.page_count())
    }

    pub fn regions(&self) -> &[Region] {
        self.loaded
            .as_ref()
            .map(|l| l.selection.regions())
            .unwrap_or(&[])
    }

    pub fn pending_corner(&self) -> Option<(i32, i32)> {
        self.loaded.as_ref().and_then(|l| l.selection.pending)
    }

    /// The unmasked render of the current page.
    pub fn base_raster(&self) -> Option<&DynamicImage> {
        self.loaded.as_ref().map(|l| &l.base_raster)
    }

    fn loaded(&self) -> crate::error::Result<&LoadedDocument> {
        self.loaded.as_ref().ok_or(RedactError::NoDocumentLoaded)
    }

    fn render_page(&self, document: &dyn PageSource, page: u32) -> crate::error::Result<DynamicImage> {
        let raster = render::render(document, page, self.render_scale)?;
        self.sink.emit(RedactionEvent::PageRendered {
            page,
            width: raster.width(),
            height: raster.height(),
        });
        Ok(raster)
    }

    /// Replaces the session's document and shows its first page.
    ///
    /// On failure the previous document, page, and regions are kept.
    pub fn load_document(&mut self, document: Box<dyn PageSource>) -> crate::error::Result<()> {
        let page_count = document.page_count();
        if page_count == 0 {
            return Err(RedactError::EmptyDocument);
        }
        let base_raster = self.render_page(document.as_ref(), 1)?;

        self.loaded = Some(LoadedDocument {
            document,
            current_page: 1,
            base_raster,
            selection: Selection::new(),
        });
        self.sink.emit(RedactionEvent::DocumentLoaded { page_count });
        Ok(())
    }

    /// Moves to page `page` (1-based), discarding the current page's regions.
    ///
    /// An invalid page number leaves the session untouched.
    pub fn change_page(&mut self, page: u32) -> crate::error::Result<()> {
        let loaded = self.loaded()?;
        render::check_page(loaded.document.as_ref(), page)?;
        let base_raster = self.render_page(loaded.document.as_ref(), page)?;

        if let Some(loaded) = self.loaded.as_mut() {
            loaded.current_page = page;
            loaded.base_raster = base_raster;
            loaded.selection = Selection::new();
        }
        Ok(())
    }

    /// Records a click at raster coordinates `(x, y)`.
    pub fn click(&mut self, x: i32, y: i32) -> crate::error::Result<ClickOutcome> {
        let loaded = self.loaded.as_mut().ok_or(RedactError::NoDocumentLoaded)?;
        let page = loaded.current_page;
        let bounds = loaded.bounds();

        let selection = std::mem::take(&mut loaded.selection);
        let (selection, transition) = selection.apply(SelectionEvent::Click { x, y }, bounds);
        loaded.selection = selection;

        let outcome = match transition {
            Transition::CornerSet { x, y } => {
                self.sink.emit(RedactionEvent::CornerSet { page, x, y });
                ClickOutcome::CornerSet { x, y }
            }
            Transition::RegionAdded { index, region } => {
                self.sink.emit(RedactionEvent::RegionAdded {
                    page,
                    index,
                    region,
                });
                ClickOutcome::RegionAdded { index, region }
            }
            Transition::SelectionDiscarded { width, height } => {
                self.sink.emit(RedactionEvent::SelectionDiscarded {
                    page,
                    width,
                    height,
                });
                ClickOutcome::SelectionDiscarded { width, height }
            }
            Transition::Undone(_) | Transition::Cleared => {
                unreachable!("click never undoes or clears")
            }
        };
        Ok(outcome)
    }

    /// Removes the most recent region, if any.
    pub fn undo(&mut self) -> Option<Region> {
        let loaded = self.loaded.as_mut()?;
        let bounds = loaded.bounds();
        let selection = std::mem::take(&mut loaded.selection);
        let (selection, transition) = selection.apply(SelectionEvent::Undo, bounds);
        loaded.selection = selection;
        match transition {
            Transition::Undone(removed) => removed,
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        if let Some(loaded) = self.loaded.as_mut() {
            let bounds = loaded.bounds();
            let selection = std::mem::take(&mut loaded.selection);
            loaded.selection = selection.apply(SelectionEvent::Clear, bounds).0;
        }
    }

    /// Changes the mask applied to every region. Regions and any pending
    /// corner are kept.
    pub fn set_mode(&mut self, mode: MaskMode) {
        self.mode = mode;
    }

    /// Masked render of the current page with region outlines, 1-based
    /// labels, and the pending-corner marker.
    pub fn render_preview(&self) -> crate::error::Result<DynamicImage> {
        let loaded = self.loaded()?;
        let regions = loaded.selection.regions();

        let masked = masker::apply(&loaded.base_raster, regions, self.mode);
        let mut canvas = masked.to_rgb8();
        overlay::draw_regions(&mut canvas, regions);
        if let Some((x, y)) = loaded.selection.pending {
            overlay::draw_marker(&mut canvas, x, y);
        }
        Ok(DynamicImage::ImageRgb8(canvas))
    }

    /// Masked render of the current page at `render_scale * factor`, with
    /// region coordinates scaled to match. No overlay is drawn.
    pub fn render_preview_scaled(&self, factor: f32) -> crate::error::Result<DynamicImage> {
        let loaded = self.loaded()?;
        let raster = render::render(
            loaded.document.as_ref(),
            loaded.current_page,
            self.render_scale * factor,
        )?;
        let scaled: Vec<Region> = loaded
            .selection
            .regions()
            .iter()
            .map(|r| r.scaled(factor))
            .collect();
        Ok(masker::apply(&raster, &scaled, self.mode))
    }

    /// One line per region: `"1. (x, y) → w×h"`.
    pub fn describe_regions(&self) -> String {
        self.regions()
            .iter()
            .enumerate()
            .map(|(i, r)| format!("{}. {}", i + 1, r))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The current page's regions as a commit mapping.
    pub fn page_regions(&self) -> crate::error::Result<PageRegions> {
        let loaded = self.loaded()?;
        let mut mapping = PageRegions::new(loaded.document.page_count());
        if !loaded.selection.regions().is_empty() {
            mapping.insert(loaded.current_page, loaded.selection.regions().to_vec())?;
        }
        Ok(mapping)
    }

    /// A committer at this session's scale, reporting to the same sink.
    pub fn committer(&self) -> RedactionCommitter {
        RedactionCommitter::with_sink(self.render_scale, self.sink.clone())
    }

    /// Commits the current page's regions to `output`.
    ///
    /// The committer must render at the session's scale so that regions land
    /// on the same pixels the preview showed.
    pub fn export(
        &self,
        committer: &RedactionCommitter,
        output: &Path,
    ) -> crate::error::Result<CommitReport> {
        let loaded = self.loaded()?;
        if loaded.selection.regions().is_empty() {
            return Err(RedactError::NothingToRedact);
        }
        if committer.render_scale() != self.render_scale {
            return Err(RedactError::config(format!(
                "committer renders at {} but regions were marked at {}",
                committer.render_scale(),
                self.render_scale
            )));
        }
        let page_regions = self.page_regions()?;
        committer.commit_to_file(loaded.document.as_ref(), &page_regions, self.mode, output)
    }
}
