// Structured events emitted by the session and committer.
//
// Components receive an `Arc<dyn EventSink>` at construction. The default sink
// forwards to `tracing`; the binary decides where that goes.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::mask::{MaskMode, Region};

#[derive(Debug, Clone, PartialEq)]
pub enum RedactionEvent {
    DocumentLoaded {
        page_count: u32,
    },
    PageRendered {
        page: u32,
        width: u32,
        height: u32,
    },
    CornerSet {
        page: u32,
        x: i32,
        y: i32,
    },
    RegionAdded {
        page: u32,
        index: usize,
        region: Region,
    },
    /// Second click produced a rectangle too small to be intentional.
    SelectionDiscarded {
        page: u32,
        width: u32,
        height: u32,
    },
    /// Region skipped because its box has no area once clamped to the page.
    RegionDropped {
        page: u32,
        index: usize,
        region: Region,
    },
    PageMasked {
        page: u32,
        regions: usize,
    },
    CommitStarted {
        page_count: u32,
        masked_pages: usize,
        mode: MaskMode,
    },
    CommitFinished {
        page_count: u32,
        output: Option<PathBuf>,
    },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: RedactionEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: RedactionEvent) {
        match event {
            RedactionEvent::DocumentLoaded { page_count } => {
                info!(page_count, "document_loaded");
            }
            RedactionEvent::PageRendered {
                page,
                width,
                height,
            } => {
                debug!(page, width, height, "page_rendered");
            }
            RedactionEvent::CornerSet { page, x, y } => {
                debug!(page, x, y, "corner_set");
            }
            RedactionEvent::RegionAdded {
                page,
                index,
                region,
            } => {
                debug!(page, index, %region, "region_added");
            }
            RedactionEvent::SelectionDiscarded {
                page,
                width,
                height,
            } => {
                debug!(page, width, height, "selection_discarded");
            }
            RedactionEvent::RegionDropped {
                page,
                index,
                region,
            } => {
                warn!(page, index, %region, "region_dropped: empty after clamping to page");
            }
            RedactionEvent::PageMasked { page, regions } => {
                debug!(page, regions, "page_masked");
            }
            RedactionEvent::CommitStarted {
                page_count,
                masked_pages,
                mode,
            } => {
                info!(page_count, masked_pages, %mode, "redacting_document");
            }
            RedactionEvent::CommitFinished { page_count, output } => match output {
                Some(path) => info!(page_count, output = %path.display(), "redaction_complete"),
                None => info!(page_count, "redaction_complete"),
            },
        }
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<RedactionEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RedactionEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: RedactionEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// The sink components use when none is injected.
pub fn default_sink() -> Arc<dyn EventSink> {
    Arc::new(TracingSink)
}
