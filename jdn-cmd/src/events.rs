//! Dashboard events and the dispatcher that fans them out to named handlers.
//!
//! Handlers run synchronously, in registration order, on the task that
//! dispatches. Binding events to a map or DOM stays with the embedding UI.

use jdn_core::garden_key::GardenKey;
use jdn_core::layer::LayerKind;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    GardenSelected {
        key: GardenKey,
    },
    StatisticsLoaded {
        key: GardenKey,
        total_grams: f64,
        varieties: usize,
    },
    LoadFailed {
        key: GardenKey,
        message: String,
        retryable: bool,
    },
    ExportWritten {
        key: GardenKey,
        path: PathBuf,
    },
    LayerLoaded {
        kind: LayerKind,
        features: usize,
    },
    LayerFailed {
        kind: LayerKind,
        message: String,
    },
    TimelineTick {
        year: i32,
    },
}

impl DashboardEvent {
    /// Short event name, as used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            DashboardEvent::GardenSelected { .. } => "garden_selected",
            DashboardEvent::StatisticsLoaded { .. } => "statistics_loaded",
            DashboardEvent::LoadFailed { .. } => "load_failed",
            DashboardEvent::ExportWritten { .. } => "export_written",
            DashboardEvent::LayerLoaded { .. } => "layer_loaded",
            DashboardEvent::LayerFailed { .. } => "layer_failed",
            DashboardEvent::TimelineTick { .. } => "timeline_tick",
        }
    }
}

pub type EventHandler = Box<dyn Fn(&DashboardEvent) + Send + Sync>;

#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<(String, EventHandler)>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`. Re-registering a name replaces the
    /// previous handler and keeps its position.
    pub fn register<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&DashboardEvent) + Send + Sync + 'static,
    {
        match self.handlers.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, slot)) => *slot = Box::new(handler),
            None => self.handlers.push((name.to_string(), Box::new(handler))),
        }
    }

    /// Remove the handler registered as `name`; false if there was none.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(existing, _)| existing != name);
        self.handlers.len() != before
    }

    pub fn dispatch(&self, event: &DashboardEvent) {
        log::debug!("event: {} -> {} handlers", event.name(), self.handlers.len());
        for (_, handler) in &self.handlers {
            handler(event);
        }
    }

    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handler_names())
            .finish()
    }
}
