//! Playback through the historical family-garden snapshots.
//!
//! Ticks come from a `tokio` interval; a `watch` channel carrying `true`
//! stops playback.

use crate::events::{DashboardEvent, EventDispatcher};
use jdn_core::layer::SNAPSHOT_YEARS;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    years: Vec<i32>,
    position: Option<usize>,
}

impl Default for Timeline {
    fn default() -> Self {
        Timeline::new(SNAPSHOT_YEARS.to_vec())
    }
}

impl Timeline {
    pub fn new(years: Vec<i32>) -> Self {
        Self {
            years,
            position: None,
        }
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Year shown, `None` before the first tick.
    pub fn current(&self) -> Option<i32> {
        self.position.map(|i| self.years[i])
    }

    /// Move to the next year, wrapping after the last one.
    pub fn advance(&mut self) -> Option<i32> {
        if self.years.is_empty() {
            return None;
        }
        let next = match self.position {
            Some(i) => (i + 1) % self.years.len(),
            None => 0,
        };
        self.position = Some(next);
        self.current()
    }

    pub fn reset(&mut self) {
        self.position = None;
    }

    /// Advance every `period`, dispatching a [`DashboardEvent::TimelineTick`]
    /// per year shown. Stops after `ticks` ticks when given, or once
    /// `cancel` holds `true`. Returns the number of ticks emitted.
    pub async fn play(
        &mut self,
        period: Duration,
        ticks: Option<usize>,
        mut cancel: watch::Receiver<bool>,
        events: &EventDispatcher,
    ) -> usize {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut listening = true;
        let mut emitted = 0;

        loop {
            if ticks.is_some_and(|max| emitted >= max) || *cancel.borrow() {
                break;
            }
            tokio::select! {
                changed = cancel.changed(), if listening => match changed {
                    Ok(()) if *cancel.borrow() => break,
                    Ok(()) => {}
                    // sender gone: nobody can cancel any more
                    Err(_) => listening = false,
                },
                _ = interval.tick() => match self.advance() {
                    Some(year) => {
                        log::debug!("timeline: {}", year);
                        events.dispatch(&DashboardEvent::TimelineTick { year });
                        emitted += 1;
                    }
                    None => break,
                },
            }
        }
        emitted
    }
}
