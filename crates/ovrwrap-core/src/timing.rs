//! Synthetic frame timing.
//!
//! The runtime only predicts display times; interval and frame indices are
//! derived here from the refresh rate cached at session creation.

use tracing::warn;

use crate::adapter::RuntimeApi;
use crate::types::SessionHandle;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTiming {
    pub app_frame_index: i64,
    pub display_frame_index: i64,
    /// Runtime clock when the timing was produced.
    pub this_frame_seconds: f64,
    /// Predicted time the frame reaches the middle of the display.
    pub display_midpoint_seconds: f64,
    pub next_frame_seconds: f64,
    pub frame_interval_seconds: f64,
}

/// Per-session timing state.
#[derive(Debug, Clone)]
pub struct FrameClock {
    refresh_rate: f32,
    frame_index: i64,
    tracking_sample_time: Option<f64>,
}

impl FrameClock {
    /// `reported` is the runtime's refresh rate; unusable values fall back
    /// to `fallback`.
    pub fn new(reported: f32, fallback: f32) -> Self {
        let refresh_rate = if reported.is_finite() && reported > 0.0 {
            reported
        } else {
            warn!(reported, fallback, "runtime reported no usable refresh rate");
            fallback
        };
        Self {
            refresh_rate,
            frame_index: 0,
            tracking_sample_time: None,
        }
    }

    pub fn refresh_rate(&self) -> f32 {
        self.refresh_rate
    }

    pub fn frame_interval(&self) -> f64 {
        1.0 / f64::from(self.refresh_rate)
    }

    pub fn frame_index(&self) -> i64 {
        self.frame_index
    }

    pub fn set_frame_index(&mut self, frame_index: i64) {
        self.frame_index = frame_index;
    }

    pub fn record_tracking_sample(&mut self, time: f64) {
        self.tracking_sample_time = Some(time);
    }

    pub fn tracking_sample_time(&self) -> Option<f64> {
        self.tracking_sample_time
    }

    pub fn timing(&self, runtime: &dyn RuntimeApi, session: SessionHandle, frame_index: i64) -> FrameTiming {
        let this_frame_seconds = runtime.time_in_seconds();
        let interval = self.frame_interval();
        FrameTiming {
            app_frame_index: frame_index,
            display_frame_index: frame_index,
            this_frame_seconds,
            display_midpoint_seconds: runtime.predicted_display_time(session, frame_index),
            next_frame_seconds: this_frame_seconds + interval,
            frame_interval_seconds: interval,
        }
    }
}
