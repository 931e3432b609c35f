//! Slider position <-> speech parameter mapping
//!
//! The options page exposes rate, pitch and volume as integer sliders. Speed
//! uses a two-piece scale so the lower half of the slider covers slow speech
//! (0.1-1.0) and the upper half covers fast speech (1.0-10.0). Pitch and
//! volume are linear.
//!
//! Forward mappers clamp out-of-range positions, inverse mappers clamp their
//! result into the slider range, so neither ever panics.

use crate::{ContextualError, Result};
use tracing::warn;

pub const MIN_RATE: f64 = 0.1;
pub const MAX_RATE: f64 = 10.0;
pub const MIN_PITCH: f64 = 0.1;
pub const MAX_PITCH: f64 = 2.0;
pub const MIN_VOLUME: f64 = 0.1;
pub const MAX_VOLUME: f64 = 1.0;

/// Slider position where the speed scale switches from slow to fast
const SPEED_PIVOT: i32 = 8;

/// The three sliders on the options page
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SliderKind {
    Speed,
    Pitch,
    Volume,
}

impl SliderKind {
    /// Highest valid position (the lowest is always 0)
    pub const fn max(self) -> i32 {
        match self {
            SliderKind::Speed => 16,
            SliderKind::Pitch => 20,
            SliderKind::Volume => 10,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SliderKind::Speed => "speed",
            SliderKind::Pitch => "pitch",
            SliderKind::Volume => "volume",
        }
    }

    /// Clamp a position into `0..=max`, logging when it had to move
    pub fn clamp(self, position: i32) -> i32 {
        let clamped = position.clamp(0, self.max());
        if clamped != position {
            warn!(
                "{} slider position {} out of range, clamped to {}",
                self.name(),
                position,
                clamped
            );
        }
        clamped
    }

    /// Strict variant of [`SliderKind::clamp`] for callers that want to reject input
    pub fn checked(self, position: i32) -> Result<i32> {
        if (0..=self.max()).contains(&position) {
            Ok(position)
        } else {
            Err(ContextualError::InvalidParameter(format!(
                "{} slider position {} outside 0..={}",
                self.name(),
                position,
                self.max()
            )))
        }
    }

    /// Map a slider position to its engine value
    pub fn to_value(self, position: i32) -> f64 {
        match self {
            SliderKind::Speed => speed_from_slider(position),
            SliderKind::Pitch => pitch_from_slider(position),
            SliderKind::Volume => volume_from_slider(position),
        }
    }

    /// Map an engine value back to the nearest slider position
    pub fn to_position(self, value: f64) -> i32 {
        match self {
            SliderKind::Speed => slider_from_speed(value),
            SliderKind::Pitch => slider_from_pitch(value),
            SliderKind::Volume => slider_from_volume(value),
        }
    }
}

/// Speed slider (0-16) to speech rate (0.1-10.0)
pub fn speed_from_slider(position: i32) -> f64 {
    let position = SliderKind::Speed.clamp(position);
    if position <= SPEED_PIVOT {
        MIN_RATE + f64::from(position) * 0.9 / 8.0
    } else {
        1.0 + f64::from(position - SPEED_PIVOT) * 9.0 / 8.0
    }
}

/// Speech rate to the nearest speed slider position
pub fn slider_from_speed(rate: f64) -> i32 {
    if !rate.is_finite() {
        return SPEED_PIVOT;
    }
    let position = if rate <= 1.0 {
        ((rate - MIN_RATE) * 8.0 / 0.9).round()
    } else {
        (f64::from(SPEED_PIVOT) + (rate - 1.0) * 8.0 / 9.0).round()
    };
    SliderKind::Speed.clamp(position as i32)
}

/// Pitch slider (0-20) to pitch (0.1-2.0)
pub fn pitch_from_slider(position: i32) -> f64 {
    let position = SliderKind::Pitch.clamp(position);
    MIN_PITCH + f64::from(position) * 1.9 / 20.0
}

/// Pitch to the nearest pitch slider position
pub fn slider_from_pitch(pitch: f64) -> i32 {
    if !pitch.is_finite() {
        return slider_from_pitch(1.0);
    }
    let position = ((pitch - MIN_PITCH) * 20.0 / 1.9).round();
    SliderKind::Pitch.clamp(position as i32)
}

/// Volume slider (0-10) to volume (0.1-1.0)
pub fn volume_from_slider(position: i32) -> f64 {
    let position = SliderKind::Volume.clamp(position);
    MIN_VOLUME + f64::from(position) * 0.9 / 10.0
}

/// Volume to the nearest volume slider position
pub fn slider_from_volume(volume: f64) -> i32 {
    if !volume.is_finite() {
        return SliderKind::Volume.max();
    }
    let position = ((volume - MIN_VOLUME) * 10.0 / 0.9).round();
    SliderKind::Volume.clamp(position as i32)
}

/// Format an engine value the way the options page labels it ("1.0")
pub fn display_value(value: f64) -> String {
    format!("{:.1}", value)
}
