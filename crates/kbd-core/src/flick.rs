//! Flick geometry: drag direction classification and per-direction thresholds.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlickDirection {
    Left,
    Top,
    Right,
    Bottom,
}

impl FlickDirection {
    pub const ALL: [FlickDirection; 4] = [Self::Left, Self::Top, Self::Right, Self::Bottom];

    /// Drag distance that commits to this direction: 25 left and bottom,
    /// 50 top, 70 right, divided by the user sensitivity.
    pub fn asymmetric_threshold(self, user_sensitivity: f64) -> f64 {
        let base = match self {
            Self::Left | Self::Bottom => 25.0,
            Self::Top => 50.0,
            Self::Right => 70.0,
        };
        base / user_sensitivity
    }

    pub fn uniform_threshold(user_sensitivity: f64) -> f64 {
        25.0 / user_sensitivity
    }
}

/// A location in key-view coordinates (points, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Direction of the drag from `self` to `end`, split into four 90° sectors.
    pub fn direction_to(&self, end: &Point) -> FlickDirection {
        let degree = (end.y - self.y).atan2(end.x - self.x).to_degrees();
        if (-135.0..-45.0).contains(&degree) {
            FlickDirection::Top
        } else if (-45.0..45.0).contains(&degree) {
            FlickDirection::Right
        } else if (45.0..135.0).contains(&degree) {
            FlickDirection::Bottom
        } else {
            FlickDirection::Left
        }
    }
}
