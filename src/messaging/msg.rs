/// Message types carried on the bus.
///
/// Shapes follow the usual robotics velocity command: a `Twist` with a linear
/// and an angular component. The game only reads `linear.x` / `linear.y`.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Velocity command in free space.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Twist {
    pub linear: Vector3,
    pub angular: Vector3,
}

impl Twist {
    /// Planar command with no angular part.
    pub const fn planar(x: f64, y: f64) -> Self {
        Self {
            linear: Vector3::new(x, y, 0.0),
            angular: Vector3::ZERO,
        }
    }
}

/// A message addressed to a topic.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope {
    pub topic: String,
    pub twist: Twist,
}

impl Envelope {
    pub fn new(topic: impl Into<String>, twist: Twist) -> Self {
        Self {
            topic: topic.into(),
            twist,
        }
    }
}
