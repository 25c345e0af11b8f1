//! Core value types shared across the crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point or direction in patient/world space.
pub type Vec3 = [f64; 3];

/// Identifier shared by every member of one interpolation group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterpolationUid(String);

impl InterpolationUid {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterpolationUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InterpolationUid {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for InterpolationUid {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Opaque dataset/viewport scope used to query the annotation store.
///
/// Only compared for equality and hashed; its contents are never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupSelector(String);

impl GroupSelector {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn sub(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: &Vec3, b: &Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Distance between two points after removing the component along `normal`.
///
/// A zero normal degrades to plain Euclidean distance.
pub fn in_plane_distance(a: &Vec3, b: &Vec3, normal: &Vec3) -> f64 {
    let d = sub(a, b);
    let n2 = dot(normal, normal);
    if n2 == 0.0 {
        return dot(&d, &d).sqrt();
    }
    let along = dot(&d, normal) / n2;
    let projected = [
        d[0] - along * normal[0],
        d[1] - along * normal[1],
        d[2] - along * normal[2],
    ];
    dot(&projected, &projected).sqrt()
}
