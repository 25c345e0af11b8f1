//! Annotation data model
//!
//! A contour annotation lives on one slice of a 3D dataset. The store owns the canonical
//! record; handlers work on a shared [`AnnotationHandle`] and only flip the provenance
//! (`auto_generated`) and grouping (`interpolation_uid`) fields in place.

use crate::types::{InterpolationUid, Vec3};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared, lockable reference to an annotation owned by the store.
pub type AnnotationHandle = Arc<RwLock<Annotation>>;

/// Slice placement and orientation of an annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationMetadata {
    /// Dataset the annotation was drawn on; used to resolve its slice context
    pub frame_of_reference: String,
    pub slice_index: usize,
    pub view_plane_normal: Vec3,
    pub view_up: Vec3,
}

impl AnnotationMetadata {
    /// True when both annotations live in the same slicing plane orientation.
    pub fn same_orientation(&self, other: &AnnotationMetadata) -> bool {
        self.view_plane_normal == other.view_plane_normal && self.view_up == other.view_up
    }
}

/// Segment the contour belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationRef {
    pub segmentation_id: String,
    pub segment_index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    #[serde(default)]
    pub polyline: Vec<Vec3>,
    #[serde(default = "default_closed")]
    pub closed: bool,
}

fn default_closed() -> bool {
    true
}

impl Default for Contour {
    fn default() -> Self {
        Self {
            polyline: Vec::new(),
            closed: default_closed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationData {
    pub segmentation: SegmentationRef,
    #[serde(default)]
    pub contour: Contour,
}

/// A user- or machine-created contour on one slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub annotation_uid: String,
    pub tool_name: String,
    #[serde(default)]
    pub metadata: Option<AnnotationMetadata>,
    pub data: AnnotationData,
    /// Produced by the interpolation engine and not yet confirmed by a user
    #[serde(default)]
    pub auto_generated: bool,
    #[serde(default)]
    pub interpolation_uid: Option<InterpolationUid>,
}

impl Annotation {
    pub fn new(
        annotation_uid: impl Into<String>,
        tool_name: impl Into<String>,
        metadata: AnnotationMetadata,
        segmentation: SegmentationRef,
    ) -> Self {
        Self {
            annotation_uid: annotation_uid.into(),
            tool_name: tool_name.into(),
            metadata: Some(metadata),
            data: AnnotationData {
                segmentation,
                contour: Contour::default(),
            },
            auto_generated: false,
            interpolation_uid: None,
        }
    }

    pub fn with_polyline(mut self, polyline: Vec<Vec3>) -> Self {
        self.data.contour.polyline = polyline;
        self
    }

    pub fn with_interpolation_uid(mut self, uid: impl Into<InterpolationUid>) -> Self {
        self.interpolation_uid = Some(uid.into());
        self
    }

    pub fn generated(mut self) -> Self {
        self.auto_generated = true;
        self
    }

    pub fn into_handle(self) -> AnnotationHandle {
        Arc::new(RwLock::new(self))
    }

    pub fn segment_index(&self) -> u32 {
        self.data.segmentation.segment_index
    }

    pub fn segmentation_id(&self) -> &str {
        &self.data.segmentation.segmentation_id
    }

    pub fn slice_index(&self) -> Option<usize> {
        self.metadata.as_ref().map(|m| m.slice_index)
    }

    /// Mean of the contour points; `None` for an empty contour.
    pub fn center_point(&self) -> Option<Vec3> {
        let points = &self.data.contour.polyline;
        if points.is_empty() {
            return None;
        }
        let mut sum = [0.0; 3];
        for p in points {
            sum[0] += p[0];
            sum[1] += p[1];
            sum[2] += p[2];
        }
        let n = points.len() as f64;
        Some([sum[0] / n, sum[1] / n, sum[2] / n])
    }
}
