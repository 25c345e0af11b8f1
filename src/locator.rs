//! Slice context resolution
//!
//! Maps an annotation to the dataset context it lives in: the group selector used for
//! store queries plus the slice geometry handed to the interpolation engine.

use crate::annotation::Annotation;
use crate::types::GroupSelector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Resolved context of one annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceContext {
    pub group_selector: GroupSelector,
    pub number_of_slices: usize,
    pub current_slice_index: usize,
}

pub trait SliceLocator: Send + Sync {
    /// `None` when no viewport/dataset context holds the annotation.
    fn resolve(&self, annotation: &Annotation) -> Option<SliceContext>;
}

/// Slice layout of one frame of reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameLayout {
    pub frame_of_reference: String,
    pub number_of_slices: usize,
    /// Selector to use for store queries; defaults to the frame of reference itself
    #[serde(default)]
    pub group_selector: Option<GroupSelector>,
}

impl FrameLayout {
    pub fn new(frame_of_reference: impl Into<String>, number_of_slices: usize) -> Self {
        Self {
            frame_of_reference: frame_of_reference.into(),
            number_of_slices,
            group_selector: None,
        }
    }

    pub fn selector(&self) -> GroupSelector {
        self.group_selector
            .clone()
            .unwrap_or_else(|| GroupSelector::new(self.frame_of_reference.clone()))
    }
}

/// Locator backed by a static table of frames of reference.
///
/// The current slice is the annotation's own slice; annotations whose slice index falls
/// outside the frame do not resolve.
#[derive(Debug, Default, Clone)]
pub struct FrameOfReferenceLocator {
    frames: HashMap<String, FrameLayout>,
}

impl FrameOfReferenceLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frames(frames: impl IntoIterator<Item = FrameLayout>) -> Self {
        let mut locator = Self::new();
        for frame in frames {
            locator.add_frame(frame);
        }
        locator
    }

    pub fn add_frame(&mut self, frame: FrameLayout) {
        self.frames.insert(frame.frame_of_reference.clone(), frame);
    }

    pub fn selector_for(&self, frame_of_reference: &str) -> Option<GroupSelector> {
        self.frames.get(frame_of_reference).map(FrameLayout::selector)
    }
}

impl SliceLocator for FrameOfReferenceLocator {
    fn resolve(&self, annotation: &Annotation) -> Option<SliceContext> {
        let metadata = annotation.metadata.as_ref()?;
        let frame = self.frames.get(&metadata.frame_of_reference)?;
        if metadata.slice_index >= frame.number_of_slices {
            debug!(
                annotation = %annotation.annotation_uid,
                slice_index = metadata.slice_index,
                number_of_slices = frame.number_of_slices,
                "Slice index outside frame"
            );
            return None;
        }
        Some(SliceContext {
            group_selector: frame.selector(),
            number_of_slices: frame.number_of_slices,
            current_slice_index: metadata.slice_index,
        })
    }
}
