//! Filter for the batch accept operation.

use crate::annotation::Annotation;
use serde::{Deserialize, Serialize};

/// Which generated annotations to accept. Present fields are AND-ed; absent fields match
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptInterpolationSelector {
    /// Restrict to these tools (intersected with the registered tools)
    #[serde(default)]
    pub tool_names: Option<Vec<String>>,
    #[serde(default)]
    pub segmentation_id: Option<String>,
    #[serde(default)]
    pub segment_index: Option<u32>,
    #[serde(default)]
    pub slice_index: Option<usize>,
}

impl AcceptInterpolationSelector {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn segment_index(mut self, segment_index: u32) -> Self {
        self.segment_index = Some(segment_index);
        self
    }

    pub fn slice_index(mut self, slice_index: usize) -> Self {
        self.slice_index = Some(slice_index);
        self
    }

    pub fn segmentation_id(mut self, segmentation_id: impl Into<String>) -> Self {
        self.segmentation_id = Some(segmentation_id.into());
        self
    }

    pub fn tool_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tool_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Field filters only; provenance and tool name are checked by the caller.
    pub fn matches(&self, annotation: &Annotation) -> bool {
        if let Some(segment_index) = self.segment_index {
            if annotation.segment_index() != segment_index {
                return false;
            }
        }
        if let Some(slice_index) = self.slice_index {
            if annotation.slice_index() != Some(slice_index) {
                return false;
            }
        }
        if let Some(segmentation_id) = &self.segmentation_id {
            if annotation.segmentation_id() != segmentation_id {
                return false;
            }
        }
        true
    }
}
