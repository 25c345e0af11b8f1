//! Annotation lifecycle events delivered to the manager.

use crate::annotation::AnnotationHandle;
use serde::{Deserialize, Serialize};

/// Kind of modification reported by the annotation host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeType {
    /// Routine handle/point edit
    HandlesUpdated,
    /// Edit that explicitly requests group re-evaluation
    InterpolationUpdated,
    StatsUpdated,
    LabelChange,
    MetadataReferenceModified,
    History,
}

impl ChangeType {
    /// Only handle edits and explicit interpolation updates recompute a group.
    pub fn drives_interpolation(self) -> bool {
        matches!(
            self,
            ChangeType::HandlesUpdated | ChangeType::InterpolationUpdated
        )
    }
}

#[derive(Debug, Clone)]
pub struct AnnotationCompletedEvent {
    pub annotation: AnnotationHandle,
}

#[derive(Debug, Clone)]
pub struct AnnotationModifiedEvent {
    pub annotation: AnnotationHandle,
    pub change_type: ChangeType,
}

#[derive(Debug, Clone)]
pub struct AnnotationRemovedEvent {
    pub annotation: AnnotationHandle,
}

#[derive(Debug, Clone)]
pub enum AnnotationEvent {
    Completed(AnnotationCompletedEvent),
    Modified(AnnotationModifiedEvent),
    Removed(AnnotationRemovedEvent),
}

impl AnnotationEvent {
    pub fn completed(annotation: AnnotationHandle) -> Self {
        AnnotationEvent::Completed(AnnotationCompletedEvent { annotation })
    }

    pub fn modified(annotation: AnnotationHandle, change_type: ChangeType) -> Self {
        AnnotationEvent::Modified(AnnotationModifiedEvent {
            annotation,
            change_type,
        })
    }

    pub fn removed(annotation: AnnotationHandle) -> Self {
        AnnotationEvent::Removed(AnnotationRemovedEvent { annotation })
    }

    pub fn annotation(&self) -> &AnnotationHandle {
        match self {
            AnnotationEvent::Completed(e) => &e.annotation,
            AnnotationEvent::Modified(e) => &e.annotation,
            AnnotationEvent::Removed(e) => &e.annotation,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AnnotationEvent::Completed(_) => "completed",
            AnnotationEvent::Modified(_) => "modified",
            AnnotationEvent::Removed(_) => "removed",
        }
    }
}
