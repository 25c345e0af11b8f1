//! Interpolation engine seam
//!
//! The engine synthesizes generated annotations between keyframes and removes them again.
//! The geometry lives outside this crate; the coordinator only hands it fully resolved
//! requests.

use crate::annotation::AnnotationHandle;
use crate::error::EngineError;
use crate::locator::SliceContext;
use crate::types::InterpolationUid;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

/// Everything the engine needs to recompute or clean up one group.
#[derive(Debug, Clone)]
pub struct InterpolationRequest {
    /// Keyframe that triggered the request
    pub annotation: AnnotationHandle,
    pub interpolation_uid: Option<InterpolationUid>,
    pub slice: SliceContext,
    /// Set for explicit `InterpolationUpdated` edits: re-derive instead of adjusting
    pub is_interpolation_update: bool,
}

impl InterpolationRequest {
    pub fn new(
        annotation: AnnotationHandle,
        interpolation_uid: Option<InterpolationUid>,
        slice: SliceContext,
    ) -> Self {
        Self {
            annotation,
            interpolation_uid,
            slice,
            is_interpolation_update: false,
        }
    }

    pub fn interpolation_update(mut self, flag: bool) -> Self {
        self.is_interpolation_update = flag;
        self
    }
}

pub trait InterpolationEngine: Send + Sync {
    /// Idempotently recompute the generated members of the request's group.
    fn synthesize(&self, request: &InterpolationRequest) -> Result<(), EngineError>;

    /// Remove every generated member tied to the request's keyframe/group.
    fn delete_generated(&self, request: &InterpolationRequest) -> Result<(), EngineError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineCallKind {
    Synthesize,
    DeleteGenerated,
}

/// One request as seen by [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineCall {
    pub kind: EngineCallKind,
    pub annotation_uid: String,
    pub interpolation_uid: Option<InterpolationUid>,
    pub slice: SliceContext,
    pub is_interpolation_update: bool,
}

/// Engine that records requests without generating geometry.
///
/// Used for dry-run replays and as a test double.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<EngineCall>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    pub fn take_calls(&self) -> Vec<EngineCall> {
        std::mem::take(&mut *self.calls.lock())
    }

    fn record(&self, kind: EngineCallKind, request: &InterpolationRequest) {
        let annotation_uid = request.annotation.read().annotation_uid.clone();
        debug!(
            ?kind,
            annotation = %annotation_uid,
            interpolation_uid = ?request.interpolation_uid,
            "Recorded engine request"
        );
        self.calls.lock().push(EngineCall {
            kind,
            annotation_uid,
            interpolation_uid: request.interpolation_uid.clone(),
            slice: request.slice.clone(),
            is_interpolation_update: request.is_interpolation_update,
        });
    }
}

impl InterpolationEngine for RecordingEngine {
    fn synthesize(&self, request: &InterpolationRequest) -> Result<(), EngineError> {
        self.record(EngineCallKind::Synthesize, request);
        Ok(())
    }

    fn delete_generated(&self, request: &InterpolationRequest) -> Result<(), EngineError> {
        self.record(EngineCallKind::DeleteGenerated, request);
        Ok(())
    }
}
