//! Scenario replay
//!
//! Drives an [`InterpolationManager`] through a recorded sequence of annotation lifecycle
//! steps, using the in-memory store, the frame-of-reference locator and the recording
//! engine. Events travel through the [`AnnotationEventBus`] exactly as a host would emit
//! them. The report lists the final annotations and every engine request.

use crate::annotation::{Annotation, AnnotationHandle};
use crate::bus::{AnnotationEventBus, EventDispatcher};
use crate::config::GroupsConfig;
use crate::engine::{EngineCall, RecordingEngine};
use crate::error::InterpolationError;
use crate::events::{AnnotationEvent, ChangeType};
use crate::locator::{FrameLayout, FrameOfReferenceLocator};
use crate::manager::{AcceptInterpolationSelector, InterpolationManager, Outcome};
use crate::store::InMemoryAnnotationStore;
use crate::types::{InterpolationUid, Vec3};
use crate::uid::SequentialUidGenerator;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// A replayable scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Tools registered in addition to the configured ones
    #[serde(default)]
    pub tools: Vec<String>,
    pub frames: Vec<FrameLayout>,
    #[serde(default)]
    pub steps: Vec<ReplayStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ReplayStep {
    /// Seed the store without emitting an event
    Insert { annotation: Annotation },
    /// Add the annotation to the store and emit a completion event
    Complete { annotation: Annotation },
    /// Optionally replace the contour, then emit a modification event
    Modify {
        annotation_uid: String,
        change_type: ChangeType,
        #[serde(default)]
        polyline: Option<Vec<Vec3>>,
    },
    /// Remove the annotation from the store and emit a removal event
    Remove { annotation_uid: String },
    /// Accept generated annotations in one frame of reference
    Accept {
        frame_of_reference: String,
        #[serde(default)]
        filter: AcceptInterpolationSelector,
    },
}

impl Scenario {
    /// Parse a scenario from JSON, or TOML when the path ends in `.toml`.
    pub fn load(path: &Path) -> Result<Self, InterpolationError> {
        let raw = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);
        if is_toml {
            toml::from_str(&raw).map_err(|e| InterpolationError::InvalidScenario(e.to_string()))
        } else {
            serde_json::from_str(&raw)
                .map_err(|e| InterpolationError::InvalidScenario(e.to_string()))
        }
    }
}

/// Final state of one annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationRow {
    pub group_selector: String,
    pub annotation_uid: String,
    pub tool_name: String,
    pub slice_index: Option<usize>,
    pub segmentation_id: String,
    pub segment_index: u32,
    pub interpolation_uid: Option<InterpolationUid>,
    pub auto_generated: bool,
}

impl AnnotationRow {
    fn from_annotation(group_selector: String, annotation: &Annotation) -> Self {
        Self {
            group_selector,
            annotation_uid: annotation.annotation_uid.clone(),
            tool_name: annotation.tool_name.clone(),
            slice_index: annotation.slice_index(),
            segmentation_id: annotation.segmentation_id().to_string(),
            segment_index: annotation.segment_index(),
            interpolation_uid: annotation.interpolation_uid.clone(),
            auto_generated: annotation.auto_generated,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub op: String,
    pub outcome: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepReport>,
    pub annotations: Vec<AnnotationRow>,
    pub engine_calls: Vec<EngineCall>,
}

#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Mint `group-<n>` identifiers instead of hashed ones
    pub sequential_uids: bool,
}

pub struct ReplayRunner {
    store: Arc<InMemoryAnnotationStore>,
    locator: Arc<FrameOfReferenceLocator>,
    engine: Arc<RecordingEngine>,
    bus: AnnotationEventBus,
    dispatcher: EventDispatcher,
}

impl ReplayRunner {
    pub fn new(config: &GroupsConfig, scenario: &Scenario, options: &ReplayOptions) -> Self {
        let store = Arc::new(InMemoryAnnotationStore::new());
        let locator = Arc::new(FrameOfReferenceLocator::with_frames(
            scenario.frames.iter().cloned(),
        ));
        let engine = Arc::new(RecordingEngine::new());

        let mut manager =
            InterpolationManager::from_config(config, store.clone(), locator.clone(), engine.clone());
        if options.sequential_uids {
            manager = manager.with_uid_generator(Arc::new(SequentialUidGenerator::new("group")));
        }
        for tool in &scenario.tools {
            manager.add_tool(tool.clone());
        }

        let (bus, receiver) = AnnotationEventBus::new_pair();
        let dispatcher = EventDispatcher::new(Arc::new(manager), receiver);
        Self {
            store,
            locator,
            engine,
            bus,
            dispatcher,
        }
    }

    pub fn run(&self, scenario: &Scenario) -> Result<ReplayReport, InterpolationError> {
        let mut steps = Vec::with_capacity(scenario.steps.len());
        for (index, step) in scenario.steps.iter().enumerate() {
            let (op, outcome) = self.apply(step)?;
            steps.push(StepReport {
                step: index + 1,
                op: op.to_string(),
                outcome,
            });
        }

        let annotations = self
            .store
            .snapshot()
            .iter()
            .map(|(selector, annotation)| {
                AnnotationRow::from_annotation(selector.to_string(), annotation)
            })
            .collect();
        info!(steps = steps.len(), "Replay finished");
        Ok(ReplayReport {
            steps,
            annotations,
            engine_calls: self.engine.calls(),
        })
    }

    fn apply(&self, step: &ReplayStep) -> Result<(&'static str, String), InterpolationError> {
        match step {
            ReplayStep::Insert { annotation } => {
                let handle = self.insert(annotation)?;
                let uid = handle.read().annotation_uid.clone();
                Ok(("insert", format!("inserted {}", uid)))
            }
            ReplayStep::Complete { annotation } => {
                let handle = self.insert(annotation)?;
                self.emit_and_dispatch(AnnotationEvent::completed(handle))
                    .map(|o| ("complete", o))
            }
            ReplayStep::Modify {
                annotation_uid,
                change_type,
                polyline,
            } => {
                let handle = self.find(annotation_uid)?;
                if let Some(polyline) = polyline {
                    handle.write().data.contour.polyline = polyline.clone();
                }
                self.emit_and_dispatch(AnnotationEvent::modified(handle, *change_type))
                    .map(|o| ("modify", o))
            }
            ReplayStep::Remove { annotation_uid } => {
                let handle = self.store.remove(annotation_uid)?;
                self.emit_and_dispatch(AnnotationEvent::removed(handle))
                    .map(|o| ("remove", o))
            }
            ReplayStep::Accept {
                frame_of_reference,
                filter,
            } => {
                let selector = self.locator.selector_for(frame_of_reference).ok_or_else(|| {
                    InterpolationError::InvalidScenario(format!(
                        "Unknown frame of reference: {}",
                        frame_of_reference
                    ))
                })?;
                let accepted = self
                    .dispatcher
                    .manager()
                    .accept_generated(&selector, filter)?;
                Ok(("accept", format!("accepted {}", accepted)))
            }
        }
    }

    fn insert(&self, annotation: &Annotation) -> Result<AnnotationHandle, InterpolationError> {
        let frame = annotation
            .metadata
            .as_ref()
            .map(|m| m.frame_of_reference.as_str())
            .unwrap_or_default();
        let selector = self.locator.selector_for(frame).ok_or_else(|| {
            InterpolationError::InvalidScenario(format!(
                "Annotation {} references unknown frame of reference '{}'",
                annotation.annotation_uid, frame
            ))
        })?;
        Ok(self.store.insert(&selector, annotation.clone()))
    }

    fn find(&self, annotation_uid: &str) -> Result<AnnotationHandle, InterpolationError> {
        self.store.find(annotation_uid).ok_or_else(|| {
            InterpolationError::InvalidScenario(format!("Unknown annotation: {}", annotation_uid))
        })
    }

    fn emit_and_dispatch(&self, event: AnnotationEvent) -> Result<String, InterpolationError> {
        self.bus
            .emit(event)
            .map_err(|e| InterpolationError::InvalidScenario(format!("Event bus closed: {}", e)))?;
        let mut last = String::from("no event");
        for result in self.dispatcher.drain() {
            last = describe(&result?);
        }
        Ok(last)
    }
}

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Ignored(reason) => format!("ignored ({:?})", reason),
        Outcome::Interpolated {
            interpolation_uid,
            assignment,
        } => format!(
            "interpolated {} ({:?})",
            interpolation_uid
                .as_ref()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "-".to_string()),
            assignment
        ),
        Outcome::Deleted { interpolation_uid } => format!(
            "deleted generated of {}",
            interpolation_uid
                .as_ref()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "-".to_string())
        ),
    }
}

/// Load, run and report a scenario in one call.
pub fn replay_file(
    config: &GroupsConfig,
    path: &Path,
    options: &ReplayOptions,
) -> Result<ReplayReport, InterpolationError> {
    let scenario = Scenario::load(path)?;
    ReplayRunner::new(config, &scenario, options).run(&scenario)
}
