//! Shared test utilities for integration tests
//!
//! Provides a store-backed interpolation engine, a ready-wired manager harness and
//! environment isolation for tests that touch config layers.

use contour_groups::annotation::{Annotation, AnnotationHandle, AnnotationMetadata, SegmentationRef};
use contour_groups::engine::{InterpolationEngine, InterpolationRequest};
use contour_groups::error::EngineError;
use contour_groups::events::{AnnotationEvent, ChangeType};
use contour_groups::locator::{FrameLayout, FrameOfReferenceLocator};
use contour_groups::manager::{InterpolationManager, Outcome};
use contour_groups::error::StoreError;
use contour_groups::store::{AnnotationStore, InMemoryAnnotationStore};
use contour_groups::types::{GroupSelector, InterpolationUid};
use contour_groups::uid::SequentialUidGenerator;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const TOOL: &str = "PlanarFreehandContourSegmentationTool";
pub const FRAME: &str = "ct-axial";
pub const SLICES: usize = 30;

/// Engine that fills the slices between a group's keyframes with generated copies.
///
/// Each empty slice strictly between the lowest and highest keyframe receives a copy of the
/// nearest keyframe below it, named `{uid}-gen-{slice}`. Re-running fills only gaps, so
/// repeated synthesis is idempotent.
pub struct StoreBackedEngine {
    store: Arc<InMemoryAnnotationStore>,
    synthesized: AtomicUsize,
    deleted: AtomicUsize,
}

impl StoreBackedEngine {
    pub fn new(store: Arc<InMemoryAnnotationStore>) -> Self {
        Self {
            store,
            synthesized: AtomicUsize::new(0),
            deleted: AtomicUsize::new(0),
        }
    }

    pub fn synthesize_calls(&self) -> usize {
        self.synthesized.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deleted.load(Ordering::SeqCst)
    }
}

impl InterpolationEngine for StoreBackedEngine {
    fn synthesize(&self, request: &InterpolationRequest) -> Result<(), EngineError> {
        self.synthesized.fetch_add(1, Ordering::SeqCst);
        let Some(uid) = request.interpolation_uid.as_ref() else {
            return Ok(());
        };
        let tool_name = request.annotation.read().tool_name.clone();
        let selector = &request.slice.group_selector;

        let members: Vec<Annotation> = self
            .store
            .get_annotations(&tool_name, selector)?
            .iter()
            .map(|h| h.read().clone())
            .filter(|a| a.interpolation_uid.as_ref() == Some(uid))
            .collect();
        let keyframes: BTreeMap<usize, &Annotation> = members
            .iter()
            .filter(|a| !a.auto_generated)
            .filter_map(|a| a.slice_index().map(|s| (s, a)))
            .collect();
        let occupied: BTreeSet<usize> = members.iter().filter_map(|a| a.slice_index()).collect();

        let (Some(&low), Some(&high)) = (keyframes.keys().next(), keyframes.keys().next_back())
        else {
            return Ok(());
        };
        // A keyframe replaces any generated member on its slice
        self.store.remove_where(selector, &tool_name, |a| {
            a.auto_generated
                && a.interpolation_uid.as_ref() == Some(uid)
                && a.slice_index().map_or(false, |s| keyframes.contains_key(&s))
        });
        for slice in (low + 1)..high {
            if occupied.contains(&slice) {
                continue;
            }
            let Some((_, source)) = keyframes.range(..slice).next_back() else {
                continue;
            };
            let mut generated = (*source).clone();
            generated.annotation_uid = format!("{}-gen-{}", uid, slice);
            generated.auto_generated = true;
            if let Some(metadata) = generated.metadata.as_mut() {
                metadata.slice_index = slice;
            }
            for point in generated.data.contour.polyline.iter_mut() {
                point[2] = slice as f64;
            }
            self.store.insert(selector, generated);
        }
        Ok(())
    }

    fn delete_generated(&self, request: &InterpolationRequest) -> Result<(), EngineError> {
        self.deleted.fetch_add(1, Ordering::SeqCst);
        let Some(uid) = request.interpolation_uid.clone() else {
            return Ok(());
        };
        let tool_name = request.annotation.read().tool_name.clone();
        self.store
            .remove_where(&request.slice.group_selector, &tool_name, |a| {
                a.auto_generated && a.interpolation_uid.as_ref() == Some(&uid)
            });
        Ok(())
    }
}

/// Store-backed engine that fails every request triggered by one of the listed keyframes.
pub struct FailingEngine {
    inner: StoreBackedEngine,
    failing: BTreeSet<String>,
}

impl FailingEngine {
    pub fn new(store: Arc<InMemoryAnnotationStore>, failing: &[&str]) -> Self {
        Self {
            inner: StoreBackedEngine::new(store),
            failing: failing.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn fails_for(&self, request: &InterpolationRequest) -> bool {
        self.failing
            .contains(&request.annotation.read().annotation_uid)
    }
}

impl InterpolationEngine for FailingEngine {
    fn synthesize(&self, request: &InterpolationRequest) -> Result<(), EngineError> {
        if self.fails_for(request) {
            return Err(EngineError::SynthesisFailed {
                uid: request.interpolation_uid.clone(),
                reason: "contour resampling failed".to_string(),
            });
        }
        self.inner.synthesize(request)
    }

    fn delete_generated(&self, request: &InterpolationRequest) -> Result<(), EngineError> {
        if self.fails_for(request) {
            return Err(EngineError::DeletionFailed {
                uid: request.interpolation_uid.clone(),
                reason: "store rejected removal".to_string(),
            });
        }
        self.inner.delete_generated(request)
    }
}

/// Store whose queries always fail.
pub struct UnavailableStore;

impl AnnotationStore for UnavailableStore {
    fn get_annotations(
        &self,
        _tool_name: &str,
        _selector: &GroupSelector,
    ) -> Result<Vec<AnnotationHandle>, StoreError> {
        Err(StoreError::Unavailable("connection reset".to_string()))
    }
}

/// Manager over `store` whose engine fails for the `failing` keyframes.
pub fn failing_manager(store: Arc<InMemoryAnnotationStore>, failing: &[&str]) -> InterpolationManager {
    let engine = Arc::new(FailingEngine::new(store.clone(), failing));
    let manager = InterpolationManager::new(store, frame_locator(), engine)
        .with_uid_generator(Arc::new(SequentialUidGenerator::new("grp")));
    manager.add_tool(TOOL);
    manager
}

pub fn frame_locator() -> Arc<FrameOfReferenceLocator> {
    Arc::new(FrameOfReferenceLocator::with_frames([FrameLayout::new(
        FRAME, SLICES,
    )]))
}

/// Manager wired to an in-memory store, one frame of reference and the store-backed engine.
pub struct Harness {
    pub store: Arc<InMemoryAnnotationStore>,
    pub engine: Arc<StoreBackedEngine>,
    pub manager: InterpolationManager,
    pub ctx: GroupSelector,
}

pub fn harness() -> Harness {
    let store = Arc::new(InMemoryAnnotationStore::new());
    let engine = Arc::new(StoreBackedEngine::new(store.clone()));
    let manager = InterpolationManager::new(store.clone(), frame_locator(), engine.clone())
        .with_uid_generator(Arc::new(SequentialUidGenerator::new("grp")));
    manager.add_tool(TOOL);
    Harness {
        store,
        engine,
        manager,
        ctx: GroupSelector::new(FRAME),
    }
}

/// Axial contour: a 2x2 square centred on `center`, lying on `slice`.
pub fn contour(uid: &str, slice: usize, segment: u32, center: (f64, f64)) -> Annotation {
    let (cx, cy) = center;
    let z = slice as f64;
    Annotation::new(
        uid,
        TOOL,
        AnnotationMetadata {
            frame_of_reference: FRAME.to_string(),
            slice_index: slice,
            view_plane_normal: [0.0, 0.0, 1.0],
            view_up: [0.0, -1.0, 0.0],
        },
        SegmentationRef {
            segmentation_id: "seg-1".to_string(),
            segment_index: segment,
        },
    )
    .with_polyline(vec![
        [cx - 1.0, cy - 1.0, z],
        [cx + 1.0, cy - 1.0, z],
        [cx + 1.0, cy + 1.0, z],
        [cx - 1.0, cy + 1.0, z],
    ])
}

impl Harness {
    /// Store the annotation and fire its completion event.
    pub fn draw(&self, annotation: Annotation) -> (AnnotationHandle, Outcome) {
        let handle = self.store.insert(&self.ctx, annotation);
        let outcome = self
            .manager
            .handle(&AnnotationEvent::completed(Arc::clone(&handle)))
            .unwrap();
        (handle, outcome)
    }

    pub fn recomplete(&self, handle: &AnnotationHandle) -> Outcome {
        self.manager
            .handle(&AnnotationEvent::completed(Arc::clone(handle)))
            .unwrap()
    }

    pub fn modify(&self, handle: &AnnotationHandle, change_type: ChangeType) -> Outcome {
        self.manager
            .handle(&AnnotationEvent::modified(Arc::clone(handle), change_type))
            .unwrap()
    }

    /// Remove from the store, then fire the removal event as a host would.
    pub fn erase(&self, annotation_uid: &str) -> Outcome {
        let handle = self.store.remove(annotation_uid).unwrap();
        self.manager
            .handle(&AnnotationEvent::removed(handle))
            .unwrap()
    }

    /// Slices holding generated members of `uid`.
    pub fn generated_slices(&self, uid: &InterpolationUid) -> BTreeSet<usize> {
        self.store
            .snapshot()
            .into_iter()
            .map(|(_, a)| a)
            .filter(|a| a.auto_generated && a.interpolation_uid.as_ref() == Some(uid))
            .filter_map(|a| a.slice_index())
            .collect()
    }

    pub fn annotation(&self, annotation_uid: &str) -> Annotation {
        self.store.find(annotation_uid).unwrap().read().clone()
    }
}

/// Global mutex to serialize environment variable access across tests.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ISOLATED_VARS: [&str; 5] = [
    "HOME",
    "XDG_CONFIG_HOME",
    "CONTOUR_GROUPS_ENV",
    "CONTOUR_GROUPS__GROUPING__MATCH_SEGMENTATION_ID",
    "CONTOUR_GROUPS__TOOLS__REGISTERED",
];

/// Run `f` with HOME and XDG_CONFIG_HOME pointed into a temp dir and the config
/// environment variables cleared; restores the previous environment afterwards.
pub fn with_isolated_env<F, R>(f: F) -> R
where
    F: FnOnce(&TempDir) -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(&str, Option<String>)> = ISOLATED_VARS
        .iter()
        .map(|name| (*name, std::env::var(name).ok()))
        .collect();

    let temp_dir = TempDir::new().unwrap();
    let home = temp_dir.path().join("home");
    let config_home = temp_dir.path().join("config");
    std::fs::create_dir_all(&home).unwrap();
    std::fs::create_dir_all(&config_home).unwrap();
    for name in ISOLATED_VARS {
        std::env::remove_var(name);
    }
    std::env::set_var("HOME", &home);
    std::env::set_var("XDG_CONFIG_HOME", &config_home);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(&temp_dir)));

    for (name, value) in saved {
        match value {
            Some(v) => std::env::set_var(name, v),
            None => std::env::remove_var(name),
        }
    }
    match result {
        Ok(r) => r,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
