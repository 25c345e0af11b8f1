//! Interpolation Manager
//!
//! Orchestrates interpolation groups in response to annotation lifecycle events. Each
//! handler checks its preconditions, resolves the annotation's slice context, flips the
//! annotation's provenance/grouping fields in place and delegates synthesis or cleanup to
//! the interpolation engine. Group membership is never stored: it is reconstructed from the
//! store on every completion.

mod accept;

pub use accept::AcceptInterpolationSelector;

use crate::annotation::{Annotation, AnnotationHandle};
use crate::config::GroupsConfig;
use crate::engine::{InterpolationEngine, InterpolationRequest};
use crate::error::InterpolationError;
use crate::events::{
    AnnotationCompletedEvent, AnnotationEvent, AnnotationModifiedEvent, AnnotationRemovedEvent,
    ChangeType,
};
use crate::locator::{SliceContext, SliceLocator};
use crate::registry::ToolRegistry;
use crate::resolver::{GroupDecision, GroupResolver, GroupingConfig};
use crate::store::AnnotationStore;
use crate::types::{GroupSelector, InterpolationUid};
use crate::uid::{Blake3UidGenerator, UidGenerator};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Attempts at minting an identifier not already present in the context.
const MAX_MINT_ATTEMPTS: usize = 8;

/// Why a handler returned without side effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingMetadata,
    UnregisteredTool,
    IgnoredChangeType,
    /// Removal of a generated annotation; nothing depends on it
    AutoGenerated,
    NoContext,
}

/// How the annotation's interpolation identifier was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// The annotation already carried its identifier
    Kept,
    Reused,
    Nearest,
    Minted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ignored(SkipReason),
    Interpolated {
        interpolation_uid: Option<InterpolationUid>,
        assignment: Assignment,
    },
    Deleted {
        interpolation_uid: Option<InterpolationUid>,
    },
}

impl Outcome {
    pub fn interpolation_uid(&self) -> Option<&InterpolationUid> {
        match self {
            Outcome::Interpolated {
                interpolation_uid, ..
            }
            | Outcome::Deleted { interpolation_uid } => interpolation_uid.as_ref(),
            Outcome::Ignored(_) => None,
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Outcome::Ignored(_))
    }
}

pub struct InterpolationManager {
    registry: RwLock<ToolRegistry>,
    resolver: GroupResolver,
    store: Arc<dyn AnnotationStore>,
    locator: Arc<dyn SliceLocator>,
    engine: Arc<dyn InterpolationEngine>,
    uids: Arc<dyn UidGenerator>,
}

impl InterpolationManager {
    /// Create a manager with an empty registry and the default grouping policy
    pub fn new(
        store: Arc<dyn AnnotationStore>,
        locator: Arc<dyn SliceLocator>,
        engine: Arc<dyn InterpolationEngine>,
    ) -> Self {
        Self {
            registry: RwLock::new(ToolRegistry::new()),
            resolver: GroupResolver::default(),
            store,
            locator,
            engine,
            uids: Arc::new(Blake3UidGenerator::new()),
        }
    }

    /// Create a manager whose registry and grouping policy come from configuration
    pub fn from_config(
        config: &GroupsConfig,
        store: Arc<dyn AnnotationStore>,
        locator: Arc<dyn SliceLocator>,
        engine: Arc<dyn InterpolationEngine>,
    ) -> Self {
        Self::new(store, locator, engine)
            .with_registry(ToolRegistry::from_names(config.tools.registered.iter().cloned()))
            .with_grouping(config.grouping)
    }

    pub fn with_registry(mut self, registry: ToolRegistry) -> Self {
        self.registry = RwLock::new(registry);
        self
    }

    pub fn with_grouping(mut self, grouping: GroupingConfig) -> Self {
        self.resolver = GroupResolver::new(grouping);
        self
    }

    pub fn with_uid_generator(mut self, uids: Arc<dyn UidGenerator>) -> Self {
        self.uids = uids;
        self
    }

    /// Register a tool name for interpolation. No-op when already registered.
    pub fn add_tool(&self, name: impl Into<String>) -> bool {
        let name = name.into();
        let added = self.registry.write().register(name.clone());
        if added {
            debug!(tool = %name, "Registered interpolation tool");
        }
        added
    }

    pub fn registered_tools(&self) -> Vec<String> {
        self.registry.read().names().to_vec()
    }

    /// Route one lifecycle event to its handler.
    pub fn handle(&self, event: &AnnotationEvent) -> Result<Outcome, InterpolationError> {
        match event {
            AnnotationEvent::Completed(e) => self.on_annotation_completed(e),
            AnnotationEvent::Modified(e) => self.on_annotation_modified(e),
            AnnotationEvent::Removed(e) => self.on_annotation_removed(e),
        }
    }

    /// A drawing tool finished an annotation.
    pub fn on_annotation_completed(
        &self,
        event: &AnnotationCompletedEvent,
    ) -> Result<Outcome, InterpolationError> {
        let handle = &event.annotation;
        let annotation = handle.read().clone();
        if let Some(reason) = self.precheck(&annotation) {
            return Ok(Outcome::Ignored(reason));
        }
        let Some(slice) = self.resolve_context(&annotation) else {
            return Ok(Outcome::Ignored(SkipReason::NoContext));
        };

        handle.write().auto_generated = false;

        if let Some(uid) = annotation.interpolation_uid.clone() {
            debug!(
                annotation = %annotation.annotation_uid,
                interpolation_uid = %uid,
                "Re-completed grouped annotation; regenerating group"
            );
            let request = InterpolationRequest::new(Arc::clone(handle), Some(uid.clone()), slice);
            self.engine.delete_generated(&request)?;
            self.engine.synthesize(&request)?;
            return Ok(Outcome::Interpolated {
                interpolation_uid: Some(uid),
                assignment: Assignment::Kept,
            });
        }

        let candidates =
            self.context_annotations(&annotation.tool_name, &slice.group_selector, handle)?;
        let (uid, assignment) = match self.resolver.resolve(&annotation, candidates.iter()) {
            GroupDecision::Reuse(uid) => (uid, Assignment::Reused),
            GroupDecision::Nearest(uid) => (uid, Assignment::Nearest),
            GroupDecision::Mint => (self.mint_unused(&candidates), Assignment::Minted),
        };
        handle.write().interpolation_uid = Some(uid.clone());
        info!(
            annotation = %annotation.annotation_uid,
            interpolation_uid = %uid,
            ?assignment,
            "Assigned interpolation group"
        );

        let request = InterpolationRequest::new(Arc::clone(handle), Some(uid.clone()), slice);
        self.engine.synthesize(&request)?;
        Ok(Outcome::Interpolated {
            interpolation_uid: Some(uid),
            assignment,
        })
    }

    /// An annotation was edited.
    pub fn on_annotation_modified(
        &self,
        event: &AnnotationModifiedEvent,
    ) -> Result<Outcome, InterpolationError> {
        let handle = &event.annotation;
        let annotation = handle.read().clone();
        if let Some(reason) = self.precheck(&annotation) {
            return Ok(Outcome::Ignored(reason));
        }
        if !event.change_type.drives_interpolation() {
            debug!(
                annotation = %annotation.annotation_uid,
                change_type = ?event.change_type,
                "Change type does not affect interpolation"
            );
            return Ok(Outcome::Ignored(SkipReason::IgnoredChangeType));
        }
        let Some(slice) = self.resolve_context(&annotation) else {
            return Ok(Outcome::Ignored(SkipReason::NoContext));
        };

        handle.write().auto_generated = false;

        let request = InterpolationRequest::new(
            Arc::clone(handle),
            annotation.interpolation_uid.clone(),
            slice,
        )
        .interpolation_update(event.change_type == ChangeType::InterpolationUpdated);
        self.engine.synthesize(&request)?;
        Ok(Outcome::Interpolated {
            interpolation_uid: annotation.interpolation_uid,
            assignment: Assignment::Kept,
        })
    }

    /// An annotation was deleted from the store.
    pub fn on_annotation_removed(
        &self,
        event: &AnnotationRemovedEvent,
    ) -> Result<Outcome, InterpolationError> {
        let handle = &event.annotation;
        let annotation = handle.read().clone();
        if let Some(reason) = self.precheck(&annotation) {
            return Ok(Outcome::Ignored(reason));
        }
        if annotation.auto_generated {
            debug!(
                annotation = %annotation.annotation_uid,
                "Generated annotation removed; no cascade"
            );
            return Ok(Outcome::Ignored(SkipReason::AutoGenerated));
        }
        let Some(slice) = self.resolve_context(&annotation) else {
            return Ok(Outcome::Ignored(SkipReason::NoContext));
        };

        handle.write().auto_generated = false;

        let request = InterpolationRequest::new(
            Arc::clone(handle),
            annotation.interpolation_uid.clone(),
            slice,
        );
        self.engine.delete_generated(&request)?;
        Ok(Outcome::Deleted {
            interpolation_uid: annotation.interpolation_uid,
        })
    }

    /// Mark generated annotations in `selector` as user-confirmed.
    ///
    /// Only provenance changes; identifiers are left alone. Returns how many annotations
    /// were accepted.
    pub fn accept_generated(
        &self,
        selector: &GroupSelector,
        filter: &AcceptInterpolationSelector,
    ) -> Result<usize, InterpolationError> {
        let tools = self.registry.read().select(filter.tool_names.as_deref());
        let mut accepted = 0;
        for tool_name in &tools {
            for handle in self.store.get_annotations(tool_name, selector)? {
                let mut annotation = handle.write();
                if annotation.auto_generated && filter.matches(&annotation) {
                    annotation.auto_generated = false;
                    accepted += 1;
                }
            }
        }
        info!(
            selector = %selector,
            tools = tools.len(),
            accepted,
            "Accepted generated annotations"
        );
        Ok(accepted)
    }

    fn precheck(&self, annotation: &Annotation) -> Option<SkipReason> {
        if annotation.metadata.is_none() {
            return Some(SkipReason::MissingMetadata);
        }
        if !self.registry.read().contains(&annotation.tool_name) {
            debug!(tool = %annotation.tool_name, "Tool not registered for interpolation");
            return Some(SkipReason::UnregisteredTool);
        }
        None
    }

    fn resolve_context(&self, annotation: &Annotation) -> Option<SliceContext> {
        let slice = self.locator.resolve(annotation);
        if slice.is_none() {
            warn!(
                annotation = %annotation.annotation_uid,
                tool = %annotation.tool_name,
                "Unable to resolve slice context for annotation"
            );
        }
        slice
    }

    /// Snapshots of the other annotations drawn with `tool_name` in the same context.
    fn context_annotations(
        &self,
        tool_name: &str,
        selector: &GroupSelector,
        own: &AnnotationHandle,
    ) -> Result<Vec<Annotation>, InterpolationError> {
        Ok(self
            .store
            .get_annotations(tool_name, selector)?
            .iter()
            .filter(|h| !Arc::ptr_eq(*h, own))
            .map(|h| h.read().clone())
            .collect())
    }

    /// Mint an identifier held by no annotation in `candidates`.
    ///
    /// After `MAX_MINT_ATTEMPTS` collisions the last minted identifier gets a numeric
    /// suffix, counting up until the result is unused.
    fn mint_unused(&self, candidates: &[Annotation]) -> InterpolationUid {
        let taken = GroupResolver::known_uids(candidates);
        let mut uid = self.uids.mint();
        for _ in 1..MAX_MINT_ATTEMPTS {
            if !taken.contains(&uid) {
                return uid;
            }
            warn!(interpolation_uid = %uid, "Minted identifier already in use; retrying");
            uid = self.uids.mint();
        }
        if !taken.contains(&uid) {
            return uid;
        }
        let base = uid;
        let mut n = 1usize;
        loop {
            let suffixed = InterpolationUid::new(format!("{}-{}", base, n));
            if !taken.contains(&suffixed) {
                warn!(
                    interpolation_uid = %suffixed,
                    "Generator kept returning identifiers in use; suffixed the last one"
                );
                return suffixed;
            }
            n += 1;
        }
    }
}
