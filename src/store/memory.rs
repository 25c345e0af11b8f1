//! In-memory annotation store keyed by (group selector, tool name).

use super::AnnotationStore;
use crate::annotation::{Annotation, AnnotationHandle};
use crate::error::StoreError;
use crate::types::GroupSelector;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

type Bucket = Vec<AnnotationHandle>;

/// Insertion-ordered annotation store.
#[derive(Default)]
pub struct InMemoryAnnotationStore {
    buckets: RwLock<HashMap<(GroupSelector, String), Bucket>>,
}

impl InMemoryAnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an annotation to the `selector` context and return its handle.
    pub fn insert(&self, selector: &GroupSelector, annotation: Annotation) -> AnnotationHandle {
        let handle = annotation.into_handle();
        self.insert_handle(selector, Arc::clone(&handle));
        handle
    }

    pub fn insert_handle(&self, selector: &GroupSelector, handle: AnnotationHandle) {
        let tool_name = handle.read().tool_name.clone();
        self.buckets
            .write()
            .entry((selector.clone(), tool_name))
            .or_default()
            .push(handle);
    }

    /// Find an annotation by uid in any context.
    pub fn find(&self, annotation_uid: &str) -> Option<AnnotationHandle> {
        self.buckets
            .read()
            .values()
            .flat_map(|bucket| bucket.iter())
            .find(|h| h.read().annotation_uid == annotation_uid)
            .cloned()
    }

    /// Remove an annotation by uid, returning the removed handle.
    pub fn remove(&self, annotation_uid: &str) -> Result<AnnotationHandle, StoreError> {
        let mut buckets = self.buckets.write();
        for bucket in buckets.values_mut() {
            if let Some(pos) = bucket
                .iter()
                .position(|h| h.read().annotation_uid == annotation_uid)
            {
                return Ok(bucket.remove(pos));
            }
        }
        Err(StoreError::AnnotationNotFound(annotation_uid.to_string()))
    }

    /// Remove every annotation in one context matching `predicate`; returns how many.
    pub fn remove_where<F>(&self, selector: &GroupSelector, tool_name: &str, predicate: F) -> usize
    where
        F: Fn(&Annotation) -> bool,
    {
        let mut buckets = self.buckets.write();
        let Some(bucket) = buckets.get_mut(&(selector.clone(), tool_name.to_string())) else {
            return 0;
        };
        let before = bucket.len();
        bucket.retain(|h| !predicate(&h.read()));
        before - bucket.len()
    }

    /// Snapshot of every annotation, ordered by selector, tool name, then insertion.
    pub fn snapshot(&self) -> Vec<(GroupSelector, Annotation)> {
        let buckets = self.buckets.read();
        let mut keys: Vec<_> = buckets.keys().cloned().collect();
        keys.sort_by(|a, b| (a.0.as_str(), a.1.as_str()).cmp(&(b.0.as_str(), b.1.as_str())));
        keys.into_iter()
            .flat_map(|key| {
                buckets[&key]
                    .iter()
                    .map(|h| (key.0.clone(), h.read().clone()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buckets.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AnnotationStore for InMemoryAnnotationStore {
    fn get_annotations(
        &self,
        tool_name: &str,
        selector: &GroupSelector,
    ) -> Result<Vec<AnnotationHandle>, StoreError> {
        Ok(self
            .buckets
            .read()
            .get(&(selector.clone(), tool_name.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
