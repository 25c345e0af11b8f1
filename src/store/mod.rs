//! Annotation Store
//!
//! The store owns every annotation. The coordinator only queries it by tool name and
//! group selector; writes happen through the handles it returns.

pub mod memory;

pub use memory::InMemoryAnnotationStore;

use crate::annotation::AnnotationHandle;
use crate::error::StoreError;
use crate::types::GroupSelector;

/// Annotation Store interface
pub trait AnnotationStore: Send + Sync {
    /// All annotations drawn with `tool_name` inside the `selector` context.
    ///
    /// Returns an empty list when nothing matches.
    fn get_annotations(
        &self,
        tool_name: &str,
        selector: &GroupSelector,
    ) -> Result<Vec<AnnotationHandle>, StoreError>;
}
