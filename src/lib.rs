//! contour-groups: Interpolation Group Coordination
//!
//! Keeps track of which contour annotations on a slice stack belong to the same
//! interpolation group, reacts to annotation completion, modification and removal, and
//! lets users accept machine-generated contours. Contour synthesis, storage and viewport
//! resolution are external collaborators behind the [`engine`], [`store`] and [`locator`]
//! traits.

pub mod annotation;
pub mod bus;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod locator;
pub mod logging;
pub mod manager;
pub mod registry;
pub mod replay;
pub mod resolver;
pub mod store;
pub mod types;
pub mod uid;

pub use annotation::{Annotation, AnnotationHandle, AnnotationMetadata, SegmentationRef};
pub use error::{EngineError, InterpolationError, StoreError};
pub use manager::{AcceptInterpolationSelector, InterpolationManager, Outcome, SkipReason};
pub use types::{GroupSelector, InterpolationUid};
