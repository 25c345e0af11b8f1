//! In-process event bus for annotation lifecycle events.
//!
//! Event sources emit into the bus from any thread; a single [`EventDispatcher`] drains it
//! in FIFO order, so every side effect of one event completes before the next is handled.

use std::sync::mpsc::{channel, Receiver, SendError, Sender};
use std::sync::Arc;

use tracing::{debug, error};

use crate::annotation::AnnotationHandle;
use crate::error::InterpolationError;
use crate::events::{AnnotationEvent, ChangeType};
use crate::manager::{InterpolationManager, Outcome};

#[derive(Clone)]
pub struct AnnotationEventBus {
    sender: Sender<AnnotationEvent>,
}

impl AnnotationEventBus {
    pub fn new_pair() -> (Self, Receiver<AnnotationEvent>) {
        let (sender, receiver) = channel();
        (Self { sender }, receiver)
    }

    pub fn emit(&self, event: AnnotationEvent) -> Result<(), SendError<AnnotationEvent>> {
        self.sender.send(event)
    }

    pub fn completed(&self, annotation: AnnotationHandle) -> Result<(), SendError<AnnotationEvent>> {
        self.emit(AnnotationEvent::completed(annotation))
    }

    pub fn modified(
        &self,
        annotation: AnnotationHandle,
        change_type: ChangeType,
    ) -> Result<(), SendError<AnnotationEvent>> {
        self.emit(AnnotationEvent::modified(annotation, change_type))
    }

    pub fn removed(&self, annotation: AnnotationHandle) -> Result<(), SendError<AnnotationEvent>> {
        self.emit(AnnotationEvent::removed(annotation))
    }
}

/// Routes bus events to the manager's handlers.
pub struct EventDispatcher {
    manager: Arc<InterpolationManager>,
    receiver: Receiver<AnnotationEvent>,
}

impl EventDispatcher {
    pub fn new(manager: Arc<InterpolationManager>, receiver: Receiver<AnnotationEvent>) -> Self {
        Self { manager, receiver }
    }

    pub fn manager(&self) -> &Arc<InterpolationManager> {
        &self.manager
    }

    /// Handle one event.
    pub fn dispatch(&self, event: &AnnotationEvent) -> Result<Outcome, InterpolationError> {
        let outcome = self.manager.handle(event)?;
        debug!(
            kind = event.kind(),
            annotation = %event.annotation().read().annotation_uid,
            ?outcome,
            "Dispatched annotation event"
        );
        Ok(outcome)
    }

    /// Handle every queued event without blocking.
    ///
    /// Collaborator failures are logged and do not stop the drain; the returned list holds
    /// one entry per event in arrival order.
    pub fn drain(&self) -> Vec<Result<Outcome, InterpolationError>> {
        self.receiver
            .try_iter()
            .map(|event| {
                let result = self.dispatch(&event);
                if let Err(e) = &result {
                    error!(kind = event.kind(), "Annotation event failed: {}", e);
                }
                result
            })
            .collect()
    }

    /// Block and handle events until every bus sender is dropped.
    pub fn run(&self) -> usize {
        let mut handled = 0;
        for event in self.receiver.iter() {
            if let Err(e) = self.dispatch(&event) {
                error!(kind = event.kind(), "Annotation event failed: {}", e);
            }
            handled += 1;
        }
        handled
    }
}
