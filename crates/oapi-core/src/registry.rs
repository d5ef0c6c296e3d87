use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex, PoisonError};

use log::trace;

use crate::op::Operation;

/// Identity of a handler value, stable for as long as the handler lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(usize);

impl HandlerId {
    pub fn new(raw: usize) -> Self {
        HandlerId(raw)
    }
}

/// Handlers that can be told apart by identity.
pub trait HandlerIdentity {
    fn handler_id(&self) -> HandlerId;
}

impl<T: ?Sized> HandlerIdentity for Arc<T> {
    fn handler_id(&self) -> HandlerId {
        HandlerId(Arc::as_ptr(self).cast::<()>() as usize)
    }
}

impl<T: ?Sized> HandlerIdentity for Rc<T> {
    fn handler_id(&self) -> HandlerId {
        HandlerId(Rc::as_ptr(self).cast::<()>() as usize)
    }
}

impl HandlerIdentity for HandlerId {
    fn handler_id(&self) -> HandlerId {
        *self
    }
}

impl<T: HandlerIdentity + ?Sized> HandlerIdentity for &T {
    fn handler_id(&self) -> HandlerId {
        (**self).handler_id()
    }
}

/// Operations keyed by the handler they document.
///
/// Safe to share between threads; registering twice for the same handler
/// keeps the last operation.
#[derive(Debug, Default)]
pub struct OperationRegistry {
    operations: Mutex<HashMap<HandlerId, Operation>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H: HandlerIdentity + ?Sized>(&self, handler: &H, op: Operation) {
        let id = handler.handler_id();
        trace!("registering operation {:?} for {id:?}", op.id());
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, op);
    }

    pub fn lookup<H: HandlerIdentity + ?Sized>(&self, handler: &H) -> Option<Operation> {
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handler.handler_id())
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
