use std::sync::Arc;

use crate::store::Store;


/// The context that is accessible to every resolver in our API.
pub(crate) struct Context {
    store: Arc<dyn Store>,
}

impl juniper::Context for Context {}

impl Context {
    pub(crate) fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub(crate) fn store(&self) -> &dyn Store {
        &*self.store
    }
}
