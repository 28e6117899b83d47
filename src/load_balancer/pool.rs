//! Backend pool management.
//!
//! # Responsibilities
//! - Hold the ordered list of configured backends
//! - Stay immutable for the life of the process

use std::ops::Deref;
use std::sync::Arc;

use crate::load_balancer::backend::{Backend, BackendError, Scheme};

/// The fixed, ordered set of configured backends.
#[derive(Debug, Clone)]
pub struct BackendPool {
    backends: Arc<[Arc<Backend>]>,
}

impl BackendPool {
    /// Build the pool from configured addresses, preserving their order.
    pub fn new<I, S>(addresses: I, scheme: Scheme) -> Result<Self, BackendError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backends = addresses
            .into_iter()
            .map(|address| Backend::new(address, scheme).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            backends: backends.into(),
        })
    }
}

impl Deref for BackendPool {
    type Target = [Arc<Backend>];

    fn deref(&self) -> &Self::Target {
        &self.backends
    }
}
