//! Recycles processor instances within a block.
//!
//! Processors are checked out per call and checked back in afterwards.  A
//! processor is always reset on check-in, so whatever the next caller gets
//! behaves like a freshly built one.

use std::collections::BTreeMap;

use ledger_ops::OperationKind;
use tracing::*;

use crate::{errors::ExecError, processor::Processor, registry::ProcessorRegistry};

#[derive(Default)]
pub struct ProcessorPool {
    free: BTreeMap<OperationKind, Vec<Box<dyn Processor>>>,
    created: usize,
}

impl ProcessorPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a free processor for `kind`, building one from the registry if
    /// none is free.  Returns `None` if nothing is registered for `kind`.
    pub fn checkout(
        &mut self,
        kind: OperationKind,
        registry: &ProcessorRegistry,
    ) -> Result<Option<Box<dyn Processor>>, ExecError> {
        if let Some(p) = self.free.get_mut(&kind).and_then(Vec::pop) {
            return Ok(Some(p));
        }

        let Some(factory) = registry.get(kind) else {
            return Ok(None);
        };

        let p = factory();
        if p.kind() != kind {
            return Err(ExecError::Pool(format!(
                "factory for {kind} built a {} processor",
                p.kind()
            )));
        }

        self.created += 1;
        trace!(%kind, created = self.created, "built processor");
        Ok(Some(p))
    }

    /// Resets `p` and returns it to the free list.
    pub fn checkin(&mut self, mut p: Box<dyn Processor>) {
        p.reset();
        self.free.entry(p.kind()).or_default().push(p);
    }

    /// Number of processors built over the pool's lifetime.
    pub fn created(&self) -> usize {
        self.created
    }

    pub fn free_count(&self, kind: OperationKind) -> usize {
        self.free.get(&kind).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for ProcessorPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let free: BTreeMap<_, _> = self.free.iter().map(|(k, v)| (k, v.len())).collect();
        f.debug_struct("ProcessorPool")
            .field("free", &free)
            .field("created", &self.created)
            .finish()
    }
}
