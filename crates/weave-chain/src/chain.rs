//! # Chain Core
//!
//! `Layer` is the around-advice trait; `Next` is an owned, cheaply
//! cloneable handle to the remainder of the chain (the layers below plus
//! the base operation), so a layer can invoke its inner chain zero, one, or
//! many times - and hand it to another thread (the timeout layer does).

use std::sync::Arc;
use weave_types::{Operation, OperationError};

/// One cross-cutting behavior wrapping an inner operation.
///
/// A layer receives the call input and a [`Next`] handle; calling
/// `next.invoke(input)` passes control inward. Not calling it suppresses
/// the inner chain (the cache layer does this on a hit).
pub trait Layer<I, O>: Send + Sync {
    /// Layer name (debugging and chain inspection).
    fn name(&self) -> &str;

    /// Invoke this layer around the rest of the chain.
    ///
    /// # Errors
    ///
    /// Whatever the inner chain raises, plus this layer's own errors.
    fn call(&self, input: I, next: Next<I, O>) -> Result<O, OperationError>;
}

/// Owned handle to the remainder of a chain.
///
/// Cloning is two `Arc` clones and an index copy; clones address the same
/// position in the same chain.
pub struct Next<I, O> {
    layers: Arc<[Arc<dyn Layer<I, O>>]>,
    index: usize,
    base: Arc<dyn Operation<I, O>>,
}

impl<I, O> Clone for Next<I, O> {
    fn clone(&self) -> Self {
        Self {
            layers: Arc::clone(&self.layers),
            index: self.index,
            base: Arc::clone(&self.base),
        }
    }
}

impl<I, O> Next<I, O> {
    /// Invoke the remainder of the chain.
    ///
    /// # Errors
    ///
    /// Whatever the layers below or the base operation raise.
    pub fn invoke(&self, input: I) -> Result<O, OperationError> {
        match self.layers.get(self.index) {
            Some(layer) => layer.call(
                input,
                Self {
                    layers: Arc::clone(&self.layers),
                    index: self.index + 1,
                    base: Arc::clone(&self.base),
                },
            ),
            None => self.base.call(input),
        }
    }
}

/// Builder for a [`DecoratorChain`]. Layers are added outer-to-inner.
pub struct ChainBuilder<I, O> {
    layers: Vec<Arc<dyn Layer<I, O>>>,
}

impl<I, O> ChainBuilder<I, O> {
    /// Start an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Append a layer. The first layer added is the outermost.
    #[must_use]
    pub fn layer(mut self, layer: Arc<dyn Layer<I, O>>) -> Self {
        self.layers.push(layer);
        self
    }

    /// Close the chain around a base operation. The chain is immutable
    /// from here on.
    #[must_use]
    pub fn build(self, base: Arc<dyn Operation<I, O>>) -> DecoratorChain<I, O> {
        DecoratorChain {
            layers: self.layers.into(),
            base,
        }
    }
}

impl<I, O> Default for ChainBuilder<I, O> {
    fn default() -> Self {
        Self::new()
    }
}

/// An ordered, immutable stack of layers around a base operation.
///
/// The chain exclusively owns its layer stack. It implements
/// [`Operation`] itself, so chains nest inside other chains.
pub struct DecoratorChain<I, O> {
    layers: Arc<[Arc<dyn Layer<I, O>>]>,
    base: Arc<dyn Operation<I, O>>,
}

impl<I, O> DecoratorChain<I, O> {
    /// Invoke the chain: through the layers in build order, into the base,
    /// and back out in reverse order.
    ///
    /// # Errors
    ///
    /// Whatever the layers or base operation raise.
    pub fn invoke(&self, input: I) -> Result<O, OperationError> {
        Next {
            layers: Arc::clone(&self.layers),
            index: 0,
            base: Arc::clone(&self.base),
        }
        .invoke(input)
    }

    /// Layer names in composition order, outermost first. The composition
    /// is an inspectable artifact, not syntactic sugar.
    #[must_use]
    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name()).collect()
    }

    /// Number of layers around the base.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}

impl<I, O> Operation<I, O> for DecoratorChain<I, O> {
    fn call(&self, input: I) -> Result<O, OperationError> {
        self.invoke(input)
    }
}
