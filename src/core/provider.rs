//! Service provider trait for closed group updates.
//!
//! The [`ClosedGroupProvider`] trait bundles the external collaborators the
//! core needs into a single type parameter.
//!
//! # Example
//!
//! ```ignore
//! use closed_group::core::ClosedGroupProvider;
//! use closed_group::storage::{MemoryGroupStore, MemoryKeyPairStore};
//!
//! struct MyProvider;
//! impl ClosedGroupProvider for MyProvider {
//!     type Groups = MemoryGroupStore;
//!     type KeyPairs = MemoryKeyPairStore;
//!     type Dispatcher = MyTransport;
//! }
//! ```

use std::sync::Arc;

use crate::ds::MessageDispatcher;
use crate::storage::{GroupStore, KeyPairStore};

pub trait ClosedGroupProvider: 'static {
    /// Conversation storage (groups and notices).
    type Groups: GroupStore;

    /// Persistent key pair history.
    type KeyPairs: KeyPairStore;

    /// Outbound message transport.
    type Dispatcher: MessageDispatcher + 'static;
}

/// Shared handles to a provider's collaborators.
pub struct Collaborators<P: ClosedGroupProvider> {
    pub groups: Arc<P::Groups>,
    pub key_pairs: Arc<P::KeyPairs>,
    pub dispatcher: Arc<P::Dispatcher>,
}

impl<P: ClosedGroupProvider> Collaborators<P> {
    pub fn new(
        groups: Arc<P::Groups>,
        key_pairs: Arc<P::KeyPairs>,
        dispatcher: Arc<P::Dispatcher>,
    ) -> Self {
        Self {
            groups,
            key_pairs,
            dispatcher,
        }
    }
}

impl<P: ClosedGroupProvider> Clone for Collaborators<P> {
    fn clone(&self) -> Self {
        Self {
            groups: Arc::clone(&self.groups),
            key_pairs: Arc::clone(&self.key_pairs),
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}
