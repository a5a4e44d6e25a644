//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use closed_group::config::ServiceConfig;
use closed_group::core::{ClosedGroupProvider, ClosedGroupService, Collaborators, GroupState};
use closed_group::crypto::GroupKeyPair;
use closed_group::ds::{DeliveryServiceError, MessageDispatcher, Namespace};
use closed_group::identity::PubKey;
use closed_group::message::{ControlKind, ControlMessage};
use closed_group::storage::{GroupStore, KeyPairStore, MemoryGroupStore, MemoryKeyPairStore};

// ─────────────────────────── Mock Dispatcher ───────────────────────────

#[derive(Debug, Clone)]
pub struct Sent {
    pub destination: PubKey,
    pub namespace: Namespace,
    pub message: ControlMessage,
}

#[derive(Default)]
pub struct MockDispatcher {
    events: Mutex<Vec<Sent>>,
    fail_all: AtomicBool,
    fail_key_pairs: AtomicBool,
}

impl MockDispatcher {
    pub fn events(&self) -> Vec<Sent> {
        self.events.lock().unwrap().clone()
    }

    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Fail only encryption key pair messages.
    pub fn fail_key_pairs(&self, fail: bool) {
        self.fail_key_pairs.store(fail, Ordering::SeqCst);
    }

    fn record(
        &self,
        destination: &PubKey,
        message: ControlMessage,
        namespace: Namespace,
    ) -> Result<String, String> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err("network down".to_string());
        }
        if self.fail_key_pairs.load(Ordering::SeqCst)
            && matches!(message.kind, ControlKind::EncryptionKeyPair { .. })
        {
            return Err("key pair send rejected".to_string());
        }
        let mut events = self.events.lock().unwrap();
        events.push(Sent {
            destination: destination.clone(),
            namespace,
            message,
        });
        Ok(format!("mock-{}", events.len()))
    }
}

#[async_trait]
impl MessageDispatcher for MockDispatcher {
    async fn send_to_group(
        &self,
        group_id: &PubKey,
        message: ControlMessage,
        namespace: Namespace,
    ) -> Result<String, DeliveryServiceError> {
        self.record(group_id, message, namespace)
            .map_err(|reason| DeliveryServiceError::GroupSendFailed {
                group: group_id.to_string(),
                reason,
            })
    }

    async fn send_to_member(
        &self,
        member: &PubKey,
        message: ControlMessage,
        namespace: Namespace,
    ) -> Result<String, DeliveryServiceError> {
        self.record(member, message, namespace)
            .map_err(|reason| DeliveryServiceError::MemberSendFailed {
                member: member.to_string(),
                reason,
            })
    }
}

pub struct TestProvider;

impl ClosedGroupProvider for TestProvider {
    type Groups = MemoryGroupStore;
    type KeyPairs = MemoryKeyPairStore;
    type Dispatcher = MockDispatcher;
}

// ─────────────────────────── Fixtures ───────────────────────────

/// An account with its identity secret, so tests can open wrappers.
pub struct Account {
    pub id: PubKey,
    pub identity: GroupKeyPair,
}

impl Account {
    pub fn random() -> Self {
        let identity = GroupKeyPair::generate();
        Self {
            id: PubKey::from_public_key(identity.public_key()),
            identity,
        }
    }

    pub fn secret(&self) -> [u8; 32] {
        self.identity.secret_key_bytes()
    }
}

/// A standard id whose key bytes are not a valid curve point.
pub fn invalid_curve_id() -> PubKey {
    PubKey::parse(&format!("0502{}", "ff".repeat(32))).unwrap()
}

pub struct Harness {
    pub alice: Account,
    pub bob: Account,
    pub carol: Account,
    pub group_id: PubKey,
    pub initial_key: GroupKeyPair,
    pub groups: Arc<MemoryGroupStore>,
    pub key_pairs: Arc<MemoryKeyPairStore>,
    pub dispatcher: Arc<MockDispatcher>,
}

impl Harness {
    /// Group "Team" with Alice (primary admin), Bob and Carol, and an
    /// initial key pair.
    pub fn new() -> Self {
        let alice = Account::random();
        let bob = Account::random();
        let carol = Account::random();
        let group_id = Account::random().id;

        let groups = Arc::new(MemoryGroupStore::new());
        let key_pairs = Arc::new(MemoryKeyPairStore::new());
        let dispatcher = Arc::new(MockDispatcher::default());

        groups
            .create_or_update_group(
                GroupState::new(
                    group_id.clone(),
                    "Team",
                    [alice.id.clone(), bob.id.clone(), carol.id.clone()],
                )
                .with_admins([alice.id.clone()]),
            )
            .unwrap();
        let initial_key = GroupKeyPair::generate();
        key_pairs
            .add_key_pair_if_needed(&group_id, &initial_key)
            .unwrap();

        Self {
            alice,
            bob,
            carol,
            group_id,
            initial_key,
            groups,
            key_pairs,
            dispatcher,
        }
    }

    pub fn collaborators(&self) -> Collaborators<TestProvider> {
        Collaborators::new(
            self.groups.clone(),
            self.key_pairs.clone(),
            self.dispatcher.clone(),
        )
    }

    /// Service acting as `us`.
    pub fn service(&self, us: &PubKey) -> ClosedGroupService<TestProvider> {
        ClosedGroupService::new(ServiceConfig::new(us.clone()), self.collaborators())
    }

    pub fn group(&self) -> GroupState {
        self.groups.get_group(&self.group_id).unwrap().unwrap()
    }

    pub fn replace_group(&self, state: GroupState) {
        self.groups.create_or_update_group(state).unwrap();
    }

    pub fn current_key(&self) -> Option<GroupKeyPair> {
        self.key_pairs.latest_key_pair(&self.group_id).unwrap()
    }

    pub fn members(&self) -> Vec<PubKey> {
        vec![
            self.alice.id.clone(),
            self.bob.id.clone(),
            self.carol.id.clone(),
        ]
    }
}
