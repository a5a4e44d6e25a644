//! Demo runner: builds an in-memory group and applies one local change.
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, ValueEnum};
use log::info;

use crate::config::ServiceConfig;
use crate::core::{ClosedGroupProvider, ClosedGroupService, Collaborators, GroupState};
use crate::crypto::GroupKeyPair;
use crate::ds::{DeliveryServiceError, MessageDispatcher, Namespace};
use crate::identity::PubKey;
use crate::message::ControlMessage;
use crate::storage::{GroupStore, KeyPairStore, MemoryGroupStore, MemoryKeyPairStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Role {
    Admin,
    Member,
}

#[derive(Parser, Debug)]
#[command(version, about = "Apply a local change to a legacy closed group", long_about = None)]
pub struct Args {
    /// Group display name
    #[arg(short = 'n', long, default_value = "Demo group")]
    pub group_name: String,

    /// Members besides ourselves
    #[arg(short = 'm', long, default_value_t = 3)]
    pub members: usize,

    /// Whether we act as the group admin
    #[arg(short = 'r', long, value_enum, default_value_t = Role::Admin)]
    pub role: Role,

    /// New group name
    #[arg(long)]
    pub rename: Option<String>,

    /// Number of fresh members to add
    #[arg(long, default_value_t = 0)]
    pub add: usize,

    /// Number of existing members to remove
    #[arg(long, default_value_t = 0)]
    pub remove: usize,

    /// Make every send fail
    #[arg(long)]
    pub fail_sends: bool,
}

/// Prints every outgoing message as JSON instead of sending it.
#[derive(Default)]
pub struct LoggingDispatcher {
    fail: AtomicBool,
    next_id: AtomicU64,
}

impl LoggingDispatcher {
    pub fn new(fail: bool) -> Self {
        Self {
            fail: AtomicBool::new(fail),
            next_id: AtomicU64::new(1),
        }
    }

    fn emit(&self, destination: &PubKey, message: &ControlMessage, namespace: Namespace) -> String {
        let payload = serde_json::to_string(message).unwrap_or_else(|e| e.to_string());
        println!("-> {destination} [{}] {payload}", namespace.as_i16());
        format!("msg-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl MessageDispatcher for LoggingDispatcher {
    async fn send_to_group(
        &self,
        group_id: &PubKey,
        message: ControlMessage,
        namespace: Namespace,
    ) -> Result<String, DeliveryServiceError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeliveryServiceError::GroupSendFailed {
                group: group_id.to_string(),
                reason: "sends disabled".to_string(),
            });
        }
        Ok(self.emit(group_id, &message, namespace))
    }

    async fn send_to_member(
        &self,
        member: &PubKey,
        message: ControlMessage,
        namespace: Namespace,
    ) -> Result<String, DeliveryServiceError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeliveryServiceError::MemberSendFailed {
                member: member.to_string(),
                reason: "sends disabled".to_string(),
            });
        }
        Ok(self.emit(member, &message, namespace))
    }
}

pub struct DemoProvider;

impl ClosedGroupProvider for DemoProvider {
    type Groups = MemoryGroupStore;
    type KeyPairs = MemoryKeyPairStore;
    type Dispatcher = LoggingDispatcher;
}

fn random_account() -> PubKey {
    PubKey::from_public_key(GroupKeyPair::generate().public_key())
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    let us = random_account();
    let others: Vec<PubKey> = (0..args.members).map(|_| random_account()).collect();
    let group_id = random_account();

    // the admin is always the first member, us when acting as admin
    let admin = match args.role {
        Role::Admin => us.clone(),
        Role::Member => others.first().cloned().unwrap_or_else(random_account),
    };

    let groups = Arc::new(MemoryGroupStore::new());
    let key_pairs = Arc::new(MemoryKeyPairStore::new());
    let dispatcher = Arc::new(LoggingDispatcher::new(args.fail_sends));

    let mut members = others.clone();
    members.push(us.clone());
    groups.create_or_update_group(
        GroupState::new(group_id.clone(), &args.group_name, members.iter().cloned())
            .with_admins([admin]),
    )?;
    let initial = GroupKeyPair::generate();
    key_pairs.add_key_pair_if_needed(&group_id, &initial)?;
    info!("Created group {group_id} with {} members", members.len());

    let service = ClosedGroupService::<DemoProvider>::new(
        ServiceConfig::new(us.clone()),
        Collaborators::new(groups.clone(), key_pairs.clone(), dispatcher),
    );

    let name = args.rename.clone().unwrap_or(args.group_name.clone());
    if args.remove > 0 {
        let removable: Vec<PubKey> = others
            .iter()
            .filter(|m| args.role == Role::Admin || others.first() != Some(*m))
            .take(args.remove)
            .cloned()
            .collect();
        members.retain(|m| !removable.contains(m));
    }
    members.extend((0..args.add).map(|_| random_account()));

    let report = service
        .apply_local_change(&group_id, &name, &members)
        .await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    let current = key_pairs.latest_key_pair(&group_id)?;
    if current.as_ref() != Some(&initial) {
        info!("Group key pair rotated");
    }
    Ok(())
}
