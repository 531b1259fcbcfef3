//! Member store boundary: the persistence layer's side of the contract.

use audience_core::{AudienceResult, Member};
use parking_lot::RwLock;

/// Lazy sequence of members. Each call to a producer yields a fresh one.
pub type Members<M> = Box<dyn Iterator<Item = M> + Send>;

/// Supplies the member population to segments that need it.
pub trait MemberStore<M: Member>: Send + Sync {
    /// Every member currently known to the store.
    fn all(&self) -> AudienceResult<Members<M>>;

    /// An always-empty sequence.
    fn none(&self) -> Members<M> {
        Box::new(std::iter::empty())
    }
}

/// Thread-safe in-process store keeping members in insertion order.
pub struct InMemoryStore<M> {
    members: RwLock<Vec<M>>,
}

impl<M: Member> InMemoryStore<M> {
    pub fn new() -> Self {
        Self {
            members: RwLock::new(Vec::new()),
        }
    }

    pub fn with_members(members: impl IntoIterator<Item = M>) -> Self {
        Self {
            members: RwLock::new(members.into_iter().collect()),
        }
    }

    /// Insert a member, replacing any existing member with the same id.
    pub fn insert(&self, member: M) {
        let mut members = self.members.write();
        let id = member.member_id();
        match members.iter_mut().find(|m| m.member_id() == id) {
            Some(existing) => *existing = member,
            None => members.push(member),
        }
    }

    pub fn get(&self, id: &M::Id) -> Option<M> {
        self.members
            .read()
            .iter()
            .find(|m| &m.member_id() == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }
}

impl<M: Member> Default for InMemoryStore<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Member> MemberStore<M> for InMemoryStore<M> {
    fn all(&self) -> AudienceResult<Members<M>> {
        let snapshot = self.members.read().clone();
        Ok(Box::new(snapshot.into_iter()))
    }
}
