//! List segments: explicitly curated membership held in memory.

use audience_core::{AudienceResult, Member};
use dashmap::DashMap;
use tracing::debug;

use crate::segment::Segment;
use crate::store::Members;

/// A mutable segment whose members are exactly those added to it.
/// Concurrent `add`/`remove` calls serialize per member id on the map.
pub struct ListSegment<M: Member> {
    members: DashMap<M::Id, M>,
}

impl<M: Member> ListSegment<M> {
    pub fn new() -> Self {
        Self {
            members: DashMap::new(),
        }
    }

    pub fn with_members(members: impl IntoIterator<Item = M>) -> Self {
        let segment = Self::new();
        for member in members {
            segment.members.insert(member.member_id(), member);
        }
        segment
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<M: Member> Default for ListSegment<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Member> Segment<M> for ListSegment<M> {
    fn members(&self) -> AudienceResult<Members<M>> {
        let snapshot: Vec<M> = self.members.iter().map(|e| e.value().clone()).collect();
        Ok(Box::new(snapshot.into_iter()))
    }

    fn include(&self, member: &M) -> AudienceResult<bool> {
        Ok(self.members.contains_key(&member.member_id()))
    }

    fn add(&self, member: &M) -> AudienceResult<()> {
        let id = member.member_id();
        debug!(member = ?id, "List segment add");
        self.members.insert(id, member.clone());
        Ok(())
    }

    fn remove(&self, member: &M) -> AudienceResult<()> {
        let id = member.member_id();
        debug!(member = ?id, "List segment remove");
        self.members.remove(&id);
        Ok(())
    }

    fn size(&self) -> AudienceResult<usize> {
        Ok(self.members.len())
    }
}
