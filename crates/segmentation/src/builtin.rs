//! The two universal segments, registered in every registry under the
//! reserved names `all` and `none`.

use audience_core::{AudienceResult, Member};
use std::sync::Arc;

use crate::segment::Segment;
use crate::store::{MemberStore, Members};

pub const ALL: &str = "all";
pub const NONE: &str = "none";
pub const RESERVED: [&str; 2] = [ALL, NONE];

/// Everyone in the member store. Adding and removing are no-ops.
pub struct AllSegment<M: Member> {
    store: Arc<dyn MemberStore<M>>,
}

impl<M: Member> AllSegment<M> {
    pub fn new(store: Arc<dyn MemberStore<M>>) -> Self {
        Self { store }
    }
}

impl<M: Member> Segment<M> for AllSegment<M> {
    fn members(&self) -> AudienceResult<Members<M>> {
        self.store.all()
    }

    fn include(&self, _member: &M) -> AudienceResult<bool> {
        Ok(true)
    }

    fn add(&self, _member: &M) -> AudienceResult<()> {
        Ok(())
    }

    fn remove(&self, _member: &M) -> AudienceResult<()> {
        Ok(())
    }
}

/// No-one. Adding and removing are no-ops.
pub struct NoneSegment<M: Member> {
    store: Arc<dyn MemberStore<M>>,
}

impl<M: Member> NoneSegment<M> {
    pub fn new(store: Arc<dyn MemberStore<M>>) -> Self {
        Self { store }
    }
}

impl<M: Member> Segment<M> for NoneSegment<M> {
    fn members(&self) -> AudienceResult<Members<M>> {
        Ok(self.store.none())
    }

    fn include(&self, _member: &M) -> AudienceResult<bool> {
        Ok(false)
    }

    fn add(&self, _member: &M) -> AudienceResult<()> {
        Ok(())
    }

    fn remove(&self, _member: &M) -> AudienceResult<()> {
        Ok(())
    }

    fn size(&self) -> AudienceResult<usize> {
        Ok(0)
    }
}
