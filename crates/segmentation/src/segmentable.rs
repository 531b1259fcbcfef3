//! Member-side segment awareness.
//!
//! A member type opts in with an empty `impl Segmentable for T {}`; every
//! operation here is a composition of registry lookups and segment calls.

use audience_core::{AudienceResult, Profile};
use std::sync::Arc;

use crate::audience::Audience;
use crate::segment::SegmentHandle;

pub trait Segmentable: audience_core::Member {
    /// Resolve a segment for this member type.
    fn segment(
        audience: &Audience<Self>,
        name: impl AsRef<str>,
    ) -> AudienceResult<Arc<SegmentHandle<Self>>> {
        audience.segment(name)
    }

    fn in_segment(&self, audience: &Audience<Self>, name: impl AsRef<str>) -> AudienceResult<bool> {
        audience.segment(name)?.include(self)
    }

    fn add_to_segment(&self, audience: &Audience<Self>, name: impl AsRef<str>) -> AudienceResult<()> {
        audience.segment(name)?.add(self)
    }

    /// Add to each segment in order, stopping at the first failure. The
    /// error names the segment that failed.
    fn add_to_segments<I>(&self, audience: &Audience<Self>, names: I) -> AudienceResult<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            self.add_to_segment(audience, name)
                .map_err(|e| e.in_segment(name))?;
        }
        Ok(())
    }

    fn remove_from_segment(
        &self,
        audience: &Audience<Self>,
        name: impl AsRef<str>,
    ) -> AudienceResult<()> {
        audience.segment(name)?.remove(self)
    }

    /// Remove from each segment in order, stopping at the first failure.
    fn remove_from_segments<I>(&self, audience: &Audience<Self>, names: I) -> AudienceResult<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            self.remove_from_segment(audience, name)
                .map_err(|e| e.in_segment(name))?;
        }
        Ok(())
    }

    /// Every registered segment that currently includes this member.
    /// Materializes the whole registry and is recomputed on each call.
    fn segments(&self, audience: &Audience<Self>) -> AudienceResult<Vec<Arc<SegmentHandle<Self>>>> {
        let mut matched = Vec::new();
        for segment in audience.segments()? {
            if segment.include(self)? {
                matched.push(segment);
            }
        }
        Ok(matched)
    }

    fn segment_names(&self, audience: &Audience<Self>) -> AudienceResult<Vec<String>> {
        Ok(self
            .segments(audience)?
            .iter()
            .map(|s| s.name().to_string())
            .collect())
    }
}

impl Segmentable for Profile {}
