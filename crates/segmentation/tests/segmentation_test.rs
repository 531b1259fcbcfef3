//! End-to-end behaviour of an audience over the stock profile member type.

use audience_core::{AudienceError, Profile};
use audience_segmentation::{
    Audience, InMemoryStore, ListSegment, RuleBuilder, RuleSegment, Segmentable,
};
use serde_json::json;
use std::sync::Arc;

fn profiles() -> Vec<Profile> {
    vec![
        Profile::new("ada").with_attribute("age", json!(36)),
        Profile::new("bob").with_attribute("age", json!(15)),
        Profile::new("cy").with_attribute("age", json!(52)),
    ]
}

fn audience() -> Audience<Profile> {
    let audience: Audience<Profile> =
        Audience::new(Arc::new(InMemoryStore::with_members(profiles())));
    audience
        .register("vip", |_| Ok(ListSegment::<Profile>::new()))
        .unwrap();
    audience
        .register("adults", |ctx| {
            let criteria = RuleBuilder::new().attribute_gte("age", json!(18)).criteria();
            Ok(RuleSegment::new(criteria, ctx.store()))
        })
        .unwrap();
    audience.seal();
    audience
}

#[test]
fn test_registered_names_resolve_to_themselves() {
    let audience = audience();
    for name in audience.segment_names() {
        assert!(audience.valid_segment(&name));
        assert_eq!(audience.segment(&name).unwrap().name(), name);
    }
    assert_eq!(audience.segment_names(), vec!["all", "none", "vip", "adults"]);
}

#[test]
fn test_universal_segments() {
    let audience = audience();
    let all = audience.segment("all").unwrap();
    let none = audience.segment("none").unwrap();
    for member in profiles() {
        assert!(all.include(&member).unwrap());
        assert!(!none.include(&member).unwrap());
    }
    let ids: Vec<_> = all.members().unwrap().map(|p| p.id).collect();
    assert_eq!(ids, vec!["ada", "bob", "cy"]);
    assert_eq!(none.members().unwrap().count(), 0);
}

#[test]
fn test_repeated_lookup_returns_same_instance() {
    let audience = audience();
    let first = audience.segment("vip").unwrap();
    let second = Profile::segment(&audience, ":VIP").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_reserved_and_duplicate_registration() {
    let audience: Audience<Profile> = Audience::new(Arc::new(InMemoryStore::<Profile>::new()));
    assert!(matches!(
        audience.register("all", |_| Ok(ListSegment::<Profile>::new())),
        Err(AudienceError::ReservedName(_))
    ));
    audience
        .register("vip", |_| Ok(ListSegment::<Profile>::new()))
        .unwrap();
    assert!(matches!(
        audience.register(":vip", |_| Ok(ListSegment::<Profile>::new())),
        Err(AudienceError::DuplicateName(_))
    ));
}

#[test]
fn test_add_and_remove_round_trip_membership() {
    let audience = audience();
    let bob = Profile::new("bob");

    assert!(!bob.in_segment(&audience, "vip").unwrap());
    bob.add_to_segment(&audience, "vip").unwrap();
    assert!(bob.in_segment(&audience, "vip").unwrap());
    bob.remove_from_segment(&audience, "vip").unwrap();
    assert!(!bob.in_segment(&audience, "vip").unwrap());
}

#[test]
fn test_member_segments_are_exactly_the_including_ones() {
    let audience = audience();
    let ada = profiles().remove(0);
    let bob = profiles().remove(1);

    ada.add_to_segment(&audience, "vip").unwrap();
    assert_eq!(
        ada.segment_names(&audience).unwrap(),
        vec!["all", "vip", "adults"]
    );
    assert_eq!(bob.segment_names(&audience).unwrap(), vec!["all"]);

    ada.remove_from_segments(&audience, ["vip"]).unwrap();
    assert_eq!(ada.segment_names(&audience).unwrap(), vec!["all", "adults"]);
}

#[test]
fn test_batch_add_stops_at_first_failure() {
    let audience: Audience<Profile> =
        Audience::new(Arc::new(InMemoryStore::with_members(profiles())));
    for name in ["first", "last"] {
        audience
            .register(name, |_| Ok(ListSegment::<Profile>::new()))
            .unwrap();
    }
    audience
        .register("adults", |ctx| {
            let criteria = RuleBuilder::new().attribute_gte("age", json!(18)).criteria();
            Ok(RuleSegment::new(criteria, ctx.store()))
        })
        .unwrap();

    let cy = Profile::new("cy");
    let err = cy
        .add_to_segments(&audience, ["first", "all", "adults", "last"])
        .unwrap_err();

    assert_eq!(err.segment(), Some("adults"));
    assert!(matches!(
        err,
        AudienceError::SegmentFailed { ref source, .. }
            if matches!(**source, AudienceError::UnsupportedOperation { operation: "add" })
    ));
    assert!(cy.in_segment(&audience, "first").unwrap());
    assert!(!cy.in_segment(&audience, "last").unwrap());
}

#[test]
fn test_batch_remove_stops_at_first_failure() {
    let audience: Audience<Profile> =
        Audience::new(Arc::new(InMemoryStore::with_members(profiles())));
    for name in ["first", "last"] {
        audience
            .register(name, |_| Ok(ListSegment::<Profile>::new()))
            .unwrap();
    }
    audience
        .register("adults", |ctx| {
            let criteria = RuleBuilder::new().attribute_gte("age", json!(18)).criteria();
            Ok(RuleSegment::new(criteria, ctx.store()))
        })
        .unwrap();

    let cy = Profile::new("cy");
    cy.add_to_segments(&audience, ["first", "last"]).unwrap();

    let err = cy
        .remove_from_segments(&audience, ["first", "adults", "last"])
        .unwrap_err();

    assert_eq!(err.segment(), Some("adults"));
    assert!(matches!(
        err,
        AudienceError::SegmentFailed { ref source, .. }
            if matches!(**source, AudienceError::UnsupportedOperation { operation: "remove" })
    ));
    assert!(!cy.in_segment(&audience, "first").unwrap());
    assert!(cy.in_segment(&audience, "last").unwrap());
}

#[test]
fn test_unregistered_name() {
    let audience = audience();
    assert!(matches!(
        audience.segment("ghost"),
        Err(AudienceError::NotFound(_))
    ));
    assert!(!audience.valid_segment("ghost"));

    let ada = Profile::new("ada");
    let err = ada.add_to_segments(&audience, ["vip", "ghost"]).unwrap_err();
    assert_eq!(err.segment(), Some("ghost"));
}

#[test]
fn test_registration_after_seal_fails() {
    let audience = audience();
    assert!(matches!(
        audience.register("late", |_| Ok(ListSegment::<Profile>::new())),
        Err(AudienceError::Sealed(_))
    ));
}
