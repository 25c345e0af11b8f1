//! Integration tests for the deletion cascade

use crate::integration::test_utils::{contour, harness};
use contour_groups::manager::{Outcome, SkipReason};
use contour_groups::types::InterpolationUid;
use std::collections::BTreeSet;

#[test]
fn test_removing_keyframe_deletes_only_its_group() {
    let h = harness();
    h.draw(contour("u-low", 2, 1, (0.0, 0.0)));
    h.draw(contour("u-high", 6, 1, (0.0, 0.0)));
    h.draw(contour("v-low", 2, 2, (5.0, 5.0)));
    h.draw(contour("v-high", 6, 2, (5.0, 5.0)));
    let u = InterpolationUid::from("grp-1");
    let v = InterpolationUid::from("grp-2");
    assert_eq!(h.generated_slices(&u).len(), 3);
    assert_eq!(h.generated_slices(&v).len(), 3);

    let outcome = h.erase("u-high");

    assert_eq!(
        outcome,
        Outcome::Deleted {
            interpolation_uid: Some(u.clone())
        }
    );
    assert!(h.generated_slices(&u).is_empty());
    assert_eq!(h.generated_slices(&v).len(), 3);
    // Keyframes are never removed by the cascade
    assert!(h.store.find("u-low").is_some());
    assert!(h.store.find("v-high").is_some());
}

#[test]
fn test_removing_generated_member_does_not_cascade() {
    let h = harness();
    h.draw(contour("a", 2, 1, (0.0, 0.0)));
    h.draw(contour("b", 8, 1, (0.0, 0.0)));
    let u = InterpolationUid::from("grp-1");

    let outcome = h.erase("grp-1-gen-5");

    assert_eq!(outcome, Outcome::Ignored(SkipReason::AutoGenerated));
    assert_eq!(h.engine.delete_calls(), 0);
    assert_eq!(h.generated_slices(&u), BTreeSet::from([3, 4, 6, 7]));
}

#[test]
fn test_removing_annotation_outside_any_context_is_ignored() {
    let h = harness();
    let mut stray = contour("a", 2, 1, (0.0, 0.0)).with_interpolation_uid("U");
    stray.metadata.as_mut().unwrap().frame_of_reference = "unknown".to_string();
    h.store.insert(&h.ctx, stray);

    assert_eq!(h.erase("a"), Outcome::Ignored(SkipReason::NoContext));
    assert_eq!(h.engine.delete_calls(), 0);
}
