//! Integration tests for group assignment on annotation completion

use crate::integration::test_utils::{contour, harness};
use contour_groups::manager::{Assignment, Outcome, SkipReason};
use contour_groups::types::InterpolationUid;
use std::collections::BTreeSet;

fn uid(value: &str) -> InterpolationUid {
    InterpolationUid::from(value)
}

fn slices(range: std::ops::RangeInclusive<usize>) -> BTreeSet<usize> {
    range.collect()
}

#[test]
fn test_first_keyframe_mints_a_group() {
    let h = harness();
    let (handle, outcome) = h.draw(contour("a", 4, 1, (0.0, 0.0)));

    assert_eq!(
        outcome,
        Outcome::Interpolated {
            interpolation_uid: Some(uid("grp-1")),
            assignment: Assignment::Minted,
        }
    );
    assert_eq!(handle.read().interpolation_uid, Some(uid("grp-1")));
    // A single keyframe spans no gap
    assert!(h.generated_slices(&uid("grp-1")).is_empty());
    assert_eq!(h.engine.synthesize_calls(), 1);
}

#[test]
fn test_second_keyframe_reuses_group_and_fills_gap() {
    let h = harness();
    h.draw(contour("a", 2, 1, (0.0, 0.0)));
    let (handle, outcome) = h.draw(contour("b", 8, 1, (0.5, 0.5)));

    assert_eq!(
        outcome,
        Outcome::Interpolated {
            interpolation_uid: Some(uid("grp-1")),
            assignment: Assignment::Reused,
        }
    );
    assert_eq!(handle.read().interpolation_uid, Some(uid("grp-1")));
    assert_eq!(h.generated_slices(&uid("grp-1")), slices(3..=7));
}

#[test]
fn test_remaining_keyframe_keeps_group_alive() {
    let h = harness();
    h.draw(contour("a", 2, 1, (0.0, 0.0)));
    h.draw(contour("b", 8, 1, (0.0, 0.0)));
    h.erase("a");
    assert!(h.generated_slices(&uid("grp-1")).is_empty());

    let (_, outcome) = h.draw(contour("c", 20, 1, (0.0, 0.0)));
    assert_eq!(outcome.interpolation_uid(), Some(&uid("grp-1")));
    assert_eq!(h.generated_slices(&uid("grp-1")), slices(9..=19));
}

#[test]
fn test_recompletion_is_idempotent() {
    let h = harness();
    let (first, _) = h.draw(contour("a", 2, 1, (0.0, 0.0)));
    h.draw(contour("b", 8, 1, (0.0, 0.0)));
    let before = h.store.snapshot();

    let outcome = h.recomplete(&first);

    assert_eq!(
        outcome,
        Outcome::Interpolated {
            interpolation_uid: Some(uid("grp-1")),
            assignment: Assignment::Kept,
        }
    );
    assert_eq!(first.read().interpolation_uid, Some(uid("grp-1")));
    assert_eq!(h.store.len(), before.len());
    assert_eq!(h.generated_slices(&uid("grp-1")), slices(3..=7));
    assert_eq!(h.engine.delete_calls(), 1);
}

#[test]
fn test_different_segments_never_merge() {
    let h = harness();
    let (a, _) = h.draw(contour("a", 2, 1, (0.0, 0.0)));
    let (b, outcome) = h.draw(contour("b", 8, 2, (0.0, 0.0)));

    assert!(matches!(
        outcome,
        Outcome::Interpolated {
            assignment: Assignment::Minted,
            ..
        }
    ));
    assert_ne!(a.read().interpolation_uid, b.read().interpolation_uid);
    assert!(h.generated_slices(&uid("grp-1")).is_empty());
    assert!(h.generated_slices(&uid("grp-2")).is_empty());
}

#[test]
fn test_different_orientation_never_merges() {
    let h = harness();
    h.draw(contour("a", 2, 1, (0.0, 0.0)));

    let mut sagittal = contour("b", 8, 1, (0.0, 0.0));
    let metadata = sagittal.metadata.as_mut().unwrap();
    metadata.view_plane_normal = [1.0, 0.0, 0.0];
    metadata.view_up = [0.0, 0.0, 1.0];
    let (_, outcome) = h.draw(sagittal);

    assert_eq!(outcome.interpolation_uid(), Some(&uid("grp-2")));
}

#[test]
fn test_nearest_group_wins_when_several_compatible() {
    let h = harness();
    h.store
        .insert(&h.ctx, contour("u1", 2, 1, (0.0, 0.0)).with_interpolation_uid("U1"));
    h.store
        .insert(&h.ctx, contour("u2", 4, 1, (10.0, 10.0)).with_interpolation_uid("U2"));

    let (handle, outcome) = h.draw(contour("t", 10, 1, (1.0, 1.0)));

    assert_eq!(
        outcome,
        Outcome::Interpolated {
            interpolation_uid: Some(uid("U1")),
            assignment: Assignment::Nearest,
        }
    );
    assert_eq!(handle.read().interpolation_uid, Some(uid("U1")));
    assert_eq!(h.generated_slices(&uid("U1")), slices(3..=9));
    assert!(h.generated_slices(&uid("U2")).is_empty());
}

#[test]
fn test_nearest_group_ignores_store_order() {
    let h = harness();
    h.store
        .insert(&h.ctx, contour("u2", 4, 1, (10.0, 10.0)).with_interpolation_uid("U2"));
    h.store
        .insert(&h.ctx, contour("u1", 2, 1, (0.0, 0.0)).with_interpolation_uid("U1"));

    let (_, outcome) = h.draw(contour("t", 10, 1, (1.0, 1.0)));
    assert_eq!(outcome.interpolation_uid(), Some(&uid("U1")));
}

#[test]
fn test_same_slice_keyframe_does_not_pull_new_contour_into_its_group() {
    let h = harness();
    h.draw(contour("a", 5, 1, (0.0, 0.0)));
    let (_, outcome) = h.draw(contour("b", 5, 1, (20.0, 20.0)));

    assert_eq!(
        outcome,
        Outcome::Interpolated {
            interpolation_uid: Some(uid("grp-2")),
            assignment: Assignment::Minted,
        }
    );
}

#[test]
fn test_completing_generated_member_promotes_it_to_keyframe() {
    let h = harness();
    h.draw(contour("a", 2, 1, (0.0, 0.0)));
    h.draw(contour("b", 8, 1, (0.0, 0.0)));
    let promoted = h.store.find("grp-1-gen-5").unwrap();
    assert!(promoted.read().auto_generated);

    let outcome = h.recomplete(&promoted);

    assert_eq!(
        outcome,
        Outcome::Interpolated {
            interpolation_uid: Some(uid("grp-1")),
            assignment: Assignment::Kept,
        }
    );
    assert!(!promoted.read().auto_generated);
    assert_eq!(
        h.generated_slices(&uid("grp-1")),
        BTreeSet::from([3, 4, 6, 7])
    );
}

#[test]
fn test_completion_without_context_changes_nothing() {
    let h = harness();
    let mut outside = contour("a", 2, 1, (0.0, 0.0)).generated();
    outside.metadata.as_mut().unwrap().slice_index = 99;
    let (handle, outcome) = h.draw(outside);

    assert_eq!(outcome, Outcome::Ignored(SkipReason::NoContext));
    assert!(handle.read().auto_generated);
    assert!(handle.read().interpolation_uid.is_none());
    assert_eq!(h.engine.synthesize_calls(), 0);
}

#[test]
fn test_unregistered_tool_is_ignored() {
    let h = harness();
    let mut arrow = contour("a", 2, 1, (0.0, 0.0));
    arrow.tool_name = "ArrowAnnotateTool".to_string();
    let (handle, outcome) = h.draw(arrow);

    assert_eq!(outcome, Outcome::Ignored(SkipReason::UnregisteredTool));
    assert!(handle.read().interpolation_uid.is_none());
}
