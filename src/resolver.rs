//! Group Resolution
//!
//! Decides which interpolation group a freshly completed, ungrouped annotation joins.
//! Segment and orientation are the primary signal; spatial proximity only disambiguates
//! when several existing groups remain compatible. Resolution is a pure function of the
//! target and the candidate snapshot, so it never mints identifiers itself.

use crate::annotation::Annotation;
use crate::types::{in_plane_distance, InterpolationUid};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Grouping policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Require equal segmentation ids in addition to equal segment indices
    #[serde(default = "default_true")]
    pub match_segmentation_id: bool,

    /// Never reuse an identifier already held by a keyframe on the target's slice
    #[serde(default = "default_true")]
    pub exclude_same_slice_keyframes: bool,
}

fn default_true() -> bool {
    true
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            match_segmentation_id: true,
            exclude_same_slice_keyframes: true,
        }
    }
}

/// Outcome of resolving one annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupDecision {
    /// Exactly one compatible group exists
    Reuse(InterpolationUid),
    /// Several compatible groups; the spatially nearest one was chosen
    Nearest(InterpolationUid),
    /// No compatible group; the caller mints a fresh identifier
    Mint,
}

impl GroupDecision {
    pub fn uid(&self) -> Option<&InterpolationUid> {
        match self {
            GroupDecision::Reuse(uid) | GroupDecision::Nearest(uid) => Some(uid),
            GroupDecision::Mint => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GroupResolver {
    config: GroupingConfig,
}

impl GroupResolver {
    pub fn new(config: GroupingConfig) -> Self {
        Self { config }
    }

    /// Same segment and orientation class as `target`, and not `target` itself.
    pub fn is_compatible(&self, target: &Annotation, candidate: &Annotation) -> bool {
        if candidate.annotation_uid == target.annotation_uid {
            return false;
        }
        let (Some(target_meta), Some(candidate_meta)) = (&target.metadata, &candidate.metadata)
        else {
            return false;
        };
        candidate.segment_index() == target.segment_index()
            && (!self.config.match_segmentation_id
                || candidate.segmentation_id() == target.segmentation_id())
            && target_meta.same_orientation(candidate_meta)
    }

    pub fn resolve<'a, I>(&self, target: &Annotation, candidates: I) -> GroupDecision
    where
        I: IntoIterator<Item = &'a Annotation>,
    {
        let target_slice = target.slice_index();
        let mut excluded: BTreeSet<&InterpolationUid> = BTreeSet::new();
        let mut grouped: Vec<(&InterpolationUid, &Annotation)> = Vec::new();

        for candidate in candidates {
            if !self.is_compatible(target, candidate) {
                continue;
            }
            let Some(uid) = candidate.interpolation_uid.as_ref() else {
                continue;
            };
            if self.config.exclude_same_slice_keyframes
                && !candidate.auto_generated
                && candidate.slice_index() == target_slice
            {
                excluded.insert(uid);
                continue;
            }
            grouped.push((uid, candidate));
        }
        grouped.retain(|(uid, _)| !excluded.contains(uid));

        let distinct: BTreeSet<&InterpolationUid> = grouped.iter().map(|(uid, _)| *uid).collect();
        match distinct.len() {
            0 => GroupDecision::Mint,
            1 => GroupDecision::Reuse(grouped[0].0.clone()),
            _ => GroupDecision::Nearest(Self::nearest(target, &grouped)),
        }
    }

    /// Identifier of the candidate closest to the target in the slice plane.
    ///
    /// Equal distances resolve to the smallest identifier. Candidates without a finite
    /// distance are skipped; when none has one, the smallest identifier wins.
    /// `grouped` must not be empty.
    fn nearest(target: &Annotation, grouped: &[(&InterpolationUid, &Annotation)]) -> InterpolationUid {
        let normal = target
            .metadata
            .as_ref()
            .map(|m| m.view_plane_normal)
            .unwrap_or([0.0; 3]);

        let mut best: Option<(f64, &InterpolationUid)> = None;
        if let Some(center) = target.center_point() {
            for (uid, candidate) in grouped {
                let Some(candidate_center) = candidate.center_point() else {
                    continue;
                };
                let distance = in_plane_distance(&center, &candidate_center, &normal);
                if !distance.is_finite() {
                    continue;
                }
                best = match best {
                    Some((best_distance, best_uid))
                        if distance
                            .total_cmp(&best_distance)
                            .then_with(|| (*uid).cmp(best_uid))
                            .is_ge() =>
                    {
                        Some((best_distance, best_uid))
                    }
                    _ => Some((distance, *uid)),
                };
            }
        }

        match best {
            Some((_, uid)) => uid.clone(),
            None => grouped
                .iter()
                .map(|(uid, _)| *uid)
                .min()
                .unwrap_or(grouped[0].0)
                .clone(),
        }
    }

    /// Every identifier present in the candidate set, compatible or not.
    pub fn known_uids<'a, I>(candidates: I) -> BTreeSet<InterpolationUid>
    where
        I: IntoIterator<Item = &'a Annotation>,
    {
        candidates
            .into_iter()
            .filter_map(|a| a.interpolation_uid.clone())
            .collect()
    }
}
