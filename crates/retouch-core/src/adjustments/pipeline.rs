//! Slider operations against a scene's background.
//!
//! Slider updates without a background are ignored: the values are always
//! read back from the filter list, so there is nowhere to record them.

use serde::Serialize;

use super::{AdjustmentFilter, AdjustmentKind, FilterOp};
use crate::scene::Scene;
use crate::FinetuneValues;

/// One active filter as reported to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterStatus {
    /// Position in application order
    pub index: usize,
    pub kind: AdjustmentKind,
    /// Filter name, e.g. `"Brightness"` or `"BlendColor"`
    pub filter: &'static str,
    pub value: i32,
    pub params: FilterOp,
}

/// Clamp `value`, replace or remove the kind's filter, and repaint.
///
/// Returns `false` (and changes nothing) when the scene has no background.
pub fn update_value(scene: &mut Scene, kind: AdjustmentKind, value: i32) -> bool {
    let Some(background) = scene.background_mut() else {
        log::debug!("Ignoring {kind} = {value}: no background image");
        return false;
    };

    let filters = background.filters_mut();
    match AdjustmentFilter::derive(kind, value) {
        Some(filter) => filters.set(filter),
        None => {
            filters.remove(kind);
        }
    }
    scene.render();
    true
}

/// Drop every filter at once and repaint. Returns `false` without a background.
pub fn reset(scene: &mut Scene) -> bool {
    let Some(background) = scene.background_mut() else {
        return false;
    };
    background.filters_mut().clear();
    scene.render();
    true
}

/// Current slider values, reduced from the background's filters.
pub fn finetune_values(scene: &Scene) -> FinetuneValues {
    scene
        .background()
        .map(|bg| bg.filters().values())
        .unwrap_or_default()
}

/// Active filters in application order.
pub fn filter_status(scene: &Scene) -> Vec<FilterStatus> {
    let Some(background) = scene.background() else {
        return Vec::new();
    };
    background
        .filters()
        .iter()
        .enumerate()
        .map(|(index, f)| FilterStatus {
            index,
            kind: f.kind,
            filter: f.op.name(),
            value: f.value,
            params: f.op.clone(),
        })
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use std::sync::Arc;

    use crate::decode::{DecodedImage, FilterType};
    use crate::render::RasterBackend;
    use crate::scene::BackgroundImage;
    use crate::Color;
    use proptest::prelude::*;

    fn small_scene() -> Scene {
        let mut scene = Scene::new(Arc::new(RasterBackend::new()), 8, 8, Color::WHITE).unwrap();
        let bg = BackgroundImage::fit(
            DecodedImage::filled(8, 8, [90, 90, 90, 255]),
            1.0,
            8,
            8,
            FilterType::Bilinear,
        )
        .unwrap();
        scene.replace_with_background(bg, 8, 8).unwrap();
        scene
    }

    fn update_strategy() -> impl Strategy<Value = (AdjustmentKind, i32)> {
        (prop::sample::select(AdjustmentKind::ALL.to_vec()), -150i32..=150)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        /// Values always mirror the filter list, and there is never more
        /// than one entry per kind.
        #[test]
        fn prop_values_mirror_filters(updates in prop::collection::vec(update_strategy(), 0..20)) {
            let mut scene = small_scene();
            let mut expected = FinetuneValues::new();
            for (kind, v) in &updates {
                update_value(&mut scene, *kind, *v);
                expected.set(*kind, kind.clamp_value(*v));
            }
            prop_assert_eq!(finetune_values(&scene), expected);

            let status = filter_status(&scene);
            let kinds: Vec<_> = status.iter().map(|s| s.kind).collect();
            let mut sorted = kinds.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(kinds, sorted);
        }

        /// Reset yields neutral values and no filters from any state.
        #[test]
        fn prop_reset_law(updates in prop::collection::vec(update_strategy(), 0..12)) {
            let mut scene = small_scene();
            for (kind, v) in updates {
                update_value(&mut scene, kind, v);
            }
            reset(&mut scene);
            prop_assert!(finetune_values(&scene).is_neutral());
            prop_assert!(filter_status(&scene).is_empty());
        }
    }
}
