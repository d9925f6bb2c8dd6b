//! Finetune adjustments.
//!
//! Eight slider kinds map to at most one [`AdjustmentFilter`] each on the
//! background image. Filters always compose in canonical kind order:
//!
//! 1. Brightness
//! 2. Contrast
//! 3. Saturation
//! 4. Exposure
//! 5. Temperature
//! 6. Gamma
//! 7. Clarity
//! 8. Vignette
//!
//! Slider values are clamped to the kind's UI range, then mapped to a bounded
//! filter parameter by [`AdjustmentFilter::derive`].

mod filters;
mod pipeline;

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Color, FinetuneValues};

pub use filters::apply_filters;
pub use pipeline::{filter_status, finetune_values, reset, update_value, FilterStatus};

/// Warm tint used by positive temperature.
pub const WARM_TINT: Color = Color::rgb(0xff, 0x8c, 0x00);
/// Cool tint used by negative temperature.
pub const COOL_TINT: Color = Color::rgb(0x00, 0x66, 0xcc);
/// 3x3 edge-sharpen kernel used by clarity.
pub const SHARPEN_KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];

/// Error returned when an adjustment name is not one of the eight kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown adjustment kind: {0}")]
pub struct UnknownAdjustment(pub String);

/// The eight finetune kinds, declared in canonical application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
    Brightness,
    Contrast,
    Saturation,
    Exposure,
    Temperature,
    Gamma,
    Clarity,
    Vignette,
}

impl AdjustmentKind {
    /// All kinds in canonical order.
    pub const ALL: [AdjustmentKind; 8] = [
        AdjustmentKind::Brightness,
        AdjustmentKind::Contrast,
        AdjustmentKind::Saturation,
        AdjustmentKind::Exposure,
        AdjustmentKind::Temperature,
        AdjustmentKind::Gamma,
        AdjustmentKind::Clarity,
        AdjustmentKind::Vignette,
    ];

    /// Inclusive UI-facing slider range.
    pub fn range(self) -> RangeInclusive<i32> {
        match self {
            AdjustmentKind::Clarity | AdjustmentKind::Vignette => 0..=100,
            _ => -100..=100,
        }
    }

    /// Slider value at which the kind has no filter.
    pub fn neutral(self) -> i32 {
        0
    }

    pub fn clamp_value(self, value: i32) -> i32 {
        let range = self.range();
        value.clamp(*range.start(), *range.end())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AdjustmentKind::Brightness => "brightness",
            AdjustmentKind::Contrast => "contrast",
            AdjustmentKind::Saturation => "saturation",
            AdjustmentKind::Exposure => "exposure",
            AdjustmentKind::Temperature => "temperature",
            AdjustmentKind::Gamma => "gamma",
            AdjustmentKind::Clarity => "clarity",
            AdjustmentKind::Vignette => "vignette",
        }
    }
}

impl fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdjustmentKind {
    type Err = UnknownAdjustment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AdjustmentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownAdjustment(s.to_string()))
    }
}

/// How a [`FilterOp::BlendColor`] combines its color with the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// `v * (1 - a) + color * a`
    Tint,
    /// `v * (1 - a) + (v * color / 255) * a`
    Multiply,
}

/// A pixel-level filter operation with its derived parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FilterOp {
    Brightness { brightness: f32 },
    Contrast { contrast: f32 },
    Saturation { saturation: f32 },
    BlendColor { color: Color, mode: BlendMode, alpha: f32 },
    Gamma { gamma: [f32; 3] },
    Convolute { matrix: [f32; 9], opacity: f32 },
}

impl FilterOp {
    /// Filter name as reported by filter status.
    pub fn name(&self) -> &'static str {
        match self {
            FilterOp::Brightness { .. } => "Brightness",
            FilterOp::Contrast { .. } => "Contrast",
            FilterOp::Saturation { .. } => "Saturation",
            FilterOp::BlendColor { .. } => "BlendColor",
            FilterOp::Gamma { .. } => "Gamma",
            FilterOp::Convolute { .. } => "Convolute",
        }
    }
}

/// One filter on the background, tagged with the kind and slider value it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentFilter {
    pub kind: AdjustmentKind,
    /// Clamped UI value this filter was derived from
    pub value: i32,
    pub op: FilterOp,
}

impl AdjustmentFilter {
    /// Derive the filter for a slider value.
    ///
    /// The value is clamped to the kind's UI range first. Returns `None` at
    /// the neutral value, meaning the kind should have no filter.
    pub fn derive(kind: AdjustmentKind, value: i32) -> Option<Self> {
        let value = kind.clamp_value(value);
        if value == kind.neutral() {
            return None;
        }
        let v = value as f32;

        let op = match kind {
            AdjustmentKind::Brightness => FilterOp::Brightness {
                brightness: (v / 250.0).clamp(-0.4, 0.4),
            },
            AdjustmentKind::Contrast => FilterOp::Contrast {
                contrast: (v / 250.0).clamp(-0.4, 0.4),
            },
            AdjustmentKind::Saturation => FilterOp::Saturation {
                saturation: (v / 200.0).clamp(-0.5, 0.5),
            },
            // Separate brightness-style entry, independent of Brightness
            AdjustmentKind::Exposure => FilterOp::Brightness {
                brightness: (v / 333.0).clamp(-0.3, 0.3),
            },
            AdjustmentKind::Temperature => FilterOp::BlendColor {
                color: if value > 0 { WARM_TINT } else { COOL_TINT },
                mode: BlendMode::Tint,
                alpha: (v.abs() / 333.0).min(0.3),
            },
            AdjustmentKind::Gamma => {
                let gamma = (1.0 + v / 250.0).clamp(0.6, 1.4);
                FilterOp::Gamma {
                    gamma: [gamma; 3],
                }
            }
            AdjustmentKind::Clarity => FilterOp::Convolute {
                matrix: SHARPEN_KERNEL,
                opacity: (v / 250.0).min(0.4),
            },
            AdjustmentKind::Vignette => FilterOp::BlendColor {
                color: Color::BLACK,
                mode: BlendMode::Multiply,
                alpha: (v / 250.0).min(0.4),
            },
        };

        Some(Self { kind, value, op })
    }
}

/// The background's filter list: at most one entry per kind, kept in
/// canonical kind order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<AdjustmentFilter>", into = "Vec<AdjustmentFilter>")]
pub struct FilterStack {
    entries: Vec<AdjustmentFilter>,
}

impl FilterStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the filter, replacing any existing entry of the same kind.
    pub fn set(&mut self, filter: AdjustmentFilter) {
        match self.entries.binary_search_by(|f| f.kind.cmp(&filter.kind)) {
            Ok(i) => self.entries[i] = filter,
            Err(i) => self.entries.insert(i, filter),
        }
    }

    /// Remove the entry for `kind`, if any.
    pub fn remove(&mut self, kind: AdjustmentKind) -> Option<AdjustmentFilter> {
        self.entries
            .binary_search_by(|f| f.kind.cmp(&kind))
            .ok()
            .map(|i| self.entries.remove(i))
    }

    pub fn get(&self, kind: AdjustmentKind) -> Option<&AdjustmentFilter> {
        self.entries
            .binary_search_by(|f| f.kind.cmp(&kind))
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn contains(&self, kind: AdjustmentKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in canonical application order.
    pub fn iter(&self) -> impl Iterator<Item = &AdjustmentFilter> {
        self.entries.iter()
    }

    /// Reduce the entries back to slider values (absent kinds are neutral).
    pub fn values(&self) -> FinetuneValues {
        let mut values = FinetuneValues::new();
        for filter in &self.entries {
            values.set(filter.kind, filter.value);
        }
        values
    }
}

impl From<Vec<AdjustmentFilter>> for FilterStack {
    fn from(mut entries: Vec<AdjustmentFilter>) -> Self {
        // Stable sort keeps the last duplicate after dedup below
        entries.reverse();
        entries.sort_by_key(|f| f.kind);
        entries.dedup_by_key(|f| f.kind);
        Self { entries }
    }
}

impl From<FilterStack> for Vec<AdjustmentFilter> {
    fn from(stack: FilterStack) -> Self {
        stack.entries
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn kind_strategy() -> impl Strategy<Value = AdjustmentKind> {
        prop::sample::select(AdjustmentKind::ALL.to_vec())
    }

    proptest! {
        /// Setting the same value twice leaves exactly one entry.
        #[test]
        fn prop_replace_not_append(kind in kind_strategy(), v in -100i32..=100) {
            let mut stack = FilterStack::new();
            for _ in 0..2 {
                match AdjustmentFilter::derive(kind, v) {
                    Some(f) => stack.set(f),
                    None => { stack.remove(kind); }
                }
            }
            let count = stack.iter().filter(|f| f.kind == kind).count();
            prop_assert!(count <= 1);
            prop_assert_eq!(count == 1, kind.clamp_value(v) != kind.neutral());
        }

        /// A neutral update after any value removes the kind's entry.
        #[test]
        fn prop_neutral_removes(kind in kind_strategy(), v in -200i32..=200) {
            let mut stack = FilterStack::new();
            if let Some(f) = AdjustmentFilter::derive(kind, v) {
                stack.set(f);
            }
            prop_assert!(AdjustmentFilter::derive(kind, kind.neutral()).is_none());
            stack.remove(kind);
            prop_assert!(!stack.contains(kind));
        }

        /// Derived parameters never exceed their documented bounds.
        #[test]
        fn prop_parameters_bounded(kind in kind_strategy(), v in i32::MIN..=i32::MAX) {
            if let Some(filter) = AdjustmentFilter::derive(kind, v) {
                prop_assert!(kind.range().contains(&filter.value));
                match filter.op {
                    FilterOp::Brightness { brightness } => prop_assert!(brightness.abs() <= 0.4),
                    FilterOp::Contrast { contrast } => prop_assert!(contrast.abs() <= 0.4),
                    FilterOp::Saturation { saturation } => prop_assert!(saturation.abs() <= 0.5),
                    FilterOp::BlendColor { alpha, .. } => prop_assert!((0.0..=0.4).contains(&alpha)),
                    FilterOp::Gamma { gamma } => prop_assert!(gamma.iter().all(|g| (0.6..=1.4).contains(g))),
                    FilterOp::Convolute { opacity, .. } => prop_assert!((0.0..=0.4).contains(&opacity)),
                }
            }
        }

        /// Values reconstructed from the stack equal the clamped inputs.
        #[test]
        fn prop_values_roundtrip(values in prop::collection::vec(-150i32..=150, 8)) {
            let mut stack = FilterStack::new();
            for (kind, v) in AdjustmentKind::ALL.into_iter().zip(values.iter().copied()) {
                if let Some(f) = AdjustmentFilter::derive(kind, v) {
                    stack.set(f);
                }
            }
            let reduced = stack.values();
            for (kind, v) in AdjustmentKind::ALL.into_iter().zip(values) {
                prop_assert_eq!(reduced.get(kind), kind.clamp_value(v));
            }
        }
    }
}
