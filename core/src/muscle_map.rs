//! Maps coarse muscle-group tallies onto the anatomical regions of a body
//! diagram, and turns region volumes into fill intensities.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;

/// Each diagram region id and the coarse group it belongs to.
pub const REGION_GROUPS: &[(&str, &str)] = &[
    ("neck", "neck"),
    ("upper-trapezius", "traps"),
    ("trapezius", "traps"),
    ("anterior-deltoid", "shoulders"),
    ("lateral-deltoid", "shoulders"),
    ("posterior-deltoid", "shoulders"),
    ("upper-pectoralis", "chest"),
    ("mid-lower-pectoralis", "chest"),
    ("upper-abdominals", "abs"),
    ("lower-abdominals", "abs"),
    ("obliques", "abs"),
    ("long-head-bicep", "biceps"),
    ("short-head-bicep", "biceps"),
    ("triceps", "triceps"),
    ("wrist-extensors", "forearms"),
    ("wrist-flexors", "forearms"),
    ("latissimus-dorsi", "back"),
    ("lower-back", "back"),
    ("outer-quadricep", "quads"),
    ("rectus-femoris", "quads"),
    ("inner-quadricep", "quads"),
    ("inner-thigh", "adductors"),
    ("gluteus", "glutes"),
    ("hamstrings", "hamstrings"),
    ("gastrocnemius", "calves"),
    ("soleus", "calves"),
    ("tibialis", "calves"),
    // back view
    ("lats", "back"),
    ("lowerback", "back"),
    ("gluteus-maximus", "glutes"),
    ("gluteus-medius", "glutes"),
    ("medial-hamstrings", "hamstrings"),
    ("lateral-hamstrings", "hamstrings"),
    ("medial-head-triceps", "triceps"),
    ("long-head-triceps", "triceps"),
    ("lateral-head-triceps", "triceps"),
    ("lower-trapezius", "traps"),
    ("traps-middle", "traps"),
];

/// Broad "legs" tag spans several groups, so it gets its own region list.
const LEGS_REGIONS: &[&str] = &[
    "outer-quadricep",
    "rectus-femoris",
    "inner-quadricep",
    "inner-thigh",
    "hamstrings",
    "gluteus",
    "gastrocnemius",
    "soleus",
    "tibialis",
];

static GROUP_REGIONS: LazyLock<HashMap<&'static str, Vec<&'static str>>> = LazyLock::new(|| {
    let mut index: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
    for &(region, group) in REGION_GROUPS {
        index.entry(group).or_default().push(region);
    }
    index.insert("legs", LEGS_REGIONS.to_vec());
    index
});

const INACTIVE_ALPHA: f64 = 0.2;
const MIN_OPACITY: f64 = 0.15;
const OPACITY_SPAN: f64 = 0.85;

/// Coarse group of a region id.
#[must_use]
pub fn group_for_region(region: &str) -> Option<&'static str> {
    REGION_GROUPS
        .iter()
        .find(|(r, _)| *r == region)
        .map(|(_, g)| *g)
}

/// Every region id drawn for `group`; empty for unknown groups.
#[must_use]
pub fn regions_for_group(group: &str) -> &'static [&'static str] {
    GROUP_REGIONS.get(group).map(Vec::as_slice).unwrap_or(&[])
}

/// Spread each nonzero group count over the group's regions. A region
/// reached from more than one group keeps the largest count.
#[must_use]
pub fn build_volume_map(coarse: &BTreeMap<String, u32>) -> BTreeMap<&'static str, u32> {
    let mut volumes = BTreeMap::new();
    for (group, &count) in coarse {
        if count == 0 {
            continue;
        }
        for &region in regions_for_group(group) {
            let current = volumes.entry(region).or_insert(0);
            *current = (*current).max(count);
        }
    }
    volumes
}

/// Largest count in a tally, never below 1.
#[must_use]
pub fn heatmap_max(coarse: &BTreeMap<String, u32>) -> u32 {
    coarse.values().copied().max().unwrap_or(0).max(1)
}

/// How strongly a region is filled on the body diagram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intensity {
    Inactive,
    Active { opacity: f64 },
}

impl Intensity {
    #[must_use]
    pub fn opacity(self) -> f64 {
        match self {
            Intensity::Inactive => 0.0,
            Intensity::Active { opacity } => opacity,
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intensity::Inactive => write!(f, "hsl(var(--muted) / {INACTIVE_ALPHA})"),
            Intensity::Active { opacity } => write!(f, "hsl(var(--primary) / {opacity})"),
        }
    }
}

/// Linear opacity between 0.15 and 1.0 in `volume / max_volume`, clamped.
/// A missing or zero `max_volume` counts as 1.
#[must_use]
pub fn color_for_volume(volume: f64, max_volume: Option<f64>) -> Intensity {
    if volume <= 0.0 {
        return Intensity::Inactive;
    }
    let max_volume = match max_volume {
        Some(m) if m > 0.0 => m,
        _ => 1.0,
    };
    let intensity = (volume / max_volume).min(1.0);
    Intensity::Active {
        opacity: MIN_OPACITY + intensity * OPACITY_SPAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(pairs: &[(&str, u32)]) -> BTreeMap<String, u32> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn test_every_region_has_one_group() {
        let mut seen = std::collections::HashSet::new();
        for (region, _) in REGION_GROUPS {
            assert!(seen.insert(region), "duplicate region {region}");
        }
        assert_eq!(group_for_region("upper-pectoralis"), Some("chest"));
        assert_eq!(group_for_region("lateral-head-triceps"), Some("triceps"));
        assert_eq!(group_for_region("tail"), None);
    }

    #[test]
    fn test_reverse_index() {
        let chest = regions_for_group("chest");
        assert_eq!(chest, &["upper-pectoralis", "mid-lower-pectoralis"]);
        assert_eq!(regions_for_group("triceps").len(), 4);
        assert!(regions_for_group("wings").is_empty());
        assert!(regions_for_group("legs").contains(&"tibialis"));
    }

    #[test]
    fn test_build_volume_map() {
        let map = build_volume_map(&tally(&[("chest", 5), ("back", 3), ("abs", 0)]));
        assert_eq!(map.get("upper-pectoralis"), Some(&5));
        assert_eq!(map.get("mid-lower-pectoralis"), Some(&5));
        assert_eq!(map.get("lats"), Some(&3));
        assert_eq!(map.get("lower-back"), Some(&3));
        assert!(!map.contains_key("obliques"));
        assert_eq!(map.len(), 6);
    }

    #[test]
    fn test_build_volume_map_overlap_keeps_max() {
        // "hamstrings" belongs to both the hamstrings group and broad legs
        let map = build_volume_map(&tally(&[("hamstrings", 2), ("legs", 7)]));
        assert_eq!(map.get("hamstrings"), Some(&7));
        assert_eq!(map.get("medial-hamstrings"), Some(&2));

        let map = build_volume_map(&tally(&[("hamstrings", 9), ("legs", 1)]));
        assert_eq!(map.get("hamstrings"), Some(&9));
        assert_eq!(map.get("soleus"), Some(&1));
    }

    #[test]
    fn test_build_volume_map_unknown_group() {
        assert!(build_volume_map(&tally(&[("wings", 4)])).is_empty());
    }

    #[test]
    fn test_heatmap_max() {
        assert_eq!(heatmap_max(&tally(&[("chest", 5), ("back", 3)])), 5);
        assert_eq!(heatmap_max(&tally(&[("chest", 0)])), 1);
        assert_eq!(heatmap_max(&BTreeMap::new()), 1);
    }

    #[test]
    fn test_color_inactive() {
        assert_eq!(color_for_volume(0.0, Some(10.0)), Intensity::Inactive);
        assert_eq!(
            color_for_volume(0.0, None).to_string(),
            "hsl(var(--muted) / 0.2)"
        );
    }

    #[test]
    fn test_color_range_and_clamp() {
        assert!((color_for_volume(10.0, Some(10.0)).opacity() - 1.0).abs() < 1e-9);
        assert!((color_for_volume(50.0, Some(10.0)).opacity() - 1.0).abs() < 1e-9);
        assert!((color_for_volume(5.0, Some(10.0)).opacity() - 0.575).abs() < 1e-9);
        let faint = color_for_volume(0.001, Some(1000.0)).opacity();
        assert!(faint > 0.15 && faint < 0.16);
    }

    #[test]
    fn test_color_zero_or_missing_max_defaults_to_one() {
        assert!((color_for_volume(1.0, Some(0.0)).opacity() - 1.0).abs() < 1e-9);
        assert!((color_for_volume(0.5, None).opacity() - 0.575).abs() < 1e-9);
    }

    #[test]
    fn test_color_css() {
        assert_eq!(
            color_for_volume(1.0, Some(1.0)).to_string(),
            "hsl(var(--primary) / 1)"
        );
    }
}
