use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::VendorClass;

pub type Rgb = [u8; 3];

/// Maps a trajectory's vendor class to its trail color.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub trail_colors: BTreeMap<VendorClass, Rgb>,
    /// Used for classes missing from `trail_colors`. If unset, unknown classes get a color from a
    /// categorical palette, picked by class number.
    pub fallback: Option<Rgb>,
    pub building_color: Rgb,
}

impl Default for Theme {
    fn default() -> Self {
        let mut trail_colors = BTreeMap::new();
        trail_colors.insert(VendorClass(0), [253, 128, 93]);
        trail_colors.insert(VendorClass(1), [23, 184, 190]);
        Self {
            trail_colors,
            // Anything that isn't class 0 looks like class 1
            fallback: Some([23, 184, 190]),
            building_color: [74, 80, 87],
        }
    }
}

impl Theme {
    pub fn color_for_class(&self, class: VendorClass) -> Rgb {
        if let Some(color) = self.trail_colors.get(&class) {
            return *color;
        }
        if let Some(color) = self.fallback {
            return color;
        }
        let palette = &colorous::CATEGORY10;
        let color = palette[class.0 as usize % palette.len()];
        [color.r, color.g, color.b]
    }
}
