//! Piecewise-linear approximations of matplotlib's viridis, plasma and
//! coolwarm colormaps.

use serde::{Deserialize, Serialize};

type Stop = (f32, [u8; 3]);

const VIRIDIS: &[Stop] = &[
    (0.00, [68, 1, 84]),
    (0.25, [59, 82, 139]),
    (0.50, [33, 145, 140]),
    (0.75, [94, 201, 98]),
    (1.00, [253, 231, 37]),
];

const PLASMA: &[Stop] = &[
    (0.00, [13, 8, 135]),
    (0.25, [126, 3, 168]),
    (0.50, [204, 71, 120]),
    (0.75, [248, 149, 64]),
    (1.00, [240, 249, 33]),
];

const COOLWARM: &[Stop] = &[
    (0.00, [59, 76, 192]),
    (0.25, [141, 176, 254]),
    (0.50, [221, 221, 221]),
    (0.75, [244, 154, 123]),
    (1.00, [180, 4, 38]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Colormap {
    Viridis,
    Plasma,
    Coolwarm,
}

impl Colormap {
    fn stops(self) -> &'static [Stop] {
        match self {
            Self::Viridis => VIRIDIS,
            Self::Plasma => PLASMA,
            Self::Coolwarm => COOLWARM,
        }
    }

    /// Colour for `value`; inputs outside `[0, 1]` (and NaN) are clamped
    pub fn rgb(self, value: f32) -> [u8; 3] {
        let v = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        let stops = self.stops();

        for pair in stops.windows(2) {
            let (t0, c0) = pair[0];
            let (t1, c1) = pair[1];
            if v <= t1 {
                let f = (v - t0) / (t1 - t0);
                return [lerp(c0[0], c1[0], f), lerp(c0[1], c1[1], f), lerp(c0[2], c1[2], f)];
            }
        }

        stops[stops.len() - 1].1
    }
}

fn lerp(a: u8, b: u8, f: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * f).round().clamp(0.0, 255.0) as u8
}
