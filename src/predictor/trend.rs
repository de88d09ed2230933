//! Urban growth projection shown under the sample viewer

use serde::Serialize;

pub const TREND_YEARS: [i32; 9] = [2000, 2005, 2010, 2015, 2020, 2025, 2030, 2035, 2040];
pub const TREND_GROWTH_PCT: [u32; 9] = [10, 18, 25, 40, 55, 68, 78, 85, 88];

/// Year marked as "current" on the projection chart
pub const CURRENT_YEAR_MARKER: i32 = 2024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub year: i32,
    pub growth_pct: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct GrowthTrend {
    pub points: Vec<TrendPoint>,
    pub current_year: i32,
}

impl GrowthTrend {
    pub fn projection() -> Self {
        Self {
            points: TREND_YEARS
                .iter()
                .zip(TREND_GROWTH_PCT)
                .map(|(&year, growth_pct)| TrendPoint { year, growth_pct })
                .collect(),
            current_year: CURRENT_YEAR_MARKER,
        }
    }
}
