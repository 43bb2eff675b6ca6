//! Colour quantization
//!
//! Pixels are first counted by exact colour. Distinct colours are then
//! visited from most to least frequent, and each one joins the earliest
//! representative within `tolerance` or becomes a representative itself.
//! Only representatives are compared, so a smooth gradient splits into
//! several samples instead of collapsing into one.

use super::hsl::Rgb;
use image::RgbImage;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::trace;

/// Distance metric applied to the tolerance, in 8-bit RGB units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorDistance {
    /// Straight-line distance in RGB space
    #[default]
    Euclidean,
    /// Largest single-channel difference
    PerChannel,
}

impl ColorDistance {
    pub fn within(self, a: Rgb, b: Rgb, tolerance: u32) -> bool {
        let dr = i64::from(a.r) - i64::from(b.r);
        let dg = i64::from(a.g) - i64::from(b.g);
        let db = i64::from(a.b) - i64::from(b.b);
        let t = i64::from(tolerance);
        match self {
            ColorDistance::Euclidean => dr * dr + dg * dg + db * db <= t * t,
            ColorDistance::PerChannel => dr.abs().max(dg.abs()).max(db.abs()) <= t,
        }
    }
}

/// A representative colour and the number of pixels it stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSample {
    pub color: Rgb,
    pub count: u64,
}

/// Quantize every pixel of `image`
pub fn quantize(image: &RgbImage, tolerance: u32, distance: ColorDistance) -> Vec<ColorSample> {
    quantize_pixels(image.pixels().map(|p| Rgb::from(p.0)), tolerance, distance)
}

/// Quantize a pixel stream in row-major order
///
/// Each sample's colour is the most frequent exact colour of its group
/// (earliest wins a tie). Samples come back ordered by the first appearance
/// of any of their pixels.
pub fn quantize_pixels<I>(pixels: I, tolerance: u32, distance: ColorDistance) -> Vec<ColorSample>
where
    I: IntoIterator<Item = Rgb>,
{
    let distinct = count_exact(pixels);
    if tolerance == 0 || distinct.len() < 2 {
        return distinct;
    }
    let merged = merge(&distinct, tolerance, distance);
    trace!(
        distinct = distinct.len(),
        samples = merged.samples.len(),
        comparisons = merged.comparisons,
        "Merged colours"
    );
    merged.samples
}

fn count_exact<I>(pixels: I) -> Vec<ColorSample>
where
    I: IntoIterator<Item = Rgb>,
{
    let mut index: HashMap<Rgb, usize> = HashMap::new();
    let mut distinct: Vec<ColorSample> = Vec::new();

    for color in pixels {
        match index.entry(color) {
            Entry::Occupied(e) => distinct[*e.get()].count += 1,
            Entry::Vacant(e) => {
                e.insert(distinct.len());
                distinct.push(ColorSample { color, count: 1 });
            }
        }
    }

    distinct
}

struct Group {
    sample: ColorSample,
    /// Smallest first-seen position among the members
    first_seen: usize,
}

struct Merged {
    samples: Vec<ColorSample>,
    /// Distance checks performed against representatives
    comparisons: usize,
}

/// Greedy merge of first-seen `distinct` colours
fn merge(distinct: &[ColorSample], tolerance: u32, distance: ColorDistance) -> Merged {
    // Stable: equal counts are visited in first-seen order
    let mut visit: Vec<usize> = (0..distinct.len()).collect();
    visit.sort_by(|&a, &b| distinct[b].count.cmp(&distinct[a].count));

    let mut index = RepresentativeIndex::new(tolerance);
    let mut groups: Vec<Group> = Vec::new();

    for i in visit {
        let sample = distinct[i];
        match index.earliest_within(sample.color, &groups, tolerance, distance) {
            Some(g) => {
                let group = &mut groups[g];
                group.sample.count += sample.count;
                group.first_seen = group.first_seen.min(i);
            }
            None => {
                index.insert(sample.color, groups.len());
                groups.push(Group { sample, first_seen: i });
            }
        }
    }

    groups.sort_by_key(|g| g.first_seen);
    Merged {
        samples: groups.into_iter().map(|g| g.sample).collect(),
        comparisons: index.comparisons,
    }
}

/// Grid of cubes over representative colours
///
/// Cubes have side `tolerance` (capped at 256), so a representative within
/// range sits in the same or an adjacent cube. Representatives are pairwise
/// farther apart than `tolerance`, which keeps every cube nearly empty: at
/// most one per cube per-channel, at most eight Euclidean.
struct RepresentativeIndex {
    side: i32,
    cells: HashMap<(i32, i32, i32), Vec<usize>>,
    comparisons: usize,
}

impl RepresentativeIndex {
    fn new(tolerance: u32) -> Self {
        Self {
            side: tolerance.clamp(1, 256) as i32,
            cells: HashMap::new(),
            comparisons: 0,
        }
    }

    fn cell(&self, c: Rgb) -> (i32, i32, i32) {
        (
            i32::from(c.r) / self.side,
            i32::from(c.g) / self.side,
            i32::from(c.b) / self.side,
        )
    }

    fn insert(&mut self, color: Rgb, group: usize) {
        let key = self.cell(color);
        self.cells.entry(key).or_default().push(group);
    }

    /// Lowest-numbered group whose representative is within tolerance
    fn earliest_within(
        &mut self,
        color: Rgb,
        groups: &[Group],
        tolerance: u32,
        distance: ColorDistance,
    ) -> Option<usize> {
        let (cr, cg, cb) = self.cell(color);
        let mut best: Option<usize> = None;
        for dr in -1..=1 {
            for dg in -1..=1 {
                for db in -1..=1 {
                    let Some(members) = self.cells.get(&(cr + dr, cg + dg, cb + db)) else {
                        continue;
                    };
                    for &g in members {
                        self.comparisons += 1;
                        if best.map_or(true, |b| g < b)
                            && distance.within(color, groups[g].sample.color, tolerance)
                        {
                            best = Some(g);
                        }
                    }
                }
            }
        }
        best
    }
}
