//! Transfer functions: editable color and opacity gradients, and the
//! fixed-size lookup table derived from them.
//!
//! A [`Gradient`] is a sorted list of [`GradientMarker`]s over the percent
//! domain `[0, 100]`, always holding fixed markers at both ends. Two
//! gradients (one for color, one for opacity encoded as a gray level) are
//! resampled into a [`TransferFunctionTable`] of 256 RGBA entries.
use crate::color::opacity_to_gray;
use crate::util::channel_to_u8;
use rgb::{ComponentBytes, RGB8, RGBA, RGBA8};

/// Number of entries of a [`TransferFunctionTable`].
pub const TABLE_SIZE: usize = 256;

/// A color stop of a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientMarker {
    /// Position in `[0, 100]`.
    pub percent: f32,
    /// Color at this position.
    pub color: RGB8,
    /// Fixed markers cannot be moved or removed.
    pub fixed: bool,
}

/// Sample a sorted list of markers at `percent`.
///
/// The interpolation fraction between the two markers bounding `percent` is
/// `(percent - p1) / 100`, measured on the whole percent scale rather than on
/// the interval between the markers. Both agree only when the markers are
/// exactly 100 apart; gradients with intermediate markers rely on this.
///
/// Positions before the first marker take its color, positions at or past
/// the last marker take the last color. An empty list samples black.
pub fn sample_gradient(markers: &[GradientMarker], percent: f32) -> RGB8 {
    let i = markers
        .iter()
        .position(|m| m.percent > percent)
        .unwrap_or_else(|| markers.len());
    if i == 0 {
        return markers.first().map(|m| m.color).unwrap_or_default();
    }
    let lower = markers[i - 1];
    let upper = match markers.get(i) {
        Some(m) => *m,
        None => return lower.color,
    };
    let t = (percent - lower.percent) / 100.;
    let lerp = |a: u8, b: u8| {
        let a = f32::from(a);
        channel_to_u8(a + (f32::from(b) - a) * t)
    };
    RGB8::new(
        lerp(lower.color.r, upper.color.r),
        lerp(lower.color.g, upper.color.g),
        lerp(lower.color.b, upper.color.b),
    )
}

/// An editable piecewise linear gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    markers: Vec<GradientMarker>,
}

impl Default for Gradient {
    /// Black at 0, white at 100.
    fn default() -> Self {
        Gradient::with_endpoints(RGB8::new(0, 0, 0), RGB8::new(255, 255, 255))
    }
}

impl Gradient {
    /// The default black to white gradient.
    pub fn new() -> Self {
        Self::default()
    }

    /// A gradient with fixed markers of the given colors at 0 and 100.
    pub fn with_endpoints(start: RGB8, end: RGB8) -> Self {
        Gradient {
            markers: vec![
                GradientMarker {
                    percent: 0.,
                    color: start,
                    fixed: true,
                },
                GradientMarker {
                    percent: 100.,
                    color: end,
                    fixed: true,
                },
            ],
        }
    }

    /// An opacity gradient with constant opacity, in percent.
    pub fn constant_opacity(percent: f32) -> Self {
        let gray = opacity_to_gray(percent);
        Self::with_endpoints(gray, gray)
    }

    /// The markers, sorted by percent.
    pub fn markers(&self) -> &[GradientMarker] {
        &self.markers
    }

    /// Sample the gradient, see [`sample_gradient`].
    pub fn sample(&self, percent: f32) -> RGB8 {
        sample_gradient(&self.markers, percent)
    }

    fn insert(&mut self, marker: GradientMarker) -> usize {
        let index = self
            .markers
            .iter()
            .position(|m| m.percent > marker.percent)
            .unwrap_or_else(|| self.markers.len());
        self.markers.insert(index, marker);
        index
    }

    /// Add a movable marker and return its index.
    ///
    /// `percent` is clamped to `[0, 100]`. Without an explicit color, the
    /// marker takes the current color of the gradient at its position, so
    /// adding it does not change the gradient at that point.
    pub fn add_marker(&mut self, percent: f32, color: Option<RGB8>) -> usize {
        let percent = percent.max(0.).min(100.);
        let color = color.unwrap_or_else(|| self.sample(percent));
        self.insert(GradientMarker {
            percent,
            color,
            fixed: false,
        })
    }

    /// Move a movable marker, returning its new index.
    ///
    /// Returns `None`, leaving the gradient unchanged, if `index` is out of
    /// range or designates a fixed marker.
    pub fn move_marker(&mut self, index: usize, percent: f32) -> Option<usize> {
        if self.markers.get(index)?.fixed {
            return None;
        }
        let mut marker = self.markers.remove(index);
        marker.percent = percent.max(0.).min(100.);
        Some(self.insert(marker))
    }

    /// Change the color of any marker. Returns `false` if out of range.
    pub fn set_marker_color(&mut self, index: usize, color: RGB8) -> bool {
        match self.markers.get_mut(index) {
            Some(m) => {
                m.color = color;
                true
            }
            None => false,
        }
    }

    /// Remove a movable marker.
    ///
    /// Returns `None` if `index` is out of range or designates a fixed marker.
    pub fn remove_marker(&mut self, index: usize) -> Option<GradientMarker> {
        if self.markers.get(index)?.fixed {
            return None;
        }
        Some(self.markers.remove(index))
    }
}

/// The 256-entry RGBA lookup table used during compositing.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFunctionTable {
    entries: Vec<RGBA8>,
}

impl Default for TransferFunctionTable {
    fn default() -> Self {
        Self::resample(&Gradient::default(), &Gradient::default())
    }
}

impl TransferFunctionTable {
    /// Resample a color and an opacity gradient.
    ///
    /// Entry `i` samples both gradients at `i * 100 / 256` percent; its
    /// alpha is the red channel of the opacity sample.
    pub fn resample(color: &Gradient, opacity: &Gradient) -> Self {
        let entries = (0..TABLE_SIZE)
            .map(|i| {
                let percent = i as f32 * (100. / TABLE_SIZE as f32);
                let c = color.sample(percent);
                let a = opacity.sample(percent);
                RGBA8::new(c.r, c.g, c.b, a.r)
            })
            .collect();
        TransferFunctionTable { entries }
    }

    /// The table entries.
    pub fn entries(&self) -> &[RGBA8] {
        &self.entries
    }

    /// Entries as row-major `R, G, B, A` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.entries[..].as_bytes()
    }

    /// Look up a normalized density `t` with linear filtering between
    /// entries, returning channels in `[0, 1]`.
    ///
    /// Entry `i` is centred at `t = (i + 0.5) / 256`; `t` is clamped to the
    /// centres of the first and last entries.
    pub fn lookup(&self, t: f32) -> RGBA<f32> {
        let last = (TABLE_SIZE - 1) as f32;
        let x = if t.is_nan() {
            0.
        } else {
            (t * TABLE_SIZE as f32 - 0.5).max(0.).min(last)
        };
        let i0 = x.floor() as usize;
        let i1 = (i0 + 1).min(TABLE_SIZE - 1);
        let f = x - i0 as f32;
        let (a, b) = (self.entries[i0], self.entries[i1]);
        let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * f) / 255.;
        RGBA::new(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b), mix(a.a, b.a))
    }

    /// Look up the entry nearest to `t`, returning channels in `[0, 1]`.
    pub fn lookup_nearest(&self, t: f32) -> RGBA<f32> {
        let i = if t.is_nan() {
            0
        } else {
            ((t * TABLE_SIZE as f32).floor().max(0.) as usize).min(TABLE_SIZE - 1)
        };
        let e = self.entries[i];
        RGBA::new(
            f32::from(e.r) / 255.,
            f32::from(e.g) / 255.,
            f32::from(e.b) / 255.,
            f32::from(e.a) / 255.,
        )
    }
}
