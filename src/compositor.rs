//! Front-to-back ray marching through a volume.
//!
//! Rays are expressed in the local space of the volume, where the volume
//! occupies the unit cube `[0, 1]^3`. Each ray is marched in fixed steps;
//! inside the slice window, densities are normalized, mapped through the
//! transfer function table and accumulated front to back until the ray
//! leaves the volume, becomes opaque or exhausts its step budget.
use crate::error::Result;
use crate::transfer::TransferFunctionTable;
use crate::volume::{FrameView, VolumeDataset};
use nalgebra::{Matrix4, Point3, Vector3};
use rayon::prelude::*;
use rgb::RGB;

/// Voxel interpolation used when sampling densities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Value of the voxel containing the position.
    Nearest,
    /// Trilinear blend of the 8 nearest voxel centres.
    Trilinear,
}

impl Default for Interpolation {
    fn default() -> Self {
        Interpolation::Trilinear
    }
}

/// Parameters of the ray marcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositorOptions {
    /// Distance between two samples, in unit cube units.
    pub step_size: f32,
    /// Maximum distance marched along a ray.
    pub ray_length: f32,
    /// Marching stops once the remaining transparency falls below this.
    pub termination_threshold: f32,
    /// How densities are sampled.
    pub interpolation: Interpolation,
}

impl Default for CompositorOptions {
    fn default() -> Self {
        CompositorOptions {
            step_size: 0.005,
            ray_length: 1.8,
            termination_threshold: 0.001,
            interpolation: Interpolation::default(),
        }
    }
}

impl CompositorOptions {
    /// Set the step size.
    pub fn with_step_size(mut self, step_size: f32) -> Self {
        self.step_size = step_size;
        self
    }

    /// Set the maximum ray length.
    pub fn with_ray_length(mut self, ray_length: f32) -> Self {
        self.ray_length = ray_length;
        self
    }

    /// Set the early termination threshold.
    pub fn with_termination_threshold(mut self, threshold: f32) -> Self {
        self.termination_threshold = threshold;
        self
    }

    /// Set the interpolation mode.
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Number of steps marched along a ray.
    pub fn step_count(&self) -> usize {
        if self.step_size > 0. {
            (self.ray_length / self.step_size) as usize
        } else {
            0
        }
    }
}

/// A source of scalar densities over the unit cube.
pub trait DensitySource {
    /// Density at a position of the unit cube.
    fn density(&self, position: &Point3<f32>) -> f32;
}

/// Samples one frame of a volume.
#[derive(Debug, Clone, Copy)]
pub struct FrameSampler<'a> {
    frame: FrameView<'a>,
    dimensions: [usize; 3],
    interpolation: Interpolation,
}

impl<'a> FrameSampler<'a> {
    /// Sample `frame`, of the given `(x, y, z)` dimensions.
    pub fn new(frame: FrameView<'a>, dimensions: [usize; 3], interpolation: Interpolation) -> Self {
        FrameSampler {
            frame,
            dimensions,
            interpolation,
        }
    }

    /// Sample frame `index` of a dataset.
    pub fn from_dataset(
        dataset: &'a VolumeDataset,
        index: usize,
        interpolation: Interpolation,
    ) -> Result<Self> {
        Ok(Self::new(dataset.frame(index)?, dataset.dimensions(), interpolation))
    }

    #[inline]
    fn value(&self, x: usize, y: usize, z: usize) -> f32 {
        let [dx, dy, _] = self.dimensions;
        self.frame.get_f32((z * dy + y) * dx + x).unwrap_or(0.)
    }

    fn nearest(&self, p: &Point3<f32>) -> f32 {
        let mut idx = [0; 3];
        for axis in 0..3 {
            let n = self.dimensions[axis];
            let i = (p[axis] * n as f32).floor();
            idx[axis] = if i <= 0. { 0 } else { (i as usize).min(n.saturating_sub(1)) };
        }
        self.value(idx[0], idx[1], idx[2])
    }

    fn trilinear(&self, p: &Point3<f32>) -> f32 {
        let mut lo = [0; 3];
        let mut hi = [0; 3];
        let mut frac = [0.; 3];
        for axis in 0..3 {
            let n = self.dimensions[axis];
            let last = n.saturating_sub(1);
            let x = (p[axis] * n as f32 - 0.5).max(0.).min(last as f32);
            let i = x.floor();
            lo[axis] = i as usize;
            hi[axis] = (lo[axis] + 1).min(last);
            frac[axis] = x - i;
        }
        let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
        let c = |x: usize, y: usize, z: usize| self.value(x, y, z);
        let c00 = lerp(c(lo[0], lo[1], lo[2]), c(hi[0], lo[1], lo[2]), frac[0]);
        let c10 = lerp(c(lo[0], hi[1], lo[2]), c(hi[0], hi[1], lo[2]), frac[0]);
        let c01 = lerp(c(lo[0], lo[1], hi[2]), c(hi[0], lo[1], hi[2]), frac[0]);
        let c11 = lerp(c(lo[0], hi[1], hi[2]), c(hi[0], hi[1], hi[2]), frac[0]);
        let c0 = lerp(c00, c10, frac[1]);
        let c1 = lerp(c01, c11, frac[1]);
        lerp(c0, c1, frac[2])
    }
}

impl<'a> DensitySource for FrameSampler<'a> {
    fn density(&self, position: &Point3<f32>) -> f32 {
        if position.iter().any(|c| c.is_nan()) {
            return 0.;
        }
        match self.interpolation {
            Interpolation::Nearest => self.nearest(position),
            Interpolation::Trilinear => self.trilinear(position),
        }
    }
}

/// Linear mapping of densities to the `[0, 1]` transfer function domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityRange {
    /// Density mapped to 0.
    pub min: f32,
    /// Density mapped to 1.
    pub max: f32,
}

impl DensityRange {
    /// Create a range.
    pub fn new(min: f32, max: f32) -> Self {
        DensityRange { min, max }
    }

    /// The normalization range of a dataset, see
    /// [`VolumeDataset::density_range`].
    pub fn of(dataset: &VolumeDataset) -> Self {
        let (min, max) = dataset.density_range();
        DensityRange::new(min as f32, max as f32)
    }

    /// Map a density to `t`. A degenerate range maps everything to 1.
    #[inline]
    pub fn normalize(&self, density: f32) -> f32 {
        let span = self.max - self.min;
        if span > 0. {
            (density - self.min) / span
        } else {
            1.
        }
    }
}

/// An axis aligned region of interest of the unit cube. Both bounds are
/// inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceWindow {
    /// Lower corner.
    pub min: Point3<f32>,
    /// Upper corner.
    pub max: Point3<f32>,
}

impl Default for SliceWindow {
    fn default() -> Self {
        SliceWindow {
            min: Point3::origin(),
            max: Point3::new(1., 1., 1.),
        }
    }
}

impl SliceWindow {
    /// Create a window from its corners.
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        SliceWindow { min, max }
    }

    /// Whether `p` lies inside the window, bounds included.
    #[inline]
    pub fn contains(&self, p: &Point3<f32>) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }
}

#[inline]
fn in_unit_cube(p: &Point3<f32>) -> bool {
    p.iter().all(|c| (0. ..=1.).contains(c))
}

/// A ray in the local unit cube space of a volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start of the ray.
    pub origin: Point3<f32>,
    /// Unit direction.
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Create a ray; `direction` is normalized.
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Ray {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Bring a world space ray into the unit cube space of a volume whose
    /// model matrix inverse is `inverse_model`.
    ///
    /// The model matrix places the cube centred on the origin, so the
    /// result is shifted by half a unit on each axis.
    pub fn from_world(
        origin: &Point3<f32>,
        direction: &Vector3<f32>,
        inverse_model: &Matrix4<f32>,
    ) -> Self {
        let local_origin = inverse_model.transform_point(origin) + Vector3::repeat(0.5);
        let local_direction = inverse_model.transform_vector(direction);
        Ray::new(local_origin, local_direction)
    }

    /// Distances along the ray where it enters and leaves the unit cube,
    /// or `None` if it misses the cube or the cube is behind the origin.
    pub fn unit_cube_interval(&self) -> Option<(f32, f32)> {
        let mut near = f32::NEG_INFINITY;
        let mut far = f32::INFINITY;
        for axis in 0..3 {
            let o = self.origin[axis];
            let d = self.direction[axis];
            if d == 0. {
                if !(0. ..=1.).contains(&o) {
                    return None;
                }
                continue;
            }
            let t0 = (0. - o) / d;
            let t1 = (1. - o) / d;
            near = near.max(t0.min(t1));
            far = far.min(t0.max(t1));
        }
        if near > far || far < 0. || near.is_nan() || far.is_nan() {
            None
        } else {
            Some((near.max(0.), far))
        }
    }

    /// The first point of the ray inside the unit cube.
    pub fn entry_point(&self) -> Option<Point3<f32>> {
        let (near, _) = self.unit_cube_interval()?;
        Some(self.origin + self.direction * near)
    }
}

/// Why marching along a ray stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The ray does not hit the volume.
    Missed,
    /// The ray left the volume.
    ExitedVolume,
    /// The accumulated opacity reached the termination threshold.
    Opaque,
    /// The step budget ran out.
    StepBudget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RayState {
    Entering,
    Marching,
}

/// Composited color and opacity of a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaySample {
    /// Accumulated, opacity weighted color.
    pub color: RGB<f32>,
    /// Final opacity, `1 - remaining transparency`.
    pub alpha: f32,
    /// Number of density samples taken.
    pub samples: usize,
    /// Why marching stopped.
    pub termination: Termination,
}

impl RaySample {
    fn missed() -> Self {
        RaySample {
            color: RGB::new(0., 0., 0.),
            alpha: 0.,
            samples: 0,
            termination: Termination::Missed,
        }
    }
}

/// Everything read by the compositor besides the ray itself.
#[derive(Debug)]
pub struct Scene<'a, S: ?Sized> {
    /// Density source.
    pub volume: &'a S,
    /// Transfer function lookup table.
    pub table: &'a TransferFunctionTable,
    /// Density normalization.
    pub range: DensityRange,
    /// Region of interest.
    pub window: SliceWindow,
}

impl<'a, S: ?Sized> Clone for Scene<'a, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, S: ?Sized> Copy for Scene<'a, S> {}

/// The ray marcher.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Compositor {
    options: CompositorOptions,
}

impl Compositor {
    /// Create a compositor.
    pub fn new(options: CompositorOptions) -> Self {
        Compositor { options }
    }

    /// The marching parameters.
    pub fn options(&self) -> &CompositorOptions {
        &self.options
    }

    /// Composite a single ray, front to back.
    pub fn composite<S>(&self, ray: &Ray, scene: &Scene<'_, S>) -> RaySample
    where
        S: DensitySource + ?Sized,
    {
        let mut pos = match ray.entry_point() {
            Some(p) => p,
            None => return RaySample::missed(),
        };
        let step = ray.direction * self.options.step_size;
        let mut color = Vector3::<f32>::zeros();
        let mut remaining = 1.0f32;
        let mut samples = 0;
        let mut state = RayState::Entering;
        let mut termination = Termination::StepBudget;

        for _ in 0..self.options.step_count() {
            let inside = in_unit_cube(&pos);
            match state {
                RayState::Entering if inside => state = RayState::Marching,
                RayState::Marching if !inside => {
                    termination = Termination::ExitedVolume;
                    break;
                }
                _ => {}
            }
            if state == RayState::Marching && scene.window.contains(&pos) {
                let density = scene.volume.density(&pos);
                samples += 1;
                let t = scene.range.normalize(density);
                let s = scene.table.lookup(t);
                color += Vector3::new(s.r, s.g, s.b) * (remaining * s.a);
                remaining *= 1. - s.a;
                if remaining < self.options.termination_threshold {
                    termination = Termination::Opaque;
                    break;
                }
            }
            pos += step;
        }

        RaySample {
            color: RGB::new(color.x, color.y, color.z),
            alpha: 1. - remaining,
            samples,
            termination,
        }
    }

    /// Composite many independent rays in parallel.
    pub fn composite_rays<S>(&self, rays: &[Ray], scene: &Scene<'_, S>) -> Vec<RaySample>
    where
        S: DensitySource + Sync + ?Sized,
    {
        rays.par_iter().map(|ray| self.composite(ray, scene)).collect()
    }
}
