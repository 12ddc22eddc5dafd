//! The state of a volume viewer: the displayed dataset and everything the
//! user edits around it.
//!
//! A [`ViewerSession`] replaces any ambient global state. It owns the
//! current dataset, the frame being displayed, the model transform, the
//! slice window and the transfer function gradients, and is only updated
//! through its methods.
//!
//! Loads may complete out of order. Each load is tagged with a
//! [`LoadTicket`] obtained from [`ViewerSession::begin_load`]; only the
//! result of the most recently started load is ever applied.
use crate::affine::VolumeTransform;
use crate::compositor::{
    Compositor, CompositorOptions, DensityRange, FrameSampler, Ray, RaySample, Scene, SliceWindow,
};
use crate::dicom::{self, DicomOptions};
use crate::error::Result;
use crate::object::parse_nrrd;
use crate::progress::ProgressSink;
use crate::transfer::{Gradient, TransferFunctionTable};
use crate::volume::VolumeDataset;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use tracing::debug;

/// Identifies one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

/// What became of a finished load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The dataset is now displayed.
    Applied,
    /// A newer load was started in the meantime; the result was dropped.
    Superseded,
}

/// A viewer's state.
#[derive(Debug, Clone)]
pub struct ViewerSession {
    dataset: Option<VolumeDataset>,
    frame: usize,
    transform: VolumeTransform,
    window: SliceWindow,
    color: Gradient,
    opacity: Gradient,
    table: TransferFunctionTable,
    compositor: Compositor,
    generation: u64,
}

impl Default for ViewerSession {
    fn default() -> Self {
        Self::new(CompositorOptions::default())
    }
}

impl ViewerSession {
    /// Create an empty session.
    pub fn new(options: CompositorOptions) -> Self {
        let color = Gradient::default();
        let opacity = Gradient::default();
        let table = TransferFunctionTable::resample(&color, &opacity);
        ViewerSession {
            dataset: None,
            frame: 0,
            transform: VolumeTransform::default(),
            window: SliceWindow::default(),
            color,
            opacity,
            table,
            compositor: Compositor::new(options),
            generation: 0,
        }
    }

    /// Start a load, superseding every load started before.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket(self.generation)
    }

    /// Whether `ticket` belongs to the most recently started load.
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Deliver the result of a load.
    ///
    /// Results of superseded loads are discarded, whether they succeeded or
    /// not. A failed current load returns its error and leaves the
    /// displayed dataset untouched. A successful one replaces the dataset,
    /// rewinds to the first frame and resets the transform to the display
    /// scale of the new dataset.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<VolumeDataset>,
    ) -> Result<LoadOutcome> {
        if !self.is_current(ticket) {
            debug!(
                ticket = ticket.0,
                current = self.generation,
                "discarding stale load result"
            );
            return Ok(LoadOutcome::Superseded);
        }
        let dataset = result?;
        self.transform = VolumeTransform::new(dataset.scale());
        self.frame = 0;
        self.dataset = Some(dataset);
        Ok(LoadOutcome::Applied)
    }

    /// Parse and display an NRRD file.
    pub fn load_nrrd(&mut self, bytes: &[u8]) -> Result<LoadOutcome> {
        let ticket = self.begin_load();
        self.finish_load(ticket, parse_nrrd(bytes))
    }

    /// Assemble and display a DICOM series.
    pub fn load_dicom<B, P>(
        &mut self,
        files: &[B],
        options: &DicomOptions,
        progress: &P,
    ) -> Result<LoadOutcome>
    where
        B: AsRef<[u8]> + Sync,
        P: ProgressSink + ?Sized,
    {
        let ticket = self.begin_load();
        self.finish_load(ticket, dicom::assemble_with(files, options, progress))
    }

    /// The displayed dataset, if any.
    pub fn dataset(&self) -> Option<&VolumeDataset> {
        self.dataset.as_ref()
    }

    /// Index of the displayed frame.
    pub fn frame(&self) -> usize {
        self.frame
    }

    fn frame_count(&self) -> usize {
        self.dataset.as_ref().map_or(0, VolumeDataset::frame_count)
    }

    /// Display frame `index`. Returns `false`, changing nothing, if there is
    /// no such frame.
    pub fn set_frame(&mut self, index: usize) -> bool {
        if index < self.frame_count() {
            self.frame = index;
            true
        } else {
            false
        }
    }

    /// Advance to the next frame, wrapping around after the last one.
    pub fn next_frame(&mut self) -> usize {
        let count = self.frame_count();
        if count > 0 {
            self.frame = (self.frame + 1) % count;
        }
        self.frame
    }

    /// Go back to the previous frame, wrapping around before the first one.
    pub fn previous_frame(&mut self) -> usize {
        let count = self.frame_count();
        if count > 0 {
            self.frame = (self.frame + count - 1) % count;
        }
        self.frame
    }

    /// The model transform.
    pub fn transform(&self) -> &VolumeTransform {
        &self.transform
    }

    /// Replace the rotation of the volume.
    pub fn set_rotation(&mut self, rotation: UnitQuaternion<f32>) {
        self.transform.set_rotation(rotation);
    }

    /// Replace the user scale of the volume.
    pub fn set_scale(&mut self, scale: Vector3<f32>) -> Result<()> {
        self.transform.set_user_scale(scale)
    }

    /// The region of interest.
    pub fn slice_window(&self) -> &SliceWindow {
        &self.window
    }

    /// Replace the region of interest.
    pub fn set_slice_window(&mut self, window: SliceWindow) {
        self.window = window;
    }

    /// The color gradient.
    pub fn color_gradient(&self) -> &Gradient {
        &self.color
    }

    /// The opacity gradient.
    pub fn opacity_gradient(&self) -> &Gradient {
        &self.opacity
    }

    /// Edit the color gradient; the lookup table is regenerated afterwards.
    pub fn edit_color_gradient<R>(&mut self, edit: impl FnOnce(&mut Gradient) -> R) -> R {
        let out = edit(&mut self.color);
        self.table = TransferFunctionTable::resample(&self.color, &self.opacity);
        out
    }

    /// Edit the opacity gradient; the lookup table is regenerated afterwards.
    pub fn edit_opacity_gradient<R>(&mut self, edit: impl FnOnce(&mut Gradient) -> R) -> R {
        let out = edit(&mut self.opacity);
        self.table = TransferFunctionTable::resample(&self.color, &self.opacity);
        out
    }

    /// The lookup table derived from both gradients.
    pub fn transfer_table(&self) -> &TransferFunctionTable {
        &self.table
    }

    /// The ray marcher.
    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Composite a world space ray through the displayed frame.
    ///
    /// Returns `None` when no dataset is loaded.
    pub fn composite_world_ray(
        &self,
        origin: &Point3<f32>,
        direction: &Vector3<f32>,
    ) -> Option<RaySample> {
        let rays = [Ray::from_world(origin, direction, &self.transform.inverse_model_matrix())];
        self.composite(&rays).map(|mut out| out.remove(0))
    }

    /// Composite many world space rays, given as `(origin, direction)`
    /// pairs, through the displayed frame in parallel.
    ///
    /// Returns `None` when no dataset is loaded.
    pub fn composite_world_rays(
        &self,
        rays: &[(Point3<f32>, Vector3<f32>)],
    ) -> Option<Vec<RaySample>> {
        let inverse = self.transform.inverse_model_matrix();
        let rays: Vec<Ray> = rays
            .iter()
            .map(|(o, d)| Ray::from_world(o, d, &inverse))
            .collect();
        self.composite(&rays)
    }

    fn composite(&self, rays: &[Ray]) -> Option<Vec<RaySample>> {
        let dataset = self.dataset.as_ref()?;
        let sampler =
            FrameSampler::from_dataset(dataset, self.frame, self.compositor.options().interpolation)
                .ok()?;
        let scene = Scene {
            volume: &sampler,
            table: &self.table,
            range: DensityRange::of(dataset),
            window: self.window,
        };
        Some(self.compositor.composite_rays(rays, &scene))
    }
}
