//! Coordinate transforms between voxel indices, physical (RAS) space and
//! the normalized display space of a volume.
//!
//! Two independent transforms are kept:
//!
//! - [`SpatialTransform`] is fixed at load time and maps voxel indices
//!   (IJK) to physical right-anterior-superior coordinates.
//! - [`VolumeTransform`] is the user-editable model transform (rotation and
//!   scale) placing the unit cube of the volume in the rendered scene.
use crate::error::{Result, VolumeError};
use crate::header::NrrdHeader;
use nalgebra::{Matrix3, Matrix4, Point3, Scalar, UnitQuaternion, Vector3};

/// 3x3 affine matrix type.
pub type Affine3 = Matrix3<f32>;
/// 4x4 homogeneous affine matrix type.
pub type Affine4 = Matrix4<f32>;

/// Separate a 4x4 affine into its 3x3 linear and translation components.
pub fn get_affine_and_translation<T: Scalar>(affine: &Matrix4<T>) -> (Matrix3<T>, Vector3<T>) {
    let translation = Vector3::new(
        affine[(0, 3)].clone(),
        affine[(1, 3)].clone(),
        affine[(2, 3)].clone(),
    );
    let linear = affine.fixed_view::<3, 3>(0, 0).into_owned();
    (linear, translation)
}

/// Build a homogeneous affine from a 3x3 linear part and a translation.
pub fn affine_from_parts(linear: &Affine3, translation: &Vector3<f32>) -> Affine4 {
    let mut out = linear.to_homogeneous();
    out.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
    out
}

/// The voxel to physical mapping of a dataset, with its inverse.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialTransform {
    voxel_to_physical: Affine4,
    physical_to_voxel: Affine4,
}

impl SpatialTransform {
    /// Wrap a voxel to physical matrix, computing its inverse.
    ///
    /// # Errors
    ///
    /// - `NonInvertibleTransform` if the matrix is singular.
    pub fn new(voxel_to_physical: Affine4) -> Result<Self> {
        let physical_to_voxel = voxel_to_physical
            .try_inverse()
            .ok_or(VolumeError::NonInvertibleTransform)?;
        Ok(SpatialTransform {
            voxel_to_physical,
            physical_to_voxel,
        })
    }

    /// The identity mapping.
    pub fn identity() -> Self {
        SpatialTransform {
            voxel_to_physical: Affine4::identity(),
            physical_to_voxel: Affine4::identity(),
        }
    }

    /// An axis aligned mapping with the given voxel spacing.
    pub fn from_spacing(spacing: Vector3<f32>) -> Result<Self> {
        Self::new(Affine4::new_nonuniform_scaling(&spacing))
    }

    /// Build the IJK to RAS mapping described by an NRRD header.
    ///
    /// The first three space directions become the matrix columns and the
    /// space origin its translation. Positions declared in LPS or LAS space
    /// are converted to RAS. Axes missing from a low-dimensional header get
    /// a unit direction.
    pub fn from_nrrd_header(header: &NrrdHeader) -> Result<Self> {
        let mut linear = Affine3::identity();
        for (axis, direction) in header.space_directions.iter().take(3).enumerate() {
            linear.set_column(axis, direction);
        }
        let mut origin = header.space_origin.unwrap_or_else(Vector3::zeros);
        if let Some(space) = header.space {
            let signs = space.ras_signs();
            for (row, sign) in signs.iter().enumerate() {
                if *sign < 0. {
                    linear.row_mut(row).neg_mut();
                    origin[row] = -origin[row];
                }
            }
        }
        Self::new(affine_from_parts(&linear, &origin))
    }

    /// The voxel (IJK) to physical (RAS) matrix.
    pub fn voxel_to_physical(&self) -> &Affine4 {
        &self.voxel_to_physical
    }

    /// The physical (RAS) to voxel (IJK) matrix.
    pub fn physical_to_voxel(&self) -> &Affine4 {
        &self.physical_to_voxel
    }

    /// Map a voxel index position to physical space.
    pub fn to_physical(&self, ijk: &Point3<f32>) -> Point3<f32> {
        self.voxel_to_physical.transform_point(ijk)
    }

    /// Map a physical position to (fractional) voxel indices.
    pub fn to_voxel(&self, ras: &Point3<f32>) -> Point3<f32> {
        self.physical_to_voxel.transform_point(ras)
    }

    /// Physical length of a single voxel step along each axis.
    pub fn spacing(&self) -> Vector3<f32> {
        let (linear, _) = get_affine_and_translation(&self.voxel_to_physical);
        Vector3::new(
            linear.column(0).norm(),
            linear.column(1).norm(),
            linear.column(2).norm(),
        )
    }
}

impl Default for SpatialTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Compute the display scale of a volume: the physical extent along each
/// axis, normalized so that the longest axis maps to 1.
///
/// Axes with zero spacing are taken as unit spaced.
pub fn display_scale(dimensions: [usize; 3], spacing: &Vector3<f32>) -> Vector3<f32> {
    let mut extent = Vector3::zeros();
    for axis in 0..3 {
        let s = if spacing[axis] > 0. { spacing[axis] } else { 1. };
        extent[axis] = dimensions[axis] as f32 * s;
    }
    let longest = extent.max();
    if longest > 0. {
        extent / longest
    } else {
        Vector3::repeat(1.)
    }
}

/// The user-editable model transform of a displayed volume.
///
/// The unit cube of the volume is scaled by the display scale and the user
/// scale, then rotated. The inverse is computed analytically, so it always
/// exists while every scale component is non-zero.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeTransform {
    rotation: UnitQuaternion<f32>,
    user_scale: Vector3<f32>,
    display_scale: Vector3<f32>,
}

impl VolumeTransform {
    /// Create a transform without rotation, for the given display scale.
    pub fn new(display_scale: Vector3<f32>) -> Self {
        VolumeTransform {
            rotation: UnitQuaternion::identity(),
            user_scale: Vector3::repeat(1.),
            display_scale,
        }
    }

    /// Current rotation.
    pub fn rotation(&self) -> &UnitQuaternion<f32> {
        &self.rotation
    }

    /// Replace the rotation.
    pub fn set_rotation(&mut self, rotation: UnitQuaternion<f32>) {
        self.rotation = rotation;
    }

    /// Replace the rotation with one given as Euler angles, in radians.
    pub fn set_euler_angles(&mut self, roll: f32, pitch: f32, yaw: f32) {
        self.rotation = UnitQuaternion::from_euler_angles(roll, pitch, yaw);
    }

    /// Apply an additional rotation on top of the current one.
    pub fn rotate_by(&mut self, rotation: &UnitQuaternion<f32>) {
        self.rotation = rotation * self.rotation;
    }

    /// User scale factors, applied on top of the display scale.
    pub fn user_scale(&self) -> &Vector3<f32> {
        &self.user_scale
    }

    /// Replace the user scale.
    ///
    /// # Errors
    ///
    /// - `NonInvertibleTransform` if any component is zero or not finite.
    pub fn set_user_scale(&mut self, scale: Vector3<f32>) -> Result<()> {
        if scale.iter().any(|s| *s == 0. || !s.is_finite()) {
            return Err(VolumeError::NonInvertibleTransform);
        }
        self.user_scale = scale;
        Ok(())
    }

    /// Scale derived from the dataset extent.
    pub fn display_scale(&self) -> &Vector3<f32> {
        &self.display_scale
    }

    /// Effective scale: display scale times user scale.
    pub fn scale(&self) -> Vector3<f32> {
        self.display_scale.component_mul(&self.user_scale)
    }

    /// Model matrix: rotation after scale.
    pub fn model_matrix(&self) -> Affine4 {
        self.rotation.to_homogeneous() * Affine4::new_nonuniform_scaling(&self.scale())
    }

    /// Inverse of [`model_matrix`](#method.model_matrix).
    pub fn inverse_model_matrix(&self) -> Affine4 {
        let inv_scale = self.scale().map(|s| if s != 0. { 1. / s } else { 0. });
        Affine4::new_nonuniform_scaling(&inv_scale) * self.rotation.inverse().to_homogeneous()
    }
}

impl Default for VolumeTransform {
    fn default() -> Self {
        Self::new(Vector3::repeat(1.))
    }
}
