//! Per-draw model transforms.
//!
//! Every draw of the opaque and sprite programs reads its model matrix from
//! a 64 byte slice of the frame's instance buffer (vertex slot 1), so the
//! same pipeline serves the ground quads, each wheat cell, each model and
//! each tree.

use cgmath::{Deg, Matrix4, One, Quaternion, Rotation3, Vector3};

use crate::data_structures::model;

/// Translation, rotation and scale, composed as `T * R * S`.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Instance {
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Translate, turn about +Y, then scale uniformly.
    pub fn placed(position: Vector3<f32>, yaw: Deg<f32>, scale: f32) -> Self {
        Self {
            position,
            rotation: Quaternion::from_angle_y(yaw),
            scale: Vector3::new(scale, scale, scale),
        }
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        self.to_matrix().into()
    }
}

impl From<Vector3<f32>> for Instance {
    fn from(position: Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/**
 * The model matrix as it is stored in the instance buffer.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
}

impl InstanceRaw {
    pub const SIZE: wgpu::BufferAddress = std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress;
}

impl From<Matrix4<f32>> for InstanceRaw {
    fn from(matrix: Matrix4<f32>) -> Self {
        Self {
            model: matrix.into(),
        }
    }
}

/**
 * A mat4 occupies four vertex slots (5 to 8), one per column. The step mode
 * is Instance so each draw reads exactly one matrix.
 */
impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
            5 => Float32x4,
            6 => Float32x4,
            7 => Float32x4,
            8 => Float32x4
        ];
        wgpu::VertexBufferLayout {
            array_stride: InstanceRaw::SIZE,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector4};

    #[test]
    fn translation_is_applied_last() {
        let instance = Instance::placed(Vector3::new(5.0, 0.0, 15.0), Deg(270.0), 0.5);
        let origin = instance.to_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((origin.truncate() - Vector3::new(5.0, 0.0, 15.0)).magnitude() < 1e-5);

        // +X scaled by 0.5 then turned 270 degrees about Y lands on +Z.
        let x = instance.to_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!((x.truncate() - Vector3::new(5.0, 0.0, 15.5)).magnitude() < 1e-5);
    }

    #[test]
    fn raw_matrix_is_column_major() {
        let raw = Instance::from(Vector3::new(1.0, 2.0, 3.0)).to_raw();
        assert_eq!(raw.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 64);
    }
}
