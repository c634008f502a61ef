//! Vertex and instance layouts for the 3D pipeline

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4};

/// Mesh vertex: position plus face normal
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Per-entity draw data: model matrix, normal matrix (columns padded to
/// vec4 for WGSL alignment), material color and emissive glow.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Instance {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    pub color: [f32; 4],
    pub emissive: [f32; 4],
}

impl Instance {
    pub fn new(model: Mat4, color: [f32; 3], emissive: [f32; 3]) -> Self {
        let n = normal_matrix(model);
        Self {
            model: model.to_cols_array_2d(),
            normal: [
                [n.x_axis.x, n.x_axis.y, n.x_axis.z, 0.0],
                [n.y_axis.x, n.y_axis.y, n.y_axis.z, 0.0],
                [n.z_axis.x, n.z_axis.y, n.z_axis.z, 0.0],
            ],
            color: [color[0], color[1], color[2], 1.0],
            emissive: [emissive[0], emissive[1], emissive[2], 1.0],
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const VEC4: u64 = std::mem::size_of::<[f32; 4]>() as u64;
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Instance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // Model matrix columns
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: VEC4,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: VEC4 * 2,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: VEC4 * 3,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Normal matrix columns
                wgpu::VertexAttribute {
                    offset: VEC4 * 4,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: VEC4 * 5,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: VEC4 * 6,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Material
                wgpu::VertexAttribute {
                    offset: VEC4 * 7,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: VEC4 * 8,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Inverse-transpose of the model's upper 3x3 for transforming normals.
/// A non-invertible matrix (degenerate scale) falls back to identity; this
/// only feeds lighting.
pub fn normal_matrix(model: Mat4) -> Mat3 {
    let m = Mat3::from_mat4(model);
    if m.determinant().abs() < 1e-8 {
        Mat3::IDENTITY
    } else {
        m.inverse().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_normal_matrix_identity_for_rigid_transform() {
        let model = Mat4::from_translation(Vec3::new(10.0, -4.0, 2.0));
        let n = normal_matrix(model);
        assert!((n.determinant() - 1.0).abs() < 1e-5);
        let v = n * Vec3::Y;
        assert!((v - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_normal_matrix_undoes_nonuniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let n = normal_matrix(model);
        // A normal on the stretched axis shrinks by the inverse scale
        let v = n * Vec3::X;
        assert!((v.x - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_normal_matrix_degenerate_falls_back_to_identity() {
        let model = Mat4::from_scale(Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(normal_matrix(model), Mat3::IDENTITY);
    }

    #[test]
    fn test_instance_packs_model_columns() {
        let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let instance = Instance::new(model, [0.5, 0.6, 0.7], [0.1, 0.2, 0.3]);
        assert_eq!(instance.model[3][0], 1.0);
        assert_eq!(instance.model[3][1], 2.0);
        assert_eq!(instance.model[3][2], 3.0);
        assert_eq!(instance.color[3], 1.0);
    }
}
