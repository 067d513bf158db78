//! Vertex buffers of scene sections and full-screen quads.

impl_handle!(MeshHandle);

/// The vertex layout shared by every mesh: position, normal and color, all
/// three-component floats.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    #[inline]
    pub fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 3]) -> Self {
        Vertex {
            position,
            normal,
            color,
        }
    }

    /// The byte stride between two consecutive vertices.
    #[inline]
    pub fn stride() -> usize {
        ::std::mem::size_of::<Vertex>()
    }
}

/// Defines how the input vertex data is used to assemble primitives.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MeshPrimitive {
    Triangles,
    TriangleStrip,
}

impl MeshPrimitive {
    /// Returns the number of triangles assembled from `len` vertices.
    pub fn assemble(self, len: u32) -> u32 {
        match self {
            MeshPrimitive::Triangles => len / 3,
            MeshPrimitive::TriangleStrip => len.saturating_sub(2),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MeshParams {
    pub primitive: MeshPrimitive,
    pub num_verts: usize,
}

impl Default for MeshParams {
    fn default() -> Self {
        MeshParams {
            primitive: MeshPrimitive::Triangles,
            num_verts: 0,
        }
    }
}

impl MeshParams {
    /// Returns the length of the vertex buffer in bytes.
    pub fn vertex_buffer_len(&self) -> usize {
        self.num_verts * Vertex::stride()
    }
}

/// The full-screen quad drawn as a triangle strip.
pub fn screen_quad() -> Vec<Vertex> {
    [[-1.0, 1.0], [-1.0, -1.0], [1.0, 1.0], [1.0, -1.0]]
        .iter()
        .map(|p: &[f32; 2]| Vertex::new([p[0], p[1], 0.0], [0.0, 0.0, 1.0], [1.0, 1.0, 1.0]))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn assemble() {
        assert_eq!(MeshPrimitive::Triangles.assemble(9), 3);
        assert_eq!(MeshPrimitive::TriangleStrip.assemble(4), 2);
        assert_eq!(MeshPrimitive::TriangleStrip.assemble(1), 0);
        assert_eq!(Vertex::stride(), 36);
    }
}
