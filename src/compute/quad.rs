//! Full-screen quad geometry.

/// Vertex layout expected by the built-in vertex stage.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// `(location, component count, byte offset)` of each attribute.
    pub const ATTRIBUTES: [(u32, i32, usize); 3] = [
        (0, 3, std::mem::offset_of!(Vertex, position)),
        (1, 3, std::mem::offset_of!(Vertex, normal)),
        (2, 2, std::mem::offset_of!(Vertex, tex_coord)),
    ];

    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

/// Two triangles covering clip space, texture coordinates spanning 0..1.
pub const FULLSCREEN_QUAD: [Vertex; 6] = [
    Vertex::new([1.0, -1.0, 0.0], [0.0; 3], [1.0, 0.0]),
    Vertex::new([-1.0, -1.0, 0.0], [0.0; 3], [0.0, 0.0]),
    Vertex::new([-1.0, 1.0, 0.0], [0.0; 3], [0.0, 1.0]),
    Vertex::new([1.0, -1.0, 0.0], [0.0; 3], [1.0, 0.0]),
    Vertex::new([-1.0, 1.0, 0.0], [0.0; 3], [0.0, 1.0]),
    Vertex::new([1.0, 1.0, 0.0], [0.0; 3], [1.0, 1.0]),
];
