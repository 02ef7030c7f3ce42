//! Cube lookup tables.
//!
//! Corners are numbered in Z order: bit 0 is the +X offset, bit 1 is +Y and
//! bit 2 is +Z.

/// Lattice offset of each cube corner.
pub const CUBE_CORNER_OFFSETS: [[u32; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [1, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
];

/// Corner pairs `(low, high)` of the 12 cube edges, grouped by axis.
pub const CUBE_EDGES: [[u8; 2]; 12] = [
    // X
    [0b000, 0b001],
    [0b010, 0b011],
    [0b100, 0b101],
    [0b110, 0b111],
    // Y
    [0b000, 0b010],
    [0b001, 0b011],
    [0b100, 0b110],
    [0b101, 0b111],
    // Z
    [0b000, 0b100],
    [0b001, 0b101],
    [0b010, 0b110],
    [0b011, 0b111],
];

/// Axis each cube edge runs along.
pub const CUBE_EDGE_AXIS: [usize; 12] = [0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2];

/// The two axes orthogonal to each axis, in right-handed cyclic order
/// (`a × b = c`).
pub const ORTHOGONAL_AXES: [[usize; 2]; 3] = [[1, 2], [2, 0], [0, 1]];
