use crate::tables::CUBE_EDGES;

/// Sign pattern of a cube's 8 corner samples.
///
/// Bit `c` is set when corner `c` is outside the surface (sample `>= 0`). A
/// sample of exactly zero therefore counts as outside.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct SignMask(pub u8);

impl SignMask {
    pub const ALL_INSIDE: Self = Self(0x00);
    pub const ALL_OUTSIDE: Self = Self(0xFF);

    #[inline]
    pub fn from_samples(samples: &[f32; 8]) -> Self {
        let mut mask = 0;
        for (c, &s) in samples.iter().enumerate() {
            mask |= u8::from(is_outside(s)) << c;
        }
        Self(mask)
    }

    #[inline]
    pub fn is_outside(self, corner: u8) -> bool {
        self.0 & (1 << corner) != 0
    }

    /// True if the surface passes through the cube.
    #[inline]
    pub fn is_active(self) -> bool {
        self != Self::ALL_INSIDE && self != Self::ALL_OUTSIDE
    }

    #[inline]
    pub fn edge_crosses(self, edge: usize) -> bool {
        let [c0, c1] = CUBE_EDGES[edge];
        self.is_outside(c0) != self.is_outside(c1)
    }

    /// Indices into [`CUBE_EDGES`] of every sign-changing edge.
    pub fn crossing_edges(self) -> impl Iterator<Item = usize> {
        (0..12).filter(move |&e| self.edge_crosses(e))
    }

    pub fn num_crossing_edges(self) -> u32 {
        self.crossing_edges().count() as u32
    }
}

#[inline]
pub(crate) fn is_outside(sample: f32) -> bool {
    sample >= 0.0
}
