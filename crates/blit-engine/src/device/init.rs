/// Context creation parameters.
#[derive(Debug, Clone)]
pub struct GlInit {
    /// Requested core-profile version.
    pub version: (u8, u8),
    /// Ask for a multisampled default framebuffer.
    pub msaa: bool,
    /// Wait for vertical blank on swap.
    pub vsync: bool,
    pub stencil_bits: u8,
    /// Request a debug context.
    pub debug: bool,
}

impl Default for GlInit {
    fn default() -> Self {
        Self {
            version: (3, 3),
            msaa: true,
            vsync: true,
            stencil_bits: 8,
            debug: false,
        }
    }
}
