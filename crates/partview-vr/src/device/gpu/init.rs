use crate::material::Rgb;

/// Initialization parameters for the stereo emulator.
///
/// Keep this structure minimal. Add flags only when a concrete backend
/// requirement exists.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Width of one eye image in pixels. The target is twice as wide.
    pub eye_width: u32,

    /// Height of one eye image in pixels.
    pub eye_height: u32,

    /// Color format of the eye target.
    pub format: wgpu::TextureFormat,

    /// Background of both eye views.
    pub clear_color: Rgb,

    pub power_preference: wgpu::PowerPreference,

    /// Required wgpu features.
    ///
    /// Favor an empty set for portability.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Simulate small head movements instead of a fixed pose.
    pub head_sway: bool,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            eye_width: 1440,
            eye_height: 1600,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            clear_color: Rgb::new(0.1, 0.1, 0.1),
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            head_sway: true,
        }
    }
}
