//! Post-processing parameters: ambient occlusion, its denoiser, bloom and output.

use serde::{Deserialize, Serialize};

/// Ground-truth ambient occlusion parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AoParameters {
    pub enabled: bool,
    pub radius: f32,
    pub distance_exponent: f32,
    pub thickness: f32,
    pub scale: f32,
    /// Samples per pixel; the main cost knob.
    pub samples: u32,
    pub distance_falloff: f32,
    pub screen_space_radius: bool,
}

impl Default for AoParameters {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 0.05,
            distance_exponent: 4.0,
            thickness: 1.0,
            scale: 1.1,
            samples: 16,
            distance_falloff: 0.75,
            screen_space_radius: false,
        }
    }
}

/// Poisson denoise parameters applied to the raw occlusion term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseParameters {
    pub luma_phi: f32,
    pub depth_phi: f32,
    pub normal_phi: f32,
    pub radius: f32,
    pub radius_exponent: f32,
    pub rings: f32,
    pub samples: u32,
}

impl Default for DenoiseParameters {
    fn default() -> Self {
        Self {
            luma_phi: 10.0,
            depth_phi: 2.0,
            normal_phi: 3.0,
            radius: 2.0,
            radius_exponent: 1.0,
            rings: 2.0,
            samples: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomParameters {
    /// Whether the bloom pass is part of the chain.
    pub enabled: bool,
    pub threshold: f32,
    pub strength: f32,
    pub radius: f32,
}

impl Default for BloomParameters {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: 1.0,
            strength: 0.3,
            radius: 1.0,
        }
    }
}

/// Everything the composer needs besides the scene itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostProcessing {
    pub ao: AoParameters,
    pub denoise: DenoiseParameters,
    /// How strongly occlusion darkens the image, 0..1.
    pub blend_intensity: f32,
    pub bloom: BloomParameters,
    /// Linear tone-mapping exposure applied by the output pass.
    pub exposure: f32,
    /// Incremented whenever AO parameters are (re)applied; the GPU side uploads on change.
    ao_generation: u64,
}

impl Default for PostProcessing {
    fn default() -> Self {
        Self {
            ao: AoParameters::default(),
            denoise: DenoiseParameters::default(),
            blend_intensity: 1.0,
            bloom: BloomParameters::default(),
            exposure: 1.16,
            ao_generation: 0,
        }
    }
}

impl PostProcessing {
    pub fn new(ao: AoParameters, denoise: DenoiseParameters, bloom: BloomParameters, exposure: f32) -> Self {
        Self {
            ao,
            denoise,
            bloom,
            exposure,
            ..Default::default()
        }
    }

    /// Replace the AO parameters and mark them for re-upload.
    pub fn update_ao(&mut self, ao: AoParameters) {
        self.ao = ao;
        self.ao_generation += 1;
    }

    /// Change the AO sample count and reapply.
    pub fn set_ao_samples(&mut self, samples: u32) {
        let mut ao = self.ao;
        ao.samples = samples.max(1);
        self.update_ao(ao);
    }

    pub fn ao_generation(&self) -> u64 {
        self.ao_generation
    }
}

/// Uniform block read by the ambient-occlusion / output shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PostUniform {
    pub inv_proj: [[f32; 4]; 4],
    /// x = radius, y = distance_exponent, z = thickness, w = scale
    pub ao_shape: [f32; 4],
    /// x = samples, y = distance_falloff, z = screen_space_radius (0/1), w = enabled (0/1)
    pub ao_quality: [f32; 4],
    /// x = luma_phi, y = depth_phi, z = normal_phi, w = radius
    pub denoise_a: [f32; 4],
    /// x = radius_exponent, y = rings, z = samples, w = unused
    pub denoise_b: [f32; 4],
    /// x = blend_intensity, y = exposure, z = 1/width, w = 1/height
    pub output: [f32; 4],
}

impl PostUniform {
    pub fn new(post: &PostProcessing, inv_proj: glam::Mat4, width: u32, height: u32) -> Self {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        let ao = &post.ao;
        let pd = &post.denoise;
        Self {
            inv_proj: inv_proj.to_cols_array_2d(),
            ao_shape: [ao.radius, ao.distance_exponent, ao.thickness, ao.scale],
            ao_quality: [
                ao.samples as f32,
                ao.distance_falloff,
                flag(ao.screen_space_radius),
                flag(ao.enabled),
            ],
            denoise_a: [pd.luma_phi, pd.depth_phi, pd.normal_phi, pd.radius],
            denoise_b: [pd.radius_exponent, pd.rings, pd.samples as f32, 0.0],
            output: [
                post.blend_intensity,
                post.exposure,
                1.0 / width.max(1) as f32,
                1.0 / height.max(1) as f32,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_viewer_presets() {
        let post = PostProcessing::default();
        assert_eq!(post.ao.samples, 16);
        assert_eq!(post.denoise.samples, 16);
        assert!(!post.bloom.enabled);
        assert!((post.exposure - 1.16).abs() < 1e-6);
    }

    #[test]
    fn changing_samples_reapplies_ao() {
        let mut post = PostProcessing::default();
        let before = post.ao_generation();
        post.set_ao_samples(8);
        assert_eq!(post.ao.samples, 8);
        assert_eq!(post.ao_generation(), before + 1);
        assert_eq!(post.ao.radius, AoParameters::default().radius);
    }

    #[test]
    fn uniform_packs_sample_count_and_flags() {
        let mut post = PostProcessing::default();
        post.set_ao_samples(8);
        let u = PostUniform::new(&post, glam::Mat4::IDENTITY, 800, 400);
        assert_eq!(u.ao_quality[0], 8.0);
        assert_eq!(u.ao_quality[3], 1.0);
        assert!((u.output[3] - 1.0 / 400.0).abs() < 1e-9);
    }
}
