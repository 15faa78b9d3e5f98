//! Main renderer managing wgpu state and the frame's passes:
//! sun shadow map → lit scene into an HDR target → ambient occlusion + output to the swap chain.

use crate::{
    camera::{Camera, CameraUniform},
    lighting::{LightingRig, ShadowSettings},
    mesh::Mesh,
    pipeline::{
        create_post_bind_group_layout, create_post_pipeline, create_scene_bind_group_layout,
        create_scene_pipeline, create_shadow_pass_bind_group_layout, create_shadow_pipeline,
    },
    post::{PostProcessing, PostUniform},
    texture::Texture,
    vertex::InstanceData,
};
use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use engine_core::{color_from_hex, Material, MeshData, Scene};
use glam::{Mat4, Vec3};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::window::Window;

/// Light uniform (must match `Lights` in scene.wgsl and shadow.wgsl).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightUniform {
    pub light_view_proj: [[f32; 4]; 4],
    /// xyz = direction toward the sun, w = intensity
    pub sun_direction: [f32; 4],
    pub sun_color: [f32; 4],
    /// rgb premultiplied by intensity
    pub ambient: [f32; 4],
    /// rgb = sky colour, w = hemisphere intensity
    pub hemi_sky: [f32; 4],
    pub hemi_ground: [f32; 4],
    /// x = bias, y = PCF spread in shadow-map uv, z = shadows enabled, w unused
    pub shadow_params: [f32; 4],
}

impl LightUniform {
    pub fn new(rig: &LightingRig, shadows: &ShadowSettings) -> Self {
        let rgb = |hex: u32, w: f32| {
            let c = color_from_hex(hex);
            [c.x, c.y, c.z, w]
        };
        let ambient = color_from_hex(rig.ambient.color) * rig.ambient.intensity;
        let dir = rig.sun.direction();
        let map_size = rig.sun.shadow_map_size.max(1) as f32;
        let enabled = shadows.enabled && rig.sun.cast_shadow;
        Self {
            light_view_proj: rig.sun.shadow_view_proj().to_cols_array_2d(),
            sun_direction: [dir.x, dir.y, dir.z, rig.sun.intensity],
            sun_color: rgb(rig.sun.color, 1.0),
            ambient: [ambient.x, ambient.y, ambient.z, 1.0],
            hemi_sky: rgb(rig.hemisphere.sky_color, rig.hemisphere.intensity),
            hemi_ground: rgb(rig.hemisphere.ground_color, 1.0),
            shadow_params: [
                rig.sun.shadow_bias,
                rig.sun.shadow_radius / map_size / 4.0,
                if enabled { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }
}

/// One instanced draw: a mesh plus a contiguous range of the instance buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DrawBatch {
    mesh: usize,
    first_instance: u32,
    count: u32,
    additive: bool,
    cast_shadow: bool,
}

/// Main renderer state.
pub struct Renderer {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    pub window: Arc<Window>,

    // Pipelines
    scene_pipeline: wgpu::RenderPipeline,
    additive_pipeline: wgpu::RenderPipeline,
    shadow_pipeline: wgpu::RenderPipeline,
    post_pipeline: wgpu::RenderPipeline,

    // Bind groups and layouts
    post_bind_group_layout: wgpu::BindGroupLayout,
    scene_bind_group: wgpu::BindGroup,
    shadow_pass_bind_group: wgpu::BindGroup,
    post_bind_group: wgpu::BindGroup,

    camera_buffer: wgpu::Buffer,
    camera_uniform: CameraUniform,
    light_buffer: wgpu::Buffer,
    post_buffer: wgpu::Buffer,

    // Shadow mapping (directional sun shadow)
    pub shadow_map: Texture,

    // Render targets
    depth_texture: Texture,
    hdr_target: Texture,

    // Scene cache, rebuilt when the scene revision changes.
    meshes: HashMap<usize, (Arc<MeshData>, Mesh)>,
    batches: Vec<DrawBatch>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    scene_revision: Option<u64>,
}

impl Renderer {
    /// Create a new renderer for the given window.
    pub async fn new(window: Arc<Window>, lighting: &LightingRig, vsync: bool) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("Failed to find suitable GPU adapter"))?;

        log::info!("Using GPU: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let present_mode = if vsync {
            surface_caps
                .present_modes
                .iter()
                .find(|m| matches!(m, wgpu::PresentMode::Mailbox))
                .copied()
                .unwrap_or(wgpu::PresentMode::AutoVsync)
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let camera_uniform = CameraUniform::new();
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let light_uniform = LightUniform::new(lighting, &ShadowSettings::default());
        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::cast_slice(&[light_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let post_uniform = PostUniform::new(
            &PostProcessing::default(),
            Mat4::IDENTITY,
            config.width,
            config.height,
        );
        let post_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Post Buffer"),
            contents: bytemuck::cast_slice(&[post_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        // Directional sun shadow map
        let shadow_size = lighting.sun.shadow_map_size.max(1);
        let shadow_map = Texture::create_depth_texture(&device, shadow_size, shadow_size, "Shadow Map");
        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let scene_layout = create_scene_bind_group_layout(&device);
        let shadow_pass_layout = create_shadow_pass_bind_group_layout(&device);
        let post_bind_group_layout = create_post_bind_group_layout(&device);

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &scene_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: light_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(&shadow_map.view) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::Sampler(&shadow_sampler) },
            ],
        });
        let shadow_pass_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Pass Bind Group"),
            layout: &shadow_pass_layout,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: light_buffer.as_entire_binding() }],
        });

        let scene_pipeline = create_scene_pipeline(&device, &scene_layout, false);
        let additive_pipeline = create_scene_pipeline(&device, &scene_layout, true);
        let shadow_pipeline = create_shadow_pipeline(&device, &shadow_pass_layout);
        let post_pipeline = create_post_pipeline(&device, &post_bind_group_layout, config.format);

        let depth_texture = Texture::create_depth_texture(&device, config.width, config.height, "Depth Texture");
        let hdr_target = Texture::create_hdr_target(&device, config.width, config.height, "Scene Color");
        let post_bind_group = create_post_bind_group(
            &device,
            &post_bind_group_layout,
            &hdr_target,
            &depth_texture,
            &post_buffer,
        );

        let instance_capacity = 256;
        let instance_buffer = create_instance_buffer(&device, instance_capacity);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            window,
            scene_pipeline,
            additive_pipeline,
            shadow_pipeline,
            post_pipeline,
            post_bind_group_layout,
            scene_bind_group,
            shadow_pass_bind_group,
            post_bind_group,
            camera_buffer,
            camera_uniform,
            light_buffer,
            post_buffer,
            shadow_map,
            depth_texture,
            hdr_target,
            meshes: HashMap::new(),
            batches: Vec::new(),
            instance_buffer,
            instance_capacity,
            scene_revision: None,
        })
    }

    /// Handle window resize.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture =
                Texture::create_depth_texture(&self.device, self.config.width, self.config.height, "Depth Texture");
            self.hdr_target =
                Texture::create_hdr_target(&self.device, self.config.width, self.config.height, "Scene Color");
            self.post_bind_group = create_post_bind_group(
                &self.device,
                &self.post_bind_group_layout,
                &self.hdr_target,
                &self.depth_texture,
                &self.post_buffer,
            );
        }
    }

    /// Reconfigure the surface at its current size (after `Lost` / `Outdated`).
    pub fn reconfigure(&mut self) {
        self.resize(self.size);
    }

    /// Upload new meshes and rebuild instance batches when the scene changed.
    fn sync_scene(&mut self, scene: &Scene) {
        if self.scene_revision == Some(scene.revision()) {
            return;
        }
        self.scene_revision = Some(scene.revision());

        let default_material = Material::default();
        let mut groups: BTreeMap<(bool, usize, bool), Vec<InstanceData>> = BTreeMap::new();
        let meshes = &mut self.meshes;
        let device = &self.device;
        scene.root.walk_world(Mat4::IDENTITY, |node, world| {
            let Some(mesh) = &node.mesh else { return };
            let key = Arc::as_ptr(mesh) as usize;
            if !meshes.contains_key(&key) {
                match Mesh::from_data(device, mesh) {
                    Some(gpu) => {
                        meshes.insert(key, (mesh.clone(), gpu));
                    }
                    None => return,
                }
            }
            let material = node.material.as_ref().unwrap_or(&default_material);
            let additive = InstanceData::is_additive(material);
            groups
                .entry((additive, key, node.cast_shadow))
                .or_default()
                .push(InstanceData::from_material(world, material, node.receive_shadow));
        });

        let mut instances = Vec::new();
        self.batches.clear();
        for ((additive, mesh, cast_shadow), group) in groups {
            self.batches.push(DrawBatch {
                mesh,
                first_instance: instances.len() as u32,
                count: group.len() as u32,
                additive,
                cast_shadow,
            });
            instances.extend(group);
        }

        if instances.len() > self.instance_capacity {
            self.instance_capacity = instances.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(&self.device, self.instance_capacity);
        }
        if !instances.is_empty() {
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }
        log::debug!(
            "Scene synced: {} meshes, {} instances, {} batches",
            self.meshes.len(),
            instances.len(),
            self.batches.len()
        );
    }

    fn draw_batches(&self, pass: &mut wgpu::RenderPass<'_>, filter: impl Fn(&DrawBatch) -> bool) {
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        for batch in self.batches.iter().filter(|b| filter(b)) {
            let Some((_, mesh)) = self.meshes.get(&batch.mesh) else { continue };
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(
                0..mesh.num_indices,
                0,
                batch.first_instance..batch.first_instance + batch.count,
            );
        }
    }

    /// Render one frame. Consumes a pending shadow-map update request.
    pub fn render(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        lighting: &LightingRig,
        shadows: &mut ShadowSettings,
        post: &PostProcessing,
    ) -> Result<(), wgpu::SurfaceError> {
        self.sync_scene(scene);

        self.camera_uniform.update(camera);
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[self.camera_uniform]));
        let light_uniform = LightUniform::new(lighting, shadows);
        self.queue
            .write_buffer(&self.light_buffer, 0, bytemuck::cast_slice(&[light_uniform]));
        let post_uniform = PostUniform::new(
            post,
            camera.projection_matrix().inverse(),
            self.config.width,
            self.config.height,
        );
        self.queue
            .write_buffer(&self.post_buffer, 0, bytemuck::cast_slice(&[post_uniform]));

        let output = self.surface.get_current_texture()?;
        let output_view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        if lighting.sun.cast_shadow && shadows.take_render_request() {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.shadow_pipeline);
            pass.set_bind_group(0, &self.shadow_pass_bind_group, &[]);
            self.draw_batches(&mut pass, |b| b.cast_shadow && !b.additive);
        }

        {
            let bg: Vec3 = scene.background;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.hdr_target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: bg.x as f64,
                            g: bg.y as f64,
                            b: bg.z as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_bind_group(0, &self.scene_bind_group, &[]);
            pass.set_pipeline(&self.scene_pipeline);
            self.draw_batches(&mut pass, |b| !b.additive);
            pass.set_pipeline(&self.additive_pipeline);
            self.draw_batches(&mut pass, |b| b.additive);
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Post Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &output_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.post_pipeline);
            pass.set_bind_group(0, &self.post_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Instance Buffer"),
        size: (capacity.max(1) * std::mem::size_of::<InstanceData>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_post_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    color: &Texture,
    depth: &Texture,
    uniform: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Post Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&color.view) },
            wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&depth.view) },
            wgpu::BindGroupEntry { binding: 2, resource: uniform.as_entire_binding() },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_uniform_reflects_shadow_state() {
        let rig = LightingRig::default();
        let mut shadows = ShadowSettings::default();
        assert_eq!(LightUniform::new(&rig, &shadows).shadow_params[2], 1.0);
        shadows.enabled = false;
        assert_eq!(LightUniform::new(&rig, &shadows).shadow_params[2], 0.0);
    }

    #[test]
    fn light_uniform_is_std140_sized() {
        assert_eq!(std::mem::size_of::<LightUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<PostUniform>() % 16, 0);
    }
}
