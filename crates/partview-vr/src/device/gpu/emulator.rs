use std::collections::{HashMap, HashSet};

use glam::{Quat, Vec3};

use crate::actor::ActorId;
use crate::device::{
    DeviceError, DeviceFactory, DeviceMode, HeadPose, OpenError, ResourceCounter, VrDevice,
};
use crate::scene::StereoFrame;
use crate::time::FrameTime;

use super::GpuInit;
use super::mesh::{CameraUniform, GpuMesh, MeshVertex, ModelUniform, uniform_layout_entry};

/// Resources created with the device: target, two eye cameras, pipeline.
const BASE_RESOURCES: usize = 4;

/// Opens a [`StereoEmulator`] on the render thread.
#[derive(Debug, Clone, Default)]
pub struct StereoEmulatorFactory {
    init: GpuInit,
    counter: ResourceCounter,
}

impl StereoEmulatorFactory {
    pub fn new(init: GpuInit) -> Self {
        Self {
            init,
            counter: ResourceCounter::new(),
        }
    }

    /// Counter shared with every emulator this factory opens.
    pub fn counter(&self) -> ResourceCounter {
        self.counter.clone()
    }
}

impl DeviceFactory for StereoEmulatorFactory {
    fn open(&mut self) -> Result<Box<dyn VrDevice>, OpenError> {
        let emulator = pollster::block_on(StereoEmulator::new(self.init.clone(), self.counter.clone()))?;
        Ok(Box::new(emulator))
    }
}

struct EyeCamera {
    ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Everything dropped on release.
struct GpuState {
    device: wgpu::Device,
    queue: wgpu::Queue,
    _target: wgpu::Texture,
    target_view: wgpu::TextureView,
    pipeline: wgpu::RenderPipeline,
    model_layout: wgpu::BindGroupLayout,
    cameras: [EyeCamera; 2],
    meshes: HashMap<ActorId, GpuMesh>,
}

/// Headless wgpu device rendering side-by-side stereo frames.
pub struct StereoEmulator {
    init: GpuInit,
    adapter_name: String,
    state: Option<GpuState>,
    rejected: HashSet<ActorId>,
    counter: ResourceCounter,
}

impl StereoEmulator {
    /// Creates the emulator.
    ///
    /// A missing adapter means there is nothing to display on and is reported
    /// as [`OpenError::Unavailable`]; a device that cannot be created is fatal.
    pub async fn new(init: GpuInit, counter: ResourceCounter) -> Result<Self, OpenError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| OpenError::Unavailable(format!("no suitable GPU adapter: {e}")))?;

        let adapter_name = adapter.get_info().name;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("partview stereo emulator"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| OpenError::Fatal(format!("failed to create wgpu device on {adapter_name}: {e}")))?;

        let state = GpuState::new(device, queue, &init);
        counter.acquire(BASE_RESOURCES);

        log::info!(
            "stereo emulator ready on {adapter_name} ({}x{} per eye)",
            init.eye_width,
            init.eye_height
        );

        Ok(Self {
            init,
            adapter_name,
            state: Some(state),
            rejected: HashSet::new(),
            counter,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }
}

impl GpuState {
    fn new(device: wgpu::Device, queue: wgpu::Queue, init: &GpuInit) -> Self {
        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("partview eye target"),
            size: wgpu::Extent3d {
                width: init.eye_width.max(1) * 2,
                height: init.eye_height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: init.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("partview camera bgl"),
            entries: &[uniform_layout_entry(std::mem::size_of::<CameraUniform>())],
        });
        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("partview model bgl"),
            entries: &[uniform_layout_entry(std::mem::size_of::<ModelUniform>())],
        });

        let cameras = [
            EyeCamera::new(&device, &camera_layout, "partview left eye"),
            EyeCamera::new(&device, &camera_layout, "partview right eye"),
        ];

        let pipeline = build_pipeline(&device, &camera_layout, &model_layout, init.format);

        Self {
            device,
            queue,
            _target: target,
            target_view,
            pipeline,
            model_layout,
            cameras,
            meshes: HashMap::new(),
        }
    }
}

impl EyeCamera {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });
        Self { ubo, bind_group }
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    camera_layout: &wgpu::BindGroupLayout,
    model_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("partview mesh shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("mesh.wgsl").into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("partview mesh pipeline layout"),
        bind_group_layouts: &[camera_layout, model_layout],
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("partview mesh pipeline"),
        layout: Some(&layout),

        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[MeshVertex::layout()],
        },

        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        // STL winding is unreliable; draw both sides.
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

impl VrDevice for StereoEmulator {
    fn name(&self) -> &str {
        "stereo emulator"
    }

    fn mode(&self) -> DeviceMode {
        DeviceMode::Display
    }

    fn paces_frames(&self) -> bool {
        // Offscreen submission does not wait for a display refresh.
        false
    }

    fn poll(&mut self, time: &FrameTime) -> Result<HeadPose, DeviceError> {
        if self.state.is_none() {
            return Err(DeviceError::fatal("stereo emulator already released"));
        }

        if !self.init.head_sway {
            return Ok(HeadPose::STANDING);
        }

        let t = time.elapsed;
        let yaw = (4.0f32).to_radians() * (t * 0.5).sin();
        let bob = 0.01 * (t * 1.3).sin();
        Ok(HeadPose::new(
            HeadPose::STANDING.position + Vec3::new(0.0, bob, 0.0),
            Quat::from_rotation_y(yaw),
        ))
    }

    fn present(&mut self, frame: &StereoFrame<'_>) -> Result<(), DeviceError> {
        let Some(state) = self.state.as_mut() else {
            return Err(DeviceError::fatal("stereo emulator already released"));
        };

        for (camera, eye) in state.cameras.iter().zip(&frame.eyes) {
            state
                .queue
                .write_buffer(&camera.ubo, 0, bytemuck::bytes_of(&CameraUniform::from_eye(eye)));
        }

        for actor in &frame.actors {
            if self.rejected.contains(&actor.id) {
                continue;
            }

            if !state.meshes.contains_key(&actor.id) {
                if let Err(err) = actor.geometry.validate() {
                    log::warn!("stereo emulator: skipping '{}' ({}): {err}", actor.name, actor.id);
                    self.rejected.insert(actor.id);
                    continue;
                }
                let mesh = GpuMesh::upload(&state.device, &state.model_layout, actor.geometry, actor.name);
                state.meshes.insert(actor.id, mesh);
                self.counter.acquire(1);
            }

            if let Some(mesh) = state.meshes.get(&actor.id) {
                let uniform = ModelUniform::new(actor.model, actor.color, actor.opacity);
                state.queue.write_buffer(&mesh.model_ubo, 0, bytemuck::bytes_of(&uniform));
            }
        }

        let mut encoder = state
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("partview stereo encoder"),
            });

        {
            let clear = self.init.clear_color;
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("partview stereo pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &state.target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear.r as f64,
                            g: clear.g as f64,
                            b: clear.b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(&state.pipeline);

            let (w, h) = (self.init.eye_width.max(1) as f32, self.init.eye_height.max(1) as f32);
            for (i, camera) in state.cameras.iter().enumerate() {
                rpass.set_viewport(i as f32 * w, 0.0, w, h, 0.0, 1.0);
                rpass.set_bind_group(0, &camera.bind_group, &[]);

                for actor in &frame.actors {
                    let Some(mesh) = state.meshes.get(&actor.id) else { continue };
                    rpass.set_bind_group(1, &mesh.bind_group, &[]);
                    rpass.set_vertex_buffer(0, mesh.vbo.slice(..));
                    rpass.set_index_buffer(mesh.ibo.slice(..), wgpu::IndexFormat::Uint32);
                    rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
            }
        }

        state.queue.submit(std::iter::once(encoder.finish()));

        state
            .device
            .poll(wgpu::PollType::Poll)
            .map(|_| ())
            .map_err(|e| DeviceError::transient(format!("device poll failed: {e}")))
    }

    fn resources_held(&self) -> usize {
        self.state
            .as_ref()
            .map_or(0, |s| BASE_RESOURCES + s.meshes.len())
    }

    fn release(&mut self) {
        let held = self.resources_held();
        self.state = None;
        self.rejected.clear();
        self.counter.release(held);
        log::debug!("stereo emulator on {} released {held} resource(s)", self.adapter_name);
    }
}
