//! Scene renderer
//!
//! Owns the long-lived GPU handles (device, queue, pipeline, meshes) and
//! exposes only `resize` and `render`. Each frame it reads the game state,
//! projects every entity through `BoardProjection` and draws the procedural
//! meshes with per-entity instance data — no mutable render state survives
//! a frame beyond the compiled pipeline and these buffers.

use bytemuck::Zeroable;
use glam::{Mat4, Vec3};
use thiserror::Error;
use wgpu::util::DeviceExt;

use super::mesh::{Mesh, box_mesh, plane_mesh, sphere_mesh};
use super::projection::{BoardProjection, SCALE_X, SCALE_Y};
use super::vertex::{Instance, Vertex};
use crate::consts::*;
use crate::mix_rgb;
use crate::settings::Settings;
use crate::sim::{GameMode, GameState, Paddle, Playfield};

/// Renderer construction failures. Fatal to gameplay but not to the host,
/// which degrades to an error overlay with the start control disabled.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("no compatible GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("GPU device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct FrameUniforms {
    projection: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    light_direction: [f32; 4],
    light_color: [f32; 4],
    ambient_color: [f32; 4],
}

/// Per-frame instance batches, one per mesh shape
#[derive(Default)]
struct FrameBatch {
    planes: Vec<Instance>,
    cubes: Vec<Instance>,
    spheres: Vec<Instance>,
}

pub struct SceneRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    depth_view: wgpu::TextureView,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    cube: Mesh,
    sphere: Mesh,
    plane: Mesh,
    /// Viewport size in pixels
    pub size: (u32, u32),
    camera_sway: bool,
    entity_motion: bool,
}

impl SceneRenderer {
    pub async fn new(
        instance: &wgpu::Instance,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
        settings: &Settings,
    ) -> Result<Self, RendererError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("using adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("cosmic-breaker-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, width, height);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_uniforms_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniforms"),
            contents: bytemuck::bytes_of(&FrameUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_uniforms_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&frame_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc(), Instance::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let (sphere_w, sphere_h) = settings.quality.sphere_segments();
        let cube = box_mesh().upload(&device, "cube_mesh");
        let sphere = sphere_mesh(0.5, sphere_w, sphere_h).upload(&device, "sphere_mesh");
        let plane = plane_mesh().upload(&device, "plane_mesh");

        log::info!(
            "renderer ready ({} quality, {}x{})",
            settings.quality.as_str(),
            width,
            height
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            depth_view,
            frame_buffer,
            frame_bind_group,
            cube,
            sphere,
            plane,
            size: (width, height),
            camera_sway: settings.effective_camera_sway(),
            entity_motion: !settings.reduced_motion,
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, new_width, new_height);
        }
    }

    /// Draw one frame from the current game state. `time` is the sim clock
    /// in seconds and drives every animation phase deterministically.
    pub fn render(
        &mut self,
        state: &GameState,
        paddle: &Paddle,
        field: &Playfield,
        time: f64,
    ) -> Result<(), wgpu::SurfaceError> {
        let camera_t = if self.camera_sway { time as f32 } else { 0.0 };
        let motion_t = if self.entity_motion { time as f32 } else { 0.0 };

        let aspect = self.size.0 as f32 / self.size.1.max(1) as f32;
        let projection =
            Mat4::perspective_rh(std::f32::consts::PI / 3.4, aspect, 0.1, 4000.0);
        let eye = Vec3::new(
            (camera_t * 0.25).sin() * 60.0,
            210.0 + (camera_t * 0.4).sin() * 25.0,
            900.0,
        );
        let view = Mat4::look_at_rh(eye, Vec3::new(0.0, 0.0, -200.0), Vec3::Y);

        let light_direction = Vec3::new(0.4, -0.9, -0.5)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z);
        let uniforms = FrameUniforms {
            projection: projection.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            light_direction: [light_direction.x, light_direction.y, light_direction.z, 0.0],
            light_color: [0.9, 0.95, 1.0, 1.0],
            ambient_color: [0.12, 0.16, 0.22, 1.0],
        };
        self.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&uniforms));

        let proj = BoardProjection::new(field);
        let mut batch = FrameBatch::default();
        self.stage_board(&mut batch, &proj, field, motion_t);
        self.stage_bricks(&mut batch, &proj, state);
        self.stage_paddle(&mut batch, &proj, paddle, field, motion_t);
        self.stage_shield(&mut batch, &proj, state, field, time);
        self.stage_power_ups(&mut batch, &proj, state, motion_t);
        self.stage_rocket(&mut batch, &proj, state, motion_t);
        self.stage_balls(&mut batch, &proj, state, paddle, field, motion_t);

        let output = self.surface.get_current_texture()?;
        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });

        // Per-frame instance buffers; simple re-upload beats tracking
        // capacities at these entity counts.
        let uploads: Vec<(&Mesh, wgpu::Buffer, u32)> = [
            (&self.plane, &batch.planes),
            (&self.cube, &batch.cubes),
            (&self.sphere, &batch.spheres),
        ]
        .into_iter()
        .filter(|(_, instances)| !instances.is_empty())
        .map(|(mesh, instances)| {
            let buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("instance_buffer"),
                    contents: bytemuck::cast_slice(instances),
                    usage: wgpu::BufferUsages::VERTEX,
                });
            (mesh, buffer, instances.len() as u32)
        })
        .collect();

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.05,
                            b: 0.12,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for (mesh, instances, count) in &uploads {
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, instances.slice(..));
                render_pass
                    .set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.index_count, 0, 0..*count);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Backing plane and the four glowing frame rails
    fn stage_board(
        &self,
        batch: &mut FrameBatch,
        proj: &BoardProjection,
        field: &Playfield,
        t: f32,
    ) {
        let glow = ((t * 2.0).sin() + 1.0) / 2.0;
        let board_width = field.width();
        let board_height = field.height();

        let center = proj.to_world(field.center_x(), field.center_y(), -40.0);
        batch.planes.push(Instance::new(
            model(
                Vec3::new(center.x, center.y - 120.0, center.z - 200.0),
                Vec3::new(-std::f32::consts::PI / 2.3, 0.0, 0.0),
                Vec3::new(
                    board_width * SCALE_X * 1.3,
                    board_height * 0.05,
                    board_height * 0.8,
                ),
            ),
            [0.05, 0.07, 0.18],
            [0.02, 0.03, 0.08],
        ));

        let frame_color = [0.05 + glow * 0.1, 0.32 + glow * 0.2, 0.52 + glow * 0.25];
        let frame_emissive = [0.0, 0.12 + glow * 0.35, 0.3 + glow * 0.4];

        let rails = [
            (
                proj.to_world(field.center_x(), field.top - 10.0, -20.0),
                Vec3::new(board_width * SCALE_X + 40.0, 12.0, 30.0),
            ),
            (
                proj.to_world(field.center_x(), field.bottom + 10.0, 40.0),
                Vec3::new(board_width * SCALE_X + 40.0, 16.0, 38.0),
            ),
            (
                proj.to_world(field.left - 14.0, field.center_y(), -10.0),
                Vec3::new(16.0, board_height * SCALE_Y + 60.0, 32.0),
            ),
            (
                proj.to_world(field.right + 14.0, field.center_y(), -10.0),
                Vec3::new(16.0, board_height * SCALE_Y + 60.0, 32.0),
            ),
        ];
        for (position, scale) in rails {
            batch.cubes.push(Instance::new(
                model(position, Vec3::ZERO, scale),
                frame_color,
                frame_emissive,
            ));
        }
    }

    fn stage_bricks(&self, batch: &mut FrameBatch, proj: &BoardProjection, state: &GameState) {
        for brick in state.bricks.iter().filter(|b| b.alive()) {
            let center = brick.center();
            let world = proj.to_world(center.x, center.y, -(brick.row as f32) * 24.0);
            batch.cubes.push(Instance::new(
                model(
                    world,
                    Vec3::ZERO,
                    Vec3::new(brick.width * SCALE_X, brick.height * SCALE_Y, brick.depth),
                ),
                mix_rgb(brick.color, brick.color_secondary, 0.35),
                mix_rgb(brick.color_secondary, [1.0, 1.0, 1.0], 0.25),
            ));
        }
    }

    fn stage_paddle(
        &self,
        batch: &mut FrameBatch,
        proj: &BoardProjection,
        paddle: &Paddle,
        field: &Playfield,
        t: f32,
    ) {
        let world = proj.to_world(paddle.x(), paddle.y(field), 100.0);
        batch.cubes.push(Instance::new(
            model(
                world,
                Vec3::new(0.0, t.sin() * 0.05, 0.0),
                Vec3::new(
                    paddle.width * SCALE_X,
                    paddle.height * SCALE_Y,
                    paddle.depth,
                ),
            ),
            [0.08, 0.88, 0.95],
            [0.02, 0.32, 0.44],
        ));
    }

    /// Shield bar along the bottom bound, fading as the timer runs down
    fn stage_shield(
        &self,
        batch: &mut FrameBatch,
        proj: &BoardProjection,
        state: &GameState,
        field: &Playfield,
        time: f64,
    ) {
        let Some(shield) = state.shield else {
            return;
        };
        let remaining = (shield.expires_at - time).max(0.0);
        let intensity = (remaining / SHIELD_DURATION).min(1.0) as f32;

        let left = proj.to_world(field.left + 8.0, field.bottom + 6.0, 40.0);
        let right = proj.to_world(field.right - 8.0, field.bottom + 6.0, 40.0);
        let center = proj.to_world(field.center_x(), field.bottom + 6.0, 40.0);
        batch.cubes.push(Instance::new(
            model(
                center,
                Vec3::new(std::f32::consts::FRAC_PI_2, 0.0, 0.0),
                Vec3::new((right.x - left.x).abs(), 10.0, 28.0),
            ),
            [0.2, 0.75 * intensity, 0.65 * intensity],
            [0.05, 0.4 * intensity, 0.35 * intensity],
        ));
    }

    fn stage_power_ups(
        &self,
        batch: &mut FrameBatch,
        proj: &BoardProjection,
        state: &GameState,
        t: f32,
    ) {
        for power_up in &state.power_ups {
            let base_color = power_up.kind.color();
            let emissive = mix_rgb(base_color, [1.0, 1.0, 1.0], 0.45);
            let bob = 70.0 + (t * 4.0 + power_up.pos.x * 0.01).sin() * 10.0;
            let world = proj.to_world(power_up.pos.x, power_up.pos.y, bob);
            let wobble = (t * 5.0 + power_up.pos.y * 0.02).sin() * 0.35;
            batch.cubes.push(Instance::new(
                model(
                    world,
                    Vec3::new(0.0, wobble, 0.0),
                    Vec3::new(
                        power_up.width * SCALE_X * 0.55,
                        power_up.height * SCALE_Y * 0.5,
                        26.0,
                    ),
                ),
                base_color,
                emissive,
            ));
        }
    }

    fn stage_rocket(
        &self,
        batch: &mut FrameBatch,
        proj: &BoardProjection,
        state: &GameState,
        t: f32,
    ) {
        let Some(rocket) = state.rocket else {
            return;
        };
        let world = proj.to_world(rocket.pos.x, rocket.pos.y, 60.0);
        batch.cubes.push(Instance::new(
            model(
                world,
                Vec3::new(std::f32::consts::FRAC_PI_2, 0.0, (t * 10.0).sin() * 0.05),
                Vec3::new(rocket.width * SCALE_X * 0.5, rocket.height, 20.0),
            ),
            [0.95, 0.45, 0.85],
            [0.65, 0.2, 0.6],
        ));
    }

    /// Live balls, or a placeholder parked on the paddle for continuity,
    /// plus the launch marker while the game is not running
    fn stage_balls(
        &self,
        batch: &mut FrameBatch,
        proj: &BoardProjection,
        state: &GameState,
        paddle: &Paddle,
        field: &Playfield,
        t: f32,
    ) {
        let spin_base = t * 2.0;
        let placeholder = [(
            paddle.x(),
            paddle.y(field) - paddle.height,
            BALL_RADIUS,
            0.0f32,
        )];
        let balls: Vec<(f32, f32, f32, f32)> = if state.balls.is_empty() {
            placeholder.to_vec()
        } else {
            state
                .balls
                .iter()
                .map(|b| (b.pos.x, b.pos.y, b.radius, b.spin))
                .collect()
        };

        for (x, y, radius, spin) in balls {
            let depth_swing = 90.0 + (t * 2.5 + x * 0.01).sin() * 14.0;
            let world = proj.to_world(x, y, depth_swing);
            let bounce = (t * 3.0 + y * 0.01).sin() * 3.0;
            let scale = radius * 2.0;
            batch.spheres.push(Instance::new(
                model(
                    Vec3::new(world.x, world.y + bounce, world.z),
                    Vec3::new(
                        spin_base * 0.9 + spin,
                        spin_base * 0.8 - spin * 1.8,
                        spin_base * 1.1 + spin * 2.2,
                    ),
                    Vec3::splat(scale),
                ),
                [0.55, 0.35, 1.0],
                [0.12, 0.25, 0.8],
            ));
        }

        if state.mode != GameMode::Running {
            let marker = proj.to_world(paddle.x(), paddle.y(field) - 60.0, 80.0);
            batch.cubes.push(Instance::new(
                model(
                    marker,
                    Vec3::new(std::f32::consts::FRAC_PI_2, 0.0, 0.0),
                    Vec3::new(paddle.width * 0.4, 6.0, 24.0),
                ),
                [0.22, 0.6, 0.95],
                [0.1, 0.25, 0.6],
            ));
        }
    }
}

/// Translate, rotate (x then y then z), scale
fn model(position: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_translation(position)
        * Mat4::from_rotation_x(rotation.x)
        * Mat4::from_rotation_y(rotation.y)
        * Mat4::from_rotation_z(rotation.z)
        * Mat4::from_scale(scale)
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
