//! Stagehand -- main loop and application entry point.
//!
//! Architecture: winit drives the event loop via `ApplicationHandler`; all
//! show state advances inside `RedrawRequested`:
//!
//!   1. `clock.begin_frame()` -- measure wall-clock delta, cap it
//!   2. `controller.update()` -- input, active scene timeline, render
//!      staging, progress check, in that load-bearing order
//!   3. Append the fade-guard overlay, stream the CPU mesh into GPU
//!      buffers, issue batched draw calls, composite the egui overlay
//!
//! The scene content is rebuilt on the CPU each frame and batched by
//! texture; consecutive primitives sharing a texture collapse into a
//! single `draw_indexed` call.

mod assets;
mod audio;
mod controller;
mod intro;
mod passage;
mod scene;
#[cfg(test)]
mod show_flow;

use std::collections::HashMap;
use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use assets::{AssetCatalog, INTRO_TITLE_TEXTURE, PASSAGE_TITLE_TEXTURE, WHITE_TEXTURE};
use audio::LogAudio;
use controller::{FrameCtx, SceneController};
use glam::Vec3;
use intro::IntroScene;
use passage::PassageScene;
use spe_core::input::{MotionInput, MotionIntent, MotionKey};
use spe_core::progress::{ProgressStore, StageId};
use spe_core::storage::FileStore;
use spe_core::time::Clock;
use spe_devtools::{OverlayStats, StageOverlay};
use spe_platform::window::PlatformConfig;
use spe_render::{
    GpuContext, PrimitiveKind, PrimitivePipeline, PrimitiveVertex, RenderContent, StageRenderer,
    Texture, WalkCamera,
};

const PROGRESS_PATH: &str = "stagehand_progress.json";
const TEXTURE_MANIFEST: &[(&str, &str)] = &[
    (INTRO_TITLE_TEXTURE, "assets/textures/intro_title.png"),
    (PASSAGE_TITLE_TEXTURE, "assets/textures/passage_title.png"),
];

/// A contiguous run of indices that share the same texture binding.
#[derive(Debug, Clone)]
struct DrawCall {
    texture_key: &'static str,
    index_start: u32,
    index_count: u32,
}

/// CPU-side mesh staging area, rebuilt every frame from the active
/// scene's content. Vectors are cleared, never shrunk.
#[derive(Default)]
struct MeshStage {
    vertices: Vec<PrimitiveVertex>,
    indices: Vec<u32>,
    draw_calls: Vec<DrawCall>,
    primitive_count: usize,
}

impl MeshStage {
    fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.draw_calls.clear();
        self.primitive_count = 0;
    }

    fn build(&mut self, content: &RenderContent, camera: &WalkCamera) {
        self.clear();
        let cam_right = camera.right();
        let cam_up = camera.up();

        for primitive in content.primitives() {
            let (half_right, half_up) = match primitive.kind {
                PrimitiveKind::Billboard => (
                    cam_right * primitive.size.x * 0.5,
                    cam_up * primitive.size.y * 0.5,
                ),
                PrimitiveKind::WallQuad => (
                    Vec3::X * primitive.size.x * 0.5,
                    Vec3::Y * primitive.size.y * 0.5,
                ),
            };
            self.emit_quad(
                primitive.center,
                half_right,
                half_up,
                primitive.color,
                primitive.texture,
            );
        }
        self.primitive_count = content.len();
    }

    /// Full-view quad just in front of the camera, used by the fade
    /// guard to mask scene swaps.
    fn append_fade(&mut self, alpha: f32, camera: &WalkCamera) {
        let distance = 0.1;
        let half_height = (camera.fov_y * 0.5).tan() * distance * 1.6;
        let aspect = camera.viewport.0.max(1) as f32 / camera.viewport.1.max(1) as f32;
        let center = camera.position + camera.forward() * distance;
        self.emit_quad(
            center,
            camera.right() * half_height * aspect,
            camera.up() * half_height,
            [0.0, 0.0, 0.0, alpha],
            WHITE_TEXTURE,
        );
        self.primitive_count += 1;
    }

    fn emit_quad(
        &mut self,
        center: Vec3,
        half_right: Vec3,
        half_up: Vec3,
        color: [f32; 4],
        texture_key: &'static str,
    ) {
        let base_index = self.vertices.len() as u32;
        let corners = [
            (center - half_right - half_up, [0.0, 1.0]),
            (center + half_right - half_up, [1.0, 1.0]),
            (center + half_right + half_up, [1.0, 0.0]),
            (center - half_right + half_up, [0.0, 0.0]),
        ];
        for (position, tex_coords) in corners {
            self.vertices.push(PrimitiveVertex {
                position: position.to_array(),
                tex_coords,
                color,
            });
        }

        let draw_start = self.indices.len() as u32;
        self.indices.extend_from_slice(&[
            base_index,
            base_index + 1,
            base_index + 2,
            base_index,
            base_index + 2,
            base_index + 3,
        ]);
        self.push_draw_call(texture_key, draw_start, 6);
    }

    /// Append a draw call, merging with the previous one when the texture
    /// matches and indices are contiguous.
    fn push_draw_call(&mut self, texture_key: &'static str, index_start: u32, index_count: u32) {
        if let Some(last) = self.draw_calls.last_mut() {
            let contiguous = last.index_start + last.index_count == index_start;
            if last.texture_key == texture_key && contiguous {
                last.index_count += index_count;
                return;
            }
        }
        self.draw_calls.push(DrawCall {
            texture_key,
            index_start,
            index_count,
        });
    }
}

/// The controller's render collaborator: staging only, the actual pass is
/// submitted once per frame after the overlay fade is appended.
struct StagingRenderer<'a> {
    mesh: &'a mut MeshStage,
}

impl StageRenderer for StagingRenderer<'_> {
    fn render(&mut self, content: &RenderContent, camera: &WalkCamera) {
        self.mesh.build(content, camera);
    }
}

struct GpuSceneTexture {
    bind_group: wgpu::BindGroup,
}

/// All mutable show state. Constructed lazily in
/// `ApplicationHandler::resumed` once the window and GPU surface exist.
struct ShowState {
    window: Arc<Window>,
    gpu: GpuContext,
    clock: Clock,
    input: MotionInput,
    camera: WalkCamera,
    audio: LogAudio,
    assets: AssetCatalog,
    controller: SceneController,
    pipeline: PrimitivePipeline,
    overlay: StageOverlay,
    textures: HashMap<&'static str, GpuSceneTexture>,

    mesh: MeshStage,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    index_capacity: usize,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
}

impl ShowState {
    fn new(window: Arc<Window>) -> Self {
        let gpu = GpuContext::new(window.clone());
        let clock = Clock::new();
        let input = MotionInput::new();
        let camera = WalkCamera::new(gpu.size.0, gpu.size.1);
        let pipeline = PrimitivePipeline::new(&gpu.device, gpu.surface_format);
        let overlay = StageOverlay::new(&gpu.device, gpu.surface_format, &window);

        let mut assets = AssetCatalog::new();
        let mut textures = HashMap::new();

        let white = Texture::from_rgba8(
            &gpu.device,
            &gpu.queue,
            &[255, 255, 255, 255],
            1,
            1,
            "white",
        );
        textures.insert(
            WHITE_TEXTURE,
            GpuSceneTexture {
                bind_group: pipeline.create_texture_bind_group(&gpu.device, &white),
            },
        );

        for &(name, path) in TEXTURE_MANIFEST {
            assets.declare(name);
            let loaded = std::fs::read(path)
                .map_err(|e| format!("Failed to read texture '{path}': {e}"))
                .and_then(|bytes| Texture::from_bytes(&gpu.device, &gpu.queue, &bytes, path));
            match loaded {
                Ok(texture) => {
                    textures.insert(
                        name,
                        GpuSceneTexture {
                            bind_group: pipeline.create_texture_bind_group(&gpu.device, &texture),
                        },
                    );
                    assets.mark_ready(name);
                }
                Err(err) => {
                    // Fallback visuals take over; the show never stalls on
                    // a missing card.
                    log::warn!("{err}");
                    assets.mark_failed(name);
                }
            }
        }

        let mut progress = ProgressStore::new(Box::new(FileStore::open(PROGRESS_PATH)));
        progress.set_stage_listener(Box::new(|stage| {
            log::info!("Stage indicator: {} (#{})", stage, stage.index());
        }));

        let mut controller = SceneController::new(progress);
        controller.register(StageId::Intro, Box::new(IntroScene::new()));
        controller.register(StageId::Threshold, Box::new(PassageScene::new()));
        // Later stages are authored separately; unregistered stages run
        // as an empty set with correct index tracking.
        controller.switch_to(StageId::Intro, 0.0);

        let camera_uniform = camera.build_uniform();
        let camera_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Uniform Buffer"),
            size: std::mem::size_of_val(&camera_uniform) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        gpu.queue
            .write_buffer(&camera_buffer, 0, bytemuck::cast_slice(&[camera_uniform]));
        let camera_bind_group = pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        Self {
            window,
            gpu,
            clock,
            input,
            camera,
            audio: LogAudio,
            assets,
            controller,
            pipeline,
            overlay,
            textures,
            mesh: MeshStage::default(),
            vertex_buffer,
            index_buffer,
            vertex_capacity: 1,
            index_capacity: 1,
            camera_buffer,
            camera_bind_group,
        }
    }

    fn ensure_mesh_capacity(&mut self) {
        let needed_vertices = self.mesh.vertices.len().max(1);
        if needed_vertices > self.vertex_capacity {
            self.vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.vertex_capacity);
        }

        let needed_indices = self.mesh.indices.len().max(1);
        if needed_indices > self.index_capacity {
            self.index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.index_capacity);
        }
    }

    fn overlay_stats(&self) -> OverlayStats {
        let progress = self.controller.progress();
        OverlayStats {
            stage_index: progress.current().index(),
            stage_count: StageId::COUNT,
            stage_label: if self.controller.has_active_scene() {
                progress.current().label().to_string()
            } else {
                format!("{} (empty)", progress.current().label())
            },
            visited: StageId::ALL
                .iter()
                .map(|stage| progress.visited().contains(stage))
                .collect(),
            phase_label: self.controller.active_phase_label().to_string(),
            can_advance: progress.can_advance(),
            guard_engaged: self.controller.guard_engaged(),
            input_enabled: self.input.is_enabled(),
            primitive_count: self.mesh.primitive_count as u32,
            draw_calls: self.mesh.draw_calls.len() as u32,
        }
    }

    fn redraw(&mut self) {
        if self.gpu.size.0 == 0 || self.gpu.size.1 == 0 {
            return;
        }

        self.clock.begin_frame();
        self.mesh.clear();

        {
            let mut renderer = StagingRenderer {
                mesh: &mut self.mesh,
            };
            let mut ctx = FrameCtx {
                now: self.clock.now,
                elapsed: self.clock.elapsed,
                delta: self.clock.delta,
                camera: &mut self.camera,
                input: &mut self.input,
                audio: &mut self.audio,
                assets: &self.assets,
                renderer: &mut renderer,
            };
            self.controller.update(&mut ctx);
        }

        let fade_alpha = self.controller.fade_alpha(self.clock.now);
        if fade_alpha > 0.0 {
            self.mesh.append_fade(fade_alpha, &self.camera);
        }

        self.ensure_mesh_capacity();
        if !self.mesh.vertices.is_empty() {
            self.gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(&self.mesh.vertices),
            );
        }
        if !self.mesh.indices.is_empty() {
            self.gpu.queue.write_buffer(
                &self.index_buffer,
                0,
                bytemuck::cast_slice(&self.mesh.indices),
            );
        }

        let camera_uniform = self.camera.build_uniform();
        self.gpu
            .queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera_uniform]));

        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        let stats = self.overlay_stats();
        let (egui_primitives, egui_textures_delta, overlay_actions) =
            self.overlay.prepare(&self.window, &self.clock, &stats);
        if overlay_actions.advance {
            // The Advance button is an equal-weight external trigger.
            log::info!("Advance requested from overlay");
            self.controller.progress_mut().set_can_advance(true);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Show Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.012,
                            g: 0.012,
                            b: 0.024,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            render_pass.set_pipeline(&self.pipeline.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            let mut last_bound: Option<&'static str> = None;
            for draw in &self.mesh.draw_calls {
                // Missing textures degrade to the white pixel.
                let texture = self
                    .textures
                    .get(draw.texture_key)
                    .or_else(|| self.textures.get(WHITE_TEXTURE));
                let Some(texture) = texture else { continue };
                if last_bound != Some(draw.texture_key) {
                    render_pass.set_bind_group(1, &texture.bind_group, &[]);
                    last_bound = Some(draw.texture_key);
                }
                render_pass.draw_indexed(
                    draw.index_start..(draw.index_start + draw.index_count),
                    0,
                    0..1,
                );
            }
        }

        self.overlay.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &egui_primitives,
            &egui_textures_delta,
            &screen_descriptor,
        );

        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();

            self.overlay
                .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
        }

        self.overlay.cleanup(&egui_textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

struct App {
    config: PlatformConfig,
    state: Option<ShowState>,
}

impl App {
    fn new() -> Self {
        Self {
            config: PlatformConfig::default(),
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = spe_platform::window::create_window(event_loop, &self.config);
        self.state = Some(ShowState::new(window));
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state.overlay.handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    state.camera.viewport = (w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            if !event.repeat {
                                match key_code {
                                    KeyCode::Escape => {
                                        event_loop.exit();
                                        return;
                                    }
                                    KeyCode::F3 => state.overlay.toggle(),
                                    KeyCode::Space => {
                                        // Discrete nudge forward; the input
                                        // state's own timer zeroes it again.
                                        state.input.tap(
                                            MotionIntent {
                                                forward: 1.0,
                                                ..MotionIntent::default()
                                            },
                                            state.clock.now,
                                        );
                                    }
                                    _ => {}
                                }
                            }
                            if let Some(motion_key) = map_key(key_code) {
                                state.input.key_down(motion_key);
                            }
                        }
                        ElementState::Released => {
                            if let Some(motion_key) = map_key(key_code) {
                                state.input.key_up(motion_key);
                            }
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                state.redraw();
            }

            _ => {}
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<PrimitiveVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Show Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Show Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn map_key(key_code: KeyCode) -> Option<MotionKey> {
    match key_code {
        KeyCode::ArrowUp | KeyCode::KeyW => Some(MotionKey::Forward),
        KeyCode::ArrowDown | KeyCode::KeyS => Some(MotionKey::Backward),
        KeyCode::ArrowLeft | KeyCode::KeyA => Some(MotionKey::TurnLeft),
        KeyCode::ArrowRight | KeyCode::KeyD => Some(MotionKey::TurnRight),
        KeyCode::KeyQ => Some(MotionKey::LookUp),
        KeyCode::KeyE => Some(MotionKey::LookDown),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Stagehand starting...");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app).expect("Event loop error");
}
