//! Stage overlay rendered via egui on top of the show.
//!
//! Integration pattern: egui requires a three-phase render split because
//! `egui_wgpu::Renderer::render()` needs a `RenderPass<'static>`, while
//! `begin_render_pass` borrows the encoder. The phases are:
//!
//!   1. `prepare()` -- run egui UI logic, produce tessellated primitives
//!   2. `upload()`  -- upload textures and update GPU buffers (borrows encoder mutably)
//!   3. `paint()`   -- render into a new render pass with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui no longer references
//!
//! Besides diagnostics, the overlay carries two presentation surfaces: the
//! stage-progress indicator (dots for each stage, filled when visited) and
//! the Advance button, a discrete external trigger that requests a stage
//! advance with the same weight as a timeline's own exit condition.

use spe_core::time::Clock;
use winit::window::Window;

#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    /// Index of the active stage within the enumeration.
    pub stage_index: usize,
    pub stage_count: usize,
    /// Stage label (e.g. "Threshold"), or a degraded-mode marker.
    pub stage_label: String,
    /// Visited flag per stage, in enumeration order.
    pub visited: Vec<bool>,
    /// Active timeline phase label, empty when no scene is installed.
    pub phase_label: String,
    pub can_advance: bool,
    pub guard_engaged: bool,
    pub input_enabled: bool,
    pub primitive_count: u32,
    pub draw_calls: u32,
}

#[derive(Debug, Clone, Default)]
pub struct OverlayActions {
    /// User clicked Advance: request a stage advance directly.
    pub advance: bool,
}

pub struct StageOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub visible: bool,
}

impl StageOverlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            visible: true,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Stage overlay: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        clock: &Clock,
        stats: &OverlayStats,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        OverlayActions,
    ) {
        let mut actions = OverlayActions::default();
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if self.visible {
                egui::Window::new("Stage")
                    .default_pos([10.0, 10.0])
                    .show(ctx, |ui| {
                        // Progress indicator: one dot per stage.
                        ui.horizontal(|ui| {
                            for (index, &visited) in stats.visited.iter().enumerate() {
                                let dot = if index == stats.stage_index {
                                    "◉"
                                } else if visited {
                                    "●"
                                } else {
                                    "○"
                                };
                                ui.label(dot);
                            }
                        });
                        ui.label(format!(
                            "Stage {}/{}: {}",
                            stats.stage_index + 1,
                            stats.stage_count,
                            stats.stage_label
                        ));
                        if !stats.phase_label.is_empty() {
                            ui.label(format!("Phase: {}", stats.phase_label));
                        }

                        ui.separator();
                        ui.label(format!("FPS: {:.1}", clock.smoothed_fps));
                        ui.label(format!(
                            "Frame time: {:.2} ms",
                            clock.smoothed_frame_time_ms
                        ));
                        ui.label(format!("Primitives: {}", stats.primitive_count));
                        ui.label(format!("Draw calls: {}", stats.draw_calls));

                        ui.separator();
                        ui.label(format!(
                            "Advance flag: {}  Guard: {}  Input: {}",
                            if stats.can_advance { "set" } else { "clear" },
                            if stats.guard_engaged { "engaged" } else { "clear" },
                            if stats.input_enabled { "on" } else { "off" },
                        ));
                        if ui.button("Advance").clicked() {
                            actions.advance = true;
                        }
                    });
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    /// Render into an existing render pass. Call after `upload()`.
    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    /// Free textures that egui no longer needs. Call after rendering.
    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
