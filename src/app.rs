use crate::config::{CONFIG_FILE, ViewerConfig};
use egui::Sense;
use egui::load::SizedTexture;
use glam::{Vec2, Vec3};
use std::time::{Duration, Instant};
use vantage_camera::cursor_to_ndc;
use vantage_runtime::{Graphics, RcWindow, create_graphics};
use winit::{
    application::ApplicationHandler,
    event::{StartCause, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

enum State {
    Ready(ReadyState),
    Init(Option<EventLoopProxy<Graphics>>),
}

struct ReadyState {
    gfx: Graphics,
    overlay: Overlay,
}

/// egui plumbing: input translation, the wgpu painter, and the viewport
/// texture registered with it.
struct Overlay {
    ctx: egui::Context,
    winit: egui_winit::State,
    painter: egui_wgpu::Renderer,
    viewport: egui::TextureId,
}

impl Overlay {
    fn new(gfx: &Graphics) -> Self {
        let ctx = egui::Context::default();
        let winit =
            egui_winit::State::new(ctx.clone(), ctx.viewport_id(), gfx.window(), None, None, None);
        let mut painter = egui_wgpu::Renderer::new(
            gfx.device(),
            gfx.surface_config().format,
            egui_wgpu::RendererOptions::default(),
        );
        let viewport = painter.register_native_texture(
            gfx.device(),
            gfx.viewport_view(),
            wgpu::FilterMode::Linear,
        );
        Self {
            ctx,
            winit,
            painter,
            viewport,
        }
    }

    /// Uploads egui's textures and buffers, then paints `jobs` over `target`.
    fn paint(
        &mut self,
        gfx: &Graphics,
        target: &wgpu::TextureView,
        encoder: &mut wgpu::CommandEncoder,
        jobs: &[egui::ClippedPrimitive],
        textures: &egui::TexturesDelta,
        pixels_per_point: f32,
    ) {
        let (device, queue) = (gfx.device(), gfx.queue());
        for (id, delta) in &textures.set {
            self.painter.update_texture(device, queue, *id, delta);
        }
        for id in &textures.free {
            self.painter.free_texture(id);
        }

        let config = gfx.surface_config();
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [config.width, config.height],
            pixels_per_point,
        };
        self.painter.update_buffers(device, queue, encoder, jobs, &screen);

        let mut pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("overlay_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            })
            .forget_lifetime();
        self.painter.render(&mut pass, jobs, &screen);
    }
}

pub struct EditorUi {
    pub show_debug_panel: bool,
    pub quit_requested: bool,
    pub status: Option<String>,
}

impl EditorUi {
    pub fn new() -> Self {
        Self {
            show_debug_panel: true,
            quit_requested: false,
            status: None,
        }
    }
}

/// What the panels show about the scene, captured before the egui pass.
struct SceneSnapshot {
    models: Vec<(String, bool, Option<Vec3>)>,
    eye: Vec3,
    theta: f32,
    phi: f32,
    viewport: (u32, u32),
}

impl SceneSnapshot {
    fn of(gfx: &Graphics) -> Self {
        Self {
            models: gfx
                .scene()
                .models()
                .iter()
                .map(|m| (m.name.clone(), m.picked, m.contact_point))
                .collect(),
            eye: gfx.eye(),
            theta: gfx.theta(),
            phi: gfx.phi(),
            viewport: gfx.viewport_size(),
        }
    }
}

pub struct App {
    state: State,
    config: ViewerConfig,
    frame_time: Duration,
    render_target: Instant,
    ui: EditorUi,
}

impl App {
    pub fn new(event_loop: &EventLoop<Graphics>, config: ViewerConfig) -> Self {
        let fps = u64::from(config.window.fps.max(1));
        Self {
            state: State::Init(Some(event_loop.create_proxy())),
            config,
            frame_time: Duration::from_nanos(1_000_000_000 / fps),
            render_target: Instant::now(),
            ui: EditorUi::new(),
        }
    }

    fn draw(&mut self) {
        if let State::Ready(ready) = &mut self.state {
            Self::draw_editor(ready, &mut self.ui);
        }
    }

    fn draw_editor(ready: &mut ReadyState, ui_state: &mut EditorUi) {
        let raw_input = ready.overlay.winit.take_egui_input(ready.gfx.window());
        let viewport_tex_id = ready.overlay.viewport;
        let snapshot = SceneSnapshot::of(&ready.gfx);
        let (viewport_w, viewport_h) = (snapshot.viewport.0 as f32, snapshot.viewport.1 as f32);
        let mut cursor_ndc = None;

        let egui_ctx = ready.overlay.ctx.clone();
        let full_output = egui_ctx.run(raw_input, |ctx| {
            egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
                egui::MenuBar::new().ui(ui, |ui| {
                    ui.menu_button("File", |ui| {
                        if ui.button("Write default config").clicked() {
                            ui_state.status = Some(match ViewerConfig::write_default(CONFIG_FILE) {
                                Ok(()) => format!("Wrote {CONFIG_FILE}"),
                                Err(e) => {
                                    log::error!("{e}");
                                    format!("Failed: {e}")
                                }
                            });
                            ui.close();
                        }

                        ui.separator();

                        if ui.button("Quit").clicked() {
                            ui_state.quit_requested = true;
                            ui.close();
                        }
                    });

                    ui.menu_button("View", |ui| {
                        ui.checkbox(&mut ui_state.show_debug_panel, "Show viewport debug panel");
                    });

                    if let Some(status) = &ui_state.status {
                        ui.separator();
                        ui.label(status);
                    }
                });
            });
            egui::SidePanel::left("scene_panel")
                .resizable(true)
                .default_width(200.0)
                .show(ctx, |ui| {
                    ui.heading("Scene");
                    ui.separator();
                    for (index, (name, picked, _)) in snapshot.models.iter().enumerate() {
                        let marker = if *picked { "●" } else { " " };
                        ui.monospace(format!("{marker} {index:>3} {name}"));
                    }
                });
            egui::SidePanel::right("inspector_panel")
                .resizable(true)
                .default_width(260.0)
                .show(ctx, |ui| {
                    ui.heading("Inspector");
                    ui.separator();

                    match snapshot.models.iter().enumerate().find(|(_, m)| m.1) {
                        Some((index, (name, _, contact))) => {
                            ui.label(format!("Picked: {name} (id {index})"));
                            match contact {
                                Some(p) => {
                                    ui.monospace(format!("{:.3} {:.3} {:.3}", p.x, p.y, p.z))
                                }
                                None => ui.label("No contact point."),
                            };
                        }
                        None => {
                            ui.label("Nothing under the cursor.");
                        }
                    }
                });
            egui::TopBottomPanel::bottom("debug_panel")
                .resizable(true)
                .default_height(110.0)
                .show_animated(ctx, ui_state.show_debug_panel, |ui| {
                    ui.heading("Viewport Debug");
                    ui.separator();

                    ui.horizontal(|ui| {
                        ui.label("Camera eye:");
                        let eye = snapshot.eye;
                        ui.monospace(format!("{:.2} {:.2} {:.2}", eye.x, eye.y, eye.z));
                    });

                    ui.horizontal(|ui| {
                        ui.label("Theta / Phi:");
                        ui.monospace(format!("{:.3} / {:.3}", snapshot.theta, snapshot.phi));
                    });

                    ui.label("A/D and W/S orbit the camera.");
                });

            egui::CentralPanel::default().show(ctx, |ui| {
                let available = ui.available_size();

                if available.x > 0.0 && available.y > 0.0 && viewport_w > 0.0 && viewport_h > 0.0 {
                    let tex_aspect = viewport_w / viewport_h;
                    let panel_aspect = available.x / available.y;
                    let (w, h) = if panel_aspect > tex_aspect {
                        (available.y * tex_aspect, available.y)
                    } else {
                        (available.x, available.x / tex_aspect)
                    };

                    let sized = SizedTexture::new(viewport_tex_id, egui::vec2(w, h));
                    let image = egui::Image::from_texture(sized).sense(Sense::hover());
                    let response = ui.add(image);

                    if let Some(pos) = response.hover_pos() {
                        let rect = response.rect;
                        cursor_ndc = cursor_to_ndc(
                            Vec2::new(pos.x, pos.y),
                            Vec2::new(rect.min.x, rect.min.y),
                            Vec2::new(rect.width(), rect.height()),
                        );
                    }
                } else {
                    ui.label("Viewport area is too small.");
                }
            });
        });

        ready.gfx.set_cursor_ndc(cursor_ndc);

        let egui::FullOutput {
            platform_output,
            textures_delta,
            shapes,
            pixels_per_point,
            ..
        } = full_output;
        ready
            .overlay
            .winit
            .handle_platform_output(ready.gfx.window(), platform_output);
        let jobs = ready.overlay.ctx.tessellate(shapes, pixels_per_point);

        let overlay = &mut ready.overlay;
        let result = ready.gfx.draw(|gfx, target, encoder| {
            overlay.paint(gfx, target, encoder, &jobs, &textures_delta, pixels_per_point);
        });
        if let Err(e) = result {
            log::error!("frame failed: {e}");
        }
    }
}

impl ApplicationHandler<Graphics> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let State::Init(proxy) = &mut self.state {
            if let Some(proxy) = proxy.take() {
                let win_attr = Window::default_attributes().with_title(&self.config.window.title);
                let window: RcWindow = match event_loop.create_window(win_attr) {
                    Ok(window) => std::sync::Arc::new(window),
                    Err(e) => {
                        log::error!("failed to create window: {e}");
                        event_loop.exit();
                        return;
                    }
                };
                let settings = self.config.view_settings();
                if let Err(e) = pollster::block_on(create_graphics(window, proxy, settings)) {
                    log::error!("failed to start renderer: {e}");
                    event_loop.exit();
                }
            }
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, graphics: Graphics) {
        let overlay = Overlay::new(&graphics);
        graphics.request_redraw();
        self.state = State::Ready(ReadyState {
            gfx: graphics,
            overlay,
        });
    }

    fn new_events(&mut self, _event_loop: &ActiveEventLoop, _cause: StartCause) {
        if self.render_target <= Instant::now() {
            self.render_target += self.frame_time;
            if let State::Ready(ready) = &mut self.state {
                ready.gfx.request_redraw();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::Resized(size) => {
                if let State::Ready(ready) = &mut self.state {
                    ready.gfx.resize(size);
                }
            }
            WindowEvent::RedrawRequested => {
                self.draw();
                if self.ui.quit_requested {
                    event_loop.exit();
                    return;
                }
                let now = Instant::now();
                if self.render_target <= now {
                    self.render_target = now + self.frame_time;
                    if let State::Ready(ready) = &mut self.state {
                        ready.gfx.request_redraw();
                    }
                }
            }
            WindowEvent::CloseRequested => event_loop.exit(),
            other => {
                if let State::Ready(ready) = &mut self.state {
                    let response = ready.overlay.winit.on_window_event(ready.gfx.window(), &other);
                    if response.repaint {
                        ready.gfx.request_redraw();
                    }
                    if !response.consumed || matches!(other, WindowEvent::Focused(_)) {
                        ready.gfx.handle_window_event(&other);
                    }
                }
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.render_target));
    }
}
