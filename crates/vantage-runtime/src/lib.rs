use glam::{Mat4, Vec2, Vec3};
use thiserror::Error;
use winit::{dpi::PhysicalSize, event::WindowEvent, event_loop::EventLoopProxy, window::Window};

use wgpu::{
    Adapter, CommandEncoderDescriptor, Device, ExperimentalFeatures, Features, Instance, Limits,
    MemoryHints, PowerPreference, Queue, RequestAdapterOptions, Surface, SurfaceConfiguration,
    SurfaceError, TextureView, TextureViewDescriptor,
};

use vantage_3d::{RenderError, Renderer3D, Rgb, shapes};
use vantage_camera::{InputState, OrbitController};
use vantage_scene::{Scene, SceneError, SceneOptions};

pub type RcWindow = std::sync::Arc<Window>;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("could not get a GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to get device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("surface is not supported by the adapter")]
    SurfaceConfig,

    #[error("surface unavailable: {0}")]
    Frame(#[from] SurfaceError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Startup parameters for the viewer, usually read from the config file.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewSettings {
    pub background: [f32; 4],
    pub highlight: Rgb,
    pub theta: f32,
    pub phi: f32,
    pub radius: f32,
    pub step: f32,
}

impl Default for ViewSettings {
    fn default() -> Self {
        let scene = SceneOptions::default();
        Self {
            background: scene.background,
            highlight: scene.highlight,
            theta: 0.35,
            phi: 0.10,
            radius: 25.0,
            step: 0.05,
        }
    }
}

/// The tapered platform with a bridge laid across it two units up.
pub fn build_demo_scene(scene: &mut Scene) -> Result<(), RuntimeError> {
    scene.attach_model(shapes::platform()?)?;
    let bridge = shapes::box_model(20.0, 6.0, 0.2)?
        .with_transform(Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)));
    scene.attach_model(bridge)?;
    Ok(())
}

pub async fn create_graphics(
    window: RcWindow,
    proxy: EventLoopProxy<Graphics>,
    settings: ViewSettings,
) -> Result<(), RuntimeError> {
    let instance = Instance::default();
    let surface = instance.create_surface(std::sync::Arc::clone(&window))?;

    let adapter = instance
        .request_adapter(&RequestAdapterOptions {
            power_preference: PowerPreference::default(),
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        })
        .await?;
    let info = adapter.get_info();
    log::info!("adapter: {} ({:?})", info.name, info.backend);

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: Features::empty(),
            required_limits: Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits()),
            memory_hints: MemoryHints::Performance,
            trace: Default::default(),
            experimental_features: ExperimentalFeatures::disabled(),
        })
        .await?;

    let size = window.inner_size();
    let width = size.width.max(1);
    let height = size.height.max(1);

    let surface_config = surface
        .get_default_config(&adapter, width, height)
        .ok_or(RuntimeError::SurfaceConfig)?;
    surface.configure(&device, &surface_config);
    log::info!(
        "surface {}x{} {:?}",
        surface_config.width,
        surface_config.height,
        surface_config.format
    );

    // The viewport keeps the window's initial size for the whole session so the
    // projection and the pick buffer stay in step.
    let renderer = Renderer3D::new(&device, &queue, surface_config.format, width, height)?;

    let mut scene = Scene::with_options(
        width,
        height,
        SceneOptions {
            background: settings.background,
            highlight: settings.highlight,
        },
    )?;
    build_demo_scene(&mut scene)?;

    let orbit = OrbitController::new(settings.theta, settings.phi, settings.radius, settings.step);
    follow_orbit(&mut scene, &orbit);

    let gfx = Graphics {
        window,
        instance,
        surface,
        surface_config,
        adapter,
        device,
        queue,
        renderer,
        scene,
        orbit,
        input: InputState::default(),
    };

    let _ = proxy.send_event(gfx);
    Ok(())
}

fn follow_orbit(scene: &mut Scene, orbit: &OrbitController) {
    scene.set_camera(orbit.eye(), Vec3::ZERO);
}

#[allow(dead_code)]
pub struct Graphics {
    pub(crate) window: RcWindow,
    instance: Instance,
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    adapter: Adapter,
    device: Device,
    queue: Queue,
    renderer: Renderer3D,
    scene: Scene,
    orbit: OrbitController,
    input: InputState,
}

impl Graphics {
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    pub fn viewport_view(&self) -> &TextureView {
        self.renderer.viewport_view()
    }

    pub fn viewport_size(&self) -> (u32, u32) {
        self.renderer.size()
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.surface_config.width = new_size.width.max(1);
        self.surface_config.height = new_size.height.max(1);
        self.surface.configure(&self.device, &self.surface_config);
    }

    /// Runs one scene frame into the viewport, then lets `overlay` draw onto
    /// the swapchain image before presenting.
    pub fn draw<F>(&mut self, overlay: F) -> Result<(), RuntimeError>
    where
        F: FnOnce(&mut Self, &TextureView, &mut wgpu::CommandEncoder),
    {
        self.orbit.update(&self.input);
        follow_orbit(&mut self.scene, &self.orbit);
        match self.input.cursor_ndc {
            Some(ndc) => self.scene.set_pick_coordinates(ndc.x, ndc.y),
            None => self.scene.clear_pick_coordinates(),
        }
        self.scene.update(&mut self.renderer)?;

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                log::debug!("surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                return Ok(());
            }
            Err(SurfaceError::Timeout) => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        let swap_view = frame.texture.create_view(&TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor { label: None });
        overlay(self, &swap_view, &mut encoder);
        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        self.input.handle_window_event(event);
    }

    /// Cursor over the viewport image in NDC, or `None` when it is elsewhere.
    pub fn set_cursor_ndc(&mut self, ndc: Option<Vec2>) {
        self.input.cursor_ndc = ndc;
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn surface_config(&self) -> &SurfaceConfiguration {
        &self.surface_config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn eye(&self) -> Vec3 {
        self.scene.camera().position
    }

    pub fn theta(&self) -> f32 {
        self.orbit.theta
    }

    pub fn phi(&self) -> f32 {
        self.orbit.phi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_scene_has_platform_then_bridge() {
        let mut scene = Scene::new(640, 480).unwrap();
        build_demo_scene(&mut scene).unwrap();
        let names: Vec<_> = scene.models().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["platform", "box"]);
        assert_eq!(
            scene.model(1).unwrap().surface_plane().origin,
            Vec3::new(0.0, 2.0, 0.0)
        );
    }

    #[test]
    fn default_settings_match_scene_defaults() {
        let settings = ViewSettings::default();
        let scene = SceneOptions::default();
        assert_eq!(settings.background, scene.background);
        assert_eq!(settings.highlight, scene.highlight);
    }
}
