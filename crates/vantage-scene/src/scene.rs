use glam::{Mat4, Vec2, Vec3};
use vantage_3d::{
    FrameBackend, FrameGraph, GeometrySource, Mesh, MeshRef, Model, Pass, Phase, Program,
    RenderContext, Rgb, Target, shapes,
};
use vantage_camera::Camera;

use crate::error::{SceneError, SceneResult};
use crate::pick::{MAX_MODELS, decode_pick_pixel, encode_pick_id, ndc_to_pixel};
use crate::ray::intersect_plane;

const MARKER_SIZE: f32 = 1.0;
const MARKER_COLOR: Rgb = [1.0, 1.0, 1.0];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneOptions {
    pub background: [f32; 4],
    pub highlight: Rgb,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            background: [0.2, 0.2, 0.4, 1.0],
            highlight: [0.75, 0.6, 0.4],
        }
    }
}

/// Attached models, the camera and the per-frame picking state.
///
/// Models are drawn and assigned pick ids in attachment order. Callers may
/// move models between frames through [`Scene::model_mut`]; everything else
/// on a model is managed by [`Scene::update`].
pub struct Scene {
    camera: Camera,
    ctx: RenderContext,
    models: Vec<Model>,
    marker: Model,
    contact_points: Vec<Vec3>,
    pick_ndc: Option<Vec2>,
    width: u32,
    height: u32,
    options: SceneOptions,
    last_frame: FrameGraph,
}

impl Scene {
    pub fn new(width: u32, height: u32) -> SceneResult<Self> {
        Self::with_options(width, height, SceneOptions::default())
    }

    pub fn with_options(width: u32, height: u32, options: SceneOptions) -> SceneResult<Self> {
        let camera = Camera::new(width, height);
        let ctx = RenderContext::new(camera.projection());
        let marker = shapes::plane(MARKER_SIZE, MARKER_SIZE, Some(MARKER_COLOR))?;
        Ok(Self {
            camera,
            ctx,
            models: Vec::new(),
            marker,
            contact_points: Vec::new(),
            pick_ndc: None,
            width: width.max(1),
            height: height.max(1),
            options,
            last_frame: FrameGraph::new(),
        })
    }

    /// Appends `model` and returns its pick id.
    pub fn attach_model(&mut self, model: Model) -> SceneResult<usize> {
        if self.models.len() >= MAX_MODELS {
            return Err(SceneError::TooManyModels { limit: MAX_MODELS });
        }
        let index = self.models.len();
        log::debug!("attached {} as pick id {index}", model.name);
        self.models.push(model);
        Ok(index)
    }

    pub fn set_camera(&mut self, position: Vec3, look_at: Vec3) {
        self.camera.set(position, look_at);
    }

    /// Cursor position in NDC; values outside `[-1, 1]²` disable picking.
    pub fn set_pick_coordinates(&mut self, x: f32, y: f32) {
        self.pick_ndc = Some(Vec2::new(x, y));
    }

    pub fn clear_pick_coordinates(&mut self) {
        self.pick_ndc = None;
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn model(&self, index: usize) -> Option<&Model> {
        self.models.get(index)
    }

    pub fn model_mut(&mut self, index: usize) -> Option<&mut Model> {
        self.models.get_mut(index)
    }

    pub fn contact_points(&self) -> &[Vec3] {
        &self.contact_points
    }

    /// Index of the model whose surface is under the cursor this frame.
    pub fn picked(&self) -> Option<usize> {
        self.models.iter().position(|m| m.picked)
    }

    pub fn options(&self) -> &SceneOptions {
        &self.options
    }

    pub fn viewport_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Passes recorded by the most recent [`Scene::update`].
    pub fn last_frame(&self) -> &FrameGraph {
        &self.last_frame
    }

    /// Renders one frame: pick pass, pick resolution, color pass, contact markers.
    pub fn update(&mut self, backend: &mut dyn FrameBackend) -> SceneResult<()> {
        self.reset();
        self.ctx.model_view = self.camera.view();
        self.ctx.projection = self.camera.projection();

        let mut frame = FrameGraph::new();

        let pick = self.pick_pass()?;
        self.run_pass(&mut frame, pick, backend)?;

        self.cast_ray(backend)?;

        let color = self.color_pass()?;
        self.run_pass(&mut frame, color, backend)?;

        let contacts = self.contact_pass()?;
        self.run_pass(&mut frame, contacts, backend)?;

        self.last_frame = frame;
        Ok(())
    }

    fn reset(&mut self) {
        self.contact_points.clear();
        for model in &mut self.models {
            model.reset_pick();
        }
    }

    fn run_pass(
        &self,
        frame: &mut FrameGraph,
        pass: Pass,
        backend: &mut dyn FrameBackend,
    ) -> SceneResult<()> {
        frame.push(pass)?;
        if let Some(pass) = frame.last() {
            backend.execute(pass, self)?;
        }
        Ok(())
    }

    fn pick_pass(&mut self) -> SceneResult<Pass> {
        self.ctx.set_program(Program::Pick);
        let mut pass =
            self.ctx
                .begin_pass("pick_pass", Phase::Pick, Target::PickBuffer, Some([0.0; 4]))?;
        for (index, model) in self.models.iter().enumerate() {
            // attach_model caps the count, so every index fits in a u8.
            let id = u8::try_from(index).map_err(|_| SceneError::TooManyModels {
                limit: MAX_MODELS,
            })?;
            model.pick(&self.ctx, MeshRef::Model(index), encode_pick_id(id), &mut pass)?;
        }
        Ok(pass)
    }

    fn cast_ray(&mut self, backend: &mut dyn FrameBackend) -> SceneResult<()> {
        let Some(ndc) = self.pick_ndc else {
            return Ok(());
        };
        let Some((px, py)) = ndc_to_pixel(ndc, self.width, self.height) else {
            return Ok(());
        };
        let pixel = backend.read_pick_pixel(px, py)?;
        let Some(id) = decode_pick_pixel(pixel) else {
            return Ok(());
        };
        let ray = self.camera.ray(ndc);
        let Some(model) = self.models.get_mut(usize::from(id)) else {
            log::warn!("pick id {id} read back with {} models", self.models.len());
            return Ok(());
        };

        model.picked = true;
        match intersect_plane(&ray, &model.surface_plane()) {
            Some(point) => {
                log::trace!("cursor on {} (id {id}) at {point}", model.name);
                model.contact_point = Some(point);
                self.contact_points.push(point);
            }
            None => log::debug!("cursor ray parallel to surface of {}", model.name),
        }
        Ok(())
    }

    fn color_pass(&mut self) -> SceneResult<Pass> {
        self.ctx.set_program(Program::Shade);
        let mut pass = self.ctx.begin_pass(
            "color_pass",
            Phase::Color,
            Target::Viewport,
            Some(self.options.background),
        )?;
        for (index, model) in self.models.iter().enumerate() {
            model.render(
                &self.ctx,
                MeshRef::Model(index),
                self.options.highlight,
                &mut pass,
            )?;
        }
        Ok(pass)
    }

    fn contact_pass(&mut self) -> SceneResult<Pass> {
        self.ctx.set_program(Program::Contact);
        let mut pass =
            self.ctx
                .begin_pass("contact_pass", Phase::Contact, Target::Viewport, None)?;
        for point in &self.contact_points {
            self.marker.local_matrix = Mat4::from_translation(*point);
            self.marker
                .render(&self.ctx, MeshRef::Marker, MARKER_COLOR, &mut pass)?;
        }
        Ok(pass)
    }
}

impl GeometrySource for Scene {
    fn mesh(&self, mesh: MeshRef) -> Option<&Mesh> {
        match mesh {
            MeshRef::Model(index) => self.models.get(index).map(Model::mesh),
            MeshRef::Marker => Some(self.marker.mesh()),
        }
    }
}
