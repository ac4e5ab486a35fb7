use std::path::Path;

use anyhow::Context;
use glam::{Mat4, Vec3};

use glimplify_engine::camera::FlyCamera;
use glimplify_engine::coords::Viewport;
use glimplify_engine::core::{App, AppControl, FrameCtx, InitCtx};
use glimplify_engine::render::{
    AttribType, ImageData, Program, ProgramSource, RenderContext, RenderCtx, Texture, Vertices,
};

use crate::config::DemoConfig;
use crate::cube::{self, Vertex};
use crate::input::InputContext;

const CUBE_WGSL: &str = include_str!("shaders/cube.wgsl");

const CLEAR: [f64; 4] = [0.2, 0.3, 0.3, 1.0];
const MIX_FACTOR: f32 = 0.2;
const CAMERA_START: Vec3 = Vec3::new(0.0, 0.0, 20.0);

/// GPU objects, created once the device exists.
struct Scene {
    program: Program,
    vertices: Vertices,
    textures: [Texture; 2],
    context: RenderContext,
    model: Mat4,
}

/// Textured cube with fly controls.
pub struct CubeApp {
    config: DemoConfig,
    camera: FlyCamera,
    input: InputContext,
    scene: Option<Scene>,
    gpu_errors: u64,
}

impl CubeApp {
    /// The camera aspect is taken from `viewport` and kept for the session.
    pub fn new(config: DemoConfig, viewport: Viewport) -> Self {
        let mut camera = FlyCamera::new(viewport);
        camera.move_to(CAMERA_START);

        Self {
            config,
            camera,
            input: InputContext::new(),
            scene: None,
            gpu_errors: 0,
        }
    }
}

impl Scene {
    fn new(rctx: &RenderCtx<'_>, config: &DemoConfig) -> anyhow::Result<Self> {
        let mut context = RenderContext::new();
        context.clear(CLEAR[0], CLEAR[1], CLEAR[2], CLEAR[3]);
        context.testing_depth(config.depth_test);
        if config.wireframe {
            context.wireframe_mode(true, rctx.features);
        }

        let mut program = Program::compile(rctx.device, ProgramSource::new("cube", CUBE_WGSL))
            .context("cube shader")?;
        program.set_uniform_f32("mix_factor", MIX_FACTOR);

        for (name, unit) in [("texture1", 0), ("texture2", 1)] {
            if program.texture_unit(name) != Some(unit) {
                anyhow::bail!("cube shader must bind '{name}' to texture unit {unit}");
            }
        }

        let mut vertices = Vertices::new(2, cube::STRIDE);
        vertices.allocate_vertices::<Vertex>(rctx.device, &cube::VERTICES);
        vertices.allocate_index(rctx.device, &cube::INDICES);
        vertices.format_vertices(0, AttribType::Float, 3)?;
        vertices.format_vertices(1, AttribType::Float, 2)?;

        let textures = [
            load_texture(rctx, 0, &config.texture1, [205, 133, 63, 255]),
            load_texture(rctx, 1, &config.texture2, [255, 215, 0, 255]),
        ];

        let mut scene = Self {
            program,
            vertices,
            textures,
            context,
            model: cube::model_matrix(),
        };

        // Build the pipeline now so shader/binding problems fail startup.
        scene.prepare(rctx, &Mat4::IDENTITY, &Mat4::IDENTITY)?;
        Ok(scene)
    }

    fn prepare(&mut self, rctx: &RenderCtx<'_>, view: &Mat4, projection: &Mat4) -> anyhow::Result<()> {
        self.program.set_uniform_mat4("model", &self.model);
        self.program.set_uniform_mat4("view", view);
        self.program.set_uniform_mat4("projection", projection);

        let state = self.context.state(rctx.surface_format);
        let [t1, t2] = &mut self.textures;
        self.program.prepare(
            rctx.device,
            rctx.queue,
            &state,
            self.vertices.layout(),
            &mut [t1, t2],
        )?;
        Ok(())
    }
}

/// Loads `path` into texture `unit`, or a checkerboard tinted `tint` when it can't be read.
fn load_texture(rctx: &RenderCtx<'_>, unit: u32, path: &Path, tint: [u8; 4]) -> Texture {
    let mut texture = Texture::new(unit);
    texture.wrap_mode(wgpu::AddressMode::Repeat, wgpu::AddressMode::Repeat);
    texture.filter_mode(wgpu::FilterMode::Linear, wgpu::FilterMode::Linear);

    if let Err(e) = texture.load(rctx.device, rctx.queue, path, true, true) {
        log::warn!("{e}; using a checkerboard for unit {unit}");
        let fallback = ImageData::checkerboard(256, 32, tint, [40, 40, 40, 255]);
        texture.upload(rctx.device, rctx.queue, &fallback, true);
    }
    texture
}

impl App for CubeApp {
    fn on_init(&mut self, ctx: &mut InitCtx<'_, '_>) -> anyhow::Result<()> {
        let info = ctx.gpu.adapter_info();
        log::info!("renderer: {} ({:?})", info.name, info.backend);

        let scene = Scene::new(&ctx.render_ctx(), &self.config)?;
        self.scene = Some(scene);
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let control = self
            .input
            .update(&mut self.camera, ctx.input, ctx.input_frame, ctx.time.dt);
        if control == AppControl::Exit {
            return AppControl::Exit;
        }

        let Some(scene) = self.scene.as_mut() else {
            return AppControl::Continue;
        };
        let view = self.camera.view_matrix();
        let projection = self.camera.projection_matrix();

        let control = ctx.render(|rctx, target| {
            if let Err(e) = scene.prepare(rctx, &view, &projection) {
                log::error!("{e:#}");
                return;
            }

            let mut pass = scene.context.begin_pass(rctx, target);
            scene.program.bind(&mut pass);
            scene.vertices.bind(&mut pass);
            scene.vertices.draw_arrays(&mut pass, 0, scene.vertices.vertex_count());
        });

        if let Some(debug) = ctx.gpu.debug_output() {
            let errors = debug.error_count();
            if errors > self.gpu_errors {
                log::warn!("{} new GPU error(s) this frame", errors - self.gpu_errors);
                self.gpu_errors = errors;
            }
        }
        control
    }
}
