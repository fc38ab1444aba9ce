//! Application event loop.
//!
//! The window and every GPU resource are created once the event loop resumes.
//! Each redraw then:
//! 1. measures the time since the previous frame
//! 2. moves the camera from the held keys
//! 3. plans the frame from the layout, the camera and the loaded textures
//! 4. renders and presents the plan, reconfiguring a lost surface
//! 5. requests the next redraw

use std::sync::Arc;

use anyhow::anyhow;
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    camera::{Camera, CameraController, CameraSettings, Projection},
    context::Context,
    frame::FrameRenderer,
    render::{FrameInputs, plan_frame},
    resources::SceneResources,
    scene::{AssetPaths, SceneLayout},
};

pub const WINDOW_TITLE: &str = "Medieval Scene";

/// Everything that exists only while a window is open.
#[derive(Debug)]
struct AppState {
    ctx: Context,
    resources: SceneResources,
    renderer: FrameRenderer,
}

impl AppState {
    async fn new(window: Arc<Window>, assets: &AssetPaths) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        let resources = SceneResources::load(&ctx.device, &ctx.queue, assets);
        let renderer = FrameRenderer::new(&ctx, &resources);
        Ok(Self {
            ctx,
            resources,
            renderer,
        })
    }
}

pub struct App {
    assets: AssetPaths,
    layout: SceneLayout,
    viewport: [u32; 2],
    camera: Camera,
    projection: Projection,
    controller: CameraController,
    state: Option<AppState>,
    last_time: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(assets: AssetPaths, layout: SceneLayout, settings: &CameraSettings) -> Self {
        Self {
            assets,
            layout,
            viewport: settings.viewport,
            camera: settings.camera(),
            projection: settings.projection(),
            controller: settings.controller(),
            state: None,
            last_time: Instant::now(),
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn redraw(&mut self) {
        let Some(state) = &mut self.state else {
            return;
        };

        let dt = self.last_time.elapsed();
        self.last_time = Instant::now();
        self.controller.update(&mut self.camera, dt);

        if state.ctx.is_surface_configured() {
            let plan = plan_frame(
                &FrameInputs {
                    layout: &self.layout,
                    textures: &state.resources.handles,
                    camera: &self.camera,
                    projection: self.projection.calc_matrix(),
                },
                |model| state.resources.batch_count(model),
            );

            match state.renderer.render(&state.ctx, &plan, &state.resources) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    let size = state.ctx.window().inner_size();
                    state.ctx.resize(size.width, size.height);
                }
                Err(e) => log::error!("Unable to render {e}"),
            }
        }

        state.ctx.window().request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let [width, height] = self.viewport;
        let window_attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(width, height));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, anyhow!("creating the window: {e}")),
        };

        match futures::executor::block_on(AppState::new(window, &self.assets)) {
            Ok(state) => {
                state.ctx.window().request_redraw();
                self.state = Some(state);
                self.last_time = Instant::now();
            }
            Err(e) => self.fail(event_loop, e.context("initialising the renderer")),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        self.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.ctx.resize(size.width, size.height),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

/// Opens the window and runs until it is closed.
///
/// Returns the error that stopped start-up, if any. Missing assets are not
/// errors: they are logged and rendered with fallbacks.
pub fn run(assets: AssetPaths, layout: SceneLayout, camera: CameraSettings) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };
    log::info!("Loading assets from {}", assets.root().display());

    let event_loop = EventLoop::new()?;
    let mut app = App::new(assets, layout, &camera);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
