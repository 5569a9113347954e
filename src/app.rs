use std::sync::Arc;

use log::{error, info, warn};
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::config::{AppConfig, ConfigError};
use crate::frame::FrameContext;
use crate::geometry::{GeometryError, MeshData, ModelLoader};
use crate::gpu::{GpuContext, GpuError};
use crate::mesh::Mesh;
use crate::renderer::Renderer;
use crate::texture::Texture;

/// Skybox sphere resolution.
const SKY_SEGMENTS: u32 = 16;
const SKY_RINGS: u32 = 8;

/// Anything that stops the demo from starting or keeps it from running.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error("failed to import model: {0}")]
    Model(#[from] GeometryError),
    #[error("failed to load texture: {0}")]
    Texture(#[from] image::ImageError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Opens the window and renders until it is closed.
///
/// # Example
/// ```no_run
/// skylit::run(skylit::AppConfig::new().title("Skylit").size(1280, 720).model("bunny.stl"))?;
/// # Ok::<(), skylit::AppError>(())
/// ```
pub fn run(config: AppConfig) -> Result<(), AppError> {
    config.validate()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = SkylitApp::Pending { config };
    event_loop.run_app(&mut app)?;

    match app {
        SkylitApp::Failed(e) => Err(e),
        _ => Ok(()),
    }
}

/// The monitor refresh rate in Hz, or `fallback` when the monitor reports
/// nothing or zero.
fn refresh_rate(millihertz: Option<u32>, fallback: f32) -> f32 {
    millihertz
        .filter(|&mhz| mhz > 0)
        .map(|mhz| mhz as f32 / 1000.0)
        .unwrap_or(fallback)
}

struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: Renderer,
    frame: FrameContext,
    fallback_fps: f32,
}

enum SkylitApp {
    Pending { config: AppConfig },
    Running(Box<Running>),
    Failed(AppError),
}

impl Running {
    fn start(event_loop: &ActiveEventLoop, config: &AppConfig) -> Result<Self, AppError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone())?;

        let sky_data = MeshData::uv_sphere(SKY_SEGMENTS, SKY_RINGS, 1.0);
        let sky_mesh = Mesh::new(&gpu, &sky_data, "Skybox");

        let model_mesh = match &config.model_path {
            Some(path) => {
                let data = ModelLoader::from_file(path).spherical_uvs().load()?;
                Some(Mesh::new(&gpu, &data, "Model"))
            }
            None => {
                info!("no model configured, drawing sky only");
                None
            }
        };

        let texture = match &config.texture_path {
            Some(path) => Texture::from_file(&gpu, path)?,
            None => Texture::white(&gpu),
        };

        let renderer = Renderer::new(&gpu, sky_mesh, model_mesh, &texture);

        let mut frame = config.frame_context();
        frame.set_aspect_ratio(gpu.aspect());

        window.request_redraw();

        Ok(Self {
            window,
            gpu,
            renderer,
            frame,
            fallback_fps: config.frames_per_second,
        })
    }

    fn frames_per_second(&self) -> f32 {
        let reported = self
            .window
            .current_monitor()
            .and_then(|monitor| monitor.refresh_rate_millihertz());
        refresh_rate(reported, self.fallback_fps)
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let fps = self.frames_per_second();
        self.frame.advance(fps);
        let uniforms = self.frame.assemble();

        match self.renderer.render(&self.gpu, &uniforms) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("surface lost or outdated, reconfiguring");
                self.gpu.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU out of memory, exiting");
                event_loop.exit();
                return;
            }
            Err(e) => warn!("skipping frame: {}", e),
        }

        self.window.request_redraw();
    }
}

impl ApplicationHandler for SkylitApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let SkylitApp::Pending { config } = self else {
            return;
        };

        *self = match Running::start(event_loop, config) {
            Ok(running) => SkylitApp::Running(Box::new(running)),
            Err(e) => {
                error!("start-up failed: {}", e);
                event_loop.exit();
                SkylitApp::Failed(e)
            }
        };
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let SkylitApp::Running(running) = self else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                running.gpu.resize(size.width, size.height);
                if size.width > 0 && size.height > 0 {
                    running.frame.set_aspect_ratio(running.gpu.aspect());
                }
            }
            WindowEvent::RedrawRequested => running.redraw(event_loop),
            _ => {}
        }
    }
}
