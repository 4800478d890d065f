use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use vantage_assets::StaticScene;
use vantage_camera::CameraManager;
use vantage_common::EngineConfig;
use vantage_input::{Action, InputState};
use vantage_render::{RenderBackend, RenderError};
use vantage_render_wgpu::{WgpuBackend, WgpuSettings};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "vantage-desktop", about = "Vantage desktop viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Engine configuration (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Map to load at startup (JSON)
    #[arg(long)]
    map: Option<PathBuf>,
}

fn action_for(key: KeyCode) -> Option<Action> {
    match key {
        KeyCode::KeyW => Some(Action::MoveForward),
        KeyCode::KeyS => Some(Action::MoveBackward),
        KeyCode::KeyA => Some(Action::MoveLeft),
        KeyCode::KeyD => Some(Action::MoveRight),
        KeyCode::Space => Some(Action::MoveUp),
        KeyCode::ControlLeft => Some(Action::MoveDown),
        KeyCode::ShiftLeft => Some(Action::Sprint),
        _ => None,
    }
}

/// Application state.
struct AppState {
    config: EngineConfig,
    camera: CameraManager,
    input: InputState,
    scene: StaticScene,
    map_path: Option<PathBuf>,
    mouse_captured: bool,
    last_frame: Instant,
    aspect: f32,
}

impl AppState {
    fn new(config: EngineConfig, map_path: Option<PathBuf>) -> Self {
        let camera = CameraManager::new(&config.camera, &config.floating_origin);
        let aspect = config.window.width as f32 / config.window.height.max(1) as f32;
        Self {
            config,
            camera,
            input: InputState::new(),
            scene: StaticScene::new(),
            map_path,
            mouse_captured: false,
            last_frame: Instant::now(),
            aspect,
        }
    }

    fn load_map(&mut self, backend: &mut WgpuBackend) {
        let Some(path) = self.map_path.clone() else {
            return;
        };
        match self.scene.load_map_file(backend, &path) {
            Ok(_) => {
                if let Some(start) = self.scene.player_start().copied() {
                    self.camera.teleport(start.position());
                    self.camera.set_angles(start.yaw, 0.0);
                }
            }
            Err(e) => tracing::error!("failed to load map {}: {e}", path.display()),
        }
    }

    fn update(&mut self, dt: f32) {
        let look = self.input.take_mouse_delta();
        self.camera.update(dt, &self.input, look.x, look.y);

        if let Some(delta) = self
            .camera
            .update_floating_origin(self.camera.camera_position())
        {
            tracing::debug!(?delta, "scene rebased");
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool, backend: &mut WgpuBackend) {
        if let Some(action) = action_for(key) {
            self.input.set(action, pressed);
        }

        if !pressed {
            return;
        }

        match key {
            KeyCode::F2 => {
                let mode = self.camera.precision().toggled();
                self.camera.set_precision(mode);
            }
            KeyCode::F5 => self.load_map(backend),
            _ => {}
        }
    }

    fn render(&mut self, backend: &mut WgpuBackend) {
        backend.set_view_matrix(self.camera.local_view_matrix());
        backend.set_projection_matrix(self.camera.projection_matrix(self.aspect));

        match backend.begin_frame() {
            Ok(()) => {}
            Err(RenderError::Surface(reason)) => {
                tracing::debug!("frame skipped: {reason}");
                return;
            }
            Err(e) => {
                tracing::error!("begin_frame failed: {e}");
                return;
            }
        }
        if let Err(e) = self.scene.draw(backend, self.camera.world_origin()) {
            tracing::warn!("scene draw failed: {e}");
        }
        if let Err(e) = backend.end_frame() {
            tracing::error!("end_frame failed: {e}");
        }
    }
}

struct GpuApp {
    state: AppState,
    window: Option<Arc<Window>>,
    backend: WgpuBackend,
}

impl GpuApp {
    fn new(config: EngineConfig, map_path: Option<PathBuf>) -> Self {
        let backend = WgpuBackend::new(WgpuSettings::from_config(&config.render));
        Self {
            state: AppState::new(config, map_path),
            window: None,
            backend,
        }
    }

    fn set_mouse_captured(&mut self, captured: bool) {
        self.state.mouse_captured = captured;
        if let Some(window) = &self.window {
            window.set_cursor_visible(!captured);
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_config = &self.state.config.window;
        let attrs = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(PhysicalSize::new(window_config.width, window_config.height));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                tracing::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        if let Err(e) = self
            .backend
            .init(window.clone().into(), size.width, size.height)
        {
            tracing::error!("no usable render backend: {e}");
            event_loop.exit();
            return;
        }
        if let Some((width, height)) = self.backend.surface_size() {
            tracing::info!(width, height, "surface configured");
            self.state.aspect = width as f32 / height as f32;
        }
        self.state.load_map(&mut self.backend);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.state.scene.unload(&mut self.backend);
                self.backend.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                let (width, height) = (new_size.width.max(1), new_size.height.max(1));
                self.backend.resize(width, height);
                self.state.aspect = width as f32 / height as f32;
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                let pressed = key_state == ElementState::Pressed;
                if pressed && key == KeyCode::Escape {
                    self.set_mouse_captured(false);
                }
                self.state.handle_key(key, pressed, &mut self.backend);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state: btn_state,
                ..
            } => {
                self.set_mouse_captured(btn_state == ElementState::Pressed);
            }
            WindowEvent::Focused(false) => {
                self.state.input.clear();
                self.set_mouse_captured(false);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
                self.state.last_frame = now;
                self.state.update(dt);
                self.state.render(&mut self.backend);

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.state.mouse_captured {
                self.state
                    .input
                    .add_mouse_delta(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("vantage-desktop starting");
    let config = EngineConfig::load_or_default(cli.config.as_deref())?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(config, cli.map);
    event_loop.run_app(&mut app)?;

    Ok(())
}
