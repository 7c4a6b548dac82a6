use std::any::Any;
use std::env;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec2;
use log::{info, warn};
use pollster::block_on;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use diorama::app::{build_scene, map_key, map_mouse_button, wheel_delta, Session};
use diorama::{AppConfig, KeyCode, NamedKey, Renderer};

/// Frame step used when advancing scenes without a window.
const HEADLESS_STEP: f32 = 1.0 / 60.0;

/// Longest frame the animation will integrate in one go.
const MAX_FRAME: f32 = 0.1;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let mut config = match AppConfig::load_from(&options.config_dir) {
        Ok(config) => config,
        Err(err) => {
            warn!("ignoring invalid configuration: {err:?}");
            AppConfig::default()
        }
    };
    if let Some(seed) = options.seed {
        config.solar.seed = Some(seed);
    }
    if let Some(speed) = options.speed {
        config.solar.initial_speed = speed;
    }

    let scene = build_scene(&options.scene, &config)?;
    if let Some(dir) = &options.export_textures {
        let written = scene
            .graph()
            .textures
            .export_png(dir)
            .with_context(|| format!("failed to export textures to {}", dir.display()))?;
        println!("Exported {} textures to {}", written.len(), dir.display());
    }

    let mut session = Session::new(scene, &config);
    apply_scripted_input(&mut session, &options)?;

    if options.summary_only {
        run_headless(session, options.frames);
        Ok(())
    } else {
        run_interactive(session, &config, options.frames)
    }
}

fn apply_scripted_input(session: &mut Session, options: &CliOptions) -> Result<()> {
    for name in &options.keys {
        let key = KeyCode::from_name(name).ok_or_else(|| anyhow!("Unknown key: {name}"))?;
        if !session.key_down(key) {
            info!("key {name} did nothing in this scene");
        }
        session.key_up(key);
    }
    for name in &options.clicks {
        if !session.click_named(name) {
            warn!("click target {name} not found");
            println!("No visible object named '{name}'");
        }
    }
    Ok(())
}

fn run_headless(mut session: Session, frames: u32) {
    for _ in 0..frames {
        session.step(HEADLESS_STEP);
    }
    print_report(&session);
}

fn print_report(session: &Session) {
    for line in session.report() {
        println!("{line}");
    }
}

fn run_interactive(session: Session, config: &AppConfig, frames: u32) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop = match event_loop {
        Ok(Ok(event_loop)) => event_loop,
        Ok(Err(err)) => {
            return fall_back(session, frames, WindowInitError::from_error("event loop", err))
        }
        Err(panic) => {
            return fall_back(session, frames, WindowInitError::from_panic("event loop", panic))
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        session,
        title: config.window.title.clone(),
        size: LogicalSize::new(config.window.width, config.window.height),
        renderer: None,
        shown_title: String::new(),
        last_frame: Instant::now(),
        error: None,
    };
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;

    match app.error.take() {
        Some(err) => match err.downcast::<WindowInitError>() {
            Ok(init) => fall_back(app.session, frames, init),
            Err(err) => Err(err),
        },
        None => {
            print_report(&app.session);
            Ok(())
        }
    }
}

fn fall_back(session: Session, frames: u32, err: WindowInitError) -> Result<()> {
    eprintln!(
        "{err}. Falling back to --summary-only mode (set DISPLAY or install a GPU driver to enable rendering)."
    );
    run_headless(session, frames);
    Ok(())
}

struct App {
    session: Session,
    title: String,
    size: LogicalSize<u32>,
    renderer: Option<Renderer>,
    shown_title: String,
    last_frame: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    fn create_renderer(&self, event_loop: &ActiveEventLoop) -> Result<Renderer> {
        let attributes = Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(self.size);
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|err| WindowInitError::from_error("window", err))?,
        );
        let renderer = block_on(Renderer::new(window))
            .map_err(|err| WindowInitError::from_error("renderer", format!("{err:#}")))?;
        Ok(renderer)
    }

    fn redraw(&mut self) -> Result<()> {
        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(());
        };
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(MAX_FRAME);
        self.last_frame = now;
        self.session.step(dt);

        let title = self.session.title(&self.title);
        if title != self.shown_title {
            renderer.window().set_title(&title);
            self.shown_title = title;
        }

        let scene = self.session.scene();
        match renderer.render(scene.graph(), self.session.camera(), scene.clear_color()) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                renderer.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(anyhow!("GPU is out of memory"));
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("Surface timeout; retrying next frame");
            }
            Err(err) => {
                warn!("Skipping frame: {err}");
            }
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }
        match self.create_renderer(event_loop) {
            Ok(renderer) => {
                let size = renderer.size();
                self.session.resize(size.width, size.height);
                self.renderer = Some(renderer);
                self.last_frame = Instant::now();
            }
            Err(err) => {
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        if window_id != renderer.window_id() {
            return;
        }
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                renderer.resize(size);
                self.session.resize(size.width, size.height);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let Some(key) = map_key(&event.logical_key) else {
                    return;
                };
                match event.state {
                    ElementState::Pressed if key == KeyCode::Named(NamedKey::Escape) => {
                        event_loop.exit();
                    }
                    ElementState::Pressed => {
                        self.session.key_down(key);
                    }
                    ElementState::Released => self.session.key_up(key),
                }
            }
            WindowEvent::Focused(false) => self.session.focus_lost(),
            WindowEvent::CursorMoved { position, .. } => {
                self.session
                    .pointer_moved(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = map_mouse_button(button);
                match state {
                    ElementState::Pressed => self.session.button_down(button),
                    ElementState::Released => self.session.button_up(button),
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.session.scroll(wheel_delta(delta));
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw() {
                    self.error = Some(err);
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(renderer) = &self.renderer {
            renderer.window().request_redraw();
        }
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

const USAGE: &str = "Usage: diorama [solar|house] [--summary-only] [--frames N] [--seed N] \
[--speed X] [--click NAME]... [--key NAME]... [--export-textures DIR] [--config DIR]";

struct CliOptions {
    scene: String,
    summary_only: bool,
    frames: u32,
    seed: Option<u32>,
    speed: Option<f32>,
    clicks: Vec<String>,
    keys: Vec<String>,
    export_textures: Option<PathBuf>,
    config_dir: PathBuf,
}

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self {
            scene: "solar".to_string(),
            summary_only: false,
            frames: 1,
            seed: None,
            speed: None,
            clicks: Vec::new(),
            keys: Vec::new(),
            export_textures: None,
            config_dir: PathBuf::from("config"),
        };
        let mut scene_given = false;
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("{flag} expects a value\n{USAGE}"))
            };
            match arg.as_str() {
                "--summary-only" => options.summary_only = true,
                "--frames" => {
                    options.frames = value("--frames")?
                        .parse()
                        .context("--frames expects a whole number")?;
                }
                "--seed" => {
                    options.seed = Some(
                        value("--seed")?
                            .parse()
                            .context("--seed expects a whole number")?,
                    );
                }
                "--speed" => {
                    let speed: f32 = value("--speed")?
                        .parse()
                        .context("--speed expects a number")?;
                    if !speed.is_finite() {
                        bail!("--speed expects a finite number, got {speed}\n{USAGE}");
                    }
                    options.speed = Some(speed);
                }
                "--click" => options.clicks.push(value("--click")?),
                "--key" => options.keys.push(value("--key")?),
                "--export-textures" => {
                    options.export_textures = Some(PathBuf::from(value("--export-textures")?));
                }
                "--config" => options.config_dir = PathBuf::from(value("--config")?),
                "-h" | "--help" => bail!("{USAGE}"),
                other if !other.starts_with('-') && !scene_given => {
                    options.scene = other.to_string();
                    scene_given = true;
                }
                other => bail!("Unknown argument: {other}\n{USAGE}"),
            }
        }
        Ok(options)
    }
}
