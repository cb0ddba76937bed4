use anyhow::{anyhow, Context, Result};

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Fullscreen, Window, WindowId};

use blit_gl::GlContext;

use crate::core::{App, AppControl, FrameCtx};
use crate::device::{GlInit, Graphics};
use crate::input::platform::winit::translate_window_event;
use crate::input::InputState;
use crate::time::FrameClock;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    /// Initial inner size in logical pixels.
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    pub fullscreen: bool,
    pub decorated: bool,
    pub msaa: bool,
    pub vsync: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "blit".to_string(),
            width: 512,
            height: 512,
            resizable: true,
            fullscreen: false,
            decorated: true,
            msaa: true,
            vsync: true,
        }
    }
}

impl RuntimeConfig {
    fn gl_init(&self) -> GlInit {
        GlInit {
            msaa: self.msaa,
            vsync: self.vsync,
            ..GlInit::default()
        }
    }
}

/// Window commands issued from app callbacks.
///
/// Commands are buffered and applied after the current callback returns.
#[derive(Debug, Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.commands.push(Command::SetTitle(title.into()));
    }

    pub fn set_cursor_visible(&mut self, visible: bool) {
        self.commands.push(Command::SetCursorVisible(visible));
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.commands.push(Command::SetFullscreen(fullscreen));
    }

    fn drain(&mut self) -> std::vec::Drain<'_, Command> {
        self.commands.drain(..)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Exit,
    SetTitle(String),
    SetCursorVisible(bool),
    SetFullscreen(bool),
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window, then calls `build` with the fresh GL context to
    /// construct the application, and drives frames until exit.
    ///
    /// Window, context and `build` failures end the loop and are returned.
    pub fn run<A, F>(config: RuntimeConfig, build: F) -> Result<()>
    where
        A: App + 'static,
        F: FnOnce(&GlContext) -> Result<A> + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, build);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Everything tied to the open window.
///
/// Field order is drop order: the app's GL objects must go while the context
/// is still alive, and the context before the window.
struct WindowEntry<A> {
    app: A,
    graphics: Graphics,
    window: Window,
    input: InputState,
    clock: FrameClock,
}

struct AppState<A, F> {
    config: RuntimeConfig,
    build: Option<F>,
    entry: Option<WindowEntry<A>>,
    error: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<A, F> AppState<A, F>
where
    A: App + 'static,
    F: FnOnce(&GlContext) -> Result<A>,
{
    fn new(config: RuntimeConfig, build: F) -> Self {
        Self {
            config,
            build: Some(build),
            entry: None,
            error: None,
            exit_requested: false,
        }
    }

    fn create_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowEntry<A>> {
        let build = self
            .build
            .take()
            .ok_or_else(|| anyhow!("application already built"))?;

        let cfg = &self.config;
        let mut attrs = Window::default_attributes()
            .with_title(cfg.title.clone())
            .with_inner_size(LogicalSize::new(cfg.width, cfg.height))
            .with_resizable(cfg.resizable)
            .with_decorations(cfg.decorated);
        if cfg.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;
        let graphics = Graphics::new(&window, &cfg.gl_init()).context("GL initialization failed")?;
        let app = build(graphics.gl()).context("application setup failed")?;

        Ok(WindowEntry {
            app,
            graphics,
            window,
            input: InputState::new(),
            clock: FrameClock::new(),
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        self.request_exit(event_loop);
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn apply_commands(&mut self, event_loop: &ActiveEventLoop, mut ctx: RuntimeCtx) {
        for cmd in ctx.drain() {
            let Some(entry) = self.entry.as_ref() else {
                break;
            };
            match cmd {
                Command::Exit => {
                    self.request_exit(event_loop);
                    return;
                }
                Command::SetTitle(title) => entry.window.set_title(&title),
                Command::SetCursorVisible(visible) => entry.window.set_cursor_visible(visible),
                Command::SetFullscreen(on) => {
                    entry
                        .window
                        .set_fullscreen(on.then_some(Fullscreen::Borderless(None)));
                }
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        let WindowEntry {
            app,
            graphics,
            window,
            input,
            clock,
        } = entry;

        let mut runtime = RuntimeCtx::default();
        let control = {
            let mut ctx = FrameCtx {
                gl: graphics.gl(),
                input,
                time: clock.tick(),
                viewport: graphics.size(),
                runtime: &mut runtime,
            };
            app.on_frame(&mut ctx)
        };
        input.end_frame();

        window.pre_present_notify();
        if let Err(e) = graphics.swap_buffers() {
            log::warn!("{e:#}");
        }

        if control == AppControl::Exit {
            runtime.exit();
        }
        self.apply_commands(event_loop, runtime);
    }
}

impl<A, F> ApplicationHandler for AppState<A, F>
where
    A: App + 'static,
    F: FnOnce(&GlContext) -> Result<A>,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        match self.create_entry(event_loop) {
            Ok(entry) => {
                entry.window.request_redraw();
                self.entry = Some(entry);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Continuous redraw.
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(entry) = &self.entry {
            entry.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        if let Some(ev) = translate_window_event(entry.window.scale_factor(), &event) {
            entry.input.apply_event(&ev);
            if entry.app.on_event(&ev, &entry.input) == AppControl::Exit {
                self.request_exit(event_loop);
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => self.request_exit(event_loop),

            WindowEvent::Resized(size) => {
                entry.graphics.resize(size.width, size.height);
                entry.window.request_redraw();
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let size = entry.window.inner_size();
                entry.graphics.resize(size.width, size.height);
                entry.window.request_redraw();
            }

            WindowEvent::Focused(true) => entry.clock.reset(),

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Release app resources while the context is still current.
        self.entry = None;
        log::debug!("runtime exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.title, "blit");
        assert_eq!((cfg.width, cfg.height), (512, 512));
        assert!(cfg.resizable && cfg.decorated && cfg.msaa && cfg.vsync);
        assert!(!cfg.fullscreen);

        let init = cfg.gl_init();
        assert!(init.msaa && init.vsync);
    }

    #[test]
    fn commands_are_buffered_in_order() {
        let mut ctx = RuntimeCtx::default();
        ctx.set_title("hello");
        ctx.set_cursor_visible(false);
        ctx.set_fullscreen(true);
        ctx.exit();

        let cmds: Vec<Command> = ctx.drain().collect();
        assert_eq!(
            cmds,
            vec![
                Command::SetTitle("hello".into()),
                Command::SetCursorVisible(false),
                Command::SetFullscreen(true),
                Command::Exit,
            ]
        );
        assert!(ctx.drain().next().is_none());
    }
}
