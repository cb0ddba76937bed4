use std::ffi::CStr;
use std::num::NonZeroU32;
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version};
use glutin::display::{Display, DisplayApiPreference};
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawWindowHandle};
use winit::window::Window;

use blit_gl::driver::OpenGl;
use blit_gl::{state, GlContext};

use super::init::GlInit;

/// A window's GL surface, its current context, and the driver over it.
pub struct Graphics {
    gl: GlContext,
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    size: (u32, u32),
}

impl Graphics {
    /// Creates a context for `window` and makes it current on this thread.
    pub fn new(window: &Window, init: &GlInit) -> Result<Self> {
        let raw_window = window
            .window_handle()
            .context("window handle unavailable")?
            .as_raw();
        let raw_display = window
            .display_handle()
            .context("display handle unavailable")?
            .as_raw();

        // SAFETY: both handles come from a live winit window that outlives the display.
        let display = unsafe { Display::new(raw_display, api_preference(raw_window)) }
            .context("failed to open GL display")?;

        let config = pick_config(&display, init)?;
        log::debug!(
            "GL config: {} samples, {} stencil bits",
            config.num_samples(),
            config.stencil_size()
        );

        let (width, height): (u32, u32) = window.inner_size().into();
        let surface_attributes = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window,
            non_zero(width),
            non_zero(height),
        );
        // SAFETY: `raw_window` is valid for the lifetime of `window`.
        let surface = unsafe { display.create_window_surface(&config, &surface_attributes) }
            .context("failed to create GL window surface")?;

        let (major, minor) = init.version;
        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(major, minor))))
            .with_profile(GlProfile::Core)
            .with_debug(init.debug)
            .build(Some(raw_window));
        // SAFETY: same window handle as the surface.
        let context = unsafe { display.create_context(&config, &context_attributes) }
            .context("failed to create GL context")?
            .make_current(&surface)
            .context("failed to make GL context current")?;

        let interval = if init.vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(e) = surface.set_swap_interval(&context, interval) {
            log::warn!("failed to set swap interval: {e}");
        }

        // SAFETY: the context was made current above and stays current on this
        // thread for as long as `Graphics` lives.
        let driver = unsafe {
            let raw = glow::Context::from_loader_function_cstr(|s: &CStr| display.get_proc_address(s));
            OpenGl::new(raw)
        };
        let gl: GlContext = Rc::new(driver);

        state::set_bounds(&*gl, 0, 0, width as i32, height as i32);
        if init.msaa {
            state::enable_msaa(&*gl);
        }

        log::info!("GL context ready ({width}x{height}, vsync {})", init.vsync);

        Ok(Self {
            gl,
            surface,
            context,
            size: (width, height),
        })
    }

    pub fn gl(&self) -> &GlContext {
        &self.gl
    }

    /// Framebuffer size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Resizes the surface and resets viewport and scissor to cover it.
    ///
    /// Zero sizes (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (Some(w), Some(h)) = (NonZeroU32::new(width), NonZeroU32::new(height)) else {
            log::debug!("ignoring resize to {width}x{height}");
            return;
        };
        self.surface.resize(&self.context, w, h);
        state::set_bounds(&*self.gl, 0, 0, width as i32, height as i32);
        self.size = (width, height);
    }

    pub fn set_vsync(&self, on: bool) {
        let interval = if on {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(e) = self.surface.set_swap_interval(&self.context, interval) {
            log::warn!("failed to set swap interval: {e}");
        }
    }

    pub fn swap_buffers(&self) -> Result<()> {
        self.surface
            .swap_buffers(&self.context)
            .context("failed to swap buffers")
    }
}

#[cfg(target_os = "windows")]
fn api_preference(window: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::WglThenEgl(Some(window))
}

#[cfg(target_os = "macos")]
fn api_preference(_window: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::Cgl
}

#[cfg(all(unix, not(target_os = "macos")))]
fn api_preference(_window: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::Egl
}

fn pick_config(display: &Display, init: &GlInit) -> Result<Config> {
    let mut template = ConfigTemplateBuilder::new()
        .with_alpha_size(8)
        .with_stencil_size(init.stencil_bits)
        .with_transparency(false);
    if init.msaa {
        template = template.with_multisampling(4);
    }

    // SAFETY: the template carries no raw handles.
    let configs = unsafe { display.find_configs(template.build()) }
        .context("failed to query GL configs")?;

    let best = if init.msaa {
        configs.max_by_key(|c| c.num_samples())
    } else {
        configs.min_by_key(|c| c.num_samples())
    };
    best.ok_or_else(|| anyhow!("no suitable GL config"))
}

fn non_zero(v: u32) -> NonZeroU32 {
    NonZeroU32::new(v).unwrap_or(NonZeroU32::MIN)
}
