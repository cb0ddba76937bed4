//! Animated sprites under a pannable camera.
//!
//! Usage: `blit-demo [SHEET.json SHEET.png]`. Without arguments a small
//! procedural sheet is generated.
//!
//! Scroll zooms, middle-drag pans, Space pauses, Escape quits.

use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};

use blit_engine::core::{App, AppControl, FrameCtx};
use blit_engine::input::{InputEvent, InputState, Key, KeyAction, MouseButton};
use blit_engine::logging::{init_logging, LoggingConfig};
use blit_engine::math::{Color, Rect, Vec3};
use blit_engine::scene::{Animation, Camera, Sprite, SpriteSheet};
use blit_engine::window::{Runtime, RuntimeConfig};
use blit_gl::{state, Filter, Frame, GlContext, Program, Region};

const FRAME_PX: u32 = 16;
const FRAMES: u32 = 4;
const CLEAR: Color = Color::rgb(32, 48, 96);

struct Demo {
    gl: GlContext,
    program: Rc<Program>,
    camera: Camera,
    sprites: Vec<(Sprite, Animation)>,
    target: Option<Frame>,
    paused: bool,
}

impl Demo {
    fn new(gl: &GlContext, sheet_paths: Option<(String, String)>) -> Result<Self> {
        let program = Rc::new(Program::default_program(gl.clone()).context("default program")?);
        let sheet = match sheet_paths {
            Some((json, png)) => SpriteSheet::load(gl.clone(), &json, &png)
                .with_context(|| format!("loading sheet {json}"))?,
            None => procedural_sheet(gl)?,
        };

        let frames: Vec<Rect> = sheet.names().filter_map(|n| sheet.rect(n)).collect();
        let first = sheet.names().next().context("sprite sheet is empty")?.to_string();

        let mut sprites = Vec::new();
        for i in 0..3 {
            let sprite = sheet.get(&first, &program)?;
            sprite
                .orienter()
                .set_local_pos(Vec3::new((i as f32 - 1.0) * 1.5, 0.0, 0.0));
            let mut anim = Animation::new(frames.clone()).with_frame_time(0.1 + 0.05 * i as f32);
            for _ in 0..i {
                anim.advance();
            }
            sprites.push((sprite, anim));
        }

        let camera = Camera::new(60.0, Rect::new(0.0, 0.0, 512.0, 512.0));
        camera.orienter().set_local_pos(Vec3::new(0.0, 0.0, 4.0));

        log::info!("demo ready: {} sprites, {} frames each", sprites.len(), frames.len());
        Ok(Self {
            gl: gl.clone(),
            program,
            camera,
            sprites,
            target: None,
            paused: false,
        })
    }

    /// Keeps the off-screen target the same size as the window.
    fn resize_target(&mut self, width: u32, height: u32) -> Result<()> {
        let stale = self
            .target
            .as_ref()
            .is_none_or(|f| f.width() != width as usize || f.height() != height as usize);
        if stale {
            log::debug!("recreating off-screen target {width}x{height}");
            self.target = Some(Frame::new(
                self.gl.clone(),
                width as usize,
                height as usize,
                Filter::Nearest,
            )?);
        }
        Ok(())
    }

    fn handle_input(&mut self, input: &InputState, dt: f32) {
        let scroll = input.scroll();
        if scroll.y != 0.0 {
            self.camera.zoom(scroll.y * 5.0);
        }

        if input.button_held(MouseButton::Middle) {
            let d = input.mouse_delta();
            let height = self.camera.viewport().h.max(1.0);
            let z = self.camera.orienter().pos().z;
            let per_px = 2.0 * z * (self.camera.fov().to_radians() * 0.5).tan() / height;
            self.camera.pan(-d.x * per_px, d.y * per_px);
        }

        if input.key_pressed(Key::Space) {
            self.paused = !self.paused;
        }

        if !self.paused {
            for (sprite, _) in &self.sprites {
                sprite.orienter().rotate(dt * 0.5);
            }
        }
    }

    fn render(&mut self, ctx: &FrameCtx<'_>) -> Result<()> {
        let (w, h) = ctx.viewport;
        if w == 0 || h == 0 {
            return Ok(());
        }
        self.camera.set_viewport(ctx.viewport_rect());

        let dt = ctx.time.dt;
        if !self.paused {
            for (sprite, anim) in &mut self.sprites {
                if anim.update(dt) {
                    anim.apply(sprite)?;
                }
            }
        }

        self.resize_target(w, h)?;
        let target = self.target.as_ref().context("off-screen target missing")?;
        {
            let _bound = target.begin();
            state::set_bounds(&*self.gl, 0, 0, w as i32, h as i32);
            ctx.clear(CLEAR);

            let _prog = self.program.bind();
            self.camera.apply(&self.program)?;
            for (sprite, _) in &self.sprites {
                sprite.draw()?;
            }
        }

        let full = Region::full(w as usize, h as usize);
        target.blit(None, full, full);
        Ok(())
    }
}

impl App for Demo {
    fn on_event(&mut self, event: &InputEvent, _input: &InputState) -> AppControl {
        match event {
            InputEvent::Key {
                key: Key::Escape,
                action: KeyAction::Press,
            } => AppControl::Exit,
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        self.handle_input(ctx.input, ctx.time.dt);

        if let Err(e) = self.render(ctx) {
            log::error!("render failed: {e:#}");
            return AppControl::Exit;
        }

        if ctx.time.frame_index % 120 == 0 {
            ctx.runtime
                .set_title(format!("blit demo ({:.0} fps)", 1.0 / ctx.time.dt.max(1e-4)));
        }
        AppControl::Continue
    }
}

/// Four colored frames laid out left to right.
fn procedural_sheet(gl: &GlContext) -> Result<SpriteSheet> {
    const PALETTE: [[u8; 4]; FRAMES as usize] = [
        [230, 80, 80, 255],
        [240, 200, 70, 255],
        [80, 200, 120, 255],
        [90, 140, 240, 255],
    ];

    let image = RgbaImage::from_fn(FRAME_PX * FRAMES, FRAME_PX, |x, y| {
        let (fx, lx) = (x / FRAME_PX, x % FRAME_PX);
        let border = lx == 0 || y == 0 || lx == FRAME_PX - 1 || y == FRAME_PX - 1;
        if border {
            Rgba([255, 255, 255, 255])
        } else if (lx / 4 + y / 4) % 2 == 0 {
            Rgba(PALETTE[fx as usize])
        } else {
            Rgba([20, 20, 20, 255])
        }
    });

    let rects: BTreeMap<String, Rect> = (0..FRAMES)
        .map(|i| {
            let x = (i * FRAME_PX) as f32;
            (format!("frame{i}"), Rect::new(x, 0.0, FRAME_PX as f32, FRAME_PX as f32))
        })
        .collect();

    SpriteSheet::from_image(gl.clone(), &image, rects, Filter::Nearest)
        .context("building procedural sprite sheet")
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut args = std::env::args().skip(1);
    let sheet_paths = match (args.next(), args.next()) {
        (Some(json), Some(png)) => Some((json, png)),
        (None, _) => None,
        (Some(_), None) => anyhow::bail!("usage: blit-demo [SHEET.json SHEET.png]"),
    };

    let config = RuntimeConfig {
        title: "blit demo".to_string(),
        ..RuntimeConfig::default()
    };
    Runtime::run(config, move |gl| Demo::new(gl, sheet_paths))
}
