use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::RgbaImage;
use serde::Deserialize;

use blit_gl::{Filter, GlContext, GlError, Program, Texture};

use crate::math::Rect;

use super::sprite::Sprite;

#[derive(Debug)]
pub enum SpriteSheetError {
    Io { path: PathBuf, source: std::io::Error },
    Image(image::ImageError),
    Json(serde_json::Error),
    /// No sprite with this name in the sheet.
    NotFound(String),
    /// A named region is empty or leaves the image.
    BadRect { name: String, rect: Rect },
    Gl(GlError),
}

impl fmt::Display for SpriteSheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpriteSheetError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            SpriteSheetError::Image(e) => write!(f, "failed to decode sheet image: {e}"),
            SpriteSheetError::Json(e) => write!(f, "invalid sheet descriptor: {e}"),
            SpriteSheetError::NotFound(name) => write!(f, "sprite name not found: {name:?}"),
            SpriteSheetError::BadRect { name, rect } => {
                write!(f, "sprite {name:?} has an invalid region {rect:?}")
            }
            SpriteSheetError::Gl(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SpriteSheetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SpriteSheetError::Io { source, .. } => Some(source),
            SpriteSheetError::Image(e) => Some(e),
            SpriteSheetError::Json(e) => Some(e),
            SpriteSheetError::Gl(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GlError> for SpriteSheetError {
    fn from(e: GlError) -> Self {
        SpriteSheetError::Gl(e)
    }
}

/// Sheet descriptor: sprite name to `[x, y, w, h]` in image pixels.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct Descriptor(BTreeMap<String, [f32; 4]>);

/// One texture holding many named sprite regions.
#[derive(Debug)]
pub struct SpriteSheet {
    texture: Rc<Texture>,
    rects: BTreeMap<String, Rect>,
}

impl SpriteSheet {
    /// Uploads `image` and validates every region against it.
    pub fn from_image(
        gl: GlContext,
        image: &RgbaImage,
        rects: BTreeMap<String, Rect>,
        filter: Filter,
    ) -> Result<Self, SpriteSheetError> {
        let (w, h) = (image.width() as f32, image.height() as f32);
        if let Some((name, rect)) = rects
            .iter()
            .find(|(_, r)| r.w <= 0.0 || r.h <= 0.0 || r.x < 0.0 || r.y < 0.0 || r.x + r.w > w || r.y + r.h > h)
        {
            return Err(SpriteSheetError::BadRect {
                name: name.clone(),
                rect: *rect,
            });
        }

        let texture = Texture::new(
            gl,
            image.width() as usize,
            image.height() as usize,
            filter,
            Some(image.as_raw().as_slice()),
        )?;
        log::debug!(
            "sprite sheet: {} sprites on {}x{}",
            rects.len(),
            image.width(),
            image.height()
        );

        Ok(Self {
            texture: Rc::new(texture),
            rects,
        })
    }

    /// Parses a JSON descriptor and pairs it with `image`, nearest-filtered.
    pub fn from_json(gl: GlContext, json: &str, image: &RgbaImage) -> Result<Self, SpriteSheetError> {
        let Descriptor(raw) = serde_json::from_str(json).map_err(SpriteSheetError::Json)?;
        let rects = raw.into_iter().map(|(k, v)| (k, Rect::from(v))).collect();
        Self::from_image(gl, image, rects, Filter::Nearest)
    }

    /// Reads the descriptor and the image from disk.
    pub fn load(
        gl: GlContext,
        json_path: impl AsRef<Path>,
        image_path: impl AsRef<Path>,
    ) -> Result<Self, SpriteSheetError> {
        let json_path = json_path.as_ref();
        let json = std::fs::read_to_string(json_path).map_err(|source| SpriteSheetError::Io {
            path: json_path.to_path_buf(),
            source,
        })?;
        let image = image::open(image_path.as_ref())
            .map_err(SpriteSheetError::Image)?
            .to_rgba8();

        log::info!(
            "loaded sprite sheet {} + {}",
            json_path.display(),
            image_path.as_ref().display()
        );
        Self::from_json(gl, &json, &image)
    }

    pub fn texture(&self) -> &Rc<Texture> {
        &self.texture
    }

    pub fn rect(&self, name: &str) -> Option<Rect> {
        self.rects.get(name).copied()
    }

    /// Sprite names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rects.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Builds a sprite showing the region called `name`.
    pub fn get(&self, name: &str, program: &Rc<Program>) -> Result<Sprite, SpriteSheetError> {
        let rect = self
            .rect(name)
            .ok_or_else(|| SpriteSheetError::NotFound(name.to_string()))?;
        Ok(Sprite::new(Rc::clone(program), Rc::clone(&self.texture), rect)?)
    }
}

#[cfg(test)]
mod tests {
    use blit_gl::driver::Headless;
    use blit_gl::Region;
    use image::Rgba;

    use super::*;

    const DESC: &str = r#"{
        "idle": [0, 0, 2, 2],
        "walk": [2, 0, 2, 2]
    }"#;

    fn setup() -> (Rc<Headless>, GlContext, RgbaImage) {
        let h = Rc::new(Headless::new());
        let gl: GlContext = h.clone();
        let image = RgbaImage::from_fn(4, 2, |x, _| {
            if x < 2 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        (h, gl, image)
    }

    #[test]
    fn from_json_reads_rects_and_uploads_pixels() {
        let (_h, gl, image) = setup();
        let sheet = SpriteSheet::from_json(gl, DESC, &image).unwrap();

        assert_eq!(sheet.names().collect::<Vec<_>>(), vec!["idle", "walk"]);
        assert_eq!(sheet.rect("walk"), Some(Rect::new(2.0, 0.0, 2.0, 2.0)));
        assert_eq!(sheet.texture().filter(), Filter::Nearest);
        assert_eq!(
            sheet.texture().pixels(Region::new(3, 1, 1, 1)).unwrap(),
            vec![0, 0, 255, 255]
        );
    }

    #[test]
    fn get_builds_sprite_or_reports_missing() {
        let (h, gl, image) = setup();
        let sheet = SpriteSheet::from_json(gl.clone(), DESC, &image).unwrap();
        let program = Rc::new(Program::default_program(gl).unwrap());

        let sprite = sheet.get("walk", &program).unwrap();
        assert_eq!(sprite.rect(), Rect::new(2.0, 0.0, 2.0, 2.0));
        assert_eq!(sprite.texture().id(), sheet.texture().id());

        h.clear_calls();
        let err = sheet.get("jump", &program).unwrap_err();
        assert!(matches!(err, SpriteSheetError::NotFound(ref n) if n == "jump"));
        assert!(h.calls().is_empty());
    }

    #[test]
    fn rejects_region_outside_image() {
        let (_h, gl, image) = setup();
        let err = SpriteSheet::from_json(gl, r#"{"big": [0, 0, 8, 8]}"#, &image).unwrap_err();
        assert!(matches!(err, SpriteSheetError::BadRect { .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        let (_h, gl, image) = setup();
        let err = SpriteSheet::from_json(gl, r#"{"idle": [0, 0, 2]}"#, &image).unwrap_err();
        assert!(matches!(err, SpriteSheetError::Json(_)));
        assert!(err.to_string().starts_with("invalid sheet descriptor"));
    }

    #[test]
    fn load_reports_missing_file() {
        let (_h, gl, _image) = setup();
        let err = SpriteSheet::load(gl, "/nonexistent/sheet.json", "/nonexistent/sheet.png").unwrap_err();
        assert!(matches!(err, SpriteSheetError::Io { .. }));
    }
}
