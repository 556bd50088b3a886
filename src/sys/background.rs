//! Desktop background pipeline: the renderer collaborator and its cache.
//!
//! The renderer resolves the configured wallpaper source to a surface token
//! the host can paint; pixel work (image decoding, per-style brush
//! construction) happens host-side. The cache is the single owner of
//! "current background" state and is dropped only through an explicit
//! `invalidate` call.

use std::path::PathBuf;

use tracing::error;

use crate::common::config::{BackgroundSettings, BackgroundSource, Color, WallpaperStyle};
use crate::sys::geometry::Size;

/// Painted when no background can be produced.
pub const FALLBACK_COLOR: Color = Color::rgb(0x64, 0x95, 0xed);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Surface {
    Solid(Color),
    Image { path: PathBuf, style: WallpaperStyle },
}

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("wallpaper file not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("no wallpaper source configured")]
    Unconfigured,
    #[error("system wallpaper lookup is not available on this host")]
    Unsupported,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub trait BackgroundRenderer {
    fn render(&self, settings: &BackgroundSettings, bounds: Size)
    -> Result<Surface, RenderError>;
}

/// Default renderer: maps the configured source to a surface token without
/// touching pixels. The system-default source needs a platform host that
/// can read the session wallpaper settings.
#[derive(Debug, Default)]
pub struct SourceRenderer;

impl BackgroundRenderer for SourceRenderer {
    fn render(
        &self,
        settings: &BackgroundSettings,
        _bounds: Size,
    ) -> Result<Surface, RenderError> {
        match settings.source {
            BackgroundSource::Color => Ok(Surface::Solid(settings.color)),
            BackgroundSource::Image => {
                let Some(path) = &settings.image_path else {
                    return Err(RenderError::Unconfigured);
                };
                if !path.exists() {
                    return Err(RenderError::Missing(path.clone()));
                }
                Ok(Surface::Image {
                    path: path.clone(),
                    style: settings.image_style.effective(),
                })
            }
            BackgroundSource::SystemDefault => Err(RenderError::Unsupported),
        }
    }
}

/// Cached background surface. Render failures are logged and replaced by
/// the solid fallback, which stays cached until the next invalidation so a
/// broken source is not retried on every repaint.
#[derive(Debug, Default)]
pub struct BackgroundCache {
    surface: Option<Surface>,
}

impl BackgroundCache {
    pub fn invalidate(&mut self) {
        self.surface = None;
    }

    pub fn is_valid(&self) -> bool {
        self.surface.is_some()
    }

    pub fn ensure(
        &mut self,
        renderer: &dyn BackgroundRenderer,
        settings: &BackgroundSettings,
        bounds: Size,
    ) -> &Surface {
        &*self.surface.get_or_insert_with(|| {
            match renderer.render(settings, bounds) {
                Ok(surface) => surface,
                Err(err) => {
                    error!("failed to render desktop background: {err}");
                    Surface::Solid(FALLBACK_COLOR)
                }
            }
        })
    }
}
