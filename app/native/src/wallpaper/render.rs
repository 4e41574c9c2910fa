//! Cover-scaled background rendering.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};
use natord::compare;
use tempfile::NamedTempFile;

use super::{ImageGenerator, RenderError};
use crate::display::Bounds;
use crate::platform::path::expand;
use crate::playlist::Entry;

const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

const JPEG_QUALITY: u8 = 95;

/// Scales each entry's background to cover the monitor, centre-crops it and
/// caches the result as JPEG.
///
/// Cache names include a hash of the source path, size and modification time,
/// so an edited background is re-rendered while repeated fires reuse the file.
#[derive(Debug, Clone)]
pub struct CoverRenderer {
    cache_dir: PathBuf,
}

impl CoverRenderer {
    #[must_use]
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self { Self { cache_dir: cache_dir.into() } }

    #[must_use]
    pub fn cache_dir(&self) -> &Path { &self.cache_dir }

    fn cached_path(&self, source: &Path, bounds: Bounds) -> PathBuf {
        let stem = source.file_stem().and_then(|s| s.to_str()).unwrap_or("wallpaper");

        let mut hasher = DefaultHasher::new();
        source.hash(&mut hasher);
        if let Ok(metadata) = fs::metadata(source) {
            metadata.len().hash(&mut hasher);
            metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH).hash(&mut hasher);
        }
        let hash = hasher.finish() & 0xffff_ffff;

        self.cache_dir.join(format!("{stem}_{hash:08x}_{}x{}.jpg", bounds.width, bounds.height))
    }
}

impl ImageGenerator for CoverRenderer {
    fn render(&self, entry: &Entry, bounds: Bounds) -> Result<PathBuf, RenderError> {
        if bounds.is_empty() {
            return Err(RenderError::EmptyBounds(bounds));
        }

        let source = expand(&entry.background);
        if !source.is_file() {
            return Err(RenderError::MissingBackground(source));
        }
        if !is_supported_image(&source) {
            return Err(RenderError::Unsupported(source));
        }

        let target = self.cached_path(&source, bounds);
        if is_complete_render(&target, bounds) {
            tracing::trace!(path = %target.display(), "reusing rendered wallpaper");
            return Ok(target);
        }

        fs::create_dir_all(&self.cache_dir)
            .map_err(|source| RenderError::Io { path: self.cache_dir.clone(), source })?;

        let decode_err =
            |err: image::ImageError| RenderError::Decode { path: source.clone(), source: err };
        let img = ImageReader::open(&source)
            .map_err(|err| RenderError::Io { path: source.clone(), source: err })?
            .with_guessed_format()
            .map_err(|err| RenderError::Io { path: source.clone(), source: err })?
            .decode()
            .map_err(decode_err)?;

        let covered = cover(&img, bounds.width, bounds.height);

        let io_err = |err| RenderError::Io { path: target.clone(), source: err };
        let mut tmp = NamedTempFile::new_in(&self.cache_dir).map_err(io_err)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
            covered
                .to_rgb8()
                .write_with_encoder(encoder)
                .map_err(|err| RenderError::Encode { path: target.clone(), source: err })?;
            writer.flush().map_err(io_err)?;
        }
        tmp.persist(&target).map_err(|err| io_err(err.error))?;

        tracing::debug!(
            source = %source.display(),
            path = %target.display(),
            width = bounds.width,
            height = bounds.height,
            "rendered wallpaper"
        );
        Ok(target)
    }
}

/// Whether a cached render at `path` can be reused for `bounds`.
///
/// Files with an unreadable header or the wrong size are rendered again.
fn is_complete_render(path: &Path, bounds: Bounds) -> bool {
    image::image_dimensions(path).is_ok_and(|dims| dims == (bounds.width, bounds.height))
}

/// Scales `img` to fill `width`x`height` and crops the overflow evenly.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn cover(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    let (img_width, img_height) = img.dimensions();
    let scale = (f64::from(width) / f64::from(img_width))
        .max(f64::from(height) / f64::from(img_height));

    // Rounding up keeps the scaled image at least as large as the target.
    let scaled_width = ((f64::from(img_width) * scale).ceil() as u32).max(width);
    let scaled_height = ((f64::from(img_height) * scale).ceil() as u32).max(height);

    let resized = img.resize_exact(scaled_width, scaled_height, FilterType::CatmullRom);
    let crop_x = (scaled_width - width) / 2;
    let crop_y = (scaled_height - height) / 2;

    resized.crop_imm(crop_x, crop_y, width, height)
}

/// Whether `path` has an image extension the renderer accepts.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Supported images directly inside `dir`, in natural sort order.
#[must_use]
pub fn list_images_in_directory(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut images: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_supported_image(path))
        .collect();

    images.sort_by(|a, b| compare(&a.to_string_lossy(), &b.to_string_lossy()));
    images
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    use super::*;

    fn write_png(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([200, 40, 40])).save(path).unwrap();
    }

    #[test]
    fn test_cover_fills_target_exactly() {
        let wide = DynamicImage::ImageRgb8(RgbImage::new(400, 100));
        assert_eq!(cover(&wide, 160, 90).dimensions(), (160, 90));

        let tall = DynamicImage::ImageRgb8(RgbImage::new(90, 300));
        assert_eq!(cover(&tall, 160, 90).dimensions(), (160, 90));
    }

    #[test]
    fn test_render_writes_cached_jpeg_at_monitor_size() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("sea.png");
        write_png(&source, 64, 48);

        let renderer = CoverRenderer::new(dir.path().join("cache"));
        let entry = Entry::new("q", source.display().to_string());
        let rendered = renderer.render(&entry, Bounds::sized(32, 18)).unwrap();

        assert!(rendered.starts_with(renderer.cache_dir()));
        assert_eq!(rendered.extension().unwrap(), "jpg");
        assert_eq!(image::image_dimensions(&rendered).unwrap(), (32, 18));

        let again = renderer.render(&entry, Bounds::sized(32, 18)).unwrap();
        assert_eq!(again, rendered);
    }

    #[test]
    fn test_render_replaces_truncated_cache_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("sea.png");
        write_png(&source, 64, 48);

        let renderer = CoverRenderer::new(dir.path().join("cache"));
        let bounds = Bounds::sized(32, 18);
        let target = renderer.cached_path(&source, bounds);
        fs::create_dir_all(renderer.cache_dir()).unwrap();
        fs::write(&target, [0xFF, 0xD8, 0xFF]).unwrap();

        let entry = Entry::new("q", source.display().to_string());
        let rendered = renderer.render(&entry, bounds).unwrap();

        assert_eq!(rendered, target);
        assert_eq!(image::image_dimensions(&rendered).unwrap(), (32, 18));
    }

    #[test]
    fn test_render_leaves_only_the_final_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("sea.png");
        write_png(&source, 64, 48);

        let renderer = CoverRenderer::new(dir.path().join("cache"));
        let entry = Entry::new("q", source.display().to_string());
        let rendered = renderer.render(&entry, Bounds::sized(32, 18)).unwrap();

        let files: Vec<_> =
            fs::read_dir(renderer.cache_dir()).unwrap().flatten().map(|e| e.path()).collect();
        assert_eq!(files, vec![rendered]);
    }

    #[test]
    fn test_render_distinguishes_sizes() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("sea.png");
        write_png(&source, 64, 48);

        let renderer = CoverRenderer::new(dir.path().join("cache"));
        let entry = Entry::new("q", source.display().to_string());
        let small = renderer.render(&entry, Bounds::sized(32, 18)).unwrap();
        let large = renderer.render(&entry, Bounds::sized(48, 27)).unwrap();
        assert_ne!(small, large);
    }

    #[test]
    fn test_render_missing_background() {
        let dir = TempDir::new().unwrap();
        let renderer = CoverRenderer::new(dir.path());
        let entry = Entry::new("q", "/definitely/not/here.png");
        assert!(matches!(
            renderer.render(&entry, Bounds::sized(10, 10)),
            Err(RenderError::MissingBackground(_))
        ));
    }

    #[test]
    fn test_render_rejects_empty_bounds() {
        let renderer = CoverRenderer::new("/tmp");
        let entry = Entry::new("q", "/bg.png");
        assert!(matches!(
            renderer.render(&entry, Bounds::sized(0, 10)),
            Err(RenderError::EmptyBounds(_))
        ));
    }

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image(Path::new("a.JPG")));
        assert!(is_supported_image(Path::new("/x/b.jpeg")));
        assert!(!is_supported_image(Path::new("/x/c.webp")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("no_extension")));
    }

    #[test]
    fn test_list_images_uses_natural_order() {
        let dir = TempDir::new().unwrap();
        for name in ["img10.png", "img2.png", "img1.jpg", "readme.md"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let names: Vec<_> = list_images_in_directory(dir.path())
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["img1.jpg", "img2.png", "img10.png"]);
    }

    #[test]
    fn test_list_images_missing_dir() {
        assert!(list_images_in_directory(Path::new("/no/such/dir")).is_empty());
    }
}
