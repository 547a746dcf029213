//! Texture decoding and discovery next to a model file.

use std::path::{Path, PathBuf};

use crate::error::ViewerError;

/// Extensions accepted for auto-discovered textures (lowercase).
pub const TEXTURE_EXTENSIONS: [&str; 6] =
    ["png", "jpg", "jpeg", "webp", "bmp", "tga"];

/// Decoded RGBA8 image, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed RGBA bytes, `width * height * 4` long.
    pub rgba: Vec<u8>,
}

impl TextureImage {
    /// Decode an encoded image (format sniffed from the bytes).
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Texture`] if the bytes are not a supported
    /// image or the image is empty.
    pub fn decode(bytes: &[u8]) -> Result<Self, ViewerError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| ViewerError::Texture(e.to_string()))?
            .to_rgba8();
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ViewerError::Texture("image has no pixels".into()));
        }
        Ok(Self {
            width,
            height,
            rgba: image.into_raw(),
        })
    }

    /// Read and decode an image file.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Io`] if the file cannot be read and
    /// [`ViewerError::Texture`] if it cannot be decoded.
    pub fn open(path: &Path) -> Result<Self, ViewerError> {
        let bytes = std::fs::read(path)?;
        Self::decode(&bytes).map_err(|e| match e {
            ViewerError::Texture(msg) => {
                ViewerError::Texture(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Copy scaled down so neither side exceeds `max_side`, keeping the
    /// aspect ratio. `None` when the image already fits.
    #[must_use]
    pub fn fit_within(&self, max_side: u32) -> Option<Self> {
        let longest = self.width.max(self.height);
        if longest <= max_side || max_side == 0 {
            return None;
        }
        let scale = f64::from(max_side) / f64::from(longest);
        let width = ((f64::from(self.width) * scale).round() as u32).max(1);
        let height = ((f64::from(self.height) * scale).round() as u32).max(1);
        let source =
            image::RgbaImage::from_raw(self.width, self.height, self.rgba.clone())?;
        let resized = image::imageops::resize(
            &source,
            width,
            height,
            image::imageops::FilterType::Triangle,
        );
        log::info!(
            "texture {}x{} exceeds {max_side}px, downscaled to {width}x{height}",
            self.width,
            self.height
        );
        Some(Self {
            width,
            height,
            rgba: resized.into_raw(),
        })
    }

    /// Single-pixel texture, used when a model has no image.
    #[must_use]
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: rgba.to_vec(),
        }
    }
}

/// Extensions of last-resort candidates, best first.
const FALLBACK_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

fn has_texture_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            TEXTURE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        })
}

/// Image files next to `model_path` that may be its texture, best first.
///
/// Tried in order: files sharing the model's stem, then `texture.*`, then
/// `diffuse.*`, then any remaining PNG, JPG and JPEG files in that order.
/// Only image extensions count and the model itself is never returned.
/// Within a group candidates are sorted by name.
#[must_use]
pub fn texture_candidates(model_path: &Path) -> Vec<PathBuf> {
    let Some(stem) = model_path.file_stem().and_then(|s| s.to_str()) else {
        return Vec::new();
    };
    let dir = match model_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("cannot list {}: {e}", dir.display());
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_texture_extension(path))
        .filter(|path| path.file_name() != model_path.file_name())
        .collect();
    files.sort();

    let mut ordered = Vec::new();
    for wanted in [stem, "texture", "diffuse"] {
        for path in &files {
            let matches = path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s == wanted);
            if matches && !ordered.contains(path) {
                ordered.push(path.clone());
            }
        }
    }
    for wanted in FALLBACK_EXTENSIONS {
        for path in &files {
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted));
            if matches && !ordered.contains(path) {
                ordered.push(path.clone());
            }
        }
    }
    ordered
}

/// Diffuse map (`map_Kd`) named by a material library, resolved against
/// the library's directory.
#[must_use]
pub fn material_texture(mtl_path: &Path) -> Option<PathBuf> {
    let text = std::fs::read_to_string(mtl_path).ok()?;
    let name = text.lines().find_map(|line| {
        let (keyword, rest) = line.trim().split_once(char::is_whitespace)?;
        // Options such as `-bm 1` may precede the file name.
        (keyword == "map_Kd").then(|| rest.split_whitespace().last())?
    })?;
    let dir = mtl_path.parent().unwrap_or_else(|| Path::new(""));
    Some(dir.join(name))
}

/// Find and decode a texture for a model on disk.
///
/// Material libraries (resolved next to the model) are consulted first,
/// then [`texture_candidates`]. Candidates that fail to decode are logged
/// and skipped.
#[must_use]
pub fn discover(
    model_path: &Path,
    material_libraries: &[String],
) -> Option<(PathBuf, TextureImage)> {
    let dir = model_path.parent().unwrap_or_else(|| Path::new(""));
    let from_materials = material_libraries
        .iter()
        .filter_map(|lib| material_texture(&dir.join(lib)));

    for path in from_materials.chain(texture_candidates(model_path)) {
        match TextureImage::open(&path) {
            Ok(image) => {
                log::info!(
                    "using texture {} ({}x{})",
                    path.display(),
                    image.width,
                    image.height
                );
                return Some((path, image));
            }
            Err(e) => log::warn!("skipping texture candidate: {e}"),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("scanview-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([10, 20, 30, 255]),
        );
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_png_to_rgba() {
        let tex = TextureImage::decode(&png_bytes(3, 2)).unwrap();
        assert_eq!((tex.width, tex.height), (3, 2));
        assert_eq!(tex.rgba.len(), 3 * 2 * 4);
        assert_eq!(&tex.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn oversized_images_are_downscaled() {
        let tex = TextureImage::decode(&png_bytes(64, 16)).unwrap();
        assert!(tex.fit_within(64).is_none());
        let small = tex.fit_within(32).unwrap();
        assert_eq!((small.width, small.height), (32, 8));
        assert_eq!(small.rgba.len(), 32 * 8 * 4);
    }

    #[test]
    fn garbage_is_a_texture_error() {
        let err = TextureImage::decode(b"not an image").unwrap_err();
        assert!(matches!(err, ViewerError::Texture(_)));
    }

    #[test]
    fn candidates_follow_name_priority() {
        let dir = scratch_dir("candidates");
        for name in [
            "scan.obj",
            "diffuse.jpg",
            "texture.png",
            "scan.PNG",
            "scan.txt",
            "other.png",
            "b.jpeg",
            "a.jpg",
        ] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }

        let found = texture_candidates(&dir.join("scan.obj"));
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                "scan.PNG",
                "texture.png",
                "diffuse.jpg",
                "other.png",
                "a.jpg",
                "b.jpeg"
            ]
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn discover_skips_undecodable_candidates() {
        let dir = scratch_dir("discover");
        std::fs::write(dir.join("model.obj"), b"v 0 0 0\n").unwrap();
        std::fs::write(dir.join("model.png"), b"broken").unwrap();
        std::fs::write(dir.join("texture.png"), png_bytes(2, 2)).unwrap();

        let (path, tex) = discover(&dir.join("model.obj"), &[]).unwrap();
        assert_eq!(path.file_name().unwrap(), "texture.png");
        assert_eq!(tex.width, 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn material_library_map_wins() {
        let dir = scratch_dir("mtl");
        std::fs::write(dir.join("model.obj"), b"mtllib model.mtl\n").unwrap();
        std::fs::write(
            dir.join("model.mtl"),
            "newmtl mat\nKd 1 1 1\nmap_Kd -bm 1 albedo.png\n",
        )
        .unwrap();
        std::fs::write(dir.join("albedo.png"), png_bytes(4, 4)).unwrap();
        std::fs::write(dir.join("texture.png"), png_bytes(1, 1)).unwrap();

        assert_eq!(
            material_texture(&dir.join("model.mtl")),
            Some(dir.join("albedo.png"))
        );
        let (path, _) =
            discover(&dir.join("model.obj"), &["model.mtl".into()]).unwrap();
        assert_eq!(path.file_name().unwrap(), "albedo.png");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn nothing_found_in_empty_dir() {
        let dir = scratch_dir("empty");
        assert!(discover(&dir.join("lonely.obj"), &[]).is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
