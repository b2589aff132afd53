use image::{Rgb, RgbImage};
use std::fs;
use std::path::Path;

/// Writes a gradient image of the given size; the format follows the extension.
pub(crate) fn write_image(root: &Path, relative: &str, width: u32, height: u32) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture directory");
    }
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    img.save(&path).expect("write fixture image");
}

pub(crate) fn write_bytes(root: &Path, relative: &str, bytes: &[u8]) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture directory");
    }
    fs::write(&path, bytes).expect("write fixture file");
}

/// The three-file tree used by the pipeline scenarios.
pub(crate) fn scenario_tree(root: &Path) {
    write_image(root, "a/b/img1.png", 1024, 768);
    write_image(root, "c/img2.jpg", 800, 600);
    write_image(root, "d/img3.png", 1200, 900);
}

/// Writes a PNG whose header is intact but whose pixel data is cut short, so the
/// size can be probed while a full decode fails.
pub(crate) fn write_truncated_image(root: &Path, relative: &str, width: u32, height: u32) {
    write_image(root, relative, width, height);
    let path = root.join(relative);
    let bytes = fs::read(&path).expect("read fixture image");
    fs::write(&path, &bytes[..200]).expect("truncate fixture image");
}
