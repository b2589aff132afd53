// THEORY:
// The output directory is flat, so the nesting of the input tree has to survive in
// the file name. The name is the containing directory relative to the input root,
// with each path component joined by `_`, followed by `_` and the original file
// name. The relative path is computed with `strip_prefix`, never with a character
// offset into the root string, so the result does not depend on how long the root
// path happens to be or which separator the platform uses.
//
// The original extension is kept even though the bytes written are JPEG, so
// `a/b/img1.png` becomes `a_b_img1.png`. A file directly under the root has an
// empty directory part and comes out as `_top.png`.

use crate::core_modules::record::DiscoveredFile;
use crate::error::{Result, SieveError};
use std::ffi::OsString;
use std::path::{Component, Path};

pub const SEPARATOR: &str = "_";

pub fn output_file_name(root: &Path, file: &DiscoveredFile) -> Result<OsString> {
    let relative = file
        .relative_dir(root)
        .ok_or_else(|| SieveError::RelativePath {
            path: file.path.clone(),
            root: root.to_path_buf(),
        })?;

    let mut name = OsString::new();
    let parts = relative.components().filter_map(|component| match component {
        Component::Normal(part) => Some(part),
        _ => None,
    });
    for (index, part) in parts.enumerate() {
        if index > 0 {
            name.push(SEPARATOR);
        }
        name.push(part);
    }
    name.push(SEPARATOR);
    name.push(&file.name);
    Ok(name)
}
