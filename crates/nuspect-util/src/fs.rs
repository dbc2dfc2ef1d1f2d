use std::path::{Path, PathBuf};

const UTF8_BOM: char = '\u{feff}';

/// Walk up from `start` looking for a file named `filename`.
/// Returns the path to the directory containing the file, or `None`.
pub fn find_ancestor_with(start: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join(filename);
        if candidate.is_file() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

/// Read a text file, dropping a leading UTF-8 byte order mark.
///
/// Visual Studio writes project files with a BOM, which XML readers
/// reject as content before the root element.
pub fn read_text(path: &Path) -> std::io::Result<String> {
    let content = std::fs::read_to_string(path)?;
    match content.strip_prefix(UTF8_BOM) {
        Some(stripped) => Ok(stripped.to_string()),
        None => Ok(content),
    }
}
