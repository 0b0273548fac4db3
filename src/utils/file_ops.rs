use std::fs;
use std::path::Path;

use crate::error::{DecompositionError, DecompositionResult};

/// Read query text from a file
pub fn read_query_file<P: AsRef<Path>>(path: P) -> DecompositionResult<String> {
    fs::read_to_string(path.as_ref()).map_err(DecompositionError::IoError)
}

/// Write text to a file, creating missing parent directories
pub fn write_text_file<P: AsRef<Path>>(path: P, content: &str) -> DecompositionResult<()> {
    ensure_parent_dir(path.as_ref())?;
    fs::write(path.as_ref(), content).map_err(DecompositionError::IoError)
}

/// Ensure parent directory exists for a file path
pub fn ensure_parent_dir<P: AsRef<Path>>(path: P) -> DecompositionResult<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(DecompositionError::IoError)?;
        }
    }
    Ok(())
}
