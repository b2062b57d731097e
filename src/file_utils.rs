use anyhow::{Result, Context};
use std::fs;
use std::path::Path;
use once_cell::sync::Lazy;
use regex::Regex;

// @module: File and filename utilities

// @const: Characters that are not allowed in output filenames
static UNSAFE_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[\\/*?:"<>|]"#).unwrap()
});

// @const: Name used when a title sanitizes to nothing
pub const FALLBACK_FILE_STEM: &str = "subtitles";

/// Remove the characters `\ / * ? : " < > |` from a title
pub fn sanitize_filename(name: &str) -> String {
    UNSAFE_FILENAME_CHARS.replace_all(name, "").into_owned()
}

/// Build an output filename from a video title and an extension such as `.srt`
pub fn output_file_name(title: &str, extension: &str) -> String {
    let sanitized = sanitize_filename(title);
    let stem = if sanitized.trim().is_empty() { FALLBACK_FILE_STEM } else { sanitized.as_str() };

    if extension.is_empty() || extension.starts_with('.') {
        format!("{}{}", stem, extension)
    } else {
        format!("{}.{}", stem, extension)
    }
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !Self::dir_exists(path) {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }

    /// Read a subtitle file as text, replacing invalid UTF-8
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        let bytes = fs::read(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Write bytes to a file, creating parent directories
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                Self::ensure_dir(parent)?;
            }
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
