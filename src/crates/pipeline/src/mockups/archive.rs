//! Filesystem helpers for template builds: recursive copy, file discovery and zipping.

use crate::Result;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Copy `src` into `dst` recursively, creating `dst`
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src).map_err(|e| {
            crate::PipelineError::General(format!("path outside template root: {}", e))
        })?;
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Every file under `root` whose extension is one of `extensions`
pub fn files_with_extensions(root: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false);
        if matches {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Every file under `root` as `(relative path with '/' separators, absolute path)`
pub fn relative_files(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| crate::PipelineError::General(e.to_string()))?
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        files.push((relative, entry.into_path()));
    }
    files.sort();
    Ok(files)
}

/// Zip the contents of `root` (without the root folder itself) into memory
pub fn zip_directory(root: &Path) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (relative, path) in relative_files(root)? {
        zip.start_file(relative, options)?;
        let bytes = fs::read(&path)?;
        zip.write_all(&bytes)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn sample_tree() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("css")).unwrap();
        fs::write(tmp.path().join("index.html"), "<h1>{{BUSINESS_NAME}}</h1>").unwrap();
        fs::write(tmp.path().join("css/site.css"), ":root { --primary-color: #000; }").unwrap();
        fs::write(tmp.path().join("logo.svg"), "<svg/>").unwrap();
        tmp
    }

    #[test]
    fn test_copy_and_discover() {
        let src = sample_tree();
        let dst = TempDir::new().unwrap();
        copy_dir_all(src.path(), &dst.path().join("copy")).unwrap();

        let html = files_with_extensions(&dst.path().join("copy"), &["html"]).unwrap();
        assert_eq!(html.len(), 1);
        let styles = files_with_extensions(&dst.path().join("copy"), &["css", "html"]).unwrap();
        assert_eq!(styles.len(), 2);
    }

    #[test]
    fn test_zip_directory_uses_relative_names() {
        let src = sample_tree();
        let bytes = zip_directory(src.path()).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["css/site.css", "index.html", "logo.svg"]);

        let mut content = String::new();
        archive
            .by_name("index.html")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert!(content.contains("BUSINESS_NAME"));
    }
}
