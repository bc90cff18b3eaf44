//! Template source trees.
//! Maps a manifest to the read-only file tree its project is rendered from:
//! the embedded built-in tree, a local template's `files` directory, or a
//! directory inside a cached template repository.

use crate::builtin::BuiltinFiles;
use crate::error::{Error, Result};
use crate::manifest::TemplateManifest;
use rust_embed::RustEmbed;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;
use walkdir::WalkDir;

/// Name of the content subdirectory of a template.
pub const FILES_DIR: &str = "files";

/// An entry of a source tree, relative to its root with `/` separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub is_dir: bool,
}

/// A read-only tree of template files.
pub trait SourceTree {
    /// Every entry of the tree, depth-first, parents before children,
    /// siblings ordered by name.
    fn entries(&self) -> Result<Vec<TreeEntry>>;

    /// Contents of the file at `path`.
    fn read(&self, path: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateTree {
    /// The built-in tree compiled into the binary.
    Embedded,
    /// A directory on disk.
    Directory(PathBuf),
}

impl std::fmt::Display for TemplateTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateTree::Embedded => write!(f, "built-in template"),
            TemplateTree::Directory(path) => write!(f, "'{}'", path.display()),
        }
    }
}

fn compare_components(a: &str, b: &str) -> Ordering {
    a.split('/').cmp(b.split('/'))
}

fn embedded_entries() -> Vec<TreeEntry> {
    let files: Vec<String> = BuiltinFiles::iter().map(|path| path.into_owned()).collect();

    let mut dirs = BTreeSet::new();
    for path in &files {
        let mut parent = Path::new(path).parent();
        while let Some(dir) = parent.filter(|d| !d.as_os_str().is_empty()) {
            dirs.insert(dir.to_string_lossy().replace('\\', "/"));
            parent = dir.parent();
        }
    }

    let mut entries: Vec<TreeEntry> = dirs
        .into_iter()
        .map(|path| TreeEntry { path, is_dir: true })
        .chain(files.into_iter().map(|path| TreeEntry { path, is_dir: false }))
        .collect();
    entries.sort_by(|a, b| compare_components(&a.path, &b.path));
    entries
}

fn directory_entries(root: &Path) -> Result<Vec<TreeEntry>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::ReadError {
            path: e
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| root.display().to_string()),
            source: e.into(),
        })?;
        let relative = entry.path().strip_prefix(root).map_err(|e| {
            Error::TemplateError(format!("{}: {e}", entry.path().display()))
        })?;
        let path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        entries.push(TreeEntry { path, is_dir: entry.file_type().is_dir() });
    }
    Ok(entries)
}

impl SourceTree for TemplateTree {
    fn entries(&self) -> Result<Vec<TreeEntry>> {
        match self {
            TemplateTree::Embedded => Ok(embedded_entries()),
            TemplateTree::Directory(root) => directory_entries(root),
        }
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        match self {
            TemplateTree::Embedded => BuiltinFiles::get(path)
                .map(|file| file.data.into_owned())
                .ok_or_else(|| Error::ReadError {
                    path: path.to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "not part of the built-in template",
                    ),
                }),
            TemplateTree::Directory(root) => {
                fs::read(root.join(path)).map_err(|source| Error::ReadError {
                    path: path.to_string(),
                    source,
                })
            }
        }
    }
}

/// Normalizes a repository identifier to `owner/repo`.
///
/// Accepts `owner/repo`, HTTPS URLs and `git@host:owner/repo.git`.
pub fn repo_slug(template_repo: &str) -> String {
    let template_repo = template_repo.trim();
    let path = if let Some(rest) = template_repo.strip_prefix("git@") {
        rest.split_once(':').map(|(_, path)| path.to_string()).unwrap_or_default()
    } else {
        match Url::parse(template_repo) {
            Ok(url) if url.has_host() => url.path().to_string(),
            _ => template_repo.to_string(),
        }
    };
    let path = path.trim_matches('/');
    path.strip_suffix(".git").unwrap_or(path).to_string()
}

/// Directory holding the clone of a template repository.
pub fn repo_cache_dir(cache_dir: &Path, template_repo: &str) -> PathBuf {
    let mut dir = cache_dir.join("templates");
    for part in repo_slug(template_repo).split('/').filter(|s| !s.is_empty() && *s != "..") {
        dir.push(part);
    }
    dir
}

/// Resolves the source tree of a template.
///
/// Reads the filesystem only to check that the tree exists.
///
/// # Errors
/// * `Error::LocalFilesNotFound` if a local template lacks its `files` directory
/// * `Error::TemplateDirNotFound` if a cached template directory is missing
pub fn resolve_template_tree(
    manifest: &TemplateManifest,
    cache_dir: &Path,
    template_repo: &str,
) -> Result<TemplateTree> {
    let source_path = match &manifest.source_path {
        Some(path) if !manifest.builtin && !path.as_os_str().is_empty() => path,
        _ => return Ok(TemplateTree::Embedded),
    };

    if source_path.is_absolute() {
        let files = source_path.join(FILES_DIR);
        if !files.is_dir() {
            return Err(Error::LocalFilesNotFound { path: files.display().to_string() });
        }
        return Ok(TemplateTree::Directory(files));
    }

    let template_dir = repo_cache_dir(cache_dir, template_repo).join(source_path);
    if !template_dir.is_dir() {
        return Err(Error::TemplateDirNotFound { path: template_dir.display().to_string() });
    }
    let files = template_dir.join(FILES_DIR);
    if files.is_dir() {
        Ok(TemplateTree::Directory(files))
    } else {
        Ok(TemplateTree::Directory(template_dir))
    }
}
