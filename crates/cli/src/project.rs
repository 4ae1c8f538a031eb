//! Reading and writing project sources on disk.
//!
//! A project directory holds `index.html`, `style.css` and `script.js`.

use anyhow::{Context, Result};
use clap::Args;
use core_types::{SourceBuffers, SourceKind};
use std::fs;
use std::path::{Path, PathBuf};

/// Where a command reads its three sources from.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Project directory with index.html, style.css and script.js
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Markup file (overrides the project directory)
    #[arg(long)]
    pub markup: Option<PathBuf>,

    /// Style file (overrides the project directory)
    #[arg(long)]
    pub style: Option<PathBuf>,

    /// Script file (overrides the project directory)
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Start from the built-in template instead of empty buffers
    #[arg(long)]
    pub template: bool,
}

impl SourceArgs {
    fn explicit(&self, kind: SourceKind) -> Option<&Path> {
        match kind {
            SourceKind::Markup => self.markup.as_deref(),
            SourceKind::Style => self.style.as_deref(),
            SourceKind::Script => self.script.as_deref(),
        }
    }

    /// Read the buffers. Files that a directory lacks stay as they were.
    pub fn load(&self) -> Result<SourceBuffers> {
        let mut buffers = if self.template {
            SourceBuffers::defaults()
        } else {
            SourceBuffers::default()
        };

        for kind in SourceKind::ALL {
            let path = match (self.explicit(kind), &self.dir) {
                (Some(path), _) => path.to_path_buf(),
                (None, Some(dir)) => {
                    let path = dir.join(kind.file_name());
                    if !path.exists() {
                        continue;
                    }
                    path
                }
                (None, None) => continue,
            };

            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading {kind} from {}", path.display()))?;
            buffers.set(kind, text);
        }

        Ok(buffers)
    }
}

/// Write buffers into a project directory, creating it if needed.
pub fn write_project(dir: &Path, buffers: &SourceBuffers) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    for kind in SourceKind::ALL {
        let path = dir.join(kind.file_name());
        fs::write(&path, buffers.get(kind))
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_from_directory() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("index.html"), "<h1>Hi</h1>").unwrap();
        fs::write(temp.path().join("style.css"), "h1{}").unwrap();

        let args = SourceArgs {
            dir: Some(temp.path().to_path_buf()),
            ..SourceArgs::default()
        };
        let buffers = args.load().unwrap();

        assert_eq!(buffers.markup, "<h1>Hi</h1>");
        assert_eq!(buffers.style, "h1{}");
        assert_eq!(buffers.script, "");
    }

    #[test]
    fn test_explicit_file_overrides_directory() {
        let temp = tempdir().unwrap();
        write_project(temp.path(), &SourceBuffers::new("dir", "dir", "dir")).unwrap();
        let script = temp.path().join("other.js");
        fs::write(&script, "other()").unwrap();

        let args = SourceArgs {
            dir: Some(temp.path().to_path_buf()),
            script: Some(script),
            ..SourceArgs::default()
        };
        let buffers = args.load().unwrap();

        assert_eq!(buffers.markup, "dir");
        assert_eq!(buffers.script, "other()");
    }

    #[test]
    fn test_template_fills_missing_files() {
        let args = SourceArgs {
            template: true,
            ..SourceArgs::default()
        };

        assert_eq!(args.load().unwrap(), SourceBuffers::defaults());
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let args = SourceArgs {
            markup: Some(PathBuf::from("/nonexistent/index.html")),
            ..SourceArgs::default()
        };

        assert!(args.load().is_err());
    }
}
