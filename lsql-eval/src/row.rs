//! The file-stat row source: `files(dir)`, the built-in and only virtual
//! table (§4.5 stage 1, §6.3).

use std::fs;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use lsql_core::{Error, Result, Tag, Timestamp, Value};
use walkdir::WalkDir;

/// One file-stat row, backed by a cached `stat()` snapshot taken when the
/// walker visited it. Cheap columns are read straight off the cached
/// metadata; `text`/`lines` open and fully read the file only when actually
/// requested (§5: "opened on attribute access ... closed on all exit
/// paths" — a `fs::read_to_string` call does exactly that).
#[derive(Debug)]
pub struct FileRow {
    fullpath: PathBuf,
    relative: PathBuf,
    metadata: fs::Metadata,
    parent_device: Option<u64>,
    depth: usize,
}

impl FileRow {
    fn is_dir(&self) -> bool {
        self.metadata.is_dir()
    }

    fn is_symlink(&self) -> bool {
        self.metadata.file_type().is_symlink()
    }

    fn is_executable(&self) -> bool {
        self.metadata.permissions().mode() & 0o111 != 0
    }

    fn is_mount_point(&self) -> bool {
        self.parent_device
            .map(|parent_dev| parent_dev != self.metadata.dev())
            .unwrap_or(false)
    }

    fn tags(&self) -> Vec<Tag> {
        let mut tags = Vec::new();
        if self.is_dir() {
            tags.push(Tag::Dir);
        } else {
            tags.push(Tag::File);
        }
        if self.is_symlink() {
            tags.push(Tag::Link);
        }
        if self.is_executable() {
            tags.push(Tag::Exec);
        }
        if self.is_mount_point() {
            tags.push(Tag::Mount);
        }
        tags
    }

    fn tagged(&self, text: String) -> Value {
        Value::tagged_str(text, self.tags())
    }

    fn type_name(&self) -> &'static str {
        if self.is_symlink() {
            "link"
        } else if self.is_dir() {
            "dir"
        } else {
            "file"
        }
    }

    fn read_text(&self) -> Option<String> {
        if self.is_dir() {
            return None;
        }
        fs::read_to_string(&self.fullpath).ok()
    }

    /// Fetches `canonical` (already alias-resolved, lowercase) from the
    /// fixed file-stat schema (§3).
    pub fn column(&self, canonical: &str) -> Result<Value> {
        let file_name = self
            .relative
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(match canonical {
            "fullpath" => self.tagged(self.fullpath.display().to_string()),
            "path" => self.tagged(self.relative.display().to_string()),
            "fulldir" => self.tagged(parent_display(&self.fullpath)),
            "dir" => self.tagged(parent_display(&self.relative)),
            "name" => self.tagged(file_name),
            "extension" => match Path::new(&file_name).extension() {
                Some(ext) => Value::str(ext.to_string_lossy().to_string()),
                None => Value::Null,
            },
            "no_ext" => {
                let stem = Path::new(&file_name)
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or(file_name);
                Value::str(stem)
            }
            "size" => Value::Int(self.metadata.len() as i64),
            "mode" => Value::Mode(lsql_core::Mode(self.metadata.permissions().mode())),
            "owner" => Value::str(self.metadata.uid().to_string()),
            "group" => Value::str(self.metadata.gid().to_string()),
            "atime" => Value::Timestamp(Timestamp(self.metadata.atime())),
            "mtime" => Value::Timestamp(Timestamp(self.metadata.mtime())),
            "ctime" => Value::Timestamp(Timestamp(self.metadata.ctime())),
            "birthtime" => match self.metadata.created() {
                Ok(created) => {
                    let secs = created
                        .duration_since(std::time::UNIX_EPOCH)
                        .map(|d| d.as_secs() as i64)
                        .unwrap_or(0);
                    Value::Timestamp(Timestamp(secs))
                }
                Err(err) if err.kind() == std::io::ErrorKind::Unsupported => {
                    return Err(Error::UnsupportedPlatform {
                        feature: "birthtime".to_string(),
                    })
                }
                Err(_) => Value::Null,
            },
            "depth" => Value::Int(self.depth as i64),
            "type" => Value::str(self.type_name()),
            "device" => Value::Int(self.metadata.dev() as i64),
            "hardlinks" => Value::Int(self.metadata.nlink() as i64),
            "inode" => Value::Int(self.metadata.ino() as i64),
            "text" => self.read_text().map(Value::str).unwrap_or(Value::Null),
            "lines" => match self.read_text() {
                Some(text) => Value::List(text.lines().map(Value::str).collect()),
                None => Value::Null,
            },
            "is_executable" => Value::Bool(self.is_executable()),
            other => {
                return Err(Error::UnknownColumn {
                    name: other.to_string(),
                })
            }
        })
    }
}

fn parent_display(path: &Path) -> String {
    path.parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

/// The rows produced by walking `root`, plus any directories the walker
/// could not descend into (§6.3: collected into a side-channel rather than
/// failing the whole walk).
#[derive(Debug)]
pub struct Walk {
    pub rows: Vec<FileRow>,
    pub denied: Vec<String>,
}

/// Walks `root` recursively (symlinked directories are not followed, hidden
/// entries are included) and produces one [`FileRow`] per visited path.
pub fn walk_files(root: &str) -> Result<Walk> {
    let root_path = Path::new(root);
    if !root_path.exists() {
        return Err(Error::DirectoryDoesNotExist {
            path: root.to_string(),
        });
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut rows = Vec::new();
    let mut denied = Vec::new();
    for entry in WalkDir::new(root_path).follow_links(false).into_iter() {
        match entry {
            Ok(entry) => {
                let metadata = match entry.metadata() {
                    Ok(m) => m,
                    Err(err) => {
                        log::warn!("skipping {}: {}", entry.path().display(), err);
                        denied.push(entry.path().display().to_string());
                        continue;
                    }
                };
                let parent_device = entry
                    .path()
                    .parent()
                    .and_then(|p| fs::metadata(p).ok())
                    .map(|m| m.dev());
                let relative = entry
                    .path()
                    .strip_prefix(&cwd)
                    .unwrap_or_else(|_| entry.path())
                    .to_path_buf();
                rows.push(FileRow {
                    fullpath: entry.path().to_path_buf(),
                    relative,
                    metadata,
                    parent_device,
                    depth: entry.depth(),
                });
            }
            Err(err) => {
                if let Some(path) = err.path() {
                    denied.push(path.display().to_string());
                }
                log::warn!("skipping unreadable path: {}", err);
            }
        }
    }
    Ok(Walk { rows, denied })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonexistent_root_is_an_error() {
        let err = walk_files("/no/such/path/lsql-test").unwrap_err();
        assert!(matches!(err, Error::DirectoryDoesNotExist { .. }));
    }

    #[test]
    fn walk_finds_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello\nworld\n").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let walk = walk_files(dir.path().to_str().unwrap()).unwrap();
        let names: Vec<_> = walk
            .rows
            .iter()
            .map(|r| r.column("name").unwrap())
            .collect();
        assert!(names.iter().any(|v| matches!(v, Value::Str(s) if s.text == "a.txt")));
        assert!(names.iter().any(|v| matches!(v, Value::Str(s) if s.text == "sub")));
    }

    #[test]
    fn text_and_lines_read_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello\nworld\n").unwrap();
        let walk = walk_files(dir.path().to_str().unwrap()).unwrap();
        let row = walk
            .rows
            .iter()
            .find(|r| r.column("name").unwrap() == Value::str("a.txt"))
            .unwrap();
        assert_eq!(row.column("lines").unwrap(), Value::List(vec![Value::str("hello"), Value::str("world")]));
    }

    #[test]
    fn directories_have_null_text_and_lines() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let walk = walk_files(dir.path().to_str().unwrap()).unwrap();
        let row = walk
            .rows
            .iter()
            .find(|r| r.column("name").unwrap() == Value::str("sub"))
            .unwrap();
        assert_eq!(row.column("text").unwrap(), Value::Null);
        assert_eq!(row.column("lines").unwrap(), Value::Null);
    }

    #[test]
    fn unknown_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        let walk = walk_files(dir.path().to_str().unwrap()).unwrap();
        let err = walk.rows[0].column("not_a_column").unwrap_err();
        assert!(matches!(err, Error::UnknownColumn { .. }));
    }
}
