/// The file-stat row's fixed column set (§3), canonical spellings, in
/// declaration order. `extension` and `is_executable` are the canonical
/// forms of the `ext`/`is_exec` aliases resolved by
/// [`resolve_column_alias`].
pub const FILE_COLUMNS: &[&str] = &[
    "fullpath",
    "size",
    "owner",
    "path",
    "fulldir",
    "dir",
    "name",
    "extension",
    "no_ext",
    "mode",
    "group",
    "atime",
    "mtime",
    "ctime",
    "birthtime",
    "depth",
    "type",
    "device",
    "hardlinks",
    "inode",
    "text",
    "lines",
    "is_executable",
];

/// The columns `SELECT *` expands to. Excludes `text`/`lines`, which read
/// and decode the whole file, since a practical "show me everything"
/// projection should not pay for that implicitly (Open Question, see
/// DESIGN.md).
pub const FILE_STAR_COLUMNS: &[&str] = &[
    "fullpath",
    "size",
    "owner",
    "path",
    "fulldir",
    "dir",
    "name",
    "extension",
    "no_ext",
    "mode",
    "group",
    "atime",
    "mtime",
    "ctime",
    "birthtime",
    "depth",
    "type",
    "device",
    "hardlinks",
    "inode",
    "is_executable",
];

/// The columns projected when `SELECT` itself is omitted: a small
/// `ls -l`-ish default rather than the full `star` set (Open Question, see
/// DESIGN.md).
pub const FILE_DEFAULT_COLUMNS: &[&str] = &["name", "size", "mode", "mtime"];

/// Resolves a column name to its canonical lowercase spelling, applying the
/// `ext`/`is_exec` aliases (§3). Unknown names are returned lowercased
/// unchanged, so callers can still detect "not a real column" by checking
/// membership in [`FILE_COLUMNS`].
pub fn resolve_column_alias(name: &str) -> String {
    match name.to_ascii_lowercase().as_str() {
        "ext" => "extension".to_string(),
        "is_exec" => "is_executable".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_canonical_names() {
        assert_eq!(resolve_column_alias("EXT"), "extension");
        assert_eq!(resolve_column_alias("Is_Exec"), "is_executable");
        assert_eq!(resolve_column_alias("size"), "size");
    }

    #[test]
    fn star_columns_omit_content_reads() {
        assert!(!FILE_STAR_COLUMNS.contains(&"text"));
        assert!(!FILE_STAR_COLUMNS.contains(&"lines"));
        assert!(FILE_COLUMNS.contains(&"text"));
    }
}
