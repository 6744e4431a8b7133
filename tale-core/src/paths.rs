//! Path utilities for story documents.
//!
//! References stored inside story and scene documents are always relative to
//! the story directory and use `/` regardless of the host. In memory the same
//! references are absolute host paths. Everything in here is plain string
//! arithmetic so the conversions behave identically on every platform.

use std::io;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use tokio::fs;

/// Reserved destination meaning "the story ends here".
pub const END_SENTINEL: &str = "#END";

/// Separator used for every path written into a document.
pub const STORED_SEPARATOR: char = '/';

/// Well-known file and folder names of the library layout.
pub mod names {
    /// Story metadata document inside each story directory.
    pub const STORY_DOCUMENT: &str = "gsg.json";
    /// Placeholder thumbnail written into new stories.
    pub const THUMBNAIL: &str = "thumb.jpg";
    pub const RESOURCES_DIR: &str = "resources";
    pub const SCENES_DIR: &str = "scenes";
    pub const COLLECTIONS_DIR: &str = "collections";
    pub const WORKSPACE_DIR: &str = "workspace";
    /// App-wide playback state.
    pub const CONSISTENT_DATA: &str = "consistent.json";
    pub const FIRST_SCENE: &str = "First Scene";
    pub const SECOND_SCENE: &str = "Second Scene";
    pub const SCENE_SUFFIX: &str = ".json";
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Normalize `path` using `separator`.
///
/// Splits on either separator, drops empty segments and rejoins. A leading
/// separator survives so absolute paths stay absolute.
pub fn sanitize_path_with(path: &str, separator: char) -> String {
    let joined = path
        .split(is_separator)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(&separator.to_string());

    if path.starts_with(is_separator) {
        format!("{separator}{joined}")
    } else {
        joined
    }
}

/// Normalize `path` using the host separator.
pub fn sanitize_path(path: &str) -> String {
    sanitize_path_with(path, MAIN_SEPARATOR)
}

/// Join segments into one host path.
///
/// Trailing separators on any segment make no difference to the result.
pub fn join_path<S: AsRef<str>>(segments: &[S]) -> String {
    let joined = segments
        .iter()
        .map(|segment| segment.as_ref())
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.trim_end_matches(is_separator))
        .collect::<Vec<_>>()
        .join(&MAIN_SEPARATOR.to_string());

    sanitize_path(&joined)
}

/// Strip `base_dir` from `full_path`, returning a `/`-separated path.
///
/// Returns `None` when `base_dir` is not a prefix of `full_path`.
pub fn try_convert_absolute_to_relative(full_path: &str, base_dir: &str) -> Option<String> {
    let full = sanitize_path(full_path);
    let prefix = format!("{}{MAIN_SEPARATOR}", sanitize_path(base_dir));
    full.strip_prefix(&prefix)
        .map(|relative| sanitize_path_with(relative, STORED_SEPARATOR))
}

/// Lenient form of [`try_convert_absolute_to_relative`].
///
/// A path outside `base_dir` comes back unchanged apart from normalization.
pub fn convert_absolute_to_relative(full_path: &str, base_dir: &str) -> String {
    match try_convert_absolute_to_relative(full_path, base_dir) {
        Some(relative) => relative,
        None => {
            tracing::debug!(
                path = full_path,
                base_dir,
                "path is outside the story directory, storing as-is"
            );
            sanitize_path_with(full_path, STORED_SEPARATOR)
        }
    }
}

/// Absolute host path of a stored reference.
pub fn resolve_stored(base_dir: &Path, stored: &str) -> PathBuf {
    PathBuf::from(join_path(&[path_str(base_dir).as_str(), stored]))
}

/// Stored (relative, `/`-separated) form of an absolute path.
pub fn relativize(path: &Path, base_dir: &Path) -> String {
    convert_absolute_to_relative(&path_str(path), &path_str(base_dir))
}

/// Lossy string view of a path.
pub fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Last segment of a path (file or directory name).
pub fn get_obj_from_path(path: &str) -> String {
    path.split(is_separator)
        .filter(|segment| !segment.is_empty())
        .last()
        .unwrap_or_default()
        .to_string()
}

/// Remove characters that are not allowed in file names on any platform.
pub fn sanitize_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .filter(|c| !c.is_control())
        .collect()
}

/// Sibling path of `file_path` named `<new_name>.json`.
pub fn resolve_new_path_from_new_name(file_path: &Path, new_name: &str) -> PathBuf {
    let file_name = format!("{new_name}{}", names::SCENE_SUFFIX);
    match file_path.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Create `path` (recursively) if it does not exist yet.
pub async fn ensure_dir_exists(path: impl AsRef<Path>) -> io::Result<PathBuf> {
    let path = path.as_ref();
    if !fs::try_exists(path).await? {
        fs::create_dir_all(path).await?;
    }
    Ok(path.to_path_buf())
}

/// A visible entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub path: PathBuf,
}

/// List `dir`, skipping hidden entries (names starting with `.`).
///
/// Entries are sorted by name.
pub async fn filtered_read_dir(dir: impl AsRef<Path>) -> io::Result<Vec<DirEntryInfo>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut visible = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        visible.push(DirEntryInfo {
            name,
            path: entry.path(),
        });
    }

    visible.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_drops_duplicate_separators() {
        assert_eq!(sanitize_path_with("a//b\\\\c/", '/'), "a/b/c");
        assert_eq!(sanitize_path_with("/a//b", '/'), "/a/b");
        assert_eq!(sanitize_path_with("\\a\\b", '/'), "/a/b");
        assert_eq!(sanitize_path_with("", '/'), "");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = [
            "/home//user/./stories\\scenes/",
            "\\\\server\\share//x",
            "relative/path//to\\file.json",
            "/",
            "///",
            "",
            "scenes/First Scene.json",
        ];
        for separator in ['/', '\\'] {
            for input in inputs {
                let once = sanitize_path_with(input, separator);
                let twice = sanitize_path_with(&once, separator);
                assert_eq!(once, twice, "sanitize not idempotent for {input:?}");
            }
        }
    }

    #[test]
    fn test_join_ignores_trailing_separators() {
        let with = join_path(&["/data/", "story/", "scenes/"]);
        let without = join_path(&["/data", "story", "scenes"]);
        assert_eq!(with, without);
        assert_eq!(
            without,
            format!("{MAIN_SEPARATOR}data{MAIN_SEPARATOR}story{MAIN_SEPARATOR}scenes")
        );
    }

    #[test]
    fn test_join_keeps_absolute_root() {
        let joined = join_path(&["/", "a"]);
        assert_eq!(joined, format!("{MAIN_SEPARATOR}a"));
    }

    #[test]
    fn test_convert_absolute_to_relative() {
        let base = join_path(&["/data", "workspace", "story"]);
        let full = join_path(&[base.as_str(), "scenes", "First Scene.json"]);
        assert_eq!(
            convert_absolute_to_relative(&full, &base),
            "scenes/First Scene.json"
        );
    }

    #[test]
    fn test_convert_outside_base_is_unchanged() {
        assert_eq!(
            convert_absolute_to_relative("/elsewhere/file.json", "/data/story"),
            "/elsewhere/file.json"
        );
        assert!(try_convert_absolute_to_relative("/elsewhere/file.json", "/data/story").is_none());
    }

    #[test]
    fn test_convert_requires_full_segment_prefix() {
        // "/data/story2/..." must not be treated as inside "/data/story".
        assert!(try_convert_absolute_to_relative("/data/story2/x.json", "/data/story").is_none());
    }

    #[test]
    fn test_get_obj_from_path() {
        assert_eq!(get_obj_from_path("/a/b/Second Scene.json"), "Second Scene.json");
        assert_eq!(get_obj_from_path("C:\\stories\\abc\\"), "abc");
        assert_eq!(get_obj_from_path(""), "");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("What? <Now>/\\"), "What Now");
        assert_eq!(sanitize_file_name("tab\there"), "tabhere");
    }

    #[test]
    fn test_resolve_new_path_from_new_name() {
        let old = Path::new("/story/scenes/Old.json");
        assert_eq!(
            resolve_new_path_from_new_name(old, "New"),
            PathBuf::from("/story/scenes/New.json")
        );
    }

    #[tokio::test]
    async fn test_filtered_read_dir_hides_dotfiles() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        std::fs::write(temp.path().join("b.json"), "{}").unwrap();
        std::fs::write(temp.path().join("a.json"), "{}").unwrap();
        std::fs::write(temp.path().join(".DS_Store"), "").unwrap();
        std::fs::create_dir(temp.path().join(".git")).unwrap();

        let entries = filtered_read_dir(temp.path()).await.expect("read dir");
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[tokio::test]
    async fn test_ensure_dir_exists_creates_nested() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let nested = temp.path().join("x").join("y");
        let created = ensure_dir_exists(&nested).await.expect("create");
        assert_eq!(created, nested);
        assert!(nested.is_dir());
        // Second call is a no-op.
        ensure_dir_exists(&nested).await.expect("noop");
    }
}
