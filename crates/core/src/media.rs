use std::path::{Path, PathBuf};

/// Where a video comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// A reference the model can read directly (http(s), gs:// or an uploaded file)
    Remote(String),
    /// A local file that has to be uploaded first
    Local(PathBuf),
}

impl MediaSource {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if is_remote(input) {
            MediaSource::Remote(input.to_string())
        } else {
            MediaSource::Local(PathBuf::from(input))
        }
    }

    pub fn is_youtube(&self) -> bool {
        matches!(self, MediaSource::Remote(url) if url.contains("youtube.com") || url.contains("youtu.be"))
    }

    pub fn is_http(&self) -> bool {
        matches!(self, MediaSource::Remote(url) if url.starts_with("http://") || url.starts_with("https://"))
    }

    /// Key for cached results. Local paths are made absolute so the same
    /// relative name in two directories does not share a cache entry.
    pub fn cache_key(&self) -> String {
        match self {
            MediaSource::Remote(uri) => uri.clone(),
            MediaSource::Local(path) => std::fs::canonicalize(path)
                .or_else(|_| std::path::absolute(path))
                .unwrap_or_else(|_| path.clone())
                .to_string_lossy()
                .to_string(),
        }
    }
}

impl std::fmt::Display for MediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaSource::Remote(uri) => f.write_str(uri),
            MediaSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

fn is_remote(input: &str) -> bool {
    ["http://", "https://", "gs://", "files/"]
        .iter()
        .any(|prefix| input.starts_with(prefix))
}

/// MIME type for a video file, by extension
pub fn video_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        _ => "video/mp4",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_sources() {
        let yt = MediaSource::parse("https://www.youtube.com/watch?v=M8VqHdq37HY");
        assert!(yt.is_youtube());
        assert!(yt.is_http());

        let uploaded = MediaSource::parse("files/abc123");
        assert_eq!(uploaded, MediaSource::Remote("files/abc123".to_string()));
        assert!(!uploaded.is_http());
        assert!(!uploaded.is_youtube());

        assert!(matches!(
            MediaSource::parse("gs://bucket/clip.mp4"),
            MediaSource::Remote(_)
        ));

        assert_eq!(
            MediaSource::parse(" ./clips/holiday.mov "),
            MediaSource::Local(PathBuf::from("./clips/holiday.mov"))
        );
    }

    #[test]
    fn local_cache_key_is_the_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();
        std::fs::write(dir.path().join("a").join("clip.mp4"), b"a").unwrap();
        std::fs::write(dir.path().join("b").join("clip.mp4"), b"b").unwrap();

        let direct = MediaSource::Local(dir.path().join("a").join("clip.mp4"));
        let roundabout = MediaSource::Local(dir.path().join("b").join("..").join("a").join("clip.mp4"));
        let other = MediaSource::Local(dir.path().join("b").join("clip.mp4"));

        assert_eq!(direct.cache_key(), roundabout.cache_key());
        assert_ne!(direct.cache_key(), other.cache_key());
        assert!(std::path::Path::new(&direct.cache_key()).is_absolute());
    }

    #[test]
    fn remote_cache_key_is_the_reference() {
        let url = "https://www.youtube.com/watch?v=abc";
        assert_eq!(MediaSource::parse(url).cache_key(), url);
    }

    #[test]
    fn picks_mime_type_from_extension() {
        assert_eq!(video_mime_type(Path::new("a.MOV")), "video/quicktime");
        assert_eq!(video_mime_type(Path::new("a.webm")), "video/webm");
        assert_eq!(video_mime_type(Path::new("a.mp4")), "video/mp4");
        assert_eq!(video_mime_type(Path::new("no_extension")), "video/mp4");
    }
}
