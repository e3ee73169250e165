use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::{Path, PathBuf},
};

/// Get the cache directory for a given media reference
pub fn get_cache_dir(media: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    media.hash(&mut hasher);
    let media_hash = hasher.finish();

    get_root_cache_dir().join(media_hash.to_string())
}

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("storyline")
}

/// Get the path for a cached analysis (model and interval aware)
pub fn get_analysis_path(
    cache_dir: &Path,
    model: &str,
    level1_interval: u32,
    level2_interval: u32,
) -> PathBuf {
    let model_name = model.trim_start_matches("models/").replace(['/', ':'], "_");
    cache_dir.join(format!(
        "analysis_{}_{}s_{}s.json",
        model_name, level1_interval, level2_interval
    ))
}

/// QA results live next to the analysis they were generated from
pub fn get_qa_path(analysis_path: &Path) -> PathBuf {
    analysis_path.with_extension("qa.json")
}
