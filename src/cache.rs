use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::models::ElectableCourse;

/// On-disk copy of the electable-course list, valid for one run.
///
/// Opening the cache discards a file left behind by an earlier run; the file
/// is written on first use and removed again by [`ElectionCache::teardown`].
#[derive(Debug)]
pub struct ElectionCache {
    path: PathBuf,
}

impl ElectionCache {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Err(e) = remove_if_present(&path) {
            warn!(path = %path.display(), error = %e, "Could not discard stale election cache");
        }
        Self { path }
    }

    pub fn get(&self) -> Result<Option<Vec<ElectableCourse>>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };
        let courses: Vec<ElectableCourse> =
            serde_json::from_slice(&data).context("Failed to decode election cache")?;
        debug!(path = %self.path.display(), courses = courses.len(), "Election cache hit");
        Ok(Some(courses))
    }

    pub fn put(&self, courses: &[ElectableCourse]) -> Result<()> {
        let data = serde_json::to_vec(courses)?;
        fs::write(&self.path, data)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        debug!(path = %self.path.display(), courses = courses.len(), "Election cache stored");
        Ok(())
    }

    pub fn teardown(self) -> Result<()> {
        remove_if_present(&self.path)
            .with_context(|| format!("Failed to remove {}", self.path.display()))
    }
}

fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("eamis-{}-{}.json", name, std::process::id()))
    }

    fn course(id: &str) -> ElectableCourse {
        ElectableCourse {
            id: id.to_string(),
            course_no: format!("0{}", id),
            name: "高等数学".to_string(),
            teacher: "张三".to_string(),
            room: "A101".to_string(),
        }
    }

    #[test]
    fn test_get_put_teardown() {
        let path = temp_path("roundtrip");
        let cache = ElectionCache::open(&path);
        assert_eq!(cache.get().unwrap(), None);

        cache.put(&[course("1"), course("2")]).unwrap();
        let stored = cache.get().unwrap().unwrap();
        assert_eq!(stored, vec![course("1"), course("2")]);

        cache.teardown().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_open_discards_stale_file() {
        let path = temp_path("stale");
        fs::write(&path, "[]").unwrap();

        let cache = ElectionCache::open(&path);
        assert!(!path.exists());
        assert_eq!(cache.get().unwrap(), None);
        cache.teardown().unwrap();
    }

    #[test]
    fn test_teardown_without_file() {
        let cache = ElectionCache::open(temp_path("unused"));
        assert!(cache.teardown().is_ok());
    }
}
