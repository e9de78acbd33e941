//! Scratch directory management around each cycle.

use crate::error::Error;
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

/// Owns one scratch directory and brackets every cycle with its creation and
/// removal.
///
/// Both operations are idempotent: calling [`Fixture::setup`] on an existing
/// directory or [`Fixture::teardown`] on a missing one is not an error.
///
/// Parent directories created by setup are removed again by teardown, so a
/// setup followed by a teardown leaves the file system as it was.
#[derive(Debug)]
pub struct Fixture {
    path: PathBuf,

    /// Topmost directory created by the last setup that has not been torn
    /// down yet.
    created: Mutex<Option<PathBuf>>,
}

impl Fixture {
    /// Create a fixture managing the given directory. Nothing is touched on
    /// disk until [`Fixture::setup`] is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            created: Mutex::new(None),
        }
    }

    /// Path of the scratch directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the scratch directory exists, creating any missing parents.
    pub fn setup(&self) -> Result<(), Error> {
        tracing::trace!(path = %self.path.display(), "creating scratch directory");

        // Recorded before creating anything, so a setup that fails halfway
        // is still cleaned up by teardown.
        if let Some(root) = self.first_missing() {
            let mut created = self.created();

            if created.is_none() {
                *created = Some(root.to_owned());
            }
        }

        fs::create_dir_all(&self.path).map_err(|source| self.error(source))
    }

    /// Remove the scratch directory and everything in it, along with any
    /// parents created by setup.
    pub fn teardown(&self) -> Result<(), Error> {
        let root = self.created().take();
        let target = root.as_deref().unwrap_or(&self.path);

        tracing::trace!(path = %target.display(), "removing scratch directory");

        match fs::remove_dir_all(target) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(Error::Fixture {
                path: target.to_owned(),
                source,
            }),
        }
    }

    /// The outermost ancestor of the scratch directory, itself included,
    /// that does not exist yet.
    fn first_missing(&self) -> Option<&Path> {
        self.path
            .ancestors()
            .filter(|p| !p.as_os_str().is_empty())
            .take_while(|p| !p.exists())
            .last()
    }

    fn created(&self) -> MutexGuard<'_, Option<PathBuf>> {
        // The guarded value is a plain path, so a poisoned lock is still
        // usable.
        self.created
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn error(&self, source: io::Error) -> Error {
        Error::Fixture {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    #[test]
    fn setup_then_teardown_leaves_nothing_behind() {
        let base = tempfile::tempdir().unwrap();
        let fixture = Fixture::new(base.path().join("downloads/curl-defaults"));

        fixture.setup().unwrap();
        assert!(fixture.path().is_dir());

        fs::write(fixture.path().join("0.zip"), b"data").unwrap();

        fixture.teardown().unwrap();
        assert!(!fixture.path().exists());
        assert_eq!(entries(base.path()), Vec::<PathBuf>::new());
    }

    #[test]
    fn existing_parents_are_kept() {
        let base = tempfile::tempdir().unwrap();
        let parent = base.path().join("downloads");
        fs::create_dir(&parent).unwrap();
        fs::write(parent.join("keep.txt"), b"mine").unwrap();

        let fixture = Fixture::new(parent.join("a/b"));

        fixture.setup().unwrap();
        fixture.teardown().unwrap();

        assert_eq!(entries(&parent), vec![parent.join("keep.txt")]);
    }

    #[test]
    fn every_cycle_restores_the_base() {
        let base = tempfile::tempdir().unwrap();
        let fixture = Fixture::new(base.path().join("x/y/z"));

        for _ in 0..3 {
            fixture.setup().unwrap();
            assert!(fixture.path().is_dir());
            fixture.teardown().unwrap();
            assert!(entries(base.path()).is_empty());
        }
    }

    #[test]
    fn redundant_calls_are_not_errors() {
        let base = tempfile::tempdir().unwrap();
        let fixture = Fixture::new(base.path().join("outer/scratch"));

        fixture.teardown().unwrap();
        fixture.setup().unwrap();
        fixture.setup().unwrap();
        fixture.teardown().unwrap();
        fixture.teardown().unwrap();

        assert!(entries(base.path()).is_empty());
    }

    #[test]
    fn half_finished_setup_is_undone_by_teardown() {
        let base = tempfile::tempdir().unwrap();
        let too_long = "a".repeat(300);
        let fixture = Fixture::new(base.path().join("parent").join(too_long).join("scratch"));

        assert!(fixture.setup().unwrap_err().is_fixture());
        assert!(base.path().join("parent").is_dir());

        fixture.teardown().unwrap();
        assert!(entries(base.path()).is_empty());
    }

    #[test]
    fn setup_fails_when_path_is_a_file() {
        let base = tempfile::tempdir().unwrap();
        let blocker = base.path().join("blocker");
        fs::write(&blocker, b"").unwrap();

        let fixture = Fixture::new(blocker.join("scratch"));
        let error = fixture.setup().unwrap_err();

        assert!(error.is_fixture());
    }
}
