use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::EtlError;

/// One scan of a source's data directory. Converters ask for the files they
/// need by name; a mandatory file that is absent fails the run up front.
pub struct DataDir {
    root: PathBuf,
    files: BTreeMap<String, PathBuf>,
    subdirs: BTreeMap<String, PathBuf>,
}

impl DataDir {
    pub fn scan(root: &Path) -> Result<Self, EtlError> {
        let mut files = BTreeMap::new();
        let mut subdirs = BTreeMap::new();
        let entries = std::fs::read_dir(root)
            .map_err(|err| EtlError::Filesystem(format!("{}: {err}", root.display())))?;
        for entry in entries {
            let entry =
                entry.map_err(|err| EtlError::Filesystem(format!("{}: {err}", root.display())))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            if path.is_dir() {
                subdirs.insert(name, path);
            } else {
                files.insert(name, path);
            }
        }
        Ok(Self {
            root: root.to_path_buf(),
            files,
            subdirs,
        })
    }

    /// Mandatory file. Absence is fatal for the whole run.
    pub fn file(&self, name: &str) -> Result<&Path, EtlError> {
        self.files
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| EtlError::MissingFile {
                dir: self.root.display().to_string(),
                name: name.to_string(),
            })
    }

    pub fn optional_file(&self, name: &str) -> Option<&Path> {
        self.files.get(name).map(PathBuf::as_path)
    }

    pub fn subdir(&self, name: &str) -> Result<DataDir, EtlError> {
        let path = self
            .subdirs
            .get(name)
            .ok_or_else(|| EtlError::MissingFile {
                dir: self.root.display().to_string(),
                name: name.to_string(),
            })?;
        DataDir::scan(path)
    }

    /// All immediate subdirectories, in name order.
    pub fn subdirs(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.subdirs
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }

    /// All files with the given extension, in name order.
    pub fn files_with_extension<'a>(
        &'a self,
        extension: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Path)> {
        self.files.iter().filter_map(move |(name, path)| {
            (path.extension().and_then(|ext| ext.to_str()) == Some(extension))
                .then_some((name.as_str(), path.as_path()))
        })
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn mandatory_file_absence_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("present.csv"), "a\n").unwrap();
        let scanned = DataDir::scan(dir.path()).unwrap();

        assert!(scanned.file("present.csv").is_ok());
        assert_matches!(
            scanned.file("absent.csv"),
            Err(EtlError::MissingFile { name, .. }) if name == "absent.csv"
        );
        assert!(scanned.optional_file("absent.csv").is_none());
    }

    #[test]
    fn subdirs_and_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("config.json"), "{}").unwrap();
        std::fs::write(dir.path().join("data.tsv"), "a\n").unwrap();
        let scanned = DataDir::scan(dir.path()).unwrap();

        let json: Vec<_> = scanned
            .files_with_extension("json")
            .map(|(name, _)| name)
            .collect();
        assert_eq!(json, vec!["config.json"]);
        assert_eq!(scanned.subdirs().count(), 1);
        assert!(scanned.subdir("nested").is_ok());
    }
}
