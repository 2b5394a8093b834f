use std::{
    fs, io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::warn;
use serde_json::Error as SerdeError;

use super::profile::CredentialProfile;
use super::provider::SettingsProvider;

/// One JSON file per credential profile.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    /// `~/.config/awskit/profiles` on Linux, `%APPDATA%\awskit\profiles` on Windows, etc.
    pub fn new() -> io::Result<Self> {
        let proj = ProjectDirs::from("", "", "awskit")
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "Unable to locate config dir"))?;
        Self::at(proj.config_dir().join("profiles"))
    }

    /// Use an explicit directory instead of the platform config dir.
    pub fn at(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn file_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Returns every stored profile (silently skips malformed files).
    pub fn list(&self) -> io::Result<Vec<CredentialProfile>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match fs::File::open(&path)
                .and_then(|f| serde_json::from_reader(f).map_err(SerdeError::into))
            {
                Ok(profile) => out.push(profile),
                Err(e) => warn!("could not read {:?}: {e}", path),
            }
        }
        Ok(out)
    }

    /// Look up one profile by name (`Ok(None)` if it does not exist).
    pub fn lookup(&self, name: &str) -> io::Result<Option<CredentialProfile>> {
        match fs::File::open(self.file_for(name)) {
            Ok(file) => serde_json::from_reader(file)
                .map(Some)
                .map_err(SerdeError::into),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The named profile, else the `default` profile, else the first stored
    /// one, else `None` when nothing is stored.
    pub fn resolve_or_default(&self, name: &str) -> io::Result<Option<CredentialProfile>> {
        if let Some(profile) = self.lookup(name)? {
            return Ok(Some(profile));
        }
        if let Some(profile) = self.lookup(SettingsProvider::DEFAULT_PROFILE)? {
            return Ok(Some(profile));
        }
        Ok(self.list()?.into_iter().next())
    }

    /// Create or overwrite a profile.
    pub fn save(&self, profile: &CredentialProfile) -> io::Result<()> {
        let file = fs::File::create(self.file_for(profile.name()))?;
        serde_json::to_writer_pretty(file, profile).map_err(SerdeError::into)
    }

    /// Delete a profile (`Ok(true)` if removed, `Ok(false)` if it didn't exist).
    pub fn delete(&self, name: &str) -> io::Result<bool> {
        match fs::remove_file(self.file_for(name)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
