use crate::errors::FixtureError;
use crate::fingerprint::{Fingerprint, ScopeId};
use crate::replay::recording::{
    FixtureArtifacts, PortableRequest, REQUEST_CONTENT_FILE, REQUEST_META_FILE,
    RESPONSE_CONTENT_FILE, RESPONSE_META_FILE,
};
use crate::runtime::FileSystem;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Owns the on-disk fixture tree:
/// `<root>/<scope>/<METHOD>_<fingerprint>/{request,response}{,_content}.json`.
#[derive(Clone)]
pub struct FixtureStore {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl FixtureStore {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root: root.into(),
            fs,
        }
    }

    pub fn scope_path(&self, scope: &ScopeId) -> PathBuf {
        self.root.join(scope.as_str())
    }

    pub fn fixture_path(&self, scope: &ScopeId, method: &str, fingerprint: &Fingerprint) -> PathBuf {
        self.scope_path(scope)
            .join(format!("{method}_{}", fingerprint.as_str()))
    }

    pub fn write(
        &self,
        scope: &ScopeId,
        request: &PortableRequest,
        response_meta: &str,
        response_content: &str,
    ) -> Result<PathBuf, FixtureError> {
        let dir = self.fixture_path(scope, &request.method, &request.fingerprint);
        self.fs.create_dir_all(&dir)?;
        self.fs
            .write_string(&dir.join(REQUEST_META_FILE), &request.meta)?;
        self.fs
            .write_string(&dir.join(REQUEST_CONTENT_FILE), &request.content)?;
        self.fs
            .write_string(&dir.join(RESPONSE_META_FILE), response_meta)?;
        self.fs
            .write_string(&dir.join(RESPONSE_CONTENT_FILE), response_content)?;
        Ok(dir)
    }

    /// Deletes every fixture of `scope`. Returns whether anything was there.
    pub fn clear(&self, scope: &ScopeId) -> Result<bool, FixtureError> {
        let dir = self.scope_path(scope);
        if !self.fs.dir_exists(&dir) {
            return Ok(false);
        }
        self.fs.remove_dir_all(&dir)?;
        Ok(true)
    }

    pub fn read(
        &self,
        scope: &ScopeId,
        request: &PortableRequest,
    ) -> Result<FixtureArtifacts, FixtureError> {
        let dir = self.fixture_path(scope, &request.method, &request.fingerprint);
        if !self.fs.dir_exists(&dir) {
            return Err(FixtureError::FixtureNotFound {
                method: request.method.clone(),
                target: request.target.clone(),
                path: dir.display().to_string(),
                request: request.meta.clone(),
                request_content: request.content.clone(),
            });
        }
        self.read_dir_artifacts(&dir)
    }

    /// Reads a fixture by its directory name, e.g. `POST_AbCdEf-123`.
    pub fn read_named(&self, scope: &ScopeId, name: &str) -> Result<FixtureArtifacts, FixtureError> {
        if !is_fixture_dir_name(name) {
            return Err(FixtureError::Io(format!("invalid fixture name {name:?}")));
        }
        let dir = self.scope_path(scope).join(name);
        if !self.fs.dir_exists(&dir) {
            return Err(FixtureError::Io(format!(
                "no fixture {name} in {}",
                self.scope_path(scope).display()
            )));
        }
        self.read_dir_artifacts(&dir)
    }

    pub fn list(&self, scope: &ScopeId) -> Result<Vec<String>, FixtureError> {
        let dir = self.scope_path(scope);
        if !self.fs.dir_exists(&dir) {
            return Ok(Vec::new());
        }
        self.fs.list_dirs(&dir)
    }

    fn read_dir_artifacts(&self, dir: &Path) -> Result<FixtureArtifacts, FixtureError> {
        Ok(FixtureArtifacts {
            request_meta: self.fs.read_to_string(&dir.join(REQUEST_META_FILE))?,
            request_content: self.fs.read_to_string(&dir.join(REQUEST_CONTENT_FILE))?,
            response_meta: self.fs.read_to_string(&dir.join(RESPONSE_META_FILE))?,
            response_content: self.fs.read_to_string(&dir.join(RESPONSE_CONTENT_FILE))?,
        })
    }
}

// A single plain path component; no separators, `.` or `..`.
fn is_fixture_dir_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    !name.contains(['/', '\\'])
        && matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none()
}
