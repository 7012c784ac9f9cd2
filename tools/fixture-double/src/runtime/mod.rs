use crate::errors::FixtureError;
use crate::types::{HttpRequest, HttpResponse};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// The real network exchange the fixture double stands in front of.
pub trait HttpTransport: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, FixtureError>;
}

pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> Result<String, FixtureError>;
    fn write_string(&self, path: &Path, contents: &str) -> Result<(), FixtureError>;
    fn create_dir_all(&self, path: &Path) -> Result<(), FixtureError>;
    fn remove_dir_all(&self, path: &Path) -> Result<(), FixtureError>;
    fn dir_exists(&self, path: &Path) -> bool;
    /// Names of the immediate subdirectories of `path`, sorted.
    fn list_dirs(&self, path: &Path) -> Result<Vec<String>, FixtureError>;
}

pub struct ProductionFileSystem;

impl FileSystem for ProductionFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, FixtureError> {
        std::fs::read_to_string(path).map_err(|e| FixtureError::Io(e.to_string()))
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<(), FixtureError> {
        std::fs::write(path, contents).map_err(|e| FixtureError::Io(e.to_string()))
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FixtureError> {
        std::fs::create_dir_all(path).map_err(|e| FixtureError::Io(e.to_string()))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), FixtureError> {
        std::fs::remove_dir_all(path).map_err(|e| FixtureError::Io(e.to_string()))
    }

    fn dir_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_dirs(&self, path: &Path) -> Result<Vec<String>, FixtureError> {
        let mut names = std::fs::read_dir(path)
            .map_err(|e| FixtureError::Io(e.to_string()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect::<Vec<_>>();
        names.sort();
        Ok(names)
    }
}

#[derive(Default, Clone)]
pub struct FakeFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
    dirs: Arc<Mutex<BTreeSet<PathBuf>>>,
    fail_next: Arc<Mutex<Option<FixtureError>>>,
}

impl FakeFileSystem {
    pub fn set_fail_next(&self, error: FixtureError) {
        *self.fail_next.lock().expect("fail lock") = Some(error);
    }

    pub fn file_paths(&self) -> Vec<PathBuf> {
        let mut paths = self
            .files
            .lock()
            .expect("files lock")
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        paths.sort();
        paths
    }

    fn maybe_fail(&self) -> Result<(), FixtureError> {
        if let Some(err) = self.fail_next.lock().expect("fail lock").take() {
            return Err(err);
        }
        Ok(())
    }
}

impl FileSystem for FakeFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, FixtureError> {
        self.maybe_fail()?;
        self.files
            .lock()
            .expect("files lock")
            .get(path)
            .cloned()
            .ok_or_else(|| FixtureError::Io(format!("missing file {}", path.display())))
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<(), FixtureError> {
        self.maybe_fail()?;
        self.files
            .lock()
            .expect("files lock")
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FixtureError> {
        self.maybe_fail()?;
        let mut dirs = self.dirs.lock().expect("dirs lock");
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), FixtureError> {
        self.maybe_fail()?;
        self.files
            .lock()
            .expect("files lock")
            .retain(|file, _| !file.starts_with(path));
        self.dirs
            .lock()
            .expect("dirs lock")
            .retain(|dir| !dir.starts_with(path));
        Ok(())
    }

    fn dir_exists(&self, path: &Path) -> bool {
        self.dirs.lock().expect("dirs lock").contains(path)
    }

    fn list_dirs(&self, path: &Path) -> Result<Vec<String>, FixtureError> {
        self.maybe_fail()?;
        let dirs = self.dirs.lock().expect("dirs lock");
        if !dirs.contains(path) {
            return Err(FixtureError::Io(format!("missing dir {}", path.display())));
        }
        Ok(dirs
            .iter()
            .filter(|dir| dir.parent() == Some(path))
            .filter_map(|dir| dir.file_name())
            .map(|name| name.to_string_lossy().to_string())
            .collect())
    }
}

pub trait Terminal: Send + Sync {
    fn write_line(&self, line: &str) -> Result<(), FixtureError>;
}

pub struct ProductionTerminal;

impl Terminal for ProductionTerminal {
    fn write_line(&self, line: &str) -> Result<(), FixtureError> {
        use std::io::Write;
        let mut out = std::io::stdout();
        writeln!(out, "{line}").map_err(|e| FixtureError::Io(e.to_string()))
    }
}

pub struct ProductionRuntime {
    pub file_system: Arc<dyn FileSystem>,
    pub terminal: Arc<dyn Terminal>,
}

impl ProductionRuntime {
    pub fn new() -> Self {
        Self {
            file_system: Arc::new(ProductionFileSystem),
            terminal: Arc::new(ProductionTerminal),
        }
    }
}

impl Default for ProductionRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default, Clone)]
pub struct FakeTerminal {
    writes: Arc<Mutex<Vec<String>>>,
}

impl FakeTerminal {
    pub fn written_lines(&self) -> Vec<String> {
        self.writes.lock().expect("writes lock").clone()
    }
}

impl Terminal for FakeTerminal {
    fn write_line(&self, line: &str) -> Result<(), FixtureError> {
        self.writes
            .lock()
            .expect("writes lock")
            .push(line.to_string());
        Ok(())
    }
}

/// Transport double that hands out queued responses in FIFO order and keeps
/// every request it was asked to send.
#[derive(Default, Clone)]
pub struct FakeTransport {
    responses: Arc<Mutex<Vec<Result<HttpResponse, FixtureError>>>>,
    sent: Arc<Mutex<Vec<HttpRequest>>>,
}

impl FakeTransport {
    pub fn push_response(&self, response: Result<HttpResponse, FixtureError>) {
        self.responses
            .lock()
            .expect("responses lock")
            .push(response);
    }

    pub fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().expect("sent lock").clone()
    }
}

impl HttpTransport for FakeTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, FixtureError> {
        self.sent.lock().expect("sent lock").push(request);
        let mut responses = self.responses.lock().expect("responses lock");
        if responses.is_empty() {
            return Err(FixtureError::Transport(
                "no fake response queued".to_string(),
            ));
        }
        responses.remove(0)
    }
}
