//! The fixture double itself: a transport that either records real traffic
//! into the fixture store or serves it back from there.

use crate::config::FixtureConfig;
use crate::errors::FixtureError;
use crate::fingerprint::ScopeId;
use crate::logging::{JsonlLogger, LogEvent};
use crate::normalizer::Normalizer;
use crate::replay::recording::{portable_response, restore_response, PortableRequest};
use crate::runtime::{FileSystem, HttpTransport};
use crate::store::FixtureStore;
use crate::types::{FixtureMode, HttpRequest, HttpResponse};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

enum RouteMode {
    Record {
        transport: Arc<dyn HttpTransport>,
        has_recorded_once: AtomicBool,
    },
    Replay,
}

/// Routes each request of one test scope to the real transport (recording
/// it) or to its stored fixture. The mode is fixed at construction.
///
/// One router serves one scope; the first recorded request wipes that
/// scope's fixtures from earlier runs before anything new is written.
pub struct InteractionRouter {
    scope: ScopeId,
    store: FixtureStore,
    normalizer: Normalizer,
    mode: RouteMode,
    logger: Option<JsonlLogger>,
}

impl InteractionRouter {
    pub fn record(
        test_name: &str,
        store: FixtureStore,
        normalizer: Normalizer,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            scope: ScopeId::from_test_name(test_name),
            store,
            normalizer,
            mode: RouteMode::Record {
                transport,
                has_recorded_once: AtomicBool::new(false),
            },
            logger: None,
        }
    }

    pub fn replay(test_name: &str, store: FixtureStore, normalizer: Normalizer) -> Self {
        Self {
            scope: ScopeId::from_test_name(test_name),
            store,
            normalizer,
            mode: RouteMode::Replay,
            logger: None,
        }
    }

    /// Builds the router the configuration asks for. Recording needs the
    /// real transport; replaying ignores it.
    pub fn from_config(
        cfg: &FixtureConfig,
        test_name: &str,
        fs: Arc<dyn FileSystem>,
        transport: Option<Arc<dyn HttpTransport>>,
    ) -> Result<Self, FixtureError> {
        let store = FixtureStore::new(cfg.fixtures.root.clone(), fs);
        let normalizer = Normalizer::new(
            cfg.project.project_id.clone(),
            cfg.project.api_key.clone(),
        );
        let router = match cfg.fixture_mode() {
            FixtureMode::Record => {
                let transport = transport.ok_or_else(|| {
                    FixtureError::InvalidConfig(
                        "record mode requires a real transport".to_string(),
                    )
                })?;
                Self::record(test_name, store, normalizer, transport)
            }
            FixtureMode::Replay => Self::replay(test_name, store, normalizer),
        };
        Ok(match &cfg.logging.path {
            Some(path) => {
                let mut logger = JsonlLogger::new(path);
                logger.max_payload_bytes = cfg.logging.max_payload_bytes;
                router.with_logger(logger)
            }
            None => router,
        })
    }

    pub fn with_logger(mut self, logger: JsonlLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn mode(&self) -> FixtureMode {
        match self.mode {
            RouteMode::Record { .. } => FixtureMode::Record,
            RouteMode::Replay => FixtureMode::Replay,
        }
    }

    pub fn scope(&self) -> &ScopeId {
        &self.scope
    }

    pub fn store(&self) -> &FixtureStore {
        &self.store
    }

    pub fn handle(&self, request: HttpRequest) -> Result<HttpResponse, FixtureError> {
        let portable = PortableRequest::from_request(&request, &self.normalizer)?;
        match &self.mode {
            RouteMode::Record {
                transport,
                has_recorded_once,
            } => self.record_interaction(transport.as_ref(), has_recorded_once, request, portable),
            RouteMode::Replay => self.replay_interaction(portable),
        }
    }

    fn record_interaction(
        &self,
        transport: &dyn HttpTransport,
        has_recorded_once: &AtomicBool,
        request: HttpRequest,
        portable: PortableRequest,
    ) -> Result<HttpResponse, FixtureError> {
        if !has_recorded_once.swap(true, Ordering::SeqCst) {
            match self.store.clear(&self.scope) {
                Ok(existed) => self.log(
                    "info",
                    "scope_cleared",
                    json!({ "scope": self.scope.as_str(), "existed": existed }),
                ),
                Err(err) => {
                    // Let the next request retry the wipe.
                    has_recorded_once.store(false, Ordering::SeqCst);
                    return Err(err);
                }
            }
        }

        let response = transport.send(request)?;
        let (response_meta, response_content) = portable_response(&response, &self.normalizer)?;
        let dir = self
            .store
            .write(&self.scope, &portable, &response_meta, &response_content)?;
        self.log(
            "info",
            "fixture_recorded",
            json!({
                "scope": self.scope.as_str(),
                "method": portable.method,
                "target": portable.target,
                "fingerprint": portable.fingerprint.as_str(),
                "status": response.status,
                "path": dir.display().to_string(),
            }),
        );
        Ok(response)
    }

    fn replay_interaction(&self, portable: PortableRequest) -> Result<HttpResponse, FixtureError> {
        let artifacts = match self.store.read(&self.scope, &portable) {
            Ok(artifacts) => artifacts,
            Err(err) => {
                if let FixtureError::FixtureNotFound { path, .. } = &err {
                    self.log(
                        "error",
                        "fixture_missing",
                        json!({
                            "scope": self.scope.as_str(),
                            "method": portable.method,
                            "target": portable.target,
                            "fingerprint": portable.fingerprint.as_str(),
                            "path": path,
                        }),
                    );
                }
                return Err(err);
            }
        };
        let response = restore_response(&artifacts, &self.normalizer)?;
        self.log(
            "info",
            "fixture_replayed",
            json!({
                "scope": self.scope.as_str(),
                "method": portable.method,
                "fingerprint": portable.fingerprint.as_str(),
                "status": response.status,
            }),
        );
        Ok(response)
    }

    fn log(&self, level: &str, event_type: &str, payload: serde_json::Value) {
        if let Some(logger) = &self.logger {
            let _ = logger.append(&LogEvent {
                level,
                event_type,
                payload,
            });
        }
    }
}

impl HttpTransport for InteractionRouter {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, FixtureError> {
        self.handle(request)
    }
}
