//! Text-generation collaborator: async calls with timeout, cancellation and
//! deterministic fallbacks.
//!
//! The engine's own state transitions never wait on these calls. Callers
//! build a request from session state, await the [`Narrator`], and write the
//! resulting text back through a normal session operation.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

use crate::core::requests::{
    Fallback, GentlerSceneRequest, ReflectionRequest, RegulationBeatRequest, SafetyCheck, SafetyVerdict,
    SceneRequest,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("collaborator returned an empty response")]
    EmptyResponse,
    #[error("collaborator timed out after {0:?}")]
    TimedOut(Duration),
    #[error("request cancelled")]
    Cancelled,
}

/// An external text-generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn scene(&self, request: &SceneRequest) -> Result<String, CollaboratorError>;

    async fn regulation_beat(&self, request: &RegulationBeatRequest) -> Result<String, CollaboratorError>;

    async fn reflection(&self, request: &ReflectionRequest) -> Result<String, CollaboratorError>;

    async fn gentler_scene(&self, request: &GentlerSceneRequest) -> Result<String, CollaboratorError>;

    async fn safety(&self, request: &SafetyCheck) -> Result<SafetyVerdict, CollaboratorError>;
}

/// A generator with no backing service; every call falls back.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGenerator;

fn offline<T>() -> Result<T, CollaboratorError> {
    Err(CollaboratorError::Unavailable("offline".to_string()))
}

#[async_trait]
impl TextGenerator for OfflineGenerator {
    async fn scene(&self, _: &SceneRequest) -> Result<String, CollaboratorError> {
        offline()
    }

    async fn regulation_beat(&self, _: &RegulationBeatRequest) -> Result<String, CollaboratorError> {
        offline()
    }

    async fn reflection(&self, _: &ReflectionRequest) -> Result<String, CollaboratorError> {
        offline()
    }

    async fn gentler_scene(&self, _: &GentlerSceneRequest) -> Result<String, CollaboratorError> {
        offline()
    }

    async fn safety(&self, _: &SafetyCheck) -> Result<SafetyVerdict, CollaboratorError> {
        offline()
    }
}

/// Owner side of a cancellation signal.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Observer side of a cancellation signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelHandle {
    pub fn new() -> (CancelHandle, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, CancelToken { rx })
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CancelToken {
    /// A token that never fires.
    pub fn never() -> CancelToken {
        CancelHandle::new().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Never resolves if the handle
    /// was dropped without cancelling.
    pub async fn cancelled(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// The value produced for a request and, when it is a fallback, why.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated<T> {
    pub value: T,
    pub fallback_reason: Option<CollaboratorError>,
}

impl<T> Generated<T> {
    pub fn is_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

fn non_empty(result: Result<String, CollaboratorError>) -> Result<String, CollaboratorError> {
    match result {
        Ok(text) if text.trim().is_empty() => Err(CollaboratorError::EmptyResponse),
        other => other,
    }
}

/// Wraps a [`TextGenerator`] so every call is bounded and never fails.
#[derive(Clone)]
pub struct Narrator {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl Narrator {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// A narrator that always answers with fallbacks.
    pub fn offline() -> Self {
        Self::new(Arc::new(OfflineGenerator), Duration::ZERO)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn guard<R, Fut>(&self, request: &R, call: Fut, cancel: &CancelToken) -> Generated<R::Output>
    where
        R: Fallback,
        Fut: Future<Output = Result<R::Output, CollaboratorError>>,
    {
        let mut cancel = cancel.clone();
        let outcome = if cancel.is_cancelled() {
            Err(CollaboratorError::Cancelled)
        } else {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(CollaboratorError::Cancelled),
                result = tokio::time::timeout(self.timeout, call) => match result {
                    Ok(inner) => inner,
                    Err(_) => Err(CollaboratorError::TimedOut(self.timeout)),
                },
            }
        };

        match outcome {
            Ok(value) => Generated {
                value,
                fallback_reason: None,
            },
            Err(error) => {
                tracing::warn!(%error, "text generation failed, using local fallback");
                Generated {
                    value: request.fallback(),
                    fallback_reason: Some(error),
                }
            }
        }
    }

    pub async fn scene(&self, request: &SceneRequest, cancel: &CancelToken) -> Generated<String> {
        let call = async { non_empty(self.generator.scene(request).await) };
        self.guard(request, call, cancel).await
    }

    pub async fn regulation_beat(&self, request: &RegulationBeatRequest, cancel: &CancelToken) -> Generated<String> {
        let call = async { non_empty(self.generator.regulation_beat(request).await) };
        self.guard(request, call, cancel).await
    }

    pub async fn reflection(&self, request: &ReflectionRequest, cancel: &CancelToken) -> Generated<String> {
        let call = async { non_empty(self.generator.reflection(request).await) };
        self.guard(request, call, cancel).await
    }

    pub async fn gentler_scene(&self, request: &GentlerSceneRequest, cancel: &CancelToken) -> Generated<String> {
        let call = async { non_empty(self.generator.gentler_scene(request).await) };
        self.guard(request, call, cancel).await
    }

    pub async fn safety(&self, request: &SafetyCheck, cancel: &CancelToken) -> Generated<SafetyVerdict> {
        self.guard(request, self.generator.safety(request), cancel).await
    }
}
