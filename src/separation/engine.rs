//! Shared separation engine lifecycle
//!
//! Loading a separation model is expensive, so one [`EngineHandle`] is created
//! per process and shared by every track. The engine is built lazily on first
//! use, exactly once; a failed construction is remembered and reported on every
//! later call rather than retried. Access is serialized through a mutex.

use super::center::CenterCancelEngine;
use super::traits::{SeparationEngine, StemSet};
use crate::error::{Result, VocalprepError};
use crate::types::StereoBuffer;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Which separation backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    /// ONNX model when available, otherwise center-cancel
    #[default]
    Auto,
    /// ONNX Runtime model (requires the `stems` feature)
    Onnx,
    /// Mid/side split, no model needed
    CenterCancel,
}

type EngineFactory = Box<dyn FnOnce() -> Result<Box<dyn SeparationEngine>> + Send>;

enum EngineState {
    Pending(EngineFactory),
    Ready(Box<dyn SeparationEngine>),
    Failed(String),
    ShutDown,
}

/// Lazily constructed, process-wide separation engine
pub struct EngineHandle {
    state: Mutex<EngineState>,
}

impl EngineHandle {
    /// Defer construction to the first call that needs the engine
    pub fn new<F>(factory: F) -> Self
    where
        F: FnOnce() -> Result<Box<dyn SeparationEngine>> + Send + 'static,
    {
        Self {
            state: Mutex::new(EngineState::Pending(Box::new(factory))),
        }
    }

    /// Wrap an already constructed engine
    pub fn from_engine<E: SeparationEngine + 'static>(engine: E) -> Self {
        Self {
            state: Mutex::new(EngineState::Ready(Box::new(engine))),
        }
    }

    /// Lazily build the engine selected on the command line
    pub fn from_settings(kind: EngineKind, model_path: Option<PathBuf>) -> Self {
        Self::new(move || build_engine(kind, model_path.as_deref()))
    }

    /// Input sample rate the engine requires, constructing it if needed
    pub fn required_sample_rate(&self) -> Result<Option<u32>> {
        self.with_engine(|engine| Ok(engine.sample_rate()))
    }

    /// Separate a waveform, constructing the engine if needed
    pub fn separate(&self, audio: &StereoBuffer) -> Result<StemSet> {
        self.with_engine(|engine| {
            debug!("Separating with {}", engine.name());
            engine.separate(audio)
        })
    }

    /// Name of the constructed engine, if it has been built
    pub fn engine_name(&self) -> Option<&'static str> {
        match &*self.lock().ok()? {
            EngineState::Ready(engine) => Some(engine.name()),
            _ => None,
        }
    }

    /// Whether construction has been attempted
    pub fn is_initialized(&self) -> bool {
        match self.lock() {
            Ok(state) => !matches!(&*state, EngineState::Pending(_)),
            Err(_) => true,
        }
    }

    /// Release the engine; later calls fail with `EngineUnavailable`
    pub fn shutdown(&self) {
        let previous = match self.state.lock() {
            Ok(mut state) => std::mem::replace(&mut *state, EngineState::ShutDown),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), EngineState::ShutDown),
        };
        if let EngineState::Ready(engine) = previous {
            info!("Shutting down {} engine", engine.name());
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, EngineState>> {
        self.state
            .lock()
            .map_err(|_| VocalprepError::engine_error("separation engine lock poisoned"))
    }

    fn with_engine<R>(
        &self,
        f: impl FnOnce(&mut dyn SeparationEngine) -> Result<R>,
    ) -> Result<R> {
        let mut state = self.lock()?;

        let current = std::mem::replace(&mut *state, EngineState::ShutDown);
        *state = match current {
            EngineState::Pending(factory) => match factory() {
                Ok(engine) => {
                    info!("Separation engine ready: {}", engine.name());
                    EngineState::Ready(engine)
                }
                Err(e) => {
                    warn!("Separation engine failed to initialize: {}", e);
                    EngineState::Failed(failure_reason(e))
                }
            },
            other => other,
        };

        match &mut *state {
            EngineState::Ready(engine) => f(engine.as_mut()),
            EngineState::Failed(reason) => Err(VocalprepError::engine_unavailable(reason.clone())),
            EngineState::ShutDown => Err(VocalprepError::engine_unavailable(
                "separation engine has been shut down",
            )),
            EngineState::Pending(_) => Err(VocalprepError::engine_error(
                "separation engine was not initialized",
            )),
        }
    }
}

fn failure_reason(err: VocalprepError) -> String {
    match err {
        VocalprepError::EngineUnavailable { reason } | VocalprepError::EngineError { reason } => {
            reason
        }
        other => other.to_string(),
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Construct the engine for a backend selection
pub fn build_engine(
    kind: EngineKind,
    model_path: Option<&std::path::Path>,
) -> Result<Box<dyn SeparationEngine>> {
    match kind {
        EngineKind::CenterCancel => Ok(Box::new(CenterCancelEngine::new())),
        EngineKind::Onnx => build_onnx(model_path),
        EngineKind::Auto => match build_onnx(model_path) {
            Ok(engine) => Ok(engine),
            Err(e) => {
                info!("ONNX engine unavailable ({}), using center-cancel", e);
                Ok(Box::new(CenterCancelEngine::new()))
            }
        },
    }
}

#[cfg(feature = "stems")]
fn build_onnx(model_path: Option<&std::path::Path>) -> Result<Box<dyn SeparationEngine>> {
    let path = super::model::find_model_path(model_path)?;
    Ok(Box::new(super::onnx::OrtSeparationEngine::new(&path)?))
}

#[cfg(not(feature = "stems"))]
fn build_onnx(_model_path: Option<&std::path::Path>) -> Result<Box<dyn SeparationEngine>> {
    Err(VocalprepError::engine_feature_disabled())
}
