use tracing::debug;
use tracing::info;
use tracing::warn;
use vchat_backend_client::ModelCheck;

use crate::backend::ChatBackend;

/// Extra facts the health endpoint reports alongside `available`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelDetails {
    pub target_model: Option<String>,
    pub available_models: Vec<String>,
    pub ollama_running: Option<bool>,
}

impl From<&ModelCheck> for ModelDetails {
    fn from(check: &ModelCheck) -> Self {
        Self {
            target_model: check.target_model.clone(),
            available_models: check.available_models.clone(),
            ollama_running: check.ollama_running,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelStatus {
    Checking,
    Available(ModelDetails),
    Unavailable {
        reason: String,
        details: Option<ModelDetails>,
    },
}

/// Flat view of [`ModelStatus`] for renderers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionStatus {
    pub checking: bool,
    pub available: bool,
    pub error_reason: Option<String>,
}

impl ModelStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, ModelStatus::Available(_))
    }

    pub fn is_checking(&self) -> bool {
        matches!(self, ModelStatus::Checking)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            ModelStatus::Unavailable { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn details(&self) -> Option<&ModelDetails> {
        match self {
            ModelStatus::Available(details) => Some(details),
            ModelStatus::Unavailable { details, .. } => details.as_ref(),
            ModelStatus::Checking => None,
        }
    }

    pub fn flat(&self) -> SessionStatus {
        SessionStatus {
            checking: self.is_checking(),
            available: self.is_available(),
            error_reason: self.reason().map(str::to_string),
        }
    }
}

/// Owns the backend availability indicator. Nothing else writes it.
#[derive(Clone, Debug)]
pub struct ModelAvailabilityMonitor {
    status: ModelStatus,
}

impl ModelAvailabilityMonitor {
    pub fn new() -> Self {
        Self {
            status: ModelStatus::Checking,
        }
    }

    pub fn status(&self) -> &ModelStatus {
        &self.status
    }

    pub fn begin_check(&mut self) {
        self.status = ModelStatus::Checking;
    }

    /// Settle the status from the outcome of a health query.
    pub fn apply_result(&mut self, result: anyhow::Result<ModelCheck>) -> &ModelStatus {
        self.status = match result {
            Ok(check) if check.available => {
                info!(target_model = ?check.target_model, "model available");
                ModelStatus::Available(ModelDetails::from(&check))
            }
            Ok(check) => {
                let reason = unavailable_reason(&check);
                warn!("model unavailable: {reason}");
                ModelStatus::Unavailable {
                    reason,
                    details: Some(ModelDetails::from(&check)),
                }
            }
            Err(err) => {
                debug!("health check failed: {err:#}");
                ModelStatus::Unavailable {
                    reason: format!("Cannot connect to backend server: {err}"),
                    details: None,
                }
            }
        };
        &self.status
    }

    /// Query the backend once and settle the status. No retry.
    pub async fn check_status(&mut self, backend: &dyn ChatBackend) -> &ModelStatus {
        self.begin_check();
        let result = backend.check_model().await;
        self.apply_result(result)
    }
}

impl Default for ModelAvailabilityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn unavailable_reason(check: &ModelCheck) -> String {
    if let Some(error) = check.error.as_deref().filter(|e| !e.trim().is_empty()) {
        return error.to_string();
    }
    match check.target_model.as_deref() {
        Some(model) => format!("Model {model} is not available"),
        None => "Model is not available".to_string(),
    }
}
