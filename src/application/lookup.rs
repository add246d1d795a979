use super::session::EngineSession;
use crate::config::GatewayConfig;
use crate::domain::ports::CepLibraryBox;
use crate::domain::request::{LookupRequest, LookupResponse};
use crate::error::{GatewayError, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Postal code lookup. Same session discipline as [`super::orchestrator::BoletoService`]
/// with a shorter walk: open, lookup, close. The lookup engine has its own lock.
pub struct CepService {
    library: Arc<Mutex<CepLibraryBox>>,
    config: Arc<GatewayConfig>,
}

impl CepService {
    pub fn new(library: CepLibraryBox, config: GatewayConfig) -> Self {
        Self {
            library: Arc::new(Mutex::new(library)),
            config: Arc::new(config),
        }
    }

    pub async fn lookup(&self, request: LookupRequest) -> LookupResponse {
        let cep = request.cep.unwrap_or_default();
        match self.find(&cep).await {
            Ok(data) => {
                info!(cep = %cep, "cep lookup succeeded");
                LookupResponse::found(data)
            }
            Err(err) => {
                error!(cep = %cep, error = %err, "cep lookup failed");
                LookupResponse::failure(&err)
            }
        }
    }

    pub async fn find(&self, cep: &str) -> Result<String> {
        let cep = cep.trim().to_string();
        if cep.is_empty() {
            return Err(GatewayError::InvalidRequest("CEP é obrigatório".to_string()));
        }
        if !self.config.cep_template.is_file() {
            return Err(GatewayError::ConfigMissing {
                path: self.config.cep_template.clone(),
            });
        }

        let config = Arc::clone(&self.config);
        let guard = Arc::clone(&self.library).lock_owned().await;
        tokio::task::spawn_blocking(move || {
            let mut session = EngineSession::open(&**guard, &config.cep_template, &config.crypt_key)?;
            let address = session.lookup(&cep)?;
            session.close();
            Ok(address)
        })
        .await
        .map_err(|err| GatewayError::Internal(format!("engine task failed: {err}")))?
    }
}
