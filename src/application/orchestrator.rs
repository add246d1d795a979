use super::session::EngineSession;
use crate::config::GatewayConfig;
use crate::domain::ports::{BoletoLibrary, BoletoLibraryBox};
use crate::domain::request::{BoletoRequest, BoletoResponse};
use crate::error::{GatewayError, Result};
use crate::infrastructure::artifacts::TempArtifactStore;
use crate::interfaces::ini::{BatchDocument, ConfigOverlay};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineInfo {
    pub name: String,
    pub version: String,
}

/// Entry point for payment slip generation.
///
/// `BoletoService` owns the engine binding. The engine is not reentrant, so the
/// binding sits behind an async mutex that is held from `open` to `close`; the
/// session itself runs on a blocking thread and always runs to completion,
/// even if the awaiting caller goes away.
pub struct BoletoService {
    library: Arc<Mutex<BoletoLibraryBox>>,
    config: Arc<GatewayConfig>,
    artifacts: TempArtifactStore,
}

impl BoletoService {
    /// Creates a new `BoletoService`.
    ///
    /// # Arguments
    ///
    /// * `library` - The engine binding, loaded once per process.
    /// * `config` - Asset locations and engine settings.
    pub fn new(library: BoletoLibraryBox, config: GatewayConfig) -> Self {
        let artifacts = TempArtifactStore::new(config.scratch_dir.clone());
        Self {
            library: Arc::new(Mutex::new(library)),
            config: Arc::new(config),
            artifacts,
        }
    }

    /// Runs one generation attempt and maps the outcome to a response.
    pub async fn generate(&self, request: BoletoRequest) -> BoletoResponse {
        let titles = request.titles.len();
        match self.attempt(request).await {
            Ok(document) => {
                info!(titles, rendered = document.is_some(), "boleto request succeeded");
                BoletoResponse::success(document.map(|bytes| STANDARD.encode(bytes)))
            }
            Err(err) => {
                error!(titles, stage = ?err.stage(), error = %err, "boleto request failed");
                BoletoResponse::failure(&err)
            }
        }
    }

    /// Runs one generation attempt, returning the rendered document when one
    /// was requested.
    #[instrument(skip_all, fields(bank = %request.bank.number, operation = ?request.operation))]
    pub async fn attempt(&self, request: BoletoRequest) -> Result<Option<Vec<u8>>> {
        let logo = self.config.logo_dir.join(request.bank.logo_file_name());
        if !self.config.logo_dir.is_dir() || !logo.is_file() {
            return Err(GatewayError::AssetMissing { path: logo });
        }

        let today = chrono::Local::now().date_naive();
        let config = Arc::clone(&self.config);
        let artifacts = self.artifacts.clone();
        self.with_library(move |library| run_attempt(library, &config, &artifacts, &request, today))
            .await
    }

    /// Engine name and version, read in a session of their own.
    pub async fn describe(&self) -> Result<EngineInfo> {
        let config = Arc::clone(&self.config);
        self.with_library(move |library| {
            let mut session = EngineSession::open(library, &config.boleto_template, &config.crypt_key)?;
            let (name, version) = session.describe()?;
            session.close();
            Ok(EngineInfo { name, version })
        })
        .await
    }

    /// Configuration the engine loads from the static template.
    pub async fn export_config(&self) -> Result<String> {
        let config = Arc::clone(&self.config);
        self.with_library(move |library| {
            let mut session = EngineSession::open(library, &config.boleto_template, &config.crypt_key)?;
            let exported = session.export_config()?;
            session.close();
            Ok(exported)
        })
        .await
    }

    /// Waits for exclusive use of the engine and runs `work` on a blocking
    /// thread while holding it.
    async fn with_library<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn BoletoLibrary) -> Result<T> + Send + 'static,
    {
        let guard = Arc::clone(&self.library).lock_owned().await;
        tokio::task::spawn_blocking(move || work(&**guard))
            .await
            .map_err(|err| GatewayError::Internal(format!("engine task failed: {err}")))?
    }
}

/// The session walk of one attempt. Artifacts and the session are scoped
/// guards: every early return releases both files and finalizes the engine.
fn run_attempt(
    library: &dyn BoletoLibrary,
    config: &GatewayConfig,
    artifacts: &TempArtifactStore,
    request: &BoletoRequest,
    today: NaiveDate,
) -> Result<Option<Vec<u8>>> {
    // Both documents are built before the engine is touched, so a malformed
    // request never opens a session.
    let overlay = ConfigOverlay::build(&config.boleto_template, &request.bank, &request.payee)?;
    let batch = BatchDocument::build(&request.titles, today)?;
    let config_file = artifacts.materialize("boleto_config_", &overlay.to_string())?;

    let mut session = EngineSession::open(library, config_file.path(), &config.crypt_key)?;
    session.clear()?;

    let batch_file = artifacts.materialize("boleto_titulos_", &batch.to_string())?;
    session.submit(batch_file.path(), request.operation.submit_mode())?;
    session.verify_count(batch.count())?;
    session.configure_output_directory(&config.output_dir)?;

    let document = if request.operation.renders_document() {
        Some(session.generate_document()?)
    } else {
        None
    };

    batch_file.release();
    config_file.release();
    session.close();
    Ok(document)
}
