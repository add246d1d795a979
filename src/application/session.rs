//! Engine session state machine.
//!
//! An [`EngineSession`] only exists once the engine accepted `open`, so a
//! failed open never leads to a finalize call. From then on the session is
//! finalized exactly once: explicitly through [`EngineSession::close`], or by
//! `Drop` on every early return, error propagation or unwinding panic.

use super::buffer::{BufferChannel, DOCUMENT_CAPACITY, EXPORT_CAPACITY, last_error};
use crate::domain::ports::{BoletoLibrary, CepLibrary, NativeLibrary};
use crate::error::{GatewayError, Result, Stage};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    ListCleared,
    TitlesSubmitted,
    OutputConfigured,
    Finalized,
    Failed,
}

impl SessionState {
    /// States in which the engine is open and healthy.
    const OPEN: [SessionState; 4] = [
        SessionState::Initialized,
        SessionState::ListCleared,
        SessionState::TitlesSubmitted,
        SessionState::OutputConfigured,
    ];
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Initialized => "initialized",
            SessionState::ListCleared => "list cleared",
            SessionState::TitlesSubmitted => "titles submitted",
            SessionState::OutputConfigured => "output configured",
            SessionState::Finalized => "finalized",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One open→close walk against a native engine.
pub struct EngineSession<'a, L: NativeLibrary + ?Sized> {
    library: &'a L,
    state: SessionState,
}

impl<'a, L: NativeLibrary + ?Sized> EngineSession<'a, L> {
    /// Opens the engine with the configuration file at `config_path`.
    pub fn open(library: &'a L, config_path: &Path, crypt_key: &str) -> Result<Self> {
        let config = config_path.to_string_lossy();
        debug!(config = %config, "opening engine session");

        let code = library.open(&config, crypt_key);
        if code != 0 {
            let message = last_error(library);
            warn!(code, %message, "engine rejected open");
            return Err(GatewayError::EngineOpenFailed { code, message });
        }

        info!("engine session opened");
        Ok(Self {
            library,
            state: SessionState::Initialized,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Finalizes the engine. A finalize failure is logged and never replaces
    /// the outcome already decided by the caller.
    pub fn close(mut self) -> i32 {
        self.finalize()
    }

    fn finalize(&mut self) -> i32 {
        if self.state == SessionState::Finalized {
            return 0;
        }
        let code = self.library.finalize();
        if code != 0 {
            let message = last_error(self.library);
            warn!(code, %message, "engine finalize failed");
        }
        info!(from = %self.state, "engine session closed");
        self.state = SessionState::Finalized;
        code
    }

    fn require(&self, stage: Stage, allowed: &[SessionState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(GatewayError::InvalidState {
                stage,
                state: self.state.to_string(),
            })
        }
    }

    /// Maps a result code to `Ok`, pulling the engine message on failure.
    fn check(&mut self, stage: Stage, code: i32) -> Result<()> {
        if code == 0 {
            debug!(%stage, "engine step succeeded");
            return Ok(());
        }
        let message = last_error(self.library);
        warn!(%stage, code, %message, "engine step failed");
        self.state = SessionState::Failed;
        Err(GatewayError::EngineStepFailed {
            stage,
            code,
            message,
        })
    }
}

impl<L: NativeLibrary + ?Sized> Drop for EngineSession<'_, L> {
    fn drop(&mut self) {
        if self.state != SessionState::Finalized {
            self.finalize();
        }
    }
}

impl<L: BoletoLibrary + ?Sized> EngineSession<'_, L> {
    /// Empties the engine title list. The list outlives sessions, so this
    /// runs before every submission.
    pub fn clear(&mut self) -> Result<()> {
        self.require(Stage::Clear, &[SessionState::Initialized])?;
        let code = self.library.clear_list();
        self.check(Stage::Clear, code)?;
        self.state = SessionState::ListCleared;
        Ok(())
    }

    pub fn submit(&mut self, batch_path: &Path, mode: &str) -> Result<()> {
        self.require(Stage::Submit, &[SessionState::ListCleared])?;
        let code = self
            .library
            .submit_batch(&batch_path.to_string_lossy(), mode);
        self.check(Stage::Submit, code)?;
        self.state = SessionState::TitlesSubmitted;
        Ok(())
    }

    /// Compares the engine's title count with the number submitted.
    pub fn verify_count(&mut self, expected: usize) -> Result<()> {
        self.require(
            Stage::VerifyCount,
            &[SessionState::TitlesSubmitted, SessionState::OutputConfigured],
        )?;
        let reported = self.library.total_count();
        if usize::try_from(reported).ok() == Some(expected) {
            return Ok(());
        }
        warn!(expected, reported, "engine title count mismatch");
        self.state = SessionState::Failed;
        Err(GatewayError::CountMismatch { expected, reported })
    }

    /// Points the engine at its output directory. Best effort: a refusal is
    /// logged and the session moves on.
    pub fn configure_output_directory(&mut self, dir: &Path) -> Result<()> {
        self.require(
            Stage::ConfigureOutput,
            &[SessionState::TitlesSubmitted, SessionState::OutputConfigured],
        )?;
        let code = self.library.set_output_dir(&dir.to_string_lossy(), "");
        if code != 0 {
            let message = last_error(self.library);
            warn!(code, %message, dir = %dir.display(), "engine refused output directory");
        }
        self.state = SessionState::OutputConfigured;
        Ok(())
    }

    pub fn generate_document(&mut self) -> Result<Vec<u8>> {
        self.require(Stage::Generate, &[SessionState::OutputConfigured])?;
        let library = self.library;
        let reply = BufferChannel::new(DOCUMENT_CAPACITY)
            .invoke(|buffer, size| library.generate_output(buffer, size));
        self.check(Stage::Generate, reply.code)?;
        Ok(reply.bytes)
    }

    /// Engine name and version.
    pub fn describe(&mut self) -> Result<(String, String)> {
        self.require(Stage::Info, &SessionState::OPEN)?;
        let library = self.library;
        let channel = BufferChannel::default();

        let name = channel.invoke(|buffer, size| library.name(buffer, size));
        self.check(Stage::Info, name.code)?;
        let version = channel.invoke(|buffer, size| library.version(buffer, size));
        self.check(Stage::Info, version.code)?;
        Ok((name.text(), version.text()))
    }

    /// Full configuration as currently loaded by the engine.
    pub fn export_config(&mut self) -> Result<String> {
        self.require(Stage::Export, &SessionState::OPEN)?;
        let library = self.library;
        let reply = BufferChannel::new(EXPORT_CAPACITY)
            .invoke(|buffer, size| library.config_export(buffer, size));
        self.check(Stage::Export, reply.code)?;
        Ok(reply.text())
    }
}

impl<L: CepLibrary + ?Sized> EngineSession<'_, L> {
    pub fn lookup(&mut self, cep: &str) -> Result<String> {
        self.require(Stage::Lookup, &[SessionState::Initialized])?;
        let library = self.library;
        let reply = BufferChannel::default().invoke(|buffer, size| library.lookup(cep, buffer, size));
        self.check(Stage::Lookup, reply.code)?;
        Ok(reply.text())
    }
}
