use crate::domain::ports::{BoletoLibrary, CepLibrary, NativeLibrary};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::Receiver;

/// Result code for calls issued before `open`.
pub const NOT_INITIALIZED: i32 = -10;
/// Result code for unreadable input files.
pub const FILE_ERROR: i32 = -5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeOp {
    Open,
    Finalize,
    LastError,
    ClearList,
    SubmitBatch,
    TotalCount,
    SetOutputDir,
    GenerateOutput,
    Name,
    Version,
    ConfigExport,
    Lookup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeCall {
    pub op: NativeOp,
    pub argument: Option<String>,
}

#[derive(Debug, Default)]
struct ScriptState {
    calls: Vec<NativeCall>,
    failures: HashMap<NativeOp, (i32, String)>,
    reported_total: Option<i32>,
    document: Option<Vec<u8>>,
    addresses: HashMap<String, String>,
    is_open: bool,
    overlapping_opens: usize,
    config: String,
    titles: Vec<String>,
    last_error: String,
    submit_gate: Option<Receiver<()>>,
}

impl ScriptState {
    fn record(&mut self, op: NativeOp, argument: Option<&str>) {
        self.calls.push(NativeCall {
            op,
            argument: argument.map(str::to_string),
        });
    }

    fn fail(&mut self, code: i32, message: impl Into<String>) -> i32 {
        self.last_error = message.into();
        code
    }

    /// Injected failure or missing `open`, checked before running an op.
    fn precheck(&mut self, op: NativeOp) -> Option<i32> {
        if let Some((code, message)) = self.failures.get(&op).cloned() {
            return Some(self.fail(code, message));
        }
        if !self.is_open && op != NativeOp::Open {
            return Some(self.fail(NOT_INITIALIZED, "Biblioteca não inicializada"));
        }
        None
    }
}

/// In-process engine implementing both call surfaces.
///
/// Behaves like the native libraries where the gateway can observe it: the
/// title list survives across sessions until cleared, submitted batch files
/// are read to count `[Titulo<N>]` sections, replies are written into the
/// caller buffer and report their full length even when cut short, and every
/// call is recorded. Clones share state, so a test can keep a handle while the
/// service owns the boxed library.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLibrary {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call of `op` fail with `code`, leaving `message` as last error.
    pub fn fail_on(self, op: NativeOp, code: i32, message: &str) -> Self {
        self.state
            .lock()
            .failures
            .insert(op, (code, message.to_string()));
        self
    }

    /// Overrides the title count reported by the engine.
    pub fn report_total(self, total: i32) -> Self {
        self.state.lock().reported_total = Some(total);
        self
    }

    /// Replaces the synthetic document produced by `generate_output`.
    pub fn with_document(self, document: Vec<u8>) -> Self {
        self.state.lock().document = Some(document);
        self
    }

    /// Makes the next `submit_batch` block until `release` receives a message
    /// or its sender is dropped. The call is recorded before it blocks.
    pub fn hold_submit(self, release: Receiver<()>) -> Self {
        self.state.lock().submit_gate = Some(release);
        self
    }

    pub fn with_address(self, cep: &str, address: &str) -> Self {
        self.state
            .lock()
            .addresses
            .insert(cep.to_string(), address.to_string());
        self
    }

    pub fn calls(&self) -> Vec<NativeCall> {
        self.state.lock().calls.clone()
    }

    pub fn ops(&self) -> Vec<NativeOp> {
        self.state.lock().calls.iter().map(|call| call.op).collect()
    }

    pub fn count(&self, op: NativeOp) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.op == op)
            .count()
    }

    /// Arguments passed to every call of `op`, in call order.
    pub fn arguments(&self, op: NativeOp) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.op == op)
            .filter_map(|call| call.argument.clone())
            .collect()
    }

    /// Number of `open` calls made while a session was already open.
    pub fn overlapping_opens(&self) -> usize {
        self.state.lock().overlapping_opens
    }

    /// Titles currently held in the engine list.
    pub fn titles(&self) -> Vec<String> {
        self.state.lock().titles.clone()
    }

    /// Configuration text read by the last successful `open`.
    pub fn loaded_config(&self) -> String {
        self.state.lock().config.clone()
    }
}

fn write_reply(buffer: &mut [u8], size: &mut i32, reply: &[u8]) {
    let written = reply.len().min(buffer.len());
    buffer[..written].copy_from_slice(&reply[..written]);
    *size = i32::try_from(reply.len()).unwrap_or(i32::MAX);
}

fn count_titles(batch: &str) -> Vec<String> {
    batch
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix("[Titulo")?.strip_suffix(']'))
        .map(str::to_string)
        .collect()
}

impl NativeLibrary for ScriptedLibrary {
    fn open(&self, config_path: &str, _crypt_key: &str) -> i32 {
        let mut state = self.state.lock();
        state.record(NativeOp::Open, Some(config_path));
        if state.is_open {
            state.overlapping_opens += 1;
        }
        if let Some(code) = state.precheck(NativeOp::Open) {
            return code;
        }
        match std::fs::read_to_string(config_path) {
            Ok(config) => {
                state.config = config;
                state.is_open = true;
                0
            }
            Err(_) => state.fail(
                FILE_ERROR,
                format!("Arquivo de configuração não encontrado: {config_path}"),
            ),
        }
    }

    fn finalize(&self) -> i32 {
        let mut state = self.state.lock();
        state.record(NativeOp::Finalize, None);
        if let Some(code) = state.precheck(NativeOp::Finalize) {
            state.is_open = false;
            return code;
        }
        state.is_open = false;
        0
    }

    fn last_error(&self, buffer: &mut [u8], size: &mut i32) -> i32 {
        let mut state = self.state.lock();
        state.record(NativeOp::LastError, None);
        write_reply(buffer, size, state.last_error.as_bytes());
        0
    }
}

impl BoletoLibrary for ScriptedLibrary {
    fn clear_list(&self) -> i32 {
        let mut state = self.state.lock();
        state.record(NativeOp::ClearList, None);
        if let Some(code) = state.precheck(NativeOp::ClearList) {
            return code;
        }
        state.titles.clear();
        0
    }

    fn submit_batch(&self, batch_path: &str, mode: &str) -> i32 {
        let gate = {
            let mut state = self.state.lock();
            state.record(NativeOp::SubmitBatch, Some(batch_path));
            if let Some(code) = state.precheck(NativeOp::SubmitBatch) {
                return code;
            }
            state.submit_gate.take()
        };
        if let Some(release) = gate {
            // waits without the state lock so callers can inspect the calls
            let _ = release.recv();
        }

        let mut state = self.state.lock();
        tracing::trace!(mode, "scripted engine received batch");
        match std::fs::read_to_string(batch_path) {
            Ok(batch) => {
                let titles = count_titles(&batch);
                state.titles.extend(titles);
                0
            }
            Err(err) => state.fail(FILE_ERROR, format!("Erro ao ler {batch_path}: {err}")),
        }
    }

    fn total_count(&self) -> i32 {
        let mut state = self.state.lock();
        state.record(NativeOp::TotalCount, None);
        if let Some(code) = state.precheck(NativeOp::TotalCount) {
            return code;
        }
        state
            .reported_total
            .unwrap_or_else(|| i32::try_from(state.titles.len()).unwrap_or(i32::MAX))
    }

    fn set_output_dir(&self, dir: &str, _file_name: &str) -> i32 {
        let mut state = self.state.lock();
        state.record(NativeOp::SetOutputDir, Some(dir));
        state.precheck(NativeOp::SetOutputDir).unwrap_or(0)
    }

    fn generate_output(&self, buffer: &mut [u8], size: &mut i32) -> i32 {
        let mut state = self.state.lock();
        state.record(NativeOp::GenerateOutput, None);
        if let Some(code) = state.precheck(NativeOp::GenerateOutput) {
            return code;
        }
        let document = state.document.clone().unwrap_or_else(|| {
            format!(
                "%PDF-1.4\n% boletos: {}\n%%EOF\n",
                state.titles.len()
            )
            .into_bytes()
        });
        write_reply(buffer, size, &document);
        0
    }

    fn name(&self, buffer: &mut [u8], size: &mut i32) -> i32 {
        let mut state = self.state.lock();
        state.record(NativeOp::Name, None);
        if let Some(code) = state.precheck(NativeOp::Name) {
            return code;
        }
        write_reply(buffer, size, b"ACBrLibBoleto");
        0
    }

    fn version(&self, buffer: &mut [u8], size: &mut i32) -> i32 {
        let mut state = self.state.lock();
        state.record(NativeOp::Version, None);
        if let Some(code) = state.precheck(NativeOp::Version) {
            return code;
        }
        write_reply(buffer, size, env!("CARGO_PKG_VERSION").as_bytes());
        0
    }

    fn config_export(&self, buffer: &mut [u8], size: &mut i32) -> i32 {
        let mut state = self.state.lock();
        state.record(NativeOp::ConfigExport, None);
        if let Some(code) = state.precheck(NativeOp::ConfigExport) {
            return code;
        }
        let config = state.config.clone();
        write_reply(buffer, size, config.as_bytes());
        0
    }
}

impl CepLibrary for ScriptedLibrary {
    fn lookup(&self, cep: &str, buffer: &mut [u8], size: &mut i32) -> i32 {
        let mut state = self.state.lock();
        state.record(NativeOp::Lookup, Some(cep));
        if let Some(code) = state.precheck(NativeOp::Lookup) {
            return code;
        }
        match state.addresses.get(cep).cloned() {
            Some(address) => {
                write_reply(buffer, size, address.as_bytes());
                0
            }
            None => state.fail(-1, format!("CEP não encontrado: {cep}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_calls_before_open_fail() {
        let library = ScriptedLibrary::new();
        assert_eq!(library.clear_list(), NOT_INITIALIZED);

        let mut buffer = [0u8; 64];
        let mut size = 64;
        library.last_error(&mut buffer, &mut size);
        assert_eq!(&buffer[..size as usize], "Biblioteca não inicializada".as_bytes());
    }

    #[test]
    fn test_title_list_survives_sessions_until_cleared() {
        let mut config = tempfile::NamedTempFile::new().unwrap();
        writeln!(config, "[Principal]").unwrap();
        let mut batch = tempfile::NamedTempFile::new().unwrap();
        writeln!(batch, "[Titulo1]\nA=1\n\n[Titulo2]\nA=2").unwrap();

        let library = ScriptedLibrary::new();
        let config_path = config.path().to_str().unwrap();
        let batch_path = batch.path().to_str().unwrap();

        assert_eq!(library.open(config_path, ""), 0);
        assert_eq!(library.submit_batch(batch_path, ""), 0);
        assert_eq!(library.finalize(), 0);

        assert_eq!(library.open(config_path, ""), 0);
        assert_eq!(library.total_count(), 2);
        assert_eq!(library.clear_list(), 0);
        assert_eq!(library.total_count(), 0);
        assert_eq!(library.titles(), Vec::<String>::new());
        assert_eq!(library.overlapping_opens(), 0);
    }

    #[test]
    fn test_reply_reports_full_length() {
        let mut buffer = [0u8; 4];
        let mut size = 4;
        write_reply(&mut buffer, &mut size, b"abcdef");
        assert_eq!(&buffer, b"abcd");
        assert_eq!(size, 6);
    }
}
