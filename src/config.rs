use std::path::{Path, PathBuf};

pub const BOLETO_TEMPLATE: &str = "ACBrBoleto.ini";
pub const CEP_TEMPLATE: &str = "ACBrCep.ini";
pub const LOGO_DIR: &str = "logos";
pub const BOLETO_LIBRARY: &str = "lib/libacbrboleto64.so";
pub const CEP_LIBRARY: &str = "lib/libacbrcep64.so";

/// File locations and engine settings, all resolved from one base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub logo_dir: PathBuf,
    pub boleto_template: PathBuf,
    pub cep_template: PathBuf,
    pub boleto_library: PathBuf,
    pub cep_library: PathBuf,
    /// Where configuration and batch files are written for the engine.
    pub scratch_dir: PathBuf,
    /// Directory handed to the engine for the files it writes itself.
    pub output_dir: PathBuf,
    pub crypt_key: String,
}

impl GatewayConfig {
    pub fn from_base_dir(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let temp = std::env::temp_dir();
        Self {
            logo_dir: base.join(LOGO_DIR),
            boleto_template: base.join(BOLETO_TEMPLATE),
            cep_template: base.join(CEP_TEMPLATE),
            boleto_library: base.join(BOLETO_LIBRARY),
            cep_library: base.join(CEP_LIBRARY),
            scratch_dir: temp.clone(),
            output_dir: temp,
            crypt_key: String::new(),
        }
    }

    /// Resolves everything from the process working directory.
    pub fn from_current_dir() -> std::io::Result<Self> {
        Ok(Self::from_base_dir(std::env::current_dir()?))
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_crypt_key(mut self, key: impl Into<String>) -> Self {
        self.crypt_key = key.into();
        self
    }
}
