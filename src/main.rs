use boleto_gateway::application::lookup::CepService;
use boleto_gateway::application::orchestrator::BoletoService;
use boleto_gateway::config::GatewayConfig;
use boleto_gateway::domain::ports::{BoletoLibraryBox, CepLibraryBox};
use boleto_gateway::domain::request::{BoletoRequest, LookupRequest};
use boleto_gateway::error::GatewayError;
use boleto_gateway::infrastructure::scripted::ScriptedLibrary;
use boleto_gateway::telemetry::init_tracing;
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding logos/, ACBrBoleto.ini, ACBrCep.ini and lib/. Defaults to the working directory.
    #[arg(long, env = "BOLETO_GATEWAY_BASE_DIR")]
    base_dir: Option<PathBuf>,

    /// Directory for the transient configuration and title files.
    #[arg(long, env = "BOLETO_GATEWAY_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,

    /// Directory handed to the engine for its own output files.
    #[arg(long, env = "BOLETO_GATEWAY_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Key used by the engine to decrypt protected configuration values.
    #[arg(long, env = "BOLETO_GATEWAY_CRYPT_KEY", default_value = "", hide_env_values = true)]
    crypt_key: String,

    /// Use the in-process scripted engine instead of the native libraries.
    #[arg(long)]
    simulate: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate payment slips from a JSON request file.
    Boleto { request: PathBuf },
    /// Look up a postal code.
    Cep { cep: String },
    /// Print the engine name and version.
    Info,
    /// Print the configuration the engine loads from the template.
    ExportConfig,
}

#[cfg(feature = "native")]
fn native_libraries(config: &GatewayConfig) -> Result<(BoletoLibraryBox, CepLibraryBox)> {
    use boleto_gateway::infrastructure::native::{AcbrBoletoLibrary, AcbrCepLibrary};

    let boleto: BoletoLibraryBox = Box::new(AcbrBoletoLibrary::load(&config.boleto_library)?);
    let cep: CepLibraryBox = Box::new(AcbrCepLibrary::load(&config.cep_library)?);
    Ok((boleto, cep))
}

#[cfg(not(feature = "native"))]
fn native_libraries(_config: &GatewayConfig) -> Result<(BoletoLibraryBox, CepLibraryBox)> {
    tracing::warn!(
        "WARNING: native engine requested, but the 'native' feature is not enabled. Falling back to the scripted engine."
    );
    Ok(scripted_libraries())
}

fn scripted_libraries() -> (BoletoLibraryBox, CepLibraryBox) {
    (
        Box::new(ScriptedLibrary::new()),
        Box::new(ScriptedLibrary::new()),
    )
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.base_dir {
        Some(base) => GatewayConfig::from_base_dir(base),
        None => GatewayConfig::from_current_dir().into_diagnostic()?,
    }
    .with_crypt_key(cli.crypt_key.clone());
    if let Some(dir) = &cli.scratch_dir {
        config = config.with_scratch_dir(dir);
    }
    if let Some(dir) = &cli.output_dir {
        config = config.with_output_dir(dir);
    }

    let (boleto, cep) = if cli.simulate {
        scripted_libraries()
    } else {
        native_libraries(&config)?
    };

    match cli.command {
        Command::Boleto { request } => {
            let file = File::open(request).map_err(GatewayError::from)?;
            let request: BoletoRequest =
                serde_json::from_reader(BufReader::new(file)).map_err(GatewayError::from)?;

            let service = BoletoService::new(boleto, config);
            let response = service.generate(request).await;
            println!("{}", serde_json::to_string(&response).into_diagnostic()?);
            Ok(exit_code(response.success))
        }
        Command::Cep { cep: code } => {
            let service = CepService::new(cep, config);
            let response = service.lookup(LookupRequest { cep: Some(code) }).await;
            println!("{}", serde_json::to_string(&response).into_diagnostic()?);
            Ok(exit_code(response.error.is_none()))
        }
        Command::Info => {
            let service = BoletoService::new(boleto, config);
            let info = service.describe().await?;
            println!("{}", serde_json::to_string(&info).into_diagnostic()?);
            Ok(ExitCode::SUCCESS)
        }
        Command::ExportConfig => {
            let service = BoletoService::new(boleto, config);
            println!("{}", service.export_config().await?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
