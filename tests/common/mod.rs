#![allow(dead_code)]

use boleto_gateway::config::GatewayConfig;
use boleto_gateway::domain::request::BoletoRequest;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const BOLETO_TEMPLATE: &str = "\
[Principal]
TipoResposta=0
CodificacaoResposta=0
LogNivel=4
LogPath=

[BoletoBancoConfig]
TipoCobranca=cobNenhum
Numero=0
LayoutVersaoArquivo=0

[BoletoCedenteConfig]
Nome=
CNPJCPF=
Agencia=
AgenciaDigito=
Conta=
ContaDigito=
ResponEmissao=0

[BoletoBancoFCFortesConfig]
DirLogo=
Filtro=0
NomeArquivo=boleto.pdf
";

pub const CEP_TEMPLATE: &str = "\
[Principal]
LogNivel=4

[CEP]
WebService=1
";

/// Base directory with logos, templates, a scratch and an output directory.
pub fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path();
    std::fs::create_dir_all(base.join("logos")).unwrap();
    std::fs::write(base.join("logos/001.png"), b"\x89PNG\r\n").unwrap();
    std::fs::write(base.join("ACBrBoleto.ini"), BOLETO_TEMPLATE).unwrap();
    std::fs::write(base.join("ACBrCep.ini"), CEP_TEMPLATE).unwrap();
    std::fs::create_dir_all(base.join("scratch")).unwrap();
    std::fs::create_dir_all(base.join("out")).unwrap();
    dir
}

pub fn config(base: &Path) -> GatewayConfig {
    GatewayConfig::from_base_dir(base)
        .with_scratch_dir(base.join("scratch"))
        .with_output_dir(base.join("out"))
}

pub fn scratch_files(base: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(base.join("scratch"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

pub fn title(number: u32, tax_id: &str) -> Value {
    json!({
        "numeroDocumento": number.to_string(),
        "carteira": "17",
        "valor": "100.00",
        "vencimento": "30/12/2024",
        "sacado": {
            "nome": format!("Cliente {number}"),
            "cnpjCpf": tax_id,
            "logradouro": "Rua Teste",
            "numero": "123",
            "bairro": "Centro",
            "cidade": "São Paulo",
            "uf": "SP",
            "cep": "01310100"
        }
    })
}

pub fn request_json(operation: &str, bank_number: &str, titles: Vec<Value>) -> Value {
    json!({
        "operacao": operation,
        "banco": {
            "numero": bank_number,
            "tipoCobranca": "cobBancoDoBrasil",
            "agencia": "0234",
            "digitoAgencia": "1",
            "conta": "123456",
            "digitoConta": "7"
        },
        "cedente": {
            "nome": "Banco da Gente",
            "cnpjCpf": "17361356000153",
            "convenio": "1234567"
        },
        "titulos": titles
    })
}

pub fn request(operation: &str, titles: usize) -> BoletoRequest {
    let titles = (1..=titles as u32)
        .map(|n| title(n, "12345678900"))
        .collect();
    serde_json::from_value(request_json(operation, "1", titles)).unwrap()
}
