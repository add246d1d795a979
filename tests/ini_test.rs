mod common;

use boleto_gateway::domain::request::BoletoRequest;
use boleto_gateway::interfaces::ini::{BatchDocument, ConfigOverlay, ConfigurationDocument};
use chrono::NaiveDate;

#[test]
fn test_overlay_survives_a_write_and_reread() {
    let dir = common::workspace();
    let request = common::request("pdf", 1);

    let overlay = ConfigOverlay::build(
        &dir.path().join("ACBrBoleto.ini"),
        &request.bank,
        &request.payee,
    )
    .unwrap();
    let path = dir.path().join("scratch/overlay.ini");
    std::fs::write(&path, overlay.to_string()).unwrap();

    let reread = ConfigurationDocument::read(&path).unwrap();
    assert_eq!(reread, overlay);
    assert_eq!(reread.root_value("TipoResposta"), None);
    assert_eq!(reread.get("Principal", "TipoResposta"), Some("0"));
    assert_eq!(reread.get("BoletoCedenteConfig", "Nome"), Some("Banco da Gente"));
    assert_eq!(reread.get("BoletoCedenteConfig", "ResponEmissao"), Some("0"));
}

#[test]
fn test_batch_formats_payer_fields() {
    let request: BoletoRequest = serde_json::from_value(common::request_json(
        "pdf",
        "1",
        vec![
            common::title(1, "12345678900"),
            common::title(2, "17361356000153"),
            common::title(3, "123"),
        ],
    ))
    .unwrap();

    let today = NaiveDate::from_ymd_opt(2024, 11, 5).unwrap();
    let batch = BatchDocument::build(&request.titles, today).unwrap();
    assert_eq!(batch.count(), 3);

    let parsed: ConfigurationDocument = batch.to_string().parse().unwrap();
    assert_eq!(
        parsed.section_names().collect::<Vec<_>>(),
        vec!["Titulo1", "Titulo2", "Titulo3"]
    );
    assert_eq!(parsed.get("Titulo1", "Sacado.CNPJCPF"), Some("123.456.789-00"));
    assert_eq!(parsed.get("Titulo2", "Sacado.CNPJCPF"), Some("17.361.356/0001-53"));
    assert_eq!(parsed.get("Titulo3", "Sacado.CNPJCPF"), Some("123"));
    assert_eq!(parsed.get("Titulo1", "Sacado.CEP"), Some("01310-100"));
    assert_eq!(parsed.get("Titulo1", "Vencimento"), Some("30/12/2024"));
    assert_eq!(parsed.get("Titulo1", "DataDocumento"), Some("05/11/2024"));
    assert_eq!(parsed.get("Titulo1", "ValorDocumento"), Some("100.00"));
}
