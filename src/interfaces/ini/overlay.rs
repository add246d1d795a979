use super::document::ConfigurationDocument;
use crate::domain::request::{Bank, Payee};
use crate::domain::titulo::format_tax_id;
use crate::error::Result;
use std::path::Path;

pub const BANK_SECTION: &str = "BoletoBancoConfig";
pub const PAYEE_SECTION: &str = "BoletoCedenteConfig";

/// Builds the per-request engine configuration from the static template.
pub struct ConfigOverlay;

impl ConfigOverlay {
    /// Reads the template at `base_path` and overlays the request fields on it.
    pub fn build(base_path: &Path, bank: &Bank, payee: &Payee) -> Result<ConfigurationDocument> {
        let mut document = ConfigurationDocument::read(base_path)?;
        Self::apply(&mut document, bank, payee)?;
        Ok(document)
    }

    /// Overwrites the bank and payee fields, leaving everything else untouched.
    pub fn apply(document: &mut ConfigurationDocument, bank: &Bank, payee: &Payee) -> Result<()> {
        document.set(BANK_SECTION, "TipoCobranca", bank.billing_type.as_str())?;
        document.set(BANK_SECTION, "Numero", bank.number.as_str())?;

        document.set(PAYEE_SECTION, "Nome", payee.name.as_str())?;
        document.set(PAYEE_SECTION, "CNPJCPF", format_tax_id(&payee.tax_id))?;
        document.set(PAYEE_SECTION, "Agencia", bank.agency.as_str())?;
        document.set(PAYEE_SECTION, "AgenciaDigito", bank.agency_digit.as_str())?;
        document.set(PAYEE_SECTION, "Conta", bank.account.as_str())?;
        document.set(PAYEE_SECTION, "ContaDigito", bank.account_digit.as_str())?;
        if let Some(covenant) = &payee.covenant {
            document.set(PAYEE_SECTION, "Convenio", covenant.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;

    fn bank() -> Bank {
        Bank {
            number: "001".into(),
            billing_type: "cobBancoDoBrasil".into(),
            agency: "0234".into(),
            agency_digit: "1".into(),
            account: "123456".into(),
            account_digit: "7".into(),
        }
    }

    fn payee(covenant: Option<&str>) -> Payee {
        Payee {
            name: "Banco da Gente".into(),
            tax_id: "17361356000153".into(),
            covenant: covenant.map(str::to_string),
        }
    }

    #[test]
    fn test_apply_overrides_only_named_fields() {
        let mut document: ConfigurationDocument =
            "[BoletoCedenteConfig]\nNome=Antigo\nResponEmissao=0\n\n[BoletoBancoConfig]\nNumero=0\nLayoutVersaoArquivo=0\n"
                .parse()
                .unwrap();

        ConfigOverlay::apply(&mut document, &bank(), &payee(None)).unwrap();

        assert_eq!(document.get(BANK_SECTION, "Numero"), Some("001"));
        assert_eq!(document.get(BANK_SECTION, "LayoutVersaoArquivo"), Some("0"));
        assert_eq!(document.get(PAYEE_SECTION, "CNPJCPF"), Some("17.361.356/0001-53"));
        assert_eq!(document.get(PAYEE_SECTION, "ResponEmissao"), Some("0"));
        assert_eq!(document.get(PAYEE_SECTION, "Convenio"), None);
        // section order of the template wins
        assert_eq!(
            document.section_names().collect::<Vec<_>>(),
            vec![PAYEE_SECTION, BANK_SECTION]
        );
    }

    #[test]
    fn test_apply_keeps_template_covenant_when_absent() {
        let mut document: ConfigurationDocument =
            "[BoletoCedenteConfig]\nConvenio=998877\n".parse().unwrap();

        ConfigOverlay::apply(&mut document, &bank(), &payee(None)).unwrap();
        assert_eq!(document.get(PAYEE_SECTION, "Convenio"), Some("998877"));

        ConfigOverlay::apply(&mut document, &bank(), &payee(Some("112233"))).unwrap();
        assert_eq!(document.get(PAYEE_SECTION, "Convenio"), Some("112233"));
    }

    #[test]
    fn test_line_break_in_payee_name_is_rejected() {
        let template = "[Principal]\nLogPath=\n\n[BoletoCedenteConfig]\nNome=\n";
        let mut document: ConfigurationDocument = template.parse().unwrap();
        let mut injected = payee(None);
        injected.name = "Empresa\n[Principal]\nLogPath=/etc/evil".into();

        let err = ConfigOverlay::apply(&mut document, &bank(), &injected).unwrap_err();

        assert!(matches!(err, GatewayError::InvalidRequest(_)));
        assert_eq!(err.status(), 400);
        assert_eq!(document.get("Principal", "LogPath"), Some(""));
    }
}
