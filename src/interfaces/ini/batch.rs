use super::document::ConfigurationDocument;
use crate::domain::titulo::{SlipDate, Titulo, format_cep, format_tax_id};
use crate::error::Result;
use chrono::NaiveDate;
use std::fmt;

pub const SECTION_PREFIX: &str = "Titulo";
pub const PAYMENT_LOCATION: &str = "Pagável em qualquer agência bancária";

/// Serialized titles ready to be submitted to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchArtifact {
    document: ConfigurationDocument,
    count: usize,
}

impl BatchArtifact {
    /// Number of titles in the batch.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn document(&self) -> &ConfigurationDocument {
        &self.document
    }
}

impl fmt::Display for BatchArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.document, f)
    }
}

pub struct BatchDocument;

impl BatchDocument {
    /// One `[Titulo<N>]` section per title, N starting at 1, in input order.
    ///
    /// `today` stands in for a missing issue date and is the processing date.
    /// A field holding a line break fails the whole batch.
    pub fn build(titles: &[Titulo], today: NaiveDate) -> Result<BatchArtifact> {
        let today = SlipDate::new(today);
        let mut document = ConfigurationDocument::new();

        for (index, title) in titles.iter().enumerate() {
            let section = format!("{SECTION_PREFIX}{}", index + 1);
            let payer = &title.payer;
            let optional = |value: &Option<String>| value.clone().unwrap_or_default();

            let fields = [
                ("NumeroDocumento", title.document_number.clone()),
                ("NossoNumero", optional(&title.engine_number)),
                ("Carteira", title.portfolio.clone()),
                ("ValorDocumento", title.amount.render()),
                ("Vencimento", title.due_date.to_string()),
                (
                    "DataDocumento",
                    title.issue_date.unwrap_or(today).to_string(),
                ),
                ("DataProcessamento", today.to_string()),
                ("LocalPagamento", PAYMENT_LOCATION.to_string()),
                ("Sacado.NomeSacado", payer.name.clone()),
                ("Sacado.CNPJCPF", format_tax_id(&payer.tax_id)),
                ("Sacado.Logradouro", optional(&payer.street)),
                ("Sacado.Numero", optional(&payer.number)),
                ("Sacado.Bairro", optional(&payer.district)),
                ("Sacado.Cidade", optional(&payer.city)),
                ("Sacado.UF", optional(&payer.state)),
                (
                    "Sacado.CEP",
                    payer.postal_code.as_deref().map(format_cep).unwrap_or_default(),
                ),
            ];
            for (key, value) in fields {
                document.set(&section, key, value)?;
            }
        }

        Ok(BatchArtifact {
            document,
            count: titles.len(),
        })
    }
}
