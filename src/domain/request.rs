use super::string_or_number;
use super::titulo::Titulo;
use crate::error::GatewayError;
use serde::{Deserialize, Serialize};

/// What the caller wants out of a generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum Operation {
    /// Submit the titles and render the document.
    Pdf,
    /// Submit the titles only.
    #[default]
    Register,
}

impl From<String> for Operation {
    fn from(value: String) -> Self {
        if value == "pdf" {
            Operation::Pdf
        } else {
            Operation::Register
        }
    }
}

impl Operation {
    /// Submission mode flag understood by the engine.
    pub fn submit_mode(&self) -> &'static str {
        match self {
            Operation::Pdf => "P",
            Operation::Register => "",
        }
    }

    pub fn renders_document(&self) -> bool {
        matches!(self, Operation::Pdf)
    }
}

/// Bank account parameters overlaid onto the engine configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Bank {
    #[serde(rename = "numero", deserialize_with = "string_or_number")]
    pub number: String,
    #[serde(rename = "tipoCobranca", deserialize_with = "string_or_number")]
    pub billing_type: String,
    #[serde(rename = "agencia", deserialize_with = "string_or_number")]
    pub agency: String,
    #[serde(rename = "digitoAgencia", deserialize_with = "string_or_number")]
    pub agency_digit: String,
    #[serde(rename = "conta", deserialize_with = "string_or_number")]
    pub account: String,
    #[serde(rename = "digitoConta", deserialize_with = "string_or_number")]
    pub account_digit: String,
}

impl Bank {
    /// File name of the bank logo, the bank number left-padded to three digits.
    pub fn logo_file_name(&self) -> String {
        format!("{:0>3}.png", self.number.trim())
    }
}

/// The beneficiary ("cedente") issuing the titles.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Payee {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "cnpjCpf", deserialize_with = "string_or_number")]
    pub tax_id: String,
    /// Agreement code with the bank, not every bank uses one.
    #[serde(
        rename = "convenio",
        default,
        deserialize_with = "super::optional_string_or_number"
    )]
    pub covenant: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BoletoRequest {
    #[serde(rename = "operacao", default)]
    pub operation: Operation,
    #[serde(rename = "banco")]
    pub bank: Bank,
    #[serde(rename = "cedente")]
    pub payee: Payee,
    #[serde(rename = "titulos")]
    pub titles: Vec<Titulo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoletoData {
    /// Base64 encoded document, only present for [`Operation::Pdf`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf: Option<String>,
}

/// Response payload of a generation attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoletoResponse {
    #[serde(skip)]
    pub status: u16,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<BoletoData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl BoletoResponse {
    pub fn success(pdf: Option<String>) -> Self {
        Self {
            status: 200,
            success: true,
            data: Some(BoletoData { pdf }),
            error: None,
            stage: None,
        }
    }

    pub fn failure(error: &GatewayError) -> Self {
        Self {
            status: error.status(),
            success: false,
            data: None,
            error: Some(error.client_message()),
            stage: error.stage().map(|stage| stage.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LookupRequest {
    #[serde(default, deserialize_with = "super::optional_string_or_number")]
    pub cep: Option<String>,
}

/// Response payload of a postal code lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupResponse {
    #[serde(skip)]
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LookupResponse {
    pub fn found(data: String) -> Self {
        Self {
            status: 200,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: &GatewayError) -> Self {
        Self {
            status: error.status(),
            data: None,
            error: Some(error.client_message()),
        }
    }
}
