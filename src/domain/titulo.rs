use super::{optional_string_or_number, string_or_number};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use std::fmt;

/// Date format the engine expects in batch files.
pub const ENGINE_DATE_FORMAT: &str = "%d/%m/%Y";

/// Monetary amount of a title, rendered with two fraction digits.
///
/// Amounts are passed to the engine as given; the engine decides what it
/// accepts.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Deserialize)]
#[serde(from = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Engine representation, e.g. `100.00`. Halves round away from zero.
    pub fn render(&self) -> String {
        let mut value = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        value.rescale(2);
        value.to_string()
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self::new(value)
    }
}

/// Calendar date accepted as `dd/mm/yyyy` or `yyyy-mm-dd`, rendered as `dd/mm/yyyy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub struct SlipDate(NaiveDate);

impl SlipDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

}

impl TryFrom<String> for SlipDate {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        NaiveDate::parse_from_str(trimmed, ENGINE_DATE_FORMAT)
            .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
            .map(Self)
            .map_err(|_| format!("invalid date '{value}', expected dd/mm/yyyy"))
    }
}

impl fmt::Display for SlipDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(ENGINE_DATE_FORMAT))
    }
}

/// The payer ("sacado") of a title.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Payer {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "cnpjCpf", deserialize_with = "string_or_number")]
    pub tax_id: String,
    #[serde(rename = "logradouro", default)]
    pub street: Option<String>,
    #[serde(rename = "numero", default, deserialize_with = "optional_string_or_number")]
    pub number: Option<String>,
    #[serde(rename = "bairro", default)]
    pub district: Option<String>,
    #[serde(rename = "cidade", default)]
    pub city: Option<String>,
    #[serde(rename = "uf", default)]
    pub state: Option<String>,
    #[serde(rename = "cep", default, deserialize_with = "optional_string_or_number")]
    pub postal_code: Option<String>,
}

/// One payable instrument of a generation batch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Titulo {
    #[serde(rename = "numeroDocumento", deserialize_with = "string_or_number")]
    pub document_number: String,
    /// Engine-assigned number ("nosso número"), when the caller already has one.
    #[serde(rename = "nossoNumero", default, deserialize_with = "optional_string_or_number")]
    pub engine_number: Option<String>,
    #[serde(rename = "carteira", deserialize_with = "string_or_number")]
    pub portfolio: String,
    #[serde(rename = "valor")]
    pub amount: Amount,
    #[serde(rename = "vencimento")]
    pub due_date: SlipDate,
    #[serde(rename = "dataDocumento", default)]
    pub issue_date: Option<SlipDate>,
    #[serde(rename = "sacado")]
    pub payer: Payer,
}

/// Rewrites every run of `width` consecutive digits, where `width` is the sum
/// of `sizes`, inserting `separators` between the groups. Runs are taken from
/// the left; leftover digits and every other character are kept as they are.
fn group_digits(value: &str, sizes: &[usize], separators: &[&str]) -> String {
    let width: usize = sizes.iter().sum();
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len() + separators.concat().len());
    let mut index = 0;

    while index < chars.len() {
        let run = chars[index..]
            .iter()
            .take(width)
            .take_while(|c| c.is_ascii_digit())
            .count();
        if run < width {
            // skip past the digits that cannot start a full match here
            let skip = run.max(1);
            out.extend(&chars[index..index + skip]);
            index += skip;
            continue;
        }

        let mut start = index;
        for (position, size) in sizes.iter().enumerate() {
            out.extend(&chars[start..start + size]);
            if let Some(separator) = separators.get(position) {
                out.push_str(separator);
            }
            start += size;
        }
        index += width;
    }
    out
}

/// Formats a person id (CPF) as `###.###.###-##`.
pub fn format_cpf(value: &str) -> String {
    group_digits(value, &[3, 3, 3, 2], &[".", ".", "-"])
}

/// Formats an organization id (CNPJ) as `##.###.###/####-##`.
pub fn format_cnpj(value: &str) -> String {
    group_digits(value, &[2, 3, 3, 4, 2], &[".", ".", "/", "-"])
}

/// Picks the tax id layout from its length: 11 characters is a person,
/// anything else an organization. Every run of digits long enough for the
/// chosen layout is formatted; shorter ids come back unchanged and nothing is
/// rejected here.
pub fn format_tax_id(value: &str) -> String {
    if value.chars().count() == 11 {
        format_cpf(value)
    } else {
        format_cnpj(value)
    }
}

/// Formats 8 digit runs of a postal code as `#####-###`.
pub fn format_cep(value: &str) -> String {
    group_digits(value, &[5, 3], &["-"])
}
