//! Reader for broker report XML exports (`GetBrokerReport.xml`).
//!
//! Only the handful of elements the cash-flow report needs are looked at.
//! Namespaces are ignored, elements and attributes are matched by local name.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{RawOperation, StatementMetadata, StatementRecord};

const TITLE_ELEMENT: &str = "TablixTitul";
const TITLE_ATTR_PREFIX: &str = "Textbox";
const RATE_ATTR: &str = "CurrEnd";
const CLIENT_ATTR: &str = "client_code";
const CASH_FLOW_ELEMENT: &str = "DDS_place";

const VALUE_ATTR: &str = "debt_date4";
const CURRENCY_ATTR: &str = "decree_amount2";
const DATE_ATTR: &str = "debt_type4";
const TYPE_ATTR: &str = "operation_type";
const COMMENT_ATTR: &str = "notes1";

const TITLE_DATE_FORMAT: &str = "%d.%m.%Y";
const OPERATION_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

static PERIOD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+\.\d+\.\d+) .* (\d+\.\d+\.\d+)").expect("period pattern is valid")
});

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Cannot read statement {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Cannot find {0:?} tag")]
    ElementNotFound(&'static str),

    #[error("Cannot parse the report period from {0:?}")]
    InvalidTitle(String),

    #[error("Cash flow item #{index}: missing {attribute:?} attribute")]
    MissingAttribute {
        index: usize,
        attribute: &'static str,
    },

    #[error("Invalid {field} value {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

/// Read one statement from a file on disk.
pub fn read_statement_file(path: impl AsRef<Path>) -> Result<StatementRecord, ParseError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_statement(BufReader::new(file))
}

/// Read one statement from any buffered XML source.
pub fn read_statement<R: BufRead>(reader: R) -> Result<StatementRecord, ParseError> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut extraction = Extraction::default();
    let mut buf = Vec::new();
    let mut depth = 0usize;
    // Depth of the open cash-flow element, while inside it
    let mut cash_flow_depth: Option<usize> = None;

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(element) => {
                depth += 1;
                let is_cash_flow = extraction.visit(&element, depth, cash_flow_depth)?;
                if is_cash_flow && cash_flow_depth.is_none() {
                    cash_flow_depth = Some(depth);
                }
            }
            Event::Empty(element) => {
                extraction.visit(&element, depth + 1, cash_flow_depth)?;
            }
            Event::End(_) => {
                if cash_flow_depth == Some(depth) {
                    cash_flow_depth = None;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    extraction.finish()
}

/// What has been collected so far while streaming through the document.
#[derive(Default)]
struct Extraction {
    /// `Some` once the title element was seen; inner `None` if it had no text attribute
    title: Option<Option<String>>,
    usd_price: Option<Decimal>,
    client_id: Option<String>,
    has_cash_flow: bool,
    operations: Vec<RawOperation>,
}

impl Extraction {
    /// Inspect one element; returns true if it is the cash-flow container.
    fn visit(
        &mut self,
        element: &BytesStart<'_>,
        level: usize,
        cash_flow_depth: Option<usize>,
    ) -> Result<bool, ParseError> {
        let name = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
        let attributes = collect_attributes(element)?;

        if name == TITLE_ELEMENT && self.title.is_none() {
            let text = attributes
                .iter()
                .find(|(key, _)| key.starts_with(TITLE_ATTR_PREFIX))
                .map(|(_, value)| value.clone());
            self.title = Some(text);
        }

        if self.usd_price.is_none() {
            if let Some(value) = find_attribute(&attributes, RATE_ATTR) {
                self.usd_price = Some(parse_decimal(RATE_ATTR, value)?);
            }
        }

        if self.client_id.is_none() {
            if let Some(value) = find_attribute(&attributes, CLIENT_ATTR) {
                self.client_id = Some(value.trim().to_string());
            }
        }

        if name == CASH_FLOW_ELEMENT {
            self.has_cash_flow = true;
            return Ok(true);
        }

        let inside_cash_flow = cash_flow_depth.is_some_and(|outer| level > outer);
        if inside_cash_flow && find_attribute(&attributes, VALUE_ATTR).is_some() {
            let index = self.operations.len() + 1;
            self.operations.push(parse_operation(index, &attributes)?);
        }

        Ok(false)
    }

    fn finish(self) -> Result<StatementRecord, ParseError> {
        let title = match self.title {
            Some(Some(text)) => text,
            Some(None) => return Err(ParseError::ElementNotFound(TITLE_ATTR_PREFIX)),
            None => return Err(ParseError::ElementNotFound(TITLE_ELEMENT)),
        };
        let (start_date, end_date) = parse_period(&title)?;

        let usd_price = self.usd_price.unwrap_or_else(|| {
            tracing::warn!(
                "Cannot find element with '{}' attr. USD price will be set to 0.",
                RATE_ATTR
            );
            Decimal::ZERO
        });

        let client_id = self.client_id.unwrap_or_else(|| {
            tracing::warn!(
                "Cannot find element with '{}' attr. The statement is treated as the default account.",
                CLIENT_ATTR
            );
            String::new()
        });

        if !self.has_cash_flow {
            return Err(ParseError::ElementNotFound(CASH_FLOW_ELEMENT));
        }

        tracing::debug!(
            "Statement {} - {}: {} cash flow item(s)",
            start_date,
            end_date,
            self.operations.len()
        );

        Ok(StatementRecord::new(
            StatementMetadata::new(start_date, end_date, usd_price, client_id),
            self.operations,
        ))
    }
}

fn collect_attributes(element: &BytesStart<'_>) -> Result<Vec<(String, String)>, ParseError> {
    let mut attributes = Vec::new();
    for attribute in element.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(attributes)
}

fn find_attribute<'a>(attributes: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Pull the first and last date out of the report title,
/// e.g. "Отчет за период с 01.01.2023 по 31.01.2023".
fn parse_period(title: &str) -> Result<(NaiveDate, NaiveDate), ParseError> {
    let Some(captures) = PERIOD_PATTERN.captures(title) else {
        tracing::error!("Text: {}", title);
        return Err(ParseError::InvalidTitle(title.to_string()));
    };

    let parse = |text: &str| {
        NaiveDate::parse_from_str(text, TITLE_DATE_FORMAT)
            .map_err(|_| ParseError::InvalidTitle(title.to_string()))
    };
    Ok((parse(&captures[1])?, parse(&captures[2])?))
}

fn parse_operation(
    index: usize,
    attributes: &[(String, String)],
) -> Result<RawOperation, ParseError> {
    let mut value = None;
    let mut currency = None;
    let mut date = None;
    let mut operation_type = None;
    let mut comment = None;

    for (key, raw) in attributes {
        match key.as_str() {
            VALUE_ATTR => value = Some(parse_decimal(VALUE_ATTR, raw)?),
            CURRENCY_ATTR => currency = Some(raw.trim().to_string()),
            DATE_ATTR => date = Some(parse_timestamp(raw)?),
            TYPE_ATTR => operation_type = Some(raw.clone()),
            COMMENT_ATTR => {
                if !raw.is_empty() {
                    comment = Some(raw.clone());
                }
            }
            other => tracing::warn!("Unknown attrib name: {}", other),
        }
    }

    let missing = |attribute| ParseError::MissingAttribute { index, attribute };
    Ok(RawOperation {
        value: value.ok_or_else(|| missing(VALUE_ATTR))?,
        currency: currency.ok_or_else(|| missing(CURRENCY_ATTR))?,
        date: date.ok_or_else(|| missing(DATE_ATTR))?,
        operation_type: operation_type.ok_or_else(|| missing(TYPE_ATTR))?,
        comment,
    })
}

fn parse_decimal(field: &'static str, raw: &str) -> Result<Decimal, ParseError> {
    let text = raw.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| ParseError::InvalidValue {
            field,
            value: raw.to_string(),
        })
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, ParseError> {
    NaiveDateTime::parse_from_str(raw.trim(), OPERATION_DATE_FORMAT).map_err(|_| {
        ParseError::InvalidValue {
            field: DATE_ATTR,
            value: raw.to_string(),
        }
    })
}
