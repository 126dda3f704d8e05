//! Property-value string parsing.
//!
//! Turns a free-text value like `"ranged from 333 up to 400 °C under
//! air"` into a numeric value, numeric error, descriptor, averaging flag,
//! and normalized unit. The presence of a digit is the entry condition
//! for a valid record: inputs without digits parse to `None`, never to a
//! zero value.

use regex::Regex;
use tracing::trace;

use polymat_core::{Error, PropertyMetadata, PropertyValuePair, Result};

use crate::units::UnitTable;

/// Numeric content parsed out of one raw value string.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAmount {
    pub value: f64,
    pub error: Option<f64>,
    pub average: bool,
    pub descriptor: String,
    pub unit: String,
}

/// Comparator phrases captured as descriptors when they precede the first
/// number. Scan order matters: first match wins.
const LEADING_DESCRIPTORS: &[&str] = &[
    "less than",
    "greater than",
    "more than",
    "up to",
    "at least",
    "at most",
    "approximately",
    "about",
    "around",
    "nearly",
    "below",
    "above",
    "over",
    "under",
];

/// Symbol comparators matched without word boundaries.
const LEADING_SYMBOLS: &[&str] = &["≤", "≥", "<", ">", "~"];

/// Words accepted as a descriptor between the first two numbers.
const RANGE_DESCRIPTORS: &[&str] = &["to", "-", "–", "and", "or", "up to", "~"];

/// Words that introduce conditions rather than units; a candidate unit
/// word in this set means the value carried no unit.
const UNIT_STOPWORDS: &[&str] = &[
    "under", "at", "in", "with", "for", "of", "when", "during", "after", "before", "the", "a",
    "an", "was", "is", "and", "or", "to", "respectively",
];

struct NumToken {
    value: f64,
    error: Option<f64>,
    end: usize,
    start: usize,
}

/// Parser for raw property-value strings.
pub struct ValueParser {
    table: UnitTable,
    number_re: Regex,
    range_dash_re: Regex,
}

impl Default for ValueParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueParser {
    pub fn new() -> Self {
        // Optional sign, digits, optional decimal part, optional ± error,
        // optional scientific suffix (x 10^{E}) or bare exponent (10^{E}).
        let number_re = Regex::new(
            r"(?x)
            (?P<mant>[-+]?\d+(?:\.\d+)?)
            (?:\s*±\s*(?P<err>\d+(?:\.\d+)?))?
            (?:
                \s*[x×*]\s*10\^\{?(?P<exp>[-+]?\d+)\}?
              | \^\{?(?P<bexp>[-+]?\d+)\}?
            )?
            ",
        )
        .expect("static regex");
        let range_dash_re = Regex::new(r"(\d)\s*[-–]\s*(\d)").expect("static regex");
        Self {
            table: UnitTable::new(),
            number_re,
            range_dash_re,
        }
    }

    /// The unit table this parser normalizes with.
    pub fn unit_table(&self) -> &UnitTable {
        &self.table
    }

    /// Parse a raw value string into its numeric content.
    ///
    /// Returns `Ok(None)` when the string contains no ASCII digit.
    /// Returns `Err` for malformed numeric substrings (callers skip the
    /// record and log; the enclosing paragraph loop continues).
    pub fn parse_value(&self, raw: &str) -> Result<Option<ParsedAmount>> {
        if !raw.chars().any(|c| c.is_ascii_digit()) {
            return Ok(None);
        }

        let text = self.preprocess(raw);
        let tokens = self.numeric_tokens(&text)?;
        if tokens.is_empty() {
            return Ok(None);
        }

        let mut descriptor = leading_descriptor(&text[..tokens[0].start]);

        let (value, error, average) = if tokens.len() == 1 {
            (tokens[0].value, tokens[0].error, false)
        } else if tokens.iter().any(|t| t.error.is_some()) {
            let first = tokens.iter().find(|t| t.error.is_some()).unwrap();
            (first.value, first.error, false)
        } else {
            if descriptor.is_empty() {
                descriptor = range_descriptor(&text[tokens[0].end..tokens[1].start]);
            }
            let mean = tokens.iter().map(|t| t.value).sum::<f64>() / tokens.len() as f64;
            (mean, None, true)
        };

        if !value.is_finite() {
            return Err(Error::ValueParse(format!("non-finite value in {raw:?}")));
        }

        let unit = unit_word(&text[tokens.last().unwrap().end..]);
        let (unit, value, error) = self.table.normalize(&unit, Some(value), error);

        trace!(raw, value, ?error, average, %unit, "parsed property value");
        Ok(Some(ParsedAmount {
            value: value.unwrap(),
            error,
            average,
            descriptor,
            unit,
        }))
    }

    /// Parse a raw value string into a full [`PropertyValuePair`] for a
    /// named property, applying the percent-scale fixup when metadata
    /// flags the property and the unitless value lies in [0, 1].
    pub fn parse_property(
        &self,
        property: &str,
        raw: &str,
        meta: Option<&PropertyMetadata>,
    ) -> Result<Option<PropertyValuePair>> {
        let Some(mut amount) = self.parse_value(raw)? else {
            return Ok(None);
        };

        if let Some(meta) = meta {
            if meta.percent_scale
                && amount.unit.is_empty()
                && (0.0..=1.0).contains(&amount.value)
            {
                amount.value *= 100.0;
                amount.error = amount.error.map(|e| e * 100.0);
                amount.unit = "%".to_string();
            }
        }

        Ok(Some(PropertyValuePair {
            entity_name: property.to_string(),
            raw_value: raw.to_string(),
            numeric_value: Some(amount.value),
            numeric_error: amount.error,
            value_average: amount.average,
            value_descriptor: amount.descriptor,
            unit: amount.unit,
            conditions: String::new(),
        }))
    }

    /// Normalize sign/range spellings so the number regex sees them
    /// consistently: `+/-` becomes `±`, the Unicode minus becomes ASCII,
    /// and a dash sandwiched between digits becomes a spaced range dash
    /// (so it is parsed as a descriptor, not a sign).
    fn preprocess(&self, raw: &str) -> String {
        let text = raw.replace("+/-", "±").replace('−', "-");
        // Applied twice to catch chained ranges like "1-2-3".
        let text = self.range_dash_re.replace_all(&text, "$1 - $2").into_owned();
        self.range_dash_re.replace_all(&text, "$1 - $2").into_owned()
    }

    fn numeric_tokens(&self, text: &str) -> Result<Vec<NumToken>> {
        let mut tokens = Vec::new();
        for caps in self.number_re.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            let mant: f64 = caps["mant"]
                .parse()
                .map_err(|_| Error::ValueParse(format!("bad mantissa in {text:?}")))?;
            let error = match caps.name("err") {
                Some(e) => Some(
                    e.as_str()
                        .parse::<f64>()
                        .map_err(|_| Error::ValueParse(format!("bad error in {text:?}")))?,
                ),
                None => None,
            };
            let value = if let Some(exp) = caps.name("exp") {
                let exp: i32 = exp
                    .as_str()
                    .parse()
                    .map_err(|_| Error::ValueParse(format!("bad exponent in {text:?}")))?;
                mant * 10f64.powi(exp)
            } else if let Some(bexp) = caps.name("bexp") {
                let bexp: i32 = bexp
                    .as_str()
                    .parse()
                    .map_err(|_| Error::ValueParse(format!("bad exponent in {text:?}")))?;
                mant.powi(bexp)
            } else {
                mant
            };
            tokens.push(NumToken {
                value,
                error,
                start: whole.start(),
                end: whole.end(),
            });
        }
        Ok(tokens)
    }
}

/// Comparator phrase in the text before the first number, if any.
fn leading_descriptor(prefix: &str) -> String {
    let padded = format!(" {} ", prefix.to_lowercase());
    for phrase in LEADING_DESCRIPTORS {
        if padded.contains(&format!(" {phrase} ")) {
            return (*phrase).to_string();
        }
    }
    for symbol in LEADING_SYMBOLS {
        if prefix.contains(symbol) {
            return (*symbol).to_string();
        }
    }
    String::new()
}

/// Descriptor token between the first two numbers, if recognized.
fn range_descriptor(between: &str) -> String {
    let trimmed = between.trim();
    if RANGE_DESCRIPTORS.contains(&trimmed) {
        trimmed.to_string()
    } else {
        String::new()
    }
}

/// Heuristic unit: the first whitespace-delimited word after the last
/// number, minus surrounding punctuation, unless it is a stopword that
/// introduces conditions instead.
fn unit_word(suffix: &str) -> String {
    for word in suffix.split_whitespace() {
        let word = word.trim_matches(|c: char| matches!(c, '(' | ')' | ',' | ';'));
        let has_substance = word.chars().any(|c| c.is_alphanumeric() || c == '°' || c == '%');
        if word.is_empty() || word == "±" || !has_substance {
            continue;
        }
        if UNIT_STOPWORDS.contains(&word.to_lowercase().as_str()) {
            return String::new();
        }
        return word.to_string();
    }
    String::new()
}
