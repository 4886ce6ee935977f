// 🧾 Remittance Field Extractor
// Turns free-text remittance lines into the fixed set of Dutch bank fields
// (IBAN, BIC, Naam, ...) plus the payment method the bank printed.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// REMITTANCE KEYS
// ============================================================================

/// Column labels of the extracted fields, in extraction order
pub const KEY_COLUMNS: [&str; 9] = [
    "IBAN",
    "BIC",
    "Naam",
    "Omschrijving",
    "Kenmerk",
    "NR",
    "Incassant",
    "Machtiging",
    "Land",
];

/// RemittanceKey - one of the fields a Dutch bank writes as "<Key>: value"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemittanceKey {
    Iban,
    Bic,
    Naam,
    Omschrijving,
    Kenmerk,
    Nr,
    Incassant,
    Machtiging,
    Land,
}

impl RemittanceKey {
    /// All keys in the order they are tested against a line
    pub const ALL: [RemittanceKey; 9] = [
        RemittanceKey::Iban,
        RemittanceKey::Bic,
        RemittanceKey::Naam,
        RemittanceKey::Omschrijving,
        RemittanceKey::Kenmerk,
        RemittanceKey::Nr,
        RemittanceKey::Incassant,
        RemittanceKey::Machtiging,
        RemittanceKey::Land,
    ];

    /// Label as it appears in the remittance text and in the dataset columns
    pub fn label(&self) -> &'static str {
        KEY_COLUMNS[self.index()]
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.label() == label)
    }

    fn index(&self) -> usize {
        *self as usize
    }

    /// Text after "<label>:" when `line` opens this field
    fn value_after_prefix<'a>(&self, line: &'a str) -> Option<&'a str> {
        line.strip_prefix(self.label())?.strip_prefix(':')
    }
}

/// First key (in `RemittanceKey::ALL` order) whose "<label>:" opens `line`
fn match_field(line: &str) -> Option<(RemittanceKey, &str)> {
    RemittanceKey::ALL
        .into_iter()
        .find_map(|key| key.value_after_prefix(line).map(|rest| (key, rest)))
}

// ============================================================================
// PAYMENT METHODS
// ============================================================================

/// PaymentMethod - the transaction channel label banks print on its own line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    SepaIdeal,
    SepaIncasso,
    SepaOverboeking,
    SepaPeriodiekeOverboeking,
    SepaPinsparen,
    Bea,
    ApplePay,
    Ideal,
}

impl PaymentMethod {
    /// Detection order; "SEPA iDEAL" must come before the bare "iDEAL"
    pub const ALL: [PaymentMethod; 8] = [
        PaymentMethod::SepaIdeal,
        PaymentMethod::SepaIncasso,
        PaymentMethod::SepaOverboeking,
        PaymentMethod::SepaPeriodiekeOverboeking,
        PaymentMethod::SepaPinsparen,
        PaymentMethod::Bea,
        PaymentMethod::ApplePay,
        PaymentMethod::Ideal,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::SepaIdeal => "SEPA iDEAL",
            PaymentMethod::SepaIncasso => "SEPA Incasso",
            PaymentMethod::SepaOverboeking => "SEPA Overboeking",
            PaymentMethod::SepaPeriodiekeOverboeking => "SEPA Periodieke overb.",
            PaymentMethod::SepaPinsparen => "SEPA PINSPAREN",
            PaymentMethod::Bea => "BEA",
            PaymentMethod::ApplePay => "Apple Pay",
            PaymentMethod::Ideal => "iDEAL",
        }
    }

    /// Exact label, "<label>,..." or the label anywhere in the line
    pub fn matches(&self, line: &str) -> bool {
        let label = self.label();
        line == label
            || line
                .strip_prefix(label)
                .is_some_and(|rest| rest.starts_with(','))
            || line.contains(label)
    }

    /// First method in `ALL` order that matches `line`
    pub fn detect(line: &str) -> Option<PaymentMethod> {
        Self::ALL.into_iter().find(|method| method.matches(line))
    }
}

impl Serialize for PaymentMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

// ============================================================================
// EXTRACTED FIELDS
// ============================================================================

/// Result of parsing one transaction's remittance text.
///
/// Every key is always present; undetected keys hold `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    values: [Option<String>; 9],
    payment_method: Option<PaymentMethod>,
}

impl ExtractedFields {
    pub fn get(&self, key: RemittanceKey) -> Option<&str> {
        self.values[key.index()].as_deref()
    }

    /// Lookup by column label; `PaymentMethod` is addressable too
    pub fn value(&self, label: &str) -> Option<&str> {
        if label == "PaymentMethod" {
            return self.payment_method.map(|m| m.label());
        }
        RemittanceKey::from_label(label).and_then(|key| self.get(key))
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    pub fn iter(&self) -> impl Iterator<Item = (RemittanceKey, Option<&str>)> + '_ {
        RemittanceKey::ALL
            .into_iter()
            .map(move |key| (key, self.get(key)))
    }

    fn set(&mut self, key: RemittanceKey, value: Option<String>) {
        self.values[key.index()] = value;
    }
}

impl Serialize for ExtractedFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(KEY_COLUMNS.len() + 1))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key.label(), &value)?;
        }
        map.serialize_entry("PaymentMethod", &self.payment_method)?;
        map.end()
    }
}

// ============================================================================
// REMITTANCE TEXT (raw input shape)
// ============================================================================

/// The remittance column as it arrives: missing, a lone value, or a list of lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RemittanceText {
    #[default]
    Absent,
    Single(String),
    Lines(Vec<Option<String>>),
}

impl RemittanceText {
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => RemittanceText::Absent,
            Some(Value::Array(items)) => {
                RemittanceText::Lines(items.iter().map(json_text).collect())
            }
            Some(Value::String(s)) => RemittanceText::Single(s.clone()),
            Some(other) => RemittanceText::Single(other.to_string()),
        }
    }

    /// Trimmed, non-empty lines in order
    pub fn cleaned(&self) -> Vec<&str> {
        match self {
            RemittanceText::Absent => Vec::new(),
            RemittanceText::Single(s) => clean_lines(std::iter::once(s.as_str())),
            RemittanceText::Lines(lines) => clean_lines(lines.iter().flatten().map(String::as_str)),
        }
    }
}

fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn clean_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    lines.map(str::trim).filter(|line| !line.is_empty()).collect()
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Parse remittance lines into the fixed field set plus payment method
pub fn extract_fields<S: AsRef<str>>(lines: &[S]) -> ExtractedFields {
    let cleaned = clean_lines(lines.iter().map(AsRef::as_ref));

    let mut fields = ExtractedFields {
        payment_method: detect_payment_method(&cleaned),
        ..ExtractedFields::default()
    };
    parse_key_values(&cleaned, &mut fields);
    fields
}

/// Same as `extract_fields`, starting from the raw column value
pub fn extract_remittance(text: &RemittanceText) -> ExtractedFields {
    extract_fields(&text.cleaned())
}

/// First line that matches any method decides; later lines are not looked at
fn detect_payment_method(cleaned: &[&str]) -> Option<PaymentMethod> {
    cleaned.iter().find_map(|line| PaymentMethod::detect(line))
}

/// Left-to-right scan for "<Key>: value" with continuation lines.
///
/// A value keeps absorbing the following lines until one opens another field
/// or names a payment method. That line is left for the outer scan.
fn parse_key_values(cleaned: &[&str], fields: &mut ExtractedFields) {
    let mut i = 0;
    while i < cleaned.len() {
        let Some((key, head)) = match_field(cleaned[i]) else {
            i += 1;
            continue;
        };

        let mut parts = vec![head.trim()];
        let mut j = i + 1;
        while j < cleaned.len() {
            let candidate = cleaned[j];
            if match_field(candidate).is_some() || PaymentMethod::detect(candidate).is_some() {
                break;
            }
            parts.push(candidate);
            j += 1;
        }

        let joined = parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        fields.set(key, (!joined.is_empty()).then_some(joined));
        i = j;
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_columns_match_enum_order() {
        let labels: Vec<&str> = RemittanceKey::ALL.iter().map(|k| k.label()).collect();
        assert_eq!(labels, KEY_COLUMNS.to_vec());
        assert_eq!(RemittanceKey::from_label("Naam"), Some(RemittanceKey::Naam));
        assert_eq!(RemittanceKey::from_label("naam"), None);
    }

    #[test]
    fn test_extract_empty_returns_all_absent() {
        let lines: Vec<String> = Vec::new();
        let fields = extract_fields(&lines);

        for (_, value) in fields.iter() {
            assert!(value.is_none());
        }
        assert_eq!(fields.payment_method(), None);
    }

    #[test]
    fn test_extract_single_line_values() {
        let fields = extract_fields(&[
            "Naam: Example BV",
            "IBAN: NL00ABNA0123456789",
            "BIC: ABNANL2A",
            "Omschrijving: Test",
            "SEPA Overboeking",
        ]);

        assert_eq!(fields.get(RemittanceKey::Naam), Some("Example BV"));
        assert_eq!(fields.get(RemittanceKey::Iban), Some("NL00ABNA0123456789"));
        assert_eq!(fields.get(RemittanceKey::Bic), Some("ABNANL2A"));
        assert_eq!(fields.get(RemittanceKey::Omschrijving), Some("Test"));
        assert_eq!(fields.get(RemittanceKey::Kenmerk), None);
        assert_eq!(fields.payment_method(), Some(PaymentMethod::SepaOverboeking));
    }

    #[test]
    fn test_extract_multi_line_values() {
        let fields = extract_fields(&["Omschrijving: Line 1", "Line 2", "Naam: Multi"]);

        assert_eq!(fields.get(RemittanceKey::Omschrijving), Some("Line 1 Line 2"));
        assert_eq!(fields.get(RemittanceKey::Naam), Some("Multi"));
    }

    #[test]
    fn test_continuation_stops_at_payment_method_line() {
        let fields = extract_fields(&[
            "Omschrijving: Boodschappen",
            "BEA, Betaalpas",
            "Naam: Albert Heijn 1234",
        ]);

        assert_eq!(fields.get(RemittanceKey::Omschrijving), Some("Boodschappen"));
        assert_eq!(fields.get(RemittanceKey::Naam), Some("Albert Heijn 1234"));
        assert_eq!(fields.payment_method(), Some(PaymentMethod::Bea));
    }

    #[test]
    fn test_continuation_stops_at_embedded_payment_method() {
        let fields = extract_fields(&["Omschrijving: Webshop", "betaald met Apple Pay"]);

        assert_eq!(fields.get(RemittanceKey::Omschrijving), Some("Webshop"));
        assert_eq!(fields.payment_method(), Some(PaymentMethod::ApplePay));
    }

    #[test]
    fn test_field_prefix_wins_over_payment_method() {
        let fields = extract_fields(&["Omschrijving: SEPA Incasso maart", "Naam: Energie BV"]);

        assert_eq!(fields.get(RemittanceKey::Omschrijving), Some("SEPA Incasso maart"));
        assert_eq!(fields.get(RemittanceKey::Naam), Some("Energie BV"));
        assert_eq!(fields.payment_method(), Some(PaymentMethod::SepaIncasso));
    }

    #[test]
    fn test_empty_value_is_absent() {
        let fields = extract_fields(&["Kenmerk:", "Naam: Z"]);

        assert_eq!(fields.get(RemittanceKey::Kenmerk), None);
        assert_eq!(fields.get(RemittanceKey::Naam), Some("Z"));
    }

    #[test]
    fn test_unmatched_text_is_dropped() {
        let fields = extract_fields(&["Vrije tekst zonder sleutel", "Naam: A"]);

        assert_eq!(fields.get(RemittanceKey::Naam), Some("A"));
        assert_eq!(fields.get(RemittanceKey::Omschrijving), None);
    }

    #[test]
    fn test_value_keeps_later_colons() {
        let fields = extract_fields(&["Omschrijving: Ref: 123"]);
        assert_eq!(fields.get(RemittanceKey::Omschrijving), Some("Ref: 123"));
    }

    #[test]
    fn test_whitespace_trimmed_and_blank_lines_dropped() {
        let fields = extract_fields(&["  ", " Naam:  Foo  ", "", " Bar "]);
        assert_eq!(fields.get(RemittanceKey::Naam), Some("Foo Bar"));
    }

    #[test]
    fn test_payment_method_list_order() {
        let sepa = extract_fields(&["SEPA iDEAL"]);
        assert_eq!(sepa.payment_method(), Some(PaymentMethod::SepaIdeal));

        let bare = extract_fields(&["Betaling via iDEAL"]);
        assert_eq!(bare.payment_method(), Some(PaymentMethod::Ideal));

        let comma = extract_fields(&["SEPA Periodieke overb., maandelijks"]);
        assert_eq!(comma.payment_method(), Some(PaymentMethod::SepaPeriodiekeOverboeking));
    }

    #[test]
    fn test_first_matching_line_wins() {
        let fields = extract_fields(&["Apple Pay", "SEPA Overboeking"]);
        assert_eq!(fields.payment_method(), Some(PaymentMethod::ApplePay));
    }

    #[test]
    fn test_remittance_text_from_json() {
        assert_eq!(RemittanceText::from_json(None), RemittanceText::Absent);
        assert_eq!(RemittanceText::from_json(Some(&json!(null))), RemittanceText::Absent);

        let single = RemittanceText::from_json(Some(&json!("Naam: Solo")));
        assert_eq!(extract_remittance(&single).get(RemittanceKey::Naam), Some("Solo"));

        let lines = RemittanceText::from_json(Some(&json!(["Kenmerk:", null, 42, "  "])));
        assert_eq!(lines.cleaned(), vec!["Kenmerk:", "42"]);
        assert_eq!(extract_remittance(&lines).get(RemittanceKey::Kenmerk), Some("42"));
    }

    #[test]
    fn test_serialized_fields_always_have_every_key() {
        let fields = extract_fields(&["Land: NL"]);
        let value = serde_json::to_value(&fields).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 10);
        for label in KEY_COLUMNS {
            assert!(object.contains_key(label));
        }
        assert_eq!(object["Land"], json!("NL"));
        assert_eq!(object["PaymentMethod"], json!(null));
    }

    #[test]
    fn test_value_lookup_by_label() {
        let fields = extract_fields(&["NR: 0042", "SEPA PINSPAREN"]);

        assert_eq!(fields.value("NR"), Some("0042"));
        assert_eq!(fields.value("PaymentMethod"), Some("SEPA PINSPAREN"));
        assert_eq!(fields.value("Unknown"), None);
    }
}
