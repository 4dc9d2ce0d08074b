//! Provider export adapters: JSON keyed maps, JSON arrays and CSV files into
//! uniform [`ProviderCollection`]s.

use std::collections::BTreeMap;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Number, Value};

use crate::config::{FieldMapping, SourceConfig, SourceFormat};
use crate::error::ReconError;
use crate::model::{Pricing, ProviderCollection, ProviderRecord};

/// Load one provider's export according to its source config.
pub fn load_provider(
    provider: &str,
    data: &str,
    source: &SourceConfig,
) -> Result<ProviderCollection, ReconError> {
    let collection = match source.format {
        SourceFormat::JsonMap => {
            let doc = parse_json(provider, data, source)?;
            load_json_map(provider, &doc, &source.fields)?
        }
        SourceFormat::JsonArray => {
            let doc = parse_json(provider, data, source)?;
            load_json_array(provider, &doc, &source.fields)?
        }
        SourceFormat::Csv => load_csv(provider, data, &source.fields)?,
    };
    tracing::debug!(
        provider,
        format = %source.format,
        records = collection.len(),
        "loaded provider export"
    );
    Ok(collection)
}

fn load_err(provider: &str, message: impl Into<String>) -> ReconError {
    ReconError::Load {
        provider: provider.into(),
        message: message.into(),
    }
}

fn duplicate(provider: &str, identifier: &str) -> ReconError {
    ReconError::InvariantViolation(format!(
        "provider '{provider}': identifier '{identifier}' appears more than once"
    ))
}

fn parse_json(provider: &str, data: &str, source: &SourceConfig) -> Result<Value, ReconError> {
    let parsed = match source.format {
        SourceFormat::JsonMap => serde_json::from_str::<UniqueKeys>(data).map(|u| u.0),
        SourceFormat::JsonArray | SourceFormat::Csv => serde_json::from_str::<Value>(data),
    };
    // Only the unique-key visitor raises data errors.
    let mut doc = parsed.map_err(|e| {
        if e.is_data() {
            ReconError::InvariantViolation(format!("provider '{provider}': {e}"))
        } else {
            load_err(provider, format!("invalid JSON: {e}"))
        }
    })?;
    if let Some(ref pointer) = source.root {
        doc = doc
            .pointer_mut(pointer)
            .map(Value::take)
            .ok_or_else(|| load_err(provider, format!("root '{pointer}' not found")))?;
    }
    Ok(doc)
}

/// A JSON value whose objects never repeat a key. `serde_json::Value` keeps
/// the last of two equal keys, which would drop a record from a keyed export.
struct UniqueKeys(Value);

impl<'de> Deserialize<'de> for UniqueKeys {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(UniqueKeysVisitor).map(UniqueKeys)
    }
}

struct UniqueKeysVisitor;

impl<'de> Visitor<'de> for UniqueKeysVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Number::from_f64(v).map_or(Value::Null, Value::Number))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::new();
        while let Some(UniqueKeys(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut object = Map::new();
        while let Some(key) = map.next_key::<String>()? {
            if object.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate key '{key}'")));
            }
            let UniqueKeys(value) = map.next_value()?;
            object.insert(key, value);
        }
        Ok(Value::Object(object))
    }
}

/// Field value as a string, verbatim. Blank strings count as absent. Keys
/// starting with `/` are JSON pointers into nested objects.
fn json_field(object: &Value, key: &str) -> Option<String> {
    let value = if key.starts_with('/') {
        object.pointer(key)?
    } else {
        object.get(key)?
    };
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!text.trim().is_empty()).then_some(text)
}

fn record_from<F>(identifier: String, fields: &FieldMapping, get: F) -> ProviderRecord
where
    F: Fn(&str) -> Option<String>,
{
    let price = |key: &str| {
        get(key).and_then(|v| v.trim().trim_start_matches('$').parse::<f64>().ok())
    };
    let pricing = Pricing {
        market: price(&fields.market_price),
        low: price(&fields.low_price),
        currency: get(&fields.currency).map(|c| c.trim().to_string()),
    };

    ProviderRecord {
        identifier,
        name: get(&fields.name),
        title: get(&fields.title),
        rarity: get(&fields.rarity),
        set_code: get(&fields.set_code),
        pricing: (!pricing.is_empty()).then_some(pricing),
    }
}

fn load_json_map(
    provider: &str,
    doc: &Value,
    fields: &FieldMapping,
) -> Result<ProviderCollection, ReconError> {
    let object = doc.as_object().ok_or_else(|| {
        load_err(provider, "json_map source must be an object keyed by identifier")
    })?;

    // Keys are unique here: `parse_json` rejects repeated keys for this format.
    Ok(object
        .iter()
        .map(|(key, entry)| {
            let record = record_from(key.clone(), fields, |k| json_field(entry, k));
            (key.clone(), record)
        })
        .collect())
}

fn load_json_array(
    provider: &str,
    doc: &Value,
    fields: &FieldMapping,
) -> Result<ProviderCollection, ReconError> {
    let entries = doc
        .as_array()
        .ok_or_else(|| load_err(provider, "json_array source must be an array of records"))?;

    let mut collection = BTreeMap::new();
    for (index, entry) in entries.iter().enumerate() {
        let identifier = json_field(entry, &fields.identifier).ok_or_else(|| {
            ReconError::MissingRequiredField {
                provider: provider.into(),
                identifier: format!("#{index}"),
                field: fields.identifier.clone(),
            }
        })?;
        let record = record_from(identifier.clone(), fields, |k| json_field(entry, k));
        if collection.insert(identifier.clone(), record).is_some() {
            return Err(duplicate(provider, &identifier));
        }
    }
    Ok(collection)
}

fn load_csv(
    provider: &str,
    data: &str,
    fields: &FieldMapping,
) -> Result<ProviderCollection, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| load_err(provider, e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let column = |name: &str| headers.iter().position(|h| h == name);
    let id_idx = column(&fields.identifier).ok_or_else(|| {
        load_err(provider, format!("missing column '{}'", fields.identifier))
    })?;

    let mut collection = BTreeMap::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.map_err(|e| load_err(provider, e.to_string()))?;
        let identifier = row.get(id_idx).unwrap_or("");
        if identifier.trim().is_empty() {
            return Err(ReconError::MissingRequiredField {
                provider: provider.into(),
                identifier: format!("row {}", line + 2),
                field: fields.identifier.clone(),
            });
        }
        let get = |name: &str| {
            column(name)
                .and_then(|i| row.get(i))
                .filter(|v| !v.trim().is_empty())
                .map(String::from)
        };
        let record = record_from(identifier.to_string(), fields, get);
        if collection.insert(identifier.to_string(), record).is_some() {
            return Err(duplicate(provider, identifier));
        }
    }
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(format: SourceFormat) -> SourceConfig {
        SourceConfig {
            file: "unused".into(),
            format,
            root: None,
            fields: FieldMapping::default(),
        }
    }

    #[test]
    fn json_map_with_root() {
        let data = r#"{
            "generated": "2026-02-01",
            "cards": {
                "001-001": {"name": "Elsa", "rarity": "Legendary", "market_price": 12.5},
                "001-002": {"name": "  ", "rarity": "common"}
            }
        }"#;
        let mut src = source(SourceFormat::JsonMap);
        src.root = Some("/cards".into());
        let c = load_provider("dreamborn", data, &src).unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c["001-001"].identifier, "001-001");
        assert_eq!(c["001-001"].name.as_deref(), Some("Elsa"));
        assert_eq!(c["001-001"].pricing.as_ref().unwrap().market, Some(12.5));
        assert_eq!(c["001-002"].name, None);
        assert!(c["001-002"].pricing.is_none());
    }

    #[test]
    fn json_map_missing_root_fails() {
        let mut src = source(SourceFormat::JsonMap);
        src.root = Some("/cards".into());
        let err = load_provider("dreamborn", "{}", &src).unwrap_err();
        assert!(err.to_string().contains("root '/cards'"));
    }

    #[test]
    fn json_array_with_field_mapping_and_pointer() {
        let data = r#"[
            {"card_id": "002-010", "productName": "Stitch", "prices": {"market": "3.10", "low": 2}},
            {"card_id": "002-011", "productName": "Lilo", "setCode": 2}
        ]"#;
        let mut src = source(SourceFormat::JsonArray);
        src.fields.identifier = "card_id".into();
        src.fields.name = "productName".into();
        src.fields.set_code = "setCode".into();
        src.fields.market_price = "/prices/market".into();
        src.fields.low_price = "/prices/low".into();
        let c = load_provider("tcgplayer", data, &src).unwrap();
        assert_eq!(c["002-010"].name.as_deref(), Some("Stitch"));
        let pricing = c["002-010"].pricing.as_ref().unwrap();
        assert_eq!(pricing.market, Some(3.10));
        assert_eq!(pricing.low, Some(2.0));
        assert_eq!(c["002-011"].set_code.as_deref(), Some("2"));
    }

    #[test]
    fn json_array_duplicate_is_invariant_violation() {
        let data = r#"[{"identifier": "001-001"}, {"identifier": "001-001"}]"#;
        let err = load_provider("p", data, &source(SourceFormat::JsonArray)).unwrap_err();
        assert!(matches!(err, ReconError::InvariantViolation(_)));
    }

    #[test]
    fn json_array_missing_identifier() {
        let data = r#"[{"name": "Elsa"}]"#;
        let err = load_provider("p", data, &source(SourceFormat::JsonArray)).unwrap_err();
        assert!(matches!(err, ReconError::MissingRequiredField { .. }));
    }

    #[test]
    fn wrong_shape_is_load_error() {
        let err = load_provider("p", "[]", &source(SourceFormat::JsonMap)).unwrap_err();
        assert!(matches!(err, ReconError::Load { .. }));
    }

    #[test]
    fn csv_basic() {
        let data = "\
identifier,name,rarity,market_price,currency
003-001,Maui,Rare,$1.75,USD
003-002,Moana,,,
";
        let c = load_provider("cardmarket", data, &source(SourceFormat::Csv)).unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c["003-001"].rarity.as_deref(), Some("Rare"));
        let pricing = c["003-001"].pricing.as_ref().unwrap();
        assert_eq!(pricing.market, Some(1.75));
        assert_eq!(pricing.currency.as_deref(), Some("USD"));
        assert_eq!(c["003-002"].rarity, None);
    }

    #[test]
    fn csv_missing_identifier_column() {
        let err = load_provider("p", "id,name\n1,x\n", &source(SourceFormat::Csv)).unwrap_err();
        assert!(err.to_string().contains("missing column 'identifier'"));
    }

    #[test]
    fn csv_duplicate_rows() {
        let data = "identifier,name\n001-001,Elsa\n001-001,Elsa\n";
        let err = load_provider("p", data, &source(SourceFormat::Csv)).unwrap_err();
        assert!(matches!(err, ReconError::InvariantViolation(_)));
    }

    #[test]
    fn json_map_duplicate_key_is_invariant_violation() {
        let data = r#"{"001-001": {"name": "Elsa"}, "001-001": {"name": "Anna"}}"#;
        let err = load_provider("p", data, &source(SourceFormat::JsonMap)).unwrap_err();
        assert!(
            matches!(err, ReconError::InvariantViolation(ref m) if m.contains("'001-001'")),
            "{err}"
        );
    }

    #[test]
    fn json_map_duplicate_under_root() {
        let data = r#"{"cards": {"001-001": {}, "001-002": {}, "001-001": {}}}"#;
        let mut src = source(SourceFormat::JsonMap);
        src.root = Some("/cards".into());
        let err = load_provider("p", data, &src).unwrap_err();
        assert!(matches!(err, ReconError::InvariantViolation(_)));
    }

    #[test]
    fn json_map_syntax_error_is_load_error() {
        let err =
            load_provider("p", "{\"001-001\": ", &source(SourceFormat::JsonMap)).unwrap_err();
        assert!(matches!(err, ReconError::Load { .. }));
    }

    #[test]
    fn names_and_keys_are_kept_verbatim() {
        let data =
            r#"{" 001-001": {"name": "Elsa ", "title": " Snow Queen", "market_price": " 2.5 "}}"#;
        let c = load_provider("p", data, &source(SourceFormat::JsonMap)).unwrap();
        let record = &c[" 001-001"];
        assert_eq!(record.identifier, " 001-001");
        assert_eq!(record.name.as_deref(), Some("Elsa "));
        assert_eq!(record.title.as_deref(), Some(" Snow Queen"));
        assert_eq!(record.pricing.as_ref().unwrap().market, Some(2.5));
    }

    #[test]
    fn csv_keeps_values_verbatim() {
        let data = "identifier,name,currency\n001-001,Elsa , EUR\n001-002,  ,\n";
        let c = load_provider("p", data, &source(SourceFormat::Csv)).unwrap();
        assert_eq!(c["001-001"].name.as_deref(), Some("Elsa "));
        assert_eq!(c["001-001"].pricing, None);
        assert_eq!(c["001-002"].name, None);
    }
}
