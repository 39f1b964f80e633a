// Conversions between the JSON documents and the types of the digest library.

use crate::digest::*;

use serde_json::json;
use serde_json::Map as JSMap;
use std::collections::BTreeMap;

const TOTAL_RESPONSES: &str = "total_responses";

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string()
}

/// A count, as written by the aggregation tools.
///
/// Numbers written as strings are accepted. Anything else, including
/// negative numbers, counts as 0.
pub fn read_js_count(x: &JSValue, what: &str) -> u64 {
    let res = match x {
        JSValue::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        JSValue::String(s) => s
            .trim()
            .parse::<u64>()
            .ok()
            .or_else(|| {
                s.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|f| *f >= 0.0)
                    .map(|f| f.round() as u64)
            }),
        _ => None,
    };
    match res {
        Some(c) => c,
        None => {
            warn!("read_js_count: {}: invalid count {}, using 0", what, x);
            0
        }
    }
}

fn table_from_json(obj: &JSMap<String, JSValue>, what: &str) -> FrequencyTable {
    FrequencyTable::from_entries(
        obj.iter()
            .map(|(label, v)| (label.clone(), read_js_count(v, what)))
            .collect::<Vec<(String, u64)>>(),
    )
}

/// A scope object: `total_responses` and one object per frequency table.
pub fn scope_from_json(obj: &JSMap<String, JSValue>) -> AggregateScope {
    let total = obj
        .get(TOTAL_RESPONSES)
        .map(|v| read_js_count(v, TOTAL_RESPONSES))
        .unwrap_or(0);
    let mut scope = AggregateScope::new(total);
    for (key, v) in obj.iter() {
        match v {
            _ if key == TOTAL_RESPONSES => {}
            JSValue::Object(t) => scope.insert_table(key, table_from_json(t, key)),
            JSValue::Null => scope.insert_table(key, FrequencyTable::new()),
            x => {
                warn!("scope_from_json: skipping {:?}: not a table: {}", key, x);
            }
        }
    }
    scope
}

pub fn store_from_document(doc: &AggregateDocument) -> AggregateStore {
    let mut by_org_type = BTreeMap::new();
    for (label, v) in doc.by_org_type.iter() {
        match v {
            JSValue::Object(obj) => {
                by_org_type.insert(label.clone(), scope_from_json(obj));
            }
            x => {
                warn!(
                    "store_from_document: skipping organization type {:?}: not a scope: {}",
                    label, x
                );
            }
        }
    }
    AggregateStore {
        total_responses: doc
            .total_responses
            .as_ref()
            .map(|v| read_js_count(v, TOTAL_RESPONSES)),
        generated_at: doc.generated_at.clone(),
        summary: scope_from_json(&doc.summary),
        by_org_type,
    }
}

pub fn table_to_json(table: &FrequencyTable) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for (label, count) in table.iter() {
        m.insert(label.to_string(), json!(count));
    }
    JSValue::Object(m)
}

pub fn scope_to_json(scope: &AggregateScope) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    m.insert(TOTAL_RESPONSES.to_string(), json!(scope.total_responses));
    for (key, table) in scope.tables() {
        m.insert(key.to_string(), table_to_json(table));
    }
    JSValue::Object(m)
}

pub fn store_to_json(store: &AggregateStore) -> JSValue {
    let mut by_org_type: JSMap<String, JSValue> = JSMap::new();
    for (label, scope) in store.by_org_type.iter() {
        by_org_type.insert(label.clone(), scope_to_json(scope));
    }
    json!({
        "generated_at": store.generated_at,
        "total_responses": store.global_total(),
        "summary": scope_to_json(&store.summary),
        "by_org_type": by_org_type,
    })
}

pub fn record_from_json(obj: &JSMap<String, JSValue>) -> Record {
    let mut r = Record::new();
    for (name, v) in obj.iter() {
        let value = match v {
            JSValue::Null => FieldValue::Null,
            JSValue::String(s) => FieldValue::Text(s.clone()),
            JSValue::Number(n) => match n.as_f64() {
                Some(f) => FieldValue::Number(f),
                None => FieldValue::Text(n.to_string()),
            },
            JSValue::Bool(b) => FieldValue::Text(b.to_string()),
            // Nested values are kept as their JSON text.
            x => FieldValue::Text(x.to_string()),
        };
        r.set(name.clone(), value);
    }
    r
}

pub fn record_to_json(record: &Record) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for (name, v) in record.iter() {
        let js = match v {
            FieldValue::Null => JSValue::Null,
            FieldValue::Text(s) => json!(s),
            FieldValue::Number(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => json!(*f as i64),
            FieldValue::Number(f) => json!(f),
        };
        m.insert(name.to_string(), js);
    }
    JSValue::Object(m)
}

pub fn records_document_to_json(records: &[Record], generated_at: &str) -> JSValue {
    let rows: Vec<JSValue> = records.iter().map(record_to_json).collect();
    json!({
        "generated_at": generated_at,
        "records": rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(js: JSValue) -> JSMap<String, JSValue> {
        match js {
            JSValue::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn lenient_counts() {
        assert_eq!(read_js_count(&json!(7), "t"), 7);
        assert_eq!(read_js_count(&json!("12"), "t"), 12);
        assert_eq!(read_js_count(&json!(2.0), "t"), 2);
        assert_eq!(read_js_count(&json!(-3), "t"), 0);
        assert_eq!(read_js_count(&json!("beaucoup"), "t"), 0);
        assert_eq!(read_js_count(&json!(null), "t"), 0);
    }

    #[test]
    fn scope_keeps_table_order() {
        let scope = scope_from_json(&obj(json!({
            "total_responses": 10,
            "top_service_1": {"Protection": 3, "Santé": 7},
            "note": "ignored",
            "clusters": null,
        })));
        assert_eq!(scope.total_responses, 10);
        assert_eq!(
            scope.field(SurveyField::TopService1).labels(),
            vec!["Protection", "Santé"]
        );
        assert!(scope.field(SurveyField::Clusters).is_empty());
        assert_eq!(scope.tables().count(), 2);
        assert_eq!(
            scope_to_json(&scope)["top_service_1"],
            json!({"Protection": 3, "Santé": 7})
        );
    }

    #[test]
    fn store_from_aggregate_document() {
        let doc: AggregateDocument = serde_json::from_value(json!({
            "total_responses": 12,
            "summary": {"total_responses": 12},
            "by_org_type": {
                "ONG": {"total_responses": 4, "org_types": {"ONG": 4}},
                "broken": 3,
            },
        }))
        .unwrap();
        let store = store_from_document(&doc);
        assert_eq!(store.org_type_labels(), vec!["ONG"]);
        assert_eq!(store.resolve(&ScopeSelector::parse("ONG")).total_responses, 4);
        assert_eq!(store.global_total(), 12);
    }

    #[test]
    fn record_values() {
        let js = json!({
            "organisation": "Mwasi",
            "staff": 12,
            "score": 2.5,
            "note": null,
            "ok": true
        });
        let r = record_from_json(&obj(js.clone()));
        assert_eq!(r.field_names(), vec!["organisation", "staff", "score", "note", "ok"]);
        assert_eq!(r.get("staff"), Some(&FieldValue::Number(12.0)));
        assert_eq!(r.text("ok"), "true");
        let back = record_to_json(&r);
        assert_eq!(back["staff"], json!(12));
        assert_eq!(back["score"], json!(2.5));
        assert_eq!(back["note"], JSValue::Null);
    }

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("/data/exports/CERF.xlsx"), "CERF.xlsx");
        assert_eq!(simplify_file_name("records.json"), "records.json");
    }
}
