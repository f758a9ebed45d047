//! Documents, queries and the entity <-> document mapping.

use std::cmp::Ordering;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::error::{RemoteError, Result};

/// Top-level fields of a document.
pub type Fields = Map<String, Value>;

/// Live query feed. Every item is the complete ordered result set at that
/// point, or the error that ended the feed. Dropping the receiver
/// deregisters the watch.
pub type Watch = mpsc::UnboundedReceiver<Result<Vec<Document>>>;

/// A stored document: its id within the collection plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Decode into an entity. The document id always wins over any `id`
    /// field stored in the body.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields))
            .map_err(|e| RemoteError::Decode(format!("document {}: {e}", self.id)))
    }
}

/// Encode an entity as document fields, leaving out its `id`.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Fields> {
    match serde_json::to_value(value)? {
        Value::Object(mut fields) => {
            fields.remove("id");
            Ok(fields)
        }
        other => Err(RemoteError::Decode(format!(
            "expected an object, got {other}"
        ))),
    }
}

/// Decode every document, failing on the first that does not fit `T`.
pub fn decode_all<T: DeserializeOwned>(docs: &[Document]) -> Result<Vec<T>> {
    docs.iter().map(Document::decode).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A whole-collection query with an optional single-field ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Slash-separated collection path, e.g. `topics/42/messages`.
    pub collection: String,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn collection(path: impl Into<String>) -> Self {
        Self {
            collection: path.into(),
            order_by: None,
        }
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Apply the ordering to `docs` in place. Documents lacking the ordering
    /// field are dropped, as the hosted store does.
    pub fn arrange(&self, docs: &mut Vec<Document>) {
        let Some(ref order) = self.order_by else {
            return;
        };

        docs.retain(|d| d.fields.contains_key(&order.field));
        docs.sort_by(|a, b| {
            let ord = compare_values(&a.fields[&order.field], &b.fields[&order.field]);
            match order.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });
    }
}

/// Split `collection/.../collection/id` into its collection path and id.
pub fn split_document_path(path: &str) -> Result<(&str, &str)> {
    let segments = path.split('/').count();
    if path.is_empty() || segments % 2 != 0 || path.split('/').any(str::is_empty) {
        return Err(RemoteError::Config(format!("not a document path: {path:?}")));
    }
    // Checked above: at least one '/' exists.
    let at = path.rfind('/').unwrap_or(0);
    Ok((&path[..at], &path[at + 1..]))
}

/// Validate a collection path (odd number of non-empty segments).
pub fn check_collection_path(path: &str) -> Result<()> {
    let segments = path.split('/').count();
    if path.is_empty() || segments % 2 != 1 || path.split('/').any(str::is_empty) {
        return Err(RemoteError::Config(format!("not a collection path: {path:?}")));
    }
    Ok(())
}

/// Total order over JSON values following the hosted store's type order:
/// null < bool < number < string < array < object.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.total_cmp(&y)
            }
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(x, y)| compare_values(x, y))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use unmask_shared::{Category, NewTopic, Topic};

    use super::*;

    fn doc(id: &str, value: Value) -> Document {
        match value {
            Value::Object(fields) => Document::new(id, fields),
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn encode_drops_id_and_decode_restores_it() {
        let topic = Topic::from_draft("t1".into(), NewTopic::new("a", "b", Category::Trending, 0));
        let fields = encode(&topic).unwrap();
        assert!(!fields.contains_key("id"));

        let back: Topic = Document::new("t1", fields).decode().unwrap();
        assert_eq!(back, topic);
    }

    #[test]
    fn document_id_overrides_body_id() {
        let d = doc("real", json!({"id": "stale", "userId": "me", "anonymousName": "a", "text": "t", "timestamp": 1}));
        let msg: unmask_shared::Message = d.decode().unwrap();
        assert_eq!(msg.id, "real");
    }

    #[test]
    fn arrange_orders_and_drops_unordered() {
        let mut docs = vec![
            doc("a", json!({"expiresAt": 5})),
            doc("b", json!({"other": 1})),
            doc("c", json!({"expiresAt": 9})),
            doc("d", json!({"expiresAt": 1})),
        ];
        Query::collection("topics")
            .order_by("expiresAt", Direction::Descending)
            .arrange(&mut docs);

        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "d"]);
    }

    #[test]
    fn path_helpers() {
        assert_eq!(split_document_path("users/me").unwrap(), ("users", "me"));
        assert_eq!(
            split_document_path("topics/1/messages/m").unwrap(),
            ("topics/1/messages", "m")
        );
        assert!(split_document_path("users").is_err());
        assert!(split_document_path("users//x").is_err());

        assert!(check_collection_path("topics/1/messages").is_ok());
        assert!(check_collection_path("topics/1").is_err());
    }

    #[test]
    fn mixed_numbers_compare_numerically() {
        assert_eq!(compare_values(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&json!(2.5), &json!(2)), Ordering::Greater);
        assert_eq!(compare_values(&json!(null), &json!(0)), Ordering::Less);
    }
}
