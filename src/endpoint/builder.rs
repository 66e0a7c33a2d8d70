//! Builds an [`Endpoint`] tree from the JSON interface document.
//!
//! The document is an array of node objects:
//!
//! ```json
//! [
//!   { "name": "vbus_voltage", "type": "float", "id": 1, "access": "r" },
//!   { "name": "axis0", "type": "object", "id": 2, "members": [ ... ] }
//! ]
//! ```
//!
//! `name`, `type` and `id` are required on every node, `access` defaults to
//! `"none"`, and `members` nests further nodes under the one that holds it.

use serde_json::{Map, Value};

use super::tree::{Endpoint, DEFAULT_ACCESS};
use crate::error::{OdriveError, Result};

/// Parse a raw interface document and build its tree.
///
/// # Errors
///
/// - `Json` if the bytes are not valid JSON
/// - `MalformedDocument` if any node lacks a required field or has one of the
///   wrong kind; no partial tree is returned
///
/// Nesting is limited by `serde_json`'s recursion limit of 128. Every level of
/// `members` costs an array and an object, so documents deeper than about 60
/// endpoint levels fail with `Json`. Device interfaces are a handful of levels
/// deep.
///
/// # Example
///
/// ```
/// use odrive_client::endpoint::build_tree;
///
/// let doc = br#"[{"name":"a","type":"int32","id":1},
///                {"name":"b","type":"none","id":2,"members":[{"name":"c","type":"float32","id":3}]}]"#;
/// let root = build_tree(doc).unwrap();
/// assert_eq!(root["a"].id(), 1);
/// assert_eq!(root["b"]["c"].declared_type(), "float32");
/// ```
pub fn build_tree(document: &[u8]) -> Result<Endpoint> {
    let value: Value = serde_json::from_slice(document)?;
    build_tree_from_value(&value)
}

/// Build a tree from an already parsed document.
pub fn build_tree_from_value(document: &Value) -> Result<Endpoint> {
    let nodes = document
        .as_array()
        .ok_or_else(|| malformed("top level", "expected an array of endpoints"))?;

    let mut root = Endpoint::root();
    add_members(&mut root, nodes, "")?;

    tracing::info!(
        "Built endpoint tree with {} endpoints",
        root.descendant_count()
    );
    Ok(root)
}

fn add_members(parent: &mut Endpoint, nodes: &[Value], parent_path: &str) -> Result<()> {
    for (index, node) in nodes.iter().enumerate() {
        let location = if parent_path.is_empty() {
            format!("[{}]", index)
        } else {
            format!("{}[{}]", parent_path, index)
        };

        let object = node
            .as_object()
            .ok_or_else(|| malformed(&location, "expected an object"))?;

        let name = required_str(object, "name", &location)?;
        let declared_type = required_str(object, "type", &location)?;
        let id = required_id(object, &location)?;
        let access = match object.get("access") {
            None | Some(Value::Null) => DEFAULT_ACCESS,
            Some(Value::String(access)) => access.as_str(),
            Some(_) => return Err(malformed(&location, "field \"access\" is not a string")),
        };

        let path = if parent_path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", parent_path, name)
        };
        tracing::trace!("Endpoint {} id={} type={}", path, id, declared_type);

        let child = parent.add_child(Endpoint::new(name, declared_type, id, access));

        if let Some(members) = object.get("members") {
            let members = members
                .as_array()
                .ok_or_else(|| malformed(&path, "field \"members\" is not an array"))?;
            add_members(child, members, &path)?;
        }
    }
    Ok(())
}

fn required_str<'a>(object: &'a Map<String, Value>, field: &str, location: &str) -> Result<&'a str> {
    match object.get(field) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(malformed(location, &format!("field {:?} is not a string", field))),
        None => Err(malformed(location, &format!("missing field {:?}", field))),
    }
}

fn required_id(object: &Map<String, Value>, location: &str) -> Result<u16> {
    let value = object
        .get("id")
        .ok_or_else(|| malformed(location, "missing field \"id\""))?;
    value
        .as_u64()
        .and_then(|id| u16::try_from(id).ok())
        .ok_or_else(|| malformed(location, &format!("field \"id\" is not a 16-bit address: {}", value)))
}

fn malformed(location: &str, reason: &str) -> OdriveError {
    OdriveError::MalformedDocument(format!("{}: {}", location, reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &[u8] = br#"[
        {"name":"a","type":"int32","id":1},
        {"name":"b","type":"none","id":2,"members":[{"name":"c","type":"float32","id":3}]}
    ]"#;

    fn assert_malformed(document: &[u8], needle: &str) {
        match build_tree(document) {
            Err(OdriveError::MalformedDocument(msg)) => {
                assert!(msg.contains(needle), "{:?} does not mention {:?}", msg, needle)
            }
            other => panic!("expected MalformedDocument, got {:?}", other),
        }
    }

    #[test]
    fn test_example_tree() {
        let root = build_tree(EXAMPLE).unwrap();

        let names: Vec<&str> = root.children().map(Endpoint::name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(root["a"].id(), 1);

        let b = &root["b"];
        assert_eq!(b.children().count(), 1);
        let c = &b["c"];
        assert_eq!(c.id(), 3);
        assert_eq!(c.declared_type(), "float32");
    }

    #[test]
    fn test_access_defaults_to_none() {
        let root = build_tree(EXAMPLE).unwrap();
        assert_eq!(root["a"].access(), "none");
    }

    #[test]
    fn test_access_kept() {
        let root = build_tree(br#"[{"name":"a","type":"int32","id":1,"access":"rw"}]"#).unwrap();
        assert_eq!(root["a"].access(), "rw");
    }

    #[test]
    fn test_empty_document() {
        let root = build_tree(b"[]").unwrap();
        assert!(root.is_leaf());
    }

    #[test]
    fn test_missing_id_rejected() {
        assert_malformed(br#"[{"name":"a","type":"int32"}]"#, "missing field \"id\"");
    }

    #[test]
    fn test_missing_name_rejected() {
        assert_malformed(br#"[{"type":"int32","id":1}]"#, "missing field \"name\"");
    }

    #[test]
    fn test_missing_type_rejected_deep() {
        assert_malformed(
            br#"[{"name":"axis0","type":"object","id":1,"members":[{"name":"x","id":2}]}]"#,
            "axis0[0]: missing field \"type\"",
        );
    }

    #[test]
    fn test_wrong_kinds_rejected() {
        assert_malformed(br#"[{"name":5,"type":"int32","id":1}]"#, "\"name\" is not a string");
        assert_malformed(br#"[{"name":"a","type":"int32","id":"1"}]"#, "\"id\"");
        assert_malformed(br#"[{"name":"a","type":"int32","id":-1}]"#, "\"id\"");
        assert_malformed(br#"[{"name":"a","type":"int32","id":70000}]"#, "\"id\"");
        assert_malformed(br#"[{"name":"a","type":"int32","id":1,"access":3}]"#, "access");
        assert_malformed(br#"[{"name":"a","type":"int32","id":1,"members":{}}]"#, "members");
        assert_malformed(br#"[3]"#, "expected an object");
        assert_malformed(br#"{"name":"a"}"#, "top level");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(build_tree(b"[{"), Err(OdriveError::Json(_))));
    }

    fn nested_document(depth: usize) -> String {
        let mut doc = String::new();
        for i in 0..depth {
            doc.push_str(&format!(r#"[{{"name":"n{}","type":"object","id":{},"members":"#, i, i + 1));
        }
        doc.push_str("[]");
        for _ in 0..depth {
            doc.push_str("}]");
        }
        doc
    }

    #[test]
    fn test_nesting_limit() {
        assert!(build_tree(nested_document(60).as_bytes()).is_ok());
        assert!(matches!(
            build_tree(nested_document(100).as_bytes()),
            Err(OdriveError::Json(_))
        ));
    }

    #[test]
    fn test_deep_nesting() {
        let depth = 40;
        let doc = nested_document(depth);

        let root = build_tree(doc.as_bytes()).unwrap();
        assert_eq!(root.descendant_count(), depth);
        let path: Vec<String> = (0..depth).map(|i| format!("n{}", i)).collect();
        assert_eq!(root.find(&path.join(".")).unwrap().id(), depth as u16);
    }

    #[test]
    fn test_document_roundtrip() {
        let root = build_tree(EXAMPLE).unwrap();
        let exported = root.to_document().unwrap();
        assert_eq!(build_tree(exported.as_bytes()).unwrap(), root);
    }
}
