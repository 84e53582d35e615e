//! CRUD classification from HTTP methods and action names.

use crate::extractors::naming::split_words;
use crate::model::CrudKind;

const CREATE_VERBS: &[&str] = &["create", "add", "insert", "new", "save", "register", "post", "store"];
const READ_VERBS: &[&str] = &[
    "get", "find", "list", "fetch", "read", "retrieve", "show", "search", "count", "query", "load",
    "index", "view", "exists",
];
const UPDATE_VERBS: &[&str] = &[
    "update", "edit", "modify", "patch", "put", "set", "change", "upsert", "partial",
];
const DELETE_VERBS: &[&str] = &["delete", "remove", "destroy", "drop", "erase", "purge"];

/// GET reads, POST creates, PUT/PATCH update, DELETE deletes.
pub fn crud_from_http(method: &str) -> Option<CrudKind> {
    match method.to_ascii_uppercase().as_str() {
        "GET" | "HEAD" => Some(CrudKind::Read),
        "POST" => Some(CrudKind::Create),
        "PUT" | "PATCH" => Some(CrudKind::Update),
        "DELETE" => Some(CrudKind::Delete),
        _ => None,
    }
}

/// Classify by the leading verb of an action name.
pub fn crud_from_name(name: &str) -> CrudKind {
    let Some(verb) = split_words(name).into_iter().next() else {
        return CrudKind::Custom;
    };
    let verb = verb.as_str();
    if CREATE_VERBS.contains(&verb) {
        CrudKind::Create
    } else if READ_VERBS.contains(&verb) {
        CrudKind::Read
    } else if UPDATE_VERBS.contains(&verb) {
        CrudKind::Update
    } else if DELETE_VERBS.contains(&verb) {
        CrudKind::Delete
    } else {
        CrudKind::Custom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_mapping() {
        assert_eq!(crud_from_http("get"), Some(CrudKind::Read));
        assert_eq!(crud_from_http("POST"), Some(CrudKind::Create));
        assert_eq!(crud_from_http("PATCH"), Some(CrudKind::Update));
        assert_eq!(crud_from_http("DELETE"), Some(CrudKind::Delete));
        assert_eq!(crud_from_http("OPTIONS"), None);
    }

    #[test]
    fn test_name_mapping() {
        assert_eq!(crud_from_name("findAllByEmail"), CrudKind::Read);
        assert_eq!(crud_from_name("partial_update"), CrudKind::Update);
        assert_eq!(crud_from_name("destroy"), CrudKind::Delete);
        assert_eq!(crud_from_name("registerUser"), CrudKind::Create);
        assert_eq!(crud_from_name("approve_order"), CrudKind::Custom);
        assert_eq!(crud_from_name(""), CrudKind::Custom);
    }
}
