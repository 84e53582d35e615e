//! Identifier casing and entity-name inference.

use revspec_core::constants::FALLBACK_ENTITY_NAME;
use revspec_core::FxHashMap;

/// Technical prefixes stripped from owning-construct names.
const TECHNICAL_PREFIXES: &[&str] = &["tb_", "tv_"];

/// Technical suffixes stripped from owning-construct names.
const TECHNICAL_SUFFIXES: &[&str] = &["Controller", "Repository", "Entity", "Service"];

/// Tokens that never name an entity when inferring from action names.
const VERB_TOKENS: &[&str] = &[
    "create", "get", "update", "delete", "find", "add", "remove", "edit", "list", "fetch", "read",
    "save", "insert", "destroy", "new", "set", "retrieve", "patch", "put", "post", "handle", "by",
    "all", "id", "ids", "search", "show", "count", "query", "upsert", "modify", "change", "to",
    "from", "with", "for", "and", "or", "of", "one", "many", "bulk", "batch", "partial",
];

/// Split an identifier into lowercase words on `_`, `-`, spaces, dots,
/// slashes, and camelCase boundaries. Acronym runs stay together.
pub fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = name.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            // fooBar | HTTPServer -> http server
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

pub fn to_pascal_case(name: &str) -> String {
    split_words(name)
        .iter()
        .map(|w| capitalize(w))
        .collect::<String>()
}

pub fn to_snake_case(name: &str) -> String {
    split_words(name).join("_")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// English singular for the common plural endings.
pub fn singularize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if lower.len() > 3 && lower.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if lower.ends_with("sses") || lower.ends_with("xes") || lower.ends_with("ches") || lower.ends_with("shes") {
        return word[..word.len() - 2].to_string();
    }
    if lower.len() > 1 && lower.ends_with('s') && !lower.ends_with("ss") && !lower.ends_with("us") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Remove `tb_`/`tv_` prefixes and `Controller`/`Repository`/`Entity`/`Service`
/// suffixes. A name made only of affixes is returned unchanged.
pub fn strip_technical_affixes(name: &str) -> &str {
    let mut stripped = name;
    for prefix in TECHNICAL_PREFIXES {
        if stripped.len() > prefix.len()
            && stripped
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        {
            stripped = &stripped[prefix.len()..];
            break;
        }
    }
    for suffix in TECHNICAL_SUFFIXES {
        if let Some(rest) = stripped.strip_suffix(suffix) {
            if !rest.is_empty() {
                stripped = rest;
                break;
            }
        }
    }
    if stripped.is_empty() {
        name
    } else {
        stripped
    }
}

/// Entity name for an owning construct, table, or model name.
pub fn entity_name(construct: &str) -> String {
    let name = to_pascal_case(strip_technical_affixes(construct.trim()));
    if name.is_empty() {
        FALLBACK_ENTITY_NAME.to_string()
    } else {
        name
    }
}

fn is_verb(token: &str) -> bool {
    VERB_TOKENS.contains(&token)
}

/// First non-verb token of an action name, singularized.
pub fn subject_token(action_name: &str) -> Option<String> {
    split_words(action_name)
        .into_iter()
        .find(|w| !is_verb(w) && !w.chars().all(|c| c.is_ascii_digit()))
        .map(|w| singularize(&w))
}

/// Infer an entity name from a bare list of action names: the most common
/// non-verb subject token. With more than one name the token must be shared
/// by at least two of them. Falls back to `Entity`.
pub fn infer_common_entity_name<S: AsRef<str>>(action_names: &[S]) -> String {
    let mut counts: FxHashMap<String, (usize, usize)> = FxHashMap::default();
    for (order, name) in action_names.iter().enumerate() {
        if let Some(token) = subject_token(name.as_ref()) {
            counts.entry(token).or_insert((0, order)).0 += 1;
        }
    }

    // Highest count wins; ties go to the token seen first.
    let best = counts
        .into_iter()
        .max_by(|(_, (ca, oa)), (_, (cb, ob))| ca.cmp(cb).then(ob.cmp(oa)));

    let required = if action_names.len() > 1 { 2 } else { 1 };
    match best {
        Some((token, (count, _))) if count >= required => capitalize(&token),
        _ => FALLBACK_ENTITY_NAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("createdAt"), vec!["created", "at"]);
        assert_eq!(split_words("tb_user_role"), vec!["tb", "user", "role"]);
        assert_eq!(split_words("HTTPServer"), vec!["http", "server"]);
        assert_eq!(split_words("getUserById"), vec!["get", "user", "by", "id"]);
    }

    #[test]
    fn test_casing() {
        assert_eq!(to_pascal_case("manufacturer_translation"), "ManufacturerTranslation");
        assert_eq!(to_snake_case("createdAt"), "created_at");
        assert_eq!(to_snake_case("UserProfile"), "user_profile");
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("users"), "user");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("class"), "class");
    }

    #[test]
    fn test_entity_name_strips_affixes() {
        assert_eq!(entity_name("tb_organization"), "Organization");
        assert_eq!(entity_name("tv_user_profile"), "UserProfile");
        assert_eq!(entity_name("UserController"), "User");
        assert_eq!(entity_name("OrderRepository"), "Order");
        assert_eq!(entity_name("Service"), "Service");
        assert_eq!(entity_name(""), "Entity");
    }

    #[test]
    fn test_common_token_inference() {
        assert_eq!(
            infer_common_entity_name(&["createUser", "getUser", "deleteUser"]),
            "User"
        );
        assert_eq!(
            infer_common_entity_name(&["list_orders", "get_order_by_id"]),
            "Order"
        );
        assert_eq!(infer_common_entity_name(&["createUser", "getInvoice"]), "Entity");
        assert_eq!(infer_common_entity_name::<&str>(&[]), "Entity");
        assert_eq!(infer_common_entity_name(&["refund"]), "Refund");
    }
}
