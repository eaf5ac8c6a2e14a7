use std::collections::HashMap;

use tracing::{debug, warn};

use crate::engine::extractor::{SourceKey, SourceTable};
use crate::models::event::{RequestVariableMapping, ResponseVariableMapping};

/// Placeholder a combine base string carries for the resolved source value.
pub const COMBINE_TOKEN: &str = "${0}";

/// A leaf rule resolving one destination value from a source table.
pub(crate) trait VariableMapping {
    fn id(&self) -> i32;
    fn combine(&self) -> bool;
    fn local_name(&self) -> Option<&str>;
    fn source_variable_id(&self) -> Option<i32>;
    fn destination_id(&self) -> i32;
}

impl VariableMapping for ResponseVariableMapping {
    fn id(&self) -> i32 {
        self.id
    }

    fn combine(&self) -> bool {
        self.combine
    }

    fn local_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn source_variable_id(&self) -> Option<i32> {
        self.response_variable_id
    }

    fn destination_id(&self) -> i32 {
        self.template_variable_id
    }
}

impl VariableMapping for RequestVariableMapping {
    fn id(&self) -> i32 {
        self.id
    }

    fn combine(&self) -> bool {
        self.combine
    }

    fn local_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn source_variable_id(&self) -> Option<i32> {
        self.response_variable_id
    }

    fn destination_id(&self) -> i32 {
        self.request_variable_id
    }
}

/// Splices `raw` into the first `${0}` of `base`.
pub fn combine_value(base: &str, raw: &str) -> String {
    base.replacen(COMBINE_TOKEN, raw, 1)
}

/// Resolves the value of a single mapping, or `None` when it has to be
/// skipped. Skips are logged and never abort the surrounding pass.
pub(crate) fn resolve_mapping<M: VariableMapping>(mapping: &M, sources: &SourceTable) -> Option<String> {
    let raw = match (mapping.source_variable_id(), mapping.local_name()) {
        (Some(variable_id), _) => sources.get(&SourceKey::Variable(variable_id)),
        (None, Some(name)) => sources.get(&SourceKey::local(name)),
        (None, None) => {
            warn!(
                mapping_id = mapping.id(),
                "variable mapping has neither a source variable nor a local name; skipping"
            );
            return None;
        }
    };

    let Some(raw) = raw else {
        debug!(mapping_id = mapping.id(), "no value found for mapping; skipping");
        return None;
    };

    if !(mapping.combine() && mapping.source_variable_id().is_some()) {
        return Some(raw.clone());
    }

    let Some(name) = mapping.local_name() else {
        warn!(
            mapping_id = mapping.id(),
            "combine mapping has no local base name; skipping"
        );
        return None;
    };
    let Some(base) = sources.get(&SourceKey::local(name)) else {
        warn!(
            mapping_id = mapping.id(),
            base = name,
            "combine base value missing from local json; skipping"
        );
        return None;
    };
    if !base.contains(COMBINE_TOKEN) {
        debug!(
            mapping_id = mapping.id(),
            base = name,
            "combine base has no ${{0}} placeholder; using it unchanged"
        );
    }
    Some(combine_value(base, raw))
}

/// Resolves every mapping into a table keyed by destination id. Later
/// mappings overwrite earlier ones targeting the same destination.
pub(crate) fn resolve_mappings<'a, M, I>(mappings: I, sources: &SourceTable) -> HashMap<i32, String>
where
    M: VariableMapping + 'a,
    I: IntoIterator<Item = &'a M>,
{
    let mut resolved = HashMap::new();
    for mapping in mappings {
        if let Some(value) = resolve_mapping(mapping, sources) {
            resolved.insert(mapping.destination_id(), value);
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(
        id: i32,
        combine: bool,
        name: Option<&str>,
        source: Option<i32>,
        destination: i32,
    ) -> ResponseVariableMapping {
        ResponseVariableMapping {
            id,
            mapping_id: 1,
            combine,
            name: name.map(str::to_string),
            response_variable_id: source,
            template_variable_id: destination,
        }
    }

    fn sources() -> SourceTable {
        let mut table = SourceTable::new();
        table.insert(SourceKey::Variable(1), "World".into());
        table.insert(SourceKey::Variable(2), "42".into());
        table.insert(SourceKey::local("greeting"), "Hello ${0}!".into());
        table.insert(SourceKey::local("twice"), "${0} and ${0}".into());
        table.insert(SourceKey::local("plain"), "static text".into());
        table
    }

    #[test]
    fn combine_replaces_first_placeholder_only() {
        assert_eq!(combine_value("Hello ${0}!", "World"), "Hello World!");
        assert_eq!(combine_value("${0} and ${0}", "a"), "a and ${0}");
    }

    #[test]
    fn source_variable_takes_precedence_over_name() {
        let m = mapping(1, false, Some("plain"), Some(2), 10);
        assert_eq!(resolve_mapping(&m, &sources()).as_deref(), Some("42"));
    }

    #[test]
    fn local_name_is_used_without_source() {
        let m = mapping(1, false, Some("plain"), None, 10);
        assert_eq!(resolve_mapping(&m, &sources()).as_deref(), Some("static text"));
    }

    #[test]
    fn combine_splices_source_into_base() {
        let m = mapping(1, true, Some("greeting"), Some(1), 10);
        assert_eq!(resolve_mapping(&m, &sources()).as_deref(), Some("Hello World!"));

        let m = mapping(2, true, Some("twice"), Some(1), 10);
        assert_eq!(resolve_mapping(&m, &sources()).as_deref(), Some("World and ${0}"));
    }

    #[test]
    fn combine_without_source_uses_local_value_as_is() {
        let m = mapping(1, true, Some("greeting"), None, 10);
        assert_eq!(resolve_mapping(&m, &sources()).as_deref(), Some("Hello ${0}!"));
    }

    #[test]
    fn combine_with_missing_base_is_skipped() {
        let m = mapping(1, true, Some("nowhere"), Some(1), 10);
        assert!(resolve_mapping(&m, &sources()).is_none());

        let m = mapping(2, true, None, Some(1), 10);
        assert!(resolve_mapping(&m, &sources()).is_none());
    }

    #[test]
    fn inert_and_unresolved_mappings_are_skipped() {
        let mappings = vec![
            mapping(1, false, None, None, 10),
            mapping(2, false, None, Some(99), 11),
            mapping(3, false, Some("absent"), None, 12),
            mapping(4, false, None, Some(1), 13),
        ];
        let resolved = resolve_mappings(&mappings, &sources());

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.get(&13).map(String::as_str), Some("World"));
    }

    #[test]
    fn later_mappings_overwrite_same_destination() {
        let mappings = vec![
            mapping(1, false, None, Some(1), 10),
            mapping(2, false, None, Some(2), 10),
        ];
        let resolved = resolve_mappings(&mappings, &sources());
        assert_eq!(resolved.get(&10).map(String::as_str), Some("42"));
    }

    #[test]
    fn request_mappings_resolve_to_request_variable_ids() {
        let request_mapping = RequestVariableMapping {
            id: 1,
            mapping_id: 1,
            combine: false,
            name: None,
            response_variable_id: Some(2),
            request_variable_id: 77,
        };
        let resolved = resolve_mappings([&request_mapping], &sources());
        assert_eq!(resolved.get(&77).map(String::as_str), Some("42"));
    }
}
