use std::collections::HashMap;

use tracing::debug;

use crate::engine::templating::TemplateValues;
use crate::models::card_template::TemplateVariable;

/// Moves resolved values from template-variable ids to the token names used
/// inside the template string.
///
/// Variables without a resolved value stay absent; `default_value` and
/// `is_required` are not consulted here.
pub(crate) fn assemble_template_values(
    variables: &[TemplateVariable],
    resolved: &HashMap<i32, String>,
    values: &mut TemplateValues,
) -> usize {
    let mut inserted = 0;
    for variable in variables {
        match resolved.get(&variable.id) {
            Some(value) => {
                values.insert(variable.internal_name.clone(), value.clone());
                inserted += 1;
            }
            None => debug!(
                template_variable_id = variable.id,
                name = %variable.internal_name,
                "template variable left unresolved"
            ),
        }
    }
    inserted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(id: i32, name: &str) -> TemplateVariable {
        TemplateVariable {
            id,
            template_id: 1,
            internal_name: name.into(),
            is_required: true,
            default_value: "fallback".into(),
        }
    }

    #[test]
    fn renames_ids_to_token_names() {
        let resolved = HashMap::from([(1, "Printer on fire".to_string()), (9, "ignored".into())]);
        let mut values = TemplateValues::new();

        let inserted = assemble_template_values(
            &[variable(1, "title"), variable(2, "priority")],
            &resolved,
            &mut values,
        );

        assert_eq!(inserted, 1);
        assert_eq!(values.get("title").map(String::as_str), Some("Printer on fire"));
        assert!(!values.contains_key("priority"), "defaults are not applied");
    }

    #[test]
    fn overwrites_existing_names() {
        let mut values = TemplateValues::from([("title".to_string(), "old".to_string())]);
        let resolved = HashMap::from([(1, "new".to_string())]);
        assemble_template_values(&[variable(1, "title")], &resolved, &mut values);
        assert_eq!(values.get("title").map(String::as_str), Some("new"));
    }
}
