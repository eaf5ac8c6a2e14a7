use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::debug;

use crate::db::event_config_repository::EventConfigRepository;
use crate::models::{
    card_template::{AdaptiveCardTemplate, TemplateAction, TemplateVariable},
    event::{
        Event, RequestTemplateMapping, RequestVariableMapping, ResponseTemplateMapping,
        ResponseVariableMapping,
    },
    event_config::{EventConfig, EventConfigRows},
    vendor::{Vendor, VendorRequest, VendorRequestVariable, VendorResponse, VendorResponseVariable},
};

pub struct PostgresEventConfigRepository {
    pub pool: PgPool,
}

fn unique_ids(ids: impl IntoIterator<Item = i32>) -> Vec<i32> {
    let mut ids: Vec<i32> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

async fn fetch_rows(conn: &mut PgConnection, event_id: i32) -> Result<EventConfigRows, sqlx::Error> {
    let response_mappings = sqlx::query_as::<_, ResponseTemplateMapping>(
        r#"
        SELECT id, event_id, template_id, response_id, json
        FROM vendor_response_template_mapping
        WHERE event_id = $1
        ORDER BY id
        "#,
    )
    .bind(event_id)
    .fetch_all(&mut *conn)
    .await?;

    let request_mappings = sqlx::query_as::<_, RequestTemplateMapping>(
        r#"
        SELECT id, event_id, request_id, action_id, json
        FROM vendor_request_template_mapping
        WHERE event_id = $1
        ORDER BY id
        "#,
    )
    .bind(event_id)
    .fetch_all(&mut *conn)
    .await?;

    let response_mapping_ids = unique_ids(response_mappings.iter().map(|m| m.id));
    let response_variable_mappings = sqlx::query_as::<_, ResponseVariableMapping>(
        r#"
        SELECT id, mapping_id, combine, name, response_variable_id, template_variable_id
        FROM response_variable_mapping
        WHERE mapping_id = ANY($1)
        ORDER BY id
        "#,
    )
    .bind(&response_mapping_ids)
    .fetch_all(&mut *conn)
    .await?;

    let request_mapping_ids = unique_ids(request_mappings.iter().map(|m| m.id));
    let request_variable_mappings = sqlx::query_as::<_, RequestVariableMapping>(
        r#"
        SELECT id, mapping_id, combine, name, response_variable_id, request_variable_id
        FROM request_variable_mapping
        WHERE mapping_id = ANY($1)
        ORDER BY id
        "#,
    )
    .bind(&request_mapping_ids)
    .fetch_all(&mut *conn)
    .await?;

    let template_ids = unique_ids(response_mappings.iter().map(|m| m.template_id));
    let templates = sqlx::query_as::<_, AdaptiveCardTemplate>(
        r#"
        SELECT id, internal_name, template_string
        FROM adaptive_card_template
        WHERE id = ANY($1)
        "#,
    )
    .bind(&template_ids)
    .fetch_all(&mut *conn)
    .await?;

    let template_variables = sqlx::query_as::<_, TemplateVariable>(
        r#"
        SELECT id, template_id, internal_name, is_required, default_value
        FROM template_variable
        WHERE template_id = ANY($1)
        ORDER BY id
        "#,
    )
    .bind(&template_ids)
    .fetch_all(&mut *conn)
    .await?;

    let action_ids = unique_ids(request_mappings.iter().map(|m| m.action_id));
    let template_actions = sqlx::query_as::<_, TemplateAction>(
        r#"
        SELECT id, template_id, internal_name, action_type
        FROM template_action
        WHERE id = ANY($1)
        "#,
    )
    .bind(&action_ids)
    .fetch_all(&mut *conn)
    .await?;

    let response_ids = unique_ids(response_mappings.iter().filter_map(|m| m.response_id));
    let responses = sqlx::query_as::<_, VendorResponse>(
        r#"
        SELECT id, vendor_id, internal_name
        FROM vendor_response
        WHERE id = ANY($1)
        "#,
    )
    .bind(&response_ids)
    .fetch_all(&mut *conn)
    .await?;

    let response_variables = sqlx::query_as::<_, VendorResponseVariable>(
        r#"
        SELECT id, response_id, internal_name
        FROM vendor_response_variable
        WHERE response_id = ANY($1)
        ORDER BY id
        "#,
    )
    .bind(&response_ids)
    .fetch_all(&mut *conn)
    .await?;

    let request_ids = unique_ids(request_mappings.iter().map(|m| m.request_id));
    let requests = sqlx::query_as::<_, VendorRequest>(
        r#"
        SELECT id, vendor_id, internal_name, endpoint
        FROM vendor_request
        WHERE id = ANY($1)
        "#,
    )
    .bind(&request_ids)
    .fetch_all(&mut *conn)
    .await?;

    let request_variables = sqlx::query_as::<_, VendorRequestVariable>(
        r#"
        SELECT id, request_id, internal_name, is_required
        FROM vendor_request_variable
        WHERE request_id = ANY($1)
        ORDER BY id
        "#,
    )
    .bind(&request_ids)
    .fetch_all(&mut *conn)
    .await?;

    let vendor_ids = unique_ids(
        requests
            .iter()
            .map(|r| r.vendor_id)
            .chain(responses.iter().map(|r| r.vendor_id)),
    );
    let vendors = sqlx::query_as::<_, Vendor>(
        r#"
        SELECT id, name, url
        FROM vendor
        WHERE id = ANY($1)
        "#,
    )
    .bind(&vendor_ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(EventConfigRows {
        response_mappings,
        response_variable_mappings,
        request_mappings,
        request_variable_mappings,
        templates,
        template_variables,
        template_actions,
        vendors,
        requests,
        request_variables,
        responses,
        response_variables,
    })
}

#[async_trait]
impl EventConfigRepository for PostgresEventConfigRepository {
    async fn load_event_config(&self, event_id: i32) -> Result<Option<EventConfig>, sqlx::Error> {
        // All reads share one snapshot so a concurrent rule edit is either
        // fully visible or not at all.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, name, summary
            FROM event
            WHERE id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(event) = event else {
            tx.commit().await?;
            debug!(event_id, "no rule set stored for event");
            return Ok(None);
        };

        let rows = fetch_rows(&mut *tx, event_id).await?;
        tx.commit().await?;

        debug!(
            event_id,
            response_mappings = rows.response_mappings.len(),
            request_mappings = rows.request_mappings.len(),
            "loaded event rule set"
        );
        Ok(Some(EventConfig::from_rows(event, rows)))
    }
}
