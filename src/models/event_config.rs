use std::collections::HashMap;

use crate::models::card_template::{AdaptiveCardTemplate, TemplateAction, TemplateVariable};
use crate::models::event::{
    Event, RequestTemplateMapping, RequestVariableMapping, ResponseTemplateMapping,
    ResponseVariableMapping,
};
use crate::models::vendor::{
    Vendor, VendorRequest, VendorRequestVariable, VendorResponse, VendorResponseVariable,
};

/// Flat rows of one event's rule graph, as returned by the per-table queries.
#[derive(Debug, Clone, Default)]
pub struct EventConfigRows {
    pub response_mappings: Vec<ResponseTemplateMapping>,
    pub response_variable_mappings: Vec<ResponseVariableMapping>,
    pub request_mappings: Vec<RequestTemplateMapping>,
    pub request_variable_mappings: Vec<RequestVariableMapping>,
    pub templates: Vec<AdaptiveCardTemplate>,
    pub template_variables: Vec<TemplateVariable>,
    pub template_actions: Vec<TemplateAction>,
    pub vendors: Vec<Vendor>,
    pub requests: Vec<VendorRequest>,
    pub request_variables: Vec<VendorRequestVariable>,
    pub responses: Vec<VendorResponse>,
    pub response_variables: Vec<VendorResponseVariable>,
}

/// Immutable snapshot of everything needed to build the card for one event.
///
/// Child rows are grouped under their parent id and kept in primary-key
/// order, which is the declaration order the builder relies on.
#[derive(Debug, Clone)]
pub struct EventConfig {
    event: Event,
    response_mappings: Vec<ResponseTemplateMapping>,
    request_mappings: Vec<RequestTemplateMapping>,
    response_variable_mappings: HashMap<i32, Vec<ResponseVariableMapping>>,
    request_variable_mappings: HashMap<i32, Vec<RequestVariableMapping>>,
    templates: HashMap<i32, AdaptiveCardTemplate>,
    template_variables: HashMap<i32, Vec<TemplateVariable>>,
    template_actions: HashMap<i32, TemplateAction>,
    vendors: HashMap<i32, Vendor>,
    requests: HashMap<i32, VendorRequest>,
    request_variables: HashMap<i32, Vec<VendorRequestVariable>>,
    response_variables: HashMap<i32, Vec<VendorResponseVariable>>,
}

fn group_by<T, F>(mut rows: Vec<T>, id: impl Fn(&T) -> i32, parent: F) -> HashMap<i32, Vec<T>>
where
    F: Fn(&T) -> i32,
{
    rows.sort_by_key(|row| id(row));
    let mut grouped: HashMap<i32, Vec<T>> = HashMap::new();
    for row in rows {
        grouped.entry(parent(&row)).or_default().push(row);
    }
    grouped
}

fn index_by<T>(rows: Vec<T>, id: impl Fn(&T) -> i32) -> HashMap<i32, T> {
    rows.into_iter().map(|row| (id(&row), row)).collect()
}

impl EventConfig {
    pub fn from_rows(event: Event, rows: EventConfigRows) -> Self {
        let EventConfigRows {
            mut response_mappings,
            response_variable_mappings,
            mut request_mappings,
            request_variable_mappings,
            templates,
            template_variables,
            template_actions,
            vendors,
            requests,
            request_variables,
            responses: _,
            response_variables,
        } = rows;

        response_mappings.retain(|m| m.event_id == event.id);
        response_mappings.sort_by_key(|m| m.id);
        request_mappings.retain(|m| m.event_id == event.id);
        request_mappings.sort_by_key(|m| m.id);

        EventConfig {
            event,
            response_mappings,
            request_mappings,
            response_variable_mappings: group_by(
                response_variable_mappings,
                |m| m.id,
                |m| m.mapping_id,
            ),
            request_variable_mappings: group_by(
                request_variable_mappings,
                |m| m.id,
                |m| m.mapping_id,
            ),
            templates: index_by(templates, |t| t.id),
            template_variables: group_by(template_variables, |v| v.id, |v| v.template_id),
            template_actions: index_by(template_actions, |a| a.id),
            vendors: index_by(vendors, |v| v.id),
            requests: index_by(requests, |r| r.id),
            request_variables: group_by(request_variables, |v| v.id, |v| v.request_id),
            response_variables: group_by(response_variables, |v| v.id, |v| v.response_id),
        }
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn response_mappings(&self) -> &[ResponseTemplateMapping] {
        &self.response_mappings
    }

    pub fn request_mappings(&self) -> &[RequestTemplateMapping] {
        &self.request_mappings
    }

    pub fn response_variable_mappings(&self, mapping_id: i32) -> &[ResponseVariableMapping] {
        self.response_variable_mappings
            .get(&mapping_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn request_variable_mappings(&self, mapping_id: i32) -> &[RequestVariableMapping] {
        self.request_variable_mappings
            .get(&mapping_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn template(&self, template_id: i32) -> Option<&AdaptiveCardTemplate> {
        self.templates.get(&template_id)
    }

    /// Template of the first declared response mapping; the only one expanded.
    pub fn primary_template(&self) -> Option<&AdaptiveCardTemplate> {
        self.response_mappings
            .first()
            .and_then(|m| self.template(m.template_id))
    }

    pub fn template_variables(&self, template_id: i32) -> &[TemplateVariable] {
        self.template_variables
            .get(&template_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn template_action(&self, action_id: i32) -> Option<&TemplateAction> {
        self.template_actions.get(&action_id)
    }

    pub fn vendor(&self, vendor_id: i32) -> Option<&Vendor> {
        self.vendors.get(&vendor_id)
    }

    pub fn request(&self, request_id: i32) -> Option<&VendorRequest> {
        self.requests.get(&request_id)
    }

    pub fn request_variables(&self, request_id: i32) -> &[VendorRequestVariable] {
        self.request_variables
            .get(&request_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn response_variables(&self, response_id: i32) -> &[VendorResponseVariable] {
        self.response_variables
            .get(&response_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}
