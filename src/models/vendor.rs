use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Vendor {
    pub id: i32,
    pub name: String,
    /// Base URL every follow-up request endpoint is appended to.
    pub url: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct VendorRequest {
    pub id: i32,
    pub vendor_id: i32,
    pub internal_name: String,
    /// Endpoint path, may contain `${name}` path tokens.
    pub endpoint: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct VendorRequestVariable {
    pub id: i32,
    pub request_id: i32,
    pub internal_name: String,
    pub is_required: bool,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct VendorResponse {
    pub id: i32,
    pub vendor_id: i32,
    pub internal_name: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct VendorResponseVariable {
    pub id: i32,
    pub response_id: i32,
    /// Top-level key of the vendor's webhook payload.
    pub internal_name: String,
}
