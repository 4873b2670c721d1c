//! Catalog data model.
//!
//! # Purpose
//! Defines the product entity, the command payloads carried on the message
//! bus, and the user record held by the auth directory.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stored form of a document: its field map, without the id. The id is the
/// store key and is only attached when a document crosses the API boundary.
pub type Document = Map<String, Value>;

/// A catalog product.
///
/// `id` is assigned by the store on insert and is immutable afterwards; every
/// other field is optional and independently updatable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Product {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(rename = "imageURL", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Product {
    /// Rebuild a product from a stored field map, attaching the store key as
    /// the product id. Unknown fields in the document are ignored.
    pub fn from_document(id: &str, document: Document) -> Option<Self> {
        let mut value = document;
        value.insert("id".to_string(), Value::String(id.to_string()));
        serde_json::from_value(Value::Object(value)).ok()
    }
}

/// The client-supplied fields of a product. Every field is optional, like on
/// [`Product`] itself; the id never appears here, it is the store key.
///
/// This is both the `product-add` payload and the field map of an update,
/// where deserialization separates it from the routing metadata (`id`,
/// `partialUpdate`) so the consumer never writes either into the stored
/// document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(rename = "imageURL", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ProductFields {
    pub fn into_document(self) -> Document {
        to_document(&self)
    }
}

/// Payload on the `product-update` topic. `partialUpdate` defaults to true
/// when omitted on the wire; the publisher always sets it explicitly from the
/// HTTP method (PUT = full replace, PATCH = merge).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCommand {
    pub id: String,
    #[serde(rename = "partialUpdate", default = "default_partial_update")]
    pub partial_update: bool,
    #[serde(flatten)]
    pub fields: ProductFields,
}

fn default_partial_update() -> bool {
    true
}

/// Payload on the `product-remove` topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveCommand {
    pub id: String,
}

/// A user known to the auth directory. `admin` is the custom claim projected
/// from the `users` collection by the role synchronizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub uid: String,
    pub email: String,
    pub admin: bool,
}

fn to_document<T: Serialize>(value: &T) -> Document {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Document::new(),
    }
}
