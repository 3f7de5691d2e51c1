//! Module filter queries.
//!
//! A [`Query`] names a module and an HTTP method; every other field is
//! passed through untouched as the JSON body of `/{module}/filter`.

use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value};

/// Request descriptor for `/{module}/filter`.
///
/// The module and method select the endpoint and are not sent; `body`
/// carries the filter payload (`filter`, `fields`, `max_num`, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    #[serde(skip)]
    pub module: String,
    #[serde(skip)]
    pub method: Method,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl Query {
    /// A `POST` query with an empty body.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            method: Method::POST,
            body: Map::new(),
        }
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the `filter` expression.
    #[must_use]
    pub fn with_filter(self, filter: Value) -> Self {
        self.with_field("filter", filter)
    }

    /// Sets the returned `fields` list.
    #[must_use]
    pub fn with_fields<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let joined = fields.into_iter().map(Into::into).collect::<Vec<_>>().join(",");
        self.with_field("fields", Value::String(joined))
    }

    /// Sets `max_num`.
    #[must_use]
    pub fn with_max_num(self, max_num: u32) -> Self {
        self.with_field("max_num", Value::from(max_num))
    }

    /// Sets `offset`.
    #[must_use]
    pub fn with_offset(self, offset: u32) -> Self {
        self.with_field("offset", Value::from(offset))
    }

    /// Sets `order_by`.
    #[must_use]
    pub fn with_order_by(self, order_by: impl Into<String>) -> Self {
        self.with_field("order_by", Value::String(order_by.into()))
    }

    /// Sets any body field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.body.insert(key.into(), value);
        self
    }

    /// `/{module}/filter`
    #[must_use]
    pub fn path(&self) -> String {
        format!("/{}/filter", self.module)
    }
}
