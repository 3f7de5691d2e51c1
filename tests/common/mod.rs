//! Shared fixtures and transport doubles for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use sugar_session::{HttpRequest, HttpResponse, Result, Session, SessionConfig, Transport};

pub const BASE_URL: &str = "https://crm.test";

pub fn token_body(access: &str, refresh: &str) -> Value {
    json!({
        "access_token": access,
        "expires_in": 3600,
        "token_type": "bearer",
        "scope": null,
        "refresh_token": refresh,
        "refresh_expires_in": 1209600,
        "download_token": format!("dl-{access}")
    })
}

/// `/me` payload with the wire inconsistencies seen in the field: numeric
/// strings, `"1"` flags, PHP empty maps, no `Users` in the module list.
pub fn me_body() -> Value {
    json!({
        "current_user": {
            "type": "user",
            "id": "seed_jim_id",
            "full_name": "Jim Brennan",
            "user_name": "jim",
            "roles": ["Sales"],
            "is_manager": "1",
            "is_top_level_manager": false,
            "reports_to_id": "seed_sally_id",
            "reports_to_name": "Sally Bronsen",
            "address_street": "67 Rhode Island Ave",
            "address_city": "Denver",
            "address_country": "USA",
            "address_postalcode": "80202",
            "my_teams": [
                {"id": "East", "name": "East"},
                {"id": "1", "name": "Global", "visible": "1", "private": false}
            ],
            "module_list": ["Home", "Accounts", "Contacts", "Opportunities"],
            "acl": {
                "Accounts": {
                    "admin": "no",
                    "developer": "no",
                    "fields": {"account_type": {"write": "no"}},
                    "_hash": "acl-accounts"
                },
                "Users": {"edit": "no", "fields": []}
            },
            "is_password_expired": false,
            "password_expired_message": "",
            "picture": "",
            "show_wizard": false,
            "preferences": {
                "currency_id": "-99",
                "currency_iso": "USD",
                "currency_name": "US Dollars",
                "currency_rate": "1",
                "currency_show_preferred": false,
                "currency_symbol": "$",
                "decimal_precision": "2",
                "decimal_separator": ".",
                "number_grouping_separator": ",",
                "datepref": "m/d/Y",
                "timepref": "h:ia",
                "first_day_of_week": 0,
                "timezone": "America/Denver",
                "tz_offset": "-0700",
                "tz_offset_sec": -25200,
                "default_teams": [{"id": "1", "display_name": "Global", "primary": true}],
                "email_client_preference": {"type": "sugar"},
                "signature_default": [],
                "signature_prepend": "0",
                "language": "en_us"
            },
            "_hash": "me-hash",
            "site_user_id": "f3b2"
        }
    })
}

pub fn preferences_body() -> Value {
    json!({
        "currency": "-99",
        "currency_show_preferred": "1",
        "default_currency_significant_digits": "2",
        "datef": "Y-m-d",
        "timef": "H:i",
        "dec_sep": ",",
        "num_grp_sep": ".",
        "email_reminder_time": "-1",
        "email_show_counts": 0,
        "reminder_time": 1800,
        "max_tabs": "7",
        "hide_tabs": ["Bugs"],
        "remove_tabs": [],
        "mail_smtpssl": 1,
        "timezone": "Europe/Oslo",
        "user_theme": "RacerX",
        "appearance": "dark"
    })
}

/// Transport double answering from a script and recording every request.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<HttpResponse>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON response; responses are served in order.
    pub fn push(&self, status: StatusCode, body: Value) -> &Self {
        let bytes = serde_json::to_vec(&body).unwrap();
        self.responses
            .lock()
            .unwrap()
            .push_back(HttpResponse::new(status, bytes));
        self
    }

    /// Queue the three responses of a successful connect.
    pub fn push_login(&self, access: &str, refresh: &str) -> &Self {
        self.push(StatusCode::OK, token_body(access, refresh))
            .push(StatusCode::OK, me_body())
            .push(StatusCode::OK, preferences_body())
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn session(&self) -> Session {
        self.session_with(SessionConfig::new(BASE_URL))
    }

    pub fn session_with(&self, config: SessionConfig) -> Session {
        Session::with_transport(config, Arc::new(self.clone())).unwrap()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.responses.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| {
            panic!("unscripted request: {} {}", request.method, request.url)
        }))
    }
}
