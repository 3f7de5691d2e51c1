//! Preference bundles.
//!
//! The server reports preferences twice: a global bundle under
//! `current_user.preferences` in `/me`, and the user's own settings as the
//! whole `/me/preferences` response. Several keys appear in both with
//! different meanings or types (`currency_show_preferred`, `timezone`,
//! `default_locale_name_format`), so the bundles stay separate records.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use super::document::{coerce_string, coerce_string_map, Document};
use crate::error::Result;

/// Preferences reported inside `/me`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlobalPreferences {
    pub currency_id: i64,
    pub currency_iso: String,
    pub currency_name: String,
    pub currency_rate: f64,
    pub currency_symbol: String,
    pub show_preferred_currency: bool,
    pub date_format: String,
    pub time_format: String,
    pub decimal_precision: i64,
    pub decimal_separator: String,
    pub number_grouping_separator: String,
    pub default_teams: Vec<BTreeMap<String, String>>,
    pub email_client_preference: BTreeMap<String, String>,
    pub first_day_of_week: i64,
    pub language: String,
    pub sweetspot: String,
    pub locale_name_default_format: String,
    pub signature_default: Vec<String>,
    pub signature_prepend: bool,
    pub timezone: String,
    pub tz_offset_display: String,
    pub tz_offset_seconds: f64,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl GlobalPreferences {
    pub(crate) fn from_document(doc: &Document<'_>) -> Result<Self> {
        let default_teams = doc
            .object_list("default_teams")?
            .iter()
            .map(|team| {
                let mut out = BTreeMap::new();
                for (key, value) in team.remaining() {
                    let text = coerce_string(&value, &team.field_path(&key))?;
                    out.insert(key, text);
                }
                Ok(out)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            currency_id: doc.int("currency_id")?,
            currency_iso: doc.string("currency_iso")?,
            currency_name: doc.string("currency_name")?,
            currency_rate: doc.float("currency_rate")?,
            currency_symbol: doc.string("currency_symbol")?,
            show_preferred_currency: doc.bool("currency_show_preferred")?,
            date_format: doc.string("datepref")?,
            time_format: doc.string("timepref")?,
            decimal_precision: doc.int("decimal_precision")?,
            decimal_separator: doc.string("decimal_separator")?,
            number_grouping_separator: doc.string("number_grouping_separator")?,
            default_teams,
            email_client_preference: doc.string_map("email_client_preference")?,
            first_day_of_week: doc.int("first_day_of_week")?,
            language: doc.string("language")?,
            sweetspot: doc.string("sweetspot")?,
            locale_name_default_format: doc.string("default_locale_name_format")?,
            signature_default: doc.string_list("signature_default")?,
            signature_prepend: doc.bool("signature_prepend")?,
            timezone: doc.string("timezone")?,
            tz_offset_display: doc.string("tz_offset")?,
            tz_offset_seconds: doc.float("tz_offset_sec")?,
            extra: doc.remaining(),
        })
    }
}

/// Preferences reported by `/me/preferences`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserPreferences {
    pub calendar_publish_key: String,
    pub currency_default_significant_digits: i64,
    pub currency_id: i64,
    pub currency_show_preferred: bool,
    pub date_format: String,
    pub time_format: String,
    pub decimal_separator: String,
    pub number_group_separator: String,
    pub email_link_type: String,
    pub email_reminder_time: i64,
    pub email_show_counts: bool,
    pub reminder_time: i64,
    pub export_charset_default: String,
    pub export_delimiter: String,
    pub fdow: String,
    pub hide_tabs: Vec<String>,
    pub remove_tabs: Vec<String>,
    pub max_tabs: i64,
    pub locale_default_name_format: String,
    pub lockout: String,
    pub login_expiration: String,
    pub login_failed: String,
    pub mail_smtp_auth_req: String,
    pub mail_smtp_pass: String,
    pub mail_smtp_ssl: bool,
    pub mail_smtp_server: String,
    pub mail_smtp_user: String,
    pub mailmerge_on: String,
    pub module_favicon: String,
    pub navigation_paradigm: String,
    pub no_opps: String,
    pub subpanel_tabs: String,
    pub pdf_data_font_name: String,
    pub pdf_data_font_size: String,
    pub pdf_main_font_name: String,
    pub pdf_main_font_size: String,
    pub swap_last_viewed: String,
    pub swap_shortcuts: String,
    pub timezone: String,
    pub ut: String,
    pub use_real_names: String,
    pub user_theme: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl UserPreferences {
    pub(crate) fn from_document(doc: &Document<'_>) -> Result<Self> {
        Ok(Self {
            calendar_publish_key: doc.string("calendar_publish_key")?,
            currency_default_significant_digits: doc.int("default_currency_significant_digits")?,
            currency_id: doc.int("currency")?,
            currency_show_preferred: doc.bool("currency_show_preferred")?,
            date_format: doc.string("datef")?,
            time_format: doc.string("timef")?,
            decimal_separator: doc.string("dec_sep")?,
            number_group_separator: doc.string("num_grp_sep")?,
            email_link_type: doc.string("email_link_type")?,
            email_reminder_time: doc.int("email_reminder_time")?,
            email_show_counts: doc.bool("email_show_counts")?,
            reminder_time: doc.int("reminder_time")?,
            export_charset_default: doc.string("default_export_charset")?,
            // The server spells this key "delimeter".
            export_delimiter: doc.string("export_delimeter")?,
            fdow: doc.string("fdow")?,
            hide_tabs: doc.string_list("hide_tabs")?,
            remove_tabs: doc.string_list("remove_tabs")?,
            max_tabs: doc.int("max_tabs")?,
            locale_default_name_format: doc.string("default_locale_name_format")?,
            lockout: doc.string("lockout")?,
            login_expiration: doc.string("loginexpiration")?,
            login_failed: doc.string("loginfailed")?,
            mail_smtp_auth_req: doc.string("mail_smtpauth_req")?,
            mail_smtp_pass: doc.string("mail_smtppass")?,
            mail_smtp_ssl: doc.bool("mail_smtpssl")?,
            mail_smtp_server: doc.string("mail_smtpserver")?,
            mail_smtp_user: doc.string("mail_smtpuser")?,
            mailmerge_on: doc.string("mailmerge_on")?,
            module_favicon: doc.string("module_favicon")?,
            navigation_paradigm: doc.string("navigation_paradigm")?,
            no_opps: doc.string("no_opps")?,
            subpanel_tabs: doc.string("subpanel_tabs")?,
            pdf_data_font_name: doc.string("sugarpdf_pdf_font_name_data")?,
            pdf_data_font_size: doc.string("sugarpdf_pdf_font_size_data")?,
            pdf_main_font_name: doc.string("sugarpdf_pdf_font_name_main")?,
            pdf_main_font_size: doc.string("sugarpdf_pdf_font_size_main")?,
            swap_last_viewed: doc.string("swap_last_viewed")?,
            swap_shortcuts: doc.string("swap_shortcuts")?,
            timezone: doc.string("timezone")?,
            ut: doc.string("ut")?,
            use_real_names: doc.string("use_real_names")?,
            user_theme: doc.string("user_theme")?,
            extra: doc.remaining(),
        })
    }

    /// Email client settings are not modelled; they stay in `extra`.
    #[must_use]
    pub fn extra_map(&self, key: &str) -> Option<BTreeMap<String, String>> {
        self.extra
            .get(key)
            .and_then(|v| coerce_string_map(v, key).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_global_preferences_coerce_wire_types() {
        let map = object(json!({
            "currency_id": "-99",
            "currency_iso": "USD",
            "currency_rate": "1.0",
            "currency_show_preferred": false,
            "decimal_precision": "2",
            "default_teams": [{"id": "1", "display_name": "Global", "primary": true}],
            "email_client_preference": {"type": "sugar"},
            "first_day_of_week": 0,
            "signature_default": "",
            "tz_offset_sec": -18000,
            "language": "en_us"
        }));
        let prefs = GlobalPreferences::from_document(&Document::new(&map, "preferences")).unwrap();

        assert_eq!(prefs.currency_id, -99);
        assert_eq!(prefs.currency_iso, "USD");
        assert!((prefs.currency_rate - 1.0).abs() < f64::EPSILON);
        assert_eq!(prefs.decimal_precision, 2);
        assert_eq!(prefs.default_teams.len(), 1);
        assert_eq!(prefs.default_teams[0]["primary"], "1");
        assert_eq!(prefs.email_client_preference["type"], "sugar");
        assert_eq!(prefs.signature_default, vec![String::new()]);
        assert!((prefs.tz_offset_seconds + 18000.0).abs() < f64::EPSILON);
        assert_eq!(prefs.language, "en_us");
        assert!(prefs.extra.is_empty());
    }

    #[test]
    fn test_user_preferences_keep_unknown_keys() {
        let map = object(json!({
            "currency": "-99",
            "max_tabs": "7",
            "mail_smtpssl": "1",
            "hide_tabs": ["Bugs", "Cases"],
            "export_delimeter": ",",
            "email_client_preference": {"type": "external"},
            "appearance": "dark"
        }));
        let prefs = UserPreferences::from_document(&Document::new(&map, "")).unwrap();

        assert_eq!(prefs.currency_id, -99);
        assert_eq!(prefs.max_tabs, 7);
        assert!(prefs.mail_smtp_ssl);
        assert_eq!(prefs.hide_tabs, vec!["Bugs", "Cases"]);
        assert_eq!(prefs.export_delimiter, ",");
        assert_eq!(prefs.extra.get("appearance"), Some(&json!("dark")));
        assert_eq!(
            prefs.extra_map("email_client_preference").unwrap()["type"],
            "external"
        );
    }
}
