//! # Translator
//!
//! Localized message tables, embedded from `locales/*.yaml` at build time.
//! Nested YAML keys are flattened to dotted paths (`commands.message.prompt`).
//! Lookups never fail: a missing locale or key falls back to `en-US`, and a
//! key missing everywhere renders as the key itself.

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use serde_yaml::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

pub const FALLBACK_LOCALE: &str = "en-US";

const EMBEDDED: &[(&str, &str)] = &[
    ("en-US", include_str!("../../locales/en-US.yaml")),
    ("de-DE", include_str!("../../locales/de-DE.yaml")),
];

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("placeholder pattern is valid"));

#[derive(Debug, Clone)]
pub struct Translator {
    tables: HashMap<String, HashMap<String, String>>,
}

impl Translator {
    /// Builds a translator from the tables compiled into the binary.
    pub fn embedded() -> Result<Self> {
        let mut tables = HashMap::new();
        for (locale, source) in EMBEDDED {
            let value: Value = serde_yaml::from_str(source)
                .with_context(|| format!("Failed to parse locale {locale}"))?;
            let mut table = HashMap::new();
            flatten("", &value, &mut table);
            tables.insert(locale.to_string(), table);
        }
        Ok(Self { tables })
    }

    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        locales.sort_unstable();
        locales
    }

    pub fn has_locale(&self, locale: &str) -> bool {
        self.tables.contains_key(locale)
    }

    /// Looks up `key` in `locale` and substitutes `{{ name }}` placeholders.
    /// Substituted values are not scanned again.
    pub fn translate(&self, key: &str, locale: &str, params: &[(&str, &str)]) -> String {
        let template = self
            .lookup(locale, key)
            .or_else(|| self.lookup(FALLBACK_LOCALE, key))
            .unwrap_or(key);

        PLACEHOLDER
            .replace_all(template, |caps: &Captures| {
                let name = &caps[1];
                params
                    .iter()
                    .find(|(param, _)| *param == name)
                    .map(|(_, value)| value.to_string())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// Binds a locale so call sites only pass the key and parameters.
    pub fn for_locale<'a>(&'a self, locale: &'a str) -> LocaleTranslator<'a> {
        LocaleTranslator {
            translator: self,
            locale,
        }
    }

    fn lookup(&self, locale: &str, key: &str) -> Option<&str> {
        self.tables
            .get(locale)
            .and_then(|table| table.get(key))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LocaleTranslator<'a> {
    translator: &'a Translator,
    locale: &'a str,
}

impl LocaleTranslator<'_> {
    pub fn t(&self, key: &str, params: &[(&str, &str)]) -> String {
        self.translator.translate(key, self.locale, params)
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut HashMap<String, String>) {
    match value {
        Value::Mapping(map) => {
            for (k, v) in map {
                let Some(k) = k.as_str() else { continue };
                let path = if prefix.is_empty() {
                    k.to_string()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten(&path, v, out);
            }
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        _ => {}
    }
}
