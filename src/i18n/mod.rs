//! Locale-aware message catalogs for user-facing validation text.

use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_LOCALE: &str = "en";

/// One locale's message templates. `{0}`, `{1}` are positional parameters.
#[derive(Debug, Clone)]
pub struct Translator {
    locale: String,
    messages: HashMap<&'static str, &'static str>,
}

impl Translator {
    pub fn new(locale: impl Into<String>, messages: &[(&'static str, &'static str)]) -> Self {
        Self {
            locale: locale.into(),
            messages: messages.iter().copied().collect(),
        }
    }

    pub fn english() -> Self {
        Self::new(DEFAULT_LOCALE, ENGLISH)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Render a template. Unknown keys come back as the key itself.
    pub fn t(&self, key: &str, params: &[&str]) -> String {
        let Some(template) = self.messages.get(key) else {
            return key.to_string();
        };
        let mut out = template.to_string();
        for (i, param) in params.iter().enumerate() {
            out = out.replace(&format!("{{{}}}", i), param);
        }
        out
    }
}

const ENGLISH: &[(&str, &str)] = &[
    ("required", "{0} is a required field"),
    ("notBlank-string", "The {0} cannot be blank"),
    ("notBlank-items", "You did not provide any {0}"),
    ("uuid4", "{0} must be a valid version 4 UUID"),
    ("isIsoDate", "The {0} must follow the \"yyyy-mm-dd\" format"),
    ("oneof", "{0} must be one of [{1}]"),
    ("min-string", "{0} must be at least {1} characters in length"),
    ("username", "The {0} may only contain letters, digits, '.', '-' and '_'"),
    (
        "password",
        "Password must have at least 1 lowercase, 1 uppercase, 1 number and 1 symbol/special character",
    ),
];

/// Registry of translators keyed by language subtag.
#[derive(Debug, Clone)]
pub struct UniversalTranslator {
    fallback: Arc<Translator>,
    translators: HashMap<String, Arc<Translator>>,
}

impl UniversalTranslator {
    pub fn new(fallback: Translator) -> Self {
        let fallback = Arc::new(fallback);
        let mut translators = HashMap::new();
        translators.insert(fallback.locale().to_string(), fallback.clone());
        Self { fallback, translators }
    }

    pub fn add(&mut self, translator: Translator) {
        self.translators
            .insert(translator.locale().to_string(), Arc::new(translator));
    }

    pub fn get(&self, locale: &str) -> Option<Arc<Translator>> {
        self.translators.get(locale).cloned()
    }

    /// Pick a translator from an `Accept-Language` value.
    ///
    /// Only the language subtag of the first listed entry is considered;
    /// anything unknown or missing falls back to the default locale.
    pub fn for_accept_language(&self, header: Option<&str>) -> Arc<Translator> {
        header
            .and_then(|h| h.split(',').next())
            .and_then(|entry| entry.split(';').next())
            .and_then(|tag| tag.trim().split('-').next())
            .map(|lang| lang.to_ascii_lowercase())
            .and_then(|lang| self.get(&lang))
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl Default for UniversalTranslator {
    fn default() -> Self {
        Self::new(Translator::english())
    }
}
