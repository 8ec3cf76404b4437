// crates/score-ledger-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Provides message catalogs and translation utilities for the CLI.
// Purpose: Centralize user-facing strings in English and Spanish.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! The Score Ledger CLI stores user-facing strings in small per-locale
//! catalogs. All runtime output should be routed through the
//! [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - Catalogs are initialized once and read-only thereafter.
//! - Every locale carries the same keys as English.
//! - Missing keys fall back to English, then to the key itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;

// ============================================================================
// SECTION: Locale
// ============================================================================

/// Supported output locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    /// English.
    En,
    /// Spanish.
    Es,
}

/// All locales with a catalog.
pub const SUPPORTED_LOCALES: &[Locale] = &[Locale::En, Locale::Es];

impl Locale {
    /// Parses a language tag such as `es`, `es-CL`, or `en_US`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        let primary = normalized.split(['-', '_']).next().unwrap_or("");
        match primary {
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            _ => None,
        }
    }

    /// Returns the compact tag stored in the process-wide selection.
    const fn tag(self) -> u8 {
        match self {
            Self::En => 0,
            Self::Es => 1,
        }
    }

    /// Inverse of [`Locale::tag`].
    const fn from_tag(tag: u8) -> Self {
        match tag {
            1 => Self::Es,
            _ => Self::En,
        }
    }
}

/// Process-wide locale selection.
static CURRENT_LOCALE: AtomicU8 = AtomicU8::new(0);

/// Selects the locale used by [`translate`].
pub fn set_locale(locale: Locale) {
    CURRENT_LOCALE.store(locale.tag(), Ordering::Relaxed);
}

/// Returns the locale used by [`translate`].
#[must_use]
pub fn current_locale() -> Locale {
    Locale::from_tag(CURRENT_LOCALE.load(Ordering::Relaxed))
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"path"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// English catalog entries.
const CATALOG_EN: &[(&str, &str)] = &[
    ("main.version", "score-ledger {version}"),
    ("i18n.lang.invalid_env", "Invalid value for {env}: {value}. Expected en or es."),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("config.load_failed", "Failed to load config: {error}"),
    ("config.validate.ok", "Config valid."),
    (
        "config.validate.summary",
        "Store: {store}. Retention: keep {retention} when {ceiling} records are reached. Access: \
         {access}.",
    ),
    ("serve.init_failed", "Failed to start server: {error}"),
    ("serve.failed", "Server failed: {error}"),
    ("serve.starting", "Starting score ledger on {bind} ({store} store)."),
    (
        "serve.warn.memory_store",
        "Note: the memory store keeps scores only until the process exits. Set [store] type = \
         \"sqlite\" to persist them.",
    ),
    (
        "serve.warn.non_loopback",
        "Note: {bind} is reachable from the network. Submissions are gated only by the {access} \
         origin policy.",
    ),
    ("db.init.ok", "Schema ready ({store} store, {count} records)."),
    ("db.init.failed", "Failed to initialize store: {error}"),
];

/// Spanish catalog entries.
const CATALOG_ES: &[(&str, &str)] = &[
    ("main.version", "score-ledger {version}"),
    ("i18n.lang.invalid_env", "Valor no válido para {env}: {value}. Se esperaba en o es."),
    ("output.stream.stdout", "salida estándar"),
    ("output.stream.stderr", "salida de errores"),
    ("output.stream.unknown", "salida"),
    ("output.write_failed", "No se pudo escribir en {stream}: {error}"),
    ("config.load_failed", "No se pudo cargar la configuración: {error}"),
    ("config.validate.ok", "Configuración válida."),
    (
        "config.validate.summary",
        "Almacén: {store}. Retención: conservar {retention} al llegar a {ceiling} registros. \
         Acceso: {access}.",
    ),
    ("serve.init_failed", "No se pudo iniciar el servidor: {error}"),
    ("serve.failed", "Falló el servidor: {error}"),
    ("serve.starting", "Iniciando score ledger en {bind} (almacén {store})."),
    (
        "serve.warn.memory_store",
        "Nota: el almacén en memoria conserva los puntajes solo hasta que termina el proceso. \
         Use [store] type = \"sqlite\" para persistirlos.",
    ),
    (
        "serve.warn.non_loopback",
        "Nota: {bind} es accesible desde la red. Los envíos solo se filtran con la política de \
         origen {access}.",
    ),
    ("db.init.ok", "Esquema listo (almacén {store}, {count} registros)."),
    ("db.init.failed", "No se pudo inicializar el almacén: {error}"),
];

/// Returns the static catalog for `locale`.
#[must_use]
pub fn catalog_for(locale: Locale) -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_EN_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static CATALOG_ES_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    match locale {
        Locale::En => CATALOG_EN_MAP.get_or_init(|| CATALOG_EN.iter().copied().collect()),
        Locale::Es => CATALOG_ES_MAP.get_or_init(|| CATALOG_ES.iter().copied().collect()),
    }
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` in the current locale while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog_for(current_locale())
        .get(key)
        .or_else(|| catalog_for(Locale::En).get(key))
        .copied()
        .unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a localized message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
///
/// # Returns
///
/// A localized [`String`] with placeholders substituted.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}
