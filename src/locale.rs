//! Locale-aware name comparison for LC_COLLATE
//!
//! Names are compared with the system's `strcoll` when the environment selects
//! a real locale, and byte-wise under the C/POSIX locale.

use std::cmp::Ordering;
use std::env;
use std::ffi::CString;
use std::sync::OnceLock;

/// Global locale configuration
static LOCALE_CONFIG: OnceLock<LocaleConfig> = OnceLock::new();

/// Locale configuration for string comparison
#[derive(Debug, Clone)]
pub struct LocaleConfig {
    /// Whether locale-aware comparison is enabled
    pub enabled: bool,
    /// The current locale name
    pub locale_name: String,
}

impl LocaleConfig {
    /// Describe a locale name without touching process state
    pub fn from_name(locale: &str) -> Self {
        let enabled = !locale.is_empty() && locale != "C" && locale != "POSIX";

        Self {
            enabled,
            locale_name: locale.to_string(),
        }
    }

    /// Initialize from LC_COLLATE / LC_ALL / LANG and select it for strcoll
    pub fn init() -> Self {
        let locale = env::var("LC_COLLATE")
            .or_else(|_| env::var("LC_ALL"))
            .or_else(|_| env::var("LANG"))
            .unwrap_or_else(|_| "C".to_string());

        let config = Self::from_name(&locale);

        if config.enabled {
            if let Ok(locale_cstr) = CString::new(locale) {
                // SAFETY: the pointer is a valid NUL-terminated string for the duration
                // of the call; this runs once, before any strcoll comparison.
                unsafe {
                    libc::setlocale(libc::LC_COLLATE, locale_cstr.as_ptr());
                }
            }
        }

        tracing::debug!(
            locale = %config.locale_name,
            enabled = config.enabled,
            "collation locale selected"
        );

        config
    }

    /// Get the global locale configuration
    pub fn get() -> &'static LocaleConfig {
        LOCALE_CONFIG.get_or_init(Self::init)
    }

    /// Compare with `strcoll` when this locale is enabled, byte-wise otherwise
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        if self.enabled {
            strcoll_compare(a, b)
        } else {
            a.cmp(b)
        }
    }
}

/// Locale-aware string comparison using strcoll
pub fn strcoll_compare(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let (a_cstr, b_cstr) = match (CString::new(a), CString::new(b)) {
        (Ok(a_cstr), Ok(b_cstr)) => (a_cstr, b_cstr),
        // interior NUL bytes
        _ => return a.cmp(b),
    };

    // SAFETY: both pointers are valid NUL-terminated strings owned by this frame.
    let result = unsafe { libc::strcoll(a_cstr.as_ptr(), b_cstr.as_ptr()) };
    result.cmp(&0)
}

/// Compare two name parts, locale aware when a locale is configured
pub fn compare_names(a: &str, b: &str) -> Ordering {
    LocaleConfig::get().compare(a, b)
}
