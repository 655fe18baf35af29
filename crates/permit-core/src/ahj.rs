//! # Jurisdiction Keys & AHJ Resolution
//!
//! [`AhjKey`] is the addressing primitive for the whole stack: a
//! hierarchical `country/state/locality` identifier naming the Authority
//! Having Jurisdiction for a location, e.g. `us/md/gaithersburg`. Exactly
//! one key exists per incorporated city; all unincorporated areas of a
//! county share the county's key.
//!
//! [`resolve_ahj`] maps a free-text city/state pair onto a key. Coverage
//! is currently Maryland-only: incorporated cities with their own
//! permitting office resolve to a city key, everything else falls through
//! to Montgomery County.
//!
//! ## Validation
//!
//! [`AhjKey`] is validated at construction time (three non-empty
//! lowercase segments) and deserialization runs the same check, so a key
//! held anywhere in the system is structurally sound.

use serde::{Deserialize, Serialize};

use crate::error::{ResolveError, ValidationError};

// -- Validating Deserialize for AhjKey ----------------------------------------

impl<'de> Deserialize<'de> for AhjKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// A jurisdiction key: `country/state/locality`.
///
/// Immutable once resolved. Used as the lookup key into the jurisdiction
/// pack loader and stored verbatim on locations and permit cases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AhjKey(String);

impl AhjKey {
    /// Create a jurisdiction key, validating its shape.
    ///
    /// A key must consist of exactly three `/`-separated segments, each
    /// non-empty and limited to lowercase ASCII letters, digits, and
    /// underscores.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAhjKey`] when the shape check
    /// fails.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        let segments: Vec<&str> = trimmed.split('/').collect();
        if segments.len() != 3 {
            return Err(ValidationError::InvalidAhjKey(value));
        }
        for segment in &segments {
            if segment.is_empty()
                || !segment
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            {
                return Err(ValidationError::InvalidAhjKey(value));
            }
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Access the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `/`-separated path segments: country, state, locality.
    pub fn segments(&self) -> (&str, &str, &str) {
        let mut parts = self.0.splitn(3, '/');
        // Shape is guaranteed by construction.
        let country = parts.next().unwrap_or_default();
        let state = parts.next().unwrap_or_default();
        let locality = parts.next().unwrap_or_default();
        (country, state, locality)
    }

    /// Construct from a compile-time key known to be well-formed.
    fn from_static(key: &'static str) -> Self {
        debug_assert!(Self::new(key).is_ok(), "static key must be valid: {key}");
        Self(key.to_string())
    }
}

impl std::fmt::Display for AhjKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AhjKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// -- Resolution ---------------------------------------------------------------

/// Incorporated Maryland cities that run their own permitting office.
/// Any city absent from this table is served at the county level.
const MD_CITY_OVERRIDES: &[(&str, &str)] = &[
    ("gaithersburg", "us/md/gaithersburg"),
    ("rockville", "us/md/rockville"),
];

/// County-level key covering all unincorporated Maryland areas we model.
const MD_COUNTY_FALLBACK: &str = "us/md/montgomery_county";

/// Resolve a free-text city/state pair to the governing [`AhjKey`].
///
/// State matching accepts the abbreviation or the full name,
/// case-insensitive and whitespace-trimmed. Within a supported state the
/// city is matched the same way against the incorporated-city override
/// table; any unmatched city resolves to the county key, never an error —
/// county coverage is total for a supported state.
///
/// Note the catch-all also absorbs misspelled city names ("Gaithersberg"
/// resolves to the county, not the city). City names are not checked
/// against a known-city list before falling back.
///
/// # Errors
///
/// Returns [`ResolveError::UnsupportedJurisdiction`] when the state is
/// not covered.
pub fn resolve_ahj(city: &str, state: &str) -> Result<AhjKey, ResolveError> {
    let state_norm = state.trim().to_lowercase();
    if state_norm != "md" && state_norm != "maryland" {
        return Err(ResolveError::UnsupportedJurisdiction {
            city: city.to_string(),
            state: state.to_string(),
        });
    }

    let city_norm = city.trim().to_lowercase();
    for (name, key) in MD_CITY_OVERRIDES {
        if city_norm == *name {
            return Ok(AhjKey::from_static(key));
        }
    }

    Ok(AhjKey::from_static(MD_COUNTY_FALLBACK))
}

// -- Address validation -------------------------------------------------------

/// A postal address as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInput {
    /// Street address line.
    pub address1: String,
    /// City name.
    pub city: String,
    /// State name or abbreviation.
    pub state: String,
    /// ZIP code, 5-digit or ZIP+4.
    pub postal: String,
}

/// Check that an address has the minimum shape needed for AHJ resolution:
/// non-blank street, city, and state, and a 5-digit or ZIP+4 postal code.
pub fn validate_address(address: &AddressInput) -> bool {
    static ZIP: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let zip = ZIP.get_or_init(|| regex::Regex::new(r"^\d{5}(-\d{4})?$").expect("zip pattern"));

    !address.address1.trim().is_empty()
        && !address.city.trim().is_empty()
        && !address.state.trim().is_empty()
        && zip.is_match(address.postal.trim())
}
