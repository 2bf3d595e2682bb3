//! Well-known slot keys and broadcast topics.
//!
//! The store accepts any key; these are the ones the weather client's
//! components agree on.

/// Currently selected city name.
pub const CITY: &str = "city";

/// UI language code (e.g. "en", "it").
pub const LANGUAGE: &str = "language";

/// Unit system, "metric" or "imperial".
pub const UNIT: &str = "unit";

/// Theme mode, "light" or "dark".
pub const THEME_MODE: &str = "theme_mode";

/// Whether the city comes from device location.
pub const USING_LOCATION: &str = "using_location";

/// Last known `{ "lat": .., "lon": .. }` pair. Absent until a position
/// is known.
pub const COORDINATES: &str = "coordinates";

/// Broadcast topic fired after the language is switched.
pub const LANGUAGE_EVENT: &str = "language_event";

/// Broadcast topic fired after the theme is toggled.
pub const THEME_EVENT: &str = "theme_event";

/// Broadcast topic fired after the unit system is switched.
pub const UNIT_EVENT: &str = "unit_event";

/// All well-known slot keys.
pub const SLOTS: [&str; 6] = [CITY, LANGUAGE, UNIT, THEME_MODE, USING_LOCATION, COORDINATES];
