//! User-facing strings shared by every presentation of the session.

pub const APP_TITLE: &str = "WeatherChecker";
pub const APP_SUBTITLE: &str = "Instant global weather forecast";
pub const SEARCH_INSTRUCTION: &str = "Search for a city to see the weather";

pub const SEARCH_PLACEHOLDER: &str = "London, Tokyo, New York...";
pub const LOADING_SUGGESTIONS: &str = "Loading suggestions...";
pub const NO_SUGGESTIONS_FOUND: &str =
    "No suggestions found. Type the full city name and press Enter or click the Search button.";

pub const ERROR_GENERIC: &str = "An error occurred.";
pub const ERROR_CITY_WITH_NUMBERS: &str = "City names cannot contain numbers.";
pub const ERROR_CITY_NOT_FOUND: &str = "City not found. Please check the spelling and try again.";
pub const ERROR_NETWORK: &str = "Unable to connect. Please try again.";
pub const ERROR_SERVICE_UNAVAILABLE: &str = "Cannot reach weather service. Please try again.";

pub const LABEL_WIND: &str = "Wind";
pub const LABEL_HUMIDITY: &str = "Humidity";
pub const LABEL_FEELS_LIKE: &str = "Feels like";
