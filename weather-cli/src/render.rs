use weather_core::{Coordinates, SessionView, WeatherSnapshot, text};

/// Degrees rounded to a whole number, never "-0".
fn whole(value: f64) -> i64 {
    value.round() as i64
}

pub fn weather_card(place: &Coordinates, weather: &WeatherSnapshot) -> String {
    let mut lines = vec![
        place.label(),
        weather.condition().description().to_string(),
        format!("{}°C", whole(weather.temperature)),
    ];

    if let Some(feels_like) = weather.feels_like {
        lines.push(format!("{} {}°C", text::LABEL_FEELS_LIKE, whole(feels_like)));
    }

    let mut details = format!("{} {} km/h", text::LABEL_WIND, weather.wind_speed);
    if let Some(humidity) = weather.humidity {
        details.push_str(&format!("   {} {}%", text::LABEL_HUMIDITY, humidity));
    }
    lines.push(details);

    lines.push(format!(
        "Updated {}",
        weather.fetched_at.with_timezone(&chrono::Local).format("%H:%M")
    ));

    lines.join("\n")
}

/// The notice to show under the search box, if any.
pub fn suggestion_notice(view: &SessionView) -> Option<&'static str> {
    if view.suggestions_loading {
        Some(text::LOADING_SUGGESTIONS)
    } else if view.show_no_results {
        Some(text::NO_SUGGESTIONS_FOUND)
    } else {
        None
    }
}
