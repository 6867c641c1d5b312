use serde::{Deserialize, Deserializer, Serialize};

use crate::convert::celsius_to_kelvin;

/// Body accepted by the gateway: `{"cep": "01001000"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CepRequest {
    pub cep: String,
}

/// Locality lookup record as returned by ViaCEP.
///
/// An unknown CEP comes back as `{"erro": true}` with every other field
/// absent, so all fields are optional here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalityLookup {
    #[serde(default)]
    pub cep: Option<String>,
    #[serde(default, rename = "localidade")]
    pub locality: Option<String>,
    #[serde(default, rename = "erro", deserialize_with = "flag")]
    pub not_found: bool,
}

impl LocalityLookup {
    /// Resolved city name, or `None` when the partner reported no match.
    pub fn city(&self) -> Option<&str> {
        if self.not_found {
            return None;
        }
        self.locality.as_deref().filter(|name| !name.trim().is_empty())
    }
}

// ViaCEP has sent the flag both as a JSON bool and as the string "true".
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => s.eq_ignore_ascii_case("true"),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaLocation {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaCurrent {
    pub temp_c: f64,
    pub temp_f: f64,
}

/// Current conditions as returned by WeatherAPI.com `current.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherReading {
    #[serde(default)]
    pub location: Option<WaLocation>,
    pub current: WaCurrent,
}

/// Final payload served by both services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub temp_c: f64,
    #[serde(rename = "temp_F")]
    pub temp_f: f64,
    #[serde(rename = "temp_K")]
    pub temp_k: f64,
    pub city: String,
}

impl WeatherResponse {
    pub fn new(city: impl Into<String>, reading: &WeatherReading) -> Self {
        Self {
            temp_c: reading.current.temp_c,
            temp_f: reading.current.temp_f,
            temp_k: celsius_to_kelvin(reading.current.temp_c),
            city: city.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locality_found() {
        let parsed: LocalityLookup = serde_json::from_str(
            r#"{"cep":"01001-000","localidade":"São Paulo","uf":"SP","erro":false}"#,
        )
        .expect("valid payload");

        assert_eq!(parsed.city(), Some("São Paulo"));
        assert_eq!(parsed.cep.as_deref(), Some("01001-000"));
    }

    #[test]
    fn locality_not_found_bool_and_string() {
        let as_bool: LocalityLookup = serde_json::from_str(r#"{"erro":true}"#).unwrap();
        assert!(as_bool.not_found);
        assert_eq!(as_bool.city(), None);

        let as_text: LocalityLookup = serde_json::from_str(r#"{"erro":"true"}"#).unwrap();
        assert!(as_text.not_found);
        assert_eq!(as_text.city(), None);
    }

    #[test]
    fn locality_without_name_has_no_city() {
        let parsed: LocalityLookup = serde_json::from_str(r#"{"cep":"01001000"}"#).unwrap();
        assert!(!parsed.not_found);
        assert_eq!(parsed.city(), None);
    }

    #[test]
    fn weather_reading_without_location() {
        let parsed: WeatherReading =
            serde_json::from_str(r#"{"current":{"temp_c":20.0,"temp_f":68.0}}"#).unwrap();
        assert!(parsed.location.is_none());
        assert_eq!(parsed.current.temp_c, 20.0);
    }

    #[test]
    fn weather_reading_requires_current() {
        let err = serde_json::from_str::<WeatherReading>(r#"{"location":{"name":"X"}}"#);
        assert!(err.is_err());
    }

    #[test]
    fn response_uses_wire_field_names() {
        let reading: WeatherReading =
            serde_json::from_str(r#"{"current":{"temp_c":20.0,"temp_f":68.0}}"#).unwrap();
        let response = WeatherResponse::new("São Paulo", &reading);

        let value = serde_json::to_value(&response).unwrap();
        let obj = value.as_object().expect("object");
        assert_eq!(obj.len(), 4);
        assert_eq!(obj["temp_c"], 20.0);
        assert_eq!(obj["temp_F"], 68.0);
        assert!((obj["temp_K"].as_f64().unwrap() - 293.15).abs() < 1e-9);
        assert_eq!(obj["city"], "São Paulo");
    }
}
