/// Threshold rules that turn a reading plus its window into plain-language advice
use crate::models::{AveragedWindow, Reading};

const HIGH_TEMPERATURE: f64 = 30.0;
const LOW_TEMPERATURE: f64 = 15.0;

const HIGH_HUMIDITY: f64 = 70.0;
const LOW_HUMIDITY: f64 = 30.0;

const POOR_AIR: f64 = 600.0;
const MODERATE_AIR: f64 = 400.0;
const NORMAL_AIR: f64 = 200.0;
const CONSISTENTLY_POOR_AVERAGE: f64 = 500.0;

const DECLINING_RATIO: f64 = 1.2;
const IMPROVING_RATIO: f64 = 0.8;

const CONSISTENTLY_POOR_CLAUSE: &str =
    "Air quality has been consistently poor. Consider an air purifier or identifying pollution sources. ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureLevel {
    High,
    Low,
    Comfortable,
}

impl TemperatureLevel {
    pub fn classify(temperature: f64) -> Self {
        if temperature > HIGH_TEMPERATURE {
            TemperatureLevel::High
        } else if temperature < LOW_TEMPERATURE {
            TemperatureLevel::Low
        } else {
            TemperatureLevel::Comfortable
        }
    }

    pub fn clause(self) -> &'static str {
        match self {
            TemperatureLevel::High => "High temperature detected. Consider cooling the room. ",
            TemperatureLevel::Low => "Low temperature detected. Consider heating the room. ",
            TemperatureLevel::Comfortable => "Temperature is in a comfortable range. ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumidityLevel {
    High,
    Low,
    Good,
}

impl HumidityLevel {
    pub fn classify(humidity: f64) -> Self {
        if humidity > HIGH_HUMIDITY {
            HumidityLevel::High
        } else if humidity < LOW_HUMIDITY {
            HumidityLevel::Low
        } else {
            HumidityLevel::Good
        }
    }

    pub fn clause(self) -> &'static str {
        match self {
            HumidityLevel::High => {
                "High humidity may promote mold growth. Consider using a dehumidifier. "
            }
            HumidityLevel::Low => {
                "Low humidity may cause dry skin and respiratory issues. Consider using a humidifier. "
            }
            HumidityLevel::Good => "Humidity is at a good level. ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirQualityLevel {
    Poor,
    Moderate,
    Normal,
    Good,
}

impl AirQualityLevel {
    /// Lower bounds are exclusive: 600 is moderate, 400 normal, 200 good.
    pub fn classify(aqi: f64) -> Self {
        if aqi > POOR_AIR {
            AirQualityLevel::Poor
        } else if aqi > MODERATE_AIR {
            AirQualityLevel::Moderate
        } else if aqi > NORMAL_AIR {
            AirQualityLevel::Normal
        } else {
            AirQualityLevel::Good
        }
    }

    pub fn clause(self) -> &'static str {
        match self {
            AirQualityLevel::Poor => "Air quality is poor. Ventilate the room immediately. ",
            AirQualityLevel::Moderate => {
                "Moderate air quality. Increasing ventilation is recommended. "
            }
            AirQualityLevel::Normal => {
                "Air quality is normal. Regular ventilation is still recommended. "
            }
            AirQualityLevel::Good => "Air quality is good. ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirQualityTrend {
    Declining,
    Improving,
    Steady,
}

impl AirQualityTrend {
    /// Both comparisons are strict, so a reading equal to the average is steady.
    pub fn classify(aqi: f64, avg_aqi: f64) -> Self {
        if aqi > avg_aqi * DECLINING_RATIO {
            AirQualityTrend::Declining
        } else if aqi < avg_aqi * IMPROVING_RATIO {
            AirQualityTrend::Improving
        } else {
            AirQualityTrend::Steady
        }
    }

    pub fn clause(self) -> Option<&'static str> {
        match self {
            AirQualityTrend::Declining => {
                Some("Air quality is declining compared to recent readings. ")
            }
            AirQualityTrend::Improving => {
                Some("Air quality is improving compared to recent readings. ")
            }
            AirQualityTrend::Steady => None,
        }
    }
}

/// Build the advice string for one reading against its recent window.
///
/// Clauses are appended in a fixed order: temperature, humidity, air
/// quality (plus the escalation clause when both the current reading and
/// the window average are poor), then the trend clause if any.
pub fn generate_advice(reading: &Reading, window: &AveragedWindow) -> String {
    let mut advice = String::new();

    advice.push_str(TemperatureLevel::classify(reading.temperature).clause());
    advice.push_str(HumidityLevel::classify(reading.humidity).clause());

    let air_quality = AirQualityLevel::classify(reading.air_quality_index);
    advice.push_str(air_quality.clause());
    if air_quality == AirQualityLevel::Poor && window.avg_air_quality > CONSISTENTLY_POOR_AVERAGE {
        advice.push_str(CONSISTENTLY_POOR_CLAUSE);
    }

    let trend = AirQualityTrend::classify(reading.air_quality_index, window.avg_air_quality);
    if let Some(clause) = trend.clause() {
        advice.push_str(clause);
    }

    advice
}
