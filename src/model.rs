//! Data model shared by the pipeline stages.
//!
//! Field names serialise in camelCase because that is the shape the
//! completion service is asked to produce (see [`crate::pipeline::schema`]).

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Gazette date used when the extraction does not report one.
pub const GAZETTE_DATE_FALLBACK: &str = "Fecha no encontrada";

/// Text of one page of the source document.
///
/// `page_number` is the 1-based position in the unfiltered page sequence,
/// so it stays valid after blank pages are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

/// Relevance of a norm to the water and sanitation sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relevance {
    Alta,
    Media,
    Baja,
    Ninguna,
}

impl Relevance {
    pub const ALL: [Relevance; 4] = [
        Relevance::Alta,
        Relevance::Media,
        Relevance::Baja,
        Relevance::Ninguna,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Relevance::Alta => "Alta",
            Relevance::Media => "Media",
            Relevance::Baja => "Baja",
            Relevance::Ninguna => "Ninguna",
        }
    }
}

impl fmt::Display for Relevance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A legal instrument published in the gazette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Norm {
    pub sector: String,
    pub norm_id: String,
    pub title: String,
    pub publication_date: String,
    pub summary: String,
    pub relevance_to_water_sector: Relevance,
    #[serde(deserialize_with = "deserialize_page_number")]
    pub page_number: u32,
}

/// A designation or conclusion of a public office holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub institution: String,
    pub person_name: String,
    pub position: String,
    pub summary: String,
}

/// Normalized output of the extraction stage.
///
/// All sequences are always present and `gazette_date` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub gazette_date: String,
    pub norms: Vec<Norm>,
    pub designated_appointments: Vec<Appointment>,
    pub concluded_appointments: Vec<Appointment>,
}

impl AnalysisResult {
    /// An empty result carrying the fallback date.
    pub fn empty() -> Self {
        Self {
            gazette_date: GAZETTE_DATE_FALLBACK.to_string(),
            norms: Vec::new(),
            designated_appointments: Vec::new(),
            concluded_appointments: Vec::new(),
        }
    }

    /// `true` when the extraction did not report a gazette date.
    pub fn has_fallback_date(&self) -> bool {
        self.gazette_date == GAZETTE_DATE_FALLBACK
    }
}

/// The schema declares `pageNumber` as NUMBER, so `3.0` is a legal answer.
fn deserialize_page_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_json::Number::deserialize(deserializer)?;
    let page = if let Some(n) = value.as_u64() {
        n
    } else if let Some(f) = value.as_f64() {
        if f.fract() != 0.0 || f < 0.0 {
            return Err(D::Error::custom(format!(
                "pageNumber must be a whole number, got {f}"
            )));
        }
        f as u64
    } else {
        return Err(D::Error::custom(format!(
            "pageNumber is not a usable number: {value}"
        )));
    };

    match u32::try_from(page) {
        Ok(0) => Err(D::Error::custom("pageNumber must be at least 1")),
        Ok(p) => Ok(p),
        Err(_) => Err(D::Error::custom(format!("pageNumber {page} is out of range"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn norm_json(page: serde_json::Value, relevance: &str) -> serde_json::Value {
        json!({
            "sector": "Vivienda",
            "normId": "R.M. N° 123-2024-VIVIENDA",
            "title": "Aprueban lineamientos",
            "publicationDate": "20/05/2024",
            "summary": "Resumen",
            "relevanceToWaterSector": relevance,
            "pageNumber": page,
        })
    }

    #[test]
    fn norm_deserializes_camel_case() {
        let norm: Norm = serde_json::from_value(norm_json(json!(4), "Alta")).unwrap();
        assert_eq!(norm.norm_id, "R.M. N° 123-2024-VIVIENDA");
        assert_eq!(norm.relevance_to_water_sector, Relevance::Alta);
        assert_eq!(norm.page_number, 4);
    }

    #[test]
    fn page_number_accepts_integral_float() {
        let norm: Norm = serde_json::from_value(norm_json(json!(3.0), "Baja")).unwrap();
        assert_eq!(norm.page_number, 3);
    }

    #[test]
    fn page_number_rejects_fraction_negative_and_zero() {
        for bad in [json!(2.5), json!(-1), json!(0)] {
            let res: Result<Norm, _> = serde_json::from_value(norm_json(bad.clone(), "Media"));
            assert!(res.is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn relevance_outside_enum_is_rejected() {
        let res: Result<Norm, _> = serde_json::from_value(norm_json(json!(1), "Muy alta"));
        assert!(res.is_err());
    }

    #[test]
    fn relevance_display_matches_wire_value() {
        for r in Relevance::ALL {
            let wire = serde_json::to_value(r).unwrap();
            assert_eq!(wire, json!(r.to_string()));
        }
    }

    #[test]
    fn empty_result_uses_fallback_date() {
        let r = AnalysisResult::empty();
        assert!(r.has_fallback_date());
        assert!(r.norms.is_empty());
    }
}
