use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Status string echoed on every accepted submission.
pub const INSERTED_STATUS: &str = "Values inserted into the sensors collection.";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SensorReadingDto {
    pub id: Uuid,
    /// Degrees Celsius
    pub temp: f64,
    /// Total dissolved solids, ppm
    pub tds: f64,
    pub ph: f64,
    /// Oxidation-reduction potential, mV. `null` when not submitted.
    pub orp: Option<f64>,
    /// Turbidity, NTU. `null` when not submitted.
    pub tur: Option<f64>,
    /// Server-assigned epoch milliseconds.
    pub date: i64,
}

/// Response for `GET /data`. Readings are ordered by `date DESC`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReadingsResponse {
    pub data: Vec<SensorReadingDto>,
}

/// Response for `POST /data`: the stored reading plus a status line.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub temp: f64,
    pub tds: f64,
    pub ph: f64,
    pub orp: Option<f64>,
    pub tur: Option<f64>,
    pub date: i64,
    pub status: String,
}

impl From<crate::db::models::SensorReading> for SensorReadingDto {
    fn from(r: crate::db::models::SensorReading) -> Self {
        Self {
            id: r.id,
            temp: r.temp,
            tds: r.tds,
            ph: r.ph,
            orp: r.orp,
            tur: r.tur,
            date: r.date,
        }
    }
}

impl From<crate::db::models::SensorReading> for SubmissionResponse {
    fn from(r: crate::db::models::SensorReading) -> Self {
        Self {
            id: r.id,
            temp: r.temp,
            tds: r.tds,
            ph: r.ph,
            orp: r.orp,
            tur: r.tur,
            date: r.date,
            status: INSERTED_STATUS.to_owned(),
        }
    }
}
