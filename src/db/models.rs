use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A validated measurement batch, before the store has stamped it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    /// Degrees Celsius
    pub temp: f64,
    /// Total dissolved solids, ppm
    pub tds: f64,
    pub ph: f64,
    /// Oxidation-reduction potential, mV
    pub orp: Option<f64>,
    /// Turbidity, NTU
    pub tur: Option<f64>,
}

/// One row of the `sensor_readings` table as seen by the API.
///
/// `date` is epoch milliseconds assigned by the server at append time.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct SensorReading {
    pub id: Uuid,
    pub temp: f64,
    pub tds: f64,
    pub ph: f64,
    pub orp: Option<f64>,
    pub tur: Option<f64>,
    pub date: i64,
}

impl SensorReading {
    pub fn stamp(reading: NewReading, date: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            temp: reading.temp,
            tds: reading.tds,
            ph: reading.ph,
            orp: reading.orp,
            tur: reading.tur,
            date,
        }
    }
}
