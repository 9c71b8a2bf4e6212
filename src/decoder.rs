use log::debug;
use serde::Deserialize;
use serde_json::Value;

use crate::error::DecodeError;
use crate::model::{Entity, Place, Route};

/// What one feed message means for the display.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The server sent `null`: nothing to show yet.
    NoData,
    /// The server sent `[]`: it is looking, and nothing is overhead.
    EmptySet,
    /// The first aircraft of a non-empty list.
    Entity(Entity),
}

// ── Wire JSON structures ────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireAircraft {
    callsign: Option<String>,
    route: Option<WireRoute>,
    altitude: Option<f64>,
    velocity: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireRoute {
    from: Option<WireAirport>,
    to: Option<WireAirport>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireAirport {
    iata: Option<String>,
    name: Option<String>,
    country: Option<String>,
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, DecodeError> {
    value.ok_or(DecodeError::FieldMissing { field })
}

impl WireAirport {
    fn into_place(self, iata_field: &'static str) -> Result<Place, DecodeError> {
        Ok(Place {
            iata_code: required(self.iata, iata_field)?,
            name: self.name.unwrap_or_default(),
            country: self.country.unwrap_or_default(),
        })
    }
}

impl WireAircraft {
    fn into_entity(self) -> Result<Entity, DecodeError> {
        let callsign = required(self.callsign, "Callsign")?;
        let route = required(self.route, "Route")?;
        let origin = required(route.from, "Route.From")?.into_place("Route.From.Iata")?;
        let destination = required(route.to, "Route.To")?.into_place("Route.To.Iata")?;
        let altitude = required(self.altitude, "Altitude")?;
        let velocity = required(self.velocity, "Velocity")?;

        Ok(Entity {
            callsign,
            route: Route { origin, destination },
            // Whole metres; the feed reports fractional geometric altitude.
            altitude: altitude.trunc() as i64,
            velocity,
        })
    }
}

/// Decode one raw feed message.
pub fn decode(raw: &str) -> Result<Decoded, DecodeError> {
    let root: Value = serde_json::from_str(raw)?;

    let list = match root {
        Value::Null => return Ok(Decoded::NoData),
        Value::Array(list) => list,
        _ => return Err(DecodeError::UnexpectedShape("expected a list of aircraft")),
    };

    let count = list.len();
    let Some(first) = list.into_iter().next() else {
        return Ok(Decoded::EmptySet);
    };

    let wire: WireAircraft = serde_json::from_value(first)?;
    let entity = wire.into_entity()?;
    debug!("decoded {} of {} aircraft: {:?}", entity.callsign, count, entity);
    Ok(Decoded::Entity(entity))
}
