/// An airport at one end of a route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Place {
    pub iata_code: String,
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Route {
    pub origin: Place,
    pub destination: Place,
}

/// One aircraft as reported by the feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entity {
    pub callsign: String,
    pub route: Route,
    /// Metres.
    pub altitude: i64,
    /// Metres per second.
    pub velocity: f64,
}

impl Entity {
    /// Ground speed in whole km/h, rounded down.
    pub fn velocity_kmh(&self) -> i64 {
        velocity_kmh(self.velocity)
    }
}

/// m/s -> km/h, floored rather than rounded.
pub fn velocity_kmh(mps: f64) -> i64 {
    (mps * 3600.0 / 1000.0).floor() as i64
}
