use std::time::Duration;

use log::{debug, info, warn};

use crate::decoder::{decode, Decoded};
use crate::display::{report_error, DisplaySink, SKY_EMPTY};
use crate::error::StreamError;
use crate::input::InputSource;
use crate::model::{Entity, Place};
use crate::stream::StreamConnection;

/// Which screen the button selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Route, altitude, speed and callsign of the current aircraft.
    Detail,
    /// Name and country of the airport the aircraft departed from.
    Context,
}

/// The three Detail lines for `entity`.
pub fn detail_lines(entity: &Entity) -> Vec<String> {
    vec![
        format!(
            "{} to {}",
            entity.route.origin.iata_code, entity.route.destination.iata_code
        ),
        format!("{}m {} km/h", entity.altitude, entity.velocity_kmh()),
        entity.callsign.clone(),
    ]
}

/// Free text for the Context view; the sink wraps it.
pub fn context_text(place: &Place) -> String {
    format!("{} ({})", place.name, place.country)
}

/// Per-connection screen state.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    mode: ViewMode,
    last_entity: Option<Entity>,
    forced_redraw: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            mode: ViewMode::Detail,
            last_entity: None,
            forced_redraw: false,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn last_entity(&self) -> Option<&Entity> {
        self.last_entity.as_ref()
    }

    pub fn forced_redraw(&self) -> bool {
        self.forced_redraw
    }

    /// Reconcile the view with the button.
    ///
    /// A pending forced redraw makes the current mode draw once even when the
    /// button has not moved.
    pub fn apply_button<S: DisplaySink + ?Sized>(&mut self, pressed: bool, sink: &mut S) {
        if pressed && (self.mode != ViewMode::Context || self.forced_redraw) {
            self.mode = ViewMode::Context;
            self.forced_redraw = false;
            if let Some(entity) = &self.last_entity {
                debug!("view: context for {}", entity.callsign);
                sink.show_text(&context_text(&entity.route.origin));
            }
        } else if !pressed && (self.mode != ViewMode::Detail || self.forced_redraw) {
            self.mode = ViewMode::Detail;
            self.forced_redraw = false;
            if let Some(entity) = &self.last_entity {
                debug!("view: detail for {}", entity.callsign);
                sink.show_lines(&detail_lines(entity));
            }
        }
    }

    /// Fold one raw feed message into the state.
    ///
    /// A new aircraft is not drawn here; it arms the forced redraw for the next
    /// [`ViewState::apply_button`].
    pub fn apply_message<S: DisplaySink + ?Sized>(&mut self, raw: &str, sink: &mut S) {
        match decode(raw) {
            Ok(Decoded::NoData) => debug!("view: no data"),
            Ok(Decoded::EmptySet) => {
                info!("view: nothing overhead");
                sink.show_text(SKY_EMPTY);
            }
            Ok(Decoded::Entity(entity)) => {
                info!("view: aircraft {}", entity.callsign);
                self.last_entity = Some(entity);
                self.forced_redraw = true;
            }
            Err(e) => {
                warn!("view: bad message: {}", e);
                report_error(sink, &e);
            }
        }
    }

    /// One scheduler tick: button first, then at most one message.
    ///
    /// Only connection-level failures are returned; a receive timeout and
    /// undecodable messages are handled here.
    pub fn tick<I, C, S>(
        &mut self,
        input: &mut I,
        conn: &mut C,
        sink: &mut S,
        poll_timeout: Duration,
    ) -> Result<(), StreamError>
    where
        I: InputSource + ?Sized,
        C: StreamConnection + ?Sized,
        S: DisplaySink + ?Sized,
    {
        let pressed = input.is_pressed();
        self.apply_button(pressed, sink);

        match conn.receive(poll_timeout) {
            Ok(raw) => {
                self.apply_message(&raw, sink);
                Ok(())
            }
            Err(StreamError::Timeout) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
