use std::sync::mpsc::{channel, Sender};
use std::time::Duration;

use adsb_display::stream::{Connector, EventQueue, StreamConnection, StreamEvent};
use adsb_display::StreamError;
use esp_idf_svc::io::EspIOError;
use esp_idf_svc::ws::client::{
    EspWebSocketClient, EspWebSocketClientConfig, WebSocketEvent, WebSocketEventType,
};
use log::info;

const BUFFER_SIZE: usize = 8192;

/// Runs on the ESP-IDF client task; only forwards into the channel.
fn forward(tx: &Sender<StreamEvent>, event: Result<WebSocketEvent<'_>, EspIOError>) {
    let ev = match event {
        Ok(ev) => match ev.event_type {
            WebSocketEventType::Connected => StreamEvent::Connected,
            WebSocketEventType::Text(text) => StreamEvent::Text(text.to_string()),
            WebSocketEventType::Binary(bytes) => {
                StreamEvent::Text(String::from_utf8_lossy(bytes).into_owned())
            }
            WebSocketEventType::Disconnected => StreamEvent::Closed("disconnected".into()),
            WebSocketEventType::Close(reason) => {
                StreamEvent::Closed(format!("closed by server ({:?})", reason))
            }
            WebSocketEventType::Closed => StreamEvent::Closed("closed".into()),
            _ => return,
        },
        Err(e) => StreamEvent::Closed(e.to_string()),
    };
    let _ = tx.send(ev);
}

pub struct WsConnection {
    client: Option<EspWebSocketClient<'static>>,
    events: EventQueue,
}

impl StreamConnection for WsConnection {
    fn receive(&mut self, timeout: Duration) -> Result<String, StreamError> {
        if self.client.is_none() {
            return Err(StreamError::ConnectionLost("closed".into()));
        }
        self.events.next(timeout)
    }

    fn close(&mut self) {
        if self.client.take().is_some() {
            info!("ws: closed");
        }
    }
}

pub struct WsConnector {
    pub connect_timeout: Duration,
}

impl Connector for WsConnector {
    type Conn = WsConnection;

    fn connect(&mut self, url: &str) -> Result<WsConnection, StreamError> {
        let (tx, rx) = channel();
        let config = EspWebSocketClientConfig {
            buffer_size: BUFFER_SIZE,
            ..Default::default()
        };

        let client = EspWebSocketClient::new(url, &config, self.connect_timeout, move |_id, event| {
            forward(&tx, event)
        })
        .map_err(|e| StreamError::Connect(e.to_string()))?;

        let mut events = EventQueue::new(rx);
        events.wait_connected(self.connect_timeout)?;
        info!("ws: connected to {}", url);
        Ok(WsConnection {
            client: Some(client),
            events,
        })
    }
}
