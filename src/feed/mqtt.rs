//! MQTT source backed by rumqttc's blocking client.
//!
//! The client's event loop only makes progress while the connection is
//! polled, so `poll` both drives keep-alives and reconnects and yields
//! incoming publishes.
//!
//! A reconnect (TCP connect, CONNECT, CONNACK) runs inside a single poll of
//! the event loop and is abandoned if that poll times out. After a dropped
//! session the handshake is therefore awaited with the full connect timeout
//! rather than the short listener poll interval.

use std::time::{Duration, Instant};

use rumqttc::{
    Client, ConnectReturnCode, Connection, Event, MqttOptions, Outgoing, Packet, QoS,
    RecvTimeoutError,
};
use tracing::{debug, info};

use super::{FeedSource, SourceEvent};
use crate::config::{BrokerAddress, ListenerConfig};
use crate::error::FeedError;

/// Capacity of the client's request queue (subscribe/disconnect only).
const REQUEST_CAPACITY: usize = 10;

/// How long `close` waits for the DISCONNECT to go out.
const CLOSE_GRACE: Duration = Duration::from_millis(250);

/// How a CONNECT/CONNACK exchange ended.
enum Handshake {
    Accepted,
    Refused(ConnectReturnCode),
    TimedOut,
    Failed(String),
}

/// Subscription to the board topic on an MQTT broker.
pub struct MqttSource {
    client: Client,
    connection: Connection,
    topic: String,
    address: BrokerAddress,
    connect_timeout: Duration,
    reconnecting: bool,
}

impl MqttSource {
    /// Prepare a client for `address`. No I/O happens until [`connect`].
    ///
    /// [`connect`]: FeedSource::connect
    pub fn new(address: &BrokerAddress, config: &ListenerConfig) -> Self {
        let client_id = format!("chessboard-live-{}", std::process::id());
        let mut options = MqttOptions::new(client_id, address.host(), address.port());
        options.set_keep_alive(config.keep_alive);
        options.set_clean_session(true);

        let (client, connection) = Client::new(options, REQUEST_CAPACITY);
        Self {
            client,
            connection,
            topic: config.topic.clone(),
            address: address.clone(),
            connect_timeout: config.connect_timeout,
            reconnecting: false,
        }
    }

    /// Queue a subscription. Clean sessions lose it on every reconnect.
    fn subscribe(&mut self) -> Result<(), FeedError> {
        self.client
            .try_subscribe(self.topic.as_str(), QoS::AtMostOnce)
            .map_err(|e| FeedError::Subscribe(e.to_string()))?;
        debug!(topic = %self.topic, "subscription queued");
        Ok(())
    }

    /// Drive the event loop until the broker answers CONNECT or the connect
    /// timeout runs out.
    fn handshake(&mut self) -> Handshake {
        let deadline = Instant::now() + self.connect_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Handshake::TimedOut;
            }
            match self.connection.recv_timeout(remaining) {
                Ok(Ok(Event::Incoming(Packet::ConnAck(ack)))) => {
                    return if ack.code == ConnectReturnCode::Success {
                        Handshake::Accepted
                    } else {
                        Handshake::Refused(ack.code)
                    };
                }
                Ok(Ok(_)) | Err(RecvTimeoutError::Timeout) => {}
                Ok(Err(e)) => return Handshake::Failed(e.to_string()),
                Err(RecvTimeoutError::Disconnected) => {
                    return Handshake::Failed("client event loop closed".to_string())
                }
            }
        }
    }

    fn describe(&self, handshake: Handshake) -> String {
        match handshake {
            Handshake::Accepted => String::new(),
            Handshake::Refused(code) => format!("broker refused connection: {code:?}"),
            Handshake::TimedOut => format!(
                "no CONNACK from {} within {:?}",
                self.address, self.connect_timeout
            ),
            Handshake::Failed(reason) => reason,
        }
    }

    fn reconnect(&mut self) -> Result<Option<SourceEvent>, FeedError> {
        match self.handshake() {
            Handshake::Accepted => {
                self.reconnecting = false;
                info!(broker = %self.address, "reconnected");
                self.subscribe()?;
                Ok(Some(SourceEvent::Connected))
            }
            failed => Err(FeedError::Disconnected(self.describe(failed))),
        }
    }
}

impl FeedSource for MqttSource {
    fn connect(&mut self) -> Result<(), FeedError> {
        match self.handshake() {
            Handshake::Accepted => {
                info!(broker = %self.address, "connected");
                self.subscribe()
            }
            failed => Err(FeedError::Connect(self.describe(failed))),
        }
    }

    fn poll(&mut self, timeout: Duration) -> Result<Option<SourceEvent>, FeedError> {
        if self.reconnecting {
            return self.reconnect();
        }
        match self.connection.recv_timeout(timeout) {
            Ok(Ok(Event::Incoming(Packet::Publish(publish)))) => {
                Ok(Some(SourceEvent::Payload(publish.payload.to_vec())))
            }
            Ok(Ok(Event::Incoming(Packet::ConnAck(_)))) => {
                info!(broker = %self.address, "reconnected");
                self.subscribe()?;
                Ok(Some(SourceEvent::Connected))
            }
            Ok(Ok(_)) | Err(RecvTimeoutError::Timeout) => Ok(None),
            Ok(Err(e)) => {
                self.reconnecting = true;
                Err(FeedError::Disconnected(e.to_string()))
            }
            Err(RecvTimeoutError::Disconnected) => Err(FeedError::Disconnected(
                "client event loop closed".to_string(),
            )),
        }
    }

    fn close(&mut self) {
        let _ = self.client.try_unsubscribe(self.topic.as_str());
        if self.client.try_disconnect().is_err() {
            return;
        }
        let deadline = Instant::now() + CLOSE_GRACE;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!("disconnect not confirmed before grace period ended");
                return;
            }
            match self.connection.recv_timeout(remaining) {
                Ok(Ok(Event::Outgoing(Outgoing::Disconnect))) => {
                    info!(broker = %self.address, "disconnected");
                    return;
                }
                Ok(Ok(_)) => {}
                Ok(Err(_)) | Err(_) => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Exercised against a minimal MQTT 3.1.1 broker on a loopback socket.

    use super::*;
    use crate::config::BOARD_TOPIC;
    use crossbeam_channel::{unbounded, Receiver, Sender};
    use std::io::{self, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    const CONNACK_OK: [u8; 4] = [0x20, 0x02, 0x00, 0x00];
    const CONNACK_NOT_AUTHORIZED: [u8; 4] = [0x20, 0x02, 0x00, 0x05];

    /// What the broker saw, in order.
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Seen {
        Connect(usize),
        Subscribe(String),
        Unsubscribe,
        Disconnect,
    }

    /// Read one control packet: first header byte and body.
    fn read_packet(stream: &mut TcpStream) -> io::Result<(u8, Vec<u8>)> {
        let mut header = [0u8; 1];
        stream.read_exact(&mut header)?;
        let mut len = 0usize;
        let mut shift = 0;
        loop {
            let mut byte = [0u8; 1];
            stream.read_exact(&mut byte)?;
            len |= usize::from(byte[0] & 0x7F) << shift;
            if byte[0] & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        let mut body = vec![0u8; len];
        stream.read_exact(&mut body)?;
        Ok((header[0], body))
    }

    /// Answer SUBSCRIBE/UNSUBSCRIBE/PINGREQ and report them until the
    /// client goes away or `stop_after_subscribe` is hit.
    fn serve(stream: &mut TcpStream, seen: &Sender<Seen>, stop_after_subscribe: bool) {
        while let Ok((header, body)) = read_packet(stream) {
            match header >> 4 {
                8 => {
                    let topic_len = usize::from(u16::from_be_bytes([body[2], body[3]]));
                    let topic = String::from_utf8_lossy(&body[4..4 + topic_len]).into_owned();
                    let _ = seen.send(Seen::Subscribe(topic));
                    let _ = stream.write_all(&[0x90, 0x03, body[0], body[1], 0x00]);
                    if stop_after_subscribe {
                        return;
                    }
                }
                10 => {
                    let _ = seen.send(Seen::Unsubscribe);
                    let _ = stream.write_all(&[0xB0, 0x02, body[0], body[1]]);
                }
                12 => {
                    let _ = stream.write_all(&[0xD0, 0x00]);
                }
                14 => {
                    let _ = seen.send(Seen::Disconnect);
                    return;
                }
                _ => {}
            }
        }
    }

    /// Spawn a broker that hands every accepted connection, numbered from
    /// zero, to `session` after reading its CONNECT.
    fn spawn_broker<F>(session: F) -> (BrokerAddress, Receiver<Seen>)
    where
        F: Fn(usize, &mut TcpStream, &Sender<Seen>) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = unbounded();
        thread::spawn(move || {
            for (n, stream) in listener.incoming().enumerate() {
                let Ok(mut stream) = stream else { return };
                match read_packet(&mut stream) {
                    Ok((0x10, _)) => {
                        let _ = tx.send(Seen::Connect(n));
                    }
                    _ => continue,
                }
                session(n, &mut stream, &tx);
            }
        });
        (BrokerAddress::new("127.0.0.1", port), rx)
    }

    fn config(connect_timeout: Duration) -> ListenerConfig {
        ListenerConfig {
            connect_timeout,
            ..ListenerConfig::default()
        }
    }

    fn publish(topic: &str, payload: &[u8]) -> Vec<u8> {
        let topic_len = u16::try_from(topic.len()).unwrap();
        let remaining = u8::try_from(2 + topic.len() + payload.len()).unwrap();
        let mut packet = vec![0x30, remaining];
        packet.extend_from_slice(&topic_len.to_be_bytes());
        packet.extend_from_slice(topic.as_bytes());
        packet.extend_from_slice(payload);
        packet
    }

    /// Poll until `wanted` matches or `within` runs out.
    fn poll_until(
        source: &mut MqttSource,
        within: Duration,
        mut wanted: impl FnMut(&Result<Option<SourceEvent>, FeedError>) -> bool,
    ) -> Option<Result<Option<SourceEvent>, FeedError>> {
        let deadline = Instant::now() + within;
        while Instant::now() < deadline {
            let result = source.poll(Duration::from_millis(100));
            if wanted(&result) {
                return Some(result);
            }
        }
        None
    }

    #[test]
    fn test_connect_subscribes_and_forwards_publish() {
        let (address, seen) = spawn_broker(|_, stream, seen| {
            stream.write_all(&CONNACK_OK).unwrap();
            serve(stream, seen, true);
            stream
                .write_all(&publish(BOARD_TOPIC, br#"{"timestamp":3}"#))
                .unwrap();
            serve(stream, seen, false);
        });
        let mut source = MqttSource::new(&address, &config(Duration::from_secs(2)));

        source.connect().unwrap();
        let event = poll_until(&mut source, Duration::from_secs(2), |r| {
            matches!(r, Ok(Some(SourceEvent::Payload(_))))
        });

        assert_eq!(
            event,
            Some(Ok(Some(SourceEvent::Payload(br#"{"timestamp":3}"#.to_vec()))))
        );
        assert_eq!(seen.recv_timeout(Duration::from_secs(1)), Ok(Seen::Connect(0)));
        assert_eq!(
            seen.recv_timeout(Duration::from_secs(1)),
            Ok(Seen::Subscribe(BOARD_TOPIC.to_string()))
        );
    }

    #[test]
    fn test_refused_connack_is_connect_error() {
        let (address, _seen) = spawn_broker(|_, stream, _| {
            let _ = stream.write_all(&CONNACK_NOT_AUTHORIZED);
        });
        let mut source = MqttSource::new(&address, &config(Duration::from_secs(2)));

        assert!(matches!(source.connect(), Err(FeedError::Connect(_))));
    }

    #[test]
    fn test_silent_broker_times_out_connect() {
        let (address, _seen) = spawn_broker(|_, _, _| thread::sleep(Duration::from_secs(2)));
        let mut source = MqttSource::new(&address, &config(Duration::from_millis(300)));

        let started = Instant::now();
        let err = source.connect().unwrap_err();
        assert!(matches!(&err, FeedError::Connect(msg) if msg.contains("no CONNACK")));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_slow_reconnect_completes_and_resubscribes() {
        // First session drops right after subscribing; later CONNECTs are
        // answered after 300ms, longer than one poll interval.
        let (address, seen) = spawn_broker(|n, stream, seen| {
            if n > 0 {
                thread::sleep(Duration::from_millis(300));
            }
            stream.write_all(&CONNACK_OK).unwrap();
            serve(stream, seen, n == 0);
        });
        let mut source = MqttSource::new(&address, &config(Duration::from_secs(2)));
        source.connect().unwrap();

        let mut errors = 0;
        let event = poll_until(&mut source, Duration::from_secs(4), |r| {
            if r.is_err() {
                errors += 1;
            }
            matches!(r, Ok(Some(SourceEvent::Connected)))
        });

        assert_eq!(event, Some(Ok(Some(SourceEvent::Connected))));
        assert_eq!(errors, 1);
        let connects = seen
            .try_iter()
            .filter(|s| matches!(s, Seen::Connect(_)))
            .count();
        assert_eq!(connects, 2);
    }

    #[test]
    fn test_unanswered_reconnect_counts_as_failure() {
        let (address, _seen) = spawn_broker(|n, stream, seen| {
            if n > 0 {
                thread::sleep(Duration::from_secs(2));
                return;
            }
            stream.write_all(&CONNACK_OK).unwrap();
            serve(stream, seen, true);
        });
        let mut source = MqttSource::new(&address, &config(Duration::from_millis(300)));
        source.connect().unwrap();

        let dropped = poll_until(&mut source, Duration::from_secs(2), Result::is_err);
        assert!(matches!(dropped, Some(Err(FeedError::Disconnected(_)))));

        let started = Instant::now();
        let retry = source.poll(Duration::from_millis(100));
        assert!(
            matches!(&retry, Err(FeedError::Disconnected(msg)) if msg.contains("no CONNACK")),
            "{retry:?}"
        );
        assert!(started.elapsed() >= Duration::from_millis(250));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_close_unsubscribes_and_disconnects() {
        let (address, seen) = spawn_broker(|_, stream, seen| {
            stream.write_all(&CONNACK_OK).unwrap();
            serve(stream, seen, false);
        });
        let mut source = MqttSource::new(&address, &config(Duration::from_secs(2)));
        source.connect().unwrap();
        poll_until(&mut source, Duration::from_millis(500), |_| false);

        let started = Instant::now();
        source.close();
        assert!(started.elapsed() < Duration::from_secs(1));

        let events: Vec<Seen> = (0..4)
            .map_while(|_| seen.recv_timeout(Duration::from_secs(1)).ok())
            .collect();
        assert_eq!(
            events,
            vec![
                Seen::Connect(0),
                Seen::Subscribe(BOARD_TOPIC.to_string()),
                Seen::Unsubscribe,
                Seen::Disconnect,
            ]
        );
    }
}
