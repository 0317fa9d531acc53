// MQTT subscriber - Feeds broker messages into the ingest service
use crate::application::ingest_service::{IngestService, Ingested};
use crate::infrastructure::backoff::ExponentialBackoff;
use crate::infrastructure::config::MqttSettings;
use rumqttc::{AsyncClient, ConnAck, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use std::time::Duration;
use tokio::sync::watch;

const REQUEST_CAPACITY: usize = 16;
const DISCONNECT_GRACE: Duration = Duration::from_secs(1);

pub struct MqttSubscriber {
    options: MqttOptions,
    ingest: IngestService,
    backoff: ExponentialBackoff,
    broker: String,
}

impl MqttSubscriber {
    pub fn new(settings: &MqttSettings, ingest: IngestService) -> Self {
        let mut options = MqttOptions::new(&settings.client_id, &settings.host, settings.port);
        options.set_keep_alive(Duration::from_secs(settings.keep_alive_secs));
        options.set_clean_session(true);

        Self {
            options,
            ingest,
            backoff: ExponentialBackoff::new(settings.backoff.initial(), settings.backoff.max()),
            broker: format!("{}:{}", settings.host, settings.port),
        }
    }

    /// Hand one inbound publish to the ingest service. Never fails: bad
    /// payloads are logged and dropped.
    pub fn dispatch(&self, topic: &str, payload: &[u8]) {
        match self.ingest.handle_message(topic, payload) {
            Ok(Ingested::Accepted(channel, reading)) => {
                tracing::debug!("Recorded {} = {} at {}", channel, reading.value, reading.timestamp)
            }
            Ok(Ingested::Unmatched) => {}
            Err(e) => tracing::warn!("Dropping MQTT message: {}", e),
        }
    }

    fn subscribe_all(&self, client: &AsyncClient) {
        for (channel, topic) in self.ingest.topics().iter() {
            match client.try_subscribe(topic, QoS::AtMostOnce) {
                Ok(()) => tracing::info!("Subscribed to {} ({})", topic, channel),
                Err(e) => tracing::error!("Failed to subscribe to {}: {}", topic, e),
            }
        }
    }

    fn on_connack(&mut self, client: &AsyncClient, ack: &ConnAck) {
        if ack.code == ConnectReturnCode::Success {
            tracing::info!("MQTT connected to {}", self.broker);
            self.backoff.reset();
            self.subscribe_all(client);
        } else {
            tracing::error!("MQTT connect to {} rejected: {:?}", self.broker, ack.code);
        }
    }

    /// Drive the connection until `shutdown` fires. Connection errors are
    /// retried with exponential backoff; the event loop reconnects on the
    /// next poll.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let (client, mut eventloop) = AsyncClient::new(self.options.clone(), REQUEST_CAPACITY);
        tracing::info!("MQTT connecting to {}...", self.broker);

        loop {
            let event = tokio::select! {
                event = eventloop.poll() => event,
                _ = shutdown.changed() => break,
            };

            match event {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => self.on_connack(&client, &ack),
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    self.dispatch(&publish.topic, &publish.payload)
                }
                Ok(_) => {}
                Err(e) => {
                    let delay = self.backoff.next_delay();
                    tracing::warn!(
                        "MQTT connection to {} failed (attempt {}): {}; retrying in {:?}",
                        self.broker,
                        self.backoff.attempts(),
                        e,
                        delay
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = shutdown.changed() => break,
                    }
                }
            }
        }

        self.disconnect(&client, &mut eventloop).await;
        tracing::info!("MQTT subscriber stopped");
        Ok(())
    }

    /// Queue a DISCONNECT and keep polling until it is on the wire, the
    /// connection fails, or the grace period runs out.
    async fn disconnect(&self, client: &AsyncClient, eventloop: &mut EventLoop) {
        if let Err(e) = client.try_disconnect() {
            tracing::debug!("MQTT disconnect request failed: {}", e);
            return;
        }

        let sent = tokio::time::timeout(DISCONNECT_GRACE, async {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => return true,
                    Ok(_) => {}
                    Err(_) => return false,
                }
            }
        })
        .await;

        match sent {
            Ok(true) => tracing::info!("MQTT disconnected from {}", self.broker),
            Ok(false) | Err(_) => tracing::debug!("MQTT connection to {} closed without DISCONNECT", self.broker),
        }
    }
}
