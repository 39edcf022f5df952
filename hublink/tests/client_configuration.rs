//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Integration tests for client construction and configuration.

use hublink::client::{
    ClientOptions, DEFAULT_DIAGNOSTIC_SAMPLING_PERCENTAGE, DEFAULT_OPERATION_TIMEOUT_MS, Message,
};
use hublink::transport::{MemoryPipeline, PipelineOperation, TransportSettings, TransportType};
use hublink::{ConfigError, DeviceClient, HubError, TransportError};
use std::sync::Arc;
use std::time::Duration;

const DEVICE: &str = "HostName=acme.example.net;DeviceId=pump-3;SharedAccessKey=a2V5";
const MODULE: &str =
    "HostName=acme.example.net;DeviceId=pump-3;ModuleId=filter;SharedAccessKey=a2V5";

/// Test that a new client carries the documented defaults.
#[test]
fn test_default_configuration() {
    let client = DeviceClient::from_connection_string(DEVICE).unwrap();
    assert_eq!(client.operation_timeout_ms(), DEFAULT_OPERATION_TIMEOUT_MS);
    assert_eq!(client.operation_timeout_ms(), 240_000);
    assert_eq!(
        client.diagnostic_sampling_percentage(),
        DEFAULT_DIAGNOSTIC_SAMPLING_PERCENTAGE
    );
    assert_eq!(client.retry_policy().name(), "ExponentialBackoff");
}

/// Test that out-of-range sampling values are rejected and the previous
/// value kept.
#[test]
fn test_sampling_range_validation() {
    let client = DeviceClient::from_connection_string(DEVICE).unwrap();

    for value in [200, -100, 101, -1] {
        assert_eq!(
            client.set_diagnostic_sampling_percentage(value),
            Err(ConfigError::DiagnosticSamplingOutOfRange { value })
        );
        assert_eq!(client.diagnostic_sampling_percentage(), 0);
    }

    client.set_diagnostic_sampling_percentage(100).unwrap();
    assert_eq!(client.diagnostic_sampling_percentage(), 100);
    assert!(client.set_diagnostic_sampling_percentage(200).is_err());
    assert_eq!(client.diagnostic_sampling_percentage(), 100);
}

/// Test that a transport without diagnostic support rejects sampling.
#[test]
fn test_sampling_requires_transport_support() {
    let client =
        DeviceClient::from_connection_string_with_transport(DEVICE, TransportType::Http1).unwrap();

    let error = client.set_diagnostic_sampling_percentage(10).unwrap_err();
    assert_eq!(
        error,
        ConfigError::DiagnosticsNotSupported {
            transport: TransportType::Http1
        }
    );
    assert_eq!(
        error.to_string(),
        "Http1 protocol doesn't support E2E diagnostic."
    );
    assert_eq!(client.diagnostic_sampling_percentage(), 0);

    client.set_diagnostic_sampling_percentage(0).unwrap();
}

/// Test that one unsupported transport in a mixed set is enough to reject
/// sampling.
#[test]
fn test_sampling_with_mixed_transports() {
    let settings = [
        TransportSettings::mqtt(TransportType::MqttTcpOnly).unwrap(),
        TransportSettings::http1(),
        TransportSettings::amqp(TransportType::Amqp).unwrap(),
    ];
    let client = DeviceClient::from_connection_string_with_settings(DEVICE, &settings).unwrap();

    assert!(matches!(
        client.set_diagnostic_sampling_percentage(50),
        Err(ConfigError::DiagnosticsNotSupported {
            transport: TransportType::Http1
        })
    ));
    assert_eq!(client.transport_settings().len(), 3);
}

/// Test that transports with diagnostic support accept sampling.
#[test]
fn test_sampling_on_supported_transports() {
    let settings = [
        TransportSettings::amqp(TransportType::AmqpWebSocketOnly).unwrap(),
        TransportSettings::mqtt(TransportType::Mqtt).unwrap(),
    ];
    let client = DeviceClient::from_connection_string_with_settings(DEVICE, &settings).unwrap();

    client.set_diagnostic_sampling_percentage(25).unwrap();
    assert_eq!(client.diagnostic_sampling_percentage(), 25);
}

/// Test that an empty transport set is rejected.
#[test]
fn test_empty_transport_settings() {
    assert!(matches!(
        DeviceClient::from_connection_string_with_settings(DEVICE, &[]),
        Err(ConfigError::EmptyTransportSettings)
    ));
}

/// Test that transport settings reject a type from another family.
#[test]
fn test_mismatched_transport_settings() {
    assert!(matches!(
        TransportSettings::amqp(TransportType::MqttTcpOnly),
        Err(ConfigError::MismatchedTransport { .. })
    ));
}

/// Test that a device-level client refuses a module connection string.
#[test]
fn test_module_id_rejected() {
    assert_eq!(
        DeviceClient::from_connection_string(MODULE).unwrap_err(),
        ConfigError::ModuleIdNotAllowed
    );
    assert!(matches!(
        DeviceClient::builder().connection_string(MODULE).build(),
        Err(ConfigError::ModuleIdNotAllowed)
    ));
}

/// Test that malformed connection strings are reported.
#[test]
fn test_malformed_connection_strings() {
    assert!(matches!(
        DeviceClient::from_connection_string("DeviceId=pump-3;SharedAccessKey=a2V5"),
        Err(ConfigError::MissingField { field: "HostName" })
    ));
    assert!(matches!(
        DeviceClient::from_connection_string("HostName=acme.example.net;garbage"),
        Err(ConfigError::MalformedSegment { .. })
    ));
}

/// Test that connection string secrets never reach debug output.
#[test]
fn test_connection_string_is_redacted() {
    let client = DeviceClient::from_connection_string(DEVICE).unwrap();
    let rendered = format!("{client:?}");
    assert!(rendered.contains("pump-3"));
    assert!(!rendered.contains("a2V5"));
}

/// Test that operation timeouts are applied and that zero yields
/// non-cancelable tokens.
#[tokio::test]
async fn test_zero_timeout_is_non_cancelable() {
    let pipeline = Arc::new(MemoryPipeline::new());
    let client = DeviceClient::builder()
        .pipeline(pipeline.clone())
        .build()
        .unwrap();

    client.open().await.unwrap();
    client.set_operation_timeout_ms(0);
    assert_eq!(client.operation_timeout_ms(), 0);
    client.send_event(Message::new("t=21.5")).await.unwrap();
    assert!(client.receive().await.unwrap().is_none());

    let calls = pipeline.calls();
    assert_eq!(calls[0].operation, PipelineOperation::Open { use_timeout: true });
    assert!(calls[0].cancelable);
    assert_eq!(calls[1].operation, PipelineOperation::SendEvent);
    assert!(!calls[1].cancelable);
    assert_eq!(calls[2].operation, PipelineOperation::Receive);
    assert!(!calls[2].cancelable);
    assert_eq!(pipeline.sent_events()[0].body, b"t=21.5");

    client.set_operation_timeout_ms(1_000);
    client.receive().await.unwrap();
    assert!(pipeline.calls()[3].cancelable);
}

/// Test that a slow pipeline operation times out.
#[tokio::test(start_paused = true)]
async fn test_operation_timeout_elapses() {
    let pipeline = Arc::new(MemoryPipeline::new());
    let client = DeviceClient::builder()
        .operation_timeout_ms(1_000)
        .pipeline(pipeline.clone())
        .build()
        .unwrap();
    client.open().await.unwrap();

    pipeline.set_latency(Duration::from_secs(5));
    let result = client.send_event(Message::new("late")).await;

    assert!(matches!(
        result,
        Err(HubError::Transport(TransportError::Timeout { .. }))
    ));
    assert!(pipeline.sent_events().is_empty());
}

/// Test that close cancels operations in flight.
#[tokio::test(start_paused = true)]
async fn test_close_cancels_outstanding_operations() {
    let pipeline = Arc::new(MemoryPipeline::new());
    let client = DeviceClient::builder()
        .operation_timeout_ms(120_000)
        .pipeline(pipeline.clone())
        .build()
        .unwrap();
    client.open().await.unwrap();
    pipeline.set_latency(Duration::from_secs(60));

    let sender = client.clone();
    let pending = tokio::spawn(async move { sender.send_event(Message::new("x")).await });
    tokio::task::yield_now().await;

    pipeline.set_latency(Duration::ZERO);
    client.close().await.unwrap();

    let result = pending.await.unwrap();
    assert!(result.is_err());
}

/// Test that received messages come from the pipeline's inbound queue.
#[tokio::test]
async fn test_receive() {
    let pipeline = Arc::new(MemoryPipeline::new());
    let client = DeviceClient::builder()
        .pipeline(pipeline.clone())
        .build()
        .unwrap();
    client.open().await.unwrap();

    pipeline.push_inbound(Message::new("setpoint=19").with_property("unit", "C"));

    let message = client.receive().await.unwrap().unwrap();
    assert_eq!(message.body, b"setpoint=19");
    assert_eq!(message.properties["unit"], "C");
    assert!(client.receive().await.unwrap().is_none());
}

/// Test that product info is stored and returned unchanged.
#[test]
fn test_product_info() {
    let client = DeviceClient::builder()
        .product_info("pump-fw/2.1")
        .build()
        .unwrap();
    assert_eq!(client.product_info(), "pump-fw/2.1");

    client.set_product_info("pump-fw/2.2");
    assert_eq!(client.product_info(), "pump-fw/2.2");
}

/// Test that options can be loaded from JSON.
#[test]
fn test_options_from_json() {
    let options: ClientOptions =
        serde_json::from_str(r#"{"operation_timeout_ms": 5000, "product_info": "gw"}"#).unwrap();
    let client = DeviceClient::builder().options(options).build().unwrap();

    assert_eq!(client.operation_timeout_ms(), 5000);
    assert_eq!(client.product_info(), "gw");
    assert_eq!(client.diagnostic_sampling_percentage(), 0);
}
