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

//! # Method Echo Example
//!
//! Drives a [`DeviceClient`] over the in-process [`MemoryPipeline`] and walks
//! through the client's main duties:
//!
//! - registering direct method handlers, named and default
//! - answering malformed requests and unknown methods
//! - following connection status through a drop, a successful recovery and
//!   a recovery that runs out of attempts
//!
//! ## Running This Example
//!
//! ```bash
//! RUST_LOG=hublink=debug cargo run --example method_echo
//! ```

use hublink::methods::{HandlerError, MethodRequest, MethodResponse, method_handler};
use hublink::retry::ExponentialBackoff;
use hublink::transport::memory::FAIL_ALWAYS;
use hublink::transport::{ConnectionType, MemoryPipeline};
use hublink::{ConnectionStatus, ConnectionStatusChangeReason, DeviceClient};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Method Echo Example ===\n");

    let pipeline = Arc::new(MemoryPipeline::named("demo"));
    let client = DeviceClient::builder()
        .connection_string("HostName=demo.example.net;DeviceId=sensor-7;SharedAccessKey=ZGVtbw==")
        .product_info("method-echo/0.1")
        .retry_policy(Arc::new(
            ExponentialBackoff::builder()
                .initial_delay(Duration::from_millis(20))
                .max_delay(Duration::from_millis(200))
                .max_attempts(Some(3))
                .build(),
        ))
        .pipeline(pipeline.clone())
        .build()?;

    client.set_connection_status_changes_handler(Some(Arc::new(
        |status: ConnectionStatus, reason: ConnectionStatusChangeReason| {
            println!("  status -> {status} ({reason})");
        },
    )));

    client.open().await?;
    pipeline.emit_opened(
        ConnectionType::MqttConnection,
        ConnectionStatus::Connected,
        ConnectionStatusChangeReason::ConnectionOk,
    );

    // Step 1: handlers
    println!("\n1. Registering handlers");
    client
        .set_method_handler(
            "echo",
            Some(method_handler(|request: MethodRequest, _| async move {
                Ok(MethodResponse::with_payload(request.body().to_vec(), 200))
            })),
            None,
        )
        .await?;
    client
        .set_method_handler(
            "uptime",
            Some(method_handler(|_, _| async {
                MethodResponse::from_json(&serde_json::json!({ "seconds": 3600 }), 200)
                    .map_err(HandlerError::from)
            })),
            None,
        )
        .await?;
    println!("  method delivery enabled: {}", pipeline.methods_enabled());

    // Step 2: calls from the hub
    println!("\n2. Delivering method calls");
    let calls = [
        ("echo", r#"{"greeting":"hello"}"#),
        ("uptime", ""),
        ("echo", "{not json"),
        ("reboot", "{}"),
    ];
    for (index, (name, body)) in calls.into_iter().enumerate() {
        let request_id = format!("req-{index}");
        pipeline
            .deliver_method(Some(MethodRequest::new(name, request_id, body)))
            .await;
    }
    for response in pipeline.responses() {
        println!(
            "  {} -> {} {}",
            response.request_id,
            response.status,
            String::from_utf8_lossy(&response.payload)
        );
    }

    // Step 3: connection drops and recovers
    println!("\n3. Dropping the connection");
    pipeline.announce_recovery(true);
    pipeline.fail_recovery(1);
    pipeline
        .emit_closed(
            ConnectionType::MqttConnection,
            ConnectionStatus::DisconnectedRetrying,
            ConnectionStatusChangeReason::NoNetwork,
        )
        .await;

    // Step 4: recovery runs out of attempts
    println!("\n4. Dropping the connection for good");
    pipeline.fail_recovery(FAIL_ALWAYS);
    pipeline
        .emit_closed(
            ConnectionType::MqttConnection,
            ConnectionStatus::DisconnectedRetrying,
            ConnectionStatusChangeReason::CommunicationError,
        )
        .await;

    // Step 5: shutdown
    println!("\n5. Closing");
    client.set_method_handler("echo", None, None).await?;
    client.set_method_handler("uptime", None, None).await?;
    println!("  method delivery enabled: {}", pipeline.methods_enabled());
    client.close().await?;

    println!("\n=== Example Complete ===");
    Ok(())
}
