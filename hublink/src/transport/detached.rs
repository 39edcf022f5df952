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

use crate::methods::OutboundMethodResponse;
use crate::transport::{
    ConnectionType, Message, OperationToken, SourceId, TransportError, TransportPipeline,
};
use async_trait::async_trait;

/// Placeholder layer used until a real pipeline is installed.
///
/// Every operation that needs the hub fails with
/// [`TransportError::NotConnected`]. Enabling and disabling method delivery
/// succeed so handlers can be registered before a pipeline is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedPipeline;

#[async_trait]
impl TransportPipeline for DetachedPipeline {
    async fn open(&self, _use_timeout: bool, _token: OperationToken) -> Result<(), TransportError> {
        Err(TransportError::NotConnected)
    }

    async fn close(&self, _token: OperationToken) -> Result<(), TransportError> {
        Ok(())
    }

    async fn send_event(&self, _message: Message, _token: OperationToken) -> Result<(), TransportError> {
        Err(TransportError::NotConnected)
    }

    async fn receive(&self, _token: OperationToken) -> Result<Option<Message>, TransportError> {
        Err(TransportError::NotConnected)
    }

    async fn enable_methods(&self, _token: OperationToken) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disable_methods(&self, _token: OperationToken) -> Result<(), TransportError> {
        Ok(())
    }

    async fn send_method_response(
        &self,
        _response: OutboundMethodResponse,
        _token: OperationToken,
    ) -> Result<(), TransportError> {
        Err(TransportError::NotConnected)
    }

    async fn recover_connections(
        &self,
        _source: SourceId,
        _connection_type: ConnectionType,
        _token: OperationToken,
    ) -> Result<(), TransportError> {
        Err(TransportError::NotConnected)
    }

    fn name(&self) -> &str {
        "detached"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_detached_rejects_io() {
        let pipeline = DetachedPipeline;
        assert!(matches!(
            pipeline.open(true, OperationToken::none()).await,
            Err(TransportError::NotConnected)
        ));
        assert!(pipeline.enable_methods(OperationToken::none()).await.is_ok());
        assert!(pipeline.close(OperationToken::none()).await.is_ok());
    }
}
