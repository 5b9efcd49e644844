//! Diagnostic transport layer logging every RPC request and response.

use alloy_json_rpc::{RequestPacket, ResponsePacket};
use alloy_transport::{TransportError, TransportFut};
use tower::{Layer, Service};

/// Layer that logs outbound requests and inbound responses of a chain's transport.
#[derive(Debug, Clone, Copy)]
pub struct RpcTraceLayer {
    chain_id: u64,
}

impl RpcTraceLayer {
    /// Creates a new [`RpcTraceLayer`] tagging log lines with `chain_id`.
    #[must_use]
    pub const fn new(chain_id: u64) -> Self {
        Self { chain_id }
    }
}

impl<S> Layer<S> for RpcTraceLayer {
    type Service = RpcTraceTransport<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RpcTraceTransport {
            inner,
            chain_id: self.chain_id,
        }
    }
}

/// Transport wrapper produced by [`RpcTraceLayer`].
///
/// Results and errors of the inner transport are passed through untouched.
#[derive(Debug, Clone)]
pub struct RpcTraceTransport<S> {
    inner: S,
    chain_id: u64,
}

impl<S> Service<RequestPacket> for RpcTraceTransport<S>
where
    S: Service<
            RequestPacket,
            Response = ResponsePacket,
            Future = TransportFut<'static>,
            Error = TransportError,
        > + Send
        + 'static
        + Clone,
{
    type Response = ResponsePacket;
    type Error = TransportError;
    type Future = TransportFut<'static>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: RequestPacket) -> Self::Future {
        let chain_id = self.chain_id;
        if let RequestPacket::Single(ref req) = request {
            tracing::info!(
                chain_id,
                method = req.method(),
                id = %req.id(),
                "-> {}",
                req.serialized().get()
            );
        } else {
            tracing::info!(chain_id, ?request, "-> batch");
        }

        let call = self.inner.call(request);
        Box::pin(async move {
            let result = call.await;
            match &result {
                Ok(response) => tracing::info!(chain_id, ?response, "<- response"),
                Err(error) => tracing::warn!(chain_id, %error, "<- transport error"),
            }
            result
        })
    }
}
