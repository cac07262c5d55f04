//! Accept loop: one task per connection, HTTP/1 and HTTP/2 via `hyper-util`.

use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use log::{debug, info, warn};
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::api::{route_request, ServerState};

/// Serves connections from `listener` until `shutdown` resolves.
///
/// Connections already accepted keep running on their own tasks.
pub async fn serve(
    listener: TcpListener,
    state: Arc<ServerState>,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(connection) => connection,
                    Err(err) => {
                        warn!("event=http_accept module=server status=error error={err}");
                        continue;
                    }
                };
                debug!("event=http_accept module=server status=ok peer={peer}");

                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let service = service_fn(move |request| {
                        let state = Arc::clone(&state);
                        async move { Ok::<_, Infallible>(route_request(request, state).await) }
                    });
                    let builder = auto::Builder::new(TokioExecutor::new());
                    if let Err(err) = builder
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        warn!("event=http_connection module=server status=error error={err}");
                    }
                });
            }
            () = &mut shutdown => {
                info!("event=server_stop module=server status=ok");
                break;
            }
        }
    }
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("event=shutdown_signal module=server status=error error={err}");
        std::future::pending::<()>().await;
    }
}
