//! Test helpers: an in-process axum stand-in for the LMS backend.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::client::LmsClient;
use crate::config::ClientConfig;
use crate::notify::NotificationSlot;

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_backend(app: Router) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock backend");
  let addr = listener.local_addr().expect("mock backend addr");
  tokio::spawn(async move {
    let _ = axum::serve(listener, app).await;
  });
  format!("http://{}", addr)
}

pub fn config_for(base_url: String) -> ClientConfig {
  let mut cfg = ClientConfig::resolve(None, |_| None);
  cfg.api_base_url = base_url;
  cfg
}

pub fn client_for(base_url: String) -> LmsClient {
  LmsClient::new(&config_for(base_url)).expect("client")
}

pub fn slot() -> (NotificationSlot, Arc<NotificationSlot>) {
  let slot = NotificationSlot::new();
  (slot.clone(), Arc::new(slot))
}
