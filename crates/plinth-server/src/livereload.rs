//! WebSocket-based live reload.

use plinth_pipeline::{Notification, Notifier, ReloadSink};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Path of the WebSocket endpoint.
pub const SOCKET_PATH: &str = "/__livereload";

/// Path the client script is served from.
pub const SCRIPT_PATH: &str = "/__livereload.js";

/// Messages sent to connected browsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveReloadMessage {
    /// Full page reload
    Reload,

    /// Connection established
    Connected,

    /// A task failed and recovered; shown in the browser console
    Error { title: String, message: String },
}

/// Broadcasts live reload messages to every connected browser.
#[derive(Debug, Clone)]
pub struct LiveReloadHub {
    sender: broadcast::Sender<LiveReloadMessage>,
}

impl LiveReloadHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send a message to all connected clients.
    pub fn send(&self, msg: LiveReloadMessage) {
        // No receivers is fine
        let _ = self.sender.send(msg);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveReloadMessage> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for LiveReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadSink for LiveReloadHub {
    fn reload(&self, task: &str) {
        tracing::debug!(
            "Reloading {} browser(s) after '{}'",
            self.subscriber_count(),
            task
        );
        self.send(LiveReloadMessage::Reload);
    }
}

impl Notifier for LiveReloadHub {
    fn notify(&self, notification: &Notification) {
        self.send(LiveReloadMessage::Error {
            title: notification.title.clone(),
            message: notification.message.clone(),
        });
    }
}

/// The tag injected into served pages.
pub fn script_tag() -> String {
    format!(r#"<script src="{}"></script>"#, SCRIPT_PATH)
}

/// Client-side live reload script.
///
/// Connects back to the host that served the page, reloads on `reload`
/// and logs `error` messages. After the socket drops it polls until the
/// server is back, then reloads.
pub fn client_script() -> String {
    format!(
        r#"
(function() {{
  'use strict';

  var url = (location.protocol === 'https:' ? 'wss://' : 'ws://') + location.host + '{socket}';
  var retries = 0;

  function connect() {{
    var ws = new WebSocket(url);

    ws.onopen = function() {{
      if (retries > 0) {{
        location.reload();
      }}
      retries = 0;
    }};

    ws.onmessage = function(event) {{
      var msg = JSON.parse(event.data);

      switch (msg.type) {{
        case 'reload':
          location.reload();
          break;
        case 'error':
          console.error('[plinth] ' + msg.title + '\n' + msg.message);
          break;
        case 'connected':
          console.log('[plinth] Live reload connected');
          break;
      }}
    }};

    ws.onclose = function() {{
      if (retries < 20) {{
        retries++;
        setTimeout(connect, 500 * retries);
      }}
    }};
  }}

  connect();
}})();
"#,
        socket = SOCKET_PATH
    )
}
