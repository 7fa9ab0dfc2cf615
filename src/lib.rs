#![forbid(unsafe_code)]
#![doc = r#"
webhook-relay

Receive a webhook JSON payload, reshape it into a fixed envelope, and forward it to a single configured destination, relaying the destination's outcome back to the caller.

Crate highlights
- Library: pure reshaping via `transform(Map<String, Value>) -> Envelope`.
- HTTP server (in `server`): `POST /api/webhook` and `GET /health`; anything else answers 404.
- Forwarding: one POST per webhook, 10 second ceiling, outcome folded into `Outcome`.

Modules
- `transform`: Envelope model and the field-reshaping rules.
- `forward`: Outbound call and outcome classification.
- `config`: CLI/env configuration validated at startup.
- `server`: Actix-web routes and handlers.
- `util`: Shared helpers (tracing, env file, app state, JSON errors).
"#]

pub mod config;
pub mod forward;
pub mod server;
pub mod transform;
pub mod util;

pub use crate::config::{Cli, ConfigError, RelayConfig, FORWARD_TIMEOUT};
pub use crate::forward::{Forwarder, Outcome};
pub use crate::transform::{
    is_truthy, transform, transform_value, Envelope, OutputRecord, TransformError,
};
pub use crate::util::AppState;
