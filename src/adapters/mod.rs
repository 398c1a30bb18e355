//! Adapters: concrete implementations at the edge of the hexagon.
//!
//! | Adapter    | Implements / provides | Connects to             |
//! |------------|-----------------------|-------------------------|
//! | `auth`     | bearer-token gate     | `Authorization` header  |
//! | `http`     | Gateway routes        | axum / tokio listener   |
//! | `log_sink` | EventSink             | `log` facade            |

pub mod auth;
pub mod http;
pub mod log_sink;
