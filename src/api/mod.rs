//! HTTP API.
//!
//! | Method | Path                  | Handler                              |
//! |--------|-----------------------|--------------------------------------|
//! | any    | `/webhooks/payments`  | provider notifications               |
//! | GET    | `/tickets/:document`  | ticket lookup with reconciliation    |
//! | POST   | `/purchases`          | checkout                             |
//! | GET    | `/quick-pick`         | random combinations                  |
//! | GET    | `/registrations`      | every registration, newest first     |
//! | GET    | `/summary`            | revenue by status and tickets sold   |
//! | GET    | `/settings`           | current raffle settings              |
//! | GET    | `/health`             | liveness                             |

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
