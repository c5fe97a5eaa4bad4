//! TaskDeck client
//!
//! Keeps a login session alive against a TaskDeck server and exposes the
//! task and admin endpoints as typed calls.
//!
//! # Example
//!
//! ```no_run
//! use taskdeck_client::{TaskDeckClient, TaskFilter};
//!
//! # async fn example() -> Result<(), taskdeck_client::ClientError> {
//! let client = TaskDeckClient::connect("http://localhost:8080")?;
//! client.session().initialize().await;
//!
//! if !client.session().is_authenticated().await {
//!     client.session().login("lin@example.com", "hunter22").await?;
//! }
//!
//! let page = client.list_tasks(&TaskFilter::default()).await?;
//! println!("{} tasks", page.total);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod error;
pub mod session;
pub mod types;

pub use api::TaskDeckClient;
pub use error::ClientError;
pub use session::{SessionController, SessionState};
pub use types::{NewTask, TaskFilter, TaskStatus, UpdateTask};
