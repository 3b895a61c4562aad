//! # Bluemarz Assignment
//!
//! The orchestrator that binds an agent to a session and drives backend runs
//! until a breakpoint: a final message, or tool calls that only an actor
//! outside this process can complete.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut assignment = Assignment::from_spec(spec).await?;
//! let outcome = assignment.run_until_breakpoint().await?;
//! match outcome.exit {
//!     RunExit::Completed => println!("{:?}", outcome.messages()),
//!     RunExit::AwaitingExternalTool | RunExit::SyncToolFallback => {
//!         // complete outcome.pending_tool_calls() elsewhere, then
//!         // submit the results and call run_until_breakpoint again
//!     }
//! }
//! ```

pub mod assignment;
pub mod builder;
mod dispatch;
pub mod run_loop;
pub mod state;

pub use assignment::Assignment;
pub use state::AssignmentState;
