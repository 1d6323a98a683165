//! # Events Module
//!
//! Progress reporting for front ends.
//!
//! The core emits events through a channel so a CLI, GUI or log viewer can
//! show what is happening without the core knowing which one is attached.
//! The batch match driver additionally takes plain `on_progress` /
//! `is_cancelled` callbacks; events are the richer, optional stream.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Match(MatchEvent::Progress(p)) = event {
//!             println!("{}/{} searched", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! matcher.run_with_events(&targets, on_progress, is_cancelled, &sender);
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
