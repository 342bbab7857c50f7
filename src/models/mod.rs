pub mod event;
pub mod rsvp;

pub use event::{Event, EventUpdate, NewEvent};
pub use rsvp::{Rsvp, RsvpStatus, RsvpStatusView};
