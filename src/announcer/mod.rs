pub mod announcer;

pub use announcer::Announcement;
pub use announcer::AnnouncementSequencer;
