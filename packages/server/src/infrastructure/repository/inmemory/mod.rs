//! In-memory repositories. State lives for the lifetime of the process only.

mod room;

pub use room::InMemoryRoomRepository;
