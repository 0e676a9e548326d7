pub mod replay_loader;

pub use replay_loader::{load_all_replays, load_replay, ReplayEvent, ReplayFixture};
