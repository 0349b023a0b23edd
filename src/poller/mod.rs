mod history_poller;
#[cfg(test)]
mod tests;

pub use history_poller::{HistoryPoller, PollEvent, PollerHandle};
