mod chat;
mod dashboard;
mod habit;
mod todo;

pub use chat::ChatCommand;
pub use dashboard::DashboardCommand;
pub use habit::HabitCommand;
pub use todo::TodoCommand;

use productivity_core::{Resource, SyncClient, SyncOutcome, Transport};

/// Print the user-facing part of an outcome. Failures were already logged by
/// the sync client.
fn report(outcome: &SyncOutcome, done: &str) {
    match outcome {
        SyncOutcome::Committed => println!("{done}"),
        SyncOutcome::Notice(message) => println!("{message}"),
        SyncOutcome::Failed(_) | SyncOutcome::Stale => {}
    }
}

/// A sync client for `R` with the collection fetched.
fn loaded<R: Resource, T: Transport>(base_url: &str, transport: &T) -> SyncClient<R> {
    let mut sync = SyncClient::new(base_url);
    sync.load(transport);
    sync
}
