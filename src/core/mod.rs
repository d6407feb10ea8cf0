pub mod clock;
pub mod confirmation;
pub mod reader;
pub mod services;
pub mod session;

pub use clock::{Clock, FixedClock, SystemClock};
pub use confirmation::{DeleteConfirmationFlow, DeleteState};
pub use reader::{LedgerReader, RetryPolicy};
pub use session::{EntryForm, Session};
