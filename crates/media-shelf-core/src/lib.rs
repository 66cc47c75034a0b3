pub mod clock;
pub mod context;
pub mod error;
pub mod favorites;
pub mod inflight;
pub mod outcome;
pub mod recently_viewed;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{HydrateReport, ShelfContext, StoreSettings};
pub use error::StoreError;
pub use favorites::FavoritesStore;
pub use inflight::InFlight;
pub use outcome::{ClearOutcome, LoadOutcome, ToggleOutcome, VisitOutcome};
pub use recently_viewed::RecentlyViewedStore;
pub use session::{SessionProvider, SharedSession};
