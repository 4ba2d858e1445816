pub mod checkin;
pub mod codes;
pub mod pricing;
pub mod registration;
pub mod reporting;
pub mod tiers;

pub use checkin::{CheckInError, CheckInOutcome, CheckInService};
pub use codes::{CodeIssueError, IssuedCode, TicketCodeIssuer};
pub use pricing::{PriceQuote, PricingError, PricingResolver};
pub use registration::{RegistrationCoordinator, RegistrationError, RegistrationRequest, RegistrationSummary};
pub use reporting::{EventStats, Leaderboard, ReportingViews, VolunteerSummary};
pub use tiers::{TierAdmin, TierError};
