// Live-match feed: HTTP client and the merge policies that fold polled
// fixture data into the session.

pub mod client;
pub mod reconcile;
