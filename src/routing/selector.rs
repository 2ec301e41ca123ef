//! Upstream profile selection.
//!
//! GitHub pages are fetched with redirects followed. Archive and release
//! downloads are not, so the redirect to the download host reaches the caller
//! and every other origin goes through the SOCKS relay.

use crate::routing::resolver::Target;
use crate::upstream::ProfileId;

/// The only origin whose page traffic follows redirects.
pub const GITHUB_ORIGIN: &str = "https://github.com";

/// Pick the outbound profile for a target.
pub fn select_profile(target: &Target) -> ProfileId {
    let url = target.url();
    if target.origin() == GITHUB_ORIGIN && !url.contains("archive") && !url.contains("releases") {
        ProfileId::RedirectFollow
    } else {
        ProfileId::Direct
    }
}
