//! Upstream collaborators: the spreadsheet values API and the OAuth2 token endpoint.

pub mod oauth2;
pub mod sheets;
