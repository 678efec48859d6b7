//! Per-venue API credentials (spec.md §6.4 `{VENUE}_API_KEY/_API_SECRET`).
//! `arb-execution` takes these as explicit values rather than reading env
//! vars itself — `.env` loading is out of scope (spec.md §1), `arb-app`
//! owns that and constructs a [`CredentialStore`].

use arb_core::VenueId;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Clone, Debug, Default)]
pub struct CredentialStore {
    by_venue: HashMap<VenueId, Credentials>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, venue: VenueId, credentials: Credentials) {
        self.by_venue.insert(venue, credentials);
    }

    pub fn get(&self, venue: VenueId) -> Option<&Credentials> {
        self.by_venue.get(&venue)
    }
}
