//! Country/state/city lists for the business step.
//!
//! Each resource carries a request generation. Issuing a new request bumps
//! it, and a response arriving with an older ticket is dropped so a slow
//! stale response never overwrites fresher data.

use crate::backend::{Location, OnboardingBackend};
use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationKind {
    Countries,
    States,
    Cities,
}

impl LocationKind {
    fn index(self) -> usize {
        match self {
            LocationKind::Countries => 0,
            LocationKind::States => 1,
            LocationKind::Cities => 2,
        }
    }
}

/// Handle for one outstanding list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    kind: LocationKind,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct LocationDirectory {
    countries: Vec<Location>,
    states: Vec<Location>,
    cities: Vec<Location>,
    generations: [u64; 3],
}

impl LocationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn countries(&self) -> &[Location] {
        &self.countries
    }

    pub fn states(&self) -> &[Location] {
        &self.states
    }

    pub fn cities(&self) -> &[Location] {
        &self.cities
    }

    /// Starts a request for `kind`, superseding any still outstanding.
    pub fn begin(&mut self, kind: LocationKind) -> Ticket {
        let slot = &mut self.generations[kind.index()];
        *slot += 1;
        Ticket {
            kind,
            generation: *slot,
        }
    }

    /// Stores a response. Returns `false` when the ticket was superseded.
    pub fn complete(&mut self, ticket: Ticket, items: Vec<Location>) -> bool {
        if self.generations[ticket.kind.index()] != ticket.generation {
            tracing::debug!(kind = ?ticket.kind, "discarding stale location response");
            return false;
        }
        *self.slot_mut(ticket.kind) = items;
        true
    }

    fn slot_mut(&mut self, kind: LocationKind) -> &mut Vec<Location> {
        match kind {
            LocationKind::Countries => &mut self.countries,
            LocationKind::States => &mut self.states,
            LocationKind::Cities => &mut self.cities,
        }
    }

    /// Drops dependent lists and invalidates their outstanding requests.
    fn invalidate(&mut self, kind: LocationKind) {
        self.generations[kind.index()] += 1;
        self.slot_mut(kind).clear();
    }

    pub fn load_countries(&mut self, backend: &dyn OnboardingBackend) -> Result<&[Location]> {
        let ticket = self.begin(LocationKind::Countries);
        let items = backend.list_countries()?;
        self.complete(ticket, items);
        Ok(&self.countries)
    }

    /// Country changed: states and cities for the old country no longer apply.
    pub fn select_country(
        &mut self,
        backend: &dyn OnboardingBackend,
        country_id: &str,
    ) -> Result<&[Location]> {
        self.invalidate(LocationKind::Cities);
        let ticket = self.begin(LocationKind::States);
        self.states.clear();
        let items = backend.list_states(country_id)?;
        self.complete(ticket, items);
        Ok(&self.states)
    }

    pub fn select_state(
        &mut self,
        backend: &dyn OnboardingBackend,
        state_id: &str,
    ) -> Result<&[Location]> {
        let ticket = self.begin(LocationKind::Cities);
        self.cities.clear();
        let items = backend.list_cities(state_id)?;
        self.complete(ticket, items);
        Ok(&self.cities)
    }

    pub fn find_country(&self, code_or_id: &str) -> Option<&Location> {
        find(&self.countries, code_or_id)
    }

    pub fn find_state(&self, code_or_id: &str) -> Option<&Location> {
        find(&self.states, code_or_id)
    }
}

fn find<'a>(items: &'a [Location], code_or_id: &str) -> Option<&'a Location> {
    items.iter().find(|location| {
        location.id == code_or_id
            || location
                .code
                .as_deref()
                .map_or(false, |code| code.eq_ignore_ascii_case(code_or_id))
    })
}
