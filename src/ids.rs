//! Unique identifier generation
//!
//! Identifiers are fixed-length alphanumeric strings. Every identifier issued by a
//! generator is remembered, so a draw that repeats an earlier one is rejected and
//! redrawn. The issued set is handed out sorted, which makes an identifier's position
//! (its item index) stable for the whole run.

use std::collections::BTreeSet;

use log::debug;
use rand::distr::{Alphanumeric, SampleString};

/// Default identifier length (62^12 possible values)
pub const DEFAULT_ID_LENGTH: usize = 12;

type Draw = Box<dyn FnMut() -> String + Send>;

/// Issues identifiers that are unique within the generator's lifetime
pub struct IdentifierGenerator {
    draw: Draw,
    issued: BTreeSet<String>,
    collisions: u64,
}

impl IdentifierGenerator {
    /// Generator drawing random alphanumeric identifiers of `length` characters
    pub fn random(length: usize) -> Self {
        Self::with_draw(move || Alphanumeric.sample_string(&mut rand::rng(), length))
    }

    /// Generator using a custom draw function
    ///
    /// The function must eventually produce values not yet issued, otherwise
    /// [`generate`](Self::generate) never returns.
    pub fn with_draw<F>(draw: F) -> Self
    where
        F: FnMut() -> String + Send + 'static,
    {
        Self {
            draw: Box::new(draw),
            issued: BTreeSet::new(),
            collisions: 0,
        }
    }

    /// Issue `count` new identifiers, sorted ascending
    ///
    /// New identifiers are checked against everything this generator has issued,
    /// including earlier calls.
    pub fn generate(&mut self, count: usize) -> Identifiers {
        let mut fresh = BTreeSet::new();
        while fresh.len() < count {
            let candidate = (self.draw)();
            if self.issued.contains(&candidate) || fresh.contains(&candidate) {
                self.collisions += 1;
                debug!("Identifier collision on {}, redrawing", candidate);
                continue;
            }
            fresh.insert(candidate);
        }

        self.issued.extend(fresh.iter().cloned());
        Identifiers(fresh.into_iter().collect())
    }

    /// Number of rejected draws so far
    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    /// Number of identifiers issued so far
    pub fn issued(&self) -> usize {
        self.issued.len()
    }
}

/// An immutable, sorted sequence of unique identifiers
///
/// Item indices are 1-based: item `i` carries identifier `i - 1` of the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifiers(Vec<String>);

impl Identifiers {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Identifier for a 1-based item index, `None` outside `1..=len`
    pub fn for_item(&self, index: u64) -> Option<&str> {
        let position = usize::try_from(index.checked_sub(1)?).ok()?;
        self.0.get(position).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}
