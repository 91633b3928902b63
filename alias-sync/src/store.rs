// alias-sync/src/store.rs
//! Canonical alias collection and pagination state.
//!
//! [`AliasStore`] is plain data with synchronous methods; the engine owns it
//! behind its mutex and performs the remote calls around it.

use alias_client::{Alias, AliasId, AliasPage, Cursor};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Next page after the current cursor
    Page,
    /// Page one again, from the start cursor
    Refresh,
}

/// Handed out by [`AliasStore::begin_fetch`]; identifies the fetch when it completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub kind: FetchKind,
    pub cursor: Cursor,
}

#[derive(Debug)]
struct FetchTicket {
    seq: u64,
    kind: FetchKind,
    /// Ids mutated locally after the request was issued
    touched: HashSet<AliasId>,
}

/// Counts of what a fetched page did to the collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageMerge {
    pub added: usize,
    pub replaced: usize,
    /// Entries ignored because a local mutation is newer than the page
    pub skipped: usize,
}

#[derive(Debug)]
pub struct AliasStore {
    aliases: Vec<Alias>,
    cursor: Cursor,
    has_more: bool,
    loaded: bool,
    next_seq: u64,
    fetch: Option<FetchTicket>,
}

impl Default for AliasStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AliasStore {
    pub fn new() -> Self {
        Self {
            aliases: Vec::new(),
            cursor: Cursor::start(),
            has_more: true,
            loaded: false,
            next_seq: 0,
            fetch: None,
        }
    }

    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn get(&self, id: AliasId) -> Option<&Alias> {
        self.aliases.iter().find(|a| a.id == id)
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// True once any page has been applied
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch.is_some()
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(
            self.fetch,
            Some(FetchTicket {
                kind: FetchKind::Refresh,
                ..
            })
        )
    }

    /// Reserve the single fetch slot.
    ///
    /// Returns `None` when a fetch is already in flight, or when a page fetch
    /// is asked for after the last page.
    pub fn begin_fetch(&mut self, kind: FetchKind) -> Option<FetchRequest> {
        if self.fetch.is_some() {
            return None;
        }
        let cursor = match kind {
            FetchKind::Page if !self.has_more => return None,
            FetchKind::Page => self.cursor.clone(),
            FetchKind::Refresh => Cursor::start(),
        };

        self.next_seq += 1;
        let seq = self.next_seq;
        self.fetch = Some(FetchTicket {
            seq,
            kind,
            touched: HashSet::new(),
        });
        Some(FetchRequest { seq, kind, cursor })
    }

    /// Apply the page returned for `seq`. Returns `None` if that fetch is no longer current.
    pub fn finish_fetch(&mut self, seq: u64, page: AliasPage) -> Option<PageMerge> {
        let ticket = self.take_ticket(seq)?;

        let mut merge = PageMerge::default();
        for alias in page.aliases {
            if ticket.touched.contains(&alias.id) {
                merge.skipped += 1;
                continue;
            }
            match self.aliases.iter_mut().find(|a| a.id == alias.id) {
                Some(existing) => {
                    *existing = alias;
                    merge.replaced += 1;
                }
                None => {
                    self.aliases.push(alias);
                    merge.added += 1;
                }
            }
        }

        self.cursor = page.next_cursor;
        self.has_more = page.has_more;
        self.loaded = true;
        Some(merge)
    }

    /// Release the fetch slot without touching the collection.
    pub fn abort_fetch(&mut self, seq: u64) -> bool {
        self.take_ticket(seq).is_some()
    }

    fn take_ticket(&mut self, seq: u64) -> Option<FetchTicket> {
        match &self.fetch {
            Some(ticket) if ticket.seq == seq => self.fetch.take(),
            _ => None,
        }
    }

    /// Record a local mutation so the in-flight fetch will not overwrite it.
    fn touch(&mut self, id: AliasId) {
        if let Some(ticket) = &mut self.fetch {
            ticket.touched.insert(id);
        }
    }

    /// Set `enabled` on the alias in place. Returns false if the id is unknown.
    pub fn set_enabled(&mut self, id: AliasId, enabled: bool) -> bool {
        let Some(alias) = self.aliases.iter_mut().find(|a| a.id == id) else {
            return false;
        };
        alias.enabled = enabled;
        self.touch(id);
        true
    }

    pub fn remove(&mut self, id: AliasId) -> Option<Alias> {
        let index = self.aliases.iter().position(|a| a.id == id)?;
        self.touch(id);
        Some(self.aliases.remove(index))
    }
}
