//! Structural operations: append (continue or branch), delete, merge.

use log::{debug, info};

use crate::error::{Error, Result};
use crate::tree::navigator::host_of;
use crate::tree::types::{Address, BranchPoint, Cursor, GameTree, MoveRecord, Node, Side};

/// What [`GameTree::append`] did with a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendKind {
    /// The move was already in the tree; only the cursor moved.
    Existing,
    /// The move extended the end of a line.
    Extended,
    /// The move started a new variation.
    Branched,
}

enum Plan {
    Goto(Cursor),
    Extend { ply_index: usize },
    Branch { host: Address, node_index: isize, ply_index: usize },
}

impl GameTree {
    /// Plays `record` from `cursor` and returns the cursor after it.
    ///
    /// Continues along an existing move when the notation matches, extends
    /// the line at its end, and otherwise opens a variation on the node
    /// preceding `cursor` (a root-level variation at the very start).
    pub fn append(&mut self, cursor: &Cursor, record: MoveRecord) -> Result<Cursor> {
        self.append_with_kind(cursor, record).map(|(cursor, _)| cursor)
    }

    pub fn append_with_kind(
        &mut self,
        cursor: &Cursor,
        record: MoveRecord,
    ) -> Result<(Cursor, AppendKind)> {
        let plan = self.plan_append(cursor, &record.san)?;
        let ply_index = match &plan {
            Plan::Goto(_) => None,
            Plan::Extend { ply_index } | Plan::Branch { ply_index, .. } => Some(*ply_index),
        };
        if let Some(ply_index) = ply_index {
            if record.side != Side::from_ply_index(ply_index) {
                return Err(Error::IllegalMove {
                    input: record.san,
                    position: self.position_at(cursor)?,
                });
            }
        }

        match plan {
            Plan::Goto(next) => {
                debug!("{} already played at {}, moving to {}", record.san, cursor, next);
                Ok((next, AppendKind::Existing))
            }
            Plan::Extend { ply_index } => {
                let is_mainline = cursor.address.is_mainline();
                debug!("Extending line at {} with {}", cursor, record.san);
                self.line_mut(&cursor.address)?
                    .push(Node::new(record, ply_index, is_mainline));
                Ok((
                    Cursor::new(cursor.address.clone(), cursor.ply + 1),
                    AppendKind::Extended,
                ))
            }
            Plan::Branch {
                host,
                node_index,
                ply_index,
            } => {
                let variations = self.host_variations_mut(&host, node_index)?;
                debug!("Branching {} off {}:{}", record.san, host, node_index);
                variations.push(vec![Node::new(record, ply_index, false)]);
                let branch = BranchPoint::new(node_index, variations.len() - 1);
                Ok((Cursor::new(host.child(branch), 1), AppendKind::Branched))
            }
        }
    }

    fn plan_append(&self, cursor: &Cursor, san: &str) -> Result<Plan> {
        let line = self
            .line(&cursor.address)
            .map_err(|_| Error::invalid_address(cursor))?;
        if cursor.ply > line.len() {
            return Err(Error::invalid_address(cursor));
        }
        let Some(existing) = line.get(cursor.ply) else {
            let base = line.first().map_or(self.start_ply, |node| node.ply_index);
            return Ok(Plan::Extend {
                ply_index: base + cursor.ply,
            });
        };
        if existing.san() == san {
            return Ok(Plan::Goto(Cursor::new(
                cursor.address.clone(),
                cursor.ply + 1,
            )));
        }

        let (host, node_index) = host_of(cursor);
        if cursor.ply == 0 && !cursor.address.is_mainline() {
            // At the start of a variation the parent line's move is an
            // alternative too.
            if let Ok(index) = usize::try_from(node_index + 1) {
                if let Some(node) = self.line(&host)?.get(index) {
                    if node.san() == san {
                        return Ok(Plan::Goto(Cursor::new(host, index + 1)));
                    }
                }
            }
        }
        let existing_variation = self
            .host_variations(&host, node_index)?
            .iter()
            .position(|variation| variation.first().is_some_and(|node| node.san() == san));
        if let Some(index) = existing_variation {
            let address = host.child(BranchPoint::new(node_index, index));
            return Ok(Plan::Goto(Cursor::new(address, 1)));
        }
        Ok(Plan::Branch {
            host,
            node_index,
            ply_index: existing.ply_index,
        })
    }

    /// Detaches the variation at `address` with everything below it.
    ///
    /// Later sibling variations shift down by one index.
    pub fn delete_variation(&mut self, address: &Address) -> Result<()> {
        let (host, point) = address.parent().ok_or(Error::MainlineNotDeletable)?;
        let invalid = || Error::invalid_address(&Cursor::new(address.clone(), 0));
        let variations = self
            .host_variations_mut(&host, point.node_index)
            .map_err(|_| invalid())?;
        if point.variation_index >= variations.len() {
            return Err(invalid());
        }
        let removed = variations.remove(point.variation_index);
        info!(
            "Deleted variation {} starting with {}",
            address,
            removed.first().map_or("-", |node| node.san())
        );
        Ok(())
    }

    /// Replays every line of `other` into this tree. Moves already present
    /// are shared; new nodes keep their annotations. Returns the number of
    /// nodes added.
    pub fn merge(&mut self, other: &GameTree) -> Result<usize> {
        if self.start_fen != other.start_fen {
            return Err(Error::StartPositionMismatch);
        }
        let mut added = 0;
        self.merge_line(&other.mainline, Cursor::root(), &mut added)?;
        for variation in &other.root_variations {
            self.merge_line(variation, Cursor::root(), &mut added)?;
        }
        for comment in &other.intro {
            if !self.intro.contains(comment) {
                self.intro.push(comment.clone());
            }
        }
        info!("Merged game: {} new moves", added);
        Ok(added)
    }

    fn merge_line(&mut self, line: &[Node], start: Cursor, added: &mut usize) -> Result<()> {
        let mut cursor = start;
        for node in line {
            let (next, kind) = self.append_with_kind(&cursor, node.record.clone())?;
            if kind != AppendKind::Existing {
                *added += 1;
                for stored in &node.annotations {
                    let key = self.issue_annotation_key();
                    let target = self.line_mut(&next.address)?;
                    if let Some(created) = target.get_mut(next.ply - 1) {
                        created.push_annotation(key, stored.annotation.clone());
                    }
                }
            }
            for variation in &node.variations {
                self.merge_line(variation, next.clone(), added)?;
            }
            cursor = next;
        }
        Ok(())
    }
}
