//! Address resolution and movement through the tree.
//!
//! Every lookup walks the branch points of an address in order, so nesting
//! depth is unbounded.

use crate::error::{Error, Result};
use crate::tree::types::{Address, BranchPoint, Cursor, GameTree, Line, MoveRecord, Node};

impl GameTree {
    /// Walks `address` from the mainline, handing every consumed prefix
    /// (the moves played before descending into a variation) to `visit`.
    fn descend<'t>(
        &'t self,
        address: &Address,
        ply: usize,
        mut visit: impl FnMut(&'t [Node]),
    ) -> Result<&'t [Node]> {
        let invalid = || Error::invalid_address(&Cursor::new(address.clone(), ply));
        let mut line: &'t [Node] = &self.mainline;
        for (depth, point) in address.branch_points().iter().enumerate() {
            line = if point.is_root() {
                if depth != 0 {
                    return Err(invalid());
                }
                self.root_variations
                    .get(point.variation_index)
                    .ok_or_else(|| invalid())?
            } else {
                let index = usize::try_from(point.node_index).map_err(|_| invalid())?;
                let node = line.get(index).ok_or_else(|| invalid())?;
                visit(&line[..=index]);
                node.variations
                    .get(point.variation_index)
                    .ok_or_else(|| invalid())?
            };
        }
        Ok(line)
    }

    /// Nodes of the line at `address`.
    pub fn line(&self, address: &Address) -> Result<&[Node]> {
        self.descend(address, 0, |_| {})
    }

    pub(crate) fn line_mut(&mut self, address: &Address) -> Result<&mut Line> {
        fn variation_mut<'a>(line: &'a mut Line, point: &BranchPoint) -> Option<&'a mut Line> {
            let index = usize::try_from(point.node_index).ok()?;
            line.get_mut(index)?.variations.get_mut(point.variation_index)
        }

        let invalid = || Error::invalid_address(&Cursor::new(address.clone(), 0));
        let mut points = address.branch_points().iter();
        let mut line = match points.next() {
            None => return Ok(&mut self.mainline),
            Some(point) if point.is_root() => self
                .root_variations
                .get_mut(point.variation_index)
                .ok_or_else(|| invalid())?,
            Some(point) => variation_mut(&mut self.mainline, point).ok_or_else(|| invalid())?,
        };
        for point in points {
            line = variation_mut(line, point).ok_or_else(|| invalid())?;
        }
        Ok(line)
    }

    /// Variations hanging off node `node_index` of the line at `host`
    /// (`-1` on the mainline: the root-level variations).
    pub(crate) fn host_variations(&self, host: &Address, node_index: isize) -> Result<&[Line]> {
        if node_index == BranchPoint::ROOT_NODE {
            if !host.is_mainline() {
                return Err(Error::invalid_address(&Cursor::new(host.clone(), 0)));
            }
            return Ok(&self.root_variations);
        }
        let index = usize::try_from(node_index)
            .map_err(|_| Error::invalid_address(&Cursor::new(host.clone(), 0)))?;
        self.line(host)?
            .get(index)
            .map(|node| node.variations.as_slice())
            .ok_or_else(|| Error::invalid_address(&Cursor::new(host.clone(), index + 1)))
    }

    pub(crate) fn host_variations_mut(
        &mut self,
        host: &Address,
        node_index: isize,
    ) -> Result<&mut Vec<Line>> {
        if node_index == BranchPoint::ROOT_NODE {
            if !host.is_mainline() {
                return Err(Error::invalid_address(&Cursor::new(host.clone(), 0)));
            }
            return Ok(&mut self.root_variations);
        }
        let invalid = || Error::invalid_address(&Cursor::new(host.clone(), 0));
        let index = usize::try_from(node_index).map_err(|_| invalid())?;
        self.line_mut(host)?
            .get_mut(index)
            .map(|node| &mut node.variations)
            .ok_or_else(|| invalid())
    }

    /// Moves to replay from the starting position to reach `cursor`.
    pub fn resolve(&self, cursor: &Cursor) -> Result<Vec<MoveRecord>> {
        Ok(self
            .resolve_refs(cursor)?
            .into_iter()
            .cloned()
            .collect())
    }

    pub(crate) fn resolve_refs(&self, cursor: &Cursor) -> Result<Vec<&MoveRecord>> {
        let mut moves = Vec::new();
        let line = self.descend(&cursor.address, cursor.ply, |prefix| {
            moves.extend(prefix.iter().map(|node| &node.record))
        })?;
        let played = line
            .get(..cursor.ply)
            .ok_or_else(|| Error::invalid_address(cursor))?;
        moves.extend(played.iter().map(|node| &node.record));
        Ok(moves)
    }

    /// Position (FEN) at `cursor`.
    pub fn position_at(&self, cursor: &Cursor) -> Result<String> {
        let moves = self.resolve_refs(cursor)?;
        Ok(moves
            .last()
            .map_or_else(|| self.start_fen.clone(), |record| record.fen.clone()))
    }

    /// Length of the line at `address`.
    pub fn max_ply(&self, address: &Address) -> Result<usize> {
        Ok(self.line(address)?.len())
    }

    /// Checks that `cursor` names a position in this tree.
    pub fn validate(&self, cursor: &Cursor) -> Result<()> {
        if cursor.ply > self.max_ply(&cursor.address).map_err(|_| Error::invalid_address(cursor))? {
            return Err(Error::invalid_address(cursor));
        }
        Ok(())
    }

    /// One ply forward along the current line, `None` at its end.
    pub fn next_of(&self, cursor: &Cursor) -> Result<Option<Cursor>> {
        self.validate(cursor)?;
        let max = self.max_ply(&cursor.address)?;
        Ok((cursor.ply < max).then(|| Cursor::new(cursor.address.clone(), cursor.ply + 1)))
    }

    /// Last position of the current line.
    pub fn line_end(&self, cursor: &Cursor) -> Result<Cursor> {
        self.validate(cursor)?;
        Ok(Cursor::new(
            cursor.address.clone(),
            self.max_ply(&cursor.address)?,
        ))
    }

    /// Every move playable from `cursor` that already exists in the tree,
    /// paired with the cursor reached by playing it. The continuation of the
    /// current line comes first, then the alternatives in variation order.
    pub fn alternatives(&self, cursor: &Cursor) -> Result<Vec<(Cursor, &MoveRecord)>> {
        self.validate(cursor)?;
        let line = self.line(&cursor.address)?;
        let Some(next) = line.get(cursor.ply) else {
            return Ok(Vec::new());
        };

        let mut choices = vec![(
            Cursor::new(cursor.address.clone(), cursor.ply + 1),
            &next.record,
        )];
        let (host, node_index) = host_of(cursor);
        if cursor.ply == 0 && !cursor.address.is_mainline() {
            if let Ok(index) = usize::try_from(node_index + 1) {
                if let Some(node) = self.line(&host)?.get(index) {
                    choices.push((Cursor::new(host.clone(), index + 1), &node.record));
                }
            }
        }
        for (index, variation) in self.host_variations(&host, node_index)?.iter().enumerate() {
            let address = host.child(BranchPoint::new(node_index, index));
            if address == cursor.address {
                continue;
            }
            if let Some(first) = variation.first() {
                choices.push((Cursor::new(address, 1), &first.record));
            }
        }
        Ok(choices)
    }
}

/// The logical "step back" target of `cursor`.
///
/// Within a line this is the previous ply; at the start of a variation it is
/// the parent line, positioned right after the node the variation hangs off.
pub fn parent_of(cursor: &Cursor) -> Option<Cursor> {
    if cursor.ply > 0 {
        return Some(Cursor::new(cursor.address.clone(), cursor.ply - 1));
    }
    let (parent, point) = cursor.address.parent()?;
    let ply = usize::try_from(point.node_index + 1).unwrap_or(0);
    Some(Cursor::new(parent, ply))
}

/// The line and node index whose variations hold the alternatives to the move
/// played from `cursor`.
pub(crate) fn host_of(cursor: &Cursor) -> (Address, isize) {
    if cursor.ply > 0 {
        return (cursor.address.clone(), cursor.ply as isize - 1);
    }
    match cursor.address.parent() {
        Some((parent, point)) => (parent, point.node_index),
        None => (Address::mainline(), BranchPoint::ROOT_NODE),
    }
}
