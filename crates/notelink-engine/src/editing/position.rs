/// The container a position points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Parent {
    Root,
    Block(usize),
}

/// A model position: an offset inside a parent.
///
/// Inside a block the offset counts characters and inline elements (one
/// each); inside the root it counts blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub parent: Parent,
    pub offset: usize,
}

impl Position {
    pub fn new(block: usize, offset: usize) -> Self {
        Self {
            parent: Parent::Block(block),
            offset,
        }
    }

    pub fn in_root(offset: usize) -> Self {
        Self {
            parent: Parent::Root,
            offset,
        }
    }

    pub fn block(&self) -> Option<usize> {
        match self.parent {
            Parent::Block(index) => Some(index),
            Parent::Root => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Position,
    pub focus: Position,
}

impl Selection {
    pub fn new(anchor: Position, focus: Position) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(at: Position) -> Self {
        Self {
            anchor: at,
            focus: at,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn start(&self) -> Position {
        self.anchor.min(self.focus)
    }

    pub fn end(&self) -> Position {
        self.anchor.max(self.focus)
    }
}
