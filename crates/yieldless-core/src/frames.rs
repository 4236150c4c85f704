//! Loop and block context stacks for the statement lowerer.

use crate::error::{RewriteError, RewriteResult};

/// One enclosing loop. The flags record whether any inner branch
/// statement targets this frame, so the emitter only materializes
/// labels that are jumped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopFrame {
    pub id: u32,
    pub has_break: bool,
    pub has_continue: bool,
}

impl LoopFrame {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            has_break: false,
            has_continue: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct LoopStack {
    frames: Vec<LoopFrame>,
}

impl LoopStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: u32) {
        self.frames.push(LoopFrame::new(id));
    }

    pub fn pop(&mut self) -> RewriteResult<LoopFrame> {
        self.frames
            .pop()
            .ok_or_else(|| RewriteError::invariant("loop stack popped while empty"))
    }

    /// The innermost enclosing loop, if any.
    pub fn top(&self) -> Option<&LoopFrame> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut LoopFrame> {
        self.frames.last_mut()
    }

    /// Marks the innermost frame as broken out of and returns its id.
    pub fn mark_break(&mut self) -> Option<u32> {
        self.frames.last_mut().map(|frame| {
            frame.has_break = true;
            frame.id
        })
    }

    /// Marks the innermost frame as continued and returns its id.
    pub fn mark_continue(&mut self) -> Option<u32> {
        self.frames.last_mut().map(|frame| {
            frame.has_continue = true;
            frame.id
        })
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

/// One structured block; `seen_return` suppresses yield sites that sit
/// after a terminating return on the same linear path.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockFrame {
    pub seen_return: bool,
}

#[derive(Debug, Default)]
pub struct BlockStack {
    frames: Vec<BlockFrame>,
}

impl BlockStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self) {
        self.frames.push(BlockFrame::default());
    }

    pub fn leave(&mut self) -> RewriteResult<()> {
        self.frames
            .pop()
            .map(|_| ())
            .ok_or_else(|| RewriteError::invariant("block stack popped while empty"))
    }

    pub fn mark_return(&mut self) -> RewriteResult<()> {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.seen_return = true;
                Ok(())
            }
            None => Err(RewriteError::invariant(
                "return lowered outside any block frame",
            )),
        }
    }

    /// Whether the current linear path already terminated.
    pub fn after_return(&self) -> bool {
        self.frames.last().is_some_and(|frame| frame.seen_return)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_stack_push_pop() {
        let mut loops = LoopStack::new();
        loops.push(1);
        loops.push(2);
        assert_eq!(loops.top().map(|f| f.id), Some(2));
        assert_eq!(loops.pop().unwrap().id, 2);
        assert_eq!(loops.pop().unwrap().id, 1);
        assert!(loops.pop().is_err());
    }

    #[test]
    fn branch_flags_stick_to_the_marked_frame() {
        let mut loops = LoopStack::new();
        loops.push(1);
        loops.push(2);
        loops.top_mut().unwrap().has_break = true;
        let inner = loops.pop().unwrap();
        let outer = loops.pop().unwrap();
        assert!(inner.has_break);
        assert!(!outer.has_break);
        assert!(!outer.has_continue);
    }

    #[test]
    fn seen_return_is_local_to_the_frame() {
        let mut blocks = BlockStack::new();
        blocks.enter();
        blocks.mark_return().unwrap();
        assert!(blocks.after_return());

        // A nested block starts clean and does not leak outward.
        blocks.enter();
        assert!(!blocks.after_return());
        blocks.leave().unwrap();
        assert!(blocks.after_return());

        blocks.leave().unwrap();
        assert!(!blocks.after_return());
    }

    #[test]
    fn unbalanced_block_stack_is_an_invariant_error() {
        let mut blocks = BlockStack::new();
        assert!(blocks.leave().is_err());
        assert!(blocks.mark_return().is_err());
    }
}
