//! Local-variable frames for executable bodies.
//!
//! A body owns one frame; every closure inside it opens another. Slots are
//! numbered per frame and never reused, so a slot address is the pair
//! (frames crossed outward, index). Scopes only govern name visibility.

use std::collections::HashMap;

use crate::symbols::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalSlot {
    /// Number of enclosing frames crossed; 0 is the current frame.
    pub depth: u32,
    pub index: u32,
    pub ty: Type,
}

/// Final shape of a frame, handed to the backend with the body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameLayout {
    pub slots: Vec<Type>,
    /// Captured by a closure; the backend must allocate it on the heap.
    pub closed: bool,
}

#[derive(Debug, Default)]
struct Frame {
    scopes: Vec<HashMap<String, u32>>,
    slots: Vec<Type>,
    closed: bool,
}

impl Frame {
    fn new() -> Self {
        Self { scopes: vec![HashMap::new()], slots: Vec::new(), closed: false }
    }

    fn allocate(&mut self, ty: Type) -> u32 {
        let index = self.slots.len() as u32;
        self.slots.push(ty);
        index
    }

    fn lookup(&self, name: &str) -> Option<u32> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name).copied())
    }

    fn into_layout(self) -> FrameLayout {
        FrameLayout { slots: self.slots, closed: self.closed }
    }
}

/// Stack of open frames, innermost last.
#[derive(Debug)]
pub struct FrameStack {
    frames: Vec<Frame>,
}

impl Default for FrameStack {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStack {
    pub fn new() -> Self {
        Self { frames: vec![Frame::new()] }
    }

    fn current(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub fn push_scope(&mut self) {
        self.current().scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        let frame = self.current();
        if frame.scopes.len() > 1 {
            frame.scopes.pop();
        }
    }

    /// Open a closure frame and close the frame it captures.
    pub fn push_frame(&mut self) {
        self.current().closed = true;
        self.frames.push(Frame::new());
    }

    /// Leave a closure frame. The outermost frame is never popped.
    pub fn pop_frame(&mut self) -> FrameLayout {
        if self.frames.len() == 1 {
            return FrameLayout { slots: self.frames[0].slots.clone(), closed: self.frames[0].closed };
        }
        self.frames.pop().map(Frame::into_layout).unwrap_or_default()
    }

    /// Whether `name` is already bound in the innermost scope.
    pub fn defined_in_scope(&self, name: &str) -> bool {
        self.frames
            .last()
            .and_then(|f| f.scopes.last())
            .is_some_and(|scope| scope.contains_key(name))
    }

    /// Bind `name` in the innermost scope. Returns `None` if the scope
    /// already binds it.
    pub fn define(&mut self, name: &str, ty: Type) -> Option<LocalSlot> {
        if self.defined_in_scope(name) {
            return None;
        }
        let frame = self.current();
        let index = frame.allocate(ty);
        if let Some(scope) = frame.scopes.last_mut() {
            scope.insert(name.to_string(), index);
        }
        Some(LocalSlot { depth: 0, index, ty })
    }

    /// A slot no source name can refer to (loop counters, temporaries).
    pub fn define_hidden(&mut self, ty: Type) -> LocalSlot {
        let index = self.current().allocate(ty);
        LocalSlot { depth: 0, index, ty }
    }

    pub fn lookup(&self, name: &str) -> Option<LocalSlot> {
        for (depth, frame) in self.frames.iter().rev().enumerate() {
            if let Some(index) = frame.lookup(name) {
                let ty = frame.slots[index as usize];
                return Some(LocalSlot { depth: depth as u32, index, ty });
            }
        }
        None
    }

    /// Consume the stack, yielding the outermost frame's layout.
    pub fn finish(mut self) -> FrameLayout {
        self.frames.truncate(1);
        self.frames.pop().map(Frame::into_layout).unwrap_or_default()
    }
}
