use types::Reg;

/// Doubly linked list header. Both ends are null for an empty list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct List {
    pub first: Reg,
    pub last: Reg,
}

impl List {
    pub fn is_empty(&self) -> bool {
        self.first.is_null()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Node {
    pub pred: Reg,
    pub succ: Reg,
    pub key: Reg,
    pub value: Reg,
}

impl Node {
    pub fn new(value: Reg, key: Reg) -> Self {
        Self {
            pred: Reg::NULL,
            succ: Reg::NULL,
            key,
            value,
        }
    }
}
