use core::fmt;

/// Runtime classification of a [`Reg`](crate::Reg).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Boxed integer other than zero
    Integer,
    /// Integer zero, which is also the null reference
    Null,
    Object,
    List,
    Node,
    /// Pointer into raw data (code, locals, strings, buffers)
    Reference,
    /// Stack slot that was never written
    Uninitialized,
    /// Dangling or out-of-range reference
    Invalid,
}

impl Category {
    pub fn is_valid(self) -> bool {
        self != Category::Invalid
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Integer => "integer",
            Category::Null => "null",
            Category::Object => "object",
            Category::List => "list",
            Category::Node => "node",
            Category::Reference => "reference",
            Category::Uninitialized => "uninitialized",
            Category::Invalid => "invalid",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
