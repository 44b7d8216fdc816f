//! Kernel argument signatures.
//!
//! A signature is a short string, one token per argument slot:
//!
//! | token    | accepts                                   |
//! |----------|-------------------------------------------|
//! | `i`      | integer (integer 0 doubles as null)       |
//! | `o`      | object                                    |
//! | `r`      | raw reference                             |
//! | `l`      | list                                      |
//! | `n`      | node                                      |
//! | `0`      | null                                      |
//! | `u`      | uninitialized stack slot                  |
//! | `.`      | anything valid                            |
//! | `[..]`   | any one of the enclosed letters           |
//! | `(..)`   | every enclosed slot is optional           |
//! | `*`      | previous slot repeats, one or more times  |
//!
//! `"io(i*)"` takes an integer, an object, then any number of integers.
//! Signatures are compiled once and cached for the life of the process.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use types::{Category, Reg};

use crate::error::{ArgumentMismatch, SignatureError};
use crate::resolver::classify;
use crate::segment_manager::SegmentManager;

/// One compiled slot: a set of accepted categories plus slot flags.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SigMask(pub u16);

impl SigMask {
    pub const EMPTY: SigMask = SigMask(0);

    pub const INTEGER: SigMask = SigMask(1 << 0);
    pub const OBJECT: SigMask = SigMask(1 << 1);
    pub const REFERENCE: SigMask = SigMask(1 << 2);
    pub const LIST: SigMask = SigMask(1 << 3);
    pub const NODE: SigMask = SigMask(1 << 4);
    pub const NULL: SigMask = SigMask(1 << 5);
    pub const UNINITIALIZED: SigMask = SigMask(1 << 6);
    pub const ANY: SigMask = SigMask(0x007f);

    /// Slot may be omitted.
    pub const IS_OPTIONAL: SigMask = SigMask(1 << 8);
    /// A mandatory slot follows this one.
    pub const NEEDS_MORE: SigMask = SigMask(1 << 9);
    /// Slot absorbs every remaining argument.
    pub const MORE_MAY_FOLLOW: SigMask = SigMask(1 << 10);

    const TYPE_BITS: u16 = 0x00ff;

    pub fn for_category(category: Category) -> SigMask {
        match category {
            Category::Integer => SigMask::INTEGER,
            Category::Null => SigMask::NULL,
            Category::Object => SigMask::OBJECT,
            Category::List => SigMask::LIST,
            Category::Node => SigMask::NODE,
            Category::Reference => SigMask::REFERENCE,
            Category::Uninitialized => SigMask::UNINITIALIZED,
            Category::Invalid => SigMask::EMPTY,
        }
    }

    fn for_letter(letter: char) -> Option<SigMask> {
        let mask = match letter {
            'i' => SigMask::INTEGER | SigMask::NULL,
            'o' => SigMask::OBJECT,
            'r' => SigMask::REFERENCE,
            'l' => SigMask::LIST,
            'n' => SigMask::NODE,
            '0' => SigMask::NULL,
            'u' => SigMask::UNINITIALIZED,
            '.' => SigMask::ANY,
            _ => return None,
        };
        Some(mask)
    }

    pub fn types(self) -> SigMask {
        SigMask(self.0 & Self::TYPE_BITS)
    }

    pub fn contains(self, other: SigMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.types().0 == 0
    }

    pub fn accepts(self, category: Category) -> bool {
        let wanted = SigMask::for_category(category);
        !wanted.is_empty() && self.contains(wanted)
    }

    pub fn is_optional(self) -> bool {
        self.contains(SigMask::IS_OPTIONAL)
    }

    pub fn needs_more(self) -> bool {
        self.contains(SigMask::NEEDS_MORE)
    }

    pub fn more_may_follow(self) -> bool {
        self.contains(SigMask::MORE_MAY_FOLLOW)
    }
}

impl std::ops::BitOr for SigMask {
    type Output = SigMask;

    fn bitor(self, rhs: SigMask) -> SigMask {
        SigMask(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for SigMask {
    fn bitor_assign(&mut self, rhs: SigMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for SigMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigMask({}", self)?;
        if self.is_optional() {
            f.write_str(", optional")?;
        }
        if self.needs_more() {
            f.write_str(", needs-more")?;
        }
        if self.more_may_follow() {
            f.write_str(", more")?;
        }
        f.write_str(")")
    }
}

/// Prints the type part in signature notation, e.g. `i`, `[ol]` or `.`.
impl fmt::Display for SigMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types = self.types();
        if types.contains(SigMask::ANY) {
            return f.write_str(".");
        }
        let mut letters = String::new();
        if types.contains(SigMask::INTEGER) {
            letters.push('i');
        } else if types.contains(SigMask::NULL) {
            letters.push('0');
        }
        for (mask, letter) in [
            (SigMask::OBJECT, 'o'),
            (SigMask::REFERENCE, 'r'),
            (SigMask::LIST, 'l'),
            (SigMask::NODE, 'n'),
            (SigMask::UNINITIALIZED, 'u'),
        ] {
            if types.contains(mask) {
                letters.push(letter);
            }
        }
        match letters.len() {
            0 => f.write_str("-"),
            1 => f.write_str(&letters),
            _ => write!(f, "[{}]", letters),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    text: String,
    slots: Vec<SigMask>,
}

impl Signature {
    pub fn compile(text: &str) -> Result<Signature, SignatureError> {
        let signature = || text.to_string();
        let mut slots: Vec<SigMask> = Vec::new();
        let mut in_optional = false;
        let mut seen_optional = false;
        let mut group: Option<(usize, SigMask, Vec<char>)> = None;
        // True right after a slot was closed, so '*' has something to repeat.
        let mut after_slot = false;

        for (position, found) in text.char_indices() {
            let unbalanced = || SignatureError::Unbalanced { signature: signature(), position, found };
            match found {
                '(' => {
                    if group.is_some() {
                        return Err(unbalanced());
                    }
                    if in_optional {
                        return Err(SignatureError::NestedOptional { signature: signature(), position });
                    }
                    in_optional = true;
                    seen_optional = true;
                    after_slot = false;
                }
                ')' => {
                    if !in_optional || group.is_some() {
                        return Err(unbalanced());
                    }
                    in_optional = false;
                    after_slot = false;
                }
                '[' => {
                    if group.is_some() {
                        return Err(unbalanced());
                    }
                    group = Some((position, SigMask::EMPTY, Vec::new()));
                    after_slot = false;
                }
                ']' => {
                    let Some((start, mask, _)) = group.take() else {
                        return Err(unbalanced());
                    };
                    if mask.is_empty() {
                        return Err(SignatureError::EmptyGroup { signature: signature(), position: start });
                    }
                    push_slot(&mut slots, text, start, mask, in_optional, seen_optional)?;
                    after_slot = true;
                }
                '*' => {
                    if group.is_some() {
                        return Err(unbalanced());
                    }
                    match slots.last_mut() {
                        Some(last) if after_slot && !last.more_may_follow() => {
                            *last |= SigMask::MORE_MAY_FOLLOW;
                        }
                        _ => {
                            return Err(SignatureError::MoreWithoutType { signature: signature(), position });
                        }
                    }
                    after_slot = false;
                }
                letter => {
                    let mask = SigMask::for_letter(letter).ok_or(SignatureError::UnknownType {
                        signature: signature(),
                        position,
                        found: letter,
                    })?;
                    match group.as_mut() {
                        Some((_, group_mask, letters)) => {
                            if letters.contains(&letter) {
                                return Err(SignatureError::DuplicateType {
                                    signature: signature(),
                                    position,
                                    found: letter,
                                });
                            }
                            letters.push(letter);
                            *group_mask |= mask;
                        }
                        None => {
                            push_slot(&mut slots, text, position, mask, in_optional, seen_optional)?;
                            after_slot = true;
                        }
                    }
                }
            }
        }

        if let Some((start, _, _)) = group {
            return Err(SignatureError::Unbalanced { signature: signature(), position: start, found: '[' });
        }
        if in_optional {
            let position = text.rfind('(').unwrap_or(0);
            return Err(SignatureError::Unbalanced { signature: signature(), position, found: '(' });
        }

        for index in 1..slots.len() {
            if !slots[index].is_optional() {
                slots[index - 1] |= SigMask::NEEDS_MORE;
            }
        }

        Ok(Signature { text: text.to_string(), slots })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn slots(&self) -> &[SigMask] {
        &self.slots
    }

    /// Fewest arguments accepted.
    pub fn min_args(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_optional()).count()
    }

    /// Most arguments accepted, `None` when a trailing `*` lifts the bound.
    pub fn max_args(&self) -> Option<usize> {
        if self.slots.last().is_some_and(|slot| slot.more_may_follow()) {
            None
        } else {
            Some(self.slots.len())
        }
    }

    /// Classifies every argument against `heap` and checks it against its slot.
    pub fn check(&self, heap: &SegmentManager, args: &[Reg]) -> Result<(), ArgumentMismatch> {
        self.walk(args.iter().map(|&reg| (classify(heap, reg), reg)))
    }

    pub fn matches(&self, heap: &SegmentManager, args: &[Reg]) -> bool {
        self.check(heap, args).is_ok()
    }

    /// Same check over pre-classified arguments.
    pub fn matches_categories(&self, categories: &[Category]) -> bool {
        self.walk(categories.iter().map(|&category| (category, Reg::NULL)))
            .is_ok()
    }

    fn walk<I>(&self, args: I) -> Result<(), ArgumentMismatch>
    where
        I: ExactSizeIterator<Item = (Category, Reg)>,
    {
        let count = args.len();
        let mut slot = 0;
        for (position, (category, reg)) in args.enumerate() {
            let Some(&mask) = self.slots.get(slot) else {
                return Err(ArgumentMismatch::TooMany {
                    expected: self.slots.len(),
                    found: count,
                });
            };
            if category == Category::Invalid {
                return Err(ArgumentMismatch::InvalidReference { position, reg });
            }
            if !mask.accepts(category) {
                return Err(ArgumentMismatch::WrongType {
                    position,
                    expected: mask.types(),
                    found: category,
                });
            }
            if !mask.more_may_follow() {
                slot += 1;
            }
        }

        let Some(&next) = self.slots.get(slot) else {
            return Ok(());
        };
        // Every earlier slot took exactly one argument, so the rest went
        // to the repeating slot.
        let repeated = next.more_may_follow() && count > slot;
        if repeated || (next.is_optional() && !next.needs_more()) {
            return Ok(());
        }
        Err(ArgumentMismatch::TooFew {
            expected: self.min_args(),
            found: count,
        })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn push_slot(
    slots: &mut Vec<SigMask>,
    text: &str,
    position: usize,
    mut mask: SigMask,
    in_optional: bool,
    seen_optional: bool,
) -> Result<(), SignatureError> {
    let signature = text.to_string();
    if slots.last().is_some_and(|last| last.more_may_follow()) {
        return Err(SignatureError::SlotAfterMore { signature, position });
    }
    if in_optional {
        mask |= SigMask::IS_OPTIONAL;
    } else if seen_optional {
        return Err(SignatureError::MandatoryAfterOptional { signature, position });
    }
    slots.push(mask);
    Ok(())
}

static SIGNATURES: Lazy<Mutex<HashMap<&'static str, Arc<Signature>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Compiles `text` on first use and hands out the shared result after.
pub fn compiled(text: &'static str) -> Result<Arc<Signature>, SignatureError> {
    if let Ok(cache) = SIGNATURES.lock() {
        if let Some(signature) = cache.get(text) {
            return Ok(Arc::clone(signature));
        }
    }
    let signature = Arc::new(Signature::compile(text)?);
    if let Ok(mut cache) = SIGNATURES.lock() {
        cache.insert(text, Arc::clone(&signature));
    }
    Ok(signature)
}
