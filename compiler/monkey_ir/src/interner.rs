//! String interner for identifier and string-literal storage.
//!
//! Provides O(1) interning and lookup. Interned strings are leaked so
//! lookups hand out `&'static str` without holding the lock.

use crate::Name;
use parking_lot::RwLock;
use std::sync::Arc;

use rustc_hash::FxHashMap;

struct Inner {
    /// Map from string content to index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for string contents.
    strings: Vec<&'static str>,
}

/// String interner.
///
/// # Thread Safety
/// A single `RwLock` guards the storage; the interner can be wrapped in
/// [`SharedInterner`] for sharing across pipeline phases.
pub struct StringInterner {
    inner: RwLock<Inner>,
}

impl StringInterner {
    /// Create a new interner with the empty string and all Monkey
    /// keywords pre-interned.
    pub fn new() -> Self {
        let mut inner = Inner {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(64),
        };
        let empty: &'static str = "";
        inner.map.insert(empty, 0);
        inner.strings.push(empty);

        let interner = Self {
            inner: RwLock::new(inner),
        };
        interner.pre_intern_keywords();
        interner
    }

    /// Intern a string, returning its `Name`.
    pub fn intern(&self, s: &str) -> Name {
        // Fast path: already interned.
        {
            let guard = self.inner.read();
            if let Some(&index) = guard.map.get(s) {
                return Name::new(index);
            }
        }
        self.intern_owned(s.to_owned())
    }

    /// Intern an owned `String`, avoiding the extra allocation `intern`
    /// would perform on a miss.
    pub fn intern_owned(&self, s: String) -> Name {
        let mut guard = self.inner.write();

        // Double-check after acquiring the write lock.
        if let Some(&index) = guard.map.get(s.as_str()) {
            return Name::new(index);
        }

        // Leak the string to get a 'static lifetime.
        let leaked: &'static str = Box::leak(s.into_boxed_str());
        let index = u32::try_from(guard.strings.len())
            .unwrap_or_else(|_| panic!("interner exceeded {} strings", u32::MAX));
        guard.strings.push(leaked);
        guard.map.insert(leaked, index);
        Name::new(index)
    }

    /// Look up the string for a `Name`.
    ///
    /// The returned reference is `'static` because interned strings are
    /// leaked and never deallocated.
    pub fn lookup(&self, name: Name) -> &'static str {
        let guard = self.inner.read();
        guard.strings[name.index()]
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.inner.read().strings.len()
    }

    /// Check if the interner holds only the empty string.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    fn pre_intern_keywords(&self) {
        const KEYWORDS: &[&str] = &[
            "fn", "let", "true", "false", "if", "else", "return", "null",
            // Builtin functions
            "len", "puts", "first", "last", "rest", "push",
        ];
        for kw in KEYWORDS {
            self.intern(kw);
        }
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for looking up interned string names.
///
/// Lets downstream crates accept any lookup implementor without
/// depending on `StringInterner` directly.
pub trait StringLookup {
    /// Look up the string for an interned name.
    fn lookup(&self, name: Name) -> &str;
}

impl StringLookup for StringInterner {
    fn lookup(&self, name: Name) -> &str {
        StringInterner::lookup(self, name)
    }
}

/// Shared interner handle for use across pipeline phases.
///
/// Cloning is cheap (reference count bump). All phases of one session
/// must share one interner so `Name` values stay comparable.
#[derive(Clone)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    /// Create a new shared interner.
    pub fn new() -> Self {
        SharedInterner(Arc::new(StringInterner::new()))
    }
}

impl Default for SharedInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
