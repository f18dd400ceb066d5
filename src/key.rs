//! Canonical string form of table keys.
//!
//! The table stores and compares keys as strings. Every key type converts to
//! that form through [`CanonicalKey`], applied once at the start of each
//! operation. Two values with the same canonical text are the same key:
//! `1u8` and `1u64` collide, as do `1.0f64` and `1u32` (both render as
//! `"1"`). This is the table's collision policy, not an error.
//!
//! String-keyed tables are declared over `str`: a `ChainedHashMap<str, V>`
//! takes `&str`, `&String` and `&Box<str>` arguments through deref
//! coercion. A table declared over `String` only takes `&String`.

use std::borrow::Cow;

/// Conversion from an application key to the string the table hashes and
/// compares.
///
/// Implementations must be deterministic: equal keys must yield equal text
/// on every call.
pub trait CanonicalKey {
    fn canonical_key(&self) -> Cow<'_, str>;
}

impl CanonicalKey for str {
    #[inline]
    fn canonical_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl CanonicalKey for String {
    #[inline]
    fn canonical_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl CanonicalKey for Box<str> {
    #[inline]
    fn canonical_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl CanonicalKey for Cow<'_, str> {
    #[inline]
    fn canonical_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl<T: CanonicalKey + ?Sized> CanonicalKey for &T {
    #[inline]
    fn canonical_key(&self) -> Cow<'_, str> {
        (**self).canonical_key()
    }
}

// Scalars use their `Display` text.
macro_rules! display_key {
    ($($t:ty),* $(,)?) => {
        $(
            impl CanonicalKey for $t {
                #[inline]
                fn canonical_key(&self) -> Cow<'_, str> {
                    Cow::Owned(self.to_string())
                }
            }
        )*
    };
}

display_key!(
    char, bool, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
);
