//! Structured tile data, modelled on Minecraft's NBT tag tree.
//!
//! Only the in-memory tree lives here; converting a live world's native
//! representation into it is the caller's job. `Display` renders SNBT, which
//! is what ends up in logs.

use core::fmt;

/// NBT tag kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagType {
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

/// An NBT value
#[derive(Debug, Clone, PartialEq)]
pub enum NbtValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<NbtValue>),
    Compound(NbtCompound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

/// An NBT compound. Keys are unique and keep their insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NbtCompound {
    entries: Vec<(String, NbtValue)>,
}

impl NbtCompound {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the one it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<NbtValue>) -> Option<NbtValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(core::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&NbtValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut NbtValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<NbtValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NbtValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, NbtValue)> for NbtCompound {
    fn from_iter<I: IntoIterator<Item = (String, NbtValue)>>(iter: I) -> Self {
        let mut compound = Self::new();
        for (k, v) in iter {
            compound.insert(k, v);
        }
        compound
    }
}

impl NbtValue {
    #[must_use]
    pub const fn tag_type(&self) -> TagType {
        match self {
            Self::Byte(_) => TagType::Byte,
            Self::Short(_) => TagType::Short,
            Self::Int(_) => TagType::Int,
            Self::Long(_) => TagType::Long,
            Self::Float(_) => TagType::Float,
            Self::Double(_) => TagType::Double,
            Self::ByteArray(_) => TagType::ByteArray,
            Self::String(_) => TagType::String,
            Self::List(_) => TagType::List,
            Self::Compound(_) => TagType::Compound,
            Self::IntArray(_) => TagType::IntArray,
            Self::LongArray(_) => TagType::LongArray,
        }
    }

    /// Integral value widened to `i64`, for any of the integer tags.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Byte(v) => Some(v as i64),
            Self::Short(v) => Some(v as i64),
            Self::Int(v) => Some(v as i64),
            Self::Long(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_compound(&self) -> Option<&NbtCompound> {
        match self {
            Self::Compound(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[NbtValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

// SNBT rendering

fn is_bare_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+'))
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            _ => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

fn write_seq<T>(
    f: &mut fmt::Formatter<'_>,
    prefix: &str,
    items: &[T],
    mut each: impl FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    write!(f, "[{prefix}")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        each(f, item)?;
    }
    f.write_str("]")
}

impl fmt::Display for NbtValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Byte(v) => write!(f, "{v}b"),
            Self::Short(v) => write!(f, "{v}s"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}L"),
            Self::Float(v) => write!(f, "{v}f"),
            Self::Double(v) => write!(f, "{v}d"),
            Self::String(s) => write_quoted(f, s),
            Self::ByteArray(v) => write_seq(f, "B;", v, |f, b| write!(f, "{b}b")),
            Self::IntArray(v) => write_seq(f, "I;", v, |f, i| write!(f, "{i}")),
            Self::LongArray(v) => write_seq(f, "L;", v, |f, l| write!(f, "{l}L")),
            Self::List(v) => write_seq(f, "", v, |f, item| write!(f, "{item}")),
            Self::Compound(c) => write!(f, "{c}"),
        }
    }
}

impl fmt::Display for NbtCompound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if is_bare_key(key) {
                f.write_str(key)?;
            } else {
                write_quoted(f, key)?;
            }
            write!(f, ":{value}")?;
        }
        f.write_str("}")
    }
}

impl From<bool> for NbtValue {
    fn from(v: bool) -> Self {
        Self::Byte(i8::from(v))
    }
}

impl From<i8> for NbtValue {
    fn from(v: i8) -> Self {
        Self::Byte(v)
    }
}

impl From<i16> for NbtValue {
    fn from(v: i16) -> Self {
        Self::Short(v)
    }
}

impl From<i32> for NbtValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for NbtValue {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f32> for NbtValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for NbtValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for NbtValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for NbtValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<NbtCompound> for NbtValue {
    fn from(v: NbtCompound) -> Self {
        Self::Compound(v)
    }
}

impl From<Vec<NbtValue>> for NbtValue {
    fn from(v: Vec<NbtValue>) -> Self {
        Self::List(v)
    }
}

/// Build an [`NbtCompound`] inline.
///
/// ```
/// use ns_volume::nbt;
///
/// let sign = nbt! {
///     "id" => "minecraft:sign",
///     "front_text" => nbt! { "has_glowing_text" => false },
/// };
/// assert_eq!(sign.len(), 2);
/// ```
#[macro_export]
macro_rules! nbt {
    () => {
        $crate::nbt::NbtCompound::new()
    };

    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut compound = $crate::nbt::NbtCompound::new();
        $(
            compound.insert($key, $value);
        )*
        compound
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_existing_key() {
        let mut compound = nbt! { "Lock" => "" };
        let old = compound.insert("Lock", "key");
        assert_eq!(old, Some(NbtValue::from("")));
        assert_eq!(compound.len(), 1);
        assert_eq!(compound.get("Lock").and_then(NbtValue::as_str), Some("key"));
    }

    #[test]
    fn snbt_rendering() {
        let compound = nbt! {
            "id" => "minecraft:chest",
            "Items" => vec![NbtValue::from(nbt! { "Slot" => 0i8, "count" => 64i32 })],
            "custom name" => 3i64,
        };
        assert_eq!(
            compound.to_string(),
            r#"{id:"minecraft:chest",Items:[{Slot:0b,count:64}],"custom name":3L}"#
        );
    }

    #[test]
    fn integer_widening() {
        assert_eq!(NbtValue::Byte(-2).as_i64(), Some(-2));
        assert_eq!(NbtValue::Short(300).as_i64(), Some(300));
        assert_eq!(NbtValue::Double(1.0).as_i64(), None);
        assert_eq!(NbtValue::from(true).tag_type(), TagType::Byte);
    }

    #[test]
    fn remove_keeps_order() {
        let mut compound = nbt! { "a" => 1i32, "b" => 2i32, "c" => 3i32 };
        assert_eq!(compound.remove("b"), Some(NbtValue::Int(2)));
        let keys: Vec<_> = compound.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "c"]);
    }
}
