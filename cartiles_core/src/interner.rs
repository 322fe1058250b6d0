//! Process-wide interner for property keys.
//!
//! Style expressions and tile features refer to the same handful of property
//! names millions of times per frame. Interning turns every name into a small
//! [`Key`] handle with O(1) equality and O(1) resolution back to the string.
//! The table is append-only for the life of the process.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::sync::RwLock;

/// Handle of an interned property key.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Key(u32);

/// Synthetic property carrying the feature identifier.
pub const KEY_ID: Key = Key(0);
/// Synthetic property carrying the geometry-type name.
pub const KEY_TYPE: Key = Key(1);
/// Pseudo-property diverted to the evaluation context's zoom.
pub const KEY_ZOOM: Key = Key(2);

struct InternerTable {
	lookup: HashMap<&'static str, u32>,
	entries: Vec<&'static str>,
}

impl InternerTable {
	fn with_builtins() -> InternerTable {
		let mut table = InternerTable {
			lookup: HashMap::new(),
			entries: Vec::new(),
		};
		assert_eq!(table.add("$id"), KEY_ID.0);
		assert_eq!(table.add("$type"), KEY_TYPE.0);
		assert_eq!(table.add("zoom"), KEY_ZOOM.0);
		table
	}

	fn add(&mut self, name: &str) -> u32 {
		if let Some(index) = self.lookup.get(name) {
			return *index;
		}
		// Entries are never removed, so leaking gives every key a stable
		// 'static string without a second copy per lookup.
		let entry: &'static str = Box::leak(name.to_owned().into_boxed_str());
		let index = self.entries.len() as u32;
		self.lookup.insert(entry, index);
		self.entries.push(entry);
		index
	}
}

lazy_static! {
	static ref TABLE: RwLock<InternerTable> = RwLock::new(InternerTable::with_builtins());
}

impl Key {
	/// Interns `name`, returning the same handle for the same string on every
	/// call.
	pub fn intern(name: &str) -> Key {
		{
			let table = TABLE.read().unwrap();
			if let Some(index) = table.lookup.get(name) {
				return Key(*index);
			}
		}
		Key(TABLE.write().unwrap().add(name))
	}

	/// Resolves the handle back to its string.
	pub fn as_str(&self) -> &'static str {
		TABLE.read().unwrap().entries[self.0 as usize]
	}

	pub fn as_u32(&self) -> u32 {
		self.0
	}
}

impl Debug for Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_fmt(format_args!("Key({:?})", self.as_str()))
	}
}

impl Display for Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl From<&str> for Key {
	fn from(name: &str) -> Key {
		Key::intern(name)
	}
}
