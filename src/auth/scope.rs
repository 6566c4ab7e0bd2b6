//! Permission scopes an integrating application may request.

// std
use std::slice::Iter;
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// At least one scope is required.
	#[error("Scope set cannot be empty.")]
	Empty,
	/// The scope is not part of the supported enumeration.
	#[error("Unknown scope: {scope}.")]
	Unknown {
		/// The offending scope string.
		scope: String,
	},
}

/// Fixed enumeration of permission scopes understood by the remote platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
	/// Act on behalf of the user while they are offline; yields a refresh token.
	Offline,
	/// Read contacts, contact properties, and contact lists.
	ContactsReadOnly,
	/// Read and write contacts, contact properties, and contact lists.
	ContactsReadWrite,
	/// Read and write blog posts and comments.
	BlogReadWrite,
	/// Read and post marketing events.
	EventsReadWrite,
	/// Read and insert keywords.
	KeywordReadWrite,
}
impl Scope {
	/// Every supported scope in declaration order.
	pub const ALL: [Scope; 6] = [
		Scope::Offline,
		Scope::ContactsReadOnly,
		Scope::ContactsReadWrite,
		Scope::BlogReadWrite,
		Scope::EventsReadWrite,
		Scope::KeywordReadWrite,
	];

	/// Wire representation sent in the `scope` query parameter.
	pub const fn as_str(self) -> &'static str {
		match self {
			Scope::Offline => "offline",
			Scope::ContactsReadOnly => "contacts-ro",
			Scope::ContactsReadWrite => "contacts-rw",
			Scope::BlogReadWrite => "blog-rw",
			Scope::EventsReadWrite => "events-rw",
			Scope::KeywordReadWrite => "keyword-rw",
		}
	}
}
impl Display for Scope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Scope {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Scope::ALL
			.into_iter()
			.find(|scope| scope.as_str() == s)
			.ok_or_else(|| ScopeValidationError::Unknown { scope: s.to_owned() })
	}
}
impl Serialize for Scope {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(self.as_str())
	}
}
impl<'de> Deserialize<'de> for Scope {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;

		raw.parse().map_err(DeError::custom)
	}
}

/// Non-empty, duplicate-free list of scopes that keeps the order it was declared in.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ScopeSet {
	scopes: Arc<[Scope]>,
}
impl ScopeSet {
	/// Builds a scope set from raw scope strings.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let parsed = scopes
			.into_iter()
			.map(|scope| scope.as_ref().parse::<Scope>())
			.collect::<Result<Vec<_>, _>>()?;

		Self::from_scopes(parsed)
	}

	/// Builds a scope set from typed scopes.
	pub fn from_scopes<I>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = Scope>,
	{
		let mut ordered = Vec::new();

		for scope in scopes {
			if !ordered.contains(&scope) {
				ordered.push(scope);
			}
		}

		if ordered.is_empty() {
			return Err(ScopeValidationError::Empty);
		}

		Ok(Self { scopes: Arc::from(ordered) })
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.scopes.len()
	}

	/// Always false; kept for API symmetry with collections.
	pub fn is_empty(&self) -> bool {
		self.scopes.is_empty()
	}

	/// Returns true if the set contains the provided scope.
	pub fn contains(&self, scope: Scope) -> bool {
		self.scopes.contains(&scope)
	}

	/// Iterator over scopes in declaration order.
	pub fn iter(&self) -> ScopeIter<'_> {
		ScopeIter { inner: self.scopes.iter() }
	}

	/// Space-delimited wire form.
	pub fn normalized(&self) -> String {
		self.iter().map(Scope::as_str).collect::<Vec<_>>().join(" ")
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeSet").field(&self.scopes).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}

/// Iterator over the scopes of a [`ScopeSet`].
pub struct ScopeIter<'a> {
	inner: Iter<'a, Scope>,
}
impl Iterator for ScopeIter<'_> {
	type Item = Scope;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().copied()
	}
}
impl<'a> IntoIterator for &'a ScopeSet {
	type IntoIter = ScopeIter<'a>;
	type Item = Scope;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}
impl Serialize for ScopeSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.scopes.len()))?;

		for scope in self.iter() {
			seq.serialize_element(&scope)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for ScopeSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<Scope>>::deserialize(deserializer)?;

		ScopeSet::from_scopes(values).map_err(DeError::custom)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scopes_keep_declaration_order_and_dedupe() {
		let scopes = ScopeSet::new(["contacts-rw", "events-rw", "contacts-rw"])
			.expect("Known scopes should build a scope set.");

		assert_eq!(scopes.len(), 2);
		assert_eq!(scopes.normalized(), "contacts-rw events-rw");
		assert!(scopes.contains(Scope::EventsReadWrite));
		assert!(!scopes.contains(Scope::Offline));
	}

	#[test]
	fn unknown_and_empty_scopes_are_rejected() {
		assert_eq!(
			ScopeSet::new(["123456"]),
			Err(ScopeValidationError::Unknown { scope: "123456".into() })
		);
		assert_eq!(ScopeSet::new(Vec::<&str>::new()), Err(ScopeValidationError::Empty));
	}

	#[test]
	fn scope_wire_names_round_trip() {
		for scope in Scope::ALL {
			assert_eq!(scope.as_str().parse::<Scope>(), Ok(scope));
		}

		let set: ScopeSet = serde_json::from_str("[\"offline\",\"blog-rw\"]")
			.expect("Scope arrays should deserialize.");

		assert_eq!(set.iter().collect::<Vec<_>>(), vec![Scope::Offline, Scope::BlogReadWrite]);
		assert!(serde_json::from_str::<ScopeSet>("[]").is_err());
	}
}
