//! The state tree node type.
//!
//! Containers (`Array`, `Object`) hold their children behind an [`Arc`], so
//! cloning a [`Value`] is shallow and two trees produced by successive
//! mutations share every subtree the mutation did not touch. Change detection
//! relies on that: [`Value::same`] compares container identity, not contents.

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Field storage for object nodes. Keeps insertion order.
pub type Map = IndexMap<String, Value>;

/// A node of the state tree.
///
/// Only `Array` and `Object` are traversed by paths. Every other variant is a
/// leaf, including `Set`, `Pattern` and `Timestamp`.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    /// A point in time.
    Timestamp(DateTime<Utc>),
    /// Unordered collection of unique members.
    Set(ValueSet),
    /// A compiled regular expression.
    Pattern(Pattern),
    /// A unique token, equal only to itself.
    Token(Token),
    Array(Arc<Vec<Value>>),
    Object(Arc<Map>),
}

impl Value {
    /// An empty object node.
    #[inline]
    pub fn object() -> Self {
        Value::Object(Arc::new(Map::new()))
    }

    #[inline]
    pub fn from_map(map: Map) -> Self {
        Value::Object(Arc::new(map))
    }

    #[inline]
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(items))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// True for the two node kinds a path can descend into.
    #[inline]
    pub fn is_container(&self) -> bool {
        self.is_object() || self.is_array()
    }

    /// True for an object without fields or an array without elements.
    pub fn is_empty_container(&self) -> bool {
        match self {
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map.as_ref()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&ValueSet> {
        match self {
            Value::Set(set) => Some(set),
            _ => None,
        }
    }

    pub fn as_pattern(&self) -> Option<&Pattern> {
        match self {
            Value::Pattern(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Value::Token(t) => Some(t),
            _ => None,
        }
    }

    /// Read the value at `path` below this node. See [`crate::read`].
    #[inline]
    pub fn at(&self, path: &crate::Path) -> Option<&Value> {
        crate::resolve::read(self, path.segments())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Timestamp(_) => "timestamp",
            Value::Set(_) => "set",
            Value::Pattern(_) => "pattern",
            Value::Token(_) => "token",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Reference identity.
    ///
    /// Containers, sets, patterns and tokens are the same only when they share
    /// an allocation. Scalars have no identity and compare by value.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Set(a), Value::Set(b)) => a.ptr_eq(b),
            (Value::Pattern(a), Value::Pattern(b)) => a.ptr_eq(b),
            (Value::Token(a), Value::Token(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            _ => false,
        }
    }

    /// Convert to plain JSON.
    ///
    /// Timestamps become RFC 3339 strings, sets become arrays, patterns their
    /// source text and tokens their description.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => Json::Number(n.clone()),
            Value::String(s) => Json::String(s.clone()),
            Value::Timestamp(t) => Json::String(format_timestamp(t)),
            Value::Set(set) => Json::Array(set.iter().map(Value::to_json).collect()),
            Value::Pattern(p) => Json::String(p.as_str().to_owned()),
            Value::Token(t) => t
                .description()
                .map(|d| Json::String(d.to_owned()))
                .unwrap_or(Json::Null),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// The exact integer value of `n`, if it is stored as one.
fn integer(n: &serde_json::Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// Integers compare exactly. An integer equals a float only when the float is
/// integral and names the same integer.
fn number_eq(a: &serde_json::Number, b: &serde_json::Number) -> bool {
    if a == b {
        return true;
    }
    match (integer(a), integer(b)) {
        (Some(x), Some(y)) => x == y,
        (Some(i), None) => b.as_f64().is_some_and(|f| integral_eq(i, f)),
        (None, Some(i)) => a.as_f64().is_some_and(|f| integral_eq(i, f)),
        (None, None) => matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y),
    }
}

fn integral_eq(i: i128, f: f64) -> bool {
    // Every integral f64 in this range converts to i128 without loss.
    let in_range = (-(2f64.powi(63))..2f64.powi(64)).contains(&f);
    in_range && f.fract() == 0.0 && f as i128 == i
}

/// Structural equality.
///
/// Shared containers short-circuit on pointer equality. Tokens compare by
/// identity, patterns by source text and sets by membership.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => number_eq(a, b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Pattern(a), Value::Pattern(b)) => a == b,
            (Value::Token(a), Value::Token(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Timestamp(t) => serializer.serialize_str(&format_timestamp(t)),
            Value::Set(set) => serializer.collect_seq(set.iter()),
            Value::Pattern(p) => serializer.serialize_str(p.as_str()),
            Value::Token(t) => match t.description() {
                Some(d) => serializer.serialize_str(d),
                None => serializer.serialize_unit(),
            },
            Value::Array(items) => serializer.collect_seq(items.iter()),
            Value::Object(map) => serializer.collect_map(map.iter()),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::array(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::from_map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(n.into())
                }
            }
        )*
    };
}

from_integer!(i32, i64, u32, u64, usize);

impl From<f64> for Value {
    /// Non-finite floats have no JSON number form and become `Null`.
    fn from(f: f64) -> Self {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Timestamp(t)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::from_map(map)
    }
}

impl From<ValueSet> for Value {
    fn from(set: ValueSet) -> Self {
        Value::Set(set)
    }
}

impl From<Pattern> for Value {
    fn from(p: Pattern) -> Self {
        Value::Pattern(p)
    }
}

impl From<Token> for Value {
    fn from(t: Token) -> Self {
        Value::Token(t)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Value::from_map(iter.into_iter().collect())
    }
}

/// Set-like leaf: unique members in insertion order.
///
/// Membership uses [`Value`] equality. Members are shared, not copied, when
/// the set is cloned.
#[derive(Clone, Debug, Default)]
pub struct ValueSet(Arc<Vec<Value>>);

impl ValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, member: &Value) -> bool {
        self.0.iter().any(|m| m == member)
    }

    /// Returns a new set that also contains `member`.
    pub fn with(&self, member: impl Into<Value>) -> Self {
        let member = member.into();
        if self.contains(&member) {
            return self.clone();
        }
        let mut members = self.0.as_ref().clone();
        members.push(member);
        Self(Arc::new(members))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &ValueSet) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// A distinct set with the same members.
    pub(crate) fn reallocate(&self) -> Self {
        Self(Arc::new(self.0.as_ref().clone()))
    }
}

impl<V: Into<Value>> FromIterator<V> for ValueSet {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut members: Vec<Value> = Vec::new();
        for member in iter {
            let member = member.into();
            if !members.contains(&member) {
                members.push(member);
            }
        }
        Self(Arc::new(members))
    }
}

impl PartialEq for ValueSet {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.len() == other.len() && self.iter().all(|m| other.contains(m)))
    }
}

/// Regular expression leaf.
#[derive(Clone, Debug)]
pub struct Pattern(Arc<Regex>);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(|re| Self(Arc::new(re)))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[inline]
    pub fn is_match(&self, haystack: &str) -> bool {
        self.0.is_match(haystack)
    }

    #[inline]
    pub fn regex(&self) -> &Regex {
        &self.0
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Pattern) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// A distinct, equivalent pattern.
    pub(crate) fn reallocate(&self) -> Self {
        Self(Arc::new(self.0.as_ref().clone()))
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// Unique token leaf.
///
/// Every call to [`Token::new`] mints a token that is equal only to itself
/// and its clones, whatever its description.
#[derive(Clone)]
pub struct Token(Arc<TokenInner>);

struct TokenInner {
    description: Option<String>,
}

impl Token {
    pub fn new(description: impl Into<String>) -> Self {
        Self(Arc::new(TokenInner {
            description: Some(description.into()),
        }))
    }

    pub fn anonymous() -> Self {
        Self(Arc::new(TokenInner { description: None }))
    }

    pub fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Token {}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Token").field(&self.description()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clone_shares_containers() {
        let tree = Value::from(json!({"clusters": {"a": 1}}));
        let copy = tree.clone();
        assert!(tree.same(&copy));
        assert_eq!(tree, copy);
    }

    #[test]
    fn equal_but_not_same() {
        let a = Value::from(json!({"x": [1, 2]}));
        let b = Value::from(json!({"x": [1, 2]}));
        assert_eq!(a, b);
        assert!(!a.same(&b));
    }

    #[test]
    fn scalars_are_same_by_value() {
        assert!(Value::from("us-east-1").same(&Value::from("us-east-1")));
        assert!(Value::from(3).same(&Value::from(3)));
        assert!(Value::Null.same(&Value::Null));
        assert!(!Value::Null.same(&Value::object()));
    }

    #[test]
    fn integer_and_float_numbers_compare_numerically() {
        assert_eq!(Value::from(2), Value::from(2.0));
        assert_ne!(Value::from(2), Value::from(2.5));
        assert_eq!(Value::from(-3), Value::from(-3.0));
    }

    #[test]
    fn large_integers_compare_exactly() {
        assert_ne!(Value::from(u64::MAX), Value::from(u64::MAX - 1));
        assert_ne!(Value::from(i64::MAX), Value::from(i64::MAX - 1));
        assert_ne!(Value::from(9_007_199_254_740_993_i64), Value::from(9_007_199_254_740_992.0));
        assert_eq!(Value::from(9_007_199_254_740_992_i64), Value::from(9_007_199_254_740_992.0));

        let ids: ValueSet = [Value::from(u64::MAX), Value::from(u64::MAX - 1)]
            .into_iter()
            .collect();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn object_equality_ignores_field_order() {
        let a = Value::from(json!({"a": 1, "b": 2}));
        let b = Value::from(json!({"b": 2, "a": 1}));
        assert_eq!(a, b);
    }

    #[test]
    fn tokens_are_unique() {
        let a = Token::new("poll");
        let b = Token::new("poll");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.description(), Some("poll"));
        assert_eq!(Token::anonymous().description(), None);
    }

    #[test]
    fn set_membership_is_unique_and_unordered() {
        let a: ValueSet = ["admin", "user", "admin"].into_iter().collect();
        assert_eq!(a.len(), 2);
        let b: ValueSet = ["user", "admin"].into_iter().collect();
        assert_eq!(a, b);
        let c = a.with("guest");
        assert_eq!(c.len(), 3);
        assert_eq!(a.len(), 2);
        assert!(a.with("user").ptr_eq(&a));
    }

    #[test]
    fn pattern_equality_is_by_source() {
        let a = Pattern::new("^us-gov").unwrap();
        let b = Pattern::new("^us-gov").unwrap();
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
        assert!(a.is_match("us-gov-west-1"));
        assert!(Pattern::new("(").is_err());
    }

    #[test]
    fn json_round_trip_preserves_order() {
        let json = json!({"z": 1, "a": [true, null, "s"], "m": {"k": 1.5}});
        let value = Value::from(json.clone());
        assert_eq!(value.to_json(), json);
        assert_eq!(serde_json::to_value(&value).unwrap(), json);
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn leaf_kinds_serialize_to_json() {
        let t = DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let set: ValueSet = [1, 2].into_iter().collect();
        let value: Value = [
            ("at".to_owned(), Value::from(t)),
            ("ids".to_owned(), Value::from(set)),
            ("re".to_owned(), Value::from(Pattern::new("a+").unwrap())),
            ("tok".to_owned(), Value::from(Token::new("x"))),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            value.to_json(),
            json!({"at": "2024-03-01T12:00:00Z", "ids": [1, 2], "re": "a+", "tok": "x"})
        );
        assert_eq!(value.to_string(), value.to_json().to_string());
    }

    #[test]
    fn non_finite_float_is_null() {
        assert!(Value::from(f64::NAN).is_null());
        assert!(Value::from(None::<i64>).is_null());
    }

    #[test]
    fn type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::object().type_name(), "object");
        assert_eq!(Value::array(vec![]).type_name(), "array");
        assert_eq!(Value::from(ValueSet::new()).type_name(), "set");
    }
}
