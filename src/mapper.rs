//! Field mapping from untyped Airtable fields onto typed records.
//!
//! A record type carries a static shape: one [`Field`] per struct field with
//! its external key, its declared [`Kind`] and a function that coerces a JSON
//! value into that slot. Shapes are declared with [`record!`](crate::record),
//! which also makes the record usable as a nested slot of another record.
//!
//! Types whose JSON representation is not a plain object (formula results,
//! computed columns) implement [`ParseValue`] and register it with
//! [`parse_hook!`](crate::parse_hook). The hook then replaces structural
//! mapping for every slot of that type.
//!
//! ```rust
//! use airtable::{map_fields, record};
//! use serde_json::json;
//!
//! record! {
//!     #[derive(Debug)]
//!     pub struct Task {
//!         pub name: String => "Name",
//!         pub done: bool => "Done",
//!         pub estimate: i64 => "Estimate (h)",
//!     }
//! }
//!
//! let fields = json!({"Name": "Write docs", "Estimate (h)": 3.0});
//! let mut task = Task::default();
//! map_fields(&mut task, fields.as_object().unwrap()).unwrap();
//!
//! assert_eq!(task.name, "Write docs");
//! assert!(!task.done);
//! assert_eq!(task.estimate, 3);
//! ```

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, warn};

/// Declared kind of a destination slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// `bool`
    Bool,
    /// Any primitive integer.
    Int,
    /// `f32` or `f64`.
    Float,
    /// `String`
    String,
    /// A record declared with `record!`.
    Struct,
    /// A type mapped through its own [`ParseValue`] hook.
    Custom,
    /// `Vec<T>`
    Sequence,
    /// `serde_json::Value`, assigned verbatim.
    Any,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Bool => "boolean",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Struct => "struct",
            Kind::Custom => "custom",
            Kind::Sequence => "slice",
            Kind::Any => "any",
        };
        f.write_str(name)
    }
}

/// A destination slot that can be filled from an untyped JSON value.
pub trait Coerce: Default {
    /// Declared kind of this slot type.
    const KIND: Kind;

    /// Fill `self` from `value`.
    ///
    /// `key` is the external key of the enclosing field and is only used for
    /// error reporting.
    fn coerce(&mut self, key: &str, value: &Value) -> Result<()>;
}

/// Custom parse hook for types that are not mapped structurally.
///
/// Register an implementation with [`parse_hook!`](crate::parse_hook).
pub trait ParseValue {
    /// Populate `self` from the raw value of the slot.
    fn parse_value(&mut self, key: &str, value: &Value) -> Result<()>;
}

/// One entry of a record shape.
pub struct Field<R> {
    /// Struct field name.
    pub name: &'static str,
    /// External key looked up in the fields map.
    pub key: &'static str,
    /// Declared kind of the field.
    pub kind: Kind,
    /// Coerces a value into this field of `R`.
    pub assign: fn(&mut R, &str, &Value) -> Result<()>,
}

impl<R> fmt::Debug for Field<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("kind", &self.kind)
            .finish()
    }
}

/// A record type with a static shape.
pub trait Record: Default + 'static {
    /// Fields of the record in declaration order.
    fn shape() -> &'static [Field<Self>];

    /// External keys of every field, e.g. for a `fields[]` filter.
    fn keys() -> Vec<&'static str> {
        Self::shape().iter().map(|field| field.key).collect()
    }
}

/// Map `fields` onto `dest` in place.
///
/// Keys that are missing or null leave the field untouched. The first field
/// that fails to coerce aborts the pass; fields assigned before it keep their
/// new values.
pub fn map_fields<R: Record>(dest: &mut R, fields: &Map<String, Value>) -> Result<()> {
    for field in R::shape() {
        match fields.get(field.key) {
            None | Some(Value::Null) => {
                debug!(field = field.key, "field absent, keeping default");
            }
            Some(value) => (field.assign)(dest, field.key, value)?,
        }
    }
    Ok(())
}

/// Build a new `R` from `fields`.
pub fn from_fields<R: Record>(fields: &Map<String, Value>) -> Result<R> {
    let mut record = R::default();
    map_fields(&mut record, fields)?;
    Ok(record)
}

/// Structural mapping of a nested record slot.
#[doc(hidden)]
pub fn map_nested<R: Record>(dest: &mut R, key: &str, value: &Value) -> Result<()> {
    match value {
        Value::Object(map) => map_fields(dest, map),
        other => Err(Error::coercion(key, Kind::Struct, other)),
    }
}

impl Coerce for bool {
    const KIND: Kind = Kind::Bool;

    fn coerce(&mut self, key: &str, value: &Value) -> Result<()> {
        *self = value
            .as_bool()
            .ok_or_else(|| Error::coercion(key, Kind::Bool, value))?;
        Ok(())
    }
}

impl Coerce for String {
    const KIND: Kind = Kind::String;

    fn coerce(&mut self, key: &str, value: &Value) -> Result<()> {
        match value {
            Value::String(s) => {
                self.clone_from(s);
                Ok(())
            }
            other => Err(Error::coercion(key, Kind::String, other)),
        }
    }
}

/// JSON has no integers of its own; every number is read as `f64` and
/// truncated into the slot.
macro_rules! impl_coerce_number {
    ($kind:expr => $($t:ty),+) => {
        $(
            impl Coerce for $t {
                const KIND: Kind = $kind;

                fn coerce(&mut self, key: &str, value: &Value) -> Result<()> {
                    let n = value
                        .as_f64()
                        .ok_or_else(|| Error::coercion(key, $kind, value))?;
                    *self = n as $t;
                    Ok(())
                }
            }
        )+
    };
}

impl_coerce_number!(Kind::Int => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
impl_coerce_number!(Kind::Float => f32, f64);

impl Coerce for Value {
    const KIND: Kind = Kind::Any;

    fn coerce(&mut self, _key: &str, value: &Value) -> Result<()> {
        self.clone_from(value);
        Ok(())
    }
}

impl<T: Coerce> Coerce for Vec<T> {
    const KIND: Kind = Kind::Sequence;

    fn coerce(&mut self, key: &str, value: &Value) -> Result<()> {
        if T::KIND == Kind::Any {
            warn!(field = key, "open slots are not a valid sequence element kind");
            return Err(Error::UnsupportedKind {
                field: key.to_string(),
                kind: format!("{} of {}", Kind::Sequence, T::KIND),
            });
        }

        let items = value
            .as_array()
            .ok_or_else(|| Error::coercion(key, Kind::Sequence, value))?;

        let mut dst = Vec::with_capacity(items.len());
        for item in items {
            let mut elem = T::default();
            elem.coerce(key, item)?;
            dst.push(elem);
        }
        *self = dst;
        Ok(())
    }
}

impl<T: Coerce> Coerce for Option<T> {
    const KIND: Kind = T::KIND;

    fn coerce(&mut self, key: &str, value: &Value) -> Result<()> {
        if value.is_null() {
            *self = None;
            return Ok(());
        }
        let mut inner = T::default();
        inner.coerce(key, value)?;
        *self = Some(inner);
        Ok(())
    }
}

/// Declare a record struct together with its field shape.
///
/// Each field may name its external key after `=>`; without one, the field's
/// own name is looked up. The struct derives `Default`; add any other derives
/// as regular attributes.
///
/// ```rust
/// use airtable::{record, Record};
///
/// record! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Person {
///         /// Full name
///         pub name: String => "Name",
///         pub age: u32,
///     }
/// }
///
/// assert_eq!(Person::keys(), vec!["Name", "age"]);
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty $(=> $alias:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Default)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::Record for $name {
            fn shape() -> &'static [$crate::Field<Self>] {
                static SHAPE: &[$crate::Field<$name>] = &[
                    $(
                        $crate::Field {
                            name: stringify!($field),
                            key: $crate::__record_key!($field $(, $alias)?),
                            kind: <$ty as $crate::Coerce>::KIND,
                            assign: |record: &mut $name, key: &str, value: &$crate::__private::Value| {
                                $crate::Coerce::coerce(&mut record.$field, key, value)
                            },
                        },
                    )*
                ];
                SHAPE
            }
        }

        impl $crate::Coerce for $name {
            const KIND: $crate::Kind = $crate::Kind::Struct;

            fn coerce(&mut self, key: &str, value: &$crate::__private::Value) -> $crate::Result<()> {
                $crate::__private::map_nested(self, key, value)
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_key {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $alias:literal) => {
        $alias
    };
}

/// Map slots of a type through its [`ParseValue`] implementation.
///
/// The hook receives the raw value whatever its JSON type, and its result is
/// returned unchanged.
#[macro_export]
macro_rules! parse_hook {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Coerce for $ty {
                const KIND: $crate::Kind = $crate::Kind::Custom;

                fn coerce(&mut self, key: &str, value: &$crate::__private::Value) -> $crate::Result<()> {
                    $crate::ParseValue::parse_value(self, key, value)
                }
            }
        )+
    };
}

/// Name of the JSON type of `value`, as used in coercion errors.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    record! {
        #[derive(Debug, Clone, PartialEq)]
        struct Inner {
            label: String => "Label",
            weight: f64 => "Weight",
        }
    }

    record! {
        #[derive(Debug, Clone, PartialEq)]
        struct Middle {
            title: String => "Title",
            inner: Inner => "Inner",
        }
    }

    record! {
        #[derive(Debug, PartialEq)]
        struct Row {
            name: String => "Name",
            done: bool => "Done",
            count: i64 => "Count",
            small: u8 => "Small",
            ratio: f64 => "Ratio",
            raw: Value => "Raw",
            tags: Vec<String> => "Tags",
            grid: Vec<Vec<i32>> => "Grid",
            items: Vec<Inner> => "Items",
            nested: Middle => "Nested",
            note: Option<String> => "Note",
            plain: String,
        }
    }

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_maps_every_kind() {
        let src = fields(json!({
            "Name": "Widget",
            "Done": true,
            "Count": 42.9,
            "Small": 300,
            "Ratio": 0.25,
            "Raw": {"anything": [1, "two"]},
            "Tags": ["a", "b"],
            "Grid": [[1, 2], [3]],
            "Items": [{"Label": "x", "Weight": 1.5}, {"Label": "y"}],
            "Nested": {"Title": "t", "Inner": {"Label": "deep", "Weight": 2}},
            "Note": "hi",
            "plain": "no alias",
        }));

        let row: Row = from_fields(&src).unwrap();
        assert_eq!(row.name, "Widget");
        assert!(row.done);
        assert_eq!(row.count, 42);
        assert_eq!(row.small, u8::MAX);
        assert_eq!(row.ratio, 0.25);
        assert_eq!(row.raw, json!({"anything": [1, "two"]}));
        assert_eq!(row.tags, vec!["a", "b"]);
        assert_eq!(row.grid, vec![vec![1, 2], vec![3]]);
        assert_eq!(row.items.len(), 2);
        assert_eq!(row.items[0], Inner { label: "x".into(), weight: 1.5 });
        assert_eq!(row.items[1], Inner { label: "y".into(), weight: 0.0 });
        assert_eq!(row.nested.inner.label, "deep");
        assert_eq!(row.nested.inner.weight, 2.0);
        assert_eq!(row.note.as_deref(), Some("hi"));
        assert_eq!(row.plain, "no alias");
    }

    #[test]
    fn test_missing_and_null_keep_defaults() {
        let src = fields(json!({"Name": null, "Done": null, "Nested": null}));
        let row: Row = from_fields(&src).unwrap();
        assert_eq!(row, Row::default());
    }

    #[test]
    fn test_partial_nested_data() {
        let src = fields(json!({"Nested": {"Inner": {"Label": "only label"}}}));
        let row: Row = from_fields(&src).unwrap();
        assert_eq!(row.nested.title, "");
        assert_eq!(row.nested.inner.label, "only label");
        assert_eq!(row.nested.inner.weight, 0.0);
    }

    #[test]
    fn test_wrong_type_names_field() {
        let cases = [
            (json!({"Done": "yes"}), "Done", Kind::Bool, "string"),
            (json!({"Count": "12"}), "Count", Kind::Int, "string"),
            (json!({"Ratio": true}), "Ratio", Kind::Float, "boolean"),
            (json!({"Name": 1}), "Name", Kind::String, "number"),
            (json!({"Tags": "a,b"}), "Tags", Kind::Sequence, "string"),
            (json!({"Tags": ["a", 2]}), "Tags", Kind::String, "number"),
            (json!({"Nested": [1]}), "Nested", Kind::Struct, "array"),
            (json!({"Nested": {"Inner": {"Weight": "heavy"}}}), "Weight", Kind::Float, "string"),
        ];

        for (src, field, expected, found) in cases {
            let err = from_fields::<Row>(&fields(src.clone())).unwrap_err();
            match err {
                Error::Coercion {
                    field: f,
                    expected: e,
                    found: got,
                } => {
                    assert_eq!(f, field, "input {src}");
                    assert_eq!(e, expected, "input {src}");
                    assert_eq!(got, found, "input {src}");
                }
                other => panic!("expected coercion error for {src}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_failure_keeps_earlier_assignments() {
        let mut row = Row::default();
        let err = map_fields(&mut row, &fields(json!({"Name": "kept", "Count": "bad"})));
        assert!(err.is_err());
        assert_eq!(row.name, "kept");
    }

    #[test]
    fn test_sequence_replaces_previous_content() {
        let mut row = Row {
            tags: vec!["old".into(), "older".into(), "oldest".into()],
            ..Default::default()
        };
        map_fields(&mut row, &fields(json!({"Tags": ["new"]}))).unwrap();
        assert_eq!(row.tags, vec!["new"]);
    }

    record! {
        #[derive(Debug)]
        struct Optional {
            vals: Vec<Option<String>> => "Vals",
            top: Option<i32> => "Top",
        }
    }

    #[test]
    fn test_null_options_map_to_none() {
        let src = fields(json!({"Vals": ["a", null, "b"], "Top": null}));
        let opt: Optional = from_fields(&src).unwrap();
        assert_eq!(opt.vals, vec![Some("a".to_string()), None, Some("b".to_string())]);
        assert_eq!(opt.top, None);

        let mut opt = Optional {
            top: Some(7),
            ..Default::default()
        };
        map_fields(&mut opt, &fields(json!({"Top": 2.5}))).unwrap();
        assert_eq!(opt.top, Some(2));
        map_fields(&mut opt, &fields(json!({}))).unwrap();
        assert_eq!(opt.top, Some(2));
        assert!(opt.vals.is_empty());

        let absent: Optional = from_fields(&fields(json!({}))).unwrap();
        assert_eq!(absent.top, None);
        assert_eq!(Optional::shape()[1].kind, Kind::Int);
    }

    record! {
        #[derive(Debug)]
        struct Loose {
            values: Vec<Value> => "Values",
        }
    }

    #[test]
    fn test_open_sequence_elements_are_unsupported() {
        let err = from_fields::<Loose>(&fields(json!({"Values": []}))).unwrap_err();
        match err {
            Error::UnsupportedKind { field, kind } => {
                assert_eq!(field, "Values");
                assert_eq!(kind, "slice of any");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Tally {
        seen: String,
    }

    thread_local! {
        static HOOK_CALLS: Cell<usize> = const { Cell::new(0) };
    }

    impl ParseValue for Tally {
        fn parse_value(&mut self, key: &str, value: &Value) -> Result<()> {
            HOOK_CALLS.with(|calls| calls.set(calls.get() + 1));
            if value.as_str() == Some("explode") {
                return Err(Error::UnsupportedKind {
                    field: key.to_string(),
                    kind: "explosive".into(),
                });
            }
            self.seen = type_name(value).to_string();
            Ok(())
        }
    }

    parse_hook!(Tally);

    record! {
        #[derive(Debug)]
        struct Hooked {
            tally: Tally => "Tally",
            many: Vec<Tally> => "Many",
        }
    }

    #[test]
    fn test_parse_hook_overrides_structure() {
        HOOK_CALLS.with(|calls| calls.set(0));
        let src = fields(json!({"Tally": 12, "Many": ["a", {"x": 1}, [true]]}));
        let hooked: Hooked = from_fields(&src).unwrap();

        assert_eq!(hooked.tally.seen, "number");
        let seen: Vec<_> = hooked.many.iter().map(|t| t.seen.as_str()).collect();
        assert_eq!(seen, vec!["string", "object", "array"]);
        assert_eq!(HOOK_CALLS.with(Cell::get), 4);
    }

    #[test]
    fn test_parse_hook_error_is_returned_verbatim() {
        let err = from_fields::<Hooked>(&fields(json!({"Tally": "explode"}))).unwrap_err();
        assert_eq!(err.to_string(), "unsupported kind explosive for field 'Tally'");
    }

    #[test]
    fn test_shape_descriptor() {
        let shape = Row::shape();
        assert_eq!(shape.len(), 12);
        assert_eq!(shape[0].name, "name");
        assert_eq!(shape[0].key, "Name");
        assert_eq!(shape[6].kind, Kind::Sequence);
        assert_eq!(shape[9].kind, Kind::Struct);
        assert_eq!(shape[10].kind, Kind::String);
        assert_eq!(shape[11].key, "plain");
        assert_eq!(Hooked::shape()[0].kind, Kind::Custom);
        assert_eq!(Middle::keys(), vec!["Title", "Inner"]);
    }
}
