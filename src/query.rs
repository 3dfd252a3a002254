//! Query string encoding for API requests.

use std::collections::BTreeMap;
use url::form_urlencoded;

/// Encodes a set of options into a URL query string.
pub trait QueryEncoder {
    /// The encoded query, without the leading `?`.
    fn encode(&self) -> String;
}

impl<T: QueryEncoder + ?Sized> QueryEncoder for &T {
    fn encode(&self) -> String {
        (**self).encode()
    }
}

/// A multimap of query parameters.
///
/// Keys are encoded in sorted order; values of a repeated key keep the order
/// in which they were added. Identical parameter sets always encode to the
/// same string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value to `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.params.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Replace every value of `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.params.insert(key.into(), vec![value.into()]);
        self
    }

    /// All values of `key`.
    pub fn get(&self, key: &str) -> &[String] {
        self.params.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns `true` if no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl QueryEncoder for QueryParams {
    fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.params {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (key, value) in iter {
            params.add(key, value);
        }
        params
    }
}

/// Sort direction for list requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl SortDirection {
    fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// A sort clause for list requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// Field name to sort by.
    pub field: String,
    /// Direction of the sort.
    pub direction: SortDirection,
}

/// Options for listing the records of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Only return these fields.
    pub fields: Vec<String>,
    /// Formula records must satisfy.
    pub filter_by_formula: Option<String>,
    /// Maximum number of records across all pages.
    pub max_records: Option<u32>,
    /// Number of records per page.
    pub page_size: Option<u32>,
    /// Sort clauses, applied in order.
    pub sort: Vec<Sort>,
    /// Name or id of a view.
    pub view: Option<String>,
    /// Cursor returned by a previous page.
    pub offset: Option<String>,
}

impl ListOptions {
    /// Only return the given fields.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Filter records with an Airtable formula.
    pub fn filter_by_formula(mut self, formula: impl Into<String>) -> Self {
        self.filter_by_formula = Some(formula.into());
        self
    }

    /// Limit the total number of records.
    pub fn max_records(mut self, max: u32) -> Self {
        self.max_records = Some(max);
        self
    }

    /// Set the page size.
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Add a sort clause.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(Sort {
            field: field.into(),
            direction,
        });
        self
    }

    /// Read records through a view.
    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    /// Continue from a page cursor.
    pub fn offset(mut self, offset: impl Into<String>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    /// Convert the options into raw query parameters.
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        for field in &self.fields {
            params.add("fields[]", field.as_str());
        }
        if let Some(formula) = &self.filter_by_formula {
            params.set("filterByFormula", formula.as_str());
        }
        if let Some(max) = self.max_records {
            params.set("maxRecords", max.to_string());
        }
        if let Some(size) = self.page_size {
            params.set("pageSize", size.to_string());
        }
        for (i, sort) in self.sort.iter().enumerate() {
            params.set(format!("sort[{i}][field]"), sort.field.as_str());
            params.set(format!("sort[{i}][direction]"), sort.direction.as_str());
        }
        if let Some(view) = &self.view {
            params.set("view", view.as_str());
        }
        if let Some(offset) = &self.offset {
            params.set("offset", offset.as_str());
        }
        params
    }
}

impl QueryEncoder for ListOptions {
    fn encode(&self) -> String {
        self.to_params().encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> QueryParams {
        names.iter().map(|name| ("fields[]", *name)).collect()
    }

    #[test]
    fn test_field_filters_encode_differently() {
        let none = QueryParams::new().encode();
        let name = fields(&["Name"]).encode();
        let name_notes = fields(&["Name", "Notes"]).encode();

        assert_eq!(none, "");
        assert_eq!(name, "fields%5B%5D=Name");
        assert_eq!(name_notes, "fields%5B%5D=Name&fields%5B%5D=Notes");
        assert_ne!(none, name);
        assert_ne!(name, name_notes);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let a: QueryParams = [("view", "Grid view"), ("a", "1"), ("fields[]", "x")]
            .into_iter()
            .collect();
        let b: QueryParams = [("fields[]", "x"), ("view", "Grid view"), ("a", "1")]
            .into_iter()
            .collect();

        assert_eq!(a.encode(), b.encode());
        assert_eq!(a.encode(), "a=1&fields%5B%5D=x&view=Grid+view");
    }

    #[test]
    fn test_set_replaces_and_add_appends() {
        let mut params = QueryParams::new();
        params.add("k", "1").add("k", "2");
        assert_eq!(params.get("k"), ["1", "2"]);
        params.set("k", "3");
        assert_eq!(params.get("k"), ["3"]);
        assert!(params.get("missing").is_empty());
    }

    #[test]
    fn test_list_options_params() {
        let options = ListOptions::default()
            .fields(["Name", "Notes"])
            .filter_by_formula("{Done} = 1")
            .max_records(10)
            .page_size(5)
            .sort("Name", SortDirection::Desc)
            .view("Grid view")
            .offset("itr123/rec456");

        let params = options.to_params();
        assert_eq!(params.get("fields[]"), ["Name", "Notes"]);
        assert_eq!(params.get("filterByFormula"), ["{Done} = 1"]);
        assert_eq!(params.get("maxRecords"), ["10"]);
        assert_eq!(params.get("pageSize"), ["5"]);
        assert_eq!(params.get("sort[0][field]"), ["Name"]);
        assert_eq!(params.get("sort[0][direction]"), ["desc"]);
        assert_eq!(params.get("view"), ["Grid view"]);
        assert_eq!(params.get("offset"), ["itr123/rec456"]);
        assert_eq!(options.encode(), params.encode());
    }

    #[test]
    fn test_default_list_options_are_empty() {
        assert!(ListOptions::default().to_params().is_empty());
        assert_eq!(ListOptions::default().encode(), "");
    }
}
