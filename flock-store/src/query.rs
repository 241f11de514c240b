use crate::document::{CollectionPath, Fields, Value};
use std::cmp::Ordering;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum FilterOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Query over the documents of one collection. Documents lacking the
/// ordering field are excluded, as in the hosted database.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Query {
    pub collection: CollectionPath,
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    #[must_use]
    pub fn new(collection: CollectionPath) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn filter(mut self, field: &str, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_owned(),
            op,
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn where_eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    #[must_use]
    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_owned(), direction));
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn matches(&self, fields: &Fields) -> bool {
        let filters_hold = self.filters.iter().all(|filter| {
            fields.get(&filter.field).is_some_and(|value| {
                compare_values(value, &filter.value).is_some_and(|ordering| match filter.op {
                    FilterOp::Eq => ordering.is_eq(),
                    FilterOp::Lt => ordering.is_lt(),
                    FilterOp::Le => ordering.is_le(),
                    FilterOp::Gt => ordering.is_gt(),
                    FilterOp::Ge => ordering.is_ge(),
                })
            })
        });

        let has_order_field = self
            .order_by
            .as_ref()
            .is_none_or(|(field, _)| fields.contains_key(field));

        filters_hold && has_order_field
    }

    #[must_use]
    pub fn compare(&self, a: &Fields, b: &Fields) -> Ordering {
        let Some((field, direction)) = &self.order_by else {
            return Ordering::Equal;
        };

        let ordering = match (a.get(field), b.get(field)) {
            (Some(a), Some(b)) => compare_values(a, b).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        };

        match direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                Some(a.cmp(&b))
            } else if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
                Some(a.cmp(&b))
            } else {
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        document::{CollectionPath, Fields},
        query::{Direction, FilterOp, Query},
    };
    use serde_json::json;
    use std::cmp::Ordering;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn filters_require_matching_types() {
        let query = Query::new(CollectionPath::root("posts"))
            .where_eq("authorId", 7)
            .filter("createdAt", FilterOp::Ge, 100);

        assert!(query.matches(&fields(json!({"authorId": 7, "createdAt": 100}))));
        assert!(!query.matches(&fields(json!({"authorId": 7, "createdAt": 99}))));
        assert!(!query.matches(&fields(json!({"authorId": "7", "createdAt": 100}))));
        assert!(!query.matches(&fields(json!({"createdAt": 100}))));
    }

    #[test]
    fn ordering_field_is_required_and_directional() {
        let query =
            Query::new(CollectionPath::root("posts")).order_by("createdAt", Direction::Descending);
        let older = fields(json!({"createdAt": 1}));
        let newer = fields(json!({"createdAt": 2}));

        assert!(!query.matches(&fields(json!({"content": "no timestamp"}))));
        assert_eq!(query.compare(&newer, &older), Ordering::Less);
        assert_eq!(query.compare(&older, &newer), Ordering::Greater);
    }
}
