//! Name-based attribute reads and `with<Name>` setters.
//!
//! Types opt in by implementing [`Mutator`] and listing their declared fields
//! and computed attributes. Nothing is discovered at runtime: a `with<Name>`
//! call assigns a declared field when `name` is in [`Mutator::FIELDS`] and
//! stores a variable otherwise.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{GraphQLError, Result};

/// Prefix recognised by [`Mutator::call`].
pub const WITH_PREFIX: &str = "with";

/// Computed attribute reader.
pub type Accessor<T> = fn(&T) -> Result<Value>;

/// Dynamic attribute access for builder types.
pub trait Mutator: Sized + 'static {
    /// Field names that a `with<Field>` call assigns directly.
    const FIELDS: &'static [&'static str];

    /// Computed attributes keyed by snake_case name.
    const ACCESSORS: &'static [(&'static str, Accessor<Self>)];

    /// Assign `value` to the declared field `field`.
    fn assign_field(&mut self, field: &str, value: Value) -> Result<()>;

    /// Variable bag receiving undeclared `with<Name>` values.
    fn variables_mut(&mut self) -> &mut Map<String, Value>;

    /// Read a computed attribute. Unknown names yield `Ok(None)`.
    fn attribute(&self, name: &str) -> Result<Option<Value>> {
        let key = to_snake_case(name);
        match Self::ACCESSORS.iter().find(|(attr, _)| *attr == key) {
            Some((_, accessor)) => accessor(self).map(Some),
            None => Ok(None),
        }
    }

    /// Dispatch a `with<Name>` call.
    ///
    /// # Errors
    ///
    /// [`GraphQLError::UnsupportedOperation`] when `method` does not follow the
    /// convention, or [`GraphQLError::Json`] when the value cannot be assigned.
    fn call(mut self, method: &str, value: impl Serialize) -> Result<Self> {
        let field = field_name_for(method)
            .ok_or_else(|| GraphQLError::UnsupportedOperation(method.to_string()))?;
        let value = serde_json::to_value(value)?;

        if Self::FIELDS.contains(&field.as_str()) {
            self.assign_field(&field, value)?;
        } else {
            self.variables_mut().insert(field, value);
        }
        Ok(self)
    }
}

/// Field name targeted by a `with<Name>` method, e.g. `withUserId` -> `userId`.
pub fn field_name_for(method: &str) -> Option<String> {
    let rest = method.strip_prefix(WITH_PREFIX)?;
    let mut chars = rest.chars();
    let first = chars.next().filter(|c| c.is_uppercase())?;

    let mut field: String = first.to_lowercase().collect();
    field.push_str(chars.as_str());
    Some(field)
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
