//! Example values for documentation.
//!
//! A route describes the shape of its query parameters, request body and
//! response body by pointing at something that can produce a representative
//! value. The docs renderer only ever sees `serde_json::Value`, so payload
//! types stay opaque to it.

use crate::types::ExampleError;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// Something that can produce a representative instance of a payload.
///
/// Examples are used for documentation only and never for dispatch. Nothing
/// here requires determinism: a non-deterministic example gives a docs page
/// that changes between requests.
pub trait Exampler: Send + Sync {
    fn example(&self) -> Result<Value, ExampleError>;
}

/// Typed form of [`Exampler`] for payload types.
///
/// ```rust,ignore
/// #[derive(Serialize)]
/// struct User { id: u64, name: String }
///
/// impl Example for User {
///     fn example() -> Self {
///         User { id: 1, name: "a".to_string() }
///     }
/// }
///
/// let returns = example_of::<User>();
/// ```
pub trait Example: Serialize {
    fn example() -> Self;
}

struct ExampleOf<T>(PhantomData<fn() -> T>);

impl<T: Example> Exampler for ExampleOf<T> {
    fn example(&self) -> Result<Value, ExampleError> {
        Ok(serde_json::to_value(T::example())?)
    }
}

/// Lift a typed [`Example`] into a shareable [`Exampler`].
pub fn example_of<T: Example + 'static>() -> Arc<dyn Exampler> {
    Arc::new(ExampleOf::<T>(PhantomData))
}

/// A literal JSON value is its own example.
impl Exampler for Value {
    fn example(&self) -> Result<Value, ExampleError> {
        Ok(self.clone())
    }
}

impl<T: Exampler + ?Sized> Exampler for Arc<T> {
    fn example(&self) -> Result<Value, ExampleError> {
        (**self).example()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Account {
        id: u32,
        owner: String,
    }

    impl Example for Account {
        fn example() -> Self {
            Account {
                id: 7,
                owner: "ops".to_string(),
            }
        }
    }

    #[derive(Serialize)]
    struct BadKeys(BTreeMap<Vec<u8>, u8>);

    impl Example for BadKeys {
        fn example() -> Self {
            BadKeys(BTreeMap::from([(vec![1], 1)]))
        }
    }

    #[test]
    fn test_typed_example_is_serialized() {
        let exampler = example_of::<Account>();
        assert_eq!(
            exampler.example().unwrap(),
            json!({"id": 7, "owner": "ops"})
        );
    }

    #[test]
    fn test_literal_value_example() {
        let value = json!([1, 2, 3]);
        assert_eq!(value.example().unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn test_unserializable_example_is_an_error() {
        let err = example_of::<BadKeys>().example().unwrap_err();
        assert!(matches!(err, ExampleError::Json(_)));
    }
}
