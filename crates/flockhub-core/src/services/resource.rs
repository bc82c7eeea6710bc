use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::ListFilter;
use crate::api::{ApiError, Envelope, Instance};

/// CRUD request builders for one REST resource at `/<resource>`.
///
/// Errors from the instance are returned as-is.
pub struct ResourceService<T> {
    instance: Instance,
    resource: &'static str,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceService<T> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance.clone(),
            resource: self.resource,
            _entity: PhantomData,
        }
    }
}

/// Reject ids that would change the request path.
///
/// Dot segments are normalized away by URL parsing and `%` could smuggle an
/// encoded one, so both are refused along with separators and whitespace.
pub(crate) fn validate_id(id: &str) -> Result<&str, ApiError> {
    if id.is_empty() {
        return Err(ApiError::Validation("Resource id must not be empty".into()));
    }
    let reserved = |c: char| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace();
    if id == "." || id == ".." || id.chars().any(reserved) {
        return Err(ApiError::Validation(format!("Invalid resource id: {:?}", id)));
    }
    Ok(id)
}

impl<T: DeserializeOwned> ResourceService<T> {
    pub fn new(instance: Instance, resource: &'static str) -> Self {
        Self {
            instance,
            resource,
            _entity: PhantomData,
        }
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    pub(crate) fn instance(&self) -> &Instance {
        &self.instance
    }

    fn collection_path(&self) -> String {
        format!("/{}", self.resource)
    }

    fn item_path(&self, id: &str) -> Result<String, ApiError> {
        Ok(format!("/{}/{}", self.resource, validate_id(id)?))
    }

    pub async fn get_by_id(&self, id: &str) -> Result<T, ApiError> {
        let path = self.item_path(id)?;
        self.instance.get(&path).await.map(Envelope::into_data)
    }

    pub async fn list(&self, filter: &ListFilter) -> Result<Vec<T>, ApiError> {
        self.instance
            .get_with_query(&self.collection_path(), filter.to_query())
            .await
            .map(Envelope::into_data)
    }

    pub async fn create<P: Serialize>(&self, payload: &P) -> Result<T, ApiError> {
        self.instance
            .post(&self.collection_path(), payload)
            .await
            .map(Envelope::into_data)
    }

    pub async fn update<P: Serialize>(&self, id: &str, payload: &P) -> Result<T, ApiError> {
        let path = self.item_path(id)?;
        self.instance.patch(&path, payload).await.map(Envelope::into_data)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let path = self.item_path(id)?;
        self.instance.delete::<Value>(&path).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("p1").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("p1/../admin").is_err());
        assert!(validate_id("a b").is_err());
        assert!(validate_id("p1?x=1").is_err());
        assert!(validate_id(".").is_err());
        assert!(validate_id("..").is_err());
        assert!(validate_id("%2e%2e").is_err());
        assert!(validate_id("p%2Fq").is_err());
        assert!(validate_id("v1.2").is_ok());
    }
}
