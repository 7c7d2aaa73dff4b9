//! Inventory endpoints.
//!
//! Each operation has a `build_*` method producing the `HttpRequest` and an
//! async method that builds, sends and decodes it in one step.

use crate::client::Client;
use crate::context::Context;
use crate::error::Result;
use crate::http::{HttpMethod, HttpRequest};
use crate::types::Inventory;

const COLLECTION: &str = "inventories";

/// Filters for [`InventoryService::list`].
///
/// Empty strings and a zero `page` are left out of the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub title: String,
    pub category: String,
    pub place: String,
    pub code: String,
    pub optional_attributes_name: String,
    pub optional_attributes_value: String,
    /// 1-based page number; 0 means the first page.
    pub page: u32,
}

/// A query parameter: wire name, value, and when to leave it out.
struct Filter {
    name: &'static str,
    value: fn(&ListQuery) -> String,
    omit: fn(&ListQuery) -> bool,
}

const FILTERS: &[Filter] = &[
    Filter {
        name: "title",
        value: |q| q.title.clone(),
        omit: |q| q.title.is_empty(),
    },
    Filter {
        name: "category",
        value: |q| q.category.clone(),
        omit: |q| q.category.is_empty(),
    },
    Filter {
        name: "place",
        value: |q| q.place.clone(),
        omit: |q| q.place.is_empty(),
    },
    Filter {
        name: "code",
        value: |q| q.code.clone(),
        omit: |q| q.code.is_empty(),
    },
    Filter {
        name: "optional_attributes_name",
        value: |q| q.optional_attributes_name.clone(),
        omit: |q| q.optional_attributes_name.is_empty(),
    },
    Filter {
        name: "optional_attributes_value",
        value: |q| q.optional_attributes_value.clone(),
        omit: |q| q.optional_attributes_value.is_empty(),
    },
    Filter {
        name: "page",
        value: |q| q.page.to_string(),
        omit: |q| q.page == 0,
    },
];

impl ListQuery {
    /// Query parameters this filter sends, in a fixed order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        FILTERS
            .iter()
            .filter(|filter| !(filter.omit)(self))
            .map(|filter| (filter.name, (filter.value)(self)))
            .collect()
    }

    /// URL-encoded query string without the leading `?`; empty when no
    /// filter is set.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs())
            .finish()
    }
}

/// Inventory API operations.
#[derive(Debug, Clone, Copy)]
pub struct InventoryService<'a> {
    client: &'a Client,
}

impl<'a> InventoryService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn build_list(&self, query: Option<&ListQuery>) -> Result<HttpRequest> {
        let query = query.map(ListQuery::to_query_string).unwrap_or_default();
        let path = if query.is_empty() {
            COLLECTION.to_string()
        } else {
            format!("{COLLECTION}?{query}")
        };
        self.client.new_request(HttpMethod::Get, &path)
    }

    pub fn build_get(&self, id: i64) -> Result<HttpRequest> {
        self.client.new_request(HttpMethod::Get, &item_path(id))
    }

    pub fn build_create(&self, inventory: &Inventory) -> Result<HttpRequest> {
        self.client
            .new_json_request(HttpMethod::Post, COLLECTION, inventory)
    }

    pub fn build_update(&self, id: i64, inventory: &Inventory) -> Result<HttpRequest> {
        self.client
            .new_json_request(HttpMethod::Put, &item_path(id), inventory)
    }

    pub fn build_delete(&self, id: i64) -> Result<HttpRequest> {
        self.client.new_request(HttpMethod::Delete, &item_path(id))
    }

    /// List inventories, in the order the server returns them.
    pub async fn list(&self, cx: &Context, query: Option<&ListQuery>) -> Result<Vec<Inventory>> {
        let request = self.build_list(query)?;
        self.client.execute(cx, request).await
    }

    /// Fetch one inventory.
    pub async fn get(&self, cx: &Context, id: i64) -> Result<Inventory> {
        let request = self.build_get(id)?;
        self.client.execute(cx, request).await
    }

    /// Create an inventory; the result carries the server-assigned id and
    /// timestamps.
    pub async fn create(&self, cx: &Context, inventory: &Inventory) -> Result<Inventory> {
        let request = self.build_create(inventory)?;
        self.client.execute(cx, request).await
    }

    /// Replace an inventory and return the server's copy.
    pub async fn update(&self, cx: &Context, id: i64, inventory: &Inventory) -> Result<Inventory> {
        let request = self.build_update(id, inventory)?;
        self.client.execute(cx, request).await
    }

    /// Delete an inventory. Any 2xx (typically 204) counts as success and the
    /// body is ignored.
    pub async fn delete(&self, cx: &Context, id: i64) -> Result<()> {
        let request = self.build_delete(id)?;
        self.client.send(cx, request).await?;
        Ok(())
    }
}

fn item_path(id: i64) -> String {
    format!("{COLLECTION}/{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::with_base_url("test-token", "http://localhost:3000/api/v1").unwrap()
    }

    #[test]
    fn empty_query_sends_nothing() {
        assert!(ListQuery::default().pairs().is_empty());
        assert_eq!(ListQuery::default().to_query_string(), "");
    }

    #[test]
    fn only_set_fields_are_sent() {
        let query = ListQuery {
            title: "x".to_string(),
            page: 2,
            ..Default::default()
        };
        assert_eq!(
            query.pairs(),
            vec![("title", "x".to_string()), ("page", "2".to_string())]
        );
    }

    #[test]
    fn every_filter_uses_its_wire_name() {
        let query = ListQuery {
            title: "a".to_string(),
            category: "b".to_string(),
            place: "c".to_string(),
            code: "d".to_string(),
            optional_attributes_name: "e".to_string(),
            optional_attributes_value: "f".to_string(),
            page: 3,
        };
        let names: Vec<&str> = query.pairs().into_iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "title",
                "category",
                "place",
                "code",
                "optional_attributes_name",
                "optional_attributes_value",
                "page",
            ]
        );
    }

    #[test]
    fn query_values_are_percent_encoded() {
        let query = ListQuery {
            place: "倉庫A".to_string(),
            code: "a&b=c".to_string(),
            ..Default::default()
        };
        assert_eq!(query.to_query_string(), "place=%E5%80%89%E5%BA%ABA&code=a%26b%3Dc");
    }

    #[test]
    fn build_list_without_query() {
        let req = client().inventory().build_list(None).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url.as_str(), "http://localhost:3000/api/v1/inventories");
        assert!(req.body.is_none());

        let req = client()
            .inventory()
            .build_list(Some(&ListQuery::default()))
            .unwrap();
        assert_eq!(req.url.query(), None);
    }

    #[test]
    fn build_list_with_query() {
        let query = ListQuery {
            title: "x".to_string(),
            page: 2,
            ..Default::default()
        };
        let req = client().inventory().build_list(Some(&query)).unwrap();
        assert_eq!(
            req.url.as_str(),
            "http://localhost:3000/api/v1/inventories?title=x&page=2"
        );
    }

    #[test]
    fn build_get_and_delete_paths() {
        let req = client().inventory().build_get(42).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url.path(), "/api/v1/inventories/42");

        let req = client().inventory().build_delete(42).unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url.path(), "/api/v1/inventories/42");
        assert!(req.header("content-type").is_none());
    }

    #[test]
    fn build_create_sends_record() {
        let item = Inventory {
            title: "Tape".to_string(),
            quantity: "4".to_string(),
            ..Default::default()
        };
        let req = client().inventory().build_create(&item).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url.path(), "/api/v1/inventories");
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["title"], "Tape");
        assert_eq!(body["quantity"], "4");
        assert!(body.get("id").is_none());
    }

    #[test]
    fn build_update_targets_item() {
        let item = Inventory {
            id: 5,
            title: "Renamed".to_string(),
            ..Default::default()
        };
        let req = client().inventory().build_update(5, &item).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url.path(), "/api/v1/inventories/5");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["title"], "Renamed");
    }
}
