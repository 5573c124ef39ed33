use std::collections::HashMap;

use aws_sdk_dynamodb::{types::AttributeValue, Client as DynamoClient};
use serde_json::Value;

use crate::store::{
    attr::{from_item, to_attr, to_item},
    document::{DocumentKey, DocumentStore, Patch, Query},
    error::StoreError,
};

/// Document store over DynamoDB tables with secondary-index query support.
#[derive(Clone)]
pub struct DynamoDocumentStore {
    client: DynamoClient,
}

impl DynamoDocumentStore {
    pub fn new(client: DynamoClient) -> Self {
        Self { client }
    }

    pub async fn from_env(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        Self::new(DynamoClient::new(&config))
    }

    fn key_map(key: &DocumentKey) -> HashMap<String, AttributeValue> {
        let mut map = HashMap::new();
        map.insert(
            key.partition.0.clone(),
            AttributeValue::S(key.partition.1.clone()),
        );
        if let Some((name, value)) = &key.sort {
            map.insert(name.clone(), AttributeValue::S(value.clone()));
        }
        map
    }
}

#[async_trait::async_trait]
impl DocumentStore for DynamoDocumentStore {
    async fn get(&self, table: &str, key: &DocumentKey) -> Result<Option<Value>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(Self::key_map(key)))
            .send()
            .await
            .map_err(|e| StoreError::Transport(anyhow::anyhow!(e)))?;

        Ok(output.item.map(from_item))
    }

    async fn put(&self, table: &str, item: Value) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(to_item(item)))
            .send()
            .await
            .map_err(|e| StoreError::Transport(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn update(&self, table: &str, key: &DocumentKey, patch: Patch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut expr_parts = Vec::new();
        let mut names = HashMap::new();
        let mut values = HashMap::new();

        for (i, (field, value)) in patch.set.into_iter().enumerate() {
            let name = format!("#k{i}");
            let placeholder = format!(":v{i}");
            expr_parts.push(format!("{name} = {placeholder}"));
            names.insert(name, field);
            values.insert(placeholder, to_attr(value));
        }

        if !patch.increment.is_empty() {
            values.insert(":zero".to_string(), AttributeValue::N("0".to_string()));
            values.insert(":one".to_string(), AttributeValue::N("1".to_string()));
            for (i, field) in patch.increment.into_iter().enumerate() {
                let name = format!("#c{i}");
                expr_parts.push(format!("{name} = if_not_exists({name}, :zero) + :one"));
                names.insert(name, field);
            }
        }

        self.client
            .update_item()
            .table_name(table)
            .set_key(Some(Self::key_map(key)))
            .update_expression(format!("SET {}", expr_parts.join(", ")))
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .send()
            .await
            .map_err(|e| StoreError::Transport(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn query(&self, table: &str, query: Query) -> Result<Vec<Value>, StoreError> {
        let mut names = HashMap::new();
        let mut values = HashMap::new();

        let mut key_condition = "#p = :p".to_string();
        names.insert("#p".to_string(), query.partition.0);
        values.insert(":p".to_string(), AttributeValue::S(query.partition.1));

        if let Some((name, value)) = query.key_eq {
            key_condition.push_str(" AND #s = :s");
            names.insert("#s".to_string(), name);
            values.insert(":s".to_string(), AttributeValue::S(value));
        }

        let mut filter_parts = Vec::new();
        for (i, (name, value)) in query.filter_eq.into_iter().enumerate() {
            let attr_name = format!("#f{i}");
            let placeholder = format!(":f{i}");
            filter_parts.push(format!("{attr_name} = {placeholder}"));
            names.insert(attr_name, name);
            values.insert(placeholder, to_attr(value));
        }

        let mut request = self
            .client
            .query()
            .table_name(table)
            .key_condition_expression(key_condition)
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .scan_index_forward(!query.descending);

        if let Some(index) = query.index {
            request = request.index_name(index);
        }
        if !filter_parts.is_empty() {
            request = request.filter_expression(filter_parts.join(" AND "));
        }
        if let Some(limit) = query.limit {
            request = request.limit(limit as i32);
        }

        let output = request
            .send()
            .await
            .map_err(|e| StoreError::Transport(anyhow::anyhow!(e)))?;

        Ok(output
            .items
            .unwrap_or_default()
            .into_iter()
            .map(from_item)
            .collect())
    }
}
